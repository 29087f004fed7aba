// src/lib.rs

// On déclare tous nos modules principaux pour les rendre publics et
// utilisables par le binaire `zap_planner` (et par les tests).
pub mod config;
pub mod error;
pub mod math;
pub mod monitoring;
pub mod oracle;
pub mod rpc;
pub mod solver;

pub use error::ZapError;
