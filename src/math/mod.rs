// src/math/mod.rs

pub mod full_math;
pub mod liquidity_math;
pub mod swap_math;
pub mod tick_math;
