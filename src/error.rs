// src/error.rs

use thiserror::Error;

/// Taxonomie d'erreurs du moteur de recherche. Toutes sont fatales pour
/// l'invocation en cours : aucun ré-essai interne, l'appelant relance s'il veut.
#[derive(Error, Debug)]
pub enum ZapError {
    #[error("tick {0} hors du domaine représentable (±443636)")]
    InvalidTick(i32),

    #[error("prix racine {0} hors du domaine représentable")]
    InvalidSqrtPrice(u128),

    #[error("la borne {tick} n'est pas un multiple de l'espacement de ticks {spacing}")]
    InvalidTickSpacing { tick: i32, spacing: u16 },

    #[error("borne basse supérieure ou égale à la borne haute")]
    InvalidRange,

    #[error("dépassement de capacité dans un calcul à virgule fixe")]
    Overflow,

    #[error("montant d'entrée nul")]
    ZeroAmount,

    #[error("échec de l'oracle de quote : {0}")]
    Oracle(#[source] anyhow::Error),
}
