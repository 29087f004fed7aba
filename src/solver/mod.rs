// src/solver/mod.rs
//
// Moteur de recherche du swap optimal pour un dépôt mono-jeton dans une plage
// de ticks. Trois stratégies distinctes partagent la validation des bornes et
// l'évaluateur de restes : la bissection à restes symétriques (balanced), la
// recherche à seuil de poussière (dust), et l'estimateur statique sans oracle
// (estimate). Toutes travaillent en unités de base ; les décimales ne servent
// qu'à l'affichage.

pub mod balanced;
pub mod dust;
pub mod estimate;

pub use balanced::solve_balanced_swap;
pub use dust::solve_dust_bounded_swap;
pub use estimate::estimate_swap_static;

use crate::error::ZapError;
use crate::math::liquidity_math::{amounts_for_liquidity, liquidity_for_amounts};
use crate::math::tick_math::tick_to_sqrt_price_x64;
use crate::oracle::{PoolMetadata, QuoteOracle};

pub const MAX_SEARCH_ITERATIONS: u32 = 128;
/// En dessous de cet écart entre deux candidats successifs, la bissection
/// symétrique considère qu'elle a calé.
pub const MIN_SWAP_DELTA: u64 = 100;
/// Restes (après rabotage) en dessous desquels la recherche dust s'arrête.
pub const DUST_THRESHOLD: u64 = 1_000_000;
/// Pas de rabotage des restes avant comparaison, pour absorber le bruit
/// d'arrondi des conversions liquidité <-> montants.
pub const LEFTOVER_TRIM_STEP: u64 = 100;

/// Bracket d'une recherche en cours. Invariant : low <= candidate <= high.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SearchState {
    pub low: u64,
    pub high: u64,
    pub candidate: u64,
}

impl SearchState {
    pub fn new(amount_in: u64) -> Self {
        Self { low: 0, high: amount_in, candidate: amount_in / 2 }
    }
}

/// Prix racine des deux bornes d'une plage validée.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RangeBounds {
    pub sqrt_price_lower_x64: u128,
    pub sqrt_price_upper_x64: u128,
}

/// Bilan d'un découpage candidat : la liquidité finançable et ce qui resterait
/// de chaque jeton une fois la position ouverte.
#[derive(Debug, Clone, Copy)]
pub struct LeftoverReport {
    pub liquidity: u128,
    pub leftover_a: u64,
    pub leftover_b: u64,
}

/// Préconditions communes aux trois stratégies, vérifiées avant tout appel à
/// l'oracle : bornes alignées sur l'espacement de ticks, plage orientée,
/// ticks dans le domaine, montant non nul.
pub(crate) fn validated_range(
    meta: &PoolMetadata,
    lower_tick: i32,
    upper_tick: i32,
    amount_in: u64,
) -> Result<RangeBounds, ZapError> {
    let spacing = meta.tick_spacing;
    if spacing != 0 {
        for tick in [lower_tick, upper_tick] {
            if tick % spacing as i32 != 0 {
                return Err(ZapError::InvalidTickSpacing { tick, spacing });
            }
        }
    }
    if lower_tick >= upper_tick {
        return Err(ZapError::InvalidRange);
    }
    if amount_in == 0 {
        return Err(ZapError::ZeroAmount);
    }
    Ok(RangeBounds {
        sqrt_price_lower_x64: tick_to_sqrt_price_x64(lower_tick)?,
        sqrt_price_upper_x64: tick_to_sqrt_price_x64(upper_tick)?,
    })
}

/// Évalue un candidat : quote le swap hypothétique, calcule la liquidité
/// finançable avec les montants résultants AU PRIX ATTEINT, puis les restes.
pub(crate) fn evaluate_split(
    oracle: &dyn QuoteOracle,
    bounds: &RangeBounds,
    amount_in: u64,
    is_base_input: bool,
    candidate: u64,
    sqrt_price_limit_x64: u128,
) -> Result<LeftoverReport, ZapError> {
    let meta = oracle.metadata();
    let input_mint = if is_base_input { meta.mint_a } else { meta.mint_b };
    let quote = oracle
        .quote(&input_mint, candidate, sqrt_price_limit_x64)
        .map_err(ZapError::Oracle)?;

    let remaining = amount_in - candidate;
    let (available_a, available_b) = if is_base_input {
        (remaining, quote.amount_out)
    } else {
        (quote.amount_out, remaining)
    };

    let liquidity = liquidity_for_amounts(
        quote.sqrt_price_after_x64,
        bounds.sqrt_price_lower_x64,
        bounds.sqrt_price_upper_x64,
        available_a,
        available_b,
    )?;
    let (used_a, used_b) = amounts_for_liquidity(
        quote.sqrt_price_after_x64,
        bounds.sqrt_price_lower_x64,
        bounds.sqrt_price_upper_x64,
        liquidity,
    )?;

    Ok(LeftoverReport {
        liquidity,
        leftover_a: available_a.saturating_sub(used_a),
        leftover_b: available_b.saturating_sub(used_b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::fake::{synthetic_metadata, FixedRatioOracle};

    #[test]
    fn misaligned_bound_fails_before_any_oracle_call() {
        let oracle = FixedRatioOracle::new(synthetic_metadata(0, 60, 0, 0), 1, 1);
        let err = solve_balanced_swap(&oracle, -601, 6000, 1_000_000, true).unwrap_err();
        assert!(matches!(
            err,
            ZapError::InvalidTickSpacing { tick: -601, spacing: 60 }
        ));
        assert_eq!(oracle.calls(), 0);

        let err = solve_dust_bounded_swap(&oracle, -600, 6001, 1_000_000, true).unwrap_err();
        assert!(matches!(
            err,
            ZapError::InvalidTickSpacing { tick: 6001, spacing: 60 }
        ));
        assert_eq!(oracle.calls(), 0);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let oracle = FixedRatioOracle::new(synthetic_metadata(0, 60, 0, 0), 1, 1);
        assert!(matches!(
            solve_balanced_swap(&oracle, 6000, -6000, 1_000_000, true),
            Err(ZapError::InvalidRange)
        ));
        assert_eq!(oracle.calls(), 0);
    }

    #[test]
    fn zero_amount_is_rejected() {
        let oracle = FixedRatioOracle::new(synthetic_metadata(0, 60, 0, 0), 1, 1);
        assert!(matches!(
            solve_balanced_swap(&oracle, -6000, 6000, 0, true),
            Err(ZapError::ZeroAmount)
        ));
        assert!(matches!(
            solve_dust_bounded_swap(&oracle, -6000, 6000, 0, false),
            Err(ZapError::ZeroAmount)
        ));
        assert_eq!(oracle.calls(), 0);
    }

    #[test]
    fn out_of_domain_tick_is_rejected() {
        let oracle = FixedRatioOracle::new(synthetic_metadata(0, 1, 0, 0), 1, 1);
        assert!(matches!(
            solve_balanced_swap(&oracle, -500_000, 6000, 1_000, true),
            Err(ZapError::InvalidTick(-500_000))
        ));
        assert_eq!(oracle.calls(), 0);
    }
}
