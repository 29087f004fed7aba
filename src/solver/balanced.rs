// src/solver/balanced.rs

use tracing::debug;

use crate::error::ZapError;
use crate::oracle::QuoteOracle;
use crate::solver::{
    evaluate_split, validated_range, SearchState, MAX_SEARCH_ITERATIONS, MIN_SWAP_DELTA,
};

/// Bissection à restes symétriques : à chaque itération, une seule comparaison
/// de signe (reste du jeton d'entrée contre reste du jeton de sortie) décide
/// du resserrement du bracket. Ce n'est PAS une bissection classique sur un
/// prédicat monotone : la comparaison est bruitée, et c'est la détection de
/// calage du candidat qui garantit la terminaison, pas une preuve d'optimalité.
/// Les quotes sont faites sans limite de prix.
pub fn solve_balanced_swap(
    oracle: &dyn QuoteOracle,
    lower_tick: i32,
    upper_tick: i32,
    amount_in: u64,
    is_base_input: bool,
) -> Result<u64, ZapError> {
    let bounds = validated_range(oracle.metadata(), lower_tick, upper_tick, amount_in)?;
    let mut state = SearchState::new(amount_in);

    for iteration in 0..MAX_SEARCH_ITERATIONS {
        let report =
            evaluate_split(oracle, &bounds, amount_in, is_base_input, state.candidate, 0)?;

        // Polarité dépendante de la direction : un excédent du jeton d'entrée
        // signifie que le swap était trop petit.
        let swap_too_small = if is_base_input {
            report.leftover_a > report.leftover_b
        } else {
            report.leftover_b > report.leftover_a
        };
        if swap_too_small {
            state.low = state.candidate;
        } else {
            state.high = state.candidate;
        }

        let next = state.low + (state.high - state.low) / 2;
        let stalled = next.abs_diff(state.candidate) < MIN_SWAP_DELTA;
        debug!(
            iteration,
            candidate = state.candidate,
            next,
            leftover_a = report.leftover_a,
            leftover_b = report.leftover_b,
            "pas de recherche symétrique"
        );
        state.candidate = next;
        if stalled {
            break;
        }
    }

    Ok(state.candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::fake::{
        synthetic_metadata, ConstantLiquidityOracle, FixedRatioOracle,
    };

    #[test]
    fn converges_to_half_against_unit_ratio() {
        // Taux 1:1 sans impact, prix au milieu d'une plage symétrique :
        // l'optimum analytique est exactement la moitié du montant.
        let amount_in = 2_000_000_000u64;
        let oracle = FixedRatioOracle::new(synthetic_metadata(0, 60, 0, 0), 1, 1);
        let swap = solve_balanced_swap(&oracle, -6000, 6000, amount_in, true).unwrap();
        assert!(swap.abs_diff(amount_in / 2) <= 2 * MIN_SWAP_DELTA);
        assert!(oracle.calls() <= MAX_SEARCH_ITERATIONS);
    }

    #[test]
    fn converges_for_both_directions() {
        let amount_in = 2_000_000_000u64;
        let oracle = FixedRatioOracle::new(synthetic_metadata(0, 60, 0, 0), 1, 1);
        let swap_a = solve_balanced_swap(&oracle, -6000, 6000, amount_in, true).unwrap();
        let swap_b = solve_balanced_swap(&oracle, -6000, 6000, amount_in, false).unwrap();
        // Plage symétrique et taux 1:1 : les deux directions sont équivalentes.
        assert!(swap_a.abs_diff(swap_b) <= 2 * MIN_SWAP_DELTA);
    }

    #[test]
    fn low_impact_curve_stays_near_half() {
        // Liquidité énorme devant le montant : l'impact est négligeable et
        // l'optimum reste proche de la moitié.
        let amount_in = 1_000_000_000u64;
        let meta = synthetic_metadata(0, 60, 0, 100_000_000_000_000_000_000);
        let oracle = ConstantLiquidityOracle::new(meta);
        let swap = solve_balanced_swap(&oracle, -6000, 6000, amount_in, true).unwrap();
        assert!(swap.abs_diff(amount_in / 2) <= amount_in / 100);
    }

    #[test]
    fn result_leaves_roughly_balanced_leftovers() {
        let amount_in = 1_000_000_000_000u64;
        let meta = synthetic_metadata(0, 60, 0, 100_000_000_000_000_000_000);
        let oracle = ConstantLiquidityOracle::new(meta);
        let swap = solve_balanced_swap(&oracle, -6000, 6000, amount_in, true).unwrap();

        let bounds =
            validated_range(oracle.metadata(), -6000, 6000, amount_in).unwrap();
        let report =
            evaluate_split(&oracle, &bounds, amount_in, true, swap, 0).unwrap();
        // Au point d'arrêt, aucun des deux restes ne doit dominer largement.
        let worst = report.leftover_a.max(report.leftover_b);
        assert!(worst < amount_in / 1_000, "restes déséquilibrés : {:?}", report);
    }
}
