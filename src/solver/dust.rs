// src/solver/dust.rs

use tracing::debug;

use crate::error::ZapError;
use crate::math::tick_math::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64};
use crate::oracle::QuoteOracle;
use crate::solver::{
    evaluate_split, validated_range, SearchState, DUST_THRESHOLD, LEFTOVER_TRIM_STEP,
    MAX_SEARCH_ITERATIONS,
};

fn trim(leftover: u64) -> u64 {
    leftover - leftover % LEFTOVER_TRIM_STEP
}

/// Recherche à seuil de poussière. Diffère de la bissection symétrique sur
/// quatre points : les quotes portent une limite de prix dure à l'extrême
/// opposé du domaine ; les restes sont rabotés au pas de 100 avant
/// comparaison ; l'arrêt est un seuil absolu sur les deux restes rabotés ; et
/// le resserrement est à trois voies, le candidat étant recalculé contre la
/// borne qui vient de bouger. Renvoie (liquidité, montant à swapper).
///
/// Atteindre le plafond d'itérations sans passer sous le seuil n'est PAS une
/// erreur : le meilleur candidat visité (pire reste minimal) est renvoyé tel
/// quel, à l'appelant de vérifier les restes si l'exactitude lui importe.
pub fn solve_dust_bounded_swap(
    oracle: &dyn QuoteOracle,
    lower_tick: i32,
    upper_tick: i32,
    amount_in: u64,
    is_base_input: bool,
) -> Result<(u128, u64), ZapError> {
    let bounds = validated_range(oracle.metadata(), lower_tick, upper_tick, amount_in)?;
    let sqrt_price_limit_x64 = if is_base_input {
        MIN_SQRT_PRICE_X64 + 1
    } else {
        MAX_SQRT_PRICE_X64 - 1
    };

    let mut state = SearchState::new(amount_in);
    let mut best = (0u128, state.candidate);
    let mut best_worst_leftover = u64::MAX;

    for iteration in 0..MAX_SEARCH_ITERATIONS {
        let report = evaluate_split(
            oracle,
            &bounds,
            amount_in,
            is_base_input,
            state.candidate,
            sqrt_price_limit_x64,
        )?;
        // Candidat au pire reste minimal parmi tous ceux visités : c'est lui
        // qui est rendu si le plafond tombe sans convergence.
        let worst_leftover = report.leftover_a.max(report.leftover_b);
        if worst_leftover < best_worst_leftover {
            best_worst_leftover = worst_leftover;
            best = (report.liquidity, state.candidate);
        }

        let (input_leftover, output_leftover) = if is_base_input {
            (trim(report.leftover_a), trim(report.leftover_b))
        } else {
            (trim(report.leftover_b), trim(report.leftover_a))
        };

        debug!(
            iteration,
            candidate = state.candidate,
            input_leftover,
            output_leftover,
            "pas de recherche dust"
        );

        if input_leftover <= DUST_THRESHOLD && output_leftover <= DUST_THRESHOLD {
            return Ok((report.liquidity, state.candidate));
        }

        if input_leftover > 0 {
            // Pas assez swappé : le vrai optimum est au-dessus du candidat.
            state.low = state.candidate;
            state.candidate += (state.high - state.candidate) / 2;
        } else if output_leftover > 0 {
            // Trop swappé : l'optimum est en dessous.
            state.high = state.candidate;
            state.candidate = state.low + (state.candidate - state.low) / 2;
        } else {
            // Aucun reste : découpage exact.
            return Ok((report.liquidity, state.candidate));
        }
    }

    Ok(best)
}
