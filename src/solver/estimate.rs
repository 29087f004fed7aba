// src/solver/estimate.rs

use crate::error::ZapError;
use crate::math::full_math::{MulDiv, U256};
use crate::math::liquidity_math::{
    amount_a_for_liquidity, amount_b_for_liquidity, liquidity_for_amount_a,
    liquidity_for_amount_b,
};
use crate::oracle::PoolMetadata;
use crate::solver::validated_range;

/// Estimation en forme close du montant à swapper, sans aucun appel d'oracle.
///
/// Le raisonnement suppose le prix STATIQUE : la liquidité qu'un plein montant
/// du jeton d'entrée financerait sur son côté de la plage, le montant de
/// contrepartie que cette liquidité exigerait de l'autre côté, puis la valeur
/// de cette contrepartie ramenée en unités du jeton d'entrée via le prix carré
/// Q64. Le swap est alors la fraction `amount_in · v / (amount_in + v)`.
///
/// Positions dégénérées : prix au-delà de la borne éloignée, tout doit être
/// swappé ; prix au-delà de la borne proche, rien. L'estimation sous-évalue
/// systématiquement dès que le swap hypothétique bougerait le prix ; elle sert
/// d'amorce bon marché, pas de réponse finale.
pub fn estimate_swap_static(
    meta: &PoolMetadata,
    lower_tick: i32,
    upper_tick: i32,
    amount_in: u64,
    is_base_input: bool,
) -> Result<u64, ZapError> {
    let bounds = validated_range(meta, lower_tick, upper_tick, amount_in)?;
    let sqrt_price = meta.sqrt_price_x64;
    let q64 = U256::from(1u128 << 64);

    let counterpart_value = if is_base_input {
        if sqrt_price >= bounds.sqrt_price_upper_x64 {
            return Ok(amount_in);
        }
        if sqrt_price <= bounds.sqrt_price_lower_x64 {
            return Ok(0);
        }
        let liquidity =
            liquidity_for_amount_a(sqrt_price, bounds.sqrt_price_upper_x64, amount_in)?;
        let counterpart_b =
            amount_b_for_liquidity(bounds.sqrt_price_lower_x64, sqrt_price, liquidity, false)?;
        // Valeur du token B en unités de A : b · 2^128 / p².
        (U256::from(counterpart_b) << 128)
            / (U256::from(sqrt_price) * U256::from(sqrt_price))
    } else {
        if sqrt_price <= bounds.sqrt_price_lower_x64 {
            return Ok(amount_in);
        }
        if sqrt_price >= bounds.sqrt_price_upper_x64 {
            return Ok(0);
        }
        let liquidity =
            liquidity_for_amount_b(bounds.sqrt_price_lower_x64, sqrt_price, amount_in)?;
        let counterpart_a =
            amount_a_for_liquidity(sqrt_price, bounds.sqrt_price_upper_x64, liquidity, false)?;
        // Valeur du token A en unités de B : a · p² / 2^128, en deux étages
        // pour rester dans U256.
        U256::from(counterpart_a)
            .mul_div_floor(U256::from(sqrt_price), q64)
            .ok_or(ZapError::Overflow)?
            .mul_div_floor(U256::from(sqrt_price), q64)
            .ok_or(ZapError::Overflow)?
    };

    let amount = U256::from(amount_in);
    let swap = amount * counterpart_value / (amount + counterpart_value);
    Ok(swap.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::fake::{synthetic_metadata, ConstantLiquidityOracle};
    use crate::solver::solve_balanced_swap;

    #[test]
    fn symmetric_range_at_center_estimates_half() {
        let meta = synthetic_metadata(0, 60, 0, 0);
        let amount_in = 2_000_000_000u64;
        let swap = estimate_swap_static(&meta, -6000, 6000, amount_in, true).unwrap();
        assert!(swap.abs_diff(amount_in / 2) <= amount_in / 100);
        let swap_b = estimate_swap_static(&meta, -6000, 6000, amount_in, false).unwrap();
        assert!(swap_b.abs_diff(amount_in / 2) <= amount_in / 100);
    }

    #[test]
    fn degenerate_positions_are_all_or_nothing() {
        let amount_in = 1_000_000u64;
        // Prix sous la plage : la position est 100 % token A.
        let below = synthetic_metadata(-7020, 60, 0, 0);
        assert_eq!(estimate_swap_static(&below, -6000, 6000, amount_in, true).unwrap(), 0);
        assert_eq!(
            estimate_swap_static(&below, -6000, 6000, amount_in, false).unwrap(),
            amount_in
        );
        // Prix au-dessus : la position est 100 % token B.
        let above = synthetic_metadata(7020, 60, 0, 0);
        assert_eq!(
            estimate_swap_static(&above, -6000, 6000, amount_in, true).unwrap(),
            amount_in
        );
        assert_eq!(estimate_swap_static(&above, -6000, 6000, amount_in, false).unwrap(), 0);
    }

    #[test]
    fn understates_more_as_price_impact_grows() {
        // Face à une courbe à liquidité constante, l'écart entre l'estimation
        // statique et la recherche complète doit croître avec le montant.
        let meta = synthetic_metadata(0, 60, 0, 100_000_000_000_000_000_000);
        let mut errors = Vec::new();
        for amount_in in [1_000_000_000_000u64, 1_000_000_000_000_000, 1_000_000_000_000_000_000]
        {
            let oracle = ConstantLiquidityOracle::new(meta.clone());
            let searched =
                solve_balanced_swap(&oracle, -6000, 6000, amount_in, true).unwrap();
            let estimated =
                estimate_swap_static(&meta, -6000, 6000, amount_in, true).unwrap();
            errors.push(searched.abs_diff(estimated));
        }
        assert!(errors[0] < errors[1] && errors[1] < errors[2], "erreurs : {:?}", errors);
    }
}
