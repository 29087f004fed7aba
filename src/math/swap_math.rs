// src/math/swap_math.rs
//
// Pas élémentaire de swap à l'intérieur d'une région de liquidité constante.
// C'est le substrat de l'oracle de quote : la recherche elle-même ne s'en sert
// jamais directement. Les frais (en parts par million) sont prélevés sur
// l'entrée, arrondis au plafond ; les sorties sont arrondies au plancher.

use crate::error::ZapError;
use crate::math::full_math::{MulDiv, U256};
use crate::math::liquidity_math::{amount_a_delta, amount_b_delta};

pub const FEE_RATE_DENOMINATOR: u64 = 1_000_000;

/// Prix racine atteint en ajoutant `amount_in` de token A (le prix baisse).
pub fn next_sqrt_price_from_amount_a_in(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_in: u128,
) -> Result<u128, ZapError> {
    if amount_in == 0 {
        return Ok(sqrt_price_x64);
    }
    if liquidity == 0 {
        return Err(ZapError::Overflow);
    }
    let numerator = U256::from(liquidity) << 64;
    let product = U256::from(amount_in) * U256::from(sqrt_price_x64);

    match numerator.checked_add(product) {
        // Cas exact : L·2^64·√P / (L·2^64 + a·√P), arrondi au plafond pour ne
        // jamais sous-estimer le déplacement de prix.
        Some(denominator) => {
            let next = numerator
                .mul_div_ceil(U256::from(sqrt_price_x64), denominator)
                .ok_or(ZapError::Overflow)?;
            Ok(next.as_u128())
        }
        // Repli si a·√P déborde : formule équivalente avec une division de plus.
        None => {
            let next =
                numerator / (numerator / U256::from(sqrt_price_x64) + U256::from(amount_in));
            Ok(next.as_u128())
        }
    }
}

/// Prix racine atteint en ajoutant `amount_in` de token B (le prix monte).
pub fn next_sqrt_price_from_amount_b_in(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_in: u128,
) -> Result<u128, ZapError> {
    if amount_in == 0 {
        return Ok(sqrt_price_x64);
    }
    if liquidity == 0 {
        return Err(ZapError::Overflow);
    }
    let quotient = (U256::from(amount_in) << 64) / U256::from(liquidity);
    let next = U256::from(sqrt_price_x64) + quotient;
    if next > U256::from(u128::MAX) {
        return Err(ZapError::Overflow);
    }
    Ok(next.as_u128())
}

/// Exécute un pas de swap entre le prix courant et un prix cible, borné par
/// `amount_remaining` (frais inclus). Renvoie (prix atteint, montant d'entrée
/// net, montant de sortie, frais).
pub fn compute_swap_step(
    sqrt_price_current_x64: u128,
    sqrt_price_target_x64: u128,
    liquidity: u128,
    amount_remaining: u128,
    fee_rate: u32,
    is_base_input: bool,
) -> Result<(u128, u128, u128, u128), ZapError> {
    let fee_rate = fee_rate as u128;
    let denominator = FEE_RATE_DENOMINATOR as u128;
    if fee_rate >= denominator {
        return Err(ZapError::Overflow);
    }

    let amount_remaining_less_fee = amount_remaining
        .mul_div_floor(denominator - fee_rate, denominator)
        .ok_or(ZapError::Overflow)?;

    let (sqrt_price_next_x64, amount_in, amount_out);
    if is_base_input {
        // On fournit du token A : le prix descend vers la cible.
        let amount_to_target =
            amount_a_delta(sqrt_price_target_x64, sqrt_price_current_x64, liquidity, true)?;
        if amount_remaining_less_fee >= amount_to_target {
            sqrt_price_next_x64 = sqrt_price_target_x64;
            amount_in = amount_to_target;
        } else {
            sqrt_price_next_x64 = next_sqrt_price_from_amount_a_in(
                sqrt_price_current_x64,
                liquidity,
                amount_remaining_less_fee,
            )?;
            amount_in = amount_remaining_less_fee;
        }
        amount_out =
            amount_b_delta(sqrt_price_next_x64, sqrt_price_current_x64, liquidity, false)?;
    } else {
        // On fournit du token B : le prix monte vers la cible.
        let amount_to_target =
            amount_b_delta(sqrt_price_current_x64, sqrt_price_target_x64, liquidity, true)?;
        if amount_remaining_less_fee >= amount_to_target {
            sqrt_price_next_x64 = sqrt_price_target_x64;
            amount_in = amount_to_target;
        } else {
            sqrt_price_next_x64 = next_sqrt_price_from_amount_b_in(
                sqrt_price_current_x64,
                liquidity,
                amount_remaining_less_fee,
            )?;
            amount_in = amount_remaining_less_fee;
        }
        amount_out =
            amount_a_delta(sqrt_price_current_x64, sqrt_price_next_x64, liquidity, false)?;
    }

    // Les frais sont calculés sur l'entrée NETTE, arrondis au plafond.
    let fee_amount = amount_in
        .mul_div_ceil(fee_rate, denominator - fee_rate)
        .ok_or(ZapError::Overflow)?;

    Ok((sqrt_price_next_x64, amount_in, amount_out, fee_amount))
}
