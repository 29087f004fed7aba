// src/math/liquidity_math.rs
//
// Conversions liquidité <-> montants pour une plage de prix. Le découpage en
// trois cas selon la position du prix courant (sous la plage, dedans, au-dessus)
// est l'invariant porteur : se tromper de branche alloue silencieusement les
// jetons du mauvais côté. Tous les arrondis de sortie sont au plancher, ce qui
// garantit que les montants reconvertis ne dépassent jamais les montants qui
// ont financé la liquidité.

use crate::error::ZapError;
use crate::math::full_math::{DivCeil, MulDiv, U256};

const Q64: u128 = 1u128 << 64;

fn sorted(sqrt_price_a: u128, sqrt_price_b: u128) -> (u128, u128) {
    if sqrt_price_a > sqrt_price_b {
        (sqrt_price_b, sqrt_price_a)
    } else {
        (sqrt_price_a, sqrt_price_b)
    }
}

/// Liquidité maximale que `amount_a` (token A seul) peut financer entre deux
/// prix racine : L = a · (√Pa·√Pb / 2^64) / (√Pb − √Pa).
pub fn liquidity_for_amount_a(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    amount_a: u64,
) -> Result<u128, ZapError> {
    let (lower, upper) = sorted(sqrt_price_a_x64, sqrt_price_b_x64);
    if lower == 0 || lower == upper {
        return Err(ZapError::InvalidRange);
    }
    let intermediate = U256::from(lower)
        .mul_div_floor(U256::from(upper), U256::from(Q64))
        .ok_or(ZapError::Overflow)?;
    let liquidity = U256::from(amount_a)
        .mul_div_floor(intermediate, U256::from(upper - lower))
        .ok_or(ZapError::Overflow)?;
    if liquidity > U256::from(u128::MAX) {
        return Err(ZapError::Overflow);
    }
    Ok(liquidity.as_u128())
}

/// Liquidité maximale que `amount_b` (token B seul) peut financer :
/// L = b · 2^64 / (√Pb − √Pa).
pub fn liquidity_for_amount_b(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    amount_b: u64,
) -> Result<u128, ZapError> {
    let (lower, upper) = sorted(sqrt_price_a_x64, sqrt_price_b_x64);
    if lower == upper {
        return Err(ZapError::InvalidRange);
    }
    let liquidity = (U256::from(amount_b) << 64) / U256::from(upper - lower);
    if liquidity > U256::from(u128::MAX) {
        return Err(ZapError::Overflow);
    }
    Ok(liquidity.as_u128())
}

/// Montant de token A couvert par `liquidity` entre deux prix racine, en u128
/// (utilisé par la simulation de swap, où le delta peut dépasser u64).
pub fn amount_a_delta(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, ZapError> {
    let (lower, upper) = sorted(sqrt_price_a_x64, sqrt_price_b_x64);
    if lower == 0 {
        return Err(ZapError::InvalidRange);
    }
    let numerator_1 = U256::from(liquidity) << 64;
    let numerator_2 = U256::from(upper - lower);

    let result = if round_up {
        numerator_1
            .mul_div_ceil(numerator_2, U256::from(upper))
            .ok_or(ZapError::Overflow)?
            .div_ceil(U256::from(lower))
    } else {
        numerator_1
            .mul_div_floor(numerator_2, U256::from(upper))
            .ok_or(ZapError::Overflow)?
            / U256::from(lower)
    };
    if result > U256::from(u128::MAX) {
        return Err(ZapError::Overflow);
    }
    Ok(result.as_u128())
}

/// Montant de token B couvert par `liquidity` entre deux prix racine, en u128.
pub fn amount_b_delta(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128, ZapError> {
    let (lower, upper) = sorted(sqrt_price_a_x64, sqrt_price_b_x64);
    let result = if round_up {
        U256::from(liquidity)
            .mul_div_ceil(U256::from(upper - lower), U256::from(Q64))
            .ok_or(ZapError::Overflow)?
    } else {
        U256::from(liquidity)
            .mul_div_floor(U256::from(upper - lower), U256::from(Q64))
            .ok_or(ZapError::Overflow)?
    };
    if result > U256::from(u128::MAX) {
        return Err(ZapError::Overflow);
    }
    Ok(result.as_u128())
}

/// Variante u64 de `amount_a_delta`, pour le dimensionnement de position.
pub fn amount_a_for_liquidity(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64, ZapError> {
    let amount = amount_a_delta(sqrt_price_a_x64, sqrt_price_b_x64, liquidity, round_up)?;
    u64::try_from(amount).map_err(|_| ZapError::Overflow)
}

/// Variante u64 de `amount_b_delta`.
pub fn amount_b_for_liquidity(
    sqrt_price_a_x64: u128,
    sqrt_price_b_x64: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u64, ZapError> {
    let amount = amount_b_delta(sqrt_price_a_x64, sqrt_price_b_x64, liquidity, round_up)?;
    u64::try_from(amount).map_err(|_| ZapError::Overflow)
}

/// Liquidité maximale finançable par (amount_a, amount_b) sur [lower, upper]
/// au prix courant donné.
///
/// - prix sous la plage : toute la valeur doit être en token A, seule la borne
///   token A compte ;
/// - prix au-dessus : seule la borne token B compte ;
/// - prix dedans : minimum des deux bornes, chacune calculée sur l'intervalle
///   PARTIEL entre le prix courant et la borne concernée.
pub fn liquidity_for_amounts(
    sqrt_price_current_x64: u128,
    sqrt_price_lower_x64: u128,
    sqrt_price_upper_x64: u128,
    amount_a: u64,
    amount_b: u64,
) -> Result<u128, ZapError> {
    if sqrt_price_lower_x64 >= sqrt_price_upper_x64 {
        return Err(ZapError::InvalidRange);
    }
    if sqrt_price_current_x64 <= sqrt_price_lower_x64 {
        liquidity_for_amount_a(sqrt_price_lower_x64, sqrt_price_upper_x64, amount_a)
    } else if sqrt_price_current_x64 >= sqrt_price_upper_x64 {
        liquidity_for_amount_b(sqrt_price_lower_x64, sqrt_price_upper_x64, amount_b)
    } else {
        let bound_a =
            liquidity_for_amount_a(sqrt_price_current_x64, sqrt_price_upper_x64, amount_a)?;
        let bound_b =
            liquidity_for_amount_b(sqrt_price_lower_x64, sqrt_price_current_x64, amount_b)?;
        Ok(bound_a.min(bound_b))
    }
}

/// Inverse exact de `liquidity_for_amounts` : les montants nécessaires pour
/// exprimer `liquidity` sur [lower, upper] au prix courant. Même découpage en
/// trois cas, arrondi au plancher.
pub fn amounts_for_liquidity(
    sqrt_price_current_x64: u128,
    sqrt_price_lower_x64: u128,
    sqrt_price_upper_x64: u128,
    liquidity: u128,
) -> Result<(u64, u64), ZapError> {
    if sqrt_price_lower_x64 >= sqrt_price_upper_x64 {
        return Err(ZapError::InvalidRange);
    }
    if sqrt_price_current_x64 <= sqrt_price_lower_x64 {
        let amount_a =
            amount_a_for_liquidity(sqrt_price_lower_x64, sqrt_price_upper_x64, liquidity, false)?;
        Ok((amount_a, 0))
    } else if sqrt_price_current_x64 >= sqrt_price_upper_x64 {
        let amount_b =
            amount_b_for_liquidity(sqrt_price_lower_x64, sqrt_price_upper_x64, liquidity, false)?;
        Ok((0, amount_b))
    } else {
        let amount_a =
            amount_a_for_liquidity(sqrt_price_current_x64, sqrt_price_upper_x64, liquidity, false)?;
        let amount_b =
            amount_b_for_liquidity(sqrt_price_lower_x64, sqrt_price_current_x64, liquidity, false)?;
        Ok((amount_a, amount_b))
    }
}
