// src/math/full_math.rs
//
// Entiers larges et primitives multiply-then-divide. Tout le moteur passe par
// ces helpers : la direction d'arrondi (plancher ou plafond) est explicite à
// chaque appel, jamais implicite.

use uint::construct_uint;

construct_uint! { pub struct U128(2); }
construct_uint! { pub struct U256(4); }
construct_uint! { pub struct U512(8); }

pub trait MulDiv<RHS = Self> {
    type Output;
    /// (self * num) / denom, arrondi au plancher. `None` si denom == 0 ou si
    /// le résultat ne tient pas dans le type de sortie.
    fn mul_div_floor(self, num: RHS, denom: RHS) -> Option<Self::Output>;
    /// (self * num) / denom, arrondi au plafond.
    fn mul_div_ceil(self, num: RHS, denom: RHS) -> Option<Self::Output>;
}

impl MulDiv for u64 {
    type Output = u64;
    fn mul_div_floor(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom == 0 {
            return None;
        }
        let r = (self as u128 * num as u128) / denom as u128;
        u64::try_from(r).ok()
    }
    fn mul_div_ceil(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom == 0 {
            return None;
        }
        let r = (self as u128 * num as u128 + (denom as u128 - 1)) / denom as u128;
        u64::try_from(r).ok()
    }
}

impl MulDiv for u128 {
    type Output = u128;
    fn mul_div_floor(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom == 0 {
            return None;
        }
        let r = (U256::from(self) * U256::from(num)) / U256::from(denom);
        if r > U256::from(u128::MAX) { None } else { Some(r.as_u128()) }
    }
    fn mul_div_ceil(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom == 0 {
            return None;
        }
        let r = (U256::from(self) * U256::from(num) + U256::from(denom - 1)) / U256::from(denom);
        if r > U256::from(u128::MAX) { None } else { Some(r.as_u128()) }
    }
}

fn widen(x: U256) -> U512 {
    U512([x.0[0], x.0[1], x.0[2], x.0[3], 0, 0, 0, 0])
}

fn narrow(x: U512) -> U256 {
    U256([x.0[0], x.0[1], x.0[2], x.0[3]])
}

impl MulDiv for U256 {
    type Output = U256;
    fn mul_div_floor(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom.is_zero() {
            return None;
        }
        let r = (widen(self) * widen(num)) / widen(denom);
        if r > widen(U256::MAX) { None } else { Some(narrow(r)) }
    }
    fn mul_div_ceil(self, num: Self, denom: Self) -> Option<Self::Output> {
        if denom.is_zero() {
            return None;
        }
        let r = (widen(self) * widen(num) + widen(denom - 1)) / widen(denom);
        if r > widen(U256::MAX) { None } else { Some(narrow(r)) }
    }
}

/// Division plafond sur U256 (uint n'en fournit pas).
pub trait DivCeil<RHS = Self> {
    fn div_ceil(self, other: RHS) -> Self;
}

impl DivCeil for U256 {
    fn div_ceil(self, other: Self) -> Self {
        (self + other - U256::one()) / other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_and_ceil_differ_by_at_most_one() {
        assert_eq!(7u64.mul_div_floor(3, 2), Some(10));
        assert_eq!(7u64.mul_div_ceil(3, 2), Some(11));
        assert_eq!(8u64.mul_div_floor(3, 2), Some(12));
        assert_eq!(8u64.mul_div_ceil(3, 2), Some(12));
    }

    #[test]
    fn zero_denominator_is_none() {
        assert_eq!(1u64.mul_div_floor(1, 0), None);
        assert_eq!(1u128.mul_div_ceil(1, 0), None);
        assert_eq!(U256::one().mul_div_floor(U256::one(), U256::zero()), None);
    }

    #[test]
    fn result_too_large_is_none() {
        assert_eq!(u64::MAX.mul_div_floor(2, 1), None);
        assert_eq!(u128::MAX.mul_div_ceil(3, 2), None);
    }

    #[test]
    fn wide_intermediates_do_not_overflow() {
        // u128::MAX * u128::MAX tient dans U256, le quotient retombe en u128.
        assert_eq!(u128::MAX.mul_div_floor(u128::MAX, u128::MAX), Some(u128::MAX));
        let big = U256::MAX / U256::from(2u8);
        assert_eq!(big.mul_div_floor(U256::from(2u8), U256::from(2u8)), Some(big));
    }

    #[test]
    fn div_ceil_rounds_up() {
        assert_eq!(U256::from(10u8).div_ceil(U256::from(3u8)), U256::from(4u8));
        assert_eq!(U256::from(9u8).div_ceil(U256::from(3u8)), U256::from(3u8));
    }
}
