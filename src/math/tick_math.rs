// src/math/tick_math.rs
//
// Conversion tick <-> prix racine en Q64.64. Le prix racine d'un tick t vaut
// 1.0001^(t/2), encodé sur 64 bits de partie fractionnaire. La table de
// multiplicateurs ci-dessous est la décomposition binaire standard des CLMM :
// un facteur pré-calculé par bit de |t|, en partant de 1.0001^(-1/2).

use crate::error::ZapError;
use crate::math::full_math::U128;

pub const MIN_TICK: i32 = -443636;
pub const MAX_TICK: i32 = 443636;

/// Valeur minimale que peut renvoyer `tick_to_sqrt_price_x64` (tick -443636).
pub const MIN_SQRT_PRICE_X64: u128 = 4295048016;
/// Valeur maximale que peut renvoyer `tick_to_sqrt_price_x64` (tick 443636).
pub const MAX_SQRT_PRICE_X64: u128 = 79226673521066979257578248091;

const NUM_64: U128 = U128([64, 0]);
const BIT_PRECISION: u32 = 16;

/// Calcule le prix racine Q64.64 d'un tick. Strictement croissant en `tick`.
/// Échoue avec `InvalidTick` hors du domaine ±443636.
pub fn tick_to_sqrt_price_x64(tick: i32) -> Result<u128, ZapError> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK as u32 {
        return Err(ZapError::InvalidTick(tick));
    }

    // La chaîne calcule 1.0001^(-|t|/2) en Q64 ; chaque produit tient dans
    // 128 bits car le ratio reste <= 2^64.
    let mut ratio = if abs_tick & 0x1 != 0 {
        U128([0xfffcb933bd6fb800, 0])
    } else {
        U128([0, 1])
    };
    if abs_tick & 0x2 != 0 {
        ratio = (ratio * U128([0xfff97272373d4000, 0])) >> NUM_64;
    }
    if abs_tick & 0x4 != 0 {
        ratio = (ratio * U128([0xfff2e50f5f657000, 0])) >> NUM_64;
    }
    if abs_tick & 0x8 != 0 {
        ratio = (ratio * U128([0xffe5caca7e10f000, 0])) >> NUM_64;
    }
    if abs_tick & 0x10 != 0 {
        ratio = (ratio * U128([0xffcb9843d60f7000, 0])) >> NUM_64;
    }
    if abs_tick & 0x20 != 0 {
        ratio = (ratio * U128([0xff973b41fa98e800, 0])) >> NUM_64;
    }
    if abs_tick & 0x40 != 0 {
        ratio = (ratio * U128([0xff2ea16466c9b000, 0])) >> NUM_64;
    }
    if abs_tick & 0x80 != 0 {
        ratio = (ratio * U128([0xfe5dee046a9a3800, 0])) >> NUM_64;
    }
    if abs_tick & 0x100 != 0 {
        ratio = (ratio * U128([0xfcbe86c7900bb000, 0])) >> NUM_64;
    }
    if abs_tick & 0x200 != 0 {
        ratio = (ratio * U128([0xf987a7253ac65800, 0])) >> NUM_64;
    }
    if abs_tick & 0x400 != 0 {
        ratio = (ratio * U128([0xf3392b0822bb6000, 0])) >> NUM_64;
    }
    if abs_tick & 0x800 != 0 {
        ratio = (ratio * U128([0xe7159475a2caf000, 0])) >> NUM_64;
    }
    if abs_tick & 0x1000 != 0 {
        ratio = (ratio * U128([0xd097f3bdfd2f2000, 0])) >> NUM_64;
    }
    if abs_tick & 0x2000 != 0 {
        ratio = (ratio * U128([0xa9f746462d9f8000, 0])) >> NUM_64;
    }
    if abs_tick & 0x4000 != 0 {
        ratio = (ratio * U128([0x70d869a156f31c00, 0])) >> NUM_64;
    }
    if abs_tick & 0x8000 != 0 {
        ratio = (ratio * U128([0x31be135f97ed3200, 0])) >> NUM_64;
    }
    if abs_tick & 0x10000 != 0 {
        ratio = (ratio * U128([0x9aa508b5b85a500, 0])) >> NUM_64;
    }
    if abs_tick & 0x20000 != 0 {
        ratio = (ratio * U128([0x5d6af8dedc582c, 0])) >> NUM_64;
    }
    if abs_tick & 0x40000 != 0 {
        ratio = (ratio * U128([0x2216e584f5fa, 0])) >> NUM_64;
    }

    // Pour un tick positif, on inverse le ratio (1.0001^(t/2) = 1 / 1.0001^(-t/2)).
    if tick > 0 {
        ratio = U128::MAX / ratio;
    }
    Ok(ratio.as_u128())
}

/// Inverse de `tick_to_sqrt_price_x64` : le plus grand tick dont le prix
/// racine est inférieur ou égal à `sqrt_price_x64`. Approximation du log2 par
/// élévations au carré successives, puis levée d'ambiguïté sur un tick.
pub fn tick_at_sqrt_price_x64(sqrt_price_x64: u128) -> Result<i32, ZapError> {
    if !(MIN_SQRT_PRICE_X64..MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64) {
        return Err(ZapError::InvalidSqrtPrice(sqrt_price_x64));
    }

    let msb = 128 - sqrt_price_x64.leading_zeros() - 1;
    let log2p_integer_x32 = (msb as i128 - 64) << 32;

    let mut bit: i128 = 0x8000_0000_0000_0000i128;
    let mut precision = 0;
    let mut log2p_fraction_x64 = 0;

    let mut r = if msb >= 64 {
        sqrt_price_x64 >> (msb - 63)
    } else {
        sqrt_price_x64 << (63 - msb)
    };

    while bit > 0 && precision < BIT_PRECISION {
        r *= r;
        let is_r_more_than_two = r >> 127_u32;
        r >>= 63 + is_r_more_than_two;
        log2p_fraction_x64 += bit * is_r_more_than_two as i128;
        bit >>= 1;
        precision += 1;
    }

    let log2p_fraction_x32 = log2p_fraction_x64 >> 32;
    let log2p_x32 = log2p_integer_x32 + log2p_fraction_x32;

    // Changement de base : log en base sqrt(1.0001).
    let log_sqrt_10001_x64 = log2p_x32 * 59543866431248i128;

    let tick_low: i32 = ((log_sqrt_10001_x64 - 184467440737095516i128) >> 64) as i32;
    let tick_high: i32 = ((log_sqrt_10001_x64 + 15793534762490258745i128) >> 64) as i32;

    Ok(if tick_low == tick_high {
        tick_low
    } else if tick_to_sqrt_price_x64(tick_high)? <= sqrt_price_x64 {
        tick_high
    } else {
        tick_low
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tick_zero_is_unit_price() {
        assert_eq!(tick_to_sqrt_price_x64(0).unwrap(), 1u128 << 64);
    }

    #[test]
    fn domain_bounds_match_constants() {
        assert_eq!(tick_to_sqrt_price_x64(MIN_TICK).unwrap(), MIN_SQRT_PRICE_X64);
        assert_eq!(tick_to_sqrt_price_x64(MAX_TICK).unwrap(), MAX_SQRT_PRICE_X64);
    }

    #[test]
    fn out_of_domain_fails() {
        assert!(matches!(
            tick_to_sqrt_price_x64(MAX_TICK + 1),
            Err(ZapError::InvalidTick(_))
        ));
        assert!(matches!(
            tick_to_sqrt_price_x64(MIN_TICK - 1),
            Err(ZapError::InvalidTick(_))
        ));
    }

    #[test]
    fn strictly_increasing_on_sample() {
        let mut tick = MIN_TICK;
        while tick < MAX_TICK {
            let next = (tick + 15_073).min(MAX_TICK);
            assert!(
                tick_to_sqrt_price_x64(tick).unwrap() < tick_to_sqrt_price_x64(next).unwrap(),
                "pas de croissance entre {} et {}",
                tick,
                next
            );
            tick = next;
        }
        for t in [-2i32, -1, 0, 1] {
            assert!(tick_to_sqrt_price_x64(t).unwrap() < tick_to_sqrt_price_x64(t + 1).unwrap());
        }
    }

    #[test]
    fn inverse_recovers_tick_on_sample() {
        for t in [-126_200, -123_000, -443_000, -1, 0, 1, 100, 44_000, 443_000] {
            let price = tick_to_sqrt_price_x64(t).unwrap();
            assert_eq!(tick_at_sqrt_price_x64(price).unwrap(), t);
        }
    }

    proptest! {
        #[test]
        fn monotonic_and_invertible(tick in MIN_TICK..MAX_TICK) {
            let price = tick_to_sqrt_price_x64(tick).unwrap();
            let next = tick_to_sqrt_price_x64(tick + 1).unwrap();
            prop_assert!(price < next);
            prop_assert_eq!(tick_at_sqrt_price_x64(price).unwrap(), tick);
        }
    }
}
