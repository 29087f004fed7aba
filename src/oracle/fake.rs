// src/oracle/fake.rs
//
// Oracles synthétiques pour les tests de recherche. Deux modèles : un taux de
// change fixe sans impact de prix (liquidité infinie), et une courbe CLMM à
// liquidité constante sans croisement de tick. Les deux comptent leurs appels,
// ce qui permet de vérifier le nombre de quotes consommées par une recherche.

use std::cell::Cell;

use anyhow::{bail, Result};
use solana_sdk::pubkey::Pubkey;

use crate::math::swap_math::compute_swap_step;
use crate::math::tick_math::{
    tick_to_sqrt_price_x64, MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64,
};
use crate::oracle::{PoolMetadata, QuoteOracle, SwapQuote};

/// Métadonnées de pool plausibles pour un test : mints aléatoires, prix dérivé
/// du tick courant.
pub fn synthetic_metadata(
    tick_current: i32,
    tick_spacing: u16,
    trade_fee_rate: u32,
    liquidity: u128,
) -> PoolMetadata {
    PoolMetadata {
        address: Pubkey::new_unique(),
        mint_a: Pubkey::new_unique(),
        mint_b: Pubkey::new_unique(),
        mint_a_decimals: 9,
        mint_b_decimals: 6,
        tick_spacing,
        trade_fee_rate,
        liquidity,
        sqrt_price_x64: tick_to_sqrt_price_x64(tick_current)
            .expect("tick courant hors domaine"),
        tick_current,
    }
}

/// Convertit à taux fixe `num/den` sans bouger le prix. Modélise un pool de
/// profondeur infinie : l'optimum de la recherche y est connu en forme close.
pub struct FixedRatioOracle {
    pub meta: PoolMetadata,
    pub num: u64,
    pub den: u64,
    calls: Cell<u32>,
}

impl FixedRatioOracle {
    pub fn new(meta: PoolMetadata, num: u64, den: u64) -> Self {
        Self { meta, num, den, calls: Cell::new(0) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl QuoteOracle for FixedRatioOracle {
    fn metadata(&self) -> &PoolMetadata {
        &self.meta
    }

    fn quote(
        &self,
        token_in_mint: &Pubkey,
        amount_in: u64,
        _sqrt_price_limit_x64: u128,
    ) -> Result<SwapQuote> {
        self.calls.set(self.calls.get() + 1);
        if *token_in_mint != self.meta.mint_a && *token_in_mint != self.meta.mint_b {
            bail!("mint inconnu de l'oracle de test");
        }
        let amount_out = (amount_in as u128 * self.num as u128 / self.den as u128) as u64;
        Ok(SwapQuote { amount_out, sqrt_price_after_x64: self.meta.sqrt_price_x64 })
    }
}

/// Courbe CLMM à liquidité constante : un seul pas de swap, jamais de
/// croisement de tick. L'impact de prix est réel, ce qui rend l'optimum
/// non trivial.
pub struct ConstantLiquidityOracle {
    pub meta: PoolMetadata,
    calls: Cell<u32>,
}

impl ConstantLiquidityOracle {
    pub fn new(meta: PoolMetadata) -> Self {
        Self { meta, calls: Cell::new(0) }
    }

    pub fn calls(&self) -> u32 {
        self.calls.get()
    }
}

impl QuoteOracle for ConstantLiquidityOracle {
    fn metadata(&self) -> &PoolMetadata {
        &self.meta
    }

    fn quote(
        &self,
        token_in_mint: &Pubkey,
        amount_in: u64,
        sqrt_price_limit_x64: u128,
    ) -> Result<SwapQuote> {
        self.calls.set(self.calls.get() + 1);
        let is_base_input = if *token_in_mint == self.meta.mint_a {
            true
        } else if *token_in_mint == self.meta.mint_b {
            false
        } else {
            bail!("mint inconnu de l'oracle de test");
        };

        let target = if sqrt_price_limit_x64 != 0 {
            sqrt_price_limit_x64
        } else if is_base_input {
            MIN_SQRT_PRICE_X64 + 1
        } else {
            MAX_SQRT_PRICE_X64 - 1
        };

        let (next_price, _, amount_out, _) = compute_swap_step(
            self.meta.sqrt_price_x64,
            target,
            self.meta.liquidity,
            amount_in as u128,
            self.meta.trade_fee_rate,
            is_base_input,
        )
        .map_err(anyhow::Error::from)?;

        Ok(SwapQuote {
            amount_out: u64::try_from(amount_out)?,
            sqrt_price_after_x64: next_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ratio_counts_calls() {
        let oracle = FixedRatioOracle::new(synthetic_metadata(0, 60, 0, 0), 1, 1);
        let mint_a = oracle.meta.mint_a;
        oracle.quote(&mint_a, 1_000, 0).unwrap();
        oracle.quote(&mint_a, 2_000, 0).unwrap();
        assert_eq!(oracle.calls(), 2);
    }

    #[test]
    fn constant_liquidity_has_price_impact() {
        let meta = synthetic_metadata(0, 60, 0, 100_000_000_000_000_000_000);
        let oracle = ConstantLiquidityOracle::new(meta);
        let mint_a = oracle.meta.mint_a;
        // Tailles assez grandes pour que l'impact de prix domine le bruit
        // d'arrondi plancher sur le montant de sortie.
        let small = oracle.quote(&mint_a, 1_000_000_000_000, 0).unwrap();
        let large = oracle.quote(&mint_a, 10_000_000_000_000_000, 0).unwrap();
        // Le taux effectif se dégrade avec la taille.
        let small_rate = small.amount_out as f64 / 1_000_000_000_000.0;
        let large_rate = large.amount_out as f64 / 10_000_000_000_000_000.0;
        assert!(large_rate < small_rate);
        assert!(large.sqrt_price_after_x64 < small.sqrt_price_after_x64);
    }
}
