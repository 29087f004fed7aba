// src/oracle/quoter.rs
//
// Simulation de swap par marche de ticks sur un `ZapPool` hydraté. La marche
// avance de tick initialisé en tick initialisé : un pas de swap borné par le
// prochain croisement, puis ajustement de la liquidité par le liquidity_net du
// tick franchi. En descendant, le net se SOUSTRAIT ; en montant, il s'ajoute.

use anyhow::{anyhow, bail, Context, Result};
use solana_sdk::pubkey::Pubkey;

use crate::math::swap_math::compute_swap_step;
use crate::math::tick_math::{
    tick_to_sqrt_price_x64, MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64,
};
use crate::oracle::{PoolMetadata, QuoteOracle, SwapQuote, ZapPool};

impl ZapPool {
    /// Prochain tick initialisé dans la direction de la marche. En descente,
    /// le tick courant lui-même est un candidat (le prix peut être juste
    /// au-dessus de sa frontière) ; en montée, on cherche strictement après.
    fn next_initialized_tick(&self, current_tick: i32, downward: bool) -> Option<(i32, i128)> {
        if downward {
            self.ticks
                .range(..=current_tick)
                .next_back()
                .map(|(t, net)| (*t, *net))
        } else {
            self.ticks
                .range(current_tick + 1..)
                .next()
                .map(|(t, net)| (*t, *net))
        }
    }
}

fn apply_liquidity_net(liquidity: u128, net: i128, downward: bool) -> Result<u128> {
    let delta = if downward {
        net.checked_neg()
            .ok_or_else(|| anyhow!("liquidity_net hors domaine"))?
    } else {
        net
    };
    if delta >= 0 {
        liquidity
            .checked_add(delta as u128)
            .ok_or_else(|| anyhow!("débordement de liquidité au croisement de tick"))
    } else {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or_else(|| anyhow!("liquidité négative au croisement de tick"))
    }
}

impl QuoteOracle for ZapPool {
    fn metadata(&self) -> &PoolMetadata {
        &self.meta
    }

    fn quote(
        &self,
        token_in_mint: &Pubkey,
        amount_in: u64,
        sqrt_price_limit_x64: u128,
    ) -> Result<SwapQuote> {
        let is_base_input = if *token_in_mint == self.meta.mint_a {
            true
        } else if *token_in_mint == self.meta.mint_b {
            false
        } else {
            bail!("le mint {} n'appartient pas au pool {}", token_in_mint, self.meta.address);
        };

        let mut sqrt_price = self.meta.sqrt_price_x64;
        if amount_in == 0 {
            return Ok(SwapQuote { amount_out: 0, sqrt_price_after_x64: sqrt_price });
        }

        // Limite effective : celle de l'appelant, sinon la borne extrême du
        // domaine de prix dans la direction du swap.
        let price_limit = if sqrt_price_limit_x64 == 0 {
            if is_base_input {
                MIN_SQRT_PRICE_X64 + 1
            } else {
                MAX_SQRT_PRICE_X64 - 1
            }
        } else {
            if is_base_input && sqrt_price_limit_x64 >= sqrt_price {
                bail!("limite de prix du mauvais côté pour une entrée en token A");
            }
            if !is_base_input && sqrt_price_limit_x64 <= sqrt_price {
                bail!("limite de prix du mauvais côté pour une entrée en token B");
            }
            sqrt_price_limit_x64
        };

        let mut amount_remaining = amount_in as u128;
        let mut total_amount_out: u128 = 0;
        let mut liquidity = self.meta.liquidity;
        let mut tick_current = self.meta.tick_current;

        while amount_remaining > 0 && sqrt_price != price_limit {
            let crossing = self.next_initialized_tick(tick_current, is_base_input);
            // Liquidité à sec et plus aucun tick chargé : le prix ne bouge plus.
            if liquidity == 0 && crossing.is_none() {
                break;
            }
            let target_price = match crossing {
                Some((tick, _)) => tick_to_sqrt_price_x64(tick)?,
                None => price_limit,
            };
            let clamped_target = if is_base_input {
                target_price.max(price_limit)
            } else {
                target_price.min(price_limit)
            };

            let (next_price, step_in, step_out, step_fee) = compute_swap_step(
                sqrt_price,
                clamped_target,
                liquidity,
                amount_remaining,
                self.meta.trade_fee_rate,
                is_base_input,
            )?;

            amount_remaining = amount_remaining.saturating_sub(step_in + step_fee);
            total_amount_out = total_amount_out.saturating_add(step_out);
            sqrt_price = next_price;

            match crossing {
                Some((tick, net))
                    if next_price == target_price && clamped_target == target_price =>
                {
                    liquidity = apply_liquidity_net(liquidity, net, is_base_input)?;
                    tick_current = if is_base_input { tick - 1 } else { tick };
                }
                // Entrée épuisée, limite atteinte, ou plus aucun tick chargé :
                // la marche s'arrête là.
                _ => break,
            }
        }

        let amount_out = u64::try_from(total_amount_out)
            .context("montant de sortie hors du domaine u64")?;
        Ok(SwapQuote { amount_out, sqrt_price_after_x64: sqrt_price })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::liquidity_math::amount_b_for_liquidity;
    use crate::oracle::fake::synthetic_metadata;
    use std::collections::BTreeMap;

    const LIQUIDITY: u128 = 100_000_000_000_000_000_000; // 1e20

    // Pool avec une seule position [-6000, 6000] portant la liquidité des
    // métadonnées fournies.
    fn pool_with_meta(meta: PoolMetadata) -> ZapPool {
        let mut ticks = BTreeMap::new();
        ticks.insert(-6000, meta.liquidity as i128);
        ticks.insert(6000, -(meta.liquidity as i128));
        ZapPool {
            meta,
            program_id: crate::oracle::RAYDIUM_CLMM_PROGRAM_ID,
            amm_config: Pubkey::new_unique(),
            tick_array_bitmap: [0; 16],
            ticks,
        }
    }

    fn single_position_pool(trade_fee_rate: u32) -> ZapPool {
        pool_with_meta(synthetic_metadata(0, 60, trade_fee_rate, LIQUIDITY))
    }

    #[test]
    fn base_input_pushes_price_down() {
        let pool = single_position_pool(0);
        let mint_a = pool.meta.mint_a;
        let quote = pool.quote(&mint_a, 1_000_000_000, 0).unwrap();
        assert!(quote.amount_out > 0);
        assert!(quote.sqrt_price_after_x64 < pool.meta.sqrt_price_x64);
    }

    #[test]
    fn quote_input_pushes_price_up() {
        let pool = single_position_pool(0);
        let mint_b = pool.meta.mint_b;
        let quote = pool.quote(&mint_b, 1_000_000_000, 0).unwrap();
        assert!(quote.amount_out > 0);
        assert!(quote.sqrt_price_after_x64 > pool.meta.sqrt_price_x64);
    }

    #[test]
    fn output_is_capped_by_loaded_liquidity() {
        // Profondeur réduite : l'entrée u64::MAX suffit largement à vider la
        // position et les montants aux bornes tiennent dans un u64.
        let depth: u128 = 1_000_000_000_000_000_000; // 1e18
        let pool = pool_with_meta(synthetic_metadata(0, 60, 0, depth));
        let mint_a = pool.meta.mint_a;
        // Bien plus que ce que la position peut absorber.
        let quote = pool.quote(&mint_a, u64::MAX, 0).unwrap();

        let lower = tick_to_sqrt_price_x64(-6000).unwrap();
        let current = pool.meta.sqrt_price_x64;
        let max_out = amount_b_for_liquidity(lower, current, depth, false).unwrap();
        assert!(quote.amount_out <= max_out);
        // La marche doit s'arrêter exactement à la borne de la position.
        assert_eq!(quote.sqrt_price_after_x64, lower);
        // Et la quasi-totalité du token B de la position doit être sortie.
        assert!(quote.amount_out >= max_out - max_out / 1_000);
    }

    #[test]
    fn price_limit_is_respected() {
        let pool = single_position_pool(0);
        let mint_a = pool.meta.mint_a;
        let limit = tick_to_sqrt_price_x64(-3000).unwrap();
        let unlimited = pool.quote(&mint_a, u64::MAX, 0).unwrap();
        let limited = pool.quote(&mint_a, u64::MAX, limit).unwrap();
        assert_eq!(limited.sqrt_price_after_x64, limit);
        assert!(limited.amount_out < unlimited.amount_out);
    }

    #[test]
    fn fee_reduces_output() {
        // Même pool à frais près : les métadonnées (et donc les mints) sont
        // partagées pour que les deux quotes soient comparables.
        let meta = synthetic_metadata(0, 60, 0, LIQUIDITY);
        let mut meta_with_fee = meta.clone();
        meta_with_fee.trade_fee_rate = 10_000; // 1 %
        let no_fee = pool_with_meta(meta);
        let with_fee = pool_with_meta(meta_with_fee);
        let mint_a = no_fee.meta.mint_a;
        let amount = 1_000_000_000u64;
        let q0 = no_fee.quote(&mint_a, amount, 0).unwrap();
        let q1 = with_fee.quote(&mint_a, amount, 0).unwrap();
        assert!(q1.amount_out < q0.amount_out);
    }

    #[test]
    fn foreign_mint_is_rejected() {
        let pool = single_position_pool(0);
        assert!(pool.quote(&Pubkey::new_unique(), 1_000, 0).is_err());
    }

    #[test]
    fn wrong_side_limit_is_rejected() {
        let pool = single_position_pool(0);
        let mint_a = pool.meta.mint_a;
        let above = tick_to_sqrt_price_x64(3000).unwrap();
        assert!(pool.quote(&mint_a, 1_000, above).is_err());
    }

    #[test]
    fn zero_amount_is_a_noop() {
        let pool = single_position_pool(0);
        let mint_a = pool.meta.mint_a;
        let quote = pool.quote(&mint_a, 0, 0).unwrap();
        assert_eq!(quote.amount_out, 0);
        assert_eq!(quote.sqrt_price_after_x64, pool.meta.sqrt_price_x64);
    }
}
