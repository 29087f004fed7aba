// src/oracle/mod.rs
//
// L'oracle de quote est la seule frontière entre la recherche et le monde
// extérieur. La recherche ne connaît que ce trait : en production il est
// implémenté par un pool CLMM hydraté via RPC, dans les tests par des oracles
// synthétiques déterministes.

pub mod fake;
pub mod pool;
pub mod quoter;

use anyhow::Result;
use solana_sdk::pubkey::Pubkey;

pub use pool::{decode_pool, ZapPool, RAYDIUM_CLMM_PROGRAM_ID};

/// Instantané des caractéristiques d'un pool au moment de la planification.
/// Tout ce que la recherche lit du pool passe par cette structure : elle est
/// figée pour toute la durée d'une invocation.
#[derive(Debug, Clone)]
pub struct PoolMetadata {
    pub address: Pubkey,
    pub mint_a: Pubkey,
    pub mint_b: Pubkey,
    pub mint_a_decimals: u8,
    pub mint_b_decimals: u8,
    pub tick_spacing: u16,
    pub trade_fee_rate: u32,
    pub liquidity: u128,
    pub sqrt_price_x64: u128,
    pub tick_current: i32,
}

/// Résultat d'une simulation de swap : ce qui sort, et où le prix atterrit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapQuote {
    pub amount_out: u64,
    pub sqrt_price_after_x64: u128,
}

/// Simulation de swap contre un état de pool figé. `sqrt_price_limit_x64 = 0`
/// signifie « pas de limite » : la simulation s'arrête quand l'entrée est
/// épuisée ou que la liquidité chargée est à sec.
pub trait QuoteOracle {
    fn metadata(&self) -> &PoolMetadata;

    fn quote(
        &self,
        token_in_mint: &Pubkey,
        amount_in: u64,
        sqrt_price_limit_x64: u128,
    ) -> Result<SwapQuote>;
}
