// src/bin/zap_planner.rs
//
// Planificateur de zap en lecture seule : hydrate un pool CLMM, dérive une
// plage de ticks autour du prix courant, et confronte l'estimation statique
// aux deux recherches itératives. Ne construit aucune transaction.

use std::str::FromStr;

use anyhow::{bail, Context, Result};
use solana_sdk::pubkey::Pubkey;
use tracing::info;

use clmm_zap::{
    config::Config,
    math::tick_math::{MAX_TICK, MIN_TICK},
    monitoring::logging::setup_logging,
    oracle::{self, pool, QuoteOracle, RAYDIUM_CLMM_PROGRAM_ID},
    rpc::ResilientRpcClient,
    solver,
};

/// Bornes de ticks couvrant ±`range_pct` % de prix autour du tick courant,
/// élargies vers l'extérieur pour tomber sur l'espacement du pool.
fn aligned_range(tick_current: i32, tick_spacing: u16, range_pct: f64) -> (i32, i32) {
    let spacing = tick_spacing.max(1) as i32;
    let tick_base = 1.0001f64.ln();
    let offset_down = ((1.0 - range_pct / 100.0).ln() / tick_base) as i32;
    let offset_up = ((1.0 + range_pct / 100.0).ln() / tick_base) as i32;

    let mut lower = (tick_current + offset_down).div_euclid(spacing) * spacing;
    let raw_upper = tick_current + offset_up;
    let mut upper = raw_upper.div_euclid(spacing) * spacing;
    if raw_upper.rem_euclid(spacing) != 0 {
        upper += spacing;
    }
    lower = lower.max(MIN_TICK.div_euclid(spacing) * spacing + spacing);
    upper = upper.min(MAX_TICK.div_euclid(spacing) * spacing);
    if lower >= upper {
        lower = upper - spacing;
    }
    (lower, upper)
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();
    let config = Config::load()?;

    let pool_address = Pubkey::from_str(
        &std::env::var("ZAP_POOL").context("variable ZAP_POOL manquante")?,
    )?;
    let input_mint = Pubkey::from_str(
        &std::env::var("ZAP_INPUT_MINT").context("variable ZAP_INPUT_MINT manquante")?,
    )?;
    let amount_in: u64 = std::env::var("ZAP_AMOUNT_IN")
        .context("variable ZAP_AMOUNT_IN manquante")?
        .parse()
        .context("ZAP_AMOUNT_IN doit être un entier en unités de base")?;
    let range_pct: f64 = match std::env::var("ZAP_RANGE_PCT") {
        Ok(v) => v.parse().context("ZAP_RANGE_PCT doit être un nombre")?,
        Err(_) => 5.0,
    };
    if !(0.0..100.0).contains(&range_pct) || range_pct == 0.0 {
        bail!("ZAP_RANGE_PCT doit être dans ]0, 100[");
    }

    let rpc_client = ResilientRpcClient::new(
        config.solana_rpc_url.clone(),
        config.rpc_max_retries,
        config.rpc_retry_delay_ms,
    );

    info!(%pool_address, "récupération du pool");
    let account_data = rpc_client.get_account_data(&pool_address).await?;
    let mut zap_pool =
        oracle::decode_pool(&pool_address, &account_data, &RAYDIUM_CLMM_PROGRAM_ID)?;
    pool::hydrate(&mut zap_pool, &rpc_client).await?;

    let meta = zap_pool.metadata().clone();
    let is_base_input = if input_mint == meta.mint_a {
        true
    } else if input_mint == meta.mint_b {
        false
    } else {
        bail!("le mint {} n'appartient pas au pool {}", input_mint, pool_address);
    };
    info!(
        liquidity = %meta.liquidity,
        sqrt_price_x64 = %meta.sqrt_price_x64,
        tick_current = meta.tick_current,
        trade_fee_rate = meta.trade_fee_rate,
        "pool hydraté"
    );

    let (lower_tick, upper_tick) = aligned_range(meta.tick_current, meta.tick_spacing, range_pct);
    info!(lower_tick, upper_tick, range_pct, "plage cible");

    let input_decimals = if is_base_input {
        meta.mint_a_decimals
    } else {
        meta.mint_b_decimals
    };
    let ui_scale = 10f64.powi(input_decimals as i32);

    let estimated =
        solver::estimate_swap_static(&meta, lower_tick, upper_tick, amount_in, is_base_input)?;
    info!(swap_ui = estimated as f64 / ui_scale, "estimation statique (sans oracle)");

    let balanced =
        solver::solve_balanced_swap(&zap_pool, lower_tick, upper_tick, amount_in, is_base_input)?;
    info!(swap_ui = balanced as f64 / ui_scale, "recherche à restes symétriques");

    let (liquidity, dust_swap) =
        solver::solve_dust_bounded_swap(&zap_pool, lower_tick, upper_tick, amount_in, is_base_input)?;
    info!(
        %liquidity,
        swap_ui = dust_swap as f64 / ui_scale,
        "recherche à seuil de poussière"
    );

    Ok(())
}
