// src/oracle/pool.rs
//
// Décodage et hydratation d'un pool Raydium CLMM. Le décodage transforme les
// octets bruts du compte en métadonnées ; l'hydratation complète via RPC ce
// que le compte du pool ne contient pas (config de frais, décimales des mints,
// ticks initialisés). Après hydratation, l'état est figé : aucune relecture
// réseau pendant la recherche.

use std::collections::BTreeMap;
use std::mem;

use anyhow::{bail, Context, Result};
use bytemuck::{from_bytes, Pod, Zeroable};
use solana_sdk::pubkey::Pubkey;
use spl_token_2022::{extension::StateWithExtensions, state::Mint};
use tracing::{debug, warn};

use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use crate::oracle::PoolMetadata;
use crate::rpc::ResilientRpcClient;

pub const RAYDIUM_CLMM_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("CAMMCzo5YL8w4VFF8KVHrK22GGUsp5VTaW7grrKgrWqK");

pub const TICK_ARRAY_SIZE: usize = 60;
const REWARD_NUM: usize = 3;

const POOL_STATE_DISCRIMINATOR: [u8; 8] = [247, 237, 227, 245, 215, 195, 222, 70];
const AMM_CONFIG_DISCRIMINATOR: [u8; 8] = [218, 244, 33, 104, 203, 203, 43, 111];
const TICK_ARRAY_DISCRIMINATOR: [u8; 8] = [192, 155, 85, 205, 49, 249, 129, 42];

/// Pool CLMM prêt pour la simulation : métadonnées figées plus la carte des
/// ticks initialisés (tick -> liquidity_net).
#[derive(Debug, Clone)]
pub struct ZapPool {
    pub meta: PoolMetadata,
    pub program_id: Pubkey,
    pub amm_config: Pubkey,
    pub tick_array_bitmap: [u64; 16],
    pub ticks: BTreeMap<i32, i128>,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PoolState {
    pub bump: [u8; 1],
    pub amm_config: Pubkey,
    pub owner: Pubkey,
    pub token_mint_0: Pubkey,
    pub token_mint_1: Pubkey,
    pub token_vault_0: Pubkey,
    pub token_vault_1: Pubkey,
    pub observation_key: Pubkey,
    pub mint_decimals_0: u8,
    pub mint_decimals_1: u8,
    pub tick_spacing: u16,
    pub liquidity: u128,
    pub sqrt_price_x64: u128,
    pub tick_current: i32,
    pub padding3: u16,
    pub padding4: u16,
    pub fee_growth_global_0_x64: u128,
    pub fee_growth_global_1_x64: u128,
    pub protocol_fees_token_0: u64,
    pub protocol_fees_token_1: u64,
    pub swap_in_amount_token_0: u128,
    pub swap_out_amount_token_1: u128,
    pub swap_in_amount_token_1: u128,
    pub swap_out_amount_token_0: u128,
    pub status: u8,
    pub padding: [u8; 7],
    pub reward_infos: [RewardInfo; 3],
    pub tick_array_bitmap: [u64; 16],
    pub total_fees_token_0: u64,
    pub total_fees_claimed_token_0: u64,
    pub total_fees_token_1: u64,
    pub total_fees_claimed_token_1: u64,
    pub fund_fees_token_0: u64,
    pub fund_fees_token_1: u64,
    pub open_time: u64,
    pub recent_epoch: u64,
    pub padding1: [u64; 24],
    pub padding2: [u64; 32],
}

// RewardInfo n'est lu par personne, mais sans lui la taille de PoolState est
// fausse et le cast bytemuck échoue.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct RewardInfo {
    pub reward_state: u8,
    pub open_time: u64,
    pub end_time: u64,
    pub last_update_time: u64,
    pub emissions_per_second_x64: u128,
    pub reward_total_emissioned: u64,
    pub reward_claimed: u64,
    pub token_mint: Pubkey,
    pub token_vault: Pubkey,
    pub authority: Pubkey,
    pub reward_growth_global_x64: u128,
}

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct AmmConfigData {
    pub bump: u8,
    pub index: u16,
    pub owner: Pubkey,
    pub protocol_fee_rate: u32,
    pub trade_fee_rate: u32,
    pub tick_spacing: u16,
    pub fund_fee_rate: u32,
    pub padding_u32: u32,
    pub fund_owner: Pubkey,
    pub padding: [u64; 3],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Default, Pod, Zeroable)]
struct TickState {
    pub tick: i32,
    pub liquidity_net: i128,
    pub liquidity_gross: u128,
    pub fee_growth_outside_0_x64: u128,
    pub fee_growth_outside_1_x64: u128,
    pub reward_growths_outside_x64: [u128; REWARD_NUM],
    pub padding: [u32; 13],
}

/// Décode les octets bruts d'un compte PoolState. Les champs qui vivent dans
/// d'autres comptes (frais, décimales, ticks) restent à zéro jusqu'à `hydrate`.
pub fn decode_pool(address: &Pubkey, data: &[u8], program_id: &Pubkey) -> Result<ZapPool> {
    if data.get(..8) != Some(&POOL_STATE_DISCRIMINATOR) {
        bail!("discriminator de PoolState invalide pour le compte {}", address);
    }
    let data_slice = &data[8..];
    if data_slice.len() < mem::size_of::<PoolState>() {
        bail!(
            "données PoolState trop courtes : {} octets, {} requis",
            data_slice.len(),
            mem::size_of::<PoolState>()
        );
    }
    let pool_struct: &PoolState = from_bytes(&data_slice[..mem::size_of::<PoolState>()]);

    Ok(ZapPool {
        meta: PoolMetadata {
            address: *address,
            mint_a: pool_struct.token_mint_0,
            mint_b: pool_struct.token_mint_1,
            mint_a_decimals: pool_struct.mint_decimals_0,
            mint_b_decimals: pool_struct.mint_decimals_1,
            tick_spacing: pool_struct.tick_spacing,
            trade_fee_rate: 0,
            liquidity: pool_struct.liquidity,
            sqrt_price_x64: pool_struct.sqrt_price_x64,
            tick_current: pool_struct.tick_current,
        },
        program_id: *program_id,
        amm_config: pool_struct.amm_config,
        tick_array_bitmap: pool_struct.tick_array_bitmap,
        ticks: BTreeMap::new(),
    })
}

fn decode_amm_config(data: &[u8]) -> Result<u32> {
    if data.get(..8) != Some(&AMM_CONFIG_DISCRIMINATOR) {
        bail!("discriminator d'AmmConfig invalide");
    }
    let data_slice = &data[8..];
    if data_slice.len() != mem::size_of::<AmmConfigData>() {
        bail!(
            "taille d'AmmConfig inattendue : {} octets, {} requis",
            data_slice.len(),
            mem::size_of::<AmmConfigData>()
        );
    }
    let config: &AmmConfigData = from_bytes(data_slice);
    Ok(config.trade_fee_rate)
}

fn decode_mint_decimals(data: &[u8]) -> Result<u8> {
    let mint_state = StateWithExtensions::<Mint>::unpack(data)?;
    Ok(mint_state.base.decimals)
}

pub fn tick_array_start_index(tick_index: i32, tick_spacing: u16) -> i32 {
    let ticks_in_array = (TICK_ARRAY_SIZE as i32) * (tick_spacing as i32);
    tick_index.div_euclid(ticks_in_array) * ticks_in_array
}

pub fn tick_array_address(pool_id: &Pubkey, start_tick_index: i32, program_id: &Pubkey) -> Pubkey {
    let (pda, _) = Pubkey::find_program_address(
        &[b"tick_array", pool_id.as_ref(), &start_tick_index.to_be_bytes()],
        program_id,
    );
    pda
}

/// Déverse les ticks initialisés d'un compte TickArray dans `ticks`.
fn collect_initialized_ticks(data: &[u8], ticks: &mut BTreeMap<i32, i128>) -> Result<()> {
    if data.get(..8) != Some(&TICK_ARRAY_DISCRIMINATOR) {
        bail!("discriminator de TickArray invalide");
    }
    let data_slice = &data[8..];
    let tick_size = mem::size_of::<TickState>();
    // pool_id (32) + start_tick_index (4) puis les 60 créneaux de ticks.
    let ticks_offset = 36;
    if data_slice.len() < ticks_offset + TICK_ARRAY_SIZE * tick_size {
        bail!(
            "taille de TickArray invalide : {} octets",
            data_slice.len()
        );
    }
    for i in 0..TICK_ARRAY_SIZE {
        let start = ticks_offset + i * tick_size;
        let tick_state: &TickState = from_bytes(&data_slice[start..start + tick_size]);
        let gross = tick_state.liquidity_gross;
        if gross > 0 {
            let tick = tick_state.tick;
            let net = tick_state.liquidity_net;
            ticks.insert(tick, net);
        }
    }
    Ok(())
}

/// Complète le pool via RPC : frais depuis l'AmmConfig, décimales depuis les
/// mints, puis tous les TickArrays marqués dans la bitmap par défaut du pool.
pub async fn hydrate(pool: &mut ZapPool, rpc_client: &ResilientRpcClient) -> Result<()> {
    let (config_res, mint_a_res, mint_b_res) = tokio::join!(
        rpc_client.get_account_data(&pool.amm_config),
        rpc_client.get_account_data(&pool.meta.mint_a),
        rpc_client.get_account_data(&pool.meta.mint_b),
    );

    pool.meta.trade_fee_rate =
        decode_amm_config(&config_res?).context("décodage de l'AmmConfig")?;
    pool.meta.mint_a_decimals =
        decode_mint_decimals(&mint_a_res?).context("décodage du mint A")?;
    pool.meta.mint_b_decimals =
        decode_mint_decimals(&mint_b_res?).context("décodage du mint B")?;

    // Bitmap par défaut : 1024 bits centrés sur le tick 0, un bit par array.
    // L'extension de bitmap (plages extrêmes) n'est pas chargée : les ticks
    // au-delà de ±512 arrays du centre sont hors de portée d'un zap réaliste.
    let multiplier = (TICK_ARRAY_SIZE as i32) * (pool.meta.tick_spacing as i32);
    let mut addresses_to_fetch = Vec::new();
    for (word_index, &word) in pool.tick_array_bitmap.iter().enumerate() {
        if word == 0 {
            continue;
        }
        for bit_index in 0..64 {
            if (word & (1u64 << bit_index)) != 0 {
                let compressed_index = (word_index * 64 + bit_index) as i32;
                let start_tick_index = (compressed_index - 512) * multiplier;
                if (MIN_TICK..=MAX_TICK).contains(&start_tick_index) {
                    addresses_to_fetch.push(tick_array_address(
                        &pool.meta.address,
                        start_tick_index,
                        &pool.program_id,
                    ));
                }
            }
        }
    }

    if addresses_to_fetch.is_empty() {
        debug!(pool = %pool.meta.address, "aucun tick array initialisé");
        pool.ticks = BTreeMap::new();
        return Ok(());
    }

    let accounts = rpc_client.get_multiple_accounts(&addresses_to_fetch).await?;
    let mut ticks = BTreeMap::new();
    for (address, account_opt) in addresses_to_fetch.iter().zip(accounts) {
        match account_opt {
            Some(account) => {
                if let Err(e) = collect_initialized_ticks(&account.data, &mut ticks) {
                    warn!(%address, "tick array ignoré : {}", e);
                }
            }
            None => warn!(%address, "tick array marqué dans la bitmap mais absent"),
        }
    }

    debug!(
        pool = %pool.meta.address,
        arrays = addresses_to_fetch.len(),
        ticks = ticks.len(),
        "pool hydraté"
    );
    pool.ticks = ticks;
    Ok(())
}
