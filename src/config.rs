use serde::Deserialize;
use anyhow::Result;

#[derive(Deserialize, Debug)]
pub struct Config {
    pub solana_rpc_url: String,
    #[serde(default = "default_rpc_max_retries")]
    pub rpc_max_retries: u8,
    #[serde(default = "default_rpc_retry_delay_ms")]
    pub rpc_retry_delay_ms: u64,
}

fn default_rpc_max_retries() -> u8 {
    3
}

fn default_rpc_retry_delay_ms() -> u64 {
    500
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()?;
        Ok(config)
    }
}
