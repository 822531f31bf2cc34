use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use solana_sdk::{commitment_config::CommitmentConfig, pubkey::Pubkey};
use thiserror::Error;

use hoopx_presale_api::{AddressDecryptor, PresaleClient};
use hoopx_presale_transfer::{RpcClient, TransferExecutor};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Deployment configuration for the purchase flow.
#[derive(Debug, Clone, Deserialize)]
pub struct PresaleConfig {
    /// Backend base URL, e.g. `https://presale.hoopx.gg/api`.
    pub backend_url: String,

    /// Solana RPC endpoint.
    pub rpc_url: String,

    /// Overrides the mainnet USDT mint; staging rounds run on a devnet mint.
    #[serde(default)]
    pub usdt_mint: Option<String>,

    /// Base64 AES key for the encrypted custody wallet address.
    pub aes_key: String,

    /// Base64 AES IV.
    pub aes_iv: String,

    #[serde(default = "default_commitment")]
    pub commitment: String,
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

impl PresaleConfig {
    pub fn backend(&self) -> Result<PresaleClient, ConfigError> {
        let decryptor = AddressDecryptor::from_base64(&self.aes_key, &self.aes_iv)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        PresaleClient::new(&self.backend_url, decryptor)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn transfer_executor(&self) -> Result<TransferExecutor, ConfigError> {
        let commitment = CommitmentConfig::from_str(&self.commitment)
            .map_err(|e| ConfigError::Invalid(format!("commitment: {e}")))?;
        let rpc = Arc::new(RpcClient::new_with_commitment(
            self.rpc_url.clone(),
            commitment,
        ));
        match &self.usdt_mint {
            Some(mint) => {
                let mint = Pubkey::from_str(mint)
                    .map_err(|e| ConfigError::Invalid(format!("usdt_mint: {e}")))?;
                Ok(TransferExecutor::with_mint(rpc, mint))
            }
            None => Ok(TransferExecutor::new(rpc)),
        }
    }
}
