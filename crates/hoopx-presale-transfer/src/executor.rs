use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use solana_client::{
    client_error::ClientError, nonblocking::rpc_client::RpcClient,
    rpc_response::RpcPrioritizationFee,
};
use solana_sdk::{
    message::Message, program_pack::Pack, pubkey, pubkey::Pubkey, transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account,
};
use tracing::{debug, info, warn};

use crate::result::{FeeEstimate, TransferFailure, TransferResult};
use crate::signer::{SignerError, TransferSigner};

/// USDT mint on Solana mainnet.
pub const USDT_MINT: Pubkey = pubkey!("Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB");
pub const USDT_DECIMALS: u8 = 6;

const BASE_UNITS_PER_USDT: u64 = 1_000_000;

/// Chain-side contract consumed by the purchase orchestrator.
#[async_trait]
pub trait TokenTransfer: Send + Sync {
    /// Cheap RPC round-trip used as a pre-flight connectivity probe.
    async fn check_connectivity(&self) -> Result<(), TransferFailure>;

    /// Moves `amount_usdt` (whole USDT) from the signer's wallet to
    /// `destination`, awaiting on-chain confirmation.
    async fn transfer(
        &self,
        destination: &Pubkey,
        amount_usdt: u64,
        signer: &dyn TransferSigner,
    ) -> TransferResult;
}

/// Executes USDT transfers against a Solana RPC endpoint.
pub struct TransferExecutor {
    rpc: Arc<RpcClient>,
    mint: Pubkey,
}

impl TransferExecutor {
    pub fn new(rpc: Arc<RpcClient>) -> Self {
        Self::with_mint(rpc, USDT_MINT)
    }

    /// Staging rounds run against a devnet mint.
    pub fn with_mint(rpc: Arc<RpcClient>, mint: Pubkey) -> Self {
        Self { rpc, mint }
    }

    /// Estimated fee for a transfer to `destination`.
    ///
    /// Base signature fee plus the recent average priority fee, plus the
    /// one-time token-account rent when the destination holds no USDT
    /// account yet. Never fails; RPC trouble degrades to
    /// [`FeeEstimate::fallback`].
    pub async fn estimate_fee(&self, destination: &Pubkey) -> FeeEstimate {
        match self.try_estimate_fee(destination).await {
            Ok(estimate) => estimate,
            Err(err) => {
                debug!(%err, "fee estimation failed, using fallback");
                FeeEstimate::fallback()
            }
        }
    }

    async fn try_estimate_fee(&self, destination: &Pubkey) -> Result<FeeEstimate, ClientError> {
        let fees = self.rpc.get_recent_prioritization_fees(&[]).await?;
        let priority = average_priority_fee(&fees);

        let destination_ata = get_associated_token_address(destination, &self.mint);
        let needs_rent = !self.account_exists(&destination_ata).await?;
        Ok(FeeEstimate::new(priority, needs_rent))
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool, ClientError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value.is_some())
    }

    async fn token_account(
        &self,
        address: &Pubkey,
    ) -> Result<Option<spl_token::state::Account>, ClientError> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        let Some(account) = response.value else {
            return Ok(None);
        };
        // Data that does not unpack is not a usable token account.
        Ok(spl_token::state::Account::unpack(&account.data).ok())
    }
}

#[async_trait]
impl TokenTransfer for TransferExecutor {
    async fn check_connectivity(&self) -> Result<(), TransferFailure> {
        self.rpc
            .get_latest_blockhash()
            .await
            .map(|_| ())
            .map_err(|e| TransferFailure::Network(e.to_string()))
    }

    async fn transfer(
        &self,
        destination: &Pubkey,
        amount_usdt: u64,
        signer: &dyn TransferSigner,
    ) -> TransferResult {
        let sender = signer.pubkey();
        let source_ata = get_associated_token_address(&sender, &self.mint);

        // Preflight, before the wallet is ever prompted: the sender must hold
        // an initialized token account with enough balance.
        let source = match self.token_account(&source_ata).await {
            Ok(Some(account)) => account,
            Ok(None) => return TransferResult::Failed(TransferFailure::NoSourceAccount),
            Err(e) => return TransferResult::Failed(TransferFailure::Network(e.to_string())),
        };

        let required = base_units(amount_usdt);
        if source.amount < required {
            return TransferResult::Failed(TransferFailure::InsufficientBalance {
                current: ui_amount(source.amount),
                required: ui_amount(required),
            });
        }

        let destination_ata = get_associated_token_address(destination, &self.mint);
        let mut instructions = Vec::with_capacity(2);
        match self.account_exists(&destination_ata).await {
            Ok(true) => {}
            Ok(false) => {
                // Created in the same transaction, rent paid by the sender,
                // so the transfer is atomic with account creation.
                debug!(%destination, "destination token account missing, creating");
                instructions.push(create_associated_token_account(
                    &sender,
                    destination,
                    &self.mint,
                    &spl_token::id(),
                ));
            }
            Err(e) => return TransferResult::Failed(TransferFailure::Network(e.to_string())),
        }

        let transfer_ix = match spl_token::instruction::transfer_checked(
            &spl_token::id(),
            &source_ata,
            &self.mint,
            &destination_ata,
            &sender,
            &[],
            required,
            USDT_DECIMALS,
        ) {
            Ok(ix) => ix,
            Err(e) => return TransferResult::Failed(TransferFailure::Submission(e.to_string())),
        };
        instructions.push(transfer_ix);

        let blockhash = match self.rpc.get_latest_blockhash().await {
            Ok(hash) => hash,
            Err(e) => return TransferResult::Failed(TransferFailure::Network(e.to_string())),
        };

        let message = Message::new_with_blockhash(&instructions, Some(&sender), &blockhash);
        let unsigned = Transaction::new_unsigned(message);

        let signed = match signer.sign_transaction(unsigned).await {
            Ok(tx) => tx,
            Err(SignerError::Rejected) => {
                info!(%sender, "wallet declined to sign");
                return TransferResult::Failed(TransferFailure::Cancelled);
            }
            Err(SignerError::Other(msg)) => {
                return TransferResult::Failed(TransferFailure::Submission(msg))
            }
        };

        match self.rpc.send_and_confirm_transaction(&signed).await {
            Ok(signature) => {
                info!(%signature, amount_usdt, "transfer confirmed");
                TransferResult::Confirmed(signature)
            }
            Err(e) => {
                warn!(%e, "transfer submission failed");
                TransferResult::Failed(TransferFailure::Submission(e.to_string()))
            }
        }
    }
}

/// Whole USDT to the token's 6-decimal base units.
pub fn base_units(amount_usdt: u64) -> u64 {
    amount_usdt * BASE_UNITS_PER_USDT
}

/// Base units back to a displayable USDT amount.
pub fn ui_amount(units: u64) -> Decimal {
    Decimal::from_i128_with_scale(units as i128, USDT_DECIMALS as u32).normalize()
}

fn average_priority_fee(fees: &[RpcPrioritizationFee]) -> u64 {
    if fees.is_empty() {
        return 0;
    }
    let total: u64 = fees.iter().map(|fee| fee.prioritization_fee).sum();
    total / fees.len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn usdt_units_convert_both_ways() {
        assert_eq!(base_units(1_000), 1_000_000_000);
        assert_eq!(ui_amount(1_000_000_000), dec!(1000));
        assert_eq!(ui_amount(500_000_000), dec!(500));
        assert_eq!(ui_amount(1_234_567), dec!(1.234567));
    }

    #[test]
    fn priority_fee_averages_recent_samples() {
        assert_eq!(average_priority_fee(&[]), 0);

        let fees: Vec<RpcPrioritizationFee> = [100u64, 200, 600]
            .iter()
            .enumerate()
            .map(|(slot, &prioritization_fee)| RpcPrioritizationFee {
                slot: slot as u64,
                prioritization_fee,
            })
            .collect();
        assert_eq!(average_priority_fee(&fees), 300);
    }

    #[test]
    fn insufficient_balance_failure_carries_ui_amounts() {
        let failure = TransferFailure::InsufficientBalance {
            current: ui_amount(base_units(500)),
            required: ui_amount(base_units(1_000)),
        };
        assert_eq!(
            failure.to_string(),
            "insufficient balance: have 500, need 1000"
        );
    }
}
