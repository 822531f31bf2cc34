//! Wallet signing seam.
//!
//! The connected wallet is an external capability: the executor hands it an
//! unsigned transaction and gets back a signed one, or a rejection.

use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signer::Signer, transaction::Transaction};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SignerError {
    /// The user declined the signature request in the wallet UI.
    #[error("signature request declined by the wallet")]
    Rejected,

    #[error("wallet signing failed: {0}")]
    Other(String),
}

#[async_trait]
pub trait TransferSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    async fn sign_transaction(&self, transaction: Transaction)
        -> Result<Transaction, SignerError>;
}

/// Local-keypair signer for tests and operational tooling.
pub struct KeypairSigner {
    keypair: Keypair,
}

impl KeypairSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }
}

#[async_trait]
impl TransferSigner for KeypairSigner {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_transaction(
        &self,
        mut transaction: Transaction,
    ) -> Result<Transaction, SignerError> {
        let blockhash = transaction.message.recent_blockhash;
        transaction
            .try_sign(&[&self.keypair], blockhash)
            .map_err(|e| SignerError::Other(e.to_string()))?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_sdk::{hash::Hash, message::Message, system_instruction};

    #[tokio::test]
    async fn keypair_signer_signs_in_place() {
        let keypair = Keypair::new();
        let recipient = Pubkey::new_unique();
        let instruction = system_instruction::transfer(&keypair.pubkey(), &recipient, 1_000);
        let message =
            Message::new_with_blockhash(&[instruction], Some(&keypair.pubkey()), &Hash::new_unique());
        let unsigned = Transaction::new_unsigned(message);

        let signer = KeypairSigner::new(keypair);
        let signed = signer.sign_transaction(unsigned).await.unwrap();
        assert!(signed.is_signed());
    }
}
