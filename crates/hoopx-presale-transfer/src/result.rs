use rust_decimal::Decimal;
use solana_sdk::signature::Signature;
use thiserror::Error;

/// Structured failure modes for a transfer attempt.
///
/// These replace message-text matching: callers branch on the variant, and
/// balance figures travel as values, not embedded strings.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferFailure {
    /// The wallet declined to sign. A user decision, not a system fault.
    #[error("cancelled")]
    Cancelled,

    /// The sender holds no initialized USDT token account.
    #[error("no token account")]
    NoSourceAccount,

    #[error("insufficient balance: have {current}, need {required}")]
    InsufficientBalance { current: Decimal, required: Decimal },

    /// RPC connectivity failure detected before or during submission.
    #[error("network error: {0}")]
    Network(String),

    /// The transaction was submitted but failed to confirm.
    #[error("transaction failed: {0}")]
    Submission(String),
}

/// Outcome of the on-chain step. Ephemeral; consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferResult {
    /// Signature confirmed on-chain at the client's commitment level.
    Confirmed(Signature),
    Failed(TransferFailure),
}

/// Estimated network cost of the transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeEstimate {
    pub lamports: u64,
}

impl FeeEstimate {
    /// Base signature fee.
    pub const BASE_FEE_LAMPORTS: u64 = 5_000;
    /// One-time rent for creating the destination's associated token account.
    pub const TOKEN_ACCOUNT_RENT_LAMPORTS: u64 = 2_039_280;
    /// Conservative estimate returned when RPC data is unavailable.
    pub const FALLBACK_LAMPORTS: u64 = 10_000;

    pub fn new(priority_lamports: u64, includes_rent: bool) -> Self {
        let rent = if includes_rent {
            Self::TOKEN_ACCOUNT_RENT_LAMPORTS
        } else {
            0
        };
        Self {
            lamports: Self::BASE_FEE_LAMPORTS + priority_lamports + rent,
        }
    }

    pub fn fallback() -> Self {
        Self {
            lamports: Self::FALLBACK_LAMPORTS,
        }
    }

    pub fn sol(&self) -> f64 {
        self.lamports as f64 / 1_000_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn failure_messages_are_stable() {
        assert_eq!(TransferFailure::Cancelled.to_string(), "cancelled");
        assert_eq!(
            TransferFailure::NoSourceAccount.to_string(),
            "no token account"
        );
        assert_eq!(
            TransferFailure::InsufficientBalance {
                current: dec!(500),
                required: dec!(1000),
            }
            .to_string(),
            "insufficient balance: have 500, need 1000"
        );
    }

    #[test]
    fn estimate_includes_rent_only_for_missing_destination() {
        let with_account = FeeEstimate::new(1_200, false);
        assert_eq!(with_account.lamports, 6_200);

        let without_account = FeeEstimate::new(1_200, true);
        assert_eq!(
            without_account.lamports,
            6_200 + FeeEstimate::TOKEN_ACCOUNT_RENT_LAMPORTS
        );
    }

    #[test]
    fn fallback_is_a_flat_constant() {
        let estimate = FeeEstimate::fallback();
        assert_eq!(estimate.lamports, 10_000);
        assert!((estimate.sol() - 0.00001).abs() < f64::EPSILON);
    }
}
