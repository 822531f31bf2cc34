use hoopx_presale_api::ApiError;
use hoopx_presale_transfer::TransferFailure;
use rust_decimal::Decimal;
use thiserror::Error;

/// Stable error taxonomy surfaced to the user.
///
/// Every failure is converted to exactly one of these at the orchestrator
/// boundary; raw error text only crosses it inside [`Backend`](Self::Backend),
/// which carries a backend-supplied message verbatim (e.g. a conversion
/// mismatch).
#[derive(Error, Debug)]
pub enum PurchaseError {
    /// Wallet signature declined. Informational, not a system fault.
    #[error("transaction cancelled in the wallet")]
    UserCancelled,

    #[error("this wallet has no USDT token account")]
    NoSourceAccount,

    #[error("insufficient USDT balance: have {current}, need {required}")]
    InsufficientBalance { current: Decimal, required: Decimal },

    #[error("referral address cannot be your own wallet")]
    SelfReferral,

    /// The activity became absent or expired between page load and
    /// submission.
    #[error("the presale round has ended")]
    RoundEnded,

    /// The re-fetched session already shows a successful order for this
    /// round; callers redirect to the holdings view.
    #[error("this wallet has already purchased the current round")]
    AlreadyPurchased,

    #[error("network error: {0}")]
    Network(String),

    /// Backend-supplied message passed through verbatim.
    #[error("{0}")]
    Backend(String),

    #[error("purchase failed: {0}")]
    Generic(String),
}

impl From<TransferFailure> for PurchaseError {
    fn from(failure: TransferFailure) -> Self {
        match failure {
            TransferFailure::Cancelled => PurchaseError::UserCancelled,
            TransferFailure::NoSourceAccount => PurchaseError::NoSourceAccount,
            TransferFailure::InsufficientBalance { current, required } => {
                PurchaseError::InsufficientBalance { current, required }
            }
            TransferFailure::Network(msg) => PurchaseError::Network(msg),
            TransferFailure::Submission(msg) => PurchaseError::Generic(msg),
        }
    }
}

impl From<ApiError> for PurchaseError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::SelfReferral => PurchaseError::SelfReferral,
            ApiError::ConversionMismatch(msg) => PurchaseError::Backend(msg),
            ApiError::Envelope { msg, .. } => PurchaseError::Backend(msg),
            ApiError::Http(e) => PurchaseError::Network(e.to_string()),
            other => PurchaseError::Generic(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::dec;

    #[test]
    fn transfer_failures_map_onto_the_taxonomy() {
        assert!(matches!(
            PurchaseError::from(TransferFailure::Cancelled),
            PurchaseError::UserCancelled
        ));
        assert!(matches!(
            PurchaseError::from(TransferFailure::NoSourceAccount),
            PurchaseError::NoSourceAccount
        ));
        match PurchaseError::from(TransferFailure::InsufficientBalance {
            current: dec!(500),
            required: dec!(1000),
        }) {
            PurchaseError::InsufficientBalance { current, required } => {
                assert_eq!(current, dec!(500));
                assert_eq!(required, dec!(1000));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn backend_messages_pass_through_verbatim() {
        let error = PurchaseError::from(ApiError::ConversionMismatch(
            "交易哈希与订单数据匹配不通过".into(),
        ));
        assert_eq!(error.to_string(), "交易哈希与订单数据匹配不通过");

        let error = PurchaseError::from(ApiError::Envelope {
            code: 500,
            msg: "order already exists".into(),
        });
        assert_eq!(error.to_string(), "order already exists");
    }
}
