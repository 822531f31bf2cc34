use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend rejected request (code {code}): {msg}")]
    Envelope { code: i64, msg: String },

    #[error("backend returned an empty payload")]
    EmptyPayload,

    #[error("transaction signature does not match the pre-order: {0}")]
    ConversionMismatch(String),

    #[error("pre-order is missing its id")]
    MissingPreOrderId,

    #[error("{0} is not an allowed purchase tier")]
    TierNotAllowed(u64),

    #[error("referral address cannot be the purchasing wallet")]
    SelfReferral,

    #[error("failed to decrypt custody wallet address: {0}")]
    Decrypt(String),

    #[error("invalid backend URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
