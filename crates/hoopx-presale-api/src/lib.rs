/*!
# HOOPX Presale API

Backend data model and HTTP client for the presale purchase flow.

The backend speaks JSON over HTTPS with a `{ code, msg, data }` envelope.
This crate unwraps that envelope, decrypts the custody wallet address, and
exposes the pre-order lifecycle (`create-pre`, `convert-to-formal`,
`del-pre`) behind the [`PresaleBackend`] trait so the purchase orchestrator
can be tested against in-memory implementations.
*/

pub mod client;
pub mod decrypt;
pub mod errors;
pub mod types;

pub use client::{PresaleBackend, PresaleClient};
pub use decrypt::AddressDecryptor;
pub use errors::{ApiError, ApiResult};
pub use types::{
    ActivityConfig, ConvertToFormal, CreatePreOrder, DeletePreOrder, Order, PreOrder,
    PurchaseStatus, Session, VestingFrequency,
};
