/*!
# HOOPX Presale Transfer

Builds, signs, submits, and confirms the USDT transfer that funds a presale
purchase.

Preconditions are checked client-side before the wallet is asked to sign
(source token account exists, balance covers the tier), a missing destination
token account is created in the same transaction, and wallet rejection is a
normal [`TransferFailure::Cancelled`] outcome rather than an error. Fee
estimation never fails; it degrades to a conservative fallback constant.
*/

pub mod executor;
pub mod result;
pub mod signer;

pub use executor::{TokenTransfer, TransferExecutor, USDT_DECIMALS, USDT_MINT};
pub use result::{FeeEstimate, TransferFailure, TransferResult};
pub use signer::{KeypairSigner, SignerError, TransferSigner};

// Re-export the RPC client type callers hand to the executor.
pub use solana_client::nonblocking::rpc_client::RpcClient;
