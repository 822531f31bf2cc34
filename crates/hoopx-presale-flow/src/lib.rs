/*!
# HOOPX Presale Flow

The purchase orchestrator: the state machine that sequences a server-side
pre-order, the on-chain USDT transfer signed by the user's wallet, and the
conversion of the pre-order into a formal order.

The blockchain ledger and the backend order record are updated
non-atomically, so the orchestrator re-fetches session state immediately
before every mutating step, leaves the pre-order server-side when the
transfer step fails (so it can be resumed later), and bounds the conversion
retry so an already-confirmed transfer is never reported as a hard failure.

```rust,no_run
use hoopx_presale_flow::{PresaleConfig, PurchaseOrchestrator};
use hoopx_presale_transfer::KeypairSigner;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;

# async fn example() -> Result<(), Box<dyn std::error::Error>> {
let config: PresaleConfig = serde_json::from_str(r#"{
    "backend_url": "https://presale.hoopx.gg/api",
    "rpc_url": "https://api.mainnet-beta.solana.com",
    "aes_key": "AAAAAAAAAAAAAAAAAAAAAA==",
    "aes_iv": "AAAAAAAAAAAAAAAAAAAAAA=="
}"#)?;

let wallet = Keypair::new();
let mut orchestrator = PurchaseOrchestrator::new(
    Arc::new(config.backend()?),
    Arc::new(config.transfer_executor()?),
    wallet.pubkey(),
);

let activity = orchestrator.fetch_activity().await?.expect("round is open");
orchestrator.select_tier(&activity, 1000)?;
let signer = KeypairSigner::new(wallet);
let outcome = orchestrator.execute(&signer).await?;
# Ok(())
# }
```
*/

pub mod config;
pub mod context;
pub mod display;
pub mod errors;
pub mod orchestrator;
pub mod retry;
pub mod state;

pub use config::{ConfigError, PresaleConfig};
pub use context::PurchaseContext;
pub use display::{format_token_amount, token_amount};
pub use errors::PurchaseError;
pub use orchestrator::{BeginOutcome, PurchaseOrchestrator, PurchaseOutcome};
pub use retry::RetryPolicy;
pub use state::PurchaseState;
