use std::str::FromStr;
use std::sync::Arc;

use solana_sdk::{pubkey::Pubkey, signature::Signature};
use tracing::{debug, info, warn};

use hoopx_presale_api::{
    ActivityConfig, ConvertToFormal, CreatePreOrder, DeletePreOrder, PreOrder, PresaleBackend,
    Session,
};
use hoopx_presale_transfer::{TokenTransfer, TransferResult, TransferSigner};

use crate::context::PurchaseContext;
use crate::errors::PurchaseError;
use crate::retry::RetryPolicy;
use crate::state::PurchaseState;

/// Result of a buy click.
#[derive(Debug, Clone)]
pub enum BeginOutcome {
    /// No obstacles; proceed to the confirmation step.
    Confirm,
    /// An unfinished pre-order exists; offer resumption or cancellation
    /// instead of creating a second reservation.
    Resume(PreOrder),
}

/// Terminal outcome of an executed purchase.
#[derive(Debug, Clone)]
pub enum PurchaseOutcome {
    Completed(Session),
    /// The transfer confirmed on-chain but the backend conversion exhausted
    /// its retries. The money has moved; bookkeeping is asynchronous. Never
    /// a hard failure — the user keeps the signature for support.
    RegistrationPending { signature: Signature },
}

/// Sequences pre-order creation, the signed on-chain transfer, and the
/// formal-order conversion.
///
/// One purchase flow per wallet session: the `processing` guard prevents
/// double submission and suppresses the unfinished-order recovery prompt
/// while a fresh purchase is mid-flight.
pub struct PurchaseOrchestrator {
    backend: Arc<dyn PresaleBackend>,
    transfer: Arc<dyn TokenTransfer>,
    context: PurchaseContext,
    state: PurchaseState,
    retry: RetryPolicy,
    processing: bool,
    recovery_prompted: bool,
}

impl PurchaseOrchestrator {
    pub fn new(
        backend: Arc<dyn PresaleBackend>,
        transfer: Arc<dyn TokenTransfer>,
        wallet: Pubkey,
    ) -> Self {
        Self {
            backend,
            transfer,
            context: PurchaseContext::new(wallet),
            state: PurchaseState::Idle,
            retry: RetryPolicy::default(),
            processing: false,
            recovery_prompted: false,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn state(&self) -> &PurchaseState {
        &self.state
    }

    pub fn context(&self) -> &PurchaseContext {
        &self.context
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Clears tier, referral, and flow state for a fresh page visit.
    pub fn reset(&mut self) {
        self.context.reset();
        self.state = PurchaseState::Idle;
        self.processing = false;
        self.recovery_prompted = false;
    }

    pub async fn fetch_activity(&self) -> Result<Option<ActivityConfig>, PurchaseError> {
        Ok(self.backend.get_activity().await?)
    }

    pub async fn fetch_session(
        &self,
        activity_id: Option<&str>,
    ) -> Result<Session, PurchaseError> {
        Ok(self
            .backend
            .get_session(&self.context.wallet().to_string(), activity_id)
            .await?)
    }

    /// User picks one of the round's tiers.
    pub fn select_tier(
        &mut self,
        activity: &ActivityConfig,
        tier: u64,
    ) -> Result<(), PurchaseError> {
        if !activity.allows_tier(tier) {
            return Err(PurchaseError::Generic(format!(
                "{tier} is not an allowed purchase tier"
            )));
        }
        self.context.select_tier(tier);
        self.state = PurchaseState::TierSelected { tier };
        Ok(())
    }

    /// Referral input validation, applied on blur rather than per keystroke.
    pub fn set_referral(&mut self, input: &str) -> Result<(), PurchaseError> {
        self.context.set_referral(input)
    }

    /// Buy clicked. Re-fetches the session: an existing pre-order is
    /// surfaced for resumption (never silently replaced), an existing
    /// successful order aborts toward the holdings view.
    pub async fn begin(&mut self, activity: &ActivityConfig) -> Result<BeginOutcome, PurchaseError> {
        if self.processing {
            return Err(PurchaseError::Generic(
                "a purchase is already in progress".to_string(),
            ));
        }
        if self.context.selected_tier().is_none() {
            return Err(PurchaseError::Generic("no tier selected".to_string()));
        }

        let mut session = self.fetch_session(Some(&activity.activity_id)).await?;
        if let Some(pre_order) = session.pre_order.take() {
            debug!(pre_order_id = ?pre_order.pre_order_id, "existing pre-order found");
            return Ok(BeginOutcome::Resume(pre_order));
        }
        if session.has_successful_order(&activity.activity_id) {
            return Err(PurchaseError::AlreadyPurchased);
        }

        self.state = PurchaseState::Confirming;
        Ok(BeginOutcome::Confirm)
    }

    /// User confirmed the purchase: create the pre-order, run the signed
    /// transfer, convert to a formal order.
    pub async fn execute(
        &mut self,
        signer: &dyn TransferSigner,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        if self.processing {
            return Err(PurchaseError::Generic(
                "a purchase is already in progress".to_string(),
            ));
        }
        self.processing = true;
        let result = self.run_purchase(signer).await;
        self.processing = false;

        match &result {
            Ok(PurchaseOutcome::Completed(_)) => self.state = PurchaseState::Success,
            Ok(PurchaseOutcome::RegistrationPending { .. }) => {}
            Err(PurchaseError::UserCancelled) => self.state = PurchaseState::Cancelled,
            Err(_) => self.state = PurchaseState::Failed,
        }
        result
    }

    async fn run_purchase(
        &mut self,
        signer: &dyn TransferSigner,
    ) -> Result<PurchaseOutcome, PurchaseError> {
        let tier = self
            .context
            .selected_tier()
            .ok_or_else(|| PurchaseError::Generic("no tier selected".to_string()))?;
        let wallet = self.context.wallet().to_string();
        self.state = PurchaseState::Confirming;

        // Re-fetch both sources of truth immediately before committing: the
        // round may have just ended, the wallet may have just purchased.
        let activity = self
            .backend
            .get_activity()
            .await?
            .ok_or(PurchaseError::RoundEnded)?;
        let session = self
            .backend
            .get_session(&wallet, Some(&activity.activity_id))
            .await?;
        if session.has_successful_order(&activity.activity_id) {
            return Err(PurchaseError::AlreadyPurchased);
        }
        if session.pre_order.is_some() {
            // Creating a second reservation would conflict server-side.
            return Err(PurchaseError::Generic(
                "an unfinished pre-order exists; resume or cancel it first".to_string(),
            ));
        }

        self.context.validate_referral()?;
        self.transfer.check_connectivity().await?;

        let destination = Pubkey::from_str(&activity.custody_wallet_address)
            .map_err(|e| PurchaseError::Generic(format!("invalid custody address: {e}")))?;

        let request = CreatePreOrder {
            public_key: wallet.clone(),
            amount: tier,
            activity_id: activity.activity_id.clone(),
            referral_wallet_address: self.context.referral().map(str::to_string),
        };
        request.validate(&activity)?;

        let pre_order_id = self.backend.create_pre_order(&request).await?;
        self.state = PurchaseState::PreOrderCreated {
            pre_order_id: pre_order_id.clone(),
        };

        self.state = PurchaseState::AwaitingSignature {
            pre_order_id: pre_order_id.clone(),
        };
        let signature = match self.transfer.transfer(&destination, tier, signer).await {
            TransferResult::Confirmed(signature) => signature,
            TransferResult::Failed(failure) => {
                // The pre-order stays server-side on purpose: the user can
                // resume it later instead of re-creating it.
                warn!(%pre_order_id, %failure, "transfer did not complete");
                return Err(failure.into());
            }
        };
        self.state = PurchaseState::Submitted {
            pre_order_id: pre_order_id.clone(),
            signature: signature.to_string(),
        };

        self.state = PurchaseState::ConvertingToFormal {
            pre_order_id: pre_order_id.clone(),
            signature: signature.to_string(),
        };
        let convert = ConvertToFormal {
            pre_order_id,
            trx_id: signature.to_string(),
            public_key: wallet.clone(),
        };
        let retry = self.retry;
        let backend = Arc::clone(&self.backend);
        let converted = retry
            .run(|attempt| {
                let backend = Arc::clone(&backend);
                let request = convert.clone();
                async move {
                    debug!(attempt, pre_order_id = %request.pre_order_id, "converting to formal");
                    backend.convert_to_formal(&request).await
                }
            })
            .await;

        match converted {
            Ok(session) => {
                info!(%signature, "purchase complete");
                // Refresh so callers see backend truth, not just the
                // conversion response.
                let refreshed = self
                    .backend
                    .get_session(&wallet, Some(&activity.activity_id))
                    .await
                    .unwrap_or(session);
                Ok(PurchaseOutcome::Completed(refreshed))
            }
            Err(err) => {
                // The transfer already confirmed on-chain; exhausted
                // conversion retries are bookkeeping lag, not failure.
                warn!(%err, %signature, "conversion retries exhausted, registration pending");
                if let Err(refresh_err) = self
                    .backend
                    .get_session(&wallet, Some(&activity.activity_id))
                    .await
                {
                    debug!(%refresh_err, "final session refresh failed");
                }
                Ok(PurchaseOutcome::RegistrationPending { signature })
            }
        }
    }

    /// Recovery prompt projection: fires at most once per visit, only when
    /// the session carries a pre-order, and never while a fresh purchase is
    /// mid-flight.
    pub fn take_recovery_prompt(&mut self, session: &Session) -> Option<PreOrder> {
        if self.processing || self.recovery_prompted {
            return None;
        }
        let pre_order = session.pre_order.clone()?;
        self.recovery_prompted = true;
        Some(pre_order)
    }

    /// Completes an unfinished pre-order with a transaction signature the
    /// user already holds from a prior attempt.
    pub async fn resume_with_signature(&mut self, trx_id: &str) -> Result<Session, PurchaseError> {
        let wallet = self.context.wallet().to_string();
        let session = self.backend.get_session(&wallet, None).await?;
        let pre_order = session
            .pre_order
            .ok_or_else(|| PurchaseError::Generic("no unfinished order to resume".to_string()))?;
        let pre_order_id = pre_order.id()?.to_string();

        let request = ConvertToFormal {
            pre_order_id,
            trx_id: trx_id.trim().to_string(),
            public_key: wallet,
        };
        let session = self.backend.convert_to_formal(&request).await?;
        if session.has_successful_order(&pre_order.activity_id) {
            self.state = PurchaseState::Success;
        }
        Ok(session)
    }

    /// Explicit abandonment of an unfinished pre-order. Idempotent: a
    /// pre-order that is already gone counts as deleted.
    pub async fn cancel_pre_order(&mut self, activity_id: &str) -> Result<(), PurchaseError> {
        let wallet = self.context.wallet().to_string();
        let session = self.backend.get_session(&wallet, Some(activity_id)).await?;
        let Some(pre_order) = session.pre_order else {
            return Ok(());
        };

        let request = DeletePreOrder {
            activity_id: activity_id.to_string(),
            public_key: wallet,
            pre_order_id: pre_order.id()?.to_string(),
        };
        self.backend.delete_pre_order(&request).await?;
        info!(pre_order_id = %request.pre_order_id, "pre-order cancelled");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_processing_for_test(&mut self, processing: bool) {
        self.processing = processing;
    }
}
