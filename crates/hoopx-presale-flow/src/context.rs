use solana_sdk::pubkey::Pubkey;

use crate::errors::PurchaseError;

/// Per-purchase inputs, owned by the orchestrator.
///
/// Explicit fields cleared by [`reset`](Self::reset) rather than ambient
/// global stores.
#[derive(Debug, Clone)]
pub struct PurchaseContext {
    wallet: Pubkey,
    selected_tier: Option<u64>,
    referral: Option<String>,
}

impl PurchaseContext {
    pub fn new(wallet: Pubkey) -> Self {
        Self {
            wallet,
            selected_tier: None,
            referral: None,
        }
    }

    pub fn wallet(&self) -> &Pubkey {
        &self.wallet
    }

    pub fn select_tier(&mut self, tier: u64) {
        self.selected_tier = Some(tier);
    }

    pub fn selected_tier(&self) -> Option<u64> {
        self.selected_tier
    }

    /// Sets the referral address, validating on blur: an empty input clears
    /// it, the connected wallet's own address is rejected.
    pub fn set_referral(&mut self, input: &str) -> Result<(), PurchaseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            self.referral = None;
            return Ok(());
        }
        if trimmed == self.wallet.to_string() {
            return Err(PurchaseError::SelfReferral);
        }
        self.referral = Some(trimmed.to_string());
        Ok(())
    }

    pub fn referral(&self) -> Option<&str> {
        self.referral.as_deref()
    }

    /// Re-checked right before submission, in case the wallet changed after
    /// the referral was entered.
    pub fn validate_referral(&self) -> Result<(), PurchaseError> {
        match &self.referral {
            Some(referral) if *referral == self.wallet.to_string() => {
                Err(PurchaseError::SelfReferral)
            }
            _ => Ok(()),
        }
    }

    pub fn reset(&mut self) {
        self.selected_tier = None;
        self.referral = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_is_trimmed_and_own_wallet_rejected() {
        let wallet = Pubkey::new_unique();
        let mut context = PurchaseContext::new(wallet);

        assert!(matches!(
            context.set_referral(&format!("  {wallet}  ")),
            Err(PurchaseError::SelfReferral)
        ));
        assert!(context.referral().is_none());

        let friend = Pubkey::new_unique().to_string();
        context.set_referral(&format!(" {friend} ")).unwrap();
        assert_eq!(context.referral(), Some(friend.as_str()));

        context.set_referral("   ").unwrap();
        assert!(context.referral().is_none());
    }

    #[test]
    fn reset_clears_tier_and_referral() {
        let mut context = PurchaseContext::new(Pubkey::new_unique());
        context.select_tier(1000);
        context.set_referral(&Pubkey::new_unique().to_string()).unwrap();

        context.reset();
        assert!(context.selected_tier().is_none());
        assert!(context.referral().is_none());
    }
}
