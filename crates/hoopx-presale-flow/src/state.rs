/// Purchase flow states.
///
/// Prompt and modal visibility in a UI layer is a projection of this enum
/// plus the current session, never an independently mutated flag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PurchaseState {
    #[default]
    Idle,
    TierSelected {
        tier: u64,
    },
    Confirming,
    PreOrderCreated {
        pre_order_id: String,
    },
    AwaitingSignature {
        pre_order_id: String,
    },
    Submitted {
        pre_order_id: String,
        signature: String,
    },
    ConvertingToFormal {
        pre_order_id: String,
        signature: String,
    },
    Success,
    Cancelled,
    Failed,
}

impl PurchaseState {
    /// States between pre-order creation and conversion, where server-side
    /// or chain-side state may already exist.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            PurchaseState::Confirming
                | PurchaseState::PreOrderCreated { .. }
                | PurchaseState::AwaitingSignature { .. }
                | PurchaseState::Submitted { .. }
                | PurchaseState::ConvertingToFormal { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PurchaseState::Success | PurchaseState::Cancelled | PurchaseState::Failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_covers_states_with_dangling_side_effects() {
        assert!(!PurchaseState::Idle.is_in_flight());
        assert!(!PurchaseState::TierSelected { tier: 1000 }.is_in_flight());
        assert!(PurchaseState::Confirming.is_in_flight());
        assert!(PurchaseState::PreOrderCreated {
            pre_order_id: "ORD-1".into()
        }
        .is_in_flight());
        assert!(!PurchaseState::Success.is_in_flight());
        assert!(PurchaseState::Failed.is_terminal());
    }
}
