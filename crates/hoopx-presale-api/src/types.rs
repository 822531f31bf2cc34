use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::errors::{ApiError, ApiResult};

/// Token-release cadence attached to an activity and copied onto orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum VestingFrequency {
    Monthly,
    Yearly,
}

impl From<u8> for VestingFrequency {
    fn from(raw: u8) -> Self {
        match raw {
            2 => VestingFrequency::Yearly,
            // Backend documents 1=monthly; anything unexpected falls back to it.
            _ => VestingFrequency::Monthly,
        }
    }
}

impl From<VestingFrequency> for u8 {
    fn from(freq: VestingFrequency) -> Self {
        match freq {
            VestingFrequency::Monthly => 1,
            VestingFrequency::Yearly => 2,
        }
    }
}

/// Backend order status: 1=success, 2=failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum PurchaseStatus {
    Success,
    Failed,
}

impl From<u8> for PurchaseStatus {
    fn from(raw: u8) -> Self {
        match raw {
            1 => PurchaseStatus::Success,
            _ => PurchaseStatus::Failed,
        }
    }
}

impl From<PurchaseStatus> for u8 {
    fn from(status: PurchaseStatus) -> Self {
        match status {
            PurchaseStatus::Success => 1,
            PurchaseStatus::Failed => 2,
        }
    }
}

/// Current presale round configuration.
///
/// Immutable snapshot per fetch. `custody_wallet_address` arrives
/// AES-encrypted on the wire and is decrypted by the client before the
/// config is handed out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityConfig {
    pub activity_id: String,
    pub rate: Decimal,
    #[serde(default, alias = "tierList", deserialize_with = "tier_list")]
    pub tiers: Vec<u64>,
    #[serde(rename = "hoopxWalletAddress")]
    pub custody_wallet_address: String,
    pub vesting: String,
    pub cliff: String,
    pub vesting_frequency: VestingFrequency,
    pub start_time: String,
    pub end_time: String,
    pub timezone: String,
    #[serde(default)]
    pub token_total: Decimal,
    #[serde(default)]
    pub purchased_amount: Decimal,
}

impl ActivityConfig {
    /// Whether `amount_usdt` is one of the allowed purchase tiers.
    pub fn allows_tier(&self, amount_usdt: u64) -> bool {
        self.tiers.contains(&amount_usdt)
    }

    /// HOOPX amount purchased for `amount_usdt` at this round's rate.
    pub fn token_amount(&self, amount_usdt: u64) -> Decimal {
        if self.rate.is_zero() {
            return Decimal::ZERO;
        }
        Decimal::from(amount_usdt) / self.rate
    }

    /// Whether the round is past its `end_time` in its own timezone.
    ///
    /// An unparseable end time is treated as still running; the backend stops
    /// returning the round once it actually ends.
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        match self.end_datetime() {
            Some(end) => now > end,
            None => {
                debug!(
                    end_time = %self.end_time,
                    timezone = %self.timezone,
                    "could not parse activity end time"
                );
                false
            }
        }
    }

    fn end_datetime(&self) -> Option<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(&self.end_time, "%Y-%m-%d %H:%M:%S").ok()?;
        let offset = parse_gmt_offset(&self.timezone)?;
        naive
            .and_local_timezone(offset)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Parses offsets of the form `GMT+8`, `GMT-5:30` or `UTC+8`.
fn parse_gmt_offset(tz: &str) -> Option<FixedOffset> {
    let rest = tz
        .trim()
        .strip_prefix("GMT")
        .or_else(|| tz.trim().strip_prefix("UTC"))?;
    if rest.is_empty() {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match rest.split_at(1) {
        ("+", r) => (1, r),
        ("-", r) => (-1, r),
        _ => return None,
    };
    let mut parts = rest.splitn(2, ':');
    let hours: i32 = parts.next()?.parse().ok()?;
    let minutes: i32 = parts.next().map(|m| m.parse().ok()).unwrap_or(Some(0))?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn tier_list<'de, D>(deserializer: D) -> Result<Vec<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawTier {
        Num(u64),
        Text(String),
    }

    let raw = Vec::<RawTier>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|tier| match tier {
            RawTier::Num(n) => Ok(n),
            RawTier::Text(s) => s.trim().parse::<u64>().map_err(de::Error::custom),
        })
        .collect()
}

/// A finalized purchase record. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub activity_id: String,
    pub trx_id: String,
    pub rate: Decimal,
    pub purchase_status: PurchaseStatus,
    #[serde(default)]
    pub activity_name: String,
    pub amount: Decimal,
    pub subscription_time: String,
    pub cliff: String,
    pub vesting: String,
    pub vesting_frequency: VestingFrequency,
}

impl Order {
    pub fn is_success(&self) -> bool {
        self.purchase_status == PurchaseStatus::Success
    }
}

/// A server-side reservation created before the on-chain transfer is signed.
///
/// At most one exists per (wallet, activity). Consumed by conversion to a
/// formal [`Order`] or destroyed by explicit cancellation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreOrder {
    #[serde(default)]
    pub pre_order_id: Option<String>,
    pub activity_id: String,
    #[serde(default)]
    pub user_id: i64,
    pub user_wallet: String,
    #[serde(default)]
    pub order_match: bool,
    pub amount_token: Decimal,
    pub amount_usdt: Decimal,
    pub price_usdt_per_token: Decimal,
    pub create_time: String,
}

impl PreOrder {
    /// Id required to convert or delete the reservation.
    pub fn id(&self) -> ApiResult<&str> {
        self.pre_order_id.as_deref().ok_or(ApiError::MissingPreOrderId)
    }
}

/// Per-wallet view of orders plus the current pre-order, if any.
///
/// Refetched after every mutating operation; the single source of truth for
/// "has this wallet already purchased the active round".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub public_key: String,
    #[serde(rename = "orderVoList", default)]
    pub orders: Vec<Order>,
    #[serde(rename = "preOrderVO", default)]
    pub pre_order: Option<PreOrder>,
}

impl Session {
    pub fn has_successful_order(&self, activity_id: &str) -> bool {
        self.orders
            .iter()
            .any(|order| order.is_success() && order.activity_id == activity_id)
    }

    pub fn successful_order(&self, activity_id: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|order| order.is_success() && order.activity_id == activity_id)
    }
}

/// `POST /purchase/create-pre` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreOrder {
    pub public_key: String,
    pub amount: u64,
    pub activity_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_wallet_address: Option<String>,
}

impl CreatePreOrder {
    /// Client-side guards applied before the reservation is committed:
    /// the amount must be an allowed tier and the referrer cannot be the
    /// purchasing wallet.
    pub fn validate(&self, activity: &ActivityConfig) -> ApiResult<()> {
        if !activity.allows_tier(self.amount) {
            return Err(ApiError::TierNotAllowed(self.amount));
        }
        if let Some(referral) = &self.referral_wallet_address {
            if referral.trim() == self.public_key {
                return Err(ApiError::SelfReferral);
            }
        }
        Ok(())
    }
}

/// `POST /purchase/convert-to-formal` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertToFormal {
    pub pre_order_id: String,
    pub trx_id: String,
    pub public_key: String,
}

/// `POST /purchase/del-pre` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePreOrder {
    pub activity_id: String,
    pub public_key: String,
    pub pre_order_id: String,
}
