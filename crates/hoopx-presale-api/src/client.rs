//! Backend HTTP client and the [`PresaleBackend`] trait.
//!
//! Every response arrives wrapped in a `{ code, msg, data }` envelope;
//! mutating calls signal failure with a non-200 code or a null `data`.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use crate::decrypt::AddressDecryptor;
use crate::errors::{ApiError, ApiResult};
use crate::types::{ActivityConfig, ConvertToFormal, CreatePreOrder, DeletePreOrder, Session};

/// Backend contract consumed by the purchase orchestrator.
///
/// `get_activity` and `get_session` are read operations with backend-defined
/// staleness; callers re-fetch immediately before any state-changing step.
/// `create_pre_order` is not idempotent — callers must check for an existing
/// pre-order first. `delete_pre_order` is idempotent from the caller's
/// perspective.
#[async_trait]
pub trait PresaleBackend: Send + Sync {
    /// Current presale round, or `None` when no round is active (absent and
    /// expired rounds are the same state).
    async fn get_activity(&self) -> ApiResult<Option<ActivityConfig>>;

    async fn get_session(&self, public_key: &str, activity_id: Option<&str>)
        -> ApiResult<Session>;

    /// Creates a server-side reservation, returning its id.
    async fn create_pre_order(&self, request: &CreatePreOrder) -> ApiResult<String>;

    /// Consumes the pre-order against a confirmed transfer signature and
    /// returns the refreshed session.
    async fn convert_to_formal(&self, request: &ConvertToFormal) -> ApiResult<Session>;

    async fn delete_pre_order(&self, request: &DeletePreOrder) -> ApiResult<()>;
}

/// `reqwest` implementation of [`PresaleBackend`].
pub struct PresaleClient {
    http: reqwest::Client,
    base_url: Url,
    decryptor: AddressDecryptor,
}

impl PresaleClient {
    pub fn new(base_url: &str, decryptor: AddressDecryptor) -> ApiResult<Self> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Ok(Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(&normalized)?,
            decryptor,
        })
    }

    fn endpoint(&self, path: &str) -> ApiResult<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> ApiResult<Payload> {
        let url = self.endpoint(path)?;
        let value: Value = self
            .http
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(unwrap_envelope(value))
    }
}

#[async_trait]
impl PresaleBackend for PresaleClient {
    async fn get_activity(&self) -> ApiResult<Option<ActivityConfig>> {
        let url = self.endpoint("purchase/details")?;
        let value: Value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let payload = unwrap_envelope(value);
        if payload.code != 200 {
            return Err(payload.into_error());
        }
        let Some(data) = payload.data else {
            debug!("no active presale round");
            return Ok(None);
        };

        let mut config: ActivityConfig =
            serde_json::from_value(data).map_err(|e| ApiError::Envelope {
                code: 200,
                msg: format!("malformed activity payload: {e}"),
            })?;
        config.custody_wallet_address = self.decryptor.decrypt(&config.custody_wallet_address)?;

        if config.has_ended(Utc::now()) {
            debug!(activity_id = %config.activity_id, "presale round has ended");
            return Ok(None);
        }
        Ok(Some(config))
    }

    async fn get_session(
        &self,
        public_key: &str,
        activity_id: Option<&str>,
    ) -> ApiResult<Session> {
        let mut body = json!({ "publicKey": public_key });
        if let Some(id) = activity_id {
            body["activityId"] = json!(id);
        }
        let payload = self.post("purchase/session", &body).await?;
        if payload.code != 200 {
            return Err(payload.into_error());
        }
        let data = payload.data.ok_or(ApiError::EmptyPayload)?;
        serde_json::from_value(data).map_err(|e| ApiError::Envelope {
            code: 200,
            msg: format!("malformed session payload: {e}"),
        })
    }

    async fn create_pre_order(&self, request: &CreatePreOrder) -> ApiResult<String> {
        let payload = self.post("purchase/create-pre", request).await?;
        if payload.code != 200 {
            return Err(payload.into_error());
        }
        let id = extract_pre_order_id(payload.data)?;
        debug!(pre_order_id = %id, amount = request.amount, "pre-order created");
        Ok(id)
    }

    async fn convert_to_formal(&self, request: &ConvertToFormal) -> ApiResult<Session> {
        let payload = self.post("purchase/convert-to-formal", request).await?;
        if payload.code != 200 || payload.data.is_none() {
            warn!(
                pre_order_id = %request.pre_order_id,
                code = payload.code,
                "conversion rejected: {}",
                payload.msg
            );
            if is_conversion_mismatch(&payload.msg) {
                return Err(ApiError::ConversionMismatch(payload.msg));
            }
            return Err(payload.into_error());
        }
        let data = payload.data.ok_or(ApiError::EmptyPayload)?;
        serde_json::from_value(data).map_err(|e| ApiError::Envelope {
            code: 200,
            msg: format!("malformed session payload: {e}"),
        })
    }

    async fn delete_pre_order(&self, request: &DeletePreOrder) -> ApiResult<()> {
        let payload = self.post("purchase/del-pre", request).await?;
        if payload.code != 200 {
            // Deleting an already-gone reservation still counts as success.
            if is_already_gone(&payload.msg) {
                debug!(pre_order_id = %request.pre_order_id, "pre-order was already gone");
                return Ok(());
            }
            return Err(payload.into_error());
        }
        Ok(())
    }
}

struct Payload {
    code: i64,
    msg: String,
    data: Option<Value>,
}

impl Payload {
    fn into_error(self) -> ApiError {
        ApiError::Envelope {
            code: self.code,
            msg: self.msg,
        }
    }
}

/// Peels the `{ code, msg, data }` wrapper; bare payloads pass through as-is.
///
/// Rejections may omit `data` entirely, so any object carrying a `code` key
/// is an envelope too.
fn unwrap_envelope(value: Value) -> Payload {
    match value {
        Value::Object(mut map) if map.contains_key("code") || map.contains_key("data") => {
            let code = map.get("code").and_then(Value::as_i64).unwrap_or(200);
            let msg = map
                .get("msg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let data = map.remove("data").filter(|d| !d.is_null());
            Payload { code, msg, data }
        }
        Value::Null => Payload {
            code: 200,
            msg: String::new(),
            data: None,
        },
        other => Payload {
            code: 200,
            msg: String::new(),
            data: Some(other),
        },
    }
}

/// `create-pre` answers with either a bare id string or `{ "preOrderId": id }`.
fn extract_pre_order_id(data: Option<Value>) -> ApiResult<String> {
    match data {
        Some(Value::String(id)) if !id.is_empty() => Ok(id),
        Some(Value::Object(map)) => match map.get("preOrderId").and_then(Value::as_str) {
            Some(id) if !id.is_empty() => Ok(id.to_string()),
            _ => Err(ApiError::MissingPreOrderId),
        },
        _ => Err(ApiError::MissingPreOrderId),
    }
}

/// The backend reports a signature/order mismatch with a fixed message.
fn is_conversion_mismatch(msg: &str) -> bool {
    msg.contains("交易哈希与订单数据匹配不通过") || msg.contains("does not match")
}

fn is_already_gone(msg: &str) -> bool {
    let msg = msg.to_ascii_lowercase();
    msg.contains("not found") || msg.contains("not exist") || msg.contains("不存在")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_unwraps_wrapped_and_bare_payloads() {
        let wrapped = unwrap_envelope(json!({ "code": 200, "msg": "", "data": { "x": 1 } }));
        assert_eq!(wrapped.code, 200);
        assert_eq!(wrapped.data, Some(json!({ "x": 1 })));

        let bare = unwrap_envelope(json!({ "activityId": "ACT-1" }));
        assert_eq!(bare.code, 200);
        assert_eq!(bare.data, Some(json!({ "activityId": "ACT-1" })));

        let empty = unwrap_envelope(json!({ "code": 200, "msg": "", "data": null }));
        assert!(empty.data.is_none());
    }

    #[test]
    fn rejection_without_data_key_is_still_an_envelope() {
        let payload = unwrap_envelope(json!({ "code": 500, "msg": "boom" }));
        assert_eq!(payload.code, 500);
        assert!(payload.data.is_none());
        assert!(matches!(
            payload.into_error(),
            ApiError::Envelope { code: 500, .. }
        ));
    }

    #[test]
    fn envelope_surfaces_backend_rejection() {
        let payload = unwrap_envelope(json!({ "code": 500, "msg": "nope", "data": null }));
        assert_eq!(payload.code, 500);
        assert!(matches!(
            payload.into_error(),
            ApiError::Envelope { code: 500, .. }
        ));
    }

    #[test]
    fn pre_order_id_comes_as_string_or_object() {
        assert_eq!(
            extract_pre_order_id(Some(json!("ORD-123"))).unwrap(),
            "ORD-123"
        );
        assert_eq!(
            extract_pre_order_id(Some(json!({ "preOrderId": "ORD-456" }))).unwrap(),
            "ORD-456"
        );
        assert!(matches!(
            extract_pre_order_id(Some(json!(""))),
            Err(ApiError::MissingPreOrderId)
        ));
        assert!(matches!(
            extract_pre_order_id(None),
            Err(ApiError::MissingPreOrderId)
        ));
    }

    #[test]
    fn mismatch_message_is_detected() {
        assert!(is_conversion_mismatch("交易哈希与订单数据匹配不通过"));
        assert!(is_conversion_mismatch("trxId does not match the order"));
        assert!(!is_conversion_mismatch("internal error"));
    }

    #[test]
    fn missing_pre_order_counts_as_deleted() {
        assert!(is_already_gone("pre-order Not Found"));
        assert!(is_already_gone("订单不存在"));
        assert!(!is_already_gone("permission denied"));
    }
}
