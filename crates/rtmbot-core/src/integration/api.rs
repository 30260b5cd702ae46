//! Remote method calls.
//!
//! The chat service exposes a "call method X with parameters" API. rtmbot only
//! needs it once at startup (`rtm.start`) and for auxiliary calls made by
//! handlers (`reactions.add`, `im.open`, ...). The concrete HTTP caller lives
//! in `rtmbot-transport`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::foundation::error::{ApiError, ApiResult};

/// Parameters of a remote method call.
pub type Params = BTreeMap<String, String>;

/// Performs named remote procedure calls.
#[async_trait]
pub trait ApiCaller: Send + Sync {
    /// Calls `method` with `params` and returns the decoded response object.
    ///
    /// A response reporting `ok: false` is still returned as `Ok`; use
    /// [`Session::call_ok`](super::session::Session::call_ok) to treat it as
    /// an error.
    async fn call(&self, _method: &str, _params: Params) -> ApiResult<Value> {
        Err(ApiError::NotSupported)
    }
}

/// Shared API caller.
pub type BoxedApiCaller = Arc<dyn ApiCaller>;

/// [`ApiCaller`] that rejects every call.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledApiCaller;

#[async_trait]
impl ApiCaller for DisabledApiCaller {}

/// Builds a [`Params`] map from key/value pairs.
pub fn params<K, V, I>(pairs: I) -> Params
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Checks the `ok` flag of a response payload.
pub fn ensure_ok(method: &str, payload: Value) -> ApiResult<Value> {
    if payload.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(payload);
    }
    let error = payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("unknown_error")
        .to_string();
    Err(ApiError::Remote {
        method: method.to_string(),
        error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ensure_ok() {
        assert!(ensure_ok("a.b", json!({"ok": true})).is_ok());

        let err = ensure_ok("im.open", json!({"ok": false, "error": "user_not_found"})).unwrap_err();
        assert!(matches!(
            err,
            ApiError::Remote { ref method, ref error } if method == "im.open" && error == "user_not_found"
        ));

        assert!(matches!(
            ensure_ok("x", json!({})),
            Err(ApiError::Remote { ref error, .. }) if error == "unknown_error"
        ));
    }

    #[tokio::test]
    async fn test_disabled_caller() {
        let caller = DisabledApiCaller;
        assert!(matches!(
            caller.call("rtm.start", Params::new()).await,
            Err(ApiError::NotSupported)
        ));
    }

    #[test]
    fn test_params_builder() {
        let p = params([("channel", "C1"), ("name", "thumbsup")]);
        assert_eq!(p.get("channel").map(String::as_str), Some("C1"));
        assert_eq!(p.len(), 2);
    }
}
