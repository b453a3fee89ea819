//! Signed cookie holding the little per-browser state this service needs:
//! flash messages and the charge id of an in-flight PSP test payment.
//!
//! Login and the wider session are handled by the fronting auth layer.
//! The cookie is `base64url(json) "." hex(hmac_sha256(payload))` and is only
//! rewritten when a handler changed it.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::async_trait;
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::AppState;

pub const SESSION_COOKIE: &str = "selfservice_state";

pub const FLASH_GENERIC: &str = "generic";
pub const FLASH_ERROR: &str = "genericError";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flash: BTreeMap<String, Vec<String>>,
    /// Gateway account external id → charge id of the last test payment.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub test_payment_charges: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct SessionState {
    data: SessionData,
    dirty: bool,
}

/// Request-scoped handle on the session cookie contents.
#[derive(Debug, Clone, Default)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    pub fn new(data: SessionData) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState { data, dirty: false })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = match self.inner.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    pub fn flash(&self, kind: &str, message: impl Into<String>) {
        let message = message.into();
        self.with(|s| {
            s.data.flash.entry(kind.to_string()).or_default().push(message);
            s.dirty = true;
        });
    }

    /// Remove and return all pending flash messages.
    pub fn take_flash(&self) -> BTreeMap<String, Vec<String>> {
        self.with(|s| {
            if s.data.flash.is_empty() {
                return BTreeMap::new();
            }
            s.dirty = true;
            std::mem::take(&mut s.data.flash)
        })
    }

    pub fn set_test_payment_charge(&self, account_external_id: &str, charge_id: &str) {
        self.with(|s| {
            s.data
                .test_payment_charges
                .insert(account_external_id.to_string(), charge_id.to_string());
            s.dirty = true;
        });
    }

    pub fn take_test_payment_charge(&self, account_external_id: &str) -> Option<String> {
        self.with(|s| {
            let charge = s.data.test_payment_charges.remove(account_external_id);
            if charge.is_some() {
                s.dirty = true;
            }
            charge
        })
    }

    fn changed(&self) -> Option<SessionData> {
        self.with(|s| s.dirty.then(|| s.data.clone()))
    }
}

fn sign(key: &str, payload: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn encode(key: &str, data: &SessionData) -> String {
    let json = serde_json::to_vec(data).unwrap_or_default();
    let payload = URL_SAFE_NO_PAD.encode(json);
    let signature = sign(key, &payload);
    format!("{}.{}", payload, signature)
}

/// Decode a cookie value; tampered or malformed cookies yield `None`.
pub fn decode(key: &str, value: &str) -> Option<SessionData> {
    let (payload, signature) = value.rsplit_once('.')?;
    let signature = hex::decode(signature).ok()?;
    let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).ok()?;
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).ok()?;
    let json = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&json).ok()
}

fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .map(str::trim)
        .find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then_some(v)
        })
}

/// Middleware: loads the session cookie into request extensions and writes
/// it back if a handler changed it.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let key = state.config.session_key.as_str();
    let data = read_cookie(req.headers(), SESSION_COOKIE)
        .and_then(|v| {
            let decoded = decode(key, v);
            if decoded.is_none() {
                tracing::warn!("discarding session cookie with invalid signature");
            }
            decoded
        })
        .unwrap_or_default();

    let session = Session::new(data);
    req.extensions_mut().insert(session.clone());

    let mut resp = next.run(req).await;

    if let Some(changed) = session.changed() {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            encode(key, &changed)
        );
        if let Ok(val) = HeaderValue::from_str(&cookie) {
            resp.headers_mut().append(SET_COOKIE, val);
        }
    }
    resp
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Session>().cloned().unwrap_or_default())
    }
}
