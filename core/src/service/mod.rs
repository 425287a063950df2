//! Request dispatch for the preferences bus service.
//!
//! Each request names a method, carries a JSON payload and arrives on a
//! public or private channel. The reply is always a JSON value: a bare array
//! for the plain list methods, an object otherwise, with `returnValue` and
//! `errorText` on failure.

pub mod request;

pub use request::{Category, Channel, Method};

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, instrument, warn};

use crate::codec;
use crate::error::{ErrorKind, PrefsError, Result};
use crate::infrastructure::audit::{self, AuditEvent};
use crate::infrastructure::config::Settings;
use crate::properties::SystemProperties;
use crate::store::{AppHandle, AppStore};
use request::{AppKeyRequest, AppRequest, KeyRequest, SetRequest};

const MISSING_KEY: &str = "missing parameter key";
const MISSING_APP_ID: &str = "no appId parameter found";
const MISSING_APP_ID_OR_KEY: &str = "no appId or key parameter found";
const MISSING_SOME_KEY: &str = "missing \"key\" parameter";

/// A failed request: the reply text and nothing else.
#[derive(Debug)]
struct Refusal(String);

impl From<PrefsError> for Refusal {
    fn from(err: PrefsError) -> Self {
        Self(err.to_string())
    }
}

impl From<&str> for Refusal {
    fn from(text: &str) -> Self {
        Self(text.to_owned())
    }
}

type Reply = std::result::Result<Value, Refusal>;

/// Dispatcher over one application store root and one property resolver.
#[derive(Debug, Clone)]
pub struct PrefsService {
    store: AppStore,
    properties: SystemProperties,
}

impl PrefsService {
    /// Creates a dispatcher over explicit collaborators.
    #[must_use]
    pub fn new(store: AppStore, properties: SystemProperties) -> Self {
        Self { store, properties }
    }

    /// Creates a dispatcher for the host described by `settings`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            AppStore::from_settings(&settings.store),
            SystemProperties::from_settings(settings),
        )
    }

    /// Handles a request addressed by full method path, such as
    /// `/systemProperties/getSysKeys`.
    pub async fn call(&self, path: &str, payload: &str, channel: Channel) -> Value {
        match Method::from_path(path) {
            Some(method) => self.dispatch(method, payload, channel).await,
            None => {
                debug!(path, "Unknown method");
                failure(ErrorKind::NotImplemented.message())
            }
        }
    }

    /// Handles one request and builds its reply.
    #[instrument(skip(self, payload, channel), fields(channel = channel.as_str()))]
    pub async fn dispatch(&self, method: Method, payload: &str, channel: Channel) -> Value {
        if method.category() == Category::App && channel == Channel::Public {
            audit::log_audit(&AuditEvent::AccessDenied {
                method: format!("{method:?}"),
                channel: channel.as_str().to_owned(),
            });
            return failure(ErrorKind::NotImplemented.message());
        }

        let public = channel == Channel::Public;
        let reply = match method {
            Method::SysKeys { obj } => self
                .properties
                .list_keys(public)
                .await
                .map(|keys| list_reply(keys.into_iter().map(Value::String).collect(), obj))
                .map_err(Refusal::from),
            Method::SysAll { obj } => self
                .properties
                .list_all(public)
                .await
                .map(|pairs| list_reply(pairs, obj))
                .map_err(Refusal::from),
            Method::SysSome { obj } => self.sys_some(payload, public, obj).await,
            Method::SysGet => self.sys_get(payload, public).await,
            Method::AppKeys { obj } => self.app_keys(payload, obj).await,
            Method::AppAll { obj } => self.app_all(payload, obj).await,
            Method::AppGet => self.app_get(payload).await,
            Method::AppSet => self.app_set(payload).await,
            Method::AppRemove => self.app_remove(payload).await,
        };

        reply.unwrap_or_else(|Refusal(text)| {
            info!(?method, error = %text, "Request failed");
            failure(&text)
        })
    }

    /// Whether a public caller may see `key`; audited when not.
    fn withheld(&self, key: &str, public: bool, method: &str) -> bool {
        if !public || self.properties.is_public(key) {
            return false;
        }
        audit::log_audit(&AuditEvent::PropertyWithheld {
            key: key.to_owned(),
            method: method.to_owned(),
        });
        true
    }

    async fn sys_get(&self, payload: &str, public: bool) -> Reply {
        let KeyRequest { key } = parse(payload, MISSING_KEY)?;
        if self.withheld(&key, public, "getSysProperty") {
            return Err(PrefsError::NoSuchKey.into());
        }
        let raw = self.properties.resolve(&key).await?;
        Ok(key_value_reply(&key, &raw))
    }

    async fn sys_some(&self, payload: &str, public: bool, obj: bool) -> Reply {
        let Ok(Value::Array(requested)) = serde_json::from_str::<Value>(payload) else {
            return Err(PrefsError::ParamError.into());
        };

        let mut results = Vec::with_capacity(requested.len());
        for element in requested {
            let Ok(KeyRequest { key }) = serde_json::from_value::<KeyRequest>(element) else {
                results.push(codec::pair("errorText", json!(MISSING_SOME_KEY)));
                continue;
            };
            let resolved = if self.withheld(&key, public, "getSomeSysProperties") {
                Err(PrefsError::NoSuchKey)
            } else {
                self.properties.resolve(&key).await
            };
            results.push(match resolved {
                Ok(raw) => codec::pair(&key, Value::String(raw)),
                Err(e) => codec::pair("errorText", json!(e.to_string())),
            });
        }
        Ok(list_reply(results, obj))
    }

    async fn app_keys(&self, payload: &str, obj: bool) -> Reply {
        let AppRequest { app_id } = parse(payload, MISSING_APP_ID)?;
        let mut handle = self.store.open(&app_id)?;
        let keys = handle.list_keys().await;
        finish(handle, false).await?;
        Ok(list_reply(keys?.into_iter().map(Value::String).collect(), obj))
    }

    async fn app_all(&self, payload: &str, obj: bool) -> Reply {
        let AppRequest { app_id } = parse(payload, MISSING_APP_ID)?;
        let mut handle = self.store.open(&app_id)?;
        let pairs = handle.list_all().await;
        finish(handle, false).await?;
        Ok(list_reply(pairs?, obj))
    }

    async fn app_get(&self, payload: &str) -> Reply {
        let AppKeyRequest { app_id, key } = parse(payload, MISSING_APP_ID_OR_KEY)?;
        let mut handle = self.store.open(&app_id)?;
        let value = handle.get(&key).await;
        finish(handle, false).await?;
        Ok(key_value_reply(&key, &value?))
    }

    async fn app_set(&self, payload: &str) -> Reply {
        let SetRequest { app_id, key, value } = serde_json::from_str(payload)
            .map_err(|_| Refusal::from(PrefsError::ParamError))?;
        let app_id = string_param(app_id, "appId")?;
        let key = string_param(key, "key")?;
        let value = value.ok_or_else(|| missing_param("value"))?;
        let text = match value {
            Value::String(text) => text,
            other if codec::is_document(&other) => other.to_string(),
            _ => return Err(PrefsError::ValueNotJson.into()),
        };

        let mut handle = self.store.open(&app_id)?;
        let written = handle.set(&key, &text).await;
        finish(handle, written.is_ok()).await?;
        written?;
        Ok(success())
    }

    async fn app_remove(&self, payload: &str) -> Reply {
        let AppKeyRequest { app_id, key } = parse(payload, MISSING_APP_ID_OR_KEY)?;
        let mut handle = self.store.open(&app_id)?;
        let removed = handle.remove(&key).await;
        finish(handle, removed.is_ok()).await?;
        removed?;
        Ok(success())
    }
}

/// Closes `handle`, logging rather than masking an earlier failure.
async fn finish(handle: AppHandle, commit: bool) -> Result<()> {
    let app_id = handle.app_id().to_owned();
    handle.close(commit).await.inspect_err(|e| {
        warn!(%app_id, commit, error = %e, "Failed to close application store");
    })
}

fn parse<T: DeserializeOwned>(payload: &str, missing: &str) -> std::result::Result<T, Refusal> {
    serde_json::from_str(payload).map_err(|e| {
        debug!(error = %e, "Malformed request payload");
        Refusal::from(missing)
    })
}

fn missing_param(name: &str) -> Refusal {
    Refusal(format!("Missing required parameter \"{name}\"."))
}

/// A parameter that is absent or not a string counts as missing.
fn string_param(value: Option<Value>, name: &str) -> std::result::Result<String, Refusal> {
    match value {
        Some(Value::String(text)) => Ok(text),
        _ => Err(missing_param(name)),
    }
}

fn success() -> Value {
    json!({"returnValue": true})
}

fn failure(text: &str) -> Value {
    json!({"returnValue": false, "errorText": text})
}

fn list_reply(values: Vec<Value>, obj: bool) -> Value {
    if obj {
        json!({"values": values, "returnValue": true})
    } else {
        Value::Array(values)
    }
}

fn key_value_reply(key: &str, raw: &str) -> Value {
    let mut reply = codec::pair(key, codec::raw_to_value(raw));
    if let Value::Object(fields) = &mut reply {
        fields.insert("returnValue".to_owned(), Value::Bool(true));
    }
    reply
}
