//! Method names and typed request payloads.

use serde::Deserialize;
use serde_json::Value;

/// Which bus the request arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Unprivileged callers; system properties are filtered by the whitelist.
    Public,
    /// Trusted callers.
    Private,
}

impl Channel {
    /// Lowercase name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

/// Method groups, each registered under its own path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// `/systemProperties`, on both channels.
    System,
    /// `/appProperties`, private channel only.
    App,
}

impl Category {
    /// Parses a category path such as `/systemProperties`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_start_matches('/') {
            "systemProperties" => Some(Self::System),
            "appProperties" => Some(Self::App),
            _ => None,
        }
    }
}

/// A dispatchable operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// List system property keys.
    SysKeys {
        /// Wrap the array in a `values` object.
        obj: bool,
    },
    /// List every system property with its value.
    SysAll {
        /// Wrap the array in a `values` object.
        obj: bool,
    },
    /// Resolve a caller-chosen set of system properties.
    SysSome {
        /// Wrap the array in a `values` object.
        obj: bool,
    },
    /// Resolve one system property.
    SysGet,
    /// List an application's keys.
    AppKeys {
        /// Wrap the array in a `values` object.
        obj: bool,
    },
    /// List an application's entries.
    AppAll {
        /// Wrap the array in a `values` object.
        obj: bool,
    },
    /// Read one application value.
    AppGet,
    /// Write one application value.
    AppSet,
    /// Delete one application value.
    AppRemove,
}

impl Method {
    /// Looks up `name` within `category`, including the legacy capitalised
    /// aliases.
    #[must_use]
    pub fn parse(category: Category, name: &str) -> Option<Self> {
        let method = match (category, name) {
            (Category::System, "getSysKeys" | "GetKeys") => Self::SysKeys { obj: false },
            (Category::System, "getSysKeysObj") => Self::SysKeys { obj: true },
            (Category::System, "getAllSysProperties" | "GetAll") => Self::SysAll { obj: false },
            (Category::System, "getAllSysPropertiesObj") => Self::SysAll { obj: true },
            (Category::System, "getSomeSysProperties" | "GetSome") => {
                Self::SysSome { obj: false }
            }
            (Category::System, "getSomeSysPropertiesObj") => Self::SysSome { obj: true },
            (Category::System, "getSysProperty" | "Get") => Self::SysGet,
            (Category::App, "getAppKeys" | "GetKeys") => Self::AppKeys { obj: false },
            (Category::App, "getAppKeysObj") => Self::AppKeys { obj: true },
            (Category::App, "getAllAppProperties" | "GetAll") => Self::AppAll { obj: false },
            (Category::App, "getAllAppPropertiesObj") => Self::AppAll { obj: true },
            (Category::App, "getAppProperty" | "Get") => Self::AppGet,
            (Category::App, "setAppProperty" | "Set") => Self::AppSet,
            (Category::App, "removeAppProperty" | "Remove") => Self::AppRemove,
            _ => return None,
        };
        Some(method)
    }

    /// Parses a full method path such as `/systemProperties/getSysKeys`.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let (category, name) = path.rsplit_once('/')?;
        Self::parse(Category::from_path(category)?, name)
    }

    /// The category this method belongs to.
    #[must_use]
    pub const fn category(self) -> Category {
        match self {
            Self::SysKeys { .. } | Self::SysAll { .. } | Self::SysSome { .. } | Self::SysGet => {
                Category::System
            }
            _ => Category::App,
        }
    }
}

/// Payload naming one system property.
#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    /// Fully prefixed property key.
    pub key: String,
}

/// Payload naming an application.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppRequest {
    /// Application identifier.
    pub app_id: String,
}

/// Payload naming one key of an application.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppKeyRequest {
    /// Application identifier.
    pub app_id: String,
    /// Preference key.
    pub key: String,
}

/// Payload for writing a value. Fields are untyped and optional so that each
/// missing or non-string one can be reported by name.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRequest {
    /// Application identifier; must be a string.
    pub app_id: Option<Value>,
    /// Preference key; must be a string.
    pub key: Option<Value>,
    /// A document, or a string holding the document's JSON text.
    pub value: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_aliases_depend_on_category() {
        assert_eq!(
            Method::parse(Category::System, "Get"),
            Some(Method::SysGet)
        );
        assert_eq!(Method::parse(Category::App, "Get"), Some(Method::AppGet));
        assert_eq!(Method::parse(Category::System, "Set"), None);
        assert_eq!(Method::parse(Category::App, "GetSome"), None);
    }

    #[test]
    fn paths_split_category_and_name() {
        assert_eq!(
            Method::from_path("/systemProperties/getSysKeysObj"),
            Some(Method::SysKeys { obj: true })
        );
        assert_eq!(
            Method::from_path("/appProperties/setAppProperty"),
            Some(Method::AppSet)
        );
        assert_eq!(Method::from_path("/other/getSysKeys"), None);
        assert_eq!(Method::from_path("getSysKeys"), None);
    }

    #[test]
    fn every_method_reports_its_category() {
        assert_eq!(Method::SysSome { obj: false }.category(), Category::System);
        assert_eq!(Method::AppRemove.category(), Category::App);
    }

    #[test]
    fn set_request_tolerates_missing_and_mistyped_fields() -> anyhow::Result<()> {
        let request: SetRequest = serde_json::from_str(r#"{"appId": "a"}"#)?;
        assert_eq!(request.app_id, Some(Value::from("a")));
        assert!(request.key.is_none());
        assert!(request.value.is_none());

        let request: SetRequest = serde_json::from_str(r#"{"appId": 5, "key": ["k"]}"#)?;
        assert_eq!(request.app_id, Some(Value::from(5)));
        assert!(request.key.is_some_and(|key| key.is_array()));
        Ok(())
    }
}
