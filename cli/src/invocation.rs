//! Turning command-line flags into one store or property operation.

use anyhow::Result;
use propstore::codec;
use propstore::infrastructure::config::Settings;
use propstore::{AppStore, SystemProperties};
use serde_json::Value;

/// Raw flags, before their combinations are checked.
#[derive(Debug, Default)]
pub struct Flags {
    pub app_id: Option<String>,
    pub shell: bool,
    pub delete: Option<String>,
    pub set: Option<String>,
    pub all: bool,
    pub clear: bool,
    pub rest: Vec<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Keys,
    All,
    Get(String),
    Delete(String),
    Set { key: String, value: String },
    Clear,
}

/// A validated request.
#[derive(Debug, PartialEq, Eq)]
pub struct Invocation {
    app_id: Option<String>,
    shell: bool,
    action: Action,
}

impl Invocation {
    /// Checks flag combinations. The error is a usage message.
    pub fn from_flags(flags: Flags) -> Result<Self, String> {
        let Flags {
            app_id,
            shell,
            delete,
            set,
            all,
            clear,
            rest,
        } = flags;

        let exclusives = usize::from(all) + usize::from(delete.is_some()) + usize::from(set.is_some());
        let mut rest = rest.into_iter();
        let (key, value) = match delete.clone().or_else(|| set.clone()) {
            Some(key) => (Some(key), rest.next()),
            None => (rest.next(), None),
        };

        if (set.is_some() || delete.is_some() || clear) && app_id.is_none() {
            return Err("system properties are read-only; use -n".into());
        }
        if exclusives > 1 || (clear && (exclusives > 0 || key.is_some())) {
            return Err("pass at most 1 of -a, -k, -s and --clear".into());
        }
        if set.is_some() && value.is_none() {
            return Err("need value to set".into());
        }
        if delete.is_some() && value.is_some() {
            return Err("too many arguments".into());
        }
        if all {
            if let Some(key) = &key {
                return Err(format!("nothing to do with \"{key}\""));
            }
        }
        if rest.next().is_some() {
            return Err("too many arguments".into());
        }

        let action = match (key, value) {
            _ if clear => Action::Clear,
            (Some(key), Some(value)) if set.is_some() => Action::Set {
                value: if shell { coerce_document(&value) } else { value },
                key,
            },
            (Some(key), _) if delete.is_some() => Action::Delete(key),
            (Some(key), _) => Action::Get(key),
            (None, _) if all => Action::All,
            (None, _) => Action::Keys,
        };
        Ok(Self {
            app_id,
            shell,
            action,
        })
    }

    /// Runs the operation. Returns the text to print, if any.
    ///
    /// # Errors
    ///
    /// Returns the store or resolver error; its message is the fixed text
    /// for its kind.
    pub async fn execute(self, settings: &Settings) -> Result<Option<String>> {
        match self.app_id {
            Some(app_id) => {
                let store = AppStore::from_settings(&settings.store);
                run_app(&store, &app_id, self.shell, self.action).await
            }
            None => {
                let properties = SystemProperties::from_settings(settings);
                run_system(&properties, self.shell, self.action).await
            }
        }
    }
}

async fn run_app(
    store: &AppStore,
    app_id: &str,
    shell: bool,
    action: Action,
) -> Result<Option<String>> {
    if action == Action::Clear {
        store.clear_all(app_id).await?;
        return Ok(None);
    }

    let mut handle = store.open(app_id)?;
    let commit = matches!(action, Action::Set { .. } | Action::Delete(_));
    let output = match action {
        Action::Keys => handle
            .list_keys()
            .await
            .map(|keys| Some(render_list(keys.into_iter().map(Value::String).collect(), shell))),
        Action::All => handle
            .list_all()
            .await
            .map(|pairs| Some(render_list(pairs, shell))),
        Action::Get(key) if shell => handle.get_string(&key).await.map(Some),
        Action::Get(key) => handle.get(&key).await.map(Some),
        Action::Delete(key) => handle.remove(&key).await.map(|()| None),
        Action::Set { key, value } => handle.set(&key, &value).await.map(|()| None),
        Action::Clear => Ok(None),
    };
    let closed = handle.close(commit && output.is_ok()).await;
    let output = output?;
    closed?;
    Ok(output)
}

async fn run_system(
    properties: &SystemProperties,
    shell: bool,
    action: Action,
) -> Result<Option<String>> {
    let output = match action {
        Action::Keys => {
            let keys = properties.list_keys(false).await?;
            render_list(keys.into_iter().map(Value::String).collect(), shell)
        }
        Action::All => render_list(properties.list_all(false).await?, shell),
        Action::Get(key) if shell => properties.resolve(&key).await?,
        Action::Get(key) => properties.resolve_document(&key).await?.to_string(),
        Action::Delete(_) | Action::Set { .. } | Action::Clear => {
            anyhow::bail!("system properties are read-only")
        }
    };
    Ok(Some(output))
}

/// Wraps `text` as a one-element array unless it is already a document.
fn coerce_document(text: &str) -> String {
    if codec::validate_document(text).is_ok() {
        text.to_owned()
    } else {
        codec::wrap_scalar(text).to_string()
    }
}

/// A JSON array, or in shell mode its elements separated by spaces with
/// strings unquoted.
fn render_list(values: Vec<Value>, shell: bool) -> String {
    if !shell {
        return Value::Array(values).to_string();
    }
    values
        .into_iter()
        .map(|value| match value {
            Value::String(text) => text,
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use propstore::PrefsError;
    use serde_json::json;
    use tempfile::TempDir;

    fn flags(app: Option<&str>, rest: &[&str]) -> Flags {
        Flags {
            app_id: app.map(str::to_owned),
            rest: rest.iter().map(ToString::to_string).collect(),
            ..Flags::default()
        }
    }

    #[test]
    fn bare_invocation_lists_keys() {
        let invocation = Invocation::from_flags(flags(None, &[])).unwrap();
        assert_eq!(invocation.action, Action::Keys);
        assert_eq!(invocation.app_id, None);
    }

    #[test]
    fn positional_is_key_then_value() {
        let invocation = Invocation::from_flags(flags(Some("a"), &["k"])).unwrap();
        assert_eq!(invocation.action, Action::Get("k".into()));

        let mut set = flags(Some("a"), &["[1]"]);
        set.set = Some("k".into());
        let invocation = Invocation::from_flags(set).unwrap();
        assert_eq!(
            invocation.action,
            Action::Set {
                key: "k".into(),
                value: "[1]".into()
            }
        );
    }

    #[test]
    fn system_properties_are_read_only() {
        let mut set = flags(None, &["v"]);
        set.set = Some("k".into());
        assert_eq!(
            Invocation::from_flags(set).unwrap_err(),
            "system properties are read-only; use -n"
        );
    }

    #[test]
    fn exclusive_flags_conflict() {
        let mut both = flags(Some("a"), &[]);
        both.all = true;
        both.delete = Some("k".into());
        assert!(Invocation::from_flags(both).is_err());

        let mut all_with_key = flags(Some("a"), &["k"]);
        all_with_key.all = true;
        assert_eq!(
            Invocation::from_flags(all_with_key).unwrap_err(),
            "nothing to do with \"k\""
        );

        assert_eq!(
            Invocation::from_flags(flags(Some("a"), &["k", "v"])).unwrap_err(),
            "too many arguments"
        );
    }

    #[test]
    fn set_needs_value() {
        let mut set = flags(Some("a"), &[]);
        set.set = Some("k".into());
        assert_eq!(Invocation::from_flags(set).unwrap_err(), "need value to set");
    }

    #[test]
    fn shell_mode_wraps_plain_values() {
        let mut set = flags(Some("a"), &["hello"]);
        set.set = Some("k".into());
        set.shell = true;
        let invocation = Invocation::from_flags(set).unwrap();
        assert_eq!(
            invocation.action,
            Action::Set {
                key: "k".into(),
                value: r#"["hello"]"#.into()
            }
        );
        assert_eq!(coerce_document(r#"{"a":1}"#), r#"{"a":1}"#);
        assert_eq!(coerce_document("42"), r#"["42"]"#);
    }

    #[test]
    fn lists_render_for_shell() {
        let values = vec![json!("a"), json!({"b": 1})];
        assert_eq!(render_list(values.clone(), false), r#"["a",{"b":1}]"#);
        assert_eq!(render_list(values, true), r#"a {"b":1}"#);
    }

    fn sandbox(temp: &TempDir) -> Settings {
        let root = temp.path();
        let mut settings = Settings::default();
        settings.store.root = root.join("preferences");
        let props = &mut settings.properties;
        props.provisioned_dir = root.join("provisioned");
        props.tokens_dir = root.join("tokens");
        props.runtime_dir = root.join("runtime");
        props.whitelist = root.join("public_properties");
        settings
    }

    async fn run(settings: &Settings, flags: Flags) -> anyhow::Result<Option<String>> {
        let invocation = Invocation::from_flags(flags).map_err(anyhow::Error::msg)?;
        invocation.execute(settings).await
    }

    fn is_no_such_key(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<PrefsError>(), Some(PrefsError::NoSuchKey))
    }

    #[tokio::test]
    async fn app_set_get_delete_persist_across_runs() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let settings = sandbox(&temp);

        let mut set = flags(Some("com.example.app"), &["hello"]);
        set.set = Some("greeting".into());
        set.shell = true;
        assert_eq!(run(&settings, set).await?, None);

        let get = flags(Some("com.example.app"), &["greeting"]);
        assert_eq!(run(&settings, get).await?.as_deref(), Some(r#"["hello"]"#));

        let mut get = flags(Some("com.example.app"), &["greeting"]);
        get.shell = true;
        assert_eq!(run(&settings, get).await?.as_deref(), Some("hello"));

        let keys = flags(Some("com.example.app"), &[]);
        assert_eq!(run(&settings, keys).await?.as_deref(), Some(r#"["greeting"]"#));

        let mut all = flags(Some("com.example.app"), &[]);
        all.all = true;
        assert_eq!(
            run(&settings, all).await?.as_deref(),
            Some(r#"[{"greeting":["hello"]}]"#)
        );

        let mut delete = flags(Some("com.example.app"), &[]);
        delete.delete = Some("greeting".into());
        assert_eq!(run(&settings, delete).await?, None);

        let err = run(&settings, flags(Some("com.example.app"), &["greeting"]))
            .await
            .unwrap_err();
        assert!(is_no_such_key(&err), "unexpected error: {err}");
        Ok(())
    }

    #[tokio::test]
    async fn rejected_set_is_not_committed() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let settings = sandbox(&temp);

        let mut set = flags(Some("com.example.app"), &["not a document"]);
        set.set = Some("k".into());
        let err = run(&settings, set).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PrefsError>(),
            Some(PrefsError::ValueNotJson)
        ));

        let keys = flags(Some("com.example.app"), &[]);
        assert_eq!(run(&settings, keys).await?.as_deref(), Some("[]"));
        Ok(())
    }

    #[tokio::test]
    async fn clear_removes_the_store() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let settings = sandbox(&temp);

        let mut set = flags(Some("com.example.app"), &[r#"{"v":1}"#]);
        set.set = Some("k".into());
        run(&settings, set).await?;

        let mut clear = flags(Some("com.example.app"), &[]);
        clear.clear = true;
        assert_eq!(run(&settings, clear).await?, None);

        let err = run(&settings, flags(Some("com.example.app"), &["k"]))
            .await
            .unwrap_err();
        assert!(is_no_such_key(&err), "unexpected error: {err}");
        Ok(())
    }

    #[tokio::test]
    async fn system_get_reads_token_files() -> anyhow::Result<()> {
        let temp = TempDir::new()?;
        let settings = sandbox(&temp);
        std::fs::create_dir_all(&settings.properties.tokens_dir)?;
        std::fs::write(settings.properties.tokens_dir.join("region"), "eu\n")?;

        let get = flags(None, &["com.palm.properties.region"]);
        assert_eq!(run(&settings, get).await?.as_deref(), Some(r#"["eu"]"#));

        let mut get = flags(None, &["com.palm.properties.region"]);
        get.shell = true;
        assert_eq!(run(&settings, get).await?.as_deref(), Some("eu"));

        let err = run(&settings, flags(None, &["com.palm.properties.absent"]))
            .await
            .unwrap_err();
        assert!(is_no_such_key(&err), "unexpected error: {err}");
        Ok(())
    }
}
