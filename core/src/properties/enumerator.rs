use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, instrument};

use super::token::ComputedToken;
use super::{sources, SystemProperties};
use crate::codec;
use crate::error::Result;

impl SystemProperties {
    /// Every known key in encounter order, without duplicates: provisioned
    /// files, runtime token files, second runtime directory files, then the
    /// computed tokens.
    async fn candidate_keys(&self, public_only: bool) -> Vec<String> {
        let mut tokens = Vec::new();
        for dir in [
            &self.settings.provisioned_dir,
            &self.settings.tokens_dir,
            &self.settings.runtime_dir,
        ] {
            tokens.extend(sources::list_tokens(dir).await);
        }
        tokens.extend(ComputedToken::ALL.iter().map(|t| t.name().to_owned()));

        let mut seen = HashSet::with_capacity(tokens.len());
        let mut keys = Vec::with_capacity(tokens.len());
        for token in tokens {
            let key = self.key_for(&token);
            if public_only && !self.is_public(&key) {
                continue;
            }
            if seen.insert(key.clone()) {
                keys.push(key);
            }
        }
        keys
    }

    /// Lists every system property key.
    ///
    /// With `public_only`, keys outside the whitelist are left out.
    ///
    /// # Errors
    ///
    /// Currently infallible; unreadable directories contribute no keys.
    #[instrument(skip(self))]
    pub async fn list_keys(&self, public_only: bool) -> Result<Vec<String>> {
        let keys = self.candidate_keys(public_only).await;
        debug!(count = keys.len(), "Listed system property keys");
        Ok(keys)
    }

    /// Resolves every listed key into a `{key: value}` pair.
    ///
    /// Raw values that are already JSON documents are embedded as such;
    /// anything else becomes a JSON string.
    ///
    /// # Errors
    ///
    /// Returns the first resolution failure; no partial list is produced.
    #[instrument(skip(self))]
    pub async fn list_all(&self, public_only: bool) -> Result<Vec<Value>> {
        let keys = self.candidate_keys(public_only).await;
        let mut pairs = Vec::with_capacity(keys.len());
        for key in keys {
            let raw = self.resolve(&key).await.inspect_err(|e| {
                debug!(%key, error = %e, "Property failed to resolve");
            })?;
            pairs.push(codec::pair(&key, codec::raw_to_value(&raw)));
        }
        Ok(pairs)
    }
}
