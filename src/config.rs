// Copyright 2023 rust-dns-sdk authors
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use serde::{Deserialize, Serialize};
use crate::error::SolverError;
use crate::utils::serde_utils::{is_zero, option_is_empty, string_is_empty};

pub const ENV_ACCESS_KEY_ID: &str = "ALICLOUD_ACCESS_KEY";
pub const ENV_ACCESS_KEY_SECRET: &str = "ALICLOUD_SECRET_KEY";
pub const ENV_REGION_ID: &str = "REGIONID";

/// Solver configuration decoded from the issuer's `config` blob.
///
/// Credentials come either inline or through secret references. Precedence is
/// decided per field during credential resolution, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "string_is_empty")]
    pub region_id: String,
    #[serde(skip_serializing_if = "string_is_empty")]
    pub access_key_id: String,
    #[serde(skip_serializing_if = "string_is_empty")]
    pub access_key_secret: String,
    #[serde(skip_serializing_if = "option_is_empty")]
    pub access_key_id_ref: Option<SecretKeySelector>,
    #[serde(skip_serializing_if = "option_is_empty")]
    pub access_key_secret_ref: Option<SecretKeySelector>,
    /// Combined reference holding both keys in one secret object.
    #[serde(skip_serializing_if = "option_is_empty")]
    pub access_key_ref: Option<AccessKeyRef>,
    /// Record TTL in seconds, 0 means provider default.
    #[serde(skip_serializing_if = "is_zero")]
    pub ttl: u32,
}

/// Points at one field of a namespaced secret object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SecretKeySelector {
    pub name: String,
    pub key: String,
}

impl SecretKeySelector {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.key.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AccessKeyRef {
    pub name: String,
    pub access_key_id_key: String,
    pub access_key_secret_key: String,
}

impl ProviderConfig {
    /// Builds a config seeded from `ALICLOUD_ACCESS_KEY`, `ALICLOUD_SECRET_KEY` and `REGIONID`.
    pub fn from_env() -> Self {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            access_key_id: lookup(ENV_ACCESS_KEY_ID).unwrap_or_default(),
            access_key_secret: lookup(ENV_ACCESS_KEY_SECRET).unwrap_or_default(),
            region_id: lookup(ENV_REGION_ID).unwrap_or_default(),
            ..Default::default()
        }
    }

    /// Reference used to look up the access key id.
    pub fn access_key_id_reference(&self) -> SecretKeySelector {
        match (&self.access_key_id_ref, &self.access_key_ref) {
            (Some(selector), _) => selector.clone(),
            (None, Some(combined)) => SecretKeySelector::new(&combined.name, &combined.access_key_id_key),
            (None, None) => SecretKeySelector::default(),
        }
    }

    /// Reference used to look up the access key secret.
    pub fn access_key_secret_reference(&self) -> SecretKeySelector {
        match (&self.access_key_secret_ref, &self.access_key_ref) {
            (Some(selector), _) => selector.clone(),
            (None, Some(combined)) => SecretKeySelector::new(&combined.name, &combined.access_key_secret_key),
            (None, None) => SecretKeySelector::default(),
        }
    }

    /// TTL to send with new records, `None` lets the provider choose.
    pub fn record_ttl(&self) -> Option<u32> {
        (self.ttl != 0).then_some(self.ttl)
    }
}

/// Decodes the raw config blob.
///
/// An absent blob is the base case and yields an all-empty config; missing
/// credentials are reported later, when the solver tries to resolve them.
pub fn load_config(raw: Option<&[u8]>) -> Result<ProviderConfig, SolverError> {
    let Some(raw) = raw else {
        return Ok(ProviderConfig::default());
    };
    serde_json::from_slice(raw).map_err(SolverError::ConfigDecode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn absent_config_is_the_base_case() {
        assert_eq!(load_config(None).unwrap(), ProviderConfig::default());
    }

    #[test]
    fn decodes_inline_and_referenced_fields() {
        let raw = br#"{
            "regionId": "cn-hangzhou",
            "accessKeyId": "id",
            "accessKeySecretRef": {"name": "alidns-secret", "key": "secret"},
            "ttl": 120,
            "unknownField": true
        }"#;
        let cfg = load_config(Some(&raw[..])).unwrap();
        assert_eq!(cfg.region_id, "cn-hangzhou");
        assert_eq!(cfg.access_key_id, "id");
        assert!(cfg.access_key_secret.is_empty());
        assert_eq!(
            cfg.access_key_secret_ref,
            Some(SecretKeySelector::new("alidns-secret", "secret"))
        );
        assert_eq!(cfg.record_ttl(), Some(120));
    }

    #[test]
    fn malformed_config_is_a_decode_error() {
        let err = load_config(Some(&b"{\"ttl\": \"soon\"}"[..])).unwrap_err();
        assert!(matches!(err, SolverError::ConfigDecode(_)));
        assert!(err.to_string().starts_with("error decoding solver config"));

        let err = load_config(Some(&b"not json"[..])).unwrap_err();
        assert!(matches!(err, SolverError::ConfigDecode(_)));
    }

    #[test]
    fn zero_ttl_uses_provider_default() {
        let cfg = load_config(Some(&b"{\"ttl\": 0}"[..])).unwrap();
        assert_eq!(cfg.record_ttl(), None);
    }

    #[test]
    fn combined_reference_fills_both_selectors() {
        let raw = br#"{"accessKeyRef": {"name": "alidns", "accessKeyIdKey": "id", "accessKeySecretKey": "secret"}}"#;
        let cfg = load_config(Some(&raw[..])).unwrap();
        assert_eq!(cfg.access_key_id_reference(), SecretKeySelector::new("alidns", "id"));
        assert_eq!(cfg.access_key_secret_reference(), SecretKeySelector::new("alidns", "secret"));
    }

    #[test]
    fn per_field_reference_wins_over_combined() {
        let raw = br#"{
            "accessKeyIdRef": {"name": "ids", "key": "id"},
            "accessKeyRef": {"name": "alidns", "accessKeyIdKey": "legacy-id", "accessKeySecretKey": "secret"}
        }"#;
        let cfg = load_config(Some(&raw[..])).unwrap();
        assert_eq!(cfg.access_key_id_reference(), SecretKeySelector::new("ids", "id"));
        assert_eq!(cfg.access_key_secret_reference(), SecretKeySelector::new("alidns", "secret"));
    }

    #[test]
    fn env_seeded_config_serializes_without_empty_fields() {
        let env: HashMap<&str, &str> = [
            (ENV_ACCESS_KEY_ID, "env-id"),
            (ENV_ACCESS_KEY_SECRET, "env-secret"),
        ]
        .into_iter()
        .collect();
        let cfg = ProviderConfig::from_env_with(|name| env.get(name).map(|v| v.to_string()));
        assert_eq!(cfg.access_key_id, "env-id");
        assert_eq!(cfg.access_key_secret, "env-secret");
        assert!(cfg.region_id.is_empty());

        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"accessKeyId": "env-id", "accessKeySecret": "env-secret"})
        );
    }
}
