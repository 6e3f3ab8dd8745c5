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

use std::fmt;
use tracing::debug;
use crate::config::{ProviderConfig, SecretKeySelector};
use crate::error::{CredentialError, SecretStoreError};
use crate::secret_store::SecretStore;

const ACCESS_KEY_ID: &str = "accessKeyId";
const ACCESS_KEY_SECRET: &str = "accessKeySecret";

/// Resolved Alibaba Cloud access key pair plus the region to talk to.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub region_id: String,
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .field("region_id", &self.region_id)
            .finish()
    }
}

/// Resolves the access key pair for one request.
///
/// Inline values win per field. Every field that is empty inline needs a
/// complete secret reference, and all references are checked before the
/// store is touched. Each referenced field costs one store read.
pub async fn resolve_credentials<S: SecretStore>(
    cfg: &ProviderConfig,
    namespace: &str,
    store: Option<&S>,
) -> Result<Credential, CredentialError> {
    let mut access_key_id = cfg.access_key_id.clone();
    let mut access_key_secret = cfg.access_key_secret.clone();

    if access_key_id.is_empty() || access_key_secret.is_empty() {
        let id_ref = required_reference(&access_key_id, cfg.access_key_id_reference(), ACCESS_KEY_ID)?;
        let secret_ref = required_reference(
            &access_key_secret,
            cfg.access_key_secret_reference(),
            ACCESS_KEY_SECRET,
        )?;

        if let Some(selector) = id_ref {
            access_key_id = read_reference(store, namespace, &selector, ACCESS_KEY_ID).await?;
        }
        if let Some(selector) = secret_ref {
            access_key_secret = read_reference(store, namespace, &selector, ACCESS_KEY_SECRET).await?;
        }
    } else {
        debug!("using inline access key");
    }

    if access_key_id.is_empty() || access_key_secret.is_empty() {
        return Err(CredentialError::Empty);
    }

    Ok(Credential {
        access_key_id,
        access_key_secret,
        region_id: cfg.region_id.clone(),
    })
}

fn required_reference(
    inline: &str,
    selector: SecretKeySelector,
    field: &'static str,
) -> Result<Option<SecretKeySelector>, CredentialError> {
    if !inline.is_empty() {
        return Ok(None);
    }
    if !selector.is_complete() {
        return Err(CredentialError::ReferenceIncomplete { field });
    }
    Ok(Some(selector))
}

async fn read_reference<S: SecretStore>(
    store: Option<&S>,
    namespace: &str,
    selector: &SecretKeySelector,
    field: &'static str,
) -> Result<String, CredentialError> {
    let store = store.ok_or(CredentialError::Store {
        field,
        source: SecretStoreError::NotInitialized,
    })?;
    debug!(namespace, secret = %selector.name, key = %selector.key, "reading {field} from secret");

    let data = store
        .get_secret(namespace, &selector.name)
        .await
        .map_err(|source| CredentialError::Store { field, source })?;
    let value = data
        .get(&selector.key)
        .ok_or(CredentialError::NotFoundInSecret { field })?;

    Ok(String::from_utf8_lossy(value).into_owned())
}
