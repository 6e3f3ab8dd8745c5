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

use alidns_macros::MissingParam;
use thiserror::Error;

/// Errors surfaced to the host by [`ChallengeSolver`](crate::client::ChallengeSolver) operations.
#[derive(Error, Debug)]
pub enum SolverError {
    /// The solver config blob is not valid JSON for [`ProviderConfig`](crate::config::ProviderConfig).
    #[error("error decoding solver config: {0}")]
    ConfigDecode(#[source] serde_json::Error),

    /// Credentials are incomplete or could not be read from the secret store.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// Alibaba Cloud DNS rejected the call or could not be reached.
    #[error(transparent)]
    RemoteApi(#[from] ProviderError),

    /// The secret store client could not be built at startup.
    #[error("failed to initialize secret store client: {0}")]
    Initialize(#[source] SecretStoreError),
}

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("{field} reference incomplete")]
    ReferenceIncomplete { field: &'static str },

    #[error("failed to read {field} secret: {source}")]
    Store {
        field: &'static str,
        #[source]
        source: SecretStoreError,
    },

    #[error("{field} not found in secret")]
    NotFoundInSecret { field: &'static str },

    #[error("accessKeyID or accessKeySecret cannot be empty")]
    Empty,
}

#[derive(Error, Debug)]
pub enum SecretStoreError {
    #[error("secret store client has not been initialized")]
    NotInitialized,

    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    MissingParam(#[from] MissingParam),

    #[error("invalid request header: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("alidns api error {code}: {message} (request id {request_id})")]
    Api {
        code: String,
        message: String,
        request_id: String,
    },
}
