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

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::value::RawValue;
use crate::error::{ProviderError, SolverError};
use crate::providers::alidns::{AddDomainRecordResponse, DeleteSubDomainRecordsResponse};

/// A DNS-01 challenge handed over by the host.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChallengeRequest {
    pub uid: String,
    #[serde(rename = "dnsName")]
    pub dns_name: String,
    /// Value to publish in the TXT record.
    pub key: String,
    #[serde(rename = "resourceNamespace")]
    pub resource_namespace: String,
    #[serde(rename = "resolvedFQDN")]
    pub resolved_fqdn: String,
    #[serde(rename = "resolvedZone")]
    pub resolved_zone: String,
    /// Solver config blob, decoded per request.
    pub config: Option<Box<RawValue>>,
}

impl ChallengeRequest {
    pub fn raw_config(&self) -> Option<&[u8]> {
        self.config.as_deref().map(|raw| raw.get().as_bytes())
    }
}

/// Operations the host drives for every DNS-01 solver it routes to.
#[async_trait]
pub trait ChallengeSolver: Send + Sync {
    type ClientConfig: Send + 'static;

    /// Identifier the host uses to route solver config to this implementation.
    fn name(&self) -> &'static str;

    /// Publishes the challenge TXT record.
    async fn present(&self, ch: &ChallengeRequest) -> Result<(), SolverError>;

    /// Removes every TXT record published under the challenge name.
    async fn clean_up(&self, ch: &ChallengeRequest) -> Result<(), SolverError>;

    /// Called once at startup, before any challenge is handled.
    async fn initialize(&mut self, config: Self::ClientConfig) -> Result<(), SolverError>;
}

/// Builder carrying the parameters of a single record operation.
#[derive(Debug, Clone, Default)]
pub struct RecordOperationBuilder {
    pub(crate) domain_name: Option<String>,
    pub(crate) rr: Option<String>,
    pub(crate) record_type: Option<String>,
    pub(crate) value: Option<String>,
    pub(crate) ttl: Option<u32>,
}

impl RecordOperationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn domain_name(mut self, domain_name: &str) -> Self {
        self.domain_name = Some(domain_name.to_string());
        self
    }

    pub fn rr(mut self, rr: &str) -> Self {
        self.rr = Some(rr.to_string());
        self
    }

    pub fn record_type(mut self, record_type: &str) -> Self {
        self.record_type = Some(record_type.to_string());
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn ttl(mut self, ttl: Option<u32>) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Remote record operations offered by a DNS provider.
#[async_trait]
pub trait DnsClient: Send + Sync {
    /// Creates one record.
    async fn add_domain_record(&self, builder: &RecordOperationBuilder) -> Result<AddDomainRecordResponse, ProviderError>;

    /// Deletes all records of a type under a relative name, whatever their value.
    async fn delete_sub_domain_records(&self, builder: &RecordOperationBuilder) -> Result<DeleteSubDomainRecordsResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_decodes_host_envelope() {
        let raw = r#"{
            "uid": "abc",
            "action": "Present",
            "dnsName": "example.com",
            "key": "token",
            "resourceNamespace": "cert-manager",
            "resolvedFQDN": "_acme-challenge.example.com.",
            "resolvedZone": "example.com.",
            "config": {"regionId": "cn-beijing", "ttl": 60}
        }"#;
        let ch: ChallengeRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(ch.resolved_fqdn, "_acme-challenge.example.com.");
        assert_eq!(ch.resolved_zone, "example.com.");
        assert_eq!(ch.resource_namespace, "cert-manager");
        assert_eq!(
            ch.raw_config().map(|c| String::from_utf8_lossy(c).into_owned()),
            Some(r#"{"regionId": "cn-beijing", "ttl": 60}"#.to_string())
        );
    }

    #[test]
    fn null_config_is_absent() {
        let ch: ChallengeRequest = serde_json::from_str(r#"{"key": "token", "config": null}"#).unwrap();
        assert!(ch.raw_config().is_none());
    }
}
