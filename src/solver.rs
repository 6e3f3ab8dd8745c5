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
use tracing::{debug, info, warn};
use crate::client::{ChallengeRequest, ChallengeSolver, DnsClient, RecordOperationBuilder};
use crate::config::{load_config, ProviderConfig};
use crate::credentials::resolve_credentials;
use crate::error::SolverError;
use crate::providers::alidns::{AliDns, AliDnsBuilder};
use crate::secret_store::{KubeSecretStore, SecretStore};
use crate::utils::request::{DefaultDnsClient, DnsHttpClient};

pub const SOLVER_NAME: &str = "alidns";
const TXT: &str = "TXT";

/// Strips one trailing dot, if any.
pub fn un_fqdn(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Relative record name of `fqdn` inside `zone`.
///
/// Everything before the last occurrence of the zone is kept, so
/// `_acme-challenge.sub.example.com.` in `example.com.` yields
/// `_acme-challenge.sub`. The apex yields an empty string; a name outside the
/// zone comes back whole.
pub fn get_rr(fqdn: &str, zone: &str) -> String {
    let zone = un_fqdn(zone);
    let rr = un_fqdn(fqdn);
    let rr = match rr.rfind(zone) {
        Some(idx) => un_fqdn(&rr[..idx]),
        None => rr,
    };
    debug!(fqdn, zone, rr, "derived relative record name");
    rr.to_string()
}

/// DNS-01 solver publishing challenge records through Alibaba Cloud DNS.
pub struct AliDnsSolver<S = KubeSecretStore, H = DefaultDnsClient> {
    secret_store: Option<S>,
    http_client: H,
}

impl AliDnsSolver {
    pub fn new() -> Self {
        Self::with_parts(None, DefaultDnsClient::new())
    }
}

impl Default for AliDnsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, H> AliDnsSolver<S, H>
where
    S: SecretStore,
    H: DnsHttpClient + Clone + Default,
{
    pub fn with_parts(secret_store: Option<S>, http_client: H) -> Self {
        Self {
            secret_store,
            http_client,
        }
    }

    /// Decodes config and credentials and builds a client for this request.
    async fn dns_client(&self, ch: &ChallengeRequest, cfg: &ProviderConfig) -> Result<AliDns<H>, SolverError> {
        let credential = resolve_credentials(cfg, &ch.resource_namespace, self.secret_store.as_ref()).await?;
        debug!(region = %credential.region_id, "resolved alidns credential");
        let client = AliDnsBuilder::from_credential(&credential)
            .http_client(self.http_client.clone())
            .build()?;
        Ok(client)
    }
}

#[async_trait]
impl<S, H> ChallengeSolver for AliDnsSolver<S, H>
where
    S: SecretStore,
    H: DnsHttpClient + Clone + Default,
{
    type ClientConfig = S::Config;

    fn name(&self) -> &'static str {
        SOLVER_NAME
    }

    async fn present(&self, ch: &ChallengeRequest) -> Result<(), SolverError> {
        let cfg = load_config(ch.raw_config()).inspect_err(|e| warn!("load config, error: {e}"))?;
        let domain_name = un_fqdn(&ch.resolved_zone);
        let rr = get_rr(&ch.resolved_fqdn, &ch.resolved_zone);
        info!(uid = %ch.uid, domain_name, rr = %rr, "presenting challenge record");

        let client = self
            .dns_client(ch, &cfg)
            .await
            .inspect_err(|e| warn!("get dns client error: {e}"))?;
        let builder = RecordOperationBuilder::new()
            .domain_name(domain_name)
            .rr(&rr)
            .record_type(TXT)
            .value(&ch.key)
            .ttl(cfg.record_ttl());

        let response = client
            .add_domain_record(&builder)
            .await
            .inspect_err(|e| warn!(domain_name, rr = %rr, "add record failed: {e}"))?;
        info!(request_id = %response.request_id, record_id = %response.record_id, "challenge record created");
        Ok(())
    }

    async fn clean_up(&self, ch: &ChallengeRequest) -> Result<(), SolverError> {
        let cfg = load_config(ch.raw_config())?;
        let domain_name = un_fqdn(&ch.resolved_zone);
        let rr = get_rr(&ch.resolved_fqdn, &ch.resolved_zone);
        info!(uid = %ch.uid, domain_name, rr = %rr, "cleaning up challenge records");
        let client = self.dns_client(ch, &cfg).await?;

        let builder = RecordOperationBuilder::new()
            .domain_name(domain_name)
            .rr(&rr)
            .record_type(TXT);

        let response = client
            .delete_sub_domain_records(&builder)
            .await
            .inspect_err(|e| warn!(domain_name, rr = %rr, "delete fail: {e}"))?;
        info!(request_id = %response.request_id, total_count = ?response.total_count, "challenge records deleted");
        Ok(())
    }

    async fn initialize(&mut self, config: Self::ClientConfig) -> Result<(), SolverError> {
        let store = S::connect(config).await.map_err(SolverError::Initialize)?;
        info!("secret store client initialized");
        self.secret_store = Some(store);
        Ok(())
    }
}
