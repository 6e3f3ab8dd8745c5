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

use std::collections::BTreeMap;
use async_trait::async_trait;
use chrono::Utc;
use hex::encode as hex_encode;
use hmac::{Hmac, KeyInit, Mac};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, HOST};
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use alidns_macros::extract_params;
use crate::client::{DnsClient, RecordOperationBuilder};
use crate::credentials::Credential;
use crate::error::{CredentialError, ProviderError};
use crate::utils::request::{DefaultDnsClient, DnsHttpClient};

type HmacSha256 = Hmac<Sha256>;

pub const ALIDNS_VERSION: &str = "2015-01-09";
pub const ALIDNS_DEFAULT_HOST: &str = "alidns.aliyuncs.com";
const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";
const SIGNED_HEADERS: &str = "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version";
/// Record name the provider uses for the zone apex.
const APEX_RR: &str = "@";

/// API host for a region, falling back to the central endpoint.
pub fn endpoint(region_id: &str) -> String {
    if region_id.is_empty() {
        ALIDNS_DEFAULT_HOST.to_string()
    } else {
        format!("alidns.{region_id}.aliyuncs.com")
    }
}

/// Builder for Alibaba Cloud DNS client instances.
pub struct AliDnsBuilder<T: DnsHttpClient = DefaultDnsClient> {
    region_id: String,
    access_key_id: Option<String>,
    access_key_secret: Option<String>,
    http_client: Option<T>,
}

impl<T: DnsHttpClient> Default for AliDnsBuilder<T> {
    fn default() -> Self {
        Self {
            region_id: String::new(),
            access_key_id: None,
            access_key_secret: None,
            http_client: None,
        }
    }
}

impl<T: DnsHttpClient + Default> AliDnsBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_credential(credential: &Credential) -> Self {
        Self::new()
            .region_id(&credential.region_id)
            .access_key_id(&credential.access_key_id)
            .access_key_secret(&credential.access_key_secret)
    }

    pub fn region_id(mut self, region_id: &str) -> Self {
        self.region_id = region_id.to_string();
        self
    }

    pub fn access_key_id(mut self, access_key_id: &str) -> Self {
        self.access_key_id = Some(access_key_id.to_string());
        self
    }

    pub fn access_key_secret(mut self, access_key_secret: &str) -> Self {
        self.access_key_secret = Some(access_key_secret.to_string());
        self
    }

    /// Overrides the transport, defaulting to `T::default()`.
    pub fn http_client(mut self, http_client: T) -> Self {
        self.http_client = Some(http_client);
        self
    }

    /// Constructs the client; both halves of the access key must be set.
    pub fn build(self) -> Result<AliDns<T>, CredentialError> {
        let access_key_id = self.access_key_id.filter(|v| !v.is_empty()).ok_or(CredentialError::Empty)?;
        let access_key_secret = self.access_key_secret.filter(|v| !v.is_empty()).ok_or(CredentialError::Empty)?;
        Ok(AliDns {
            http_client: self.http_client.unwrap_or_default(),
            host: endpoint(&self.region_id),
            access_key_id,
            access_key_secret,
        })
    }
}

/// ACS3-HMAC-SHA256 request signer.
#[derive(Clone)]
pub(crate) struct Authorization {
    /// API endpoint host
    host: String,
    version: String,
    action: String,
    query: BTreeMap<String, String>,
    date: String,
    nonce: String,
}

impl Authorization {
    /// Creates a new signing context stamped with the current time and a fresh nonce.
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            version: ALIDNS_VERSION.to_string(),
            action: String::new(),
            query: BTreeMap::new(),
            date: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            nonce: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Sets the API action for authorization.
    fn action(mut self, action: &str) -> Self {
        self.action = action.to_string();
        self
    }

    /// Sets the query parameters carried by the request.
    fn query(mut self, pairs: Vec<(&'static str, String)>) -> Self {
        self.query = pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self
    }

    #[cfg(test)]
    fn stamp(mut self, date: &str, nonce: &str) -> Self {
        self.date = date.to_string();
        self.nonce = nonce.to_string();
        self
    }

    /// Signs a message using HMAC-SHA256 algorithm.
    fn sign(key: &[u8], msg: &str) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
        mac.update(msg.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }

    /// Computes SHA-256 hash of input and returns it as hexadecimal string.
    fn sha256_hex(input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hex_encode(hasher.finalize())
    }

    /// Query string with keys sorted and both sides RFC 3986 encoded.
    fn canonical_query_string(&self) -> String {
        self.query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn generate_canonical_request(&self) -> String {
        let http_method = "POST";
        let canonical_uri = "/";
        let canonical_query_string = self.canonical_query_string();
        let canonical_headers = format!(
            "host:{}\nx-acs-action:{}\nx-acs-content-sha256:{}\nx-acs-date:{}\nx-acs-signature-nonce:{}\nx-acs-version:{}\n",
            self.host,
            self.action,
            Self::sha256_hex(""),
            self.date,
            self.nonce,
            self.version
        );
        let hashed_payload = Self::sha256_hex("");
        format!(
            "{http_method}\n{canonical_uri}\n{canonical_query_string}\n{canonical_headers}\n{SIGNED_HEADERS}\n{hashed_payload}"
        )
    }

    fn generate_string_to_sign(&self, canonical_request: &str) -> String {
        format!("{}\n{}", SIGNATURE_ALGORITHM, Self::sha256_hex(canonical_request))
    }

    fn generate_authorization_header(&self, access_key_id: &str, access_key_secret: &str) -> String {
        let canonical_request = self.generate_canonical_request();
        let string_to_sign = self.generate_string_to_sign(&canonical_request);
        let signature = hex_encode(Self::sign(access_key_secret.as_bytes(), &string_to_sign));
        format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            SIGNATURE_ALGORITHM, access_key_id, SIGNED_HEADERS, signature
        )
    }

    /// Builds the request URL and signed headers.
    pub fn build_request(self, access_key_id: &str, access_key_secret: &str) -> Result<(String, HeaderMap), ProviderError> {
        let authorization_header = self.generate_authorization_header(access_key_id, access_key_secret);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&authorization_header)?);
        headers.insert(HOST, HeaderValue::from_str(&self.host)?);
        headers.insert("x-acs-action", HeaderValue::from_str(&self.action)?);
        headers.insert("x-acs-version", HeaderValue::from_str(&self.version)?);
        headers.insert("x-acs-date", HeaderValue::from_str(&self.date)?);
        headers.insert("x-acs-signature-nonce", HeaderValue::from_str(&self.nonce)?);
        headers.insert("x-acs-content-sha256", HeaderValue::from_str(&Self::sha256_hex(""))?);

        let url = format!("https://{}/?{}", self.host, self.canonical_query_string());
        Ok((url, headers))
    }
}

/// Alibaba Cloud DNS client bound to one access key and region.
pub struct AliDns<T: DnsHttpClient = DefaultDnsClient> {
    /// HTTP client for making requests
    http_client: T,
    /// API endpoint host
    host: String,
    access_key_id: String,
    access_key_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddDomainRecordResponse {
    #[serde(default)]
    pub request_id: String,
    #[serde(default)]
    pub record_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteSubDomainRecordsResponse {
    #[serde(default)]
    pub request_id: String,
    #[serde(rename = "RR", default)]
    pub rr: String,
    /// Sent as a string by the API.
    #[serde(default)]
    pub total_count: Option<Value>,
}

impl<T: DnsHttpClient> AliDns<T> {
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Signs and sends one RPC action, surfacing the error envelope as [`ProviderError::Api`].
    async fn call(&self, action: &str, query: Vec<(&'static str, String)>) -> Result<Value, ProviderError> {
        let (url, headers) = Authorization::new(&self.host)
            .action(action)
            .query(query)
            .build_request(&self.access_key_id, &self.access_key_secret)?;

        let resp = self.http_client.request(Method::POST, url, headers, None).await?;

        if let Some(code) = resp.get("Code").and_then(Value::as_str) {
            let message = resp.get("Message").and_then(Value::as_str).unwrap_or_default();
            let request_id = resp.get("RequestId").and_then(Value::as_str).unwrap_or_default();
            warn!(action, code, message, request_id, "alidns call failed");
            return Err(ProviderError::Api {
                code: code.to_string(),
                message: message.to_string(),
                request_id: request_id.to_string(),
            });
        }
        debug!(action, response = %resp, "alidns call succeeded");
        Ok(resp)
    }
}

fn wire_rr(rr: String) -> String {
    if rr.is_empty() { APEX_RR.to_string() } else { rr }
}

#[async_trait]
impl<T: DnsHttpClient> DnsClient for AliDns<T> {
    async fn add_domain_record(&self, builder: &RecordOperationBuilder) -> Result<AddDomainRecordResponse, ProviderError> {
        let mut params = extract_params!(builder, AddDomainRecordParams, {
            required domain_name: String => "DomainName",
            required rr: String => "RR",
            required record_type: String => "Type",
            required value: String => "Value",
            optional ttl: u32 => "TTL"
        });
        params.rr = wire_rr(params.rr);

        let resp = self.call("AddDomainRecord", params.query_pairs()).await?;
        Ok(serde_json::from_value(resp)?)
    }

    async fn delete_sub_domain_records(&self, builder: &RecordOperationBuilder) -> Result<DeleteSubDomainRecordsResponse, ProviderError> {
        let mut params = extract_params!(builder, DeleteSubDomainRecordsParams, {
            required domain_name: String => "DomainName",
            required rr: String => "RR",
            required record_type: String => "Type"
        });
        params.rr = wire_rr(params.rr);

        let resp = self.call("DeleteSubDomainRecords", params.query_pairs()).await?;
        Ok(serde_json::from_value(resp)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use reqwest::Url;
    use serde_json::json;

    #[derive(Clone, Default)]
    struct CannedClient {
        response: Value,
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl DnsHttpClient for CannedClient {
        async fn request(
            &self,
            method: Method,
            url: String,
            headers: HeaderMap,
            body: Option<String>,
        ) -> Result<Value, ProviderError> {
            assert_eq!(method, Method::POST);
            assert!(body.is_none());
            assert!(headers.contains_key(AUTHORIZATION));
            self.urls.lock().unwrap().push(url);
            Ok(self.response.clone())
        }
    }

    fn client(response: Value) -> (AliDns<CannedClient>, Arc<Mutex<Vec<String>>>) {
        let http = CannedClient { response, ..Default::default() };
        let urls = http.urls.clone();
        let dns = AliDnsBuilder::new()
            .region_id("cn-hangzhou")
            .access_key_id("id")
            .access_key_secret("secret")
            .http_client(http)
            .build()
            .unwrap();
        (dns, urls)
    }

    fn query_of(url: &str) -> BTreeMap<String, String> {
        Url::parse(url).unwrap().query_pairs().into_owned().collect()
    }

    #[test]
    fn endpoint_follows_region() {
        assert_eq!(endpoint("cn-hangzhou"), "alidns.cn-hangzhou.aliyuncs.com");
        assert_eq!(endpoint(""), "alidns.aliyuncs.com");
    }

    #[test]
    fn builder_rejects_missing_key_halves() {
        let err = AliDnsBuilder::<DefaultDnsClient>::new().access_key_id("id").build().err().unwrap();
        assert!(matches!(err, CredentialError::Empty));
        let err = AliDnsBuilder::<DefaultDnsClient>::new()
            .access_key_id("")
            .access_key_secret("secret")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, CredentialError::Empty));
    }

    #[test]
    fn canonical_query_is_sorted_and_rfc3986_encoded() {
        let auth = Authorization::new("alidns.aliyuncs.com").query(vec![
            ("Value", "a b*c~".to_string()),
            ("DomainName", "example.com".to_string()),
            ("RR", "_acme-challenge".to_string()),
        ]);
        assert_eq!(
            auth.canonical_query_string(),
            "DomainName=example.com&RR=_acme-challenge&Value=a%20b%2Ac~"
        );
    }

    #[test]
    fn signature_is_deterministic_for_a_fixed_stamp() {
        let build = || {
            Authorization::new("alidns.aliyuncs.com")
                .action("AddDomainRecord")
                .query(vec![("DomainName", "example.com".to_string())])
                .stamp("2024-01-01T00:00:00Z", "nonce")
                .build_request("id", "secret")
                .unwrap()
        };
        let (url_a, headers_a) = build();
        let (url_b, headers_b) = build();
        assert_eq!(url_a, "https://alidns.aliyuncs.com/?DomainName=example.com");
        assert_eq!(url_a, url_b);
        assert_eq!(headers_a[AUTHORIZATION], headers_b[AUTHORIZATION]);

        let auth = headers_a[AUTHORIZATION].to_str().unwrap();
        assert!(auth.starts_with("ACS3-HMAC-SHA256 Credential=id,SignedHeaders=host;x-acs-action;"));
        let signature = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert_eq!(headers_a["x-acs-action"], "AddDomainRecord");
        assert_eq!(headers_a["x-acs-version"], ALIDNS_VERSION);
    }

    #[test]
    fn signature_changes_with_the_secret() {
        let sign = |secret: &str| {
            Authorization::new("alidns.aliyuncs.com")
                .action("DeleteSubDomainRecords")
                .stamp("2024-01-01T00:00:00Z", "nonce")
                .build_request("id", secret)
                .unwrap()
                .1[AUTHORIZATION]
                .clone()
        };
        assert_ne!(sign("one"), sign("two"));
    }

    #[tokio::test]
    async fn add_record_sends_ttl_only_when_set() {
        let (dns, urls) = client(json!({"RequestId": "req-1", "RecordId": "42"}));
        let builder = RecordOperationBuilder::new()
            .domain_name("example.com")
            .rr("_acme-challenge")
            .record_type("TXT")
            .value("token");

        let resp = dns.add_domain_record(&builder).await.unwrap();
        assert_eq!(resp.record_id, "42");
        dns.add_domain_record(&builder.clone().ttl(Some(120))).await.unwrap();

        let urls = urls.lock().unwrap();
        assert!(urls[0].starts_with("https://alidns.cn-hangzhou.aliyuncs.com/?"));
        let first = query_of(&urls[0]);
        assert_eq!(first.get("Type").map(String::as_str), Some("TXT"));
        assert!(!first.contains_key("TTL"));
        assert_eq!(query_of(&urls[1]).get("TTL").map(String::as_str), Some("120"));
    }

    #[tokio::test]
    async fn apex_rr_goes_out_as_at_sign() {
        let (dns, urls) = client(json!({"RequestId": "req-2", "RR": "@", "TotalCount": "1"}));
        let builder = RecordOperationBuilder::new()
            .domain_name("example.com")
            .rr("")
            .record_type("TXT");

        let resp = dns.delete_sub_domain_records(&builder).await.unwrap();
        assert_eq!(resp.rr, "@");
        assert_eq!(query_of(&urls.lock().unwrap()[0]).get("RR").map(String::as_str), Some("@"));
    }

    #[tokio::test]
    async fn error_envelope_becomes_api_error() {
        let (dns, _) = client(json!({
            "RequestId": "req-3",
            "Code": "DomainRecordDuplicate",
            "Message": "The DNS record already exists."
        }));
        let builder = RecordOperationBuilder::new()
            .domain_name("example.com")
            .rr("_acme-challenge")
            .record_type("TXT")
            .value("token");

        match dns.add_domain_record(&builder).await {
            Err(ProviderError::Api { code, request_id, .. }) => {
                assert_eq!(code, "DomainRecordDuplicate");
                assert_eq!(request_id, "req-3");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_parameter_fails_before_sending() {
        let (dns, urls) = client(json!({}));
        let builder = RecordOperationBuilder::new().domain_name("example.com").rr("www");

        let err = dns.delete_sub_domain_records(&builder).await.unwrap_err();
        assert_eq!(err.to_string(), "record_type is required");
        assert!(urls.lock().unwrap().is_empty());
    }
}
