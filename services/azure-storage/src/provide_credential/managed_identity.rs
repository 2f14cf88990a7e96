// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use blobsas_core::time::{parse_rfc3339, parse_unix_timestamp, DateTime};
use blobsas_core::{Context, Error, ProvideCredential, Result};
use std::time::Duration;

/// Bound on the IMDS request. Off Azure the link-local address often drops packets
/// instead of refusing them.
const IMDS_PROBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Load credential from the managed identity of the hosting compute.
///
/// - On App Service and Functions, `IDENTITY_ENDPOINT` and `IDENTITY_HEADER` are set
///   by the platform and take precedence.
/// - Everywhere else the Instance Metadata Service is asked, at
///   [`AZURE_IMDS_ENDPOINT`] or the well-known link-local address.
///
/// A user-assigned identity is selected with `AZURE_CLIENT_ID`, `AZURE_OBJECT_ID`
/// or `AZURE_MSI_RES_ID`, in that order.
///
/// The IMDS request gives up after one second and the provider answers `Ok(None)`,
/// leaving the rest of the chain its share of the issuance budget.
///
/// Reference: <https://learn.microsoft.com/en-us/entra/identity/managed-identities-azure-resources/how-to-use-vm-token>
#[derive(Debug, Clone)]
pub struct ManagedIdentityCredentialProvider {
    endpoint: Option<String>,
    probe_timeout: Duration,
}

impl Default for ManagedIdentityCredentialProvider {
    fn default() -> Self {
        Self {
            endpoint: None,
            probe_timeout: IMDS_PROBE_TIMEOUT,
        }
    }
}

impl ManagedIdentityCredentialProvider {
    /// Create a new managed identity provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the IMDS endpoint, taking precedence over [`AZURE_IMDS_ENDPOINT`].
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set how long to wait for IMDS before giving up on it.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    fn is_app_service(ctx: &Context) -> bool {
        [IDENTITY_ENDPOINT, IDENTITY_HEADER]
            .iter()
            .all(|key| ctx.env_var(key).is_some_and(|v| !v.is_empty()))
    }

    fn build_request(&self, ctx: &Context) -> Result<http::Request<bytes::Bytes>> {
        let envs = ctx.env_vars();
        let non_empty = |key: &str| envs.get(key).filter(|v| !v.is_empty());

        let mut query = form_urlencoded::Serializer::new(String::new());
        let req = match (non_empty(IDENTITY_ENDPOINT), non_empty(IDENTITY_HEADER)) {
            (Some(endpoint), Some(header)) => {
                query
                    .append_pair("api-version", "2019-08-01")
                    .append_pair("resource", STORAGE_RESOURCE);
                if let Some(client_id) = non_empty(AZURE_CLIENT_ID) {
                    query.append_pair("client_id", client_id);
                } else if let Some(object_id) = non_empty(AZURE_OBJECT_ID) {
                    query.append_pair("principal_id", object_id);
                } else if let Some(msi_res_id) = non_empty(AZURE_MSI_RES_ID) {
                    query.append_pair("mi_res_id", msi_res_id);
                }

                http::Request::get(format!("{endpoint}?{}", query.finish()))
                    .header("X-IDENTITY-HEADER", header.as_str())
            }
            _ => {
                let endpoint = self
                    .endpoint
                    .as_ref()
                    .or_else(|| non_empty(AZURE_IMDS_ENDPOINT))
                    .map(|s| s.as_str())
                    .unwrap_or(DEFAULT_IMDS_ENDPOINT);

                query
                    .append_pair("api-version", "2018-02-01")
                    .append_pair("resource", STORAGE_RESOURCE);
                if let Some(client_id) = non_empty(AZURE_CLIENT_ID) {
                    query.append_pair("client_id", client_id);
                } else if let Some(object_id) = non_empty(AZURE_OBJECT_ID) {
                    query.append_pair("object_id", object_id);
                } else if let Some(msi_res_id) = non_empty(AZURE_MSI_RES_ID) {
                    query.append_pair("msi_res_id", msi_res_id);
                }

                http::Request::get(format!("{endpoint}?{}", query.finish()))
                    .header("Metadata", "true")
            }
        };

        req.body(bytes::Bytes::new()).map_err(|e| {
            Error::unexpected("failed to build managed identity request").with_source(e)
        })
    }
}

#[async_trait]
impl ProvideCredential for ManagedIdentityCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let req = self.build_request(ctx)?;
        let resp = if Self::is_app_service(ctx) {
            ctx.http_send(req).await?
        } else {
            match tokio::time::timeout(self.probe_timeout, ctx.http_send(req)).await {
                Ok(resp) => resp?,
                Err(_) => {
                    log::debug!(
                        "no answer from instance metadata service within {:?}, skipping managed identity",
                        self.probe_timeout
                    );
                    return Ok(None);
                }
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let body = String::from_utf8_lossy(resp.body());
            return Err(Error::credential_invalid(format!(
                "managed identity request failed with status {status}: {body}"
            )));
        }

        let token: ManagedIdentityTokenResponse =
            serde_json::from_slice(resp.body()).map_err(|e| {
                Error::unexpected("failed to parse managed identity response").with_source(e)
            })?;

        let expires_on = token.expires_on.map(|v| v.parse()).transpose()?;
        Ok(Some(Credential::with_bearer_token(
            &token.access_token,
            expires_on,
        )))
    }
}

#[derive(serde::Deserialize)]
struct ManagedIdentityTokenResponse {
    access_token: String,
    expires_on: Option<ExpiresOn>,
}

/// IMDS reports `expires_on` as a string of unix seconds, other hosts as a number or
/// an RFC 3339 time.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum ExpiresOn {
    Number(i64),
    Text(String),
}

impl ExpiresOn {
    fn parse(self) -> Result<DateTime> {
        match self {
            ExpiresOn::Number(secs) => parse_unix_timestamp(&secs.to_string()),
            ExpiresOn::Text(s) => parse_unix_timestamp(&s).or_else(|_| parse_rfc3339(&s)),
        }
    }
}
