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

use super::request_oauth_token;
use crate::constants::{AZURE_CLIENT_ID, AZURE_FEDERATED_TOKEN_FILE, AZURE_TENANT_ID};
use crate::Credential;
use async_trait::async_trait;
use blobsas_core::{Context, ProvideCredential, Result};

/// Load credential from Azure Workload Identity.
///
/// The orchestrator projects a federated token into the pod and points
/// [`AZURE_FEDERATED_TOKEN_FILE`] at it; the token is exchanged as a client assertion.
///
/// Reference: <https://learn.microsoft.com/en-us/azure/aks/workload-identity-overview>
#[derive(Debug, Default, Clone)]
pub struct WorkloadIdentityCredentialProvider;

impl WorkloadIdentityCredentialProvider {
    /// Create a new workload identity provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for WorkloadIdentityCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let tenant_id = match envs.get(AZURE_TENANT_ID) {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };

        let client_id = match envs.get(AZURE_CLIENT_ID) {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };

        let federated_token_file = match envs.get(AZURE_FEDERATED_TOKEN_FILE) {
            Some(file) if !file.is_empty() => file,
            _ => return Ok(None),
        };

        let federated_token = match ctx.file_read_as_string(federated_token_file).await {
            Ok(content) => content,
            Err(e) => {
                log::debug!("federated token file {federated_token_file} is not readable: {e}");
                return Ok(None);
            }
        };
        let federated_token = federated_token.trim();
        if federated_token.is_empty() {
            return Ok(None);
        }

        let token = request_oauth_token(
            ctx,
            "workload identity",
            tenant_id,
            client_id,
            &[
                (
                    "client_assertion_type",
                    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer",
                ),
                ("client_assertion", federated_token),
            ],
        )
        .await?;

        Ok(Some(Credential::with_bearer_token(
            &token.access_token,
            token.expires_on(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provide_credential::mock::MockHttpSend;
    use blobsas_core::StaticEnv;
    use blobsas_file_read_tokio::TokioFileRead;
    use std::io::Write;

    #[tokio::test]
    async fn test_workload_identity_exchanges_federated_token() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"federated-jwt\n").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let http = MockHttpSend::new(200, r#"{"expires_in":3600,"access_token":"wi-token"}"#);
        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_http_send(http.clone())
            .with_env(StaticEnv::from_pairs([
                (AZURE_TENANT_ID, "tenant"),
                (AZURE_CLIENT_ID, "client"),
                (AZURE_FEDERATED_TOKEN_FILE, path.as_str()),
                ("AZURE_AUTHORITY_HOST", "https://login.example.com/"),
            ]));

        let cred = WorkloadIdentityCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cred.token, "wi-token");

        let req = http.last_request();
        assert_eq!(
            req.uri().to_string(),
            "https://login.example.com/tenant/oauth2/v2.0/token"
        );
        let body = String::from_utf8_lossy(req.body());
        assert!(body.contains("client_assertion=federated-jwt&"));
    }

    #[tokio::test]
    async fn test_workload_identity_missing_token_file() {
        let http = MockHttpSend::new(200, "{}");
        let ctx = Context::new()
            .with_file_read(TokioFileRead)
            .with_http_send(http.clone())
            .with_env(StaticEnv::from_pairs([
                (AZURE_TENANT_ID, "tenant"),
                (AZURE_CLIENT_ID, "client"),
                (AZURE_FEDERATED_TOKEN_FILE, "/nonexistent/azure-identity-token"),
            ]));

        let cred = WorkloadIdentityCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();
        assert!(cred.is_none());
        assert_eq!(http.request_count(), 0);
    }
}
