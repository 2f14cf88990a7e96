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
use crate::constants::{AZURE_CLIENT_ID, AZURE_CLIENT_SECRET, AZURE_TENANT_ID};
use crate::Credential;
use async_trait::async_trait;
use blobsas_core::{Context, ProvideCredential, Result};

/// Load credential from Azure Client Secret.
///
/// This provider implements the OAuth 2.0 client credentials flow for a service
/// principal identified by tenant ID, client ID and client secret.
///
/// Reference: <https://learn.microsoft.com/en-us/azure/active-directory/develop/v2-oauth2-client-creds-grant-flow>
#[derive(Debug, Default, Clone)]
pub struct ClientSecretCredentialProvider {
    tenant_id: Option<String>,
    client_id: Option<String>,
}

impl ClientSecretCredentialProvider {
    /// Create a new client secret provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tenant ID, taking precedence over [`AZURE_TENANT_ID`].
    pub fn with_tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the client ID, taking precedence over [`AZURE_CLIENT_ID`].
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

#[async_trait]
impl ProvideCredential for ClientSecretCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let tenant_id = match self.tenant_id.as_ref().or_else(|| envs.get(AZURE_TENANT_ID)) {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };

        let client_id = match self.client_id.as_ref().or_else(|| envs.get(AZURE_CLIENT_ID)) {
            Some(id) if !id.is_empty() => id,
            _ => return Ok(None),
        };

        let client_secret = match envs.get(AZURE_CLIENT_SECRET) {
            Some(secret) if !secret.is_empty() => secret,
            _ => return Ok(None),
        };

        let token = request_oauth_token(
            ctx,
            "client secret",
            tenant_id,
            client_id,
            &[("client_secret", client_secret.as_str())],
        )
        .await?;

        Ok(Some(Credential::with_bearer_token(
            &token.access_token,
            token.expires_on(),
        )))
    }
}
