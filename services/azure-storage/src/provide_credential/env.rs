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

use crate::constants::AZURE_STORAGE_BEARER_TOKEN;
use crate::Credential;
use async_trait::async_trait;
use blobsas_core::{Context, ProvideCredential, Result};

/// Load a bearer token directly from [`AZURE_STORAGE_BEARER_TOKEN`].
///
/// Mostly useful for local runs and tests where a token was obtained out of band.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new env credential provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        Ok(ctx
            .env_var(AZURE_STORAGE_BEARER_TOKEN)
            .filter(|v| !v.trim().is_empty())
            .map(|token| Credential::with_bearer_token(token.trim(), None)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobsas_core::StaticEnv;

    #[tokio::test]
    async fn test_env_credential_provider_bearer_token() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([(
            AZURE_STORAGE_BEARER_TOKEN,
            "mybearertoken",
        )]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cred.token, "mybearertoken");
        assert!(cred.expires_on.is_none());
    }

    #[tokio::test]
    async fn test_env_credential_provider_none() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([(AZURE_STORAGE_BEARER_TOKEN, " ")]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();
        assert!(cred.is_none());
    }
}
