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

use super::*;
use crate::Credential;
use async_trait::async_trait;
use blobsas_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

/// DefaultCredentialProvider discovers an ambient identity the way the platform's
/// default credential does.
///
/// Resolution order:
///
/// 1. [`EnvCredentialProvider`]: an explicit bearer token
/// 2. [`ClientSecretCredentialProvider`]: a service principal secret
/// 3. [`WorkloadIdentityCredentialProvider`]: a federated token file
/// 4. [`ManagedIdentityCredentialProvider`]: App Service or IMDS
/// 5. [`AzureCliCredentialProvider`]: the developer's `az login`
///
/// Errors from a single strategy are logged and the next one is tried.
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        let chain = ProvideCredentialChain::new()
            .push(EnvCredentialProvider::new())
            .push(ClientSecretCredentialProvider::new())
            .push(WorkloadIdentityCredentialProvider::new())
            .push(ManagedIdentityCredentialProvider::new())
            .push(AzureCliCredentialProvider::new());

        Self { chain }
    }
}

impl DefaultCredentialProvider {
    /// Create a new default provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the strategies tried, in order, for error messages.
    pub fn strategies() -> &'static [&'static str] {
        &[
            "environment bearer token",
            "client secret",
            "workload identity",
            "managed identity",
            "azure cli",
        ]
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}
