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

use crate::constants::BLOB_NAME_ENCODE_SET;
use crate::delegation_key::{BlobServiceDelegationKeyProvider, ProvideDelegationKey};
use crate::sas::{build_policy, ResourceRequest, SasDescriptor, SignSas, UserDelegationSasSigner};
use crate::Config;
use blobsas_core::time::now;
use blobsas_core::utils::RedactSas;
use blobsas_core::{Context, Error, Result};
use percent_encoding::utf8_percent_encode;
use std::sync::Arc;

/// Credential handed back to the caller.
#[derive(Clone, PartialEq, Eq)]
pub enum IssuedCredential {
    /// Full blob URL with the SAS appended.
    Url(String),
    /// Bare SAS query string without scheme, host or path.
    Token(String),
}

impl IssuedCredential {
    /// The URL or token as issued.
    pub fn as_str(&self) -> &str {
        match self {
            IssuedCredential::Url(v) | IssuedCredential::Token(v) => v,
        }
    }

    /// Consume into the inner string.
    pub fn into_string(self) -> String {
        match self {
            IssuedCredential::Url(v) | IssuedCredential::Token(v) => v,
        }
    }
}

impl std::fmt::Debug for IssuedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssuedCredential::Url(v) => f.debug_tuple("Url").field(&RedactSas::from(v)).finish(),
            IssuedCredential::Token(v) => {
                f.debug_tuple("Token").field(&RedactSas::from(v)).finish()
            }
        }
    }
}

/// Issuer combines policy, delegation key and signer into scoped credentials.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone, Debug)]
pub struct Issuer {
    config: Arc<Config>,
    key_provider: Arc<dyn ProvideDelegationKey>,
    signer: Arc<dyn SignSas>,
}

impl Issuer {
    /// Create an issuer using the default identity chain and the user delegation signer.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            key_provider: Arc::new(BlobServiceDelegationKeyProvider::new()),
            signer: Arc::new(UserDelegationSasSigner::new()),
        }
    }

    /// Replace the delegation key provider.
    pub fn with_delegation_key_provider(mut self, provider: impl ProvideDelegationKey) -> Self {
        self.key_provider = Arc::new(provider);
        self
    }

    /// Replace the signer.
    pub fn with_signer(mut self, signer: impl SignSas) -> Self {
        self.signer = Arc::new(signer);
        self
    }

    /// Configuration this issuer was built with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Issue a credential for `request`.
    ///
    /// Configuration is checked before anything else, so a misconfigured process never
    /// reaches out to the identity platform. The delegation key round trip, including
    /// identity discovery, is bounded by [`Config::upstream_timeout`].
    pub async fn issue(&self, ctx: &Context, request: &ResourceRequest) -> Result<IssuedCredential> {
        let account = self.config.account_name()?;
        let container = self.config.container_name()?;

        let policy = build_policy(request, now(), self.config.clock_skew)?;

        let endpoint = self.config.delegation_key_endpoint(account);
        let key = tokio::time::timeout(
            self.config.upstream_timeout,
            self.key_provider
                .provide_delegation_key(ctx, &endpoint, &policy.window),
        )
        .await
        .map_err(|_| {
            Error::upstream(format!(
                "timed out after {:?} waiting for user delegation key",
                self.config.upstream_timeout
            ))
        })??;

        let descriptor =
            SasDescriptor::new(account, container, request, &policy, self.config.protocol);
        let token = self.signer.sign(&descriptor, &key)?;

        let issued = match request {
            ResourceRequest::Blob { name } => IssuedCredential::Url(format!(
                "{}/{}/{}?{}",
                self.config.blob_service_url(account),
                container,
                utf8_percent_encode(name, &BLOB_NAME_ENCODE_SET),
                token
            )),
            ResourceRequest::Container => IssuedCredential::Token(token),
        };

        log::debug!("issued {issued:?} for {request:?}");
        Ok(issued)
    }

    /// Issue a read-only URL for one blob.
    pub async fn issue_blob_url(&self, ctx: &Context, name: &str) -> Result<String> {
        self.issue(ctx, &ResourceRequest::blob(name))
            .await
            .map(IssuedCredential::into_string)
    }

    /// Issue a read and list token for the container.
    pub async fn issue_container_token(&self, ctx: &Context) -> Result<String> {
        self.issue(ctx, &ResourceRequest::container())
            .await
            .map(IssuedCredential::into_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sas::TimeWindow;
    use crate::UserDelegationKey;
    use async_trait::async_trait;
    use blobsas_core::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Debug, Default)]
    struct SlowKeyProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProvideDelegationKey for SlowKeyProvider {
        async fn provide_delegation_key(
            &self,
            _: &Context,
            _: &str,
            _: &TimeWindow,
        ) -> Result<UserDelegationKey> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(Error::unexpected("unreachable"))
        }
    }

    #[tokio::test]
    async fn test_upstream_timeout() {
        let config = Config::default()
            .with_account_name("account")
            .with_container_name("container")
            .with_upstream_timeout(Duration::from_millis(20));
        let issuer = Issuer::new(config).with_delegation_key_provider(SlowKeyProvider::default());

        let err = issuer
            .issue_container_token(&Context::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_missing_container_is_checked_first() {
        let config = Config::default().with_account_name("account");
        let issuer = Issuer::new(config).with_delegation_key_provider(SlowKeyProvider::default());

        let err = issuer
            .issue_blob_url(&Context::new(), "a.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_issued_credential_debug_hides_signature() {
        let issued = IssuedCredential::Token("sv=2022-11-02&sp=rl&sig=secret".to_string());
        assert_eq!(format!("{issued:?}"), r#"Token("sv=2022-11-02&sp=rl&sig=***")"#);
    }
}
