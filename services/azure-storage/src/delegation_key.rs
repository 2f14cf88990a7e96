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

use crate::constants::{STORAGE_SERVICE_VERSION, X_MS_DATE, X_MS_VERSION};
use crate::provide_credential::DefaultCredentialProvider;
use crate::sas::TimeWindow;
use crate::Credential;
use async_trait::async_trait;
use blobsas_core::time::{format_http_date, format_iso8601, now};
use blobsas_core::utils::Redact;
use blobsas_core::{Context, Error, ProvideCredential, Result, SigningCredential};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// Short-lived signing key issued by the blob service to an authenticated identity.
///
/// Obtained per issuance and never cached.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserDelegationKey {
    /// Object ID of the identity the key was issued to (`skoid`).
    pub signed_oid: String,
    /// Tenant of that identity (`sktid`).
    pub signed_tid: String,
    /// Key validity start (`skt`), verbatim from the service.
    pub signed_start: String,
    /// Key validity end (`ske`), verbatim from the service.
    pub signed_expiry: String,
    /// Service the key is valid for (`sks`).
    pub signed_service: String,
    /// Service version that issued the key (`skv`).
    pub signed_version: String,
    /// Base64 encoded key material.
    pub value: String,
}

impl Debug for UserDelegationKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserDelegationKey")
            .field("signed_oid", &self.signed_oid)
            .field("signed_tid", &self.signed_tid)
            .field("signed_start", &self.signed_start)
            .field("signed_expiry", &self.signed_expiry)
            .field("signed_service", &self.signed_service)
            .field("signed_version", &self.signed_version)
            .field("value", &Redact::from(&self.value))
            .finish()
    }
}

/// Request body of Get User Delegation Key.
#[derive(Serialize)]
#[serde(rename = "KeyInfo", rename_all = "PascalCase")]
struct KeyInfo {
    start: String,
    expiry: String,
}

impl KeyInfo {
    fn to_xml(&self) -> Result<String> {
        let body = quick_xml::se::to_string(self).map_err(|e| {
            Error::unexpected("failed to serialize user delegation key request").with_source(e)
        })?;
        Ok(format!(r#"<?xml version="1.0" encoding="utf-8"?>{body}"#))
    }
}

/// ProvideDelegationKey obtains a user delegation key valid for a given window.
#[async_trait]
pub trait ProvideDelegationKey: Debug + Send + Sync + 'static {
    /// Request a key from the blob service at `endpoint` covering `window`.
    ///
    /// `endpoint` is the service root, for example `https://account.blob.core.windows.net`.
    async fn provide_delegation_key(
        &self,
        ctx: &Context,
        endpoint: &str,
        window: &TimeWindow,
    ) -> Result<UserDelegationKey>;
}

/// Requests delegation keys from the blob service, authenticated by a bearer token.
///
/// - [Get User Delegation Key](https://learn.microsoft.com/en-us/rest/api/storageservices/get-user-delegation-key)
pub struct BlobServiceDelegationKeyProvider {
    credential: Box<dyn ProvideCredential<Credential = Credential>>,
    tried: String,
}

impl Debug for BlobServiceDelegationKeyProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobServiceDelegationKeyProvider")
            .field("credential", &self.credential)
            .finish()
    }
}

impl Default for BlobServiceDelegationKeyProvider {
    fn default() -> Self {
        Self {
            credential: Box::new(DefaultCredentialProvider::new()),
            tried: DefaultCredentialProvider::strategies().join(", "),
        }
    }
}

impl BlobServiceDelegationKeyProvider {
    /// Authenticate with the default identity chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authenticate with a specific credential provider.
    pub fn with_credential_provider(
        credential: impl ProvideCredential<Credential = Credential>,
    ) -> Self {
        let tried = format!("{credential:?}");
        Self {
            credential: Box::new(credential),
            tried,
        }
    }

    async fn bearer_token(&self, ctx: &Context) -> Result<Credential> {
        let cred = self.credential.provide_credential(ctx).await?.ok_or_else(|| {
            Error::credential_unavailable(format!(
                "no identity credential available, tried: {}",
                self.tried
            ))
        })?;

        if !cred.is_valid() {
            return Err(Error::credential_invalid(
                "identity credential is empty or expired",
            ));
        }
        Ok(cred)
    }
}

#[async_trait]
impl ProvideDelegationKey for BlobServiceDelegationKeyProvider {
    async fn provide_delegation_key(
        &self,
        ctx: &Context,
        endpoint: &str,
        window: &TimeWindow,
    ) -> Result<UserDelegationKey> {
        let cred = self.bearer_token(ctx).await?;

        let url = format!(
            "{}/?restype=service&comp=userdelegationkey",
            endpoint.trim_end_matches('/')
        );
        let body = KeyInfo {
            start: format_iso8601(window.starts_on()),
            expiry: format_iso8601(window.expires_on()),
        }
        .to_xml()?;
        log::debug!("requesting user delegation key from {url} for {window:?}");

        let req = http::Request::post(&url)
            .header(http::header::AUTHORIZATION, format!("Bearer {}", cred.token))
            .header(http::header::CONTENT_TYPE, "application/xml")
            .header(X_MS_VERSION, STORAGE_SERVICE_VERSION)
            .header(X_MS_DATE, format_http_date(now()))
            .body(bytes::Bytes::from(body))
            .map_err(|e| {
                Error::unexpected("failed to build user delegation key request").with_source(e)
            })?;

        let resp = ctx.http_send(req).await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = String::from_utf8_lossy(resp.body());
            return Err(Error::upstream(format!(
                "user delegation key request failed with status {status}: {}",
                body.trim()
            )));
        }

        parse_delegation_key(resp.body())
    }
}

fn parse_delegation_key(body: &[u8]) -> Result<UserDelegationKey> {
    let text = std::str::from_utf8(body).map_err(|e| {
        Error::upstream("user delegation key response is not valid utf-8").with_source(e)
    })?;

    quick_xml::de::from_str(text.trim_start_matches('\u{feff}')).map_err(|e| {
        Error::upstream("failed to parse user delegation key response").with_source(e)
    })
}
