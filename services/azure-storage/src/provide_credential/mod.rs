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

//! Identity discovery strategies.
//!
//! Every provider answers `Ok(None)` when its source is not configured in the current
//! environment, so they compose through [`ProvideCredentialChain`](blobsas_core::ProvideCredentialChain).

mod env;
pub use env::EnvCredentialProvider;

mod static_provider;
pub use static_provider::StaticCredentialProvider;

mod client_secret;
pub use client_secret::ClientSecretCredentialProvider;

mod workload_identity;
pub use workload_identity::WorkloadIdentityCredentialProvider;

mod managed_identity;
pub use managed_identity::ManagedIdentityCredentialProvider;

mod azure_cli;
pub use azure_cli::AzureCliCredentialProvider;

mod default;
pub use default::DefaultCredentialProvider;

use crate::constants::{DEFAULT_AUTHORITY_HOST, STORAGE_SCOPE};
use blobsas_core::time::{now, DateTime};
use blobsas_core::{Context, Error, Result};

/// Token response of the Microsoft identity platform v2 token endpoint.
#[derive(serde::Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    expires_in: u64,
}

impl OAuthTokenResponse {
    fn expires_on(&self) -> Option<DateTime> {
        let secs = i64::try_from(self.expires_in).ok()?;
        now().checked_add_signed(chrono::TimeDelta::try_seconds(secs)?)
    }
}

fn authority_host(ctx: &Context) -> String {
    ctx.env_var(crate::constants::AZURE_AUTHORITY_HOST)
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| DEFAULT_AUTHORITY_HOST.to_string())
}

/// Exchange `grant` for a storage-scoped access token at `{authority}/{tenant}/oauth2/v2.0/token`.
///
/// `grant` carries the strategy specific form fields; scope and grant type are added here.
async fn request_oauth_token(
    ctx: &Context,
    strategy: &str,
    tenant_id: &str,
    client_id: &str,
    grant: &[(&str, &str)],
) -> Result<OAuthTokenResponse> {
    let url = format!(
        "{}/{}/oauth2/v2.0/token",
        authority_host(ctx).trim_end_matches('/'),
        tenant_id
    );

    // The serializer is not `Send`, so it must be gone before the request is awaited.
    let body = {
        let mut form = form_urlencoded::Serializer::new(String::new());
        form.append_pair("scope", STORAGE_SCOPE)
            .append_pair("client_id", client_id);
        for (k, v) in grant {
            form.append_pair(k, v);
        }
        form.append_pair("grant_type", "client_credentials")
            .finish()
    };

    let req = http::Request::builder()
        .method(http::Method::POST)
        .uri(&url)
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(bytes::Bytes::from(body))
        .map_err(|e| {
            Error::unexpected(format!("failed to build {strategy} token request")).with_source(e)
        })?;

    let resp = ctx.http_send(req).await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = String::from_utf8_lossy(resp.body());
        return Err(Error::credential_invalid(format!(
            "{strategy} token request failed with status {status}: {body}"
        )));
    }

    serde_json::from_slice(resp.body()).map_err(|e| {
        Error::unexpected(format!("failed to parse {strategy} token response")).with_source(e)
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oauth_expires_on() {
        let resp = OAuthTokenResponse {
            access_token: "token".to_string(),
            expires_in: 3599,
        };
        let expires_on = resp.expires_on().unwrap();

        assert!(expires_on > now() + chrono::TimeDelta::try_minutes(59).unwrap());
    }

    fn assert_send<T: Send>(_: &T) {}

    #[tokio::test]
    async fn test_token_request_future_is_send() {
        let http = mock::MockHttpSend::new(200, r#"{"access_token":"t","expires_in":3599}"#);
        let ctx = Context::new().with_http_send(http.clone());

        let fut = request_oauth_token(&ctx, "client secret", "tenant", "client", &[("client_secret", "s")]);
        assert_send(&fut);

        let token = fut.await.unwrap();
        assert_eq!(token.access_token, "t");
        let body = http.last_request().into_body();
        assert_eq!(
            std::str::from_utf8(&body).unwrap(),
            "scope=https%3A%2F%2Fstorage.azure.com%2F.default&client_id=client&client_secret=s&grant_type=client_credentials"
        );
    }
}
