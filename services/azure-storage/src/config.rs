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
use crate::sas::Protocol;
use blobsas_core::{Context, Error, Result};
use std::time::Duration;

/// Config carries everything the issuer needs to know about the storage account.
///
/// It is loaded once at startup and never mutated afterwards. Account and container
/// names are optional here on purpose: a process without them still starts, and every
/// issuance then fails with [`ErrorKind::ConfigInvalid`](blobsas_core::ErrorKind::ConfigInvalid).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// `account_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_ACCOUNT_NAME`]
    pub account_name: Option<String>,
    /// `container_name` will be loaded from
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_BLOB_CONTAINER_NAME`]
    pub container_name: Option<String>,
    /// Host suffix of the blob service, `blob.core.windows.net` by default.
    ///
    /// - env value: [`AZURE_STORAGE_HOST`]
    pub storage_host: String,
    /// Overrides `https://{account}.{storage_host}` for the delegation key request only.
    /// Issued URLs always use the public host.
    ///
    /// - env value: [`AZURE_STORAGE_ENDPOINT`]
    pub endpoint: Option<String>,
    /// Symmetric buffer around "now" that forms the validity window.
    ///
    /// - env value: [`SAS_CLOCK_SKEW_SECS`]
    pub clock_skew: Duration,
    /// Upper bound for obtaining the identity token plus the delegation key.
    ///
    /// - env value: [`SAS_UPSTREAM_TIMEOUT_SECS`]
    pub upstream_timeout: Duration,
    /// Protocol constraint embedded in every credential. TLS only unless
    /// [`SAS_ALLOW_HTTP`] is set to a truthy value.
    pub protocol: Protocol,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_name: None,
            container_name: None,
            storage_host: DEFAULT_STORAGE_HOST.to_string(),
            endpoint: None,
            clock_skew: Duration::from_secs(DEFAULT_CLOCK_SKEW_SECS),
            upstream_timeout: Duration::from_secs(DEFAULT_UPSTREAM_TIMEOUT_SECS),
            protocol: Protocol::Https,
        }
    }
}

impl Config {
    /// Load config from env.
    ///
    /// Only malformed optional knobs (numbers, booleans) are rejected here.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let mut config = Config::default();

        config.account_name = non_empty_var(ctx, AZURE_STORAGE_ACCOUNT_NAME);
        config.container_name = non_empty_var(ctx, AZURE_STORAGE_BLOB_CONTAINER_NAME);

        if let Some(v) = non_empty_var(ctx, AZURE_STORAGE_HOST) {
            config.storage_host = v.trim_matches('.').to_string();
        }
        if let Some(v) = non_empty_var(ctx, AZURE_STORAGE_ENDPOINT) {
            config.endpoint = Some(v.trim_end_matches('/').to_string());
        }
        if let Some(v) = non_empty_var(ctx, SAS_CLOCK_SKEW_SECS) {
            config.clock_skew = Duration::from_secs(parse_secs(SAS_CLOCK_SKEW_SECS, &v)?);
        }
        if let Some(v) = non_empty_var(ctx, SAS_UPSTREAM_TIMEOUT_SECS) {
            config.upstream_timeout =
                Duration::from_secs(parse_secs(SAS_UPSTREAM_TIMEOUT_SECS, &v)?);
        }
        if let Some(v) = non_empty_var(ctx, SAS_ALLOW_HTTP) {
            if parse_bool(SAS_ALLOW_HTTP, &v)? {
                config.protocol = Protocol::HttpsAndHttp;
            }
        }

        Ok(config)
    }

    /// Set the storage account name.
    pub fn with_account_name(mut self, account_name: impl Into<String>) -> Self {
        self.account_name = Some(account_name.into());
        self
    }

    /// Set the container name.
    pub fn with_container_name(mut self, container_name: impl Into<String>) -> Self {
        self.container_name = Some(container_name.into());
        self
    }

    /// Set the delegation key endpoint override.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the clock skew.
    pub fn with_clock_skew(mut self, clock_skew: Duration) -> Self {
        self.clock_skew = clock_skew;
        self
    }

    /// Set the upstream timeout.
    pub fn with_upstream_timeout(mut self, upstream_timeout: Duration) -> Self {
        self.upstream_timeout = upstream_timeout;
        self
    }

    /// Set the protocol constraint.
    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// The configured account name, or a configuration error.
    pub fn account_name(&self) -> Result<&str> {
        self.account_name
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_invalid(missing_message()))
    }

    /// The configured container name, or a configuration error.
    pub fn container_name(&self) -> Result<&str> {
        self.container_name
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::config_invalid(missing_message()))
    }

    /// Public blob service URL for `account`: `https://{account}.{storage_host}`.
    pub fn blob_service_url(&self, account: &str) -> String {
        format!("https://{account}.{}", self.storage_host)
    }

    /// Base URL used to request a user delegation key.
    pub fn delegation_key_endpoint(&self, account: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => self.blob_service_url(account),
        }
    }
}

fn missing_message() -> String {
    format!("{AZURE_STORAGE_ACCOUNT_NAME} and {AZURE_STORAGE_BLOB_CONTAINER_NAME} must be set.")
}

fn non_empty_var(ctx: &Context, key: &str) -> Option<String> {
    ctx.env_var(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(key: &str, value: &str) -> Result<u64> {
    let secs = value.parse::<u64>().map_err(|e| {
        Error::config_invalid(format!("{key} must be a number of seconds, got {value:?}"))
            .with_source(e)
    })?;
    if secs == 0 {
        return Err(Error::config_invalid(format!("{key} must be greater than zero")));
    }
    Ok(secs)
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(Error::config_invalid(format!(
            "{key} must be a boolean, got {value:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobsas_core::{ErrorKind, StaticEnv};
    use pretty_assertions::assert_eq;

    fn ctx_with(pairs: &[(&str, &str)]) -> Context {
        Context::new().with_env(StaticEnv::from_pairs(pairs.iter().copied()))
    }

    #[test]
    fn test_from_env_defaults() {
        let config = Config::from_env(&ctx_with(&[])).unwrap();

        assert_eq!(config, Config::default());
        assert_eq!(config.clock_skew, Duration::from_secs(600));
        assert_eq!(config.protocol, Protocol::Https);
    }

    #[test]
    fn test_from_env_full() {
        let config = Config::from_env(&ctx_with(&[
            (AZURE_STORAGE_ACCOUNT_NAME, "myaccount"),
            (AZURE_STORAGE_BLOB_CONTAINER_NAME, "reports"),
            (AZURE_STORAGE_HOST, "blob.core.chinacloudapi.cn"),
            (AZURE_STORAGE_ENDPOINT, "http://127.0.0.1:10000/devstoreaccount1/"),
            (SAS_CLOCK_SKEW_SECS, "300"),
            (SAS_UPSTREAM_TIMEOUT_SECS, "5"),
            (SAS_ALLOW_HTTP, "true"),
        ]))
        .unwrap();

        assert_eq!(config.account_name().unwrap(), "myaccount");
        assert_eq!(config.container_name().unwrap(), "reports");
        assert_eq!(
            config.blob_service_url("myaccount"),
            "https://myaccount.blob.core.chinacloudapi.cn"
        );
        assert_eq!(
            config.delegation_key_endpoint("myaccount"),
            "http://127.0.0.1:10000/devstoreaccount1"
        );
        assert_eq!(config.clock_skew, Duration::from_secs(300));
        assert_eq!(config.upstream_timeout, Duration::from_secs(5));
        assert_eq!(config.protocol, Protocol::HttpsAndHttp);
    }

    #[test]
    fn test_missing_names_are_config_errors() {
        let config = Config::from_env(&ctx_with(&[(AZURE_STORAGE_ACCOUNT_NAME, "  ")])).unwrap();

        let err = config.account_name().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(
            err.to_string(),
            "AZURE_STORAGE_ACCOUNT_NAME and AZURE_STORAGE_BLOB_CONTAINER_NAME must be set."
        );
        assert_eq!(
            config.container_name().unwrap_err().kind(),
            ErrorKind::ConfigInvalid
        );
    }

    #[test]
    fn test_malformed_knobs_are_rejected() {
        let err = Config::from_env(&ctx_with(&[(SAS_CLOCK_SKEW_SECS, "ten minutes")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Config::from_env(&ctx_with(&[(SAS_CLOCK_SKEW_SECS, "0")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.to_string(), "SAS_CLOCK_SKEW_SECS must be greater than zero");

        let err = Config::from_env(&ctx_with(&[(SAS_UPSTREAM_TIMEOUT_SECS, "0")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let err = Config::from_env(&ctx_with(&[(SAS_ALLOW_HTTP, "maybe")])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);

        let config = Config::from_env(&ctx_with(&[(SAS_ALLOW_HTTP, "0")])).unwrap();
        assert_eq!(config.protocol, Protocol::Https);
    }
}
