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

use crate::constants::STORAGE_RESOURCE;
use crate::Credential;
use async_trait::async_trait;
use blobsas_core::time::DateTime;
use blobsas_core::{Context, Error, ProvideCredential, Result};
use serde::Deserialize;

/// Load credential from the local Azure CLI login.
///
/// Runs `az account get-access-token` through the context's command executor. A missing
/// CLI or a logged-out session is not an error; the provider just yields nothing.
#[derive(Debug, Default, Clone)]
pub struct AzureCliCredentialProvider;

impl AzureCliCredentialProvider {
    /// Create a new Azure CLI provider.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzureCliToken {
    access_token: String,
    /// Local time, `2023-10-31 21:59:10.000000`. Only used by old CLI versions.
    expires_on: Option<String>,
    #[serde(rename = "expires_on")]
    expires_on_timestamp: Option<i64>,
}

impl AzureCliToken {
    fn expires_on(&self) -> Option<DateTime> {
        if let Some(timestamp) = self.expires_on_timestamp {
            return chrono::DateTime::from_timestamp(timestamp, 0);
        }

        let local = chrono::NaiveDateTime::parse_from_str(
            self.expires_on.as_deref()?,
            "%Y-%m-%d %H:%M:%S%.f",
        )
        .ok()?;
        local
            .and_local_timezone(chrono::Local)
            .earliest()
            .map(|t| t.with_timezone(&chrono::Utc))
    }
}

#[async_trait]
impl ProvideCredential for AzureCliCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let output = match ctx
            .command_execute(
                "az",
                &[
                    "account",
                    "get-access-token",
                    "--resource",
                    STORAGE_RESOURCE,
                    "--output",
                    "json",
                ],
            )
            .await
        {
            Ok(output) => output,
            Err(e) => {
                log::debug!("azure cli is not available: {e}");
                return Ok(None);
            }
        };

        if !output.success() {
            log::debug!(
                "azure cli exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(None);
        }

        let token: AzureCliToken = serde_json::from_slice(&output.stdout).map_err(|e| {
            Error::unexpected("failed to parse azure cli access token").with_source(e)
        })?;

        Ok(Some(Credential::with_bearer_token(
            &token.access_token,
            token.expires_on(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobsas_core::{CommandExecute, CommandOutput};

    #[derive(Debug)]
    struct MockCommandExecute {
        status: i32,
        stdout: &'static str,
    }

    #[async_trait]
    impl CommandExecute for MockCommandExecute {
        async fn command_execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
            assert_eq!(program, "az");
            assert_eq!(args[..2], ["account", "get-access-token"]);
            Ok(CommandOutput {
                status: self.status,
                stdout: self.stdout.as_bytes().to_vec(),
                stderr: b"Please run 'az login' to setup account.".to_vec(),
            })
        }
    }

    #[test]
    fn test_parse_azure_cli_token() {
        let json = r#"{
            "accessToken": "eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiIsIng1dCI6IjJaUXBKM...",
            "expiresOn": "2023-10-31 21:59:10.000000",
            "expires_on": 1698760750,
            "subscription": "0b1f6471-1bf0-4dda-aec3-cb9272f09590",
            "tenant": "54826b22-38d6-4fb2-bad9-b7b93a3e9c5a",
            "tokenType": "Bearer"
        }"#;

        let token: AzureCliToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.expires_on_timestamp, Some(1698760750));
        assert_eq!(token.expires_on().unwrap().timestamp(), 1698760750);
    }

    #[tokio::test]
    async fn test_azure_cli_logged_in() {
        let ctx = Context::new().with_command_execute(MockCommandExecute {
            status: 0,
            stdout: r#"{"accessToken":"cli-token","expires_on":1698760750,"tokenType":"Bearer"}"#,
        });

        let cred = AzureCliCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cred.token, "cli-token");
    }

    #[tokio::test]
    async fn test_azure_cli_logged_out() {
        let ctx = Context::new().with_command_execute(MockCommandExecute {
            status: 1,
            stdout: "",
        });

        let cred = AzureCliCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();
        assert!(cred.is_none());
    }

    #[tokio::test]
    async fn test_azure_cli_not_installed() {
        // The no-op executor fails every command.
        let cred = AzureCliCredentialProvider::new()
            .provide_credential(&Context::new())
            .await
            .unwrap();
        assert!(cred.is_none());
    }
}
