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

use blobsas_azure_storage::Config;
use blobsas_core::{Context, Error, Result};

pub const PORT: &str = "PORT";
pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
pub const DEFAULT_PORT: u16 = 80;

/// Process level settings, loaded once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen port, from [`PORT`].
    pub port: u16,
    /// Origins allowed by CORS. `None` allows any origin.
    pub cors_allowed_origins: Option<Vec<String>>,
    /// Storage account settings handed to the issuer.
    pub storage: Config,
}

impl ServerConfig {
    /// Load settings from env.
    ///
    /// Missing account or container names are not an error here; the server starts and
    /// reports them on every request instead.
    pub fn from_env(ctx: &Context) -> Result<Self> {
        let port = match ctx.env_var(PORT).filter(|v| !v.trim().is_empty()) {
            Some(v) => v.trim().parse::<u16>().map_err(|e| {
                Error::config_invalid(format!("{PORT} must be a port number, got {v:?}"))
                    .with_source(e)
            })?,
            None => DEFAULT_PORT,
        };

        let cors_allowed_origins = ctx.env_var(CORS_ALLOWED_ORIGINS).and_then(|v| {
            let origins: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty() && s != "*")
                .collect();
            (!origins.is_empty()).then_some(origins)
        });

        Ok(Self {
            port,
            cors_allowed_origins,
            storage: Config::from_env(ctx)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobsas_core::{ErrorKind, StaticEnv};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let ctx = Context::new();
        let config = ServerConfig::from_env(&ctx).unwrap();

        assert_eq!(config.port, 80);
        assert_eq!(config.cors_allowed_origins, None);
        assert!(config.storage.account_name().is_err());
    }

    #[test]
    fn test_port_and_origins() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (PORT, "8080"),
            (CORS_ALLOWED_ORIGINS, "https://a.example.com, https://b.example.com,"),
        ]));
        let config = ServerConfig::from_env(&ctx).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(
            config.cors_allowed_origins,
            Some(vec![
                "https://a.example.com".to_string(),
                "https://b.example.com".to_string()
            ])
        );
    }

    #[test]
    fn test_wildcard_origin_means_any() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([(CORS_ALLOWED_ORIGINS, "*")]));
        assert_eq!(ServerConfig::from_env(&ctx).unwrap().cors_allowed_origins, None);
    }

    #[test]
    fn test_invalid_port() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([(PORT, "eighty")]));
        let err = ServerConfig::from_env(&ctx).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
