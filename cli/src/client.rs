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

//! Client side of the SAS backend.

use anyhow::{anyhow, bail, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Talks to one backend base URL.
#[derive(Debug, Clone)]
pub struct SasClient {
    client: Client,
    backend: String,
}

impl SasClient {
    pub fn new(client: Client, backend: impl Into<String>) -> Self {
        Self {
            client,
            backend: backend.into().trim_end_matches('/').to_string(),
        }
    }

    /// Ask for a read-only link to `filename`.
    pub async fn blob_url(&self, filename: &str) -> Result<String> {
        let body = self
            .get("/api/blob-sas", &[("filename", filename)])
            .await?;
        string_field(&body, "sasUrl")
    }

    /// Ask for a read and list token for the whole container.
    pub async fn container_token(&self) -> Result<String> {
        let body = self.get("/api/containersas", &[]).await?;
        string_field(&body, "sasToken")
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{path}", self.backend);
        log::debug!("requesting {url}");

        let resp = self.client.get(&url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or_default();
            match resp.json::<ErrorResponse>().await {
                Ok(body) => bail!("Backend returned {} {reason}: {}", status.as_u16(), body.error),
                Err(_) => bail!("Backend returned {} {reason}", status.as_u16()),
            }
        }

        Ok(resp.json().await?)
    }
}

/// Any successful JSON body without a non-empty string under `name` counts as missing.
fn string_field(body: &Value, name: &str) -> Result<String> {
    body.get(name)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No {name} field in backend response"))
}
