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

//! Issue a blob link and a container token using the ambient identity.
//!
//! ```shell
//! AZURE_STORAGE_ACCOUNT_NAME=myaccount \
//! AZURE_STORAGE_BLOB_CONTAINER_NAME=docs \
//! cargo run --example issue_sas -- reports/q1.pdf
//! ```

use anyhow::Result;
use blobsas_azure_storage::{Config, Issuer};
use blobsas_command_execute_tokio::TokioCommandExecute;
use blobsas_core::utils::RedactSas;
use blobsas_core::{Context, OsEnv};
use blobsas_file_read_tokio::TokioFileRead;
use blobsas_http_send_reqwest::ReqwestHttpSend;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = env_logger::builder().try_init();

    let ctx = Context::new().with_env(OsEnv);
    let config = Config::from_env(&ctx)?;
    let ctx = ctx
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::with_timeout(config.upstream_timeout))
        .with_command_execute(TokioCommandExecute);

    let filename = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "example.pdf".to_string());
    let issuer = Issuer::new(config);

    println!("Example 1: read-only link for {filename:?}");
    match issuer.issue_blob_url(&ctx, &filename).await {
        Ok(url) => println!("  {}", RedactSas::from(&url)),
        Err(e) => println!("  failed: {e}"),
    }

    println!("Example 2: read and list token for the container");
    match issuer.issue_container_token(&ctx).await {
        Ok(token) => println!("  {}", RedactSas::from(&token)),
        Err(e) => println!("  failed: {e}"),
    }

    Ok(())
}
