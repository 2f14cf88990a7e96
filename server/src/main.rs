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

use anyhow::Context as _;
use blobsas_command_execute_tokio::TokioCommandExecute;
use blobsas_core::{Context, OsEnv};
use blobsas_file_read_tokio::TokioFileRead;
use blobsas_http_send_reqwest::ReqwestHttpSend;
use blobsas_server::{Application, ServerConfig};
use tokio::signal;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            log::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let env_ctx = Context::new().with_env(OsEnv);
    let config = ServerConfig::from_env(&env_ctx).context("failed to load configuration")?;

    let ctx = env_ctx
        .with_file_read(TokioFileRead)
        .with_http_send(ReqwestHttpSend::with_timeout(config.storage.upstream_timeout))
        .with_command_execute(TokioCommandExecute);

    let app = Application::build(config, ctx, shutdown_signal())
        .await
        .context("failed to start server")?;
    app.run_until_stopped().await?;

    Ok(())
}
