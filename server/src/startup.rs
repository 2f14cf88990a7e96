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

use crate::config::ServerConfig;
use crate::handlers;
use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use blobsas_azure_storage::Issuer;
use blobsas_core::Context;
use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::pin::Pin;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Shared, immutable state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub issuer: Issuer,
    pub ctx: Context,
}

impl AppState {
    pub fn new(issuer: Issuer, ctx: Context) -> Self {
        Self { issuer, ctx }
    }
}

/// Cross-origin policy: any origin unless a list is configured.
pub fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let origin = match allowed_origins {
        None => AllowOrigin::from(Any),
        Some(origins) => AllowOrigin::list(origins.iter().filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|_| log::warn!("Ignoring invalid CORS origin {origin:?}"))
                .ok()
        })),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any)
}

pub fn build_router(state: AppState, allowed_origins: Option<&[String]>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/blob-sas", get(handlers::blob_sas))
        .route("/api/containersas", get(handlers::container_sas))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

type ServerFuture = Pin<Box<dyn Future<Output = std::io::Result<()>> + Send>>;

pub struct Application {
    port: u16,
    server: ServerFuture,
}

impl Application {
    /// Bind the listener and assemble the router. Serving starts with
    /// [`run_until_stopped`](Self::run_until_stopped).
    pub async fn build(
        config: ServerConfig,
        ctx: Context,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> std::io::Result<Self> {
        if let Err(err) = config
            .storage
            .account_name()
            .and(config.storage.container_name())
        {
            log::warn!("{err} Every request will fail until it is fixed.");
        }

        let state = AppState::new(Issuer::new(config.storage.clone()), ctx);
        let app = build_router(state, config.cors_allowed_origins.as_deref());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            log::error!("Failed to bind TCP listener to {addr}: {e}");
            e
        })?;
        let port = listener.local_addr()?.port();

        log::info!("SAS backend listening on port {port}");

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown);

        Ok(Self {
            port,
            server: Box::pin(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
