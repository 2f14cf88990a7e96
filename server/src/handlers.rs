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

use crate::error::ApiError;
use crate::startup::AppState;
use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::request::Parts,
    response::IntoResponse,
    Json,
};
use blobsas_azure_storage::ResourceRequest;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
pub struct BlobSasQuery {
    pub filename: Option<String>,
}

#[async_trait]
impl<S> FromRequestParts<S> for BlobSasQuery
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<BlobSasQuery>::from_request_parts(parts, state).await?;
        Ok(query)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobSasResponse {
    pub sas_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSasResponse {
    pub sas_token: String,
}

/// `GET /api/blob-sas?filename=<name>`
pub async fn blob_sas(
    State(state): State<AppState>,
    query: BlobSasQuery,
) -> Result<Json<BlobSasResponse>, ApiError> {
    let filename = match query.filename {
        Some(filename) if !filename.is_empty() => filename,
        _ => {
            return Err(ApiError::BadRequest(
                "Query parameter 'filename' is required.".to_string(),
            ))
        }
    };

    let issued = state
        .issuer
        .issue(&state.ctx, &ResourceRequest::blob(filename))
        .await?;

    Ok(Json(BlobSasResponse {
        sas_url: issued.into_string(),
    }))
}

/// `GET /api/containersas`
pub async fn container_sas(
    State(state): State<AppState>,
) -> Result<Json<ContainerSasResponse>, ApiError> {
    let issued = state
        .issuer
        .issue(&state.ctx, &ResourceRequest::container())
        .await?;

    Ok(Json(ContainerSasResponse {
        sas_token: issued.into_string(),
    }))
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "blobsas-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
