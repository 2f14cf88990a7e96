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

//! Reqwest-based [`HttpSend`] for blobsas.
//!
//! Identity endpoints and the storage service are reached through this sender. Transport
//! failures are reported as [`ErrorKind::Upstream`](blobsas_core::ErrorKind::Upstream)
//! so callers can tell them apart from bad input or missing configuration.
//!
//! ```no_run
//! use blobsas_core::Context;
//! use blobsas_http_send_reqwest::ReqwestHttpSend;
//! use std::time::Duration;
//!
//! let ctx = Context::new().with_http_send(ReqwestHttpSend::with_timeout(Duration::from_secs(30)));
//! ```

use async_trait::async_trait;
use blobsas_core::{Error, HttpSend, Result};
use bytes::Bytes;
use http_body_util::BodyExt;
use reqwest::{Client, Request};
use std::time::Duration;

/// HttpSend implementation backed by [`reqwest::Client`].
#[derive(Debug, Default, Clone)]
pub struct ReqwestHttpSend {
    client: Client,
}

impl ReqwestHttpSend {
    /// Create a new ReqwestHttpSend with a reqwest::Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create a sender whose requests give up after `timeout`.
    ///
    /// Falls back to a client without timeout if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

#[async_trait]
impl HttpSend for ReqwestHttpSend {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let uri = req.uri().clone();
        let req = Request::try_from(req).map_err(|e| {
            Error::unexpected(format!("failed to convert request to {uri}")).with_source(e)
        })?;

        let resp: http::Response<_> = self
            .client
            .execute(req)
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() {
                    "timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "failed"
                };
                Error::upstream(format!("request to {uri} {reason}")).with_source(e)
            })?
            .into();

        let (parts, body) = resp.into_parts();
        let bs = BodyExt::collect(body)
            .await
            .map(|buf| buf.to_bytes())
            .map_err(|e| {
                Error::upstream(format!("failed to read response body from {uri}")).with_source(e)
            })?;
        Ok(http::Response::from_parts(parts, bs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blobsas_core::ErrorKind;

    #[tokio::test]
    async fn test_unreachable_host_is_upstream_error() {
        let sender = ReqwestHttpSend::with_timeout(Duration::from_millis(200));
        let req = http::Request::get("http://127.0.0.1:9/metadata")
            .body(Bytes::new())
            .unwrap();

        let err = sender.http_send(req).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upstream);
        assert!(err.to_string().contains("127.0.0.1:9"));
    }
}
