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

//! Tokio-based [`FileRead`] for blobsas.
//!
//! Used by the workload identity provider to read the federated token that the
//! orchestrator projects into the pod.

use async_trait::async_trait;
use blobsas_core::{Error, FileRead, Result};

/// FileRead implementation backed by `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFileRead;

#[async_trait]
impl FileRead for TokioFileRead {
    async fn file_read(&self, path: &str) -> Result<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| Error::unexpected(format!("failed to read file {path}")).with_source(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_read_token_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"federated-token").unwrap();

        let content = TokioFileRead
            .file_read(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(content, b"federated-token");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = TokioFileRead
            .file_read("/nonexistent/azure/tokens/azure-identity-token")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("azure-identity-token"));
    }
}
