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

use super::{is_test_enabled, os_context};
use blobsas_azure_storage::ClientSecretCredentialProvider;
use blobsas_core::{ProvideCredential, SigningCredential};

#[tokio::test]
async fn test_client_secret_provider() {
    if !is_test_enabled("BLOBSAS_AZURE_STORAGE_TEST_CLIENT_SECRET") {
        eprintln!("Skipping test: BLOBSAS_AZURE_STORAGE_TEST_CLIENT_SECRET is not enabled");
        return;
    }

    let cred = ClientSecretCredentialProvider::new()
        .provide_credential(&os_context())
        .await
        .expect("client secret should not fail when test is enabled")
        .expect("client secret should return a token when test is enabled");

    assert!(!cred.token.is_empty());
    assert!(cred.is_valid());
}
