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

use super::{Permissions, Policy, Protocol, ResourceRequest, SignedResource, TimeWindow};
use crate::constants::STORAGE_SERVICE_VERSION;
use crate::UserDelegationKey;
use blobsas_core::hash::{base64_decode, base64_hmac_sha256};
use blobsas_core::time::format_iso8601;
use blobsas_core::{Error, Result};
use std::fmt::Debug;

/// Everything a SAS binds together, before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SasDescriptor {
    /// Storage account name.
    pub account: String,
    /// Container name.
    pub container: String,
    /// Blob name, unencoded. `None` for container scope.
    pub blob: Option<String>,
    /// Granted permissions (`sp`).
    pub permissions: Permissions,
    /// Protocol constraint (`spr`).
    pub protocol: Protocol,
    /// Validity window (`st`, `se`).
    pub window: TimeWindow,
    /// Signed service version (`sv`).
    pub version: String,
}

impl SasDescriptor {
    /// Bind a policy to the resource named by `request`.
    pub fn new(
        account: impl Into<String>,
        container: impl Into<String>,
        request: &ResourceRequest,
        policy: &Policy,
        protocol: Protocol,
    ) -> Self {
        Self {
            account: account.into(),
            container: container.into(),
            blob: request.blob_name().map(|v| v.to_string()),
            permissions: policy.permissions,
            protocol,
            window: policy.window,
            version: STORAGE_SERVICE_VERSION.to_string(),
        }
    }

    /// `sr` of this descriptor.
    pub fn signed_resource(&self) -> SignedResource {
        match self.blob {
            Some(_) => SignedResource::Blob,
            None => SignedResource::Container,
        }
    }

    /// `/blob/{account}/{container}[/{blob}]`, with the blob name unencoded.
    pub fn canonicalized_resource(&self) -> String {
        match &self.blob {
            Some(blob) => format!("/blob/{}/{}/{}", self.account, self.container, blob),
            None => format!("/blob/{}/{}", self.account, self.container),
        }
    }
}

/// SignSas turns a descriptor and a delegation key into a SAS query string.
///
/// The returned string has no leading `?`.
pub trait SignSas: Debug + Send + Sync + 'static {
    /// Sign `descriptor` with `key`.
    fn sign(&self, descriptor: &SasDescriptor, key: &UserDelegationKey) -> Result<String>;
}

/// Signer for User Delegation SAS, service version 2020-12-06 and later.
///
/// - [Create a user delegation SAS](https://learn.microsoft.com/en-us/rest/api/storageservices/create-user-delegation-sas)
#[derive(Debug, Default, Clone, Copy)]
pub struct UserDelegationSasSigner;

impl UserDelegationSasSigner {
    /// Create a new user delegation SAS signer.
    pub fn new() -> Self {
        Self
    }
}

impl SignSas for UserDelegationSasSigner {
    fn sign(&self, descriptor: &SasDescriptor, key: &UserDelegationKey) -> Result<String> {
        let string_to_sign = string_to_sign(descriptor, key);
        log::debug!("user delegation sas string to sign: {string_to_sign:?}");

        let decoded_key = base64_decode(&key.value).map_err(|e| {
            Error::upstream("user delegation key value is not valid base64").with_source(e)
        })?;
        let signature = base64_hmac_sha256(&decoded_key, string_to_sign.as_bytes());

        let elements: Vec<(&str, String)> = vec![
            ("sv", descriptor.version.clone()),
            ("spr", descriptor.protocol.to_string()),
            ("st", format_iso8601(descriptor.window.starts_on())),
            ("se", format_iso8601(descriptor.window.expires_on())),
            ("skoid", key.signed_oid.clone()),
            ("sktid", key.signed_tid.clone()),
            ("skt", key.signed_start.clone()),
            ("ske", key.signed_expiry.clone()),
            ("sks", key.signed_service.clone()),
            ("skv", key.signed_version.clone()),
            ("sr", descriptor.signed_resource().as_str().to_string()),
            ("sp", descriptor.permissions.to_string()),
            ("sig", signature),
        ];

        Ok(elements
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoded(v)))
            .collect::<Vec<_>>()
            .join("&"))
    }
}

/// Construct string to sign
///
/// ## Format
///
/// ```text
/// signedPermissions + "\n" +
/// signedStart + "\n" +
/// signedExpiry + "\n" +
/// canonicalizedResource + "\n" +
/// signedKeyObjectId + "\n" +
/// signedKeyTenantId + "\n" +
/// signedKeyStart + "\n" +
/// signedKeyExpiry  + "\n" +
/// signedKeyService + "\n" +
/// signedKeyVersion + "\n" +
/// signedAuthorizedUserObjectId + "\n" +
/// signedUnauthorizedUserObjectId + "\n" +
/// signedCorrelationId + "\n" +
/// signedIP + "\n" +
/// signedProtocol + "\n" +
/// signedVersion + "\n" +
/// signedResource + "\n" +
/// signedSnapshotTime + "\n" +
/// signedEncryptionScope + "\n" +
/// rscc + "\n" +
/// rscd + "\n" +
/// rsce + "\n" +
/// rscl + "\n" +
/// rsct
/// ```
fn string_to_sign(descriptor: &SasDescriptor, key: &UserDelegationKey) -> String {
    [
        descriptor.permissions.to_string(),
        format_iso8601(descriptor.window.starts_on()),
        format_iso8601(descriptor.window.expires_on()),
        descriptor.canonicalized_resource(),
        key.signed_oid.clone(),
        key.signed_tid.clone(),
        key.signed_start.clone(),
        key.signed_expiry.clone(),
        key.signed_service.clone(),
        key.signed_version.clone(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        descriptor.protocol.to_string(),
        descriptor.version.clone(),
        descriptor.signed_resource().as_str().to_string(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
        String::new(),
    ]
    .join("\n")
}

fn urlencoded(s: &str) -> String {
    form_urlencoded::byte_serialize(s.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sas::build_policy;
    use blobsas_core::time::DateTime;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn test_time() -> DateTime {
        chrono::Utc.with_ymd_and_hms(2022, 3, 1, 8, 12, 34).unwrap()
    }

    fn test_key() -> UserDelegationKey {
        UserDelegationKey {
            signed_oid: "11111111-2222-3333-4444-555555555555".to_string(),
            signed_tid: "66666666-7777-8888-9999-000000000000".to_string(),
            signed_start: "2022-03-01T08:02:34Z".to_string(),
            signed_expiry: "2022-03-01T08:22:34Z".to_string(),
            signed_service: "b".to_string(),
            signed_version: "2022-11-02".to_string(),
            // base64("key")
            value: "a2V5".to_string(),
        }
    }

    fn descriptor(request: &ResourceRequest, protocol: Protocol) -> SasDescriptor {
        let policy = build_policy(request, test_time(), Duration::from_secs(600)).unwrap();
        SasDescriptor::new("account", "container", request, &policy, protocol)
    }

    #[test]
    fn test_canonicalized_resource() {
        let blob = descriptor(&ResourceRequest::blob("reports/q1.pdf"), Protocol::Https);
        assert_eq!(
            blob.canonicalized_resource(),
            "/blob/account/container/reports/q1.pdf"
        );
        assert_eq!(blob.signed_resource(), SignedResource::Blob);

        let container = descriptor(&ResourceRequest::container(), Protocol::Https);
        assert_eq!(container.canonicalized_resource(), "/blob/account/container");
        assert_eq!(container.signed_resource(), SignedResource::Container);
    }

    #[test]
    fn test_string_to_sign_layout() {
        let desc = descriptor(&ResourceRequest::blob("a.pdf"), Protocol::HttpsAndHttp);
        let sts = string_to_sign(&desc, &test_key());
        let fields: Vec<&str> = sts.split('\n').collect();

        assert_eq!(fields.len(), 24);
        assert_eq!(fields[0], "r");
        assert_eq!(fields[1], "2022-03-01T08:02:34Z");
        assert_eq!(fields[2], "2022-03-01T08:22:34Z");
        assert_eq!(fields[3], "/blob/account/container/a.pdf");
        assert_eq!(fields[14], "https,http");
        assert_eq!(fields[15], "2022-11-02");
        assert_eq!(fields[16], "b");
    }

    #[test]
    fn test_sign_blob_sas() {
        let desc = descriptor(&ResourceRequest::blob("reports/q1.pdf"), Protocol::Https);
        let token = UserDelegationSasSigner::new()
            .sign(&desc, &test_key())
            .unwrap();

        assert_eq!(token, "sv=2022-11-02&spr=https&st=2022-03-01T08%3A02%3A34Z&se=2022-03-01T08%3A22%3A34Z&skoid=11111111-2222-3333-4444-555555555555&sktid=66666666-7777-8888-9999-000000000000&skt=2022-03-01T08%3A02%3A34Z&ske=2022-03-01T08%3A22%3A34Z&sks=b&skv=2022-11-02&sr=b&sp=r&sig=sgy9HlZC9pf4cmtW2E1uSCtP4YTwKV9zYEqNaapgvOw%3D");
    }

    #[test]
    fn test_sign_container_sas() {
        let desc = descriptor(&ResourceRequest::container(), Protocol::Https);
        let token = UserDelegationSasSigner::new()
            .sign(&desc, &test_key())
            .unwrap();

        assert!(token.contains("&sr=c&sp=rl&sig="));
        assert!(token.ends_with("&sig=BwGyNiaol%2FS9SK4l4SABYGjNduI7sD0hg45k8Dfx4AQ%3D"));
        assert!(!token.contains('/'));
    }

    #[test]
    fn test_sign_rejects_invalid_key_value() {
        let desc = descriptor(&ResourceRequest::container(), Protocol::Https);
        let mut key = test_key();
        key.value = "%%%".to_string();

        let err = UserDelegationSasSigner::new().sign(&desc, &key).unwrap_err();
        assert_eq!(err.kind(), blobsas_core::ErrorKind::Upstream);
    }
}
