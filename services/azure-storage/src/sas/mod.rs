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

//! Shared Access Signature construction for blob and container scopes.
//!
//! - [`build_policy`] decides permissions and validity window.
//! - [`SasDescriptor`] binds the policy to a concrete resource.
//! - [`SignSas`] turns a descriptor plus a user delegation key into a query string.

use std::fmt;

mod permissions;
pub use permissions::Permissions;

mod policy;
pub use policy::{build_policy, Policy, ResourceRequest, TimeWindow};

mod signer;
pub use signer::{SasDescriptor, SignSas, UserDelegationSasSigner};

/// Specifies the protocol permitted for a request made with the SAS ([Azure documentation](https://learn.microsoft.com/rest/api/storageservices/create-user-delegation-sas#specify-the-http-protocol)).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Protocol {
    /// Only HTTPS requests are accepted.
    #[default]
    Https,
    /// Both HTTPS and plain HTTP requests are accepted.
    HttpsAndHttp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Protocol::Https => write!(f, "https"),
            Protocol::HttpsAndHttp => write!(f, "https,http"),
        }
    }
}

/// Signed resource type (`sr`).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SignedResource {
    /// A single blob.
    Blob,
    /// A whole container.
    Container,
}

impl SignedResource {
    /// Value of the `sr` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignedResource::Blob => "b",
            SignedResource::Container => "c",
        }
    }
}
