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

//! Scoped, time-bounded Shared Access Signatures for Azure Blob Storage.
//!
//! The [`Issuer`] turns a [`ResourceRequest`] into a credential: a read-only URL for a
//! single blob, or a read and list token for the whole container. Credentials are
//! user delegation SAS, so the server itself never holds an account key; it only needs
//! an ambient identity (see [`DefaultCredentialProvider`]) that may request delegation
//! keys on the account.
//!
//! ## Example
//!
//! ```no_run
//! use blobsas_azure_storage::{Config, Issuer};
//! use blobsas_core::{Context, OsEnv, Result};
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let issuer = Issuer::new(Config::from_env(&ctx)?);
//!
//! let url = issuer.issue_blob_url(&ctx, "reports/q1.pdf").await?;
//! println!("{url}");
//! # Ok(())
//! # }
//! ```

mod constants;
pub use constants::*;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod delegation_key;
pub use delegation_key::{BlobServiceDelegationKeyProvider, ProvideDelegationKey, UserDelegationKey};

pub mod sas;
pub use sas::{Permissions, Protocol, ResourceRequest, TimeWindow};

mod issuer;
pub use issuer::{IssuedCredential, Issuer};

mod provide_credential;
pub use provide_credential::*;
