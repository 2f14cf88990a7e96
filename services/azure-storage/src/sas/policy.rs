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

use super::{Permissions, SignedResource};
use blobsas_core::time::DateTime;
use blobsas_core::{Error, Result};
use std::time::Duration;

/// What the caller asks a credential for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceRequest {
    /// A single blob inside the configured container.
    Blob {
        /// Blob name, unencoded. May contain `/`.
        name: String,
    },
    /// The configured container as a whole.
    Container,
}

impl ResourceRequest {
    /// Request a credential for one blob.
    pub fn blob(name: impl Into<String>) -> Self {
        Self::Blob { name: name.into() }
    }

    /// Request a credential for the container.
    pub fn container() -> Self {
        Self::Container
    }

    /// Blob name for blob requests.
    pub fn blob_name(&self) -> Option<&str> {
        match self {
            Self::Blob { name } => Some(name),
            Self::Container => None,
        }
    }

    /// `sr` value of the credential this request produces.
    pub fn signed_resource(&self) -> SignedResource {
        match self {
            Self::Blob { .. } => SignedResource::Blob,
            Self::Container => SignedResource::Container,
        }
    }
}

/// Validity window of an issued credential. `starts_on < expires_on` always holds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeWindow {
    starts_on: DateTime,
    expires_on: DateTime,
}

impl TimeWindow {
    /// Start of validity (`st`).
    pub fn starts_on(&self) -> DateTime {
        self.starts_on
    }

    /// End of validity (`se`).
    pub fn expires_on(&self) -> DateTime {
        self.expires_on
    }

    /// Total length of the window.
    pub fn length(&self) -> chrono::TimeDelta {
        self.expires_on - self.starts_on
    }
}

/// Permissions and window decided for a request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Granted capabilities.
    pub permissions: Permissions,
    /// Validity window.
    pub window: TimeWindow,
}

/// Decide what a credential for `request` grants and for how long.
///
/// The window is `[now - skew, now + skew]`. The leading skew tolerates clients and
/// storage front ends whose clocks run ahead of ours. Permissions depend only on the
/// resource kind: blob requests get `r`, container requests get `rl`.
pub fn build_policy(request: &ResourceRequest, now: DateTime, skew: Duration) -> Result<Policy> {
    if let ResourceRequest::Blob { name } = request {
        if name.is_empty() {
            return Err(Error::request_invalid("Filename is required."));
        }
    }

    if skew.is_zero() {
        return Err(Error::config_invalid("clock skew must be greater than zero"));
    }
    let skew = chrono::TimeDelta::from_std(skew).map_err(|e| {
        Error::config_invalid(format!("clock skew {skew:?} is out of range")).with_source(e)
    })?;

    let (starts_on, expires_on) = match (now.checked_sub_signed(skew), now.checked_add_signed(skew))
    {
        (Some(starts_on), Some(expires_on)) => (starts_on, expires_on),
        _ => {
            return Err(Error::config_invalid(format!(
                "clock skew {skew} is out of range"
            )))
        }
    };

    let permissions = match request {
        ResourceRequest::Blob { .. } => Permissions::read(),
        ResourceRequest::Container => Permissions::read_list(),
    };

    Ok(Policy {
        permissions,
        window: TimeWindow {
            starts_on,
            expires_on,
        },
    })
}
