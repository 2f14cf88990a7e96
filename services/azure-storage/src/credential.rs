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

use blobsas_core::time::{now, DateTime};
use blobsas_core::utils::Redact;
use blobsas_core::SigningCredential;
use std::fmt::{Debug, Formatter};

/// Bearer token for the storage audience, obtained from an ambient identity.
///
/// It is only used to request a user delegation key and never leaves the server.
#[derive(Clone)]
pub struct Credential {
    /// OAuth access token.
    pub token: String,
    /// Expiration time for this token, if the identity endpoint reported one.
    pub expires_on: Option<DateTime>,
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &Redact::from(&self.token))
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

impl SigningCredential for Credential {
    fn is_valid(&self) -> bool {
        if self.token.is_empty() {
            return false;
        }

        // Take 20s as buffer to avoid edge cases.
        match self.expires_on {
            Some(expires_on) => {
                expires_on > now() + chrono::TimeDelta::try_seconds(20).expect("in bounds")
            }
            None => true,
        }
    }
}

impl Credential {
    /// Create a new bearer token credential.
    pub fn with_bearer_token(token: impl Into<String>, expires_on: Option<DateTime>) -> Self {
        Self {
            token: token.into(),
            expires_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_validity() {
        let in_an_hour = now() + chrono::TimeDelta::try_hours(1).unwrap();
        let in_ten_seconds = now() + chrono::TimeDelta::try_seconds(10).unwrap();

        assert!(Credential::with_bearer_token("token", None).is_valid());
        assert!(Credential::with_bearer_token("token", Some(in_an_hour)).is_valid());
        assert!(!Credential::with_bearer_token("token", Some(in_ten_seconds)).is_valid());
        assert!(!Credential::with_bearer_token("", None).is_valid());
    }

    #[test]
    fn test_debug_redacts_token() {
        let cred = Credential::with_bearer_token("eyJ0eXAiOiJKV1QiLCJhbGciOiJSUzI1NiJ9", None);
        let output = format!("{cred:?}");

        assert!(output.contains("eyJ***iJ9"));
        assert!(!output.contains("KV1Q"));
    }
}
