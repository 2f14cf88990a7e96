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

//! Utility functions and types.

use std::fmt::Debug;
use std::fmt::Display;

/// Redacts a secret such as a bearer token or delegation key value.
///
/// - Empty input is shown as `EMPTY`.
/// - Input shorter than 12 characters is entirely redacted.
/// - Longer input keeps the first and last three characters so different
///   secrets can still be told apart in logs.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref().unwrap_or_default())
    }
}

impl Debug for Redact<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let length = self.0.len();
        match length {
            0 => f.write_str("EMPTY"),
            1..=11 => f.write_str("***"),
            _ => {
                f.write_str(&self.0[..3])?;
                f.write_str("***")?;
                f.write_str(&self.0[length - 3..])
            }
        }
    }
}

/// Redacts the signature of a SAS query string while keeping its scope readable.
///
/// `sv=2022-11-02&sp=r&sig=abc%3D` is displayed as `sv=2022-11-02&sp=r&sig=***`.
/// Any URL prefix before `?` is kept as is.
pub struct RedactSas<'a>(&'a str);

impl<'a> From<&'a str> for RedactSas<'a> {
    fn from(value: &'a str) -> Self {
        RedactSas(value)
    }
}

impl<'a> From<&'a String> for RedactSas<'a> {
    fn from(value: &'a String) -> Self {
        RedactSas(value.as_str())
    }
}

impl Display for RedactSas<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (prefix, query) = match self.0.split_once('?') {
            Some((prefix, query)) => (Some(prefix), query),
            None => (None, self.0),
        };

        if let Some(prefix) = prefix {
            write!(f, "{prefix}?")?;
        }

        for (idx, pair) in query.split('&').enumerate() {
            if idx > 0 {
                f.write_str("&")?;
            }
            match pair.split_once('=') {
                Some(("sig", _)) => f.write_str("sig=***")?,
                _ => f.write_str(pair)?,
            }
        }
        Ok(())
    }
}

impl Debug for RedactSas<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{self}\"")
    }
}
