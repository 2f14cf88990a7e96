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

use std::fmt;

/// Capabilities granted by an issued credential.
///
/// Only read and list exist here: write, delete and the other storage permissions
/// cannot be expressed, so no code path can grant them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct Permissions {
    read: bool,
    list: bool,
}

impl Permissions {
    /// `r`: read blob content and metadata.
    pub fn read() -> Self {
        Self {
            read: true,
            list: false,
        }
    }

    /// `rl`: read any blob in the container and list the container.
    pub fn read_list() -> Self {
        Self {
            read: true,
            list: true,
        }
    }

    /// Whether read is granted.
    pub fn can_read(&self) -> bool {
        self.read
    }

    /// Whether list is granted.
    pub fn can_list(&self) -> bool {
        self.list
    }
}

/// Permissions are rendered in the canonical order the service requires (`r` before `l`).
impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.read {
            f.write_str("r")?;
        }
        if self.list {
            f.write_str("l")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permissions_display() {
        assert_eq!(Permissions::read().to_string(), "r");
        assert_eq!(Permissions::read_list().to_string(), "rl");
        assert_eq!(Permissions::default().to_string(), "");
    }

    #[test]
    fn test_permissions_flags() {
        let p = Permissions::read();
        assert!(p.can_read());
        assert!(!p.can_list());
        assert!(Permissions::read_list().can_list());
    }
}
