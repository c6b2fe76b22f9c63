// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Typed parsers for well-known body attributes.
//!
//! Every helper accepts `None` (attribute absent) and returns `Ok(None)`;
//! a present but malformed value fails with [`Error::Parse`]. The helpers
//! never interpret absence as a default, that is the caller's business.

use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Highest request identifier representable on the wire (2^53).
pub const MAX_RID: u64 = 1 << 53;

/// Increment headroom an initial RID must leave below [`MAX_RID`] (2^32).
pub const RID_HEADROOM: u64 = 1 << 32;

// ============================================================================
// VERSION
// ============================================================================

/// BOSH protocol version, compared numerically on (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    major: u16,
    minor: u16,
}

/// Highest protocol version this client implements.
pub const SUPPORTED_VERSION: Version = Version {
    major: 1,
    minor: 11,
};

impl Version {
    /// Major version component.
    #[must_use]
    pub fn major(self) -> u16 {
        self.major
    }

    /// Minor version component.
    #[must_use]
    pub fn minor(self) -> u16 {
        self.minor
    }

    /// Parse an optional `ver` attribute value.
    pub fn parse(value: Option<&str>) -> Result<Option<Self>> {
        let Some(text) = value else {
            return Ok(None);
        };
        let (major, minor) = text
            .split_once('.')
            .ok_or_else(|| malformed("ver", text, "expected major.minor"))?;
        let major = parse_component("ver", text, major)?;
        let minor = parse_component("ver", text, minor)?;
        Ok(Some(Self { major, minor }))
    }
}

fn parse_component(attr: &str, whole: &str, part: &str) -> Result<u16> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed(attr, whole, "components must be non-negative integers"));
    }
    part.parse::<u16>()
        .map_err(|_| malformed(attr, whole, "component out of range"))
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ============================================================================
// ACCEPT
// ============================================================================

/// Set of content encodings the connection manager will decode, from the
/// `accept` attribute (comma and/or whitespace separated token list).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accept {
    encodings: Vec<String>,
}

impl Accept {
    /// Parse an optional `accept` attribute value.
    pub fn parse(value: Option<&str>) -> Result<Option<Self>> {
        let Some(text) = value else {
            return Ok(None);
        };
        let encodings: Vec<String> = text
            .split([',', ' ', '\t'])
            .map(str::trim)
            .filter(|tok| !tok.is_empty())
            .map(str::to_owned)
            .collect();
        if encodings.is_empty() {
            return Err(malformed("accept", text, "empty encoding list"));
        }
        Ok(Some(Self { encodings }))
    }

    /// True when `encoding` is in the accepted set.
    #[must_use]
    pub fn is_accepted(&self, encoding: &str) -> bool {
        self.encodings.iter().any(|e| e == encoding)
    }

    /// The accepted encodings in declaration order.
    #[must_use]
    pub fn encodings(&self) -> &[String] {
        &self.encodings
    }
}

// ============================================================================
// NUMERIC HELPERS
// ============================================================================

/// Parse an optional non-negative integer attribute expressed in seconds
/// (`wait`, `polling`, `inactivity`, `maxpause`, `pause`).
pub fn parse_seconds(attr: &str, value: Option<&str>) -> Result<Option<Duration>> {
    let Some(text) = value else {
        return Ok(None);
    };
    let secs: u64 = text
        .parse()
        .map_err(|_| malformed(attr, text, "expected a non-negative integer"))?;
    Ok(Some(Duration::from_secs(secs)))
}

/// Parse an optional non-negative integer count attribute (`requests`,
/// `hold`).
pub fn parse_count(attr: &str, value: Option<&str>) -> Result<Option<u32>> {
    let Some(text) = value else {
        return Ok(None);
    };
    let count: u32 = text
        .parse()
        .map_err(|_| malformed(attr, text, "expected a non-negative integer"))?;
    Ok(Some(count))
}

/// Parse a request identifier (`rid`, `ack`, `report`): a positive
/// integer strictly below 2^53.
pub fn parse_rid(attr: &str, text: &str) -> Result<u64> {
    let rid: u64 = text
        .parse()
        .map_err(|_| malformed(attr, text, "expected a positive integer"))?;
    if rid == 0 || rid >= MAX_RID {
        return Err(malformed(attr, text, "request identifiers must be in [1, 2^53)"));
    }
    Ok(rid)
}

fn malformed(attr: &str, value: &str, detail: &str) -> Error {
    Error::Parse(format!("malformed '{attr}' attribute '{value}': {detail}"))
}
