// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Qualified names for body attributes.
//!
//! BOSH attributes are identified by namespace URI plus local part, not by
//! local part alone: an attribute in the empty namespace and one in the
//! BOSH namespace with the same local part are distinct. The optional
//! serialization prefix is carried along for round-tripping but takes no
//! part in equality, ordering, or hashing.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Namespace URI of the BOSH `<body/>` wrapper element and its attributes.
pub const BOSH_NS_URI: &str = "http://jabber.org/protocol/httpbind";

/// The built-in XML namespace (`xml:` prefix, e.g. `xml:lang`).
pub const XML_NS_URI: &str = "http://www.w3.org/XML/1998/namespace";

/// Qualified name of a `<body/>` attribute.
#[derive(Debug, Clone)]
pub struct BodyQName {
    uri: Cow<'static, str>,
    local: Cow<'static, str>,
    prefix: Option<Cow<'static, str>>,
}

impl BodyQName {
    /// Create a qualified name in the given namespace.
    #[must_use]
    pub fn new(uri: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            uri: Cow::Owned(uri.into()),
            local: Cow::Owned(local.into()),
            prefix: None,
        }
    }

    /// Create a qualified name with an explicit serialization prefix.
    #[must_use]
    pub fn with_prefix(
        uri: impl Into<String>,
        local: impl Into<String>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            uri: Cow::Owned(uri.into()),
            local: Cow::Owned(local.into()),
            prefix: Some(Cow::Owned(prefix.into())),
        }
    }

    /// Create a qualified name in the BOSH namespace.
    #[must_use]
    pub fn bosh(local: impl Into<String>) -> Self {
        Self::new(BOSH_NS_URI, local)
    }

    const fn from_static(uri: &'static str, local: &'static str) -> Self {
        Self {
            uri: Cow::Borrowed(uri),
            local: Cow::Borrowed(local),
            prefix: None,
        }
    }

    const fn from_static_prefixed(
        uri: &'static str,
        local: &'static str,
        prefix: &'static str,
    ) -> Self {
        Self {
            uri: Cow::Borrowed(uri),
            local: Cow::Borrowed(local),
            prefix: Some(Cow::Borrowed(prefix)),
        }
    }

    /// Namespace URI of this name.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Local part of this name.
    #[must_use]
    pub fn local(&self) -> &str {
        &self.local
    }

    /// Serialization prefix, if one was declared.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// True when this name lives in the BOSH namespace.
    #[must_use]
    pub fn is_bosh(&self) -> bool {
        self.uri == BOSH_NS_URI
    }
}

// Prefix is a serialization hint only; identity is (uri, local).
impl PartialEq for BodyQName {
    fn eq(&self, other: &Self) -> bool {
        self.uri == other.uri && self.local == other.local
    }
}

impl Eq for BodyQName {}

impl PartialOrd for BodyQName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BodyQName {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.uri.as_ref(), self.local.as_ref()).cmp(&(other.uri.as_ref(), other.local.as_ref()))
    }
}

impl Hash for BodyQName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.uri.hash(state);
        self.local.hash(state);
    }
}

impl fmt::Display for BodyQName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.prefix() {
            Some(prefix) => write!(f, "{}:{}", prefix, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Catalogue of the attribute names defined by XEP-0124.
///
/// All names live in the BOSH namespace except [`attributes::LANG`], which
/// is the built-in `xml:lang`.
pub mod attributes {
    use super::{BodyQName, BOSH_NS_URI, XML_NS_URI};

    /// Content encodings the connection manager will decode on requests.
    pub const ACCEPT: BodyQName = BodyQName::from_static(BOSH_NS_URI, "accept");
    /// Highest acknowledged RID, or "1" on the session creation request.
    pub const ACK: BodyQName = BodyQName::from_static(BOSH_NS_URI, "ack");
    /// Stream authentication identifier (relayed, not interpreted).
    pub const AUTHID: BodyQName = BodyQName::from_static(BOSH_NS_URI, "authid");
    /// Character sets supported by the connection manager.
    pub const CHARSETS: BodyQName = BodyQName::from_static(BOSH_NS_URI, "charsets");
    /// Terminal or recoverable condition name.
    pub const CONDITION: BodyQName = BodyQName::from_static(BOSH_NS_URI, "condition");
    /// Alternative content type of the body.
    pub const CONTENT: BodyQName = BodyQName::from_static(BOSH_NS_URI, "content");
    /// Originating entity of the session.
    pub const FROM: BodyQName = BodyQName::from_static(BOSH_NS_URI, "from");
    /// Number of requests the connection manager keeps on hold.
    pub const HOLD: BodyQName = BodyQName::from_static(BOSH_NS_URI, "hold");
    /// Maximum seconds the client may stay silent.
    pub const INACTIVITY: BodyQName = BodyQName::from_static(BOSH_NS_URI, "inactivity");
    /// `xml:lang` of the stream.
    pub const LANG: BodyQName = BodyQName::from_static_prefixed(XML_NS_URI, "lang", "xml");
    /// Upper bound on a requested pause.
    pub const MAXPAUSE: BodyQName = BodyQName::from_static(BOSH_NS_URI, "maxpause");
    /// Session security key rotation (not interpreted by this crate).
    pub const NEWKEY: BodyQName = BodyQName::from_static(BOSH_NS_URI, "newkey");
    /// Requested temporary inactivity extension.
    pub const PAUSE: BodyQName = BodyQName::from_static(BOSH_NS_URI, "pause");
    /// Minimum seconds between two empty requests.
    pub const POLLING: BodyQName = BodyQName::from_static(BOSH_NS_URI, "polling");
    /// RID of a request the connection manager could not answer in order.
    pub const REPORT: BodyQName = BodyQName::from_static(BOSH_NS_URI, "report");
    /// Maximum number of concurrent requests.
    pub const REQUESTS: BodyQName = BodyQName::from_static(BOSH_NS_URI, "requests");
    /// Request identifier.
    pub const RID: BodyQName = BodyQName::from_static(BOSH_NS_URI, "rid");
    /// Proxy routing target.
    pub const ROUTE: BodyQName = BodyQName::from_static(BOSH_NS_URI, "route");
    /// Legacy security indicator (relayed, not interpreted).
    pub const SECURE: BodyQName = BodyQName::from_static(BOSH_NS_URI, "secure");
    /// Opaque session identifier.
    pub const SID: BodyQName = BodyQName::from_static(BOSH_NS_URI, "sid");
    /// Stream name for multi-stream sessions (relayed, not interpreted).
    pub const STREAM: BodyQName = BodyQName::from_static(BOSH_NS_URI, "stream");
    /// Milliseconds since the response to the reported request was sent.
    pub const TIME: BodyQName = BodyQName::from_static(BOSH_NS_URI, "time");
    /// Target domain of the first stream.
    pub const TO: BodyQName = BodyQName::from_static(BOSH_NS_URI, "to");
    /// "terminate" or "error".
    pub const TYPE: BodyQName = BodyQName::from_static(BOSH_NS_URI, "type");
    /// Highest BOSH protocol version supported.
    pub const VER: BodyQName = BodyQName::from_static(BOSH_NS_URI, "ver");
    /// Maximum seconds the connection manager may hold a request.
    pub const WAIT: BodyQName = BodyQName::from_static(BOSH_NS_URI, "wait");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_prefix() {
        let plain = BodyQName::new(XML_NS_URI, "lang");
        assert_eq!(plain, attributes::LANG);

        let mut set = std::collections::BTreeSet::new();
        set.insert(attributes::LANG);
        assert!(set.contains(&plain));
    }

    #[test]
    fn test_namespace_distinguishes() {
        let bosh = BodyQName::bosh("type");
        let none = BodyQName::new("", "type");
        assert_ne!(bosh, none);
    }

    #[test]
    fn test_display_uses_prefix() {
        assert_eq!(attributes::LANG.to_string(), "xml:lang");
        assert_eq!(attributes::RID.to_string(), "rid");
    }
}
