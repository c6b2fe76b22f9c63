// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! The `<body/>` wrapper element.
//!
//! Every BOSH request and response is a single `<body/>` element in the
//! `http://jabber.org/protocol/httpbind` namespace carrying protocol
//! attributes and an opaque XML payload. Two concrete representations
//! exist:
//!
//! - [`ComposableBody`] is built locally through a [`Builder`] and used
//!   for requests. Serialization is computed lazily and cached.
//! - [`StaticBody`] is parsed from raw XML received off the wire and
//!   preserves the original text byte-for-byte.
//!
//! Both are immutable once constructed and share the read-only [`Body`]
//! view.

mod composable;
pub mod qname;
mod static_body;

use std::collections::BTreeMap;
use std::fmt;

pub use composable::{Builder, ComposableBody};
pub use qname::{attributes, BodyQName, BOSH_NS_URI, XML_NS_URI};
pub use static_body::StaticBody;

/// Read-only view over a body message.
pub trait Body: fmt::Debug + Send + Sync {
    /// Value of the given attribute, if present.
    fn attribute(&self, name: &BodyQName) -> Option<&str>;

    /// All attributes of the wrapper element.
    fn attributes(&self) -> &BTreeMap<BodyQName, String>;

    /// The serialized `<body/>` element.
    fn to_xml(&self) -> &str;
}

/// True when the body announces a session termination
/// (`type="terminate"`).
pub(crate) fn is_termination(body: &dyn Body) -> bool {
    body.attribute(&attributes::TYPE) == Some("terminate")
}

/// True when the body requests a session pause.
pub(crate) fn is_pause(body: &dyn Body) -> bool {
    body.attribute(&attributes::PAUSE).is_some()
}

/// True when the body carries a recoverable binding error
/// (`type="error"`).
pub(crate) fn is_recoverable_error(body: &dyn Body) -> bool {
    body.attribute(&attributes::TYPE) == Some("error")
}
