// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Locally composed body messages.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::qname::{BodyQName, BOSH_NS_URI};
use super::{Body, StaticBody};

/// An immutable body message assembled through a [`Builder`].
///
/// The wrapper element, its attributes, extra namespace declarations, and
/// the payload are kept structured; the serialized XML form is computed on
/// first use and cached.
#[derive(Debug, Clone)]
pub struct ComposableBody {
    attrs: BTreeMap<BodyQName, String>,
    namespaces: BTreeMap<String, String>,
    payload: String,
    xml: OnceLock<String>,
}

impl ComposableBody {
    /// Start building a new, empty body.
    #[must_use]
    pub fn builder() -> Builder {
        Builder {
            attrs: BTreeMap::new(),
            namespaces: BTreeMap::new(),
            payload: String::new(),
        }
    }

    /// Derive a builder seeded with this body's attributes, namespace
    /// declarations, and payload.
    #[must_use]
    pub fn rebuild(&self) -> Builder {
        Builder {
            attrs: self.attrs.clone(),
            namespaces: self.namespaces.clone(),
            payload: self.payload.clone(),
        }
    }

    /// Re-compose a received [`StaticBody`] so it can be modified and
    /// sent back out.
    #[must_use]
    pub fn from_static(body: &StaticBody) -> Self {
        Self {
            attrs: body.attributes().clone(),
            namespaces: BTreeMap::new(),
            payload: body.payload().to_owned(),
            xml: OnceLock::new(),
        }
    }

    /// The payload XML fragment carried inside `<body/>`.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Extra namespace declarations (prefix to URI) on the wrapper.
    #[must_use]
    pub fn namespaces(&self) -> &BTreeMap<String, String> {
        &self.namespaces
    }

    fn compute_xml(&self) -> String {
        let mut out = String::with_capacity(128 + self.payload.len());
        out.push_str("<body");
        for (name, value) in &self.attrs {
            out.push(' ');
            if let Some(prefix) = name.prefix() {
                out.push_str(prefix);
                out.push(':');
            }
            out.push_str(name.local());
            out.push_str("='");
            push_escaped(&mut out, value);
            out.push('\'');
        }
        out.push_str(" xmlns='");
        out.push_str(BOSH_NS_URI);
        out.push('\'');

        // Explicit declarations win; prefixed attributes outside the
        // built-in xml namespace must still resolve, so their namespaces
        // are declared from the qualified name itself.
        let mut decls: BTreeMap<&str, &str> = self
            .namespaces
            .iter()
            .map(|(p, u)| (p.as_str(), u.as_str()))
            .collect();
        for name in self.attrs.keys() {
            if let Some(prefix) = name.prefix() {
                if prefix != "xml" {
                    decls.entry(prefix).or_insert_with(|| name.uri());
                }
            }
        }
        for (prefix, uri) in decls {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("='");
            push_escaped(&mut out, uri);
            out.push('\'');
        }

        if self.payload.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&self.payload);
            out.push_str("</body>");
        }
        out
    }
}

impl Body for ComposableBody {
    fn attribute(&self, name: &BodyQName) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn attributes(&self) -> &BTreeMap<BodyQName, String> {
        &self.attrs
    }

    fn to_xml(&self) -> &str {
        self.xml.get_or_init(|| self.compute_xml())
    }
}

/// Builder deriving a new [`ComposableBody`], preserving everything it
/// was seeded with unless overridden.
#[derive(Debug, Clone)]
pub struct Builder {
    attrs: BTreeMap<BodyQName, String>,
    namespaces: BTreeMap<String, String>,
    payload: String,
}

impl Builder {
    /// Set an attribute on the wrapper element.
    #[must_use]
    pub fn attribute(mut self, name: BodyQName, value: impl Into<String>) -> Self {
        self.attrs.insert(name, value.into());
        self
    }

    /// Remove an attribute from the wrapper element, if present.
    #[must_use]
    pub fn clear_attribute(mut self, name: &BodyQName) -> Self {
        self.attrs.remove(name);
        self
    }

    /// Set or remove an attribute in one call; `None` removes.
    #[must_use]
    pub fn set_attribute(self, name: BodyQName, value: Option<String>) -> Self {
        match value {
            Some(value) => self.attribute(name, value),
            None => self.clear_attribute(&name),
        }
    }

    /// Replace the payload XML fragment.
    #[must_use]
    pub fn payload_xml(mut self, payload: impl Into<String>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Declare an extra namespace on the wrapper element.
    #[must_use]
    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.insert(prefix.into(), uri.into());
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> ComposableBody {
        ComposableBody {
            attrs: self.attrs,
            namespaces: self.namespaces,
            payload: self.payload,
            xml: OnceLock::new(),
        }
    }
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
}
