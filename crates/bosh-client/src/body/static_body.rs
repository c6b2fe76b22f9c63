// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Body messages parsed from raw wire XML.

use std::collections::BTreeMap;

use roxmltree::{Document, NodeType};

use super::qname::{BodyQName, BOSH_NS_URI, XML_NS_URI};
use super::Body;
use crate::error::{Error, Result};

/// A body message parsed from the text received off the wire.
///
/// The original text is preserved untouched: [`Body::to_xml`] returns it
/// byte-for-byte, and [`StaticBody::payload`] is the raw slice between the
/// wrapper tags.
///
/// Unprefixed attributes on the wrapper are qualified into the BOSH
/// namespace, matching the attribute catalogue in
/// [`attributes`](super::attributes).
#[derive(Debug, Clone)]
pub struct StaticBody {
    raw: String,
    attrs: BTreeMap<BodyQName, String>,
    payload: String,
}

impl StaticBody {
    /// Parse a wire message.
    ///
    /// Fails with [`Error::Parse`] when the XML is not well-formed, the
    /// root is not a single `<body/>` in the BOSH namespace, the document
    /// contains comments or processing instructions, or non-whitespace
    /// character data appears directly under the wrapper element.
    pub fn from_xml(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let (attrs, payload) = parse(&raw)?;
        Ok(Self {
            raw,
            attrs,
            payload,
        })
    }

    /// The payload XML fragment, exactly as received.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

impl Body for StaticBody {
    fn attribute(&self, name: &BodyQName) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    fn attributes(&self) -> &BTreeMap<BodyQName, String> {
        &self.attrs
    }

    fn to_xml(&self) -> &str {
        &self.raw
    }
}

fn parse(raw: &str) -> Result<(BTreeMap<BodyQName, String>, String)> {
    let doc = Document::parse(raw)
        .map_err(|e| Error::Parse(format!("malformed body XML: {e}")))?;
    let root = doc.root_element();
    if root.tag_name().name() != "body" || root.tag_name().namespace() != Some(BOSH_NS_URI) {
        return Err(Error::Parse(format!(
            "root element is not a BOSH <body/> wrapper: <{}>",
            root.tag_name().name()
        )));
    }

    for node in doc.root().descendants() {
        match node.node_type() {
            NodeType::Comment => {
                return Err(Error::Parse("comments are not allowed in body messages".into()))
            }
            NodeType::PI => {
                return Err(Error::Parse(
                    "processing instructions are not allowed in body messages".into(),
                ))
            }
            NodeType::Text => {
                let under_wrapper = node.parent().is_some_and(|p| p == root);
                let whitespace = node.text().map_or(true, |t| t.trim().is_empty());
                if under_wrapper && !whitespace {
                    return Err(Error::Parse(
                        "character data is not allowed directly inside <body/>".into(),
                    ));
                }
            }
            NodeType::Root | NodeType::Element => {}
        }
    }

    let mut attrs = BTreeMap::new();
    for attr in root.attributes() {
        let name = match attr.namespace() {
            None => BodyQName::bosh(attr.name()),
            Some(XML_NS_URI) => BodyQName::with_prefix(XML_NS_URI, attr.name(), "xml"),
            Some(uri) => match root.lookup_prefix(uri) {
                Some(prefix) => BodyQName::with_prefix(uri, attr.name(), prefix),
                None => BodyQName::new(uri, attr.name()),
            },
        };
        attrs.insert(name, attr.value().to_owned());
    }

    let payload = match (root.first_child(), root.last_child()) {
        (Some(first), Some(last)) => raw[first.range().start..last.range().end].to_owned(),
        _ => String::new(),
    };

    Ok((attrs, payload))
}
