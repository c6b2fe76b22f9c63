// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! # bosh-client - Bidirectional-streams Over Synchronous HTTP
//!
//! A client-side implementation of BOSH (XEP-0124), the protocol that
//! tunnels a long-lived, ordered, bidirectional XML stream over a
//! sequence of HTTP POST request/response pairs. The canonical use is
//! carrying an XMPP stream across intermediaries that only speak HTTP.
//!
//! This crate is the client half only: it negotiates a session with a
//! remote connection manager, multiplexes outbound payloads onto the
//! allowed number of concurrent requests, correlates responses, enforces
//! the protocol's pacing and acknowledgement rules, and hands received
//! payloads to the application. Payloads themselves are opaque; XMPP
//! semantics live above this crate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bosh_client::{BoshClient, BoshConfig, ComposableBody, Result};
//! use url::Url;
//!
//! fn main() -> Result<()> {
//!     let cfg = BoshConfig::builder(
//!         Url::parse("http://server:5280/http-bind").unwrap(),
//!         "jabber.org",
//!     )
//!     .from("user@jabber.org")
//!     .build();
//!
//!     let client = BoshClient::create(cfg)?;
//!
//!     // An empty body opens the session immediately.
//!     client.send(ComposableBody::builder().build())?;
//!
//!     // Payload data; all BOSH attributes are applied automatically.
//!     client.send(
//!         ComposableBody::builder()
//!             .payload_xml("<message to='friend@jabber.org'/>")
//!             .build(),
//!     )?;
//!
//!     client.disconnect()?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------------------+
//! |                          Application                              |
//! |        send / disconnect / pause / close / listeners              |
//! +-------------------------------------------------------------------+
//! |                     Scheduler & State Machine                     |
//! |  admission control | RID sequencing | ack engine | empty-request  |
//! |  timer | retransmission | worker pool | listener dispatch         |
//! +-------------------------------------------------------------------+
//! |                          Body Model                               |
//! |      ComposableBody / StaticBody | qualified names | parsers      |
//! +-------------------------------------------------------------------+
//! |                         HTTP Sender                               |
//! |     pluggable transport seam | bundled reqwest implementation     |
//! +-------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BoshClient`] | One session with a connection manager; the entry point |
//! | [`BoshConfig`] | Immutable per-session configuration |
//! | [`ComposableBody`] | Request body assembled through a builder |
//! | [`StaticBody`] | Response body parsed from the wire, raw text preserved |
//! | [`SessionParams`] | Limits the connection manager advertised at creation |
//! | [`HttpSender`] | Transport seam; implement it to bring your own HTTP stack |
//!
//! ## Listeners
//!
//! Incoming payloads arrive through a [`ResponseListener`]; connection
//! lifecycle edges (established, closed, closed-on-error) through a
//! [`ConnectionListener`]. Listeners run on background threads and are
//! isolated from each other: a panicking listener is logged and
//! suppressed.
//!
//! ## See Also
//!
//! - [XEP-0124: Bidirectional-streams Over Synchronous HTTP](https://xmpp.org/extensions/xep-0124.html)
//! - [XEP-0206: XMPP Over BOSH](https://xmpp.org/extensions/xep-0206.html)

pub mod attr;
pub mod body;
mod client;
mod config;
mod error;
mod event;
mod rid;
pub mod session;
mod timer;
pub mod transport;

pub use body::{attributes, Body, BodyQName, Builder, ComposableBody, StaticBody, BOSH_NS_URI};
pub use client::BoshClient;
pub use config::{BoshConfig, BoshConfigBuilder, DEFAULT_EMPTY_REQUEST_DELAY, DEFAULT_PAUSE_MARGIN};
pub use error::{Error, Result};
pub use event::{ConnectionEvent, ConnectionListener, RequestListener, ResponseListener};
pub use session::{SessionParams, TerminalBindingCondition};
pub use transport::{HttpResponse, HttpSender, ResponseFulfiller, ResponsePromise};

#[cfg(feature = "reqwest-sender")]
pub use transport::ReqwestSender;

// Re-exported so applications can build configs without adding the
// dependency themselves.
pub use url;
