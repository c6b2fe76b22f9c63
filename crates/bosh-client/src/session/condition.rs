// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Terminal binding conditions (XEP-0124 §17).

use std::fmt;

/// Fatal protocol-level error reported by the connection manager in a
/// `type="terminate"` response, or mapped from an HTTP status code when
/// talking to a legacy connection manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminalBindingCondition {
    /// The format of the request was not understood.
    BadRequest,
    /// The target domain is no longer serviced by the connection manager.
    HostGone,
    /// The target domain is unknown to the connection manager.
    HostUnknown,
    /// The connection manager was addressed improperly.
    ImproperAddressing,
    /// The connection manager experienced an internal error.
    InternalServerError,
    /// The session (or resource) could not be found.
    ItemNotFound,
    /// Another request preempted this one.
    OtherRequest,
    /// The client violated session policy (e.g. polled too frequently).
    PolicyViolation,
    /// The connection manager could not reach the server.
    RemoteConnectionFailed,
    /// The server terminated the underlying stream with an error.
    RemoteStreamError,
    /// The client should reconnect to the advertised alternative URI.
    SeeOtherUri,
    /// The connection manager is shutting down.
    SystemShutdown,
    /// An unspecified error condition.
    UndefinedCondition,
}

impl TerminalBindingCondition {
    /// Look up a condition by its wire name, if it is a known terminal
    /// condition. An unknown or absent name is not terminal.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        use TerminalBindingCondition::*;
        Some(match name {
            "bad-request" => BadRequest,
            "host-gone" => HostGone,
            "host-unknown" => HostUnknown,
            "improper-addressing" => ImproperAddressing,
            "internal-server-error" => InternalServerError,
            "item-not-found" => ItemNotFound,
            "other-request" => OtherRequest,
            "policy-violation" => PolicyViolation,
            "remote-connection-failed" => RemoteConnectionFailed,
            "remote-stream-error" => RemoteStreamError,
            "see-other-uri" => SeeOtherUri,
            "system-shutdown" => SystemShutdown,
            "undefined-condition" => UndefinedCondition,
            _ => return None,
        })
    }

    /// Map a deprecated HTTP error status to its terminal condition
    /// (legacy connection managers, XEP-0124 §17.2).
    #[must_use]
    pub fn from_http_status(status: u16) -> Option<Self> {
        match status {
            400 => Some(Self::BadRequest),
            403 => Some(Self::PolicyViolation),
            404 => Some(Self::ItemNotFound),
            _ => None,
        }
    }

    /// The wire name of this condition.
    #[must_use]
    pub fn name(self) -> &'static str {
        use TerminalBindingCondition::*;
        match self {
            BadRequest => "bad-request",
            HostGone => "host-gone",
            HostUnknown => "host-unknown",
            ImproperAddressing => "improper-addressing",
            InternalServerError => "internal-server-error",
            ItemNotFound => "item-not-found",
            OtherRequest => "other-request",
            PolicyViolation => "policy-violation",
            RemoteConnectionFailed => "remote-connection-failed",
            RemoteStreamError => "remote-stream-error",
            SeeOtherUri => "see-other-uri",
            SystemShutdown => "system-shutdown",
            UndefinedCondition => "undefined-condition",
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(self) -> &'static str {
        use TerminalBindingCondition::*;
        match self {
            BadRequest => "the format of the HTTP request is not understood",
            HostGone => "the target domain is no longer serviced by the connection manager",
            HostUnknown => "the target domain is unknown to the connection manager",
            ImproperAddressing => "the initialization element lacks a 'to' or 'route' attribute",
            InternalServerError => "the connection manager experienced an internal error",
            ItemNotFound => "dead session or request ID too large",
            OtherRequest => "another request preempted this one",
            PolicyViolation => "the request violated session policy",
            RemoteConnectionFailed => "the connection manager could not connect to the server",
            RemoteStreamError => "the server terminated the stream with an error",
            SeeOtherUri => "the client should reconnect to the advertised URI",
            SystemShutdown => "the connection manager is being shut down",
            UndefinedCondition => "unspecified error condition",
        }
    }
}

impl fmt::Display for TerminalBindingCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.message())
    }
}
