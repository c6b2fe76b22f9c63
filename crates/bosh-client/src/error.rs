// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Error taxonomy for the BOSH client core.
//!
//! One crate-level [`Error`] enum covers every failure the library can
//! surface: body/attribute parse failures, protocol violations during
//! session establishment, terminal binding conditions reported by the
//! connection manager, transport failures, unresolved acknowledgement
//! reports, and operations on a closed session.

use thiserror::Error;

use crate::session::TerminalBindingCondition;

/// Convenience result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by BOSH client operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed body XML or attribute value.
    #[error("parse error: {0}")]
    Parse(String),

    /// The connection manager's response violated the binding protocol
    /// (e.g. a session creation response without a session ID).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The connection manager reported a terminal binding condition, or a
    /// legacy connection manager answered with a fatal HTTP status code.
    /// The session is disposed of and further sends fail.
    #[error("terminal binding condition encountered: {message}")]
    TerminalBinding {
        /// The condition named by the response, when it maps to a known
        /// XEP-0124 §17 terminal condition.
        condition: Option<TerminalBindingCondition>,
        /// Human-readable description, including the raw condition text.
        message: String,
    },

    /// The HTTP sender failed to deliver a request or produce a response,
    /// or a pending response was cancelled during disposal.
    #[error("transport error: {0}")]
    Transport(String),

    /// The connection manager reported a missing request (`report`
    /// attribute) whose RID is not in the local unacknowledged buffer.
    #[error("report of missing request with rid {0}, but no local copy of that request was found")]
    AckReportUnresolved(u64),

    /// `send` was called on a session that is no longer working and the
    /// body was not a termination.
    #[error("cannot send message when session is closed")]
    SessionClosed,

    /// The session was forcibly closed by the caller via `close()`.
    #[error("session explicitly closed by caller")]
    ExplicitlyClosed,

    /// Infrastructure failure that should not occur in normal operation
    /// (e.g. the system CSPRNG or thread spawning being unavailable).
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when this error is a terminal binding condition.
    #[must_use]
    pub fn is_terminal_binding(&self) -> bool {
        matches!(self, Error::TerminalBinding { .. })
    }

    /// The terminal binding condition carried by this error, if any.
    #[must_use]
    pub fn terminal_binding_condition(&self) -> Option<TerminalBindingCondition> {
        match self {
            Error::TerminalBinding { condition, .. } => *condition,
            _ => None,
        }
    }
}
