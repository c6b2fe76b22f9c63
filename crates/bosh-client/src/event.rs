// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Listener traits and session events.
//!
//! Listeners are invoked from processor threads with no locks held; they
//! must be `Send + Sync` and should return quickly. A panicking listener
//! is logged and suppressed so it can never poison the dispatcher or the
//! session.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::warn;

use crate::body::{ComposableBody, StaticBody};
use crate::error::Error;

/// Connection lifecycle event. Exactly one event is delivered per state
/// edge: established once, then either closed or closed-on-error once.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The session creation response was integrated; the session is live.
    Established,
    /// The session terminated normally.
    Closed,
    /// The session was torn down by an error.
    ClosedOnError {
        /// Requests the connection manager never acknowledged, in RID
        /// order. Empty unless the session negotiated acking.
        unacknowledged: Vec<ComposableBody>,
        /// What killed the session.
        cause: Arc<Error>,
    },
}

impl ConnectionEvent {
    /// True for [`ConnectionEvent::Established`].
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionEvent::Established)
    }

    /// The error that closed the session, if it closed on error.
    #[must_use]
    pub fn cause(&self) -> Option<&Error> {
        match self {
            ConnectionEvent::ClosedOnError { cause, .. } => Some(cause),
            _ => None,
        }
    }
}

/// Observer of outbound requests, notified after each dispatch.
pub trait RequestListener: Send + Sync {
    /// Called after `request` was handed to the HTTP sender.
    fn request_sent(&self, request: &ComposableBody);
}

/// Observer of inbound responses, notified before integration.
pub trait ResponseListener: Send + Sync {
    /// Called for every response body received from the connection
    /// manager.
    fn response_received(&self, response: &StaticBody);
}

/// Observer of connection lifecycle edges.
pub trait ConnectionListener: Send + Sync {
    /// Called once per state edge.
    fn connection_event(&self, event: &ConnectionEvent);
}

// ============================================================================
// LISTENER SETS
// ============================================================================

/// Copy-on-write listener collection: registration swaps a fresh vector
/// in, dispatch iterates a snapshot without locking.
pub(crate) struct ListenerSet<L: ?Sized> {
    inner: ArcSwap<Vec<Arc<L>>>,
}

impl<L: ?Sized> ListenerSet<L> {
    pub(crate) fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Arc<L>) {
        self.inner.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&listener));
            next
        });
    }

    pub(crate) fn remove(&self, listener: &Arc<L>) {
        self.inner.rcu(|current| {
            current
                .iter()
                .filter(|l| !Arc::ptr_eq(l, listener))
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    pub(crate) fn dispatch(&self, mut notify: impl FnMut(&L)) {
        for listener in self.inner.load().iter() {
            if catch_unwind(AssertUnwindSafe(|| notify(listener))).is_err() {
                warn!("unhandled panic in listener; continuing");
            }
        }
    }
}
