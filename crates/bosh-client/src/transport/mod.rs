// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! The HTTP sender seam.
//!
//! The scheduler core is transport-agnostic: anything that can POST a
//! body and later produce a status code plus a parsed response body can
//! drive a session. A sender hands back a [`ResponsePromise`] immediately
//! and fulfils it from its own I/O context; processor workers block on
//! the promise with the session lock released.
//!
//! Senders must be safe under concurrent `send` calls and must not retain
//! session-level state: everything session-scoped is passed in per call.

#[cfg(feature = "reqwest-sender")]
mod reqwest;

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

#[cfg(feature = "reqwest-sender")]
pub use self::reqwest::ReqwestSender;

use crate::body::{ComposableBody, StaticBody};
use crate::config::BoshConfig;
use crate::error::{Error, Result};
use crate::session::SessionParams;

/// A complete HTTP response: status code plus parsed body.
#[derive(Debug)]
pub struct HttpResponse {
    status: u16,
    body: StaticBody,
}

impl HttpResponse {
    /// Bundle a status code and a parsed body.
    #[must_use]
    pub fn new(status: u16, body: StaticBody) -> Self {
        Self { status, body }
    }

    /// The HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The parsed response body.
    #[must_use]
    pub fn body(&self) -> &StaticBody {
        &self.body
    }

    /// Split into status and body.
    #[must_use]
    pub fn into_parts(self) -> (u16, StaticBody) {
        (self.status, self.body)
    }
}

/// Pluggable HTTP transport.
pub trait HttpSender: Send + Sync {
    /// Prepare the sender for a new session.
    fn init(&self, cfg: &BoshConfig) -> Result<()>;

    /// Release transport resources; pending sends should fail their
    /// promises.
    fn destroy(&self);

    /// Dispatch one request. Must not block the caller; transport errors
    /// surface when the returned promise is awaited. `params` is `None`
    /// for the session creation request.
    fn send(&self, params: Option<&SessionParams>, request: &ComposableBody) -> ResponsePromise;
}

// ============================================================================
// RESPONSE PROMISE
// ============================================================================

enum PromiseState {
    Pending,
    Ready(Result<HttpResponse>),
    Taken,
}

struct PromiseInner {
    state: Mutex<PromiseState>,
    cond: Condvar,
}

/// Awaitable slot for an in-flight HTTP response.
///
/// Exactly one [`ResponseFulfiller`] exists per promise; dropping it
/// without fulfilling injects a transport error so waiters never hang.
#[derive(Clone)]
pub struct ResponsePromise {
    inner: Arc<PromiseInner>,
}

impl ResponsePromise {
    /// Create a promise and its fulfilling half.
    #[must_use]
    pub fn channel() -> (ResponseFulfiller, ResponsePromise) {
        let inner = Arc::new(PromiseInner {
            state: Mutex::new(PromiseState::Pending),
            cond: Condvar::new(),
        });
        (
            ResponseFulfiller {
                inner: Arc::clone(&inner),
                fulfilled: false,
            },
            ResponsePromise { inner },
        )
    }

    /// Create a promise already fulfilled with `result`; used by senders
    /// that fail before dispatching.
    #[must_use]
    pub fn ready(result: Result<HttpResponse>) -> ResponsePromise {
        ResponsePromise {
            inner: Arc::new(PromiseInner {
                state: Mutex::new(PromiseState::Ready(result)),
                cond: Condvar::new(),
            }),
        }
    }

    /// Block until the response (or a transport failure) is available and
    /// take it. The response can be consumed once.
    pub fn wait(&self) -> Result<HttpResponse> {
        let mut state = self.inner.state.lock();
        loop {
            match &*state {
                PromiseState::Pending => self.inner.cond.wait(&mut state),
                PromiseState::Ready(_) => break,
                PromiseState::Taken => {
                    return Err(Error::Transport("response already consumed".into()))
                }
            }
        }
        match std::mem::replace(&mut *state, PromiseState::Taken) {
            PromiseState::Ready(result) => result,
            _ => unreachable!("promise state changed while lock was held"),
        }
    }

    /// Fail the promise with a cancellation error unless it is already
    /// fulfilled, unblocking any waiter.
    pub fn cancel(&self) {
        let mut state = self.inner.state.lock();
        if matches!(*state, PromiseState::Pending) {
            *state = PromiseState::Ready(Err(Error::Transport(
                "request cancelled during session disposal".into(),
            )));
            self.inner.cond.notify_all();
        }
    }
}

impl std::fmt::Debug for ResponsePromise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.inner.state.lock() {
            PromiseState::Pending => "pending",
            PromiseState::Ready(_) => "ready",
            PromiseState::Taken => "taken",
        };
        f.debug_struct("ResponsePromise").field("state", &state).finish()
    }
}

/// Fulfilling half of a [`ResponsePromise`].
pub struct ResponseFulfiller {
    inner: Arc<PromiseInner>,
    fulfilled: bool,
}

impl ResponseFulfiller {
    /// Deliver the outcome of the HTTP exchange.
    pub fn fulfill(mut self, result: Result<HttpResponse>) {
        self.store(result);
    }

    fn store(&mut self, result: Result<HttpResponse>) {
        let mut state = self.inner.state.lock();
        if matches!(*state, PromiseState::Pending) {
            *state = PromiseState::Ready(result);
            self.inner.cond.notify_all();
        }
        self.fulfilled = true;
    }
}

impl Drop for ResponseFulfiller {
    fn drop(&mut self) {
        if !self.fulfilled {
            self.store(Err(Error::Transport(
                "sender dropped the request without a response".into(),
            )));
        }
    }
}
