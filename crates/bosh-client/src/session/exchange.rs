// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! One in-flight request/response exchange.
//!
//! An exchange is created under the session lock when a request is
//! admitted, but the HTTP dispatch happens after the lock is released.
//! Workers may claim the exchange in between, so awaiting is two-stage:
//! first for the dispatcher to attach the [`ResponsePromise`], then for
//! the transport to fulfil it. Cancelling unblocks both stages.

use parking_lot::{Condvar, Mutex};

use crate::body::ComposableBody;
use crate::error::{Error, Result};
use crate::transport::{HttpResponse, ResponsePromise};

#[derive(Debug)]
enum Slot {
    Unassigned,
    Assigned(ResponsePromise),
    Cancelled,
}

/// An outstanding request bound to its pending response.
#[derive(Debug)]
pub(crate) struct Exchange {
    request: ComposableBody,
    slot: Mutex<Slot>,
    assigned: Condvar,
}

impl Exchange {
    pub(crate) fn new(request: ComposableBody) -> Self {
        Self {
            request,
            slot: Mutex::new(Slot::Unassigned),
            assigned: Condvar::new(),
        }
    }

    /// The request this exchange carries, with all session attributes
    /// applied.
    pub(crate) fn request(&self) -> &ComposableBody {
        &self.request
    }

    /// Attach the transport's promise after dispatching the request.
    pub(crate) fn attach_response(&self, promise: ResponsePromise) {
        let mut slot = self.slot.lock();
        match &*slot {
            Slot::Unassigned => {
                *slot = Slot::Assigned(promise);
                self.assigned.notify_all();
            }
            // Disposal won the race; fail the transport promise so its
            // waiters (none, normally) unblock too.
            Slot::Cancelled => promise.cancel(),
            Slot::Assigned(_) => {}
        }
    }

    /// Block until the response is available.
    pub(crate) fn await_response(&self) -> Result<HttpResponse> {
        let promise = {
            let mut slot = self.slot.lock();
            loop {
                match &*slot {
                    Slot::Unassigned => self.assigned.wait(&mut slot),
                    Slot::Assigned(promise) => break promise.clone(),
                    Slot::Cancelled => {
                        return Err(Error::Transport(
                            "request cancelled during session disposal".into(),
                        ))
                    }
                }
            }
        };
        promise.wait()
    }

    /// Abort the exchange: waiters on either stage observe a transport
    /// error.
    pub(crate) fn cancel(&self) {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Cancelled) {
            Slot::Assigned(promise) => promise.cancel(),
            Slot::Unassigned | Slot::Cancelled => {}
        }
        self.assigned.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{attributes, Body, StaticBody};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn exchange() -> Arc<Exchange> {
        Arc::new(Exchange::new(
            ComposableBody::builder()
                .attribute(attributes::RID, "1")
                .build(),
        ))
    }

    fn ok_response() -> HttpResponse {
        let body =
            StaticBody::from_xml("<body xmlns='http://jabber.org/protocol/httpbind'/>").unwrap();
        HttpResponse::new(200, body)
    }

    #[test]
    fn test_waits_for_attachment_then_response() {
        let exch = exchange();
        let waiter = Arc::clone(&exch);
        let handle = thread::spawn(move || waiter.await_response());

        thread::sleep(Duration::from_millis(10));
        let (fulfiller, promise) = ResponsePromise::channel();
        exch.attach_response(promise);
        thread::sleep(Duration::from_millis(10));
        fulfiller.fulfill(Ok(ok_response()));

        let got = handle.join().unwrap().unwrap();
        assert_eq!(got.status(), 200);
    }

    #[test]
    fn test_cancel_before_attachment() {
        let exch = exchange();
        let waiter = Arc::clone(&exch);
        let handle = thread::spawn(move || waiter.await_response());
        thread::sleep(Duration::from_millis(10));
        exch.cancel();
        assert!(matches!(
            handle.join().unwrap(),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn test_cancel_after_attachment() {
        let exch = exchange();
        let (_fulfiller, promise) = ResponsePromise::channel();
        exch.attach_response(promise);

        let waiter = Arc::clone(&exch);
        let handle = thread::spawn(move || waiter.await_response());
        thread::sleep(Duration::from_millis(10));
        exch.cancel();
        assert!(matches!(
            handle.join().unwrap(),
            Err(Error::Transport(_))
        ));
    }

    #[test]
    fn test_attach_after_cancel_fails_promise() {
        let exch = exchange();
        exch.cancel();
        let (_fulfiller, promise) = ResponsePromise::channel();
        exch.attach_response(promise.clone());
        assert!(matches!(promise.wait(), Err(Error::Transport(_))));
    }

    #[test]
    fn test_request_preserved() {
        let exch = exchange();
        assert_eq!(exch.request().attribute(&attributes::RID), Some("1"));
    }
}
