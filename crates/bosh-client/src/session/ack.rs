// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Acknowledgement engine.
//!
//! Two independent tracks, both owned by the scheduler and mutated under
//! the session lock:
//!
//! - **Response acks (client → CM).** `response_ack` is the highest RID
//!   whose response has been received with no gaps below it. Responses
//!   arriving out of order park in `pending_response_acks` until the run
//!   below them is contiguous; the advance rule is "while the next
//!   contiguous RID is present in the pending set, consume it".
//! - **Request acks (CM → client).** When the connection manager
//!   acknowledges requests, every sent request is retained until a
//!   response's `ack` (explicit) or its own RID (implicit) covers it. The
//!   retained copies serve `report` retransmissions.

use std::collections::BTreeSet;

use crate::attr;
use crate::body::{attributes, Body, ComposableBody};

/// Acknowledgement state for one session.
#[derive(Debug, Default)]
pub(crate) struct AckState {
    response_ack: Option<u64>,
    pending_response_acks: BTreeSet<u64>,
    pending_request_acks: Vec<ComposableBody>,
}

impl AckState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Highest RID whose response arrived with no gaps below it.
    pub(crate) fn response_ack(&self) -> Option<u64> {
        self.response_ack
    }

    /// Record that the response for `rid` has been received.
    pub(crate) fn record_response(&mut self, rid: u64) {
        match self.response_ack {
            None => self.response_ack = Some(rid),
            Some(ack) => {
                self.pending_response_acks.insert(rid);
                let mut next = ack + 1;
                while self.pending_response_acks.remove(&next) {
                    self.response_ack = Some(next);
                    next += 1;
                }
            }
        }
    }

    /// Retain a sent request until the connection manager acknowledges it.
    /// Requests are appended in RID order.
    pub(crate) fn track_request(&mut self, request: ComposableBody) {
        self.pending_request_acks.push(request);
    }

    /// Drop every retained request with `rid <= ack_up_to`.
    pub(crate) fn acknowledge_up_to(&mut self, ack_up_to: u64) {
        self.pending_request_acks
            .retain(|req| request_rid(req).map_or(false, |rid| rid > ack_up_to));
    }

    /// Find the retained request with the given RID, for `report`
    /// retransmission.
    pub(crate) fn find_unacknowledged(&self, rid: u64) -> Option<&ComposableBody> {
        self.pending_request_acks
            .iter()
            .find(|req| request_rid(req) == Some(rid))
    }

    /// Requests the connection manager has not acknowledged, in RID order.
    /// Handed to connection listeners on disposal.
    pub(crate) fn take_unacknowledged(&mut self) -> Vec<ComposableBody> {
        std::mem::take(&mut self.pending_request_acks)
    }
}

fn request_rid(request: &ComposableBody) -> Option<u64> {
    let text = request.attribute(&attributes::RID)?;
    attr::parse_rid("rid", text).ok()
}
