// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Shared test harness: a scripted connection-manager stub mounted on the
//! HTTP sender seam, listeners that record traffic, and invariant checks
//! over the full request log.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use bosh_client::{
    attributes, Body, BodyQName, BoshClient, BoshConfig, ComposableBody, ConnectionEvent,
    ConnectionListener, Error, HttpResponse, HttpSender, RequestListener, ResponsePromise,
    SessionParams, StaticBody,
};
use url::Url;

const AWAIT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// STUB CONNECTION MANAGER
// ============================================================================

/// One request captured by the stub, waiting for the test to answer it.
pub struct StubExchange {
    request: ComposableBody,
    arrived_at: Instant,
    fulfiller: Option<bosh_client::ResponseFulfiller>,
}

impl StubExchange {
    pub fn request(&self) -> &ComposableBody {
        &self.request
    }

    pub fn arrived_at(&self) -> Instant {
        self.arrived_at
    }

    pub fn attr(&self, name: &BodyQName) -> Option<String> {
        self.request.attribute(name).map(str::to_owned)
    }

    pub fn rid(&self) -> u64 {
        self.attr(&attributes::RID)
            .expect("request lacked rid")
            .parse()
            .expect("rid was not numeric")
    }

    /// Answer with HTTP 200 and the given body.
    pub fn respond(mut self, body: &ComposableBody) {
        self.fulfill(200, body.to_xml());
    }

    /// Answer with an arbitrary status code.
    pub fn respond_with_status(mut self, status: u16, body: &ComposableBody) {
        self.fulfill(status, body.to_xml());
    }

    /// Fail the exchange at the transport level.
    pub fn fail(mut self, message: &str) {
        if let Some(fulfiller) = self.fulfiller.take() {
            fulfiller.fulfill(Err(Error::Transport(message.to_owned())));
        }
    }

    fn fulfill(&mut self, status: u16, xml: &str) {
        let body = StaticBody::from_xml(xml).expect("stub response must be valid XML");
        if let Some(fulfiller) = self.fulfiller.take() {
            fulfiller.fulfill(Ok(HttpResponse::new(status, body)));
        }
    }
}

/// Scripted connection manager mounted directly on the sender seam: every
/// dispatched request is queued for the test to inspect and answer.
pub struct StubCm {
    queue: Mutex<VecDeque<StubExchange>>,
    arrived: Condvar,
}

impl StubCm {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            arrived: Condvar::new(),
        })
    }

    /// Wait for the next request to arrive.
    pub fn await_request(&self) -> StubExchange {
        let deadline = Instant::now() + AWAIT_TIMEOUT;
        let mut queue = self.queue.lock().unwrap();
        loop {
            if let Some(exchange) = queue.pop_front() {
                return exchange;
            }
            let now = Instant::now();
            assert!(now < deadline, "timed out waiting for a request");
            let (guard, _) = self.arrived.wait_timeout(queue, deadline - now).unwrap();
            queue = guard;
        }
    }

    /// Check for a request without waiting for one.
    pub fn try_take_request(&self) -> Option<StubExchange> {
        self.queue.lock().unwrap().pop_front()
    }
}

impl HttpSender for StubCm {
    fn init(&self, _cfg: &BoshConfig) -> bosh_client::Result<()> {
        Ok(())
    }

    fn destroy(&self) {}

    fn send(&self, _params: Option<&SessionParams>, request: &ComposableBody) -> ResponsePromise {
        let (fulfiller, promise) = ResponsePromise::channel();
        let mut queue = self.queue.lock().unwrap();
        queue.push_back(StubExchange {
            request: request.clone(),
            arrived_at: Instant::now(),
            fulfiller: Some(fulfiller),
        });
        self.arrived.notify_all();
        promise
    }
}

// ============================================================================
// RECORDING LISTENERS
// ============================================================================

/// Connection listener that records every lifecycle event.
pub struct EventRecorder {
    events: Mutex<Vec<ConnectionEvent>>,
    changed: Condvar,
}

impl EventRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            events: Mutex::new(Vec::new()),
            changed: Condvar::new(),
        })
    }

    pub fn events(&self) -> Vec<ConnectionEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Block until at least `count` events were recorded.
    pub fn await_events(&self, count: usize) -> Vec<ConnectionEvent> {
        let deadline = Instant::now() + AWAIT_TIMEOUT;
        let mut events = self.events.lock().unwrap();
        loop {
            if events.len() >= count {
                return events.clone();
            }
            let now = Instant::now();
            assert!(
                now < deadline,
                "timed out waiting for {count} connection events; saw {:?}",
                *events
            );
            let (guard, _) = self.changed.wait_timeout(events, deadline - now).unwrap();
            events = guard;
        }
    }
}

impl ConnectionListener for EventRecorder {
    fn connection_event(&self, event: &ConnectionEvent) {
        let mut events = self.events.lock().unwrap();
        events.push(event.clone());
        self.changed.notify_all();
    }
}

/// Request listener that keeps every request sent, in dispatch order.
pub struct RequestLog {
    requests: Mutex<Vec<ComposableBody>>,
}

impl RequestLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn snapshot(&self) -> Vec<ComposableBody> {
        self.requests.lock().unwrap().clone()
    }
}

impl RequestListener for RequestLog {
    fn request_sent(&self, request: &ComposableBody) {
        self.requests.lock().unwrap().push(request.clone());
    }
}

// ============================================================================
// FIXTURE
// ============================================================================

pub struct Fixture {
    pub client: Arc<BoshClient>,
    pub cm: Arc<StubCm>,
    pub events: Arc<EventRecorder>,
    pub log: Arc<RequestLog>,
}

/// Default configuration: keep-alives pushed far out so scenarios only
/// see the requests they trigger themselves.
pub fn quiet_config() -> BoshConfig {
    BoshConfig::builder(
        Url::parse("http://cm.test:5280/http-bind").unwrap(),
        "domain.test",
    )
    .empty_request_delay(Duration::from_secs(60))
    .build()
}

pub fn setup() -> Fixture {
    setup_with(quiet_config())
}

pub fn setup_with(cfg: BoshConfig) -> Fixture {
    let cm = StubCm::new();
    let client = BoshClient::create_with_sender(cfg, cm.clone()).expect("client creation failed");
    let events = EventRecorder::new();
    client.add_connection_listener(events.clone());
    let log = RequestLog::new();
    client.add_request_listener(log.clone());
    Fixture {
        client,
        cm,
        events,
        log,
    }
}

/// Build a response body from attribute pairs.
pub fn response(pairs: &[(&BodyQName, &str)]) -> ComposableBody {
    let mut builder = ComposableBody::builder();
    for (name, value) in pairs {
        builder = builder.attribute((*name).clone(), *value);
    }
    builder.build()
}

/// Drive session creation: send an empty body, answer the creation
/// request with `creation_response`, and wait until the queue drains.
/// Returns the session creation RID.
pub fn establish(fixture: &Fixture, creation_response: &ComposableBody) -> u64 {
    fixture
        .client
        .send(ComposableBody::builder().build())
        .expect("session creation send failed");
    let creation = fixture.cm.await_request();
    let rid = creation.rid();
    creation.respond(creation_response);
    fixture.client.drain();
    rid
}

// ============================================================================
// REQUEST INVARIANTS
// ============================================================================

/// Check the structural request invariants over a full scenario log:
/// RID sequencing, session creation attributes, attribute hygiene on
/// subsequent requests, well-formedness of every wrapper, and ack
/// suppression when the connection manager did not advertise acking.
pub fn assert_request_invariants(requests: &[ComposableBody], cm_acked: bool) {
    assert!(!requests.is_empty(), "scenario sent no requests");

    const MAX_RID: u64 = 1 << 53;
    const HEADROOM: u64 = 1 << 32;

    let rid_of = |request: &ComposableBody| -> u64 {
        request
            .attribute(&attributes::RID)
            .expect("every request must carry a rid")
            .parse()
            .expect("rid must be numeric")
    };

    let first = &requests[0];
    let first_rid = rid_of(first);
    assert!(first_rid >= 1 && first_rid < MAX_RID - HEADROOM);
    assert!(first.attribute(&attributes::SID).is_none());
    for required in [
        &attributes::TO,
        &attributes::VER,
        &attributes::WAIT,
        &attributes::HOLD,
        &attributes::LANG,
    ] {
        assert!(
            first.attribute(required).is_some(),
            "session creation request lacked '{required}'"
        );
    }
    assert_eq!(first.attribute(&attributes::ACK), Some("1"));

    let mut highest = first_rid;
    let mut seen = vec![first_rid];
    for request in &requests[1..] {
        let rid = rid_of(request);
        if rid == highest + 1 {
            highest = rid;
            seen.push(rid);
        } else {
            // Anything else must be an exact retransmission.
            assert!(
                seen.contains(&rid),
                "rid {rid} is neither sequential (expected {}) nor a resend",
                highest + 1
            );
        }
        assert!(
            request.attribute(&attributes::SID).is_some(),
            "post-creation request lacked sid"
        );
        for forbidden in [
            &attributes::TO,
            &attributes::VER,
            &attributes::WAIT,
            &attributes::HOLD,
            &attributes::LANG,
        ] {
            assert!(
                request.attribute(forbidden).is_none(),
                "post-creation request carried '{forbidden}'"
            );
        }
        if !cm_acked {
            assert!(
                request.attribute(&attributes::ACK).is_none(),
                "client sent an ack although the connection manager does not ack"
            );
        }
    }

    for request in requests {
        StaticBody::from_xml(request.to_xml()).expect("request wrapper must be well-formed");
    }
}
