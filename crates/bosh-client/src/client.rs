// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! The session state machine and request scheduler.
//!
//! One [`BoshClient`] instance represents one session with a remote
//! connection manager. The first `send` dispatches the session creation
//! request; once its response is integrated the session is established
//! and stays live until a termination response arrives, an error disposes
//! of it, or [`BoshClient::close`] is called. A dead client cannot be
//! revived; create a new one to reconnect.
//!
//! # Scheduling model
//!
//! ```text
//!  application ──send()──▶ admission ──▶ exchange queue ──▶ HTTP sender
//!                 (blocks on notFull,         │
//!                  polling pacing)            ▼
//!                                    processor workers (1..=requests)
//!                                     await response, re-lock,
//!                                     integrate acks / errors,
//!                                     reschedule empty request
//! ```
//!
//! A single mutex guards the session core; three condition variables
//! (`not_empty`, `not_full`, `drained`) coordinate workers, senders, and
//! drain waiters. Listener dispatch, HTTP dispatch, and response awaits
//! all happen with the lock released.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, trace, warn};

use crate::attr::{self, SUPPORTED_VERSION};
use crate::body::{
    attributes, is_pause, is_recoverable_error, is_termination, Body, ComposableBody, StaticBody,
};
use crate::config::BoshConfig;
use crate::error::{Error, Result};
use crate::event::{
    ConnectionEvent, ConnectionListener, ListenerSet, RequestListener, ResponseListener,
};
use crate::rid::RequestIdSequence;
use crate::session::ack::AckState;
use crate::session::exchange::Exchange;
use crate::session::{SessionParams, TerminalBindingCondition};
use crate::timer::OneShotTimer;
use crate::transport::HttpSender;

/// How long an idle worker sleeps before re-checking for work or
/// shutdown.
const WORKER_IDLE_WAIT: Duration = Duration::from_millis(250);

/// BOSH client session instance.
///
/// Each communication session with a remote connection manager is
/// represented by one instance of this type. The client handles every
/// BOSH-namespace attribute itself; applications only supply payload
/// content:
///
/// ```no_run
/// use bosh_client::{BoshClient, BoshConfig, ComposableBody};
/// use url::Url;
///
/// # fn main() -> bosh_client::Result<()> {
/// let cfg = BoshConfig::builder(
///     Url::parse("http://server:5280/http-bind").unwrap(),
///     "jabber.org",
/// )
/// .from("user@jabber.org")
/// .build();
/// let client = BoshClient::create(cfg)?;
/// client.send(ComposableBody::builder().build())?;
/// # Ok(())
/// # }
/// ```
///
/// Instances are thread-safe; `send` may block briefly when the
/// connection manager's concurrent-request limit is reached.
pub struct BoshClient {
    cfg: BoshConfig,
    sender: Arc<dyn HttpSender>,
    rids: RequestIdSequence,
    request_listeners: ListenerSet<dyn RequestListener>,
    response_listeners: ListenerSet<dyn ResponseListener>,
    connection_listeners: ListenerSet<dyn ConnectionListener>,
    core: Mutex<SessionCore>,
    not_empty: Condvar,
    not_full: Condvar,
    drained: Condvar,
    timer: OneShotTimer,
}

/// Everything guarded by the session lock.
struct SessionCore {
    /// Claim table for processor workers; `None` once disposed.
    workers: Option<Vec<WorkerSlot>>,
    /// Negotiated parameters; `None` until the session is established.
    params: Option<SessionParams>,
    /// Outstanding exchanges in RID order.
    exchanges: VecDeque<Arc<Exchange>>,
    acks: AckState,
    /// When the previous empty request was dispatched, for polling
    /// pacing.
    last_empty_dispatch: Option<Instant>,
}

struct WorkerSlot {
    claimed: Option<Arc<Exchange>>,
}

impl SessionCore {
    fn working(&self) -> bool {
        self.workers.is_some()
    }

    fn is_claimed(&self, exchange: &Arc<Exchange>) -> bool {
        self.workers.as_ref().map_or(false, |workers| {
            workers.iter().any(|slot| {
                slot.claimed
                    .as_ref()
                    .map_or(false, |claimed| Arc::ptr_eq(claimed, exchange))
            })
        })
    }
}

enum Admission {
    Admit,
    Full,
    Throttled(Instant),
}

enum NextExchange {
    Claimed(Arc<Exchange>),
    Retry,
    Shutdown,
}

impl BoshClient {
    /// Create a new client session using the bundled reqwest transport.
    ///
    /// No connection attempt is made until the first [`send`](Self::send).
    #[cfg(feature = "reqwest-sender")]
    pub fn create(cfg: BoshConfig) -> Result<Arc<Self>> {
        Self::create_with_sender(cfg, Arc::new(crate::transport::ReqwestSender::new()))
    }

    /// Create a new client session on a caller-provided transport.
    pub fn create_with_sender(cfg: BoshConfig, sender: Arc<dyn HttpSender>) -> Result<Arc<Self>> {
        let client = Arc::new(BoshClient {
            cfg,
            sender,
            rids: RequestIdSequence::new()?,
            request_listeners: ListenerSet::new(),
            response_listeners: ListenerSet::new(),
            connection_listeners: ListenerSet::new(),
            core: Mutex::new(SessionCore {
                workers: Some(Vec::new()),
                params: None,
                exchanges: VecDeque::new(),
                acks: AckState::new(),
                last_empty_dispatch: None,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            drained: Condvar::new(),
            timer: OneShotTimer::new(),
        });

        client.sender.init(&client.cfg)?;

        let timer_handle = Arc::downgrade(&client);
        client
            .timer
            .start(
                "bosh-empty-request",
                Box::new(move || {
                    if let Some(client) = timer_handle.upgrade() {
                        client.send_empty_request();
                    }
                }),
            )
            .map_err(|e| Error::Internal(format!("could not start timer thread: {e}")))?;

        let first = client.add_worker_slots(1);
        client.spawn_worker_threads(first)?;
        Ok(client)
    }

    /// The configuration this client was created with.
    #[must_use]
    pub fn config(&self) -> &BoshConfig {
        &self.cfg
    }

    /// The session parameters advertised by the connection manager, once
    /// the session is established.
    #[must_use]
    pub fn session_params(&self) -> Option<SessionParams> {
        self.core.lock().params.clone()
    }

    // ========================================================================
    // LISTENER REGISTRATION
    // ========================================================================

    /// Register an observer of outbound requests.
    pub fn add_request_listener(&self, listener: Arc<dyn RequestListener>) {
        self.request_listeners.add(listener);
    }

    /// Unregister a previously added request listener.
    pub fn remove_request_listener(&self, listener: &Arc<dyn RequestListener>) {
        self.request_listeners.remove(listener);
    }

    /// Register an observer of inbound responses.
    pub fn add_response_listener(&self, listener: Arc<dyn ResponseListener>) {
        self.response_listeners.add(listener);
    }

    /// Unregister a previously added response listener.
    pub fn remove_response_listener(&self, listener: &Arc<dyn ResponseListener>) {
        self.response_listeners.remove(listener);
    }

    /// Register an observer of connection lifecycle events.
    pub fn add_connection_listener(&self, listener: Arc<dyn ConnectionListener>) {
        self.connection_listeners.add(listener);
    }

    /// Unregister a previously added connection listener.
    pub fn remove_connection_listener(&self, listener: &Arc<dyn ConnectionListener>) {
        self.connection_listeners.remove(listener);
    }

    // ========================================================================
    // PUBLIC OPERATIONS
    // ========================================================================

    /// Send payload data to the connection manager.
    ///
    /// The body only needs to carry application payload; every protocol
    /// attribute (`rid`, `sid`, `ack`, session creation attributes) is
    /// applied by the client. The first call opens the session.
    ///
    /// Blocks while the connection manager's concurrent-request limit is
    /// reached, and paces empty bodies in polling mode. Fails with
    /// [`Error::SessionClosed`] when the session is dead and the body is
    /// not a termination.
    pub fn send(&self, body: ComposableBody) -> Result<()> {
        let terminate = is_termination(&body);
        let (exchange, params) = {
            let mut core = self.core.lock();
            self.block_until_sendable(&mut core, &body);
            if !core.working() {
                if terminate {
                    // Nothing left to terminate.
                    return Ok(());
                }
                return Err(Error::SessionClosed);
            }

            let rid = self.rids.next_rid();
            let request = match core.params.as_ref() {
                None => self.apply_session_creation(rid, &body),
                Some(params) => {
                    let request = self.apply_session_data(rid, &body, params, &core.acks);
                    if params.ack_enabled() {
                        core.acks.track_request(request.clone());
                    }
                    request
                }
            };

            // The session creation request does not count against the
            // polling interval.
            if core.params.is_some() && is_empty_body(&body) {
                core.last_empty_dispatch = Some(Instant::now());
            }

            let exchange = Arc::new(Exchange::new(request));
            core.exchanges.push_back(Arc::clone(&exchange));
            self.not_empty.notify_one();
            // A fresh request makes the pending keep-alive redundant.
            self.timer.cancel();
            (exchange, core.params.clone())
        };

        let promise = self.sender.send(params.as_ref(), exchange.request());
        exchange.attach_response(promise);
        self.fire_request_sent(exchange.request());
        Ok(())
    }

    /// End the session by sending an empty termination message.
    pub fn disconnect(&self) -> Result<()> {
        self.disconnect_with(ComposableBody::builder().build())
    }

    /// End the session, delivering `body` as the final payload.
    pub fn disconnect_with(&self, body: ComposableBody) -> Result<()> {
        self.send(body.rebuild().attribute(attributes::TYPE, "terminate").build())
    }

    /// Ask the connection manager to pause the session for its maximum
    /// advertised pause interval.
    ///
    /// Returns `false` when the session is not established or the
    /// connection manager did not advertise `maxpause`.
    pub fn pause(&self) -> bool {
        let maxpause = {
            let core = self.core.lock();
            core.params.as_ref().and_then(SessionParams::maxpause)
        };
        let Some(maxpause) = maxpause else {
            return false;
        };
        let body = ComposableBody::builder()
            .attribute(attributes::PAUSE, maxpause.as_secs().to_string())
            .build();
        if let Err(err) = self.send(body) {
            debug!(%err, "could not send pause request");
        }
        true
    }

    /// Forcibly dispose of the session without sending anything. The
    /// orderly alternative is [`disconnect`](Self::disconnect) followed by
    /// the connection manager's termination response.
    pub fn close(&self) {
        self.dispose(Some(Error::ExplicitlyClosed));
    }

    /// Block until the session is dead, or until the exchange queue has
    /// emptied and an empty request is scheduled but not yet sent. Useful
    /// for tests and orderly shutdown.
    pub fn drain(&self) {
        trace!("waiting while draining");
        let mut core = self.core.lock();
        while core.working() && !self.timer.is_scheduled() {
            self.drained.wait_for(&mut core, Duration::from_millis(250));
        }
        trace!("drained");
    }

    // ========================================================================
    // ADMISSION
    // ========================================================================

    fn block_until_sendable(&self, core: &mut MutexGuard<'_, SessionCore>, body: &ComposableBody) {
        loop {
            if !core.working() {
                return;
            }
            match self.admission(core, body) {
                Admission::Admit => return,
                Admission::Full => {
                    self.not_full.wait(core);
                }
                Admission::Throttled(until) => {
                    self.not_full.wait_until(core, until);
                }
            }
        }
    }

    fn admission(&self, core: &SessionCore, body: &ComposableBody) -> Admission {
        let Some(params) = core.params.as_ref() else {
            // The session creation request must travel alone.
            return if core.exchanges.is_empty() {
                Admission::Admit
            } else {
                Admission::Full
            };
        };

        // Overactive-polling safety: in polling mode, consecutive empty
        // requests must be at least the polling interval apart.
        if is_empty_body(body) && params.effective_requests() <= 1 {
            if let (Some(polling), Some(last)) = (params.polling(), core.last_empty_dispatch) {
                let window_opens = last + polling;
                if Instant::now() < window_opens {
                    return Admission::Throttled(window_opens);
                }
            }
        }

        match params.requests() {
            None => Admission::Admit,
            Some(limit) => {
                let outstanding = core.exchanges.len();
                let limit = limit as usize;
                if outstanding < limit {
                    Admission::Admit
                } else if outstanding == limit && (is_termination(body) || is_pause(body)) {
                    // One additional terminate or pause message is allowed.
                    Admission::Admit
                } else {
                    Admission::Full
                }
            }
        }
    }

    // ========================================================================
    // REQUEST ATTRIBUTES
    // ========================================================================

    fn apply_session_creation(&self, rid: u64, body: &ComposableBody) -> ComposableBody {
        let mut builder = body
            .rebuild()
            .attribute(attributes::TO, self.cfg.to())
            .attribute(attributes::LANG, self.cfg.lang())
            .attribute(attributes::VER, SUPPORTED_VERSION.to_string())
            .attribute(attributes::WAIT, "60")
            .attribute(attributes::HOLD, "1")
            .attribute(attributes::RID, rid.to_string());
        if let Some(route) = self.cfg.route() {
            builder = builder.attribute(attributes::ROUTE, route);
        }
        if let Some(from) = self.cfg.from() {
            builder = builder.attribute(attributes::FROM, from);
        }
        if self.cfg.ack_enabled() {
            builder = builder.attribute(attributes::ACK, "1");
        }
        // Must not linger from a previous session body.
        builder.clear_attribute(&attributes::SID).build()
    }

    fn apply_session_data(
        &self,
        rid: u64,
        body: &ComposableBody,
        params: &SessionParams,
        acks: &AckState,
    ) -> ComposableBody {
        let mut builder = body
            .rebuild()
            .attribute(attributes::SID, params.sid())
            .attribute(attributes::RID, rid.to_string());
        if self.cfg.ack_enabled() && params.ack_enabled() {
            if let Some(ack) = acks.response_ack() {
                // An ack equal to rid - 1 is implicit and omitted.
                if ack != rid - 1 {
                    builder = builder.attribute(attributes::ACK, ack.to_string());
                }
            }
        }
        builder.build()
    }

    // ========================================================================
    // PROCESSOR WORKERS
    // ========================================================================

    fn add_worker_slots(&self, count: usize) -> std::ops::Range<usize> {
        let mut core = self.core.lock();
        let Some(workers) = core.workers.as_mut() else {
            return 0..0;
        };
        let start = workers.len();
        for _ in 0..count {
            workers.push(WorkerSlot { claimed: None });
        }
        start..workers.len()
    }

    fn spawn_worker_threads(self: &Arc<Self>, range: std::ops::Range<usize>) -> Result<()> {
        for idx in range {
            let weak = Arc::downgrade(self);
            thread::Builder::new()
                .name(format!("bosh-processor-{idx}"))
                .spawn(move || worker_loop(&weak, idx))
                .map_err(|e| Error::Internal(format!("could not spawn processor thread: {e}")))?;
        }
        Ok(())
    }

    fn next_exchange(&self, idx: usize) -> NextExchange {
        let mut core = self.core.lock();
        if !core.working() {
            return NextExchange::Shutdown;
        }
        let claim = core
            .exchanges
            .iter()
            .find(|exchange| !core.is_claimed(exchange))
            .cloned();
        match claim {
            Some(exchange) => {
                if let Some(slot) = core
                    .workers
                    .as_mut()
                    .and_then(|workers| workers.get_mut(idx))
                {
                    slot.claimed = Some(Arc::clone(&exchange));
                }
                trace!(
                    idx,
                    rid = exchange.request().attribute(&attributes::RID),
                    "claimed exchange"
                );
                NextExchange::Claimed(exchange)
            }
            None => {
                self.not_empty.wait_for(&mut core, WORKER_IDLE_WAIT);
                NextExchange::Retry
            }
        }
    }

    /// Integrate one completed exchange into session state. Listener
    /// dispatch and resend transmission happen after the lock is
    /// released.
    fn process_exchange(self: &Arc<Self>, idx: usize, exchange: &Arc<Exchange>) {
        let response = match exchange.await_response() {
            Ok(response) => response,
            Err(err) => {
                debug!(idx, %err, "could not obtain response");
                self.dispose(Some(err));
                return;
            }
        };
        let (status, resp_body) = response.into_parts();
        trace!(
            idx,
            status,
            rid = exchange.request().attribute(&attributes::RID),
            ack = resp_body.attribute(&attributes::ACK),
            "received response"
        );
        self.fire_response_received(&resp_body);

        let mut established = false;
        let mut grow = 0..0;
        let mut resends: Vec<Arc<Exchange>> = Vec::new();
        let mut dispose_with: Option<Option<Error>> = None;
        let params_snapshot;
        {
            let mut core = self.core.lock();
            if !core.working() {
                return;
            }

            if core.params.is_none() {
                match SessionParams::from_session_init(exchange.request(), &resp_body) {
                    Ok(params) => {
                        if params.effective_requests() <= 1 && params.hold() == Some(1) {
                            warn!(
                                wait = params.wait().as_secs(),
                                "connection manager allows a single request while holding \
                                 requests; the connection may stall for up to the wait interval"
                            );
                        }
                        let target = params.effective_requests().max(1) as usize;
                        core.params = Some(params);
                        established = true;
                        if let Some(workers) = core.workers.as_mut() {
                            let current = workers.len();
                            for _ in current..target {
                                workers.push(WorkerSlot { claimed: None });
                            }
                            grow = current..workers.len();
                        }
                    }
                    Err(err) => dispose_with = Some(Some(err)),
                }
            }

            if dispose_with.is_none() {
                match self.terminal_binding_condition(&core, status, &resp_body) {
                    Some((condition, message)) => {
                        dispose_with = Some(Some(Error::TerminalBinding { condition, message }));
                    }
                    None if is_termination(&resp_body) => {
                        dispose_with = Some(None);
                    }
                    None if is_recoverable_error(&resp_body) => {
                        // Retransmit every outstanding request, the failed
                        // one included, as fresh exchanges.
                        resends = core
                            .exchanges
                            .iter()
                            .map(|pending| Arc::new(Exchange::new(pending.request().clone())))
                            .collect();
                        core.exchanges.extend(resends.iter().cloned());
                        self.not_empty.notify_all();
                    }
                    None => match self.integrate_ack(&mut core, exchange.request(), &resp_body) {
                        Ok(Some(resend)) => resends.push(resend),
                        Ok(None) => {}
                        Err(err) => dispose_with = Some(Some(err)),
                    },
                }
            }

            if dispose_with.is_none() {
                core.exchanges.retain(|e| !Arc::ptr_eq(e, exchange));
                if let Some(slot) = core
                    .workers
                    .as_mut()
                    .and_then(|workers| workers.get_mut(idx))
                {
                    slot.claimed = None;
                }
                if core.exchanges.is_empty() {
                    self.schedule_empty_request(&core, exchange.request());
                }
                self.not_full.notify_all();
            }
            params_snapshot = core.params.clone();
        }

        if established {
            self.fire_connection_event(&ConnectionEvent::Established);
        }
        if let Some(cause) = dispose_with {
            self.dispose(cause);
            return;
        }
        if let Err(err) = self.spawn_worker_threads(grow) {
            warn!(%err, "could not grow processor pool");
        }
        for resend in resends {
            let promise = self.sender.send(params_snapshot.as_ref(), resend.request());
            resend.attach_response(promise);
            self.fire_request_sent(resend.request());
        }
    }

    // ========================================================================
    // RESPONSE INTEGRATION
    // ========================================================================

    /// Evaluate the response against XEP-0124 §17: an explicit terminal
    /// condition, or a fatal HTTP status from a legacy connection
    /// manager. A plain `type="terminate"` without a condition is a
    /// normal termination and returns `None`.
    fn terminal_binding_condition(
        &self,
        core: &SessionCore,
        status: u16,
        response: &StaticBody,
    ) -> Option<(Option<TerminalBindingCondition>, String)> {
        if is_termination(response) {
            return response.attribute(&attributes::CONDITION).map(|name| {
                match TerminalBindingCondition::from_name(name) {
                    Some(condition) => (Some(condition), condition.to_string()),
                    None => (None, format!("{name} (unrecognized condition)")),
                }
            });
        }
        if let Some(params) = core.params.as_ref() {
            // Legacy CMs signal terminal conditions through HTTP status
            // codes; a versioned CM must use the 'condition' attribute
            // and its status codes are ignored.
            if params.version().is_none() && status != 200 {
                return Some(match TerminalBindingCondition::from_http_status(status) {
                    Some(condition) => {
                        (Some(condition), format!("HTTP response code {status}: {condition}"))
                    }
                    None => (None, format!("HTTP response code {status}")),
                });
            }
        }
        None
    }

    fn integrate_ack(
        &self,
        core: &mut SessionCore,
        request: &ComposableBody,
        response: &StaticBody,
    ) -> Result<Option<Arc<Exchange>>> {
        let request_rid = request
            .attribute(&attributes::RID)
            .map(|text| attr::parse_rid("rid", text))
            .transpose()?
            .ok_or_else(|| Error::Internal("outbound request lacked a rid".into()))?;

        let ack_enabled = core
            .params
            .as_ref()
            .map_or(false, SessionParams::ack_enabled);

        // Request acks (CM -> client). A response carrying a report acks
        // nothing.
        if ack_enabled && response.attribute(&attributes::REPORT).is_none() {
            let ack_up_to = match response.attribute(&attributes::ACK) {
                Some(text) => attr::parse_rid("ack", text)?,
                // Implicit ack of everything up to the responded request.
                None => request_rid,
            };
            trace!(ack_up_to, "removing pending request acks");
            core.acks.acknowledge_up_to(ack_up_to);
        }

        // Response acks (client -> CM).
        core.acks.record_response(request_rid);

        // Ack report: the CM never responded to `report`; retransmit the
        // original request verbatim.
        if let Some(report) = response.attribute(&attributes::REPORT) {
            let report = attr::parse_rid("report", report)?;
            let time = response
                .attribute(&attributes::TIME)
                .map(|text| {
                    text.parse::<u64>().map_err(|_| {
                        Error::Parse(format!("malformed 'time' attribute '{text}'"))
                    })
                })
                .transpose()?;
            debug!(report, ?time, "received report of missing request");

            let request = core
                .acks
                .find_unacknowledged(report)
                .ok_or(Error::AckReportUnresolved(report))?
                .clone();
            let exchange = Arc::new(Exchange::new(request));
            core.exchanges.push_back(Arc::clone(&exchange));
            self.not_empty.notify_one();
            return Ok(Some(exchange));
        }
        Ok(None)
    }

    // ========================================================================
    // EMPTY REQUESTS
    // ========================================================================

    /// Arm the keep-alive timer after the queue ran dry. The delay
    /// honors a granted pause, the polling interval in polling mode, or
    /// the configured default.
    fn schedule_empty_request(&self, core: &SessionCore, completed_request: &ComposableBody) {
        if !core.working() {
            return;
        }
        let delay = self.empty_request_delay(core, completed_request);
        trace!(?delay, "scheduling empty request");
        self.timer.schedule(delay);
        self.drained.notify_all();
    }

    fn empty_request_delay(&self, core: &SessionCore, completed_request: &ComposableBody) -> Duration {
        let Some(params) = core.params.as_ref() else {
            return self.cfg.empty_request_delay();
        };
        if params.maxpause().is_some() {
            match attr::parse_seconds("pause", completed_request.attribute(&attributes::PAUSE)) {
                Ok(Some(pause)) => {
                    return pause
                        .saturating_sub(self.cfg.pause_margin())
                        .max(self.cfg.empty_request_delay());
                }
                Ok(None) => {}
                Err(err) => debug!(%err, "could not read pause attribute of completed request"),
            }
        }
        if params.effective_requests() <= 1 {
            if let Some(polling) = params.polling() {
                return polling;
            }
        }
        self.cfg.empty_request_delay()
    }

    fn send_empty_request(&self) {
        trace!("sending empty request");
        if let Err(err) = self.send(ComposableBody::builder().build()) {
            self.dispose(Some(err));
        }
    }

    // ========================================================================
    // DISPOSAL
    // ========================================================================

    /// Tear the session down. Idempotent; only the first call fires the
    /// connection-closed event.
    fn dispose(&self, cause: Option<Error>) {
        let unacknowledged;
        {
            let mut core = self.core.lock();
            if core.workers.take().is_none() {
                return;
            }
            self.timer.cancel();
            for exchange in core.exchanges.drain(..) {
                exchange.cancel();
            }
            unacknowledged = core.acks.take_unacknowledged();
            core.params = None;
            self.not_empty.notify_all();
            self.not_full.notify_all();
        }

        match cause {
            None => {
                info!("session terminated normally");
                self.fire_connection_event(&ConnectionEvent::Closed);
            }
            Some(err) => {
                info!(%err, "session closed on error");
                self.fire_connection_event(&ConnectionEvent::ClosedOnError {
                    unacknowledged,
                    cause: Arc::new(err),
                });
            }
        }

        {
            let _core = self.core.lock();
            self.drained.notify_all();
        }

        self.sender.destroy();
        self.timer.shutdown();
    }

    // ========================================================================
    // LISTENER DISPATCH
    // ========================================================================

    fn fire_request_sent(&self, request: &ComposableBody) {
        self.request_listeners.dispatch(|l| l.request_sent(request));
    }

    fn fire_response_received(&self, response: &StaticBody) {
        self.response_listeners
            .dispatch(|l| l.response_received(response));
    }

    fn fire_connection_event(&self, event: &ConnectionEvent) {
        self.connection_listeners
            .dispatch(|l| l.connection_event(event));
    }
}

impl Drop for BoshClient {
    fn drop(&mut self) {
        {
            let mut core = self.core.lock();
            if core.workers.take().is_some() {
                for exchange in core.exchanges.drain(..) {
                    exchange.cancel();
                }
            }
        }
        self.sender.destroy();
        self.timer.shutdown();
    }
}

fn worker_loop(weak: &Weak<BoshClient>, idx: usize) {
    trace!(idx, "processor starting");
    loop {
        // Hold a strong reference only while actively working so a
        // dropped client can wind down.
        let Some(client) = weak.upgrade() else { break };
        match client.next_exchange(idx) {
            NextExchange::Shutdown => break,
            NextExchange::Retry => continue,
            NextExchange::Claimed(exchange) => client.process_exchange(idx, &exchange),
        }
    }
    trace!(idx, "processor exiting");
}

/// An empty body is a bare keep-alive: no payload, no termination, no
/// pause request. Only these are paced in polling mode.
fn is_empty_body(body: &ComposableBody) -> bool {
    body.payload().is_empty() && !is_termination(body) && !is_pause(body)
}
