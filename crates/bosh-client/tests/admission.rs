// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Concurrent-request admission: the advertised `requests` limit caps
//! outstanding exchanges, with one slot of slack for terminate and pause
//! messages.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use bosh_client::{attributes, ComposableBody};
use common::{establish, response, setup};

#[test]
fn send_blocks_at_request_limit_and_terminate_bypasses() {
    let fixture = setup();
    establish(
        &fixture,
        &response(&[
            (&attributes::SID, "X"),
            (&attributes::WAIT, "1"),
            (&attributes::REQUESTS, "2"),
            (&attributes::INACTIVITY, "5"),
        ]),
    );

    // Fill both request slots.
    for _ in 0..2 {
        fixture
            .client
            .send(ComposableBody::builder().build())
            .unwrap();
    }
    let first = fixture.cm.await_request();
    let second = fixture.cm.await_request();

    // A third send must block until one of the outstanding responses
    // arrives.
    let blocked_done = Arc::new(AtomicBool::new(false));
    let blocked_flag = Arc::clone(&blocked_done);
    let blocked_client = Arc::clone(&fixture.client);
    let blocked = thread::spawn(move || {
        let result = blocked_client.send(ComposableBody::builder().build());
        blocked_flag.store(true, Ordering::SeqCst);
        result
    });

    thread::sleep(Duration::from_millis(400));
    assert!(
        !blocked_done.load(Ordering::SeqCst),
        "third send did not block at the request limit"
    );

    // Termination gets the extra slot and must not block.
    fixture.client.disconnect().unwrap();
    let terminate = fixture.cm.await_request();
    assert_eq!(terminate.attr(&attributes::TYPE).as_deref(), Some("terminate"));
    assert!(
        !blocked_done.load(Ordering::SeqCst),
        "regular send overtook the slack slot"
    );

    // Freeing two slots admits the blocked sender.
    first.respond(&response(&[(&attributes::SID, "X")]));
    second.respond(&response(&[(&attributes::SID, "X")]));
    blocked.join().unwrap().unwrap();
    let third = fixture.cm.await_request();
    assert!(third.attr(&attributes::TYPE).is_none());
    third.respond(&response(&[(&attributes::SID, "X")]));

    terminate.respond(&response(&[(&attributes::TYPE, "terminate")]));
    fixture.events.await_events(2);
    common::assert_request_invariants(&fixture.log.snapshot(), false);
}

#[test]
fn pause_request_uses_slack_slot() {
    let fixture = setup();
    establish(
        &fixture,
        &response(&[
            (&attributes::SID, "X"),
            (&attributes::WAIT, "1"),
            (&attributes::REQUESTS, "1"),
            (&attributes::MAXPAUSE, "120"),
        ]),
    );

    // Occupy the single slot.
    fixture
        .client
        .send(ComposableBody::builder().payload_xml("<m/>").build())
        .unwrap();
    let first = fixture.cm.await_request();

    // pause() rides the slack slot instead of blocking.
    assert!(fixture.client.pause());
    let pause = fixture.cm.await_request();
    assert_eq!(pause.attr(&attributes::PAUSE).as_deref(), Some("120"));

    first.respond(&response(&[(&attributes::SID, "X")]));
    pause.respond(&response(&[(&attributes::SID, "X")]));
    fixture.client.close();
}

#[test]
fn pause_unsupported_without_maxpause() {
    let fixture = setup();
    establish(
        &fixture,
        &response(&[(&attributes::SID, "X"), (&attributes::WAIT, "1")]),
    );
    assert!(!fixture.client.pause());
    assert!(fixture.cm.try_take_request().is_none());
    fixture.client.close();
}

#[test]
fn session_creation_travels_alone() {
    let fixture = setup();
    fixture
        .client
        .send(ComposableBody::builder().build())
        .unwrap();

    // Until the creation response arrives, further sends must queue
    // behind it.
    let second_done = Arc::new(AtomicBool::new(false));
    let second_flag = Arc::clone(&second_done);
    let second_client = Arc::clone(&fixture.client);
    let second = thread::spawn(move || {
        let result = second_client.send(ComposableBody::builder().payload_xml("<m/>").build());
        second_flag.store(true, Ordering::SeqCst);
        result
    });

    thread::sleep(Duration::from_millis(300));
    assert!(
        !second_done.load(Ordering::SeqCst),
        "send overlapped the session creation request"
    );

    let creation = fixture.cm.await_request();
    creation.respond(&response(&[(&attributes::SID, "X"), (&attributes::WAIT, "1")]));

    second.join().unwrap().unwrap();
    let payload = fixture.cm.await_request();
    assert_eq!(payload.attr(&attributes::SID).as_deref(), Some("X"));
    payload.respond(&response(&[(&attributes::SID, "X")]));
    fixture.client.close();
}
