// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Bundled HTTP transport backed by reqwest's blocking client.
//!
//! Each dispatch runs on a short-lived thread that fulfils the exchange's
//! promise, so `send` never blocks the scheduler. The connection pool
//! inside the reqwest client provides keep-alive across requests; no
//! session-level protocol state is kept here.

use std::io::Write;
use std::thread;

use flate2::write::GzEncoder;
use flate2::Compression;
use parking_lot::Mutex;
use tracing::{debug, warn};
use url::Url;

use super::{HttpResponse, HttpSender, ResponsePromise};
use crate::body::{Body, ComposableBody, StaticBody};
use crate::config::BoshConfig;
use crate::error::{Error, Result};
use crate::session::SessionParams;

const CONTENT_TYPE_XML: &str = "text/xml; charset=utf-8";

#[derive(Clone)]
struct SenderState {
    client: reqwest::blocking::Client,
    url: Url,
    compression: bool,
}

/// [`HttpSender`] implementation on top of `reqwest::blocking`.
#[derive(Default)]
pub struct ReqwestSender {
    state: Mutex<Option<SenderState>>,
}

impl ReqwestSender {
    /// Create an uninitialized sender; [`HttpSender::init`] prepares it.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl HttpSender for ReqwestSender {
    fn init(&self, cfg: &BoshConfig) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| Error::Transport(format!("could not build HTTP client: {e}")))?;
        *self.state.lock() = Some(SenderState {
            client,
            url: cfg.url().clone(),
            compression: cfg.compression_enabled(),
        });
        Ok(())
    }

    fn destroy(&self) {
        *self.state.lock() = None;
    }

    fn send(&self, params: Option<&SessionParams>, request: &ComposableBody) -> ResponsePromise {
        let Some(state) = self.state.lock().clone() else {
            return ResponsePromise::ready(Err(Error::Transport(
                "HTTP sender is not initialized".into(),
            )));
        };

        // Compress the request body only once the CM has agreed to
        // decode gzip on requests.
        let gzip_request = state.compression
            && params
                .and_then(SessionParams::accept)
                .map_or(false, |accept| accept.is_accepted("gzip"));
        let xml = request.to_xml().to_owned();

        let (fulfiller, promise) = ResponsePromise::channel();
        let spawned = thread::Builder::new()
            .name("bosh-http-dispatch".to_owned())
            .spawn(move || {
                let result = dispatch(&state, xml, gzip_request);
                if let Err(err) = &result {
                    debug!(%err, "HTTP dispatch failed");
                }
                fulfiller.fulfill(result);
            });
        if let Err(err) = spawned {
            warn!(%err, "could not spawn HTTP dispatch thread");
            return ResponsePromise::ready(Err(Error::Transport(format!(
                "could not spawn HTTP dispatch thread: {err}"
            ))));
        }
        promise
    }
}

fn dispatch(state: &SenderState, xml: String, gzip_request: bool) -> Result<HttpResponse> {
    let mut builder = state
        .client
        .post(state.url.clone())
        .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE_XML);

    // Setting Accept-Encoding explicitly disables reqwest's automatic
    // response decoding, so the offer is only customized to opt *out*.
    if !state.compression {
        builder = builder.header(reqwest::header::ACCEPT_ENCODING, "identity");
    }

    let body = if gzip_request {
        builder = builder.header(reqwest::header::CONTENT_ENCODING, "gzip");
        gzip(xml.as_bytes())?
    } else {
        xml.into_bytes()
    };

    // A Vec body carries a known Content-Length; the request is never
    // sent with chunked transfer coding.
    let response = builder
        .body(body)
        .send()
        .map_err(|e| Error::Transport(format!("HTTP request failed: {e}")))?;

    let status = response.status().as_u16();
    let text = response
        .text()
        .map_err(|e| Error::Transport(format!("could not read HTTP response: {e}")))?;
    Ok(HttpResponse::new(status, StaticBody::from_xml(text)?))
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|e| Error::Transport(format!("could not compress request body: {e}")))
}
