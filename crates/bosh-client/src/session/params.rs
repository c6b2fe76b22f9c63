// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Connection-manager session parameters.
//!
//! Populated exactly once, from the first successful request/response
//! exchange. Everything the connection manager advertises that bounds
//! client behavior lives here.

use std::time::Duration;

use crate::attr::{self, Accept, Version};
use crate::body::{attributes, Body};
use crate::error::{Error, Result};

/// Session parameters parsed from the session creation response.
#[derive(Debug, Clone)]
pub struct SessionParams {
    sid: String,
    wait: Duration,
    version: Option<Version>,
    polling: Option<Duration>,
    inactivity: Option<Duration>,
    requests: Option<u32>,
    hold: Option<u32>,
    accept: Option<Accept>,
    maxpause: Option<Duration>,
    charsets: Option<String>,
    ack_enabled: bool,
}

impl SessionParams {
    /// Parse session parameters from the session creation request and its
    /// response.
    ///
    /// Fails with [`Error::Protocol`] when the response lacks the required
    /// `sid` or `wait` attributes, and with [`Error::Parse`] when any
    /// advertised attribute is malformed.
    pub fn from_session_init(request: &dyn Body, response: &dyn Body) -> Result<Self> {
        let sid = response
            .attribute(&attributes::SID)
            .ok_or_else(|| missing("sid"))?
            .to_owned();
        let wait = attr::parse_seconds("wait", response.attribute(&attributes::WAIT))?
            .ok_or_else(|| missing("wait"))?;

        // The CM acknowledges requests iff its first response echoes the
        // session creation RID in 'ack'. Any other (parseable) value
        // means it will not ack.
        let creation_rid = request
            .attribute(&attributes::RID)
            .map(|text| attr::parse_rid("rid", text))
            .transpose()?;
        let ack_enabled = match response.attribute(&attributes::ACK) {
            Some(text) => {
                let acked = attr::parse_rid("ack", text)?;
                creation_rid == Some(acked)
            }
            None => false,
        };

        Ok(Self {
            sid,
            wait,
            version: Version::parse(response.attribute(&attributes::VER))?,
            polling: attr::parse_seconds("polling", response.attribute(&attributes::POLLING))?,
            inactivity: attr::parse_seconds(
                "inactivity",
                response.attribute(&attributes::INACTIVITY),
            )?,
            requests: attr::parse_count("requests", response.attribute(&attributes::REQUESTS))?,
            hold: attr::parse_count("hold", response.attribute(&attributes::HOLD))?,
            accept: Accept::parse(response.attribute(&attributes::ACCEPT))?,
            maxpause: attr::parse_seconds("maxpause", response.attribute(&attributes::MAXPAUSE))?,
            charsets: response
                .attribute(&attributes::CHARSETS)
                .map(str::to_owned),
            ack_enabled,
        })
    }

    /// Opaque session identifier.
    #[must_use]
    pub fn sid(&self) -> &str {
        &self.sid
    }

    /// Maximum time the connection manager may hold a request.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.wait
    }

    /// Protocol version advertised by the connection manager; `None`
    /// marks a legacy (pre-1.6) connection manager.
    #[must_use]
    pub fn version(&self) -> Option<Version> {
        self.version
    }

    /// Minimum interval between two empty requests.
    #[must_use]
    pub fn polling(&self) -> Option<Duration> {
        self.polling
    }

    /// Maximum time the client may stay silent.
    #[must_use]
    pub fn inactivity(&self) -> Option<Duration> {
        self.inactivity
    }

    /// Maximum number of concurrent requests, as advertised. Absent means
    /// the connection manager imposes no limit on in-flight requests.
    #[must_use]
    pub fn requests(&self) -> Option<u32> {
        self.requests
    }

    /// Number of requests the connection manager keeps on hold.
    #[must_use]
    pub fn hold(&self) -> Option<u32> {
        self.hold
    }

    /// Content encodings the connection manager will decode on requests.
    #[must_use]
    pub fn accept(&self) -> Option<&Accept> {
        self.accept.as_ref()
    }

    /// Upper bound on a requested pause, when pausing is supported.
    #[must_use]
    pub fn maxpause(&self) -> Option<Duration> {
        self.maxpause
    }

    /// Character sets advertised by the connection manager, relayed
    /// opaquely.
    #[must_use]
    pub fn charsets(&self) -> Option<&str> {
        self.charsets.as_deref()
    }

    /// True when the connection manager acknowledges requests.
    #[must_use]
    pub fn ack_enabled(&self) -> bool {
        self.ack_enabled
    }

    /// The concurrent-request count used for pacing decisions and worker
    /// sizing when the connection manager omitted `requests`: two for a
    /// versioned connection manager, one for a legacy one.
    #[must_use]
    pub fn effective_requests(&self) -> u32 {
        self.requests
            .unwrap_or(if self.version.is_none() { 1 } else { 2 })
    }
}

fn missing(attr: &str) -> Error {
    Error::Protocol(format!(
        "session creation response did not include required '{attr}' attribute"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ComposableBody;

    fn creation_request(rid: u64) -> ComposableBody {
        ComposableBody::builder()
            .attribute(attributes::RID, rid.to_string())
            .attribute(attributes::TO, "server.test")
            .build()
    }

    fn response(pairs: &[(&crate::body::BodyQName, &str)]) -> ComposableBody {
        let mut builder = ComposableBody::builder();
        for (name, value) in pairs {
            builder = builder.attribute((*name).clone(), *value);
        }
        builder.build()
    }

    #[test]
    fn test_full_parse() {
        let req = creation_request(100);
        let resp = response(&[
            (&attributes::SID, "s1"),
            (&attributes::WAIT, "60"),
            (&attributes::VER, "1.8"),
            (&attributes::POLLING, "5"),
            (&attributes::INACTIVITY, "30"),
            (&attributes::REQUESTS, "2"),
            (&attributes::HOLD, "1"),
            (&attributes::ACCEPT, "deflate,gzip"),
            (&attributes::MAXPAUSE, "120"),
            (&attributes::ACK, "100"),
        ]);
        let params = SessionParams::from_session_init(&req, &resp).unwrap();
        assert_eq!(params.sid(), "s1");
        assert_eq!(params.wait(), Duration::from_secs(60));
        assert_eq!(params.version().unwrap().to_string(), "1.8");
        assert_eq!(params.polling(), Some(Duration::from_secs(5)));
        assert_eq!(params.inactivity(), Some(Duration::from_secs(30)));
        assert_eq!(params.requests(), Some(2));
        assert_eq!(params.hold(), Some(1));
        assert!(params.accept().unwrap().is_accepted("gzip"));
        assert_eq!(params.maxpause(), Some(Duration::from_secs(120)));
        assert!(params.ack_enabled());
    }

    #[test]
    fn test_missing_sid_or_wait() {
        let req = creation_request(1);
        let no_sid = response(&[(&attributes::WAIT, "60")]);
        assert!(matches!(
            SessionParams::from_session_init(&req, &no_sid),
            Err(Error::Protocol(_))
        ));

        let no_wait = response(&[(&attributes::SID, "s1")]);
        assert!(matches!(
            SessionParams::from_session_init(&req, &no_wait),
            Err(Error::Protocol(_))
        ));
    }

    #[test]
    fn test_malformed_numeric() {
        let req = creation_request(1);
        let resp = response(&[
            (&attributes::SID, "s1"),
            (&attributes::WAIT, "60"),
            (&attributes::REQUESTS, "two"),
        ]);
        assert!(matches!(
            SessionParams::from_session_init(&req, &resp),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_ack_flag_detection() {
        let req = creation_request(42);

        let echoed = response(&[
            (&attributes::SID, "s"),
            (&attributes::WAIT, "60"),
            (&attributes::ACK, "42"),
        ]);
        assert!(SessionParams::from_session_init(&req, &echoed)
            .unwrap()
            .ack_enabled());

        // A mismatched ack means the CM will not acknowledge requests.
        let mismatched = response(&[
            (&attributes::SID, "s"),
            (&attributes::WAIT, "60"),
            (&attributes::ACK, "41"),
        ]);
        assert!(!SessionParams::from_session_init(&req, &mismatched)
            .unwrap()
            .ack_enabled());

        let absent = response(&[(&attributes::SID, "s"), (&attributes::WAIT, "60")]);
        assert!(!SessionParams::from_session_init(&req, &absent)
            .unwrap()
            .ack_enabled());

        let malformed = response(&[
            (&attributes::SID, "s"),
            (&attributes::WAIT, "60"),
            (&attributes::ACK, "not-a-rid"),
        ]);
        assert!(SessionParams::from_session_init(&req, &malformed).is_err());
    }

    #[test]
    fn test_effective_requests_defaults() {
        let req = creation_request(1);

        let versioned = response(&[
            (&attributes::SID, "s"),
            (&attributes::WAIT, "60"),
            (&attributes::VER, "1.8"),
        ]);
        assert_eq!(
            SessionParams::from_session_init(&req, &versioned)
                .unwrap()
                .effective_requests(),
            2
        );

        let legacy = response(&[(&attributes::SID, "s"), (&attributes::WAIT, "60")]);
        assert_eq!(
            SessionParams::from_session_init(&req, &legacy)
                .unwrap()
                .effective_requests(),
            1
        );

        let explicit = response(&[
            (&attributes::SID, "s"),
            (&attributes::WAIT, "60"),
            (&attributes::REQUESTS, "4"),
        ]);
        assert_eq!(
            SessionParams::from_session_init(&req, &explicit)
                .unwrap()
                .effective_requests(),
            4
        );
    }
}
