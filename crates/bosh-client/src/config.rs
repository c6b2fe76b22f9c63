// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Client session configuration.
//!
//! A [`BoshConfig`] is immutable once built and describes one session:
//! where the connection manager lives, who the client is, and the two
//! pacing tunables the scheduler honors.

use std::time::Duration;

use url::Url;

/// Delay before an empty keep-alive request when the queue runs dry.
pub const DEFAULT_EMPTY_REQUEST_DELAY: Duration = Duration::from_millis(100);

/// Safety margin reserved when scheduling an empty request against a
/// granted pause, covering message build and transit time.
pub const DEFAULT_PAUSE_MARGIN: Duration = Duration::from_millis(500);

/// Configuration for one BOSH client session.
#[derive(Debug, Clone)]
pub struct BoshConfig {
    url: Url,
    to: String,
    from: Option<String>,
    lang: String,
    route: Option<String>,
    ack_enabled: bool,
    compression_enabled: bool,
    empty_request_delay: Duration,
    pause_margin: Duration,
}

impl BoshConfig {
    /// Start building a configuration for the connection manager at
    /// `url`, targeting the domain `to`.
    #[must_use]
    pub fn builder(url: Url, to: impl Into<String>) -> BoshConfigBuilder {
        BoshConfigBuilder {
            cfg: BoshConfig {
                url,
                to: to.into(),
                from: None,
                lang: "en".to_owned(),
                route: None,
                ack_enabled: true,
                compression_enabled: false,
                empty_request_delay: DEFAULT_EMPTY_REQUEST_DELAY,
                pause_margin: DEFAULT_PAUSE_MARGIN,
            },
        }
    }

    /// Connection manager endpoint.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Target domain of the first stream (`to` attribute).
    #[must_use]
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Originating identity (`from` attribute), if configured.
    #[must_use]
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Default language of the stream (`xml:lang` attribute).
    #[must_use]
    pub fn lang(&self) -> &str {
        &self.lang
    }

    /// Proxy routing target (`route` attribute), if configured.
    #[must_use]
    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    /// Whether the client requests acknowledgements (`ack="1"` on the
    /// session creation request).
    #[must_use]
    pub fn ack_enabled(&self) -> bool {
        self.ack_enabled
    }

    /// Whether the sender may offer and apply content encodings.
    #[must_use]
    pub fn compression_enabled(&self) -> bool {
        self.compression_enabled
    }

    /// Delay before an empty request once the queue runs dry.
    #[must_use]
    pub fn empty_request_delay(&self) -> Duration {
        self.empty_request_delay
    }

    /// Safety margin applied when scheduling against a granted pause.
    #[must_use]
    pub fn pause_margin(&self) -> Duration {
        self.pause_margin
    }
}

/// Builder for [`BoshConfig`].
#[derive(Debug)]
pub struct BoshConfigBuilder {
    cfg: BoshConfig,
}

impl BoshConfigBuilder {
    /// Set the originating identity (`from` attribute).
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.cfg.from = Some(from.into());
        self
    }

    /// Override the stream language (`xml:lang`, default `"en"`).
    #[must_use]
    pub fn lang(mut self, lang: impl Into<String>) -> Self {
        self.cfg.lang = lang.into();
        self
    }

    /// Set the proxy routing target (`route` attribute), e.g.
    /// `xmpp:server.example:9999`.
    #[must_use]
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.cfg.route = Some(route.into());
        self
    }

    /// Enable or disable client-side request acknowledgements
    /// (default enabled).
    #[must_use]
    pub fn ack_enabled(mut self, enabled: bool) -> Self {
        self.cfg.ack_enabled = enabled;
        self
    }

    /// Enable or disable content-encoding negotiation (default disabled).
    #[must_use]
    pub fn compression_enabled(mut self, enabled: bool) -> Self {
        self.cfg.compression_enabled = enabled;
        self
    }

    /// Override the empty-request delay (default 100 ms).
    #[must_use]
    pub fn empty_request_delay(mut self, delay: Duration) -> Self {
        self.cfg.empty_request_delay = delay;
        self
    }

    /// Override the pause safety margin (default 500 ms).
    #[must_use]
    pub fn pause_margin(mut self, margin: Duration) -> Self {
        self.cfg.pause_margin = margin;
        self
    }

    /// Finish building.
    #[must_use]
    pub fn build(self) -> BoshConfig {
        self.cfg
    }
}
