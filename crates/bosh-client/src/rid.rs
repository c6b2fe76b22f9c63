// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 the bosh-client developers

//! Request identifier sequence.
//!
//! XEP-0124 requires the initial RID to be unpredictable and nonrepeating
//! across sessions, positive, below 2^53, and to leave enough headroom for
//! per-request increments. The initial value is drawn from the system
//! CSPRNG by rejection sampling on a 53-bit mask; every subsequent value
//! is the previous plus one.

use std::sync::atomic::{AtomicU64, Ordering};

use ring::rand::{SecureRandom, SystemRandom};

use crate::attr::{MAX_RID, RID_HEADROOM};
use crate::error::{Error, Result};

/// Strictly increasing request identifier generator, one per session.
#[derive(Debug)]
pub struct RequestIdSequence {
    next: AtomicU64,
}

impl RequestIdSequence {
    /// Create a sequence with a fresh random initial value in
    /// `[1, 2^53 - 2^32)`.
    pub fn new() -> Result<Self> {
        let rng = SystemRandom::new();
        Ok(Self {
            next: AtomicU64::new(initial_value(&rng)?),
        })
    }

    /// Claim the next request identifier.
    pub fn next_rid(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

fn initial_value(rng: &dyn SecureRandom) -> Result<u64> {
    let mut buf = [0u8; 8];
    loop {
        rng.fill(&mut buf)
            .map_err(|_| Error::Internal("system CSPRNG unavailable".into()))?;
        let candidate = u64::from_le_bytes(buf) & (MAX_RID - 1);
        if candidate >= 1 && candidate < MAX_RID - RID_HEADROOM {
            return Ok(candidate);
        }
    }
}
