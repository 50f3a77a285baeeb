// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cooperative cancellation for long parses.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A clonable flag a caller can trip to abandon an in-flight parse.
///
/// The parser checks the token before each file read and at coarse
/// iteration boundaries; once tripped, the parse returns a cancellation
/// error and partial state is discarded.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A fresh, untripped token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// `true` once [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
