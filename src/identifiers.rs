//! Identifier providers.
//!
//! Every duplicated task, and the new graph or group as a whole, gets an id
//! from an injected [`IdentifierProvider`] so that tests can pin ids down.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

pub trait IdentifierProvider: Send + Sync {
    /// Return a fresh identifier, distinct from every previous one
    fn generate(&self) -> String;
}

/// 22-character URL-safe base64 encoding of a random v4 UUID, the scheduler's
/// native task id format
#[derive(Debug, Clone, Copy, Default)]
pub struct SlugIdProvider;

impl IdentifierProvider for SlugIdProvider {
    fn generate(&self) -> String {
        URL_SAFE_NO_PAD.encode(Uuid::new_v4().as_bytes())
    }
}

/// Deterministic `{prefix}{n}` identifiers, starting at 1
#[derive(Debug)]
pub struct SequentialIdProvider {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdProvider {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdentifierProvider for SequentialIdProvider {
    fn generate(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{}", self.prefix, n)
    }
}
