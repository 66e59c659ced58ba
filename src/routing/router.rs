//! Host lookup and dispatch.
//!
//! # Responsibilities
//! - Store one handler per host pattern
//! - Look up the handler for a request host
//! - Return the matched handler or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) exact host lookup via HashMap
//! - O(n) wildcard scan, longest suffix first, using [`HostPattern::matches`]
//! - Explicit None rather than silent default; `*` is the only catch-all

use std::cmp::Reverse;
use std::collections::HashMap;

use crate::routing::matcher::{split_host_port, HostPattern};

/// Maps host patterns to handlers.
#[derive(Debug, Clone)]
pub struct HostRouter<T> {
    exact: HashMap<String, T>,
    /// Sorted by suffix length, longest first.
    wildcards: Vec<(HostPattern, T)>,
    fallback: Option<T>,
}

impl<T> Default for HostRouter<T> {
    fn default() -> Self {
        Self {
            exact: HashMap::new(),
            wildcards: Vec::new(),
            fallback: None,
        }
    }
}

impl<T> HostRouter<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. A later registration for the same pattern
    /// replaces the earlier one.
    pub fn insert(&mut self, pattern: HostPattern, handler: T) {
        match pattern {
            HostPattern::Exact(host) => {
                self.exact.insert(host, handler);
            }
            wildcard @ HostPattern::Wildcard(_) => {
                if let Some(slot) = self.wildcards.iter_mut().find(|(p, _)| *p == wildcard) {
                    slot.1 = handler;
                } else {
                    self.wildcards.push((wildcard, handler));
                    self.wildcards
                        .sort_by_key(|(pattern, _)| Reverse(pattern.to_string().len()));
                }
            }
            HostPattern::Any => self.fallback = Some(handler),
        }
    }

    /// Find the handler for a normalized request host.
    ///
    /// Order: exact `host:port`, exact host, longest wildcard, catch-all.
    /// The exact map is an index over [`HostPattern::Exact`]; both forms
    /// it tries are the ones that pattern accepts.
    pub fn lookup(&self, host: &str) -> Option<&T> {
        if let Some(handler) = self.exact.get(host) {
            return Some(handler);
        }

        let (name, port) = split_host_port(host);
        if port.is_some() {
            if let Some(handler) = self.exact.get(name) {
                return Some(handler);
            }
        }

        self.wildcards
            .iter()
            .find(|(pattern, _)| pattern.matches(host))
            .map(|(_, handler)| handler)
            .or(self.fallback.as_ref())
    }

    /// Number of registered patterns.
    pub fn len(&self) -> usize {
        self.exact.len() + self.wildcards.len() + usize::from(self.fallback.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
