use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::render::DisplaySurface;
use crate::types::DisplayTarget;

/// Wraps a display so that a slow response can never overwrite a newer one.
///
/// Each check invocation draws a sequence number before it fetches. A write is
/// forwarded only if its sequence is >= the last one applied to that target.
/// Equal sequences are accepted so one invocation may write a target twice.
pub struct SequencedDisplay<D> {
    inner: Arc<D>,
    next: AtomicU64,
    /// target → sequence of the last forwarded write
    applied: DashMap<DisplayTarget, u64>,
}

impl<D: DisplaySurface> SequencedDisplay<D> {
    pub fn new(inner: Arc<D>) -> Self {
        Self { inner, next: AtomicU64::new(0), applied: DashMap::new() }
    }

    pub fn next_seq(&self) -> u64 {
        self.next.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn interface_rows(&self) -> Vec<String> {
        self.inner.interface_rows()
    }

    /// Returns false when the write was discarded as stale.
    pub fn render(&self, target: &DisplayTarget, text: &str, seq: u64) -> bool {
        // The entry guard is held across the inner write so that two writers
        // for the same target apply in sequence order.
        match self.applied.entry(target.clone()) {
            Entry::Occupied(mut entry) => {
                if seq < *entry.get() {
                    debug!(display_target = %target, seq, latest = *entry.get(), "discarding stale write");
                    return false;
                }
                entry.insert(seq);
                self.inner.render(target, text);
            }
            Entry::Vacant(entry) => {
                let _guard = entry.insert(seq);
                self.inner.render(target, text);
            }
        }
        true
    }

    /// Drops sequence state for interface rows no longer on the display.
    pub fn forget_removed_rows(&self, rows: &[String]) {
        self.applied.retain(|target, _| match target {
            DisplayTarget::Interface { id, .. } => rows.contains(id),
            _ => true,
        });
    }

    pub fn inner(&self) -> &Arc<D> {
        &self.inner
    }

    #[cfg(test)]
    pub fn tracked_targets(&self) -> usize {
        self.applied.len()
    }
}
