//! Ordered collection of finalized per-image results.

use serde::Serialize;

use crate::types::{ItemResult, ItemStatus};

/// Counts reported when a run ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Images in the queue when the run started
    pub total: usize,
    /// Images that reached a terminal status
    pub processed: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub errored: usize,
    /// Whether the run ended early on a stop request
    pub stopped: bool,
}

/// Results in processing order. Only grows during a run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ResultSet {
    items: Vec<ItemResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ItemResult) {
        self.items.push(result);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn as_slice(&self) -> &[ItemResult] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of results with the given status.
    pub fn count(&self, status: ItemStatus) -> usize {
        self.items.iter().filter(|r| r.status() == status).count()
    }

    pub fn accepted_count(&self) -> usize {
        self.count(ItemStatus::Accepted)
    }

    /// Accepted results in processing order.
    pub fn accepted(&self) -> impl Iterator<Item = &ItemResult> {
        self.items.iter().filter(|r| r.is_accepted())
    }

    /// Summarize a run over `total` queued images.
    pub fn summary(&self, total: usize, stopped: bool) -> RunSummary {
        RunSummary {
            total,
            processed: self.len(),
            accepted: self.accepted_count(),
            rejected: self.count(ItemStatus::Rejected),
            errored: self.count(ItemStatus::Error),
            stopped,
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a ItemResult;
    type IntoIter = std::slice::Iter<'a, ItemResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
