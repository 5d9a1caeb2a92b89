//! Live record merging for a paginated table
//!
//! A [`LivePage`] keeps two layers:
//! - the confirmed page: the last query result, never modified by live records
//! - the visible page: the confirmed page with pushed records spliced in at the front
//!
//! Applying a new query result replaces both layers wholesale.

use std::{collections::VecDeque, sync::Arc};

/// Current page of a table with live records merged in.
#[derive(Debug, Clone)]
pub struct LivePage<R> {
    confirmed: Arc<[R]>,
    visible: VecDeque<R>,
    limit: usize,
    merged: usize,
}

impl<R: Clone> LivePage<R> {
    /// Create an empty page holding at most `limit` visible records (minimum 1).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            confirmed: Arc::from(Vec::new()),
            visible: VecDeque::with_capacity(limit),
            limit,
            merged: 0,
        }
    }

    /// Replace both layers with a freshly confirmed query result.
    pub fn confirm(&mut self, records: Vec<R>) {
        self.visible = records.iter().cloned().collect();
        self.confirmed = Arc::from(records);
        self.merged = 0;
    }

    /// Prepend a pushed record to the visible page, dropping the tail to keep at most `limit`
    /// records.
    pub fn merge(&mut self, record: R) {
        self.visible.push_front(record);
        self.visible.truncate(self.limit);
        self.merged += 1;
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    /// Records from the last applied query result.
    pub fn confirmed(&self) -> &[R] {
        &self.confirmed
    }

    /// Records as displayed, most recent first.
    pub fn visible(&self) -> impl Iterator<Item = &R> {
        self.visible.iter()
    }

    /// Number of live records merged since the last confirmed result.
    pub fn merged(&self) -> usize {
        self.merged
    }

    /// Check if the visible page diverges from the confirmed page.
    pub fn is_patched(&self) -> bool {
        self.merged > 0
    }

    /// Owned copy of the visible page.
    pub fn to_vec(&self) -> Vec<R> {
        self.visible.iter().cloned().collect()
    }
}
