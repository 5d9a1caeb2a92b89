//! Filtered pagination controller
//!
//! [`PaginatedView`] owns the filter set, the page descriptor and the current page of one table.
//! Every mutation that requires fresh data returns a [`PageRequest`] stamped with a monotonically
//! increasing [`RequestToken`]; the caller dispatches it and feeds the result back through
//! [`PaginatedView::apply`]. Only the response to the most recently issued request is applied,
//! so an older response resolving late can never overwrite newer state.

use crate::shared::{
    error::DashboardError,
    live::LivePage,
    types::{Direction, PageRecord},
};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

/// Wire format of filter dates
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Server-side filters; `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSet {
    pub direction: Option<Direction>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl FilterSet {
    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Direction(direction) => self.direction = direction,
            FilterUpdate::StartDate(date) => self.start_date = date,
            FilterUpdate::EndDate(date) => self.end_date = date,
        }
    }

    /// Check if no field is constrained
    pub fn is_empty(&self) -> bool {
        self.direction.is_none() && self.start_date.is_none() && self.end_date.is_none()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Mutation of a single [`FilterSet`] field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate {
    Direction(Option<Direction>),
    StartDate(Option<NaiveDate>),
    EndDate(Option<NaiveDate>),
}

/// Position within the server-side result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageDescriptor {
    /// 1-based page number, always within `1..=max(total_pages, 1)`
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub total_records: u64,
}

impl PageDescriptor {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            total_pages: 0,
            total_records: 0,
        }
    }

    /// Highest selectable page. An empty result set still has one (empty) page.
    pub fn max_page(&self) -> u32 {
        self.total_pages.max(1)
    }

    pub fn contains(&self, page: u32) -> bool {
        (1..=self.max_page()).contains(&page)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.max_page()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Identifies an issued query; strictly increasing per [`PaginatedView`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(pub u64);

/// A query the controller wants dispatched to the request layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub token: RequestToken,
    pub filters: FilterSet,
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Query string parameters: unconstrained filters are sent as empty strings, `strength` and
    /// `price` are reserved and always sent empty / zero.
    pub fn params(&self) -> QueryParams {
        let format_date = |date: Option<NaiveDate>| {
            date.map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        };

        QueryParams {
            start_date: format_date(self.filters.start_date),
            end_date: format_date(self.filters.end_date),
            strength: String::new(),
            price: 0,
            page: self.page,
            limit: self.limit,
            direction: self
                .filters
                .direction
                .as_ref()
                .map(|direction| direction.as_str().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Serialised query string of a [`PageRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub start_date: String,
    pub end_date: String,
    pub strength: String,
    pub price: u32,
    pub page: u32,
    pub limit: u32,
    pub direction: String,
}

/// One page of results returned by the request layer.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage<R> {
    pub records: Vec<R>,
    pub total_pages: u32,
    pub total_records: u64,
}

/// Result of feeding a query response back into a [`PaginatedView`].
#[derive(Debug, Clone, PartialEq)]
pub enum ApplyOutcome {
    /// Records and descriptor replaced.
    Applied,
    /// Records applied but the page fell outside the new page count; the page was clamped and
    /// this follow-up request must be dispatched.
    Clamped(PageRequest),
    /// Response to a superseded request; discarded.
    Stale,
    /// Query failed; previous state retained.
    Failed(DashboardError),
}

/// Immutable snapshot of a [`PaginatedView`] for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView<R> {
    pub filters: FilterSet,
    pub descriptor: PageDescriptor,
    /// Visible records, most recent first
    pub records: Vec<R>,
    pub loading: bool,
    /// Visible records include live merges not yet confirmed by a query
    pub patched: bool,
    pub has_next: bool,
    pub has_prev: bool,
    /// Number of responses discarded because a newer request was outstanding
    pub stale_responses: u64,
}

/// Filter and page state machine for one table.
#[derive(Debug, Clone)]
pub struct PaginatedView<R> {
    name: &'static str,
    filters: FilterSet,
    descriptor: PageDescriptor,
    page: LivePage<R>,
    loading: bool,
    latest: RequestToken,
    stale_responses: u64,
}

impl<R> PaginatedView<R>
where
    R: PageRecord,
{
    /// Create a controller at page 1 with empty filters. `name` labels log output.
    pub fn new(name: &'static str, limit: u32) -> Self {
        let descriptor = PageDescriptor::new(limit);
        Self {
            name,
            filters: FilterSet::default(),
            descriptor,
            page: LivePage::new(descriptor.limit as usize),
            loading: false,
            latest: RequestToken(0),
            stale_responses: 0,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn descriptor(&self) -> &PageDescriptor {
        &self.descriptor
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn page(&self) -> &LivePage<R> {
        &self.page
    }

    pub fn latest_token(&self) -> RequestToken {
        self.latest
    }

    pub fn has_next(&self) -> bool {
        self.descriptor.has_next()
    }

    pub fn has_prev(&self) -> bool {
        self.descriptor.has_prev()
    }

    /// Update one filter field, reset to page 1 and re-query.
    pub fn set_filter(&mut self, update: FilterUpdate) -> PageRequest {
        self.filters.apply(update);
        self.descriptor.page = 1;
        self.issue()
    }

    /// Jump to `page`. Out-of-range pages are ignored and return `None`.
    pub fn set_page(&mut self, page: u32) -> Option<PageRequest> {
        if !self.descriptor.contains(page) {
            debug!(
                table = self.name,
                page,
                max_page = self.descriptor.max_page(),
                "ignoring out-of-range page"
            );
            return None;
        }

        self.descriptor.page = page;
        Some(self.issue())
    }

    pub fn next_page(&mut self) -> Option<PageRequest> {
        self.set_page(self.descriptor.page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Option<PageRequest> {
        self.set_page(self.descriptor.page.saturating_sub(1))
    }

    /// Re-query the current filters and page without mutating them.
    pub fn refresh(&mut self) -> PageRequest {
        self.issue()
    }

    /// Clear every filter, reset to page 1 and re-query.
    pub fn reset_filters(&mut self) -> PageRequest {
        self.filters.clear();
        self.descriptor.page = 1;
        self.issue()
    }

    /// Apply the response to a previously issued request.
    pub fn apply(
        &mut self,
        token: RequestToken,
        result: Result<QueryPage<R>, DashboardError>,
    ) -> ApplyOutcome {
        if token != self.latest {
            self.stale_responses += 1;
            debug!(
                table = self.name,
                token = token.0,
                latest = self.latest.0,
                "discarding stale page response"
            );
            return ApplyOutcome::Stale;
        }

        self.loading = false;

        let page = match result {
            Ok(page) => page,
            Err(error) => {
                warn!(
                    table = self.name,
                    token = token.0,
                    %error,
                    "page query failed, keeping last-known-good page"
                );
                return ApplyOutcome::Failed(error);
            }
        };

        debug!(
            table = self.name,
            token = token.0,
            records = page.records.len(),
            total_pages = page.total_pages,
            total_records = page.total_records,
            "applying page response"
        );

        self.page.confirm(page.records);
        self.descriptor.total_pages = page.total_pages;
        self.descriptor.total_records = page.total_records;

        if self.descriptor.page > self.descriptor.max_page() {
            let clamped = self.descriptor.max_page();
            debug!(
                table = self.name,
                page = self.descriptor.page,
                clamped,
                "page beyond result set, clamping"
            );
            self.descriptor.page = clamped;
            return ApplyOutcome::Clamped(self.issue());
        }

        ApplyOutcome::Applied
    }

    /// Splice a pushed record into the visible page. Page counts are untouched.
    pub fn merge_live(&mut self, record: R) {
        debug!(table = self.name, id = record.id(), "merging live record");
        self.page.merge(record);
    }

    pub fn snapshot(&self) -> PageView<R> {
        PageView {
            filters: self.filters.clone(),
            descriptor: self.descriptor,
            records: self.page.to_vec(),
            loading: self.loading,
            patched: self.page.is_patched(),
            has_next: self.has_next(),
            has_prev: self.has_prev(),
            stale_responses: self.stale_responses,
        }
    }

    fn issue(&mut self) -> PageRequest {
        self.latest = RequestToken(self.latest.0 + 1);
        self.loading = true;

        PageRequest {
            token: self.latest,
            filters: self.filters.clone(),
            page: self.descriptor.page,
            limit: self.descriptor.limit,
        }
    }
}
