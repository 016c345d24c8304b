use std::path::Path;

use customer_lens::data::export::export_to_path;
use customer_lens::data::filter::apply_indices;
use customer_lens::data::model::{CustomerRecord, GroupKey};
use customer_lens::{FilterSpec, LoadError, Selection, Session};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    ExecutiveSummary,
    RfmAnalysis,
    CustomerSegments,
    ClvAnalysis,
    Clustering,
    Explorer,
    Recommendations,
}

impl Page {
    pub const ALL: [Page; 7] = [
        Page::ExecutiveSummary,
        Page::RfmAnalysis,
        Page::CustomerSegments,
        Page::ClvAnalysis,
        Page::Clustering,
        Page::Explorer,
        Page::Recommendations,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::ExecutiveSummary => "Executive Summary",
            Page::RfmAnalysis => "RFM Analysis",
            Page::CustomerSegments => "Customer Segments",
            Page::ClvAnalysis => "CLV Analysis",
            Page::Clustering => "K-Means Clustering",
            Page::Explorer => "Customer Explorer",
            Page::Recommendations => "Recommendations",
        }
    }
}

/// One of the three RFM measures, used as a scatter axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RfmAxis {
    Recency,
    Frequency,
    Monetary,
}

impl RfmAxis {
    pub const ALL: [RfmAxis; 3] = [RfmAxis::Recency, RfmAxis::Frequency, RfmAxis::Monetary];

    pub fn label(self) -> &'static str {
        match self {
            RfmAxis::Recency => "Recency",
            RfmAxis::Frequency => "Frequency",
            RfmAxis::Monetary => "Monetary",
        }
    }

    pub fn value(self, record: &CustomerRecord) -> f64 {
        match self {
            RfmAxis::Recency => record.recency,
            RfmAxis::Frequency => record.frequency as f64,
            RfmAxis::Monetary => record.monetary,
        }
    }
}

/// The categorical fields the Explorer filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDimension {
    RfmSegment,
    ClvSegment,
    Cluster,
}

impl FilterDimension {
    pub const ALL: [FilterDimension; 3] = [
        FilterDimension::RfmSegment,
        FilterDimension::ClvSegment,
        FilterDimension::Cluster,
    ];

    pub fn title(self) -> &'static str {
        match self {
            FilterDimension::RfmSegment => "RFM Segments",
            FilterDimension::ClvSegment => "CLV Segments",
            FilterDimension::Cluster => "K-Means Clusters",
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded data (None until a load succeeds).
    pub session: Option<Session>,

    /// Why the last load failed. While set, no dashboard is shown.
    pub load_error: Option<String>,

    pub page: Page,

    /// Current Explorer query.
    pub filters: FilterSpec,

    /// Indices of customers passing `filters`, in display order (cached).
    pub visible_indices: Vec<usize>,

    /// Rejection of the last filter change; `visible_indices` still holds
    /// the previous result.
    pub filter_error: Option<String>,

    /// CLV range inputs. Only applied while `clv_limit` is on.
    pub clv_limit: bool,
    pub clv_bounds: (f64, f64),

    pub scatter_x: RfmAxis,
    pub scatter_y: RfmAxis,

    /// Colours for RFM segments and clusters.
    pub segment_colors: ColorMap,
    pub cluster_colors: ColorMap,

    /// Status message shown in the top bar.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            session: None,
            load_error: None,
            page: Page::ExecutiveSummary,
            filters: FilterSpec::default(),
            visible_indices: Vec::new(),
            filter_error: None,
            clv_limit: false,
            clv_bounds: (0.0, 0.0),
            scatter_x: RfmAxis::Recency,
            scatter_y: RfmAxis::Frequency,
            segment_colors: ColorMap::default(),
            cluster_colors: ColorMap::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Start a session from the two input files.
    pub fn open(customers: &Path, statistics: &Path) -> Self {
        let mut state = Self::default();
        state.load(customers, statistics);
        state
    }

    /// Replace the current session. A failed load ends the old one too.
    pub fn load(&mut self, customers: &Path, statistics: &Path) {
        match Session::load(customers, statistics) {
            Ok(session) => self.set_session(session),
            Err(e) => self.fail_session(&e),
        }
    }

    /// Ingest a newly loaded session, reset filters and colours.
    pub fn set_session(&mut self, session: Session) {
        let table = &session.customers;
        self.segment_colors = ColorMap::new(table.rfm_segments.iter().cloned().map(GroupKey::Text));
        self.cluster_colors = ColorMap::new(table.cluster_ids.iter().copied().map(GroupKey::Number));

        let (lo, hi) = table
            .records
            .iter()
            .map(|r| r.clv_predicted)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        self.clv_bounds = if lo.is_finite() {
            (lo.floor(), hi.ceil())
        } else {
            (0.0, 0.0)
        };
        self.clv_limit = false;
        self.filters = FilterSpec::default();
        self.filter_error = None;
        self.load_error = None;
        self.status_message = None;
        self.visible_indices = (0..table.len()).collect();

        self.session = Some(session);
        self.refilter();
    }

    pub fn fail_session(&mut self, error: &LoadError) {
        log::error!("Failed to load customer data: {error}");
        self.session = None;
        self.visible_indices.clear();
        self.load_error = Some(error.to_string());
    }

    /// Recompute `visible_indices` for the current filters.
    pub fn refilter(&mut self) {
        let candidate = self.filters.clone();
        self.request_filters(candidate);
    }

    /// Handle one filter change. An accepted `candidate` replaces `filters`
    /// and the visible set; a rejected one leaves both untouched.
    pub fn request_filters(&mut self, candidate: FilterSpec) {
        let Some(session) = &self.session else {
            return;
        };
        match apply_indices(&session.customers.records, &candidate) {
            Ok(indices) => {
                log::debug!("Filter matched {} customers", indices.len());
                self.filters = candidate;
                self.visible_indices = indices;
                self.filter_error = None;
            }
            Err(e) => {
                log::warn!("Rejected filter: {e}");
                self.filter_error = Some(e.to_string());
            }
        }
    }

    /// Customers passing the current filters, in display order.
    pub fn visible_records(&self) -> impl Iterator<Item = &CustomerRecord> {
        let records = self
            .session
            .as_ref()
            .map(|s| s.customers.records.as_slice())
            .unwrap_or(&[]);
        self.visible_indices.iter().map(move |&i| &records[i])
    }

    /// Every record of the session (empty without one).
    pub fn records(&self) -> &[CustomerRecord] {
        self.session
            .as_ref()
            .map(|s| s.customers.records.as_slice())
            .unwrap_or(&[])
    }

    // -- Categorical filters --

    /// Values offered for a dimension, in display order.
    pub fn dimension_values(&self, dim: FilterDimension) -> Vec<GroupKey> {
        let Some(session) = &self.session else {
            return Vec::new();
        };
        let table = &session.customers;
        match dim {
            FilterDimension::RfmSegment => table.rfm_segments.iter().cloned().map(GroupKey::Text).collect(),
            FilterDimension::ClvSegment => table.clv_segments.iter().cloned().map(GroupKey::Text).collect(),
            FilterDimension::Cluster => table.cluster_ids.iter().copied().map(GroupKey::Number).collect(),
        }
    }

    pub fn is_selected(&self, dim: FilterDimension, key: &GroupKey) -> bool {
        match (dim, key) {
            (FilterDimension::RfmSegment, GroupKey::Text(s)) => self.filters.rfm_segments.matches(s),
            (FilterDimension::ClvSegment, GroupKey::Text(s)) => self.filters.clv_segments.matches(s),
            (FilterDimension::Cluster, GroupKey::Number(n)) => self.filters.cluster_ids.matches(n),
            _ => false,
        }
    }

    /// (selected, total) for a dimension's header.
    pub fn selected_count(&self, dim: FilterDimension) -> (usize, usize) {
        let Some(session) = &self.session else {
            return (0, 0);
        };
        let table = &session.customers;
        match dim {
            FilterDimension::RfmSegment => (
                self.filters.rfm_segments.selected_count(&table.rfm_segments),
                table.rfm_segments.len(),
            ),
            FilterDimension::ClvSegment => (
                self.filters.clv_segments.selected_count(&table.clv_segments),
                table.clv_segments.len(),
            ),
            FilterDimension::Cluster => (
                self.filters.cluster_ids.selected_count(&table.cluster_ids),
                table.cluster_ids.len(),
            ),
        }
    }

    /// Toggle a single value in a dimension's filter.
    pub fn toggle_value(&mut self, dim: FilterDimension, key: &GroupKey) {
        let Some(session) = &self.session else {
            return;
        };
        let table = &session.customers;
        let mut candidate = self.filters.clone();
        match (dim, key) {
            (FilterDimension::RfmSegment, GroupKey::Text(s)) => {
                candidate.rfm_segments.toggle(s, &table.rfm_segments)
            }
            (FilterDimension::ClvSegment, GroupKey::Text(s)) => {
                candidate.clv_segments.toggle(s, &table.clv_segments)
            }
            (FilterDimension::Cluster, GroupKey::Number(n)) => {
                candidate.cluster_ids.toggle(n, &table.cluster_ids)
            }
            _ => return,
        }
        self.request_filters(candidate);
    }

    /// Stop filtering on a dimension.
    pub fn select_all(&mut self, dim: FilterDimension) {
        let mut candidate = self.filters.clone();
        match dim {
            FilterDimension::RfmSegment => candidate.rfm_segments = Selection::All,
            FilterDimension::ClvSegment => candidate.clv_segments = Selection::All,
            FilterDimension::Cluster => candidate.cluster_ids = Selection::All,
        }
        self.request_filters(candidate);
    }

    /// Deselect every value of a dimension.
    pub fn select_none(&mut self, dim: FilterDimension) {
        let mut candidate = self.filters.clone();
        match dim {
            FilterDimension::RfmSegment => candidate.rfm_segments = Selection::none(),
            FilterDimension::ClvSegment => candidate.clv_segments = Selection::none(),
            FilterDimension::Cluster => candidate.cluster_ids = Selection::none(),
        }
        self.request_filters(candidate);
    }

    // -- CLV range --

    /// Request the range inputs as the CLV filter (or no CLV filter while
    /// `clv_limit` is off). Rejected bounds stay in `clv_bounds` only.
    pub fn apply_clv_range(&mut self) {
        let mut candidate = self.filters.clone();
        if self.clv_limit {
            candidate.clv_min = Some(self.clv_bounds.0);
            candidate.clv_max = Some(self.clv_bounds.1);
        } else {
            candidate.clv_min = None;
            candidate.clv_max = None;
        }
        self.request_filters(candidate);
    }

    pub fn reset_filters(&mut self) {
        self.clv_limit = false;
        self.request_filters(FilterSpec::default());
    }

    // -- Export --

    /// Write the visible customers to `path` in the source column layout.
    pub fn export_visible(&mut self, path: &Path) {
        let Some(session) = &self.session else {
            return;
        };
        let records = self.visible_indices.iter().map(|&i| &session.customers.records[i]);
        match export_to_path(path, &session.customers.columns, records) {
            Ok(n) => {
                self.status_message = Some(format!("Exported {n} customers to {}", path.display()));
            }
            Err(e) => {
                log::error!("Export failed: {e}");
                self.status_message = Some(format!("Export failed: {e}"));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use customer_lens::data::model::{CustomerId, CustomerTable, GroupField};
    use customer_lens::SummaryStatistics;

    fn customer(id: &str, clv: f64, rfm: &str, cluster: i64) -> CustomerRecord {
        CustomerRecord {
            customer_id: CustomerId::new(id),
            recency: 5.0,
            frequency: 3,
            monetary: 120.0,
            rfm_segment: rfm.to_string(),
            clv_predicted: clv,
            clv_segment: "Gold".to_string(),
            cluster_id: cluster,
            extra: BTreeMap::new(),
        }
    }

    fn state() -> AppState {
        let records = vec![
            customer("1", 50.0, "Champions", 0),
            customer("2", 500.0, "Lost", 1),
            customer("3", 250.0, "Champions", 1),
        ];
        let statistics = SummaryStatistics::compute(&records, &GroupField::RfmSegment);
        let session = Session {
            customers: CustomerTable::new(records).unwrap(),
            statistics,
            customers_path: "customers.csv".into(),
            statistics_path: "stats.json".into(),
        };
        let mut state = AppState::default();
        state.set_session(session);
        state
    }

    fn visible_ids(state: &AppState) -> Vec<String> {
        state
            .visible_records()
            .map(|r| r.customer_id.to_string())
            .collect()
    }

    #[test]
    fn test_new_session_shows_everything_sorted() {
        let state = state();
        assert_eq!(visible_ids(&state), vec!["2", "3", "1"]);
        assert_eq!(state.clv_bounds, (50.0, 500.0));
        assert_eq!(state.selected_count(FilterDimension::Cluster), (2, 2));
    }

    #[test]
    fn test_toggle_and_select_none() {
        let mut state = state();
        state.toggle_value(FilterDimension::Cluster, &GroupKey::Number(0));
        assert_eq!(visible_ids(&state), vec!["2", "3"]);
        assert!(!state.is_selected(FilterDimension::Cluster, &GroupKey::Number(0)));

        state.select_none(FilterDimension::RfmSegment);
        assert!(visible_ids(&state).is_empty());
        assert_eq!(state.selected_count(FilterDimension::RfmSegment), (0, 2));

        state.reset_filters();
        assert_eq!(visible_ids(&state).len(), 3);
    }

    #[test]
    fn test_inverted_range_keeps_previous_result() {
        let mut state = state();
        state.clv_limit = true;
        state.clv_bounds = (100.0, 300.0);
        state.apply_clv_range();
        assert_eq!(visible_ids(&state), vec!["3"]);

        state.clv_bounds = (400.0, 100.0);
        state.apply_clv_range();
        assert!(state.filter_error.is_some());
        assert_eq!(visible_ids(&state), vec!["3"]);

        state.clv_limit = false;
        state.apply_clv_range();
        assert!(state.filter_error.is_none());
        assert_eq!(visible_ids(&state).len(), 3);
    }

    #[test]
    fn test_rejected_range_does_not_block_later_changes() {
        let mut state = state();
        state.clv_limit = true;
        state.clv_bounds = (400.0, 100.0);
        state.apply_clv_range();
        assert!(state.filter_error.is_some());
        assert_eq!(state.filters.clv_min, None);

        state.toggle_value(FilterDimension::Cluster, &GroupKey::Number(1));
        assert!(state.filter_error.is_none());
        assert!(!state.is_selected(FilterDimension::Cluster, &GroupKey::Number(1)));
        assert_eq!(visible_ids(&state), vec!["1"]);
    }

    #[test]
    fn test_failed_load_ends_session() {
        let mut state = state();
        state.load(Path::new("/missing/customers.csv"), Path::new("/missing/stats.json"));
        assert!(state.session.is_none());
        assert!(state.load_error.is_some());
        assert_eq!(visible_ids(&state).len(), 0);
    }
}
