use std::cmp::Ordering;
use std::collections::BTreeSet;

use super::error::FilterError;
use super::model::CustomerRecord;

// ---------------------------------------------------------------------------
// Selection: which values of one categorical field are allowed
// ---------------------------------------------------------------------------

/// Allowed values for one categorical field.
///
/// `All` leaves the field unfiltered. `Only` restricts it to the given set;
/// an empty set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    All,
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Selection::All
    }
}

impl<T: Ord + Clone> Selection<T> {
    /// Restrict to exactly these values.
    pub fn only(values: impl IntoIterator<Item = T>) -> Self {
        Selection::Only(values.into_iter().collect())
    }

    /// Select nothing.
    pub fn none() -> Self {
        Selection::Only(BTreeSet::new())
    }

    pub fn matches(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(allowed) => allowed.contains(value),
        }
    }

    /// Flip one value. Toggling from `All` keeps every other value of
    /// `universe` selected.
    pub fn toggle(&mut self, value: &T, universe: &BTreeSet<T>) {
        match self {
            Selection::All => {
                let mut rest = universe.clone();
                rest.remove(value);
                *self = Selection::Only(rest);
            }
            Selection::Only(allowed) => {
                if !allowed.remove(value) {
                    allowed.insert(value.clone());
                }
            }
        }
    }

    /// How many of `universe` pass this selection.
    pub fn selected_count(&self, universe: &BTreeSet<T>) -> usize {
        match self {
            Selection::All => universe.len(),
            Selection::Only(allowed) => universe.iter().filter(|v| allowed.contains(v)).count(),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter specification
// ---------------------------------------------------------------------------

/// One Explorer query: three categorical restrictions and an inclusive CLV
/// range, combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    pub rfm_segments: Selection<String>,
    pub clv_segments: Selection<String>,
    pub cluster_ids: Selection<i64>,
    pub clv_min: Option<f64>,
    pub clv_max: Option<f64>,
}

impl FilterSpec {
    /// Reject inverted or non-numeric CLV bounds.
    pub fn validate(&self) -> Result<(), FilterError> {
        let min = self.clv_min.unwrap_or(f64::NEG_INFINITY);
        let max = self.clv_max.unwrap_or(f64::INFINITY);
        if min.is_nan() || max.is_nan() || min > max {
            return Err(FilterError::InvalidRange { min, max });
        }
        Ok(())
    }

    /// Whether `record` passes every predicate. Assumes a validated spec.
    pub fn matches(&self, record: &CustomerRecord) -> bool {
        self.rfm_segments.matches(&record.rfm_segment)
            && self.clv_segments.matches(&record.clv_segment)
            && self.cluster_ids.matches(&record.cluster_id)
            && self.clv_min.map_or(true, |min| record.clv_predicted >= min)
            && self.clv_max.map_or(true, |max| record.clv_predicted <= max)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Display order of filtered customers: highest predicted CLV first, ties by
/// customer id ascending.
pub fn display_order(a: &CustomerRecord, b: &CustomerRecord) -> Ordering {
    b.clv_predicted
        .total_cmp(&a.clv_predicted)
        .then_with(|| a.customer_id.cmp(&b.customer_id))
}

/// Return indices of records that pass `spec`, in display order.
pub fn apply_indices(records: &[CustomerRecord], spec: &FilterSpec) -> Result<Vec<usize>, FilterError> {
    spec.validate()?;

    let mut indices: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| spec.matches(r))
        .map(|(i, _)| i)
        .collect();
    indices.sort_by(|&a, &b| display_order(&records[a], &records[b]));
    Ok(indices)
}

/// Return the records that pass `spec`, in display order.
///
/// An empty result is not an error.
pub fn apply<'a>(
    records: &'a [CustomerRecord],
    spec: &FilterSpec,
) -> Result<Vec<&'a CustomerRecord>, FilterError> {
    Ok(apply_indices(records, spec)?
        .into_iter()
        .map(|i| &records[i])
        .collect())
}

/// Like [`apply`], but fails with [`FilterError::EmptyInput`] when there is
/// nothing to filter, so "nothing loaded" and "nothing matched" stay distinct.
pub fn apply_strict<'a>(
    records: &'a [CustomerRecord],
    spec: &FilterSpec,
) -> Result<Vec<&'a CustomerRecord>, FilterError> {
    if records.is_empty() {
        return Err(FilterError::EmptyInput);
    }
    apply(records, spec)
}
