use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single timing measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub dataset: String,
    pub classifier: String,
    pub operation: String,
    /// Cumulative input size; the x axis of every series.
    #[serde(rename = "inTotal")]
    pub in_total: u64,
    /// Elapsed time of the phase at `in_total`.
    #[serde(rename = "timeDelta")]
    pub time_delta: f64,
}

/// All loaded observations, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    rows: Vec<Observation>,
}

impl RawTable {
    pub fn new(rows: Vec<Observation>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct dataset names with row counts, sorted by name.
    pub fn datasets(&self) -> BTreeMap<&str, usize> {
        self.count_by(|o| &o.dataset)
    }

    /// Distinct classifier labels with row counts, sorted by label.
    pub fn classifiers(&self) -> BTreeMap<&str, usize> {
        self.count_by(|o| &o.classifier)
    }

    /// Distinct operation names with row counts, sorted by name.
    pub fn operations(&self) -> BTreeMap<&str, usize> {
        self.count_by(|o| &o.operation)
    }

    fn count_by<'a>(&'a self, field: impl Fn(&'a Observation) -> &'a String) -> BTreeMap<&'a str, usize> {
        let mut out = BTreeMap::new();
        for row in &self.rows {
            *out.entry(field(row).as_str()).or_insert(0) += 1;
        }
        out
    }
}

impl FromIterator<Observation> for RawTable {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
