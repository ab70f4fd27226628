//! Series extraction: classifier/operation/dataset selection, index sort and
//! smoothing of a [`RawTable`] into one [`TimeSeries`] per (operation, dataset).

pub mod window;

pub use window::{Window, WindowPolicy};

use crate::error::SeriesError;
use crate::table::{Observation, RawTable};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// One smoothed sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub in_total: u64,
    pub time_delta: f64,
}

/// Smoothed elapsed times of one (operation, dataset) pair, ordered by `in_total`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeries {
    /// Number of observations selected before smoothing.
    pub samples: usize,
    pub points: Vec<Point>,
}

/// (operation, dataset)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeriesKey {
    pub operation: String,
    pub dataset: String,
}

/// operation -> dataset -> series
pub type SeriesMap = BTreeMap<String, BTreeMap<String, TimeSeries>>;

/// Result of a lenient build: everything that could be built plus the
/// per-key failures that were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct LenientBuild {
    pub series: SeriesMap,
    pub skipped: Vec<(SeriesKey, SeriesError)>,
}

/// Typed row predicate replacing a boolean column mask.
#[derive(Debug, Clone, Copy)]
struct Selector<'a> {
    classifier: &'a str,
    operation: &'a str,
    dataset: &'a str,
}

impl Selector<'_> {
    fn matches(&self, o: &Observation) -> bool {
        o.classifier == self.classifier && o.operation == self.operation && o.dataset == self.dataset
    }
}

/// Builds smoothed series from a borrowed table.
///
/// Operations default to every distinct operation in the table and datasets
/// to every dataset with at least one row for the classifier, both in sorted
/// order. An explicit dataset list
/// is kept in caller order; the output maps are ordered by name either way.
#[derive(Debug, Clone)]
pub struct SeriesBuilder<'a> {
    table: &'a RawTable,
    classifier: String,
    window: Window,
    datasets: Option<Vec<String>>,
    operations: Option<Vec<String>>,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(table: &'a RawTable, classifier: impl Into<String>, window: Window) -> Self {
        Self {
            table,
            classifier: classifier.into(),
            window,
            datasets: None,
            operations: None,
        }
    }

    /// Restrict output to these datasets. Each must occur in the table.
    pub fn datasets<I, S>(mut self, datasets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.datasets = Some(datasets.into_iter().map(Into::into).collect());
        self
    }

    /// Restrict output to these operations. Each must occur in the table.
    pub fn operations<I, S>(mut self, operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.operations = Some(operations.into_iter().map(Into::into).collect());
        self
    }

    /// Build every (operation, dataset) series, failing on the first key
    /// without rows.
    pub fn build(&self) -> Result<SeriesMap, SeriesError> {
        let mut out = SeriesMap::new();
        for key in self.keys()? {
            let series = self.build_key(&key)?;
            out.entry(key.operation).or_default().insert(key.dataset, series);
        }
        Ok(out)
    }

    /// Build every series that has rows and report the keys that did not.
    ///
    /// Unknown datasets or operations still fail the whole build: those are
    /// caller mistakes, not sparse data.
    pub fn build_lenient(&self) -> Result<LenientBuild, SeriesError> {
        let mut series = SeriesMap::new();
        let mut skipped = Vec::new();
        for key in self.keys()? {
            match self.build_key(&key) {
                Ok(s) => {
                    series.entry(key.operation).or_default().insert(key.dataset, s);
                }
                Err(e) if e.is_per_key() => skipped.push((key, e)),
                Err(e) => return Err(e),
            }
        }
        Ok(LenientBuild { series, skipped })
    }

    /// Build the series of a single (operation, dataset) pair.
    pub fn build_one(&self, operation: &str, dataset: &str) -> Result<TimeSeries, SeriesError> {
        let table_datasets = self.table.datasets();
        if !table_datasets.contains_key(dataset) {
            return Err(SeriesError::UnknownDataset(dataset.to_string()));
        }
        if !self.table.operations().contains_key(operation) {
            return Err(SeriesError::UnknownOperation(operation.to_string()));
        }
        self.build_key(&SeriesKey {
            operation: operation.to_string(),
            dataset: dataset.to_string(),
        })
    }

    /// Cross product of the selected operations and datasets.
    fn keys(&self) -> Result<Vec<SeriesKey>, SeriesError> {
        let table_ops = self.table.operations();
        let table_datasets = self.table.datasets();

        let operations: Vec<String> = match &self.operations {
            Some(ops) => {
                for op in ops {
                    if !table_ops.contains_key(op.as_str()) {
                        return Err(SeriesError::UnknownOperation(op.clone()));
                    }
                }
                ops.clone()
            }
            None => table_ops.keys().map(|s| s.to_string()).collect(),
        };

        let datasets: Vec<String> = match &self.datasets {
            Some(ds) => {
                for d in ds {
                    if !table_datasets.contains_key(d.as_str()) {
                        return Err(SeriesError::UnknownDataset(d.clone()));
                    }
                }
                ds.clone()
            }
            None => {
                let with_rows: BTreeSet<&str> = self
                    .table
                    .rows()
                    .iter()
                    .filter(|o| o.classifier == self.classifier)
                    .map(|o| o.dataset.as_str())
                    .collect();
                // A classifier without any row keeps every dataset so each key
                // reports its EmptyFilterResult.
                if with_rows.is_empty() {
                    table_datasets.keys().map(|s| s.to_string()).collect()
                } else {
                    with_rows.into_iter().map(str::to_string).collect()
                }
            }
        };

        let mut keys = Vec::with_capacity(operations.len() * datasets.len());
        for operation in &operations {
            for dataset in &datasets {
                keys.push(SeriesKey {
                    operation: operation.clone(),
                    dataset: dataset.clone(),
                });
            }
        }
        Ok(keys)
    }

    fn build_key(&self, key: &SeriesKey) -> Result<TimeSeries, SeriesError> {
        let selector = Selector {
            classifier: &self.classifier,
            operation: &key.operation,
            dataset: &key.dataset,
        };

        let mut selected: Vec<(u64, f64)> = self
            .table
            .rows()
            .iter()
            .filter(|o| selector.matches(o))
            .map(|o| (o.in_total, o.time_delta))
            .collect();

        if selected.is_empty() {
            return Err(SeriesError::EmptyFilterResult {
                operation: key.operation.clone(),
                dataset: key.dataset.clone(),
                classifier: self.classifier.clone(),
            });
        }

        // Stable: rows sharing an in_total keep their file order.
        selected.sort_by_key(|&(in_total, _)| in_total);

        let values: Vec<f64> = selected.iter().map(|&(_, v)| v).collect();
        let points = self
            .window
            .apply(&values)
            .into_iter()
            .map(|(pos, mean)| Point {
                in_total: selected[pos].0,
                time_delta: mean,
            })
            .collect();

        Ok(TimeSeries {
            samples: selected.len(),
            points,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trailing(size: usize) -> Window {
        Window::new(size, WindowPolicy::Trailing).unwrap()
    }

    fn obs(dataset: &str, classifier: &str, operation: &str, in_total: u64, time_delta: f64) -> Observation {
        Observation {
            dataset: dataset.to_string(),
            classifier: classifier.to_string(),
            operation: operation.to_string(),
            in_total,
            time_delta,
        }
    }

    fn two_sort_rows() -> RawTable {
        RawTable::new(vec![
            obs("A", "tmm", "Sort", 10, 5.0),
            obs("A", "tmm", "Sort", 5, 3.0),
        ])
    }

    fn pairs(series: &TimeSeries) -> Vec<(u64, f64)> {
        series.points.iter().map(|p| (p.in_total, p.time_delta)).collect()
    }

    /// Two datasets, two operations, a second classifier, unsorted input.
    fn mixed_table() -> RawTable {
        RawTable::new(vec![
            obs("spambase", "tmm", "Unify", 30, 3.0),
            obs("spambase", "tmm", "Unify", 10, 1.0),
            obs("spambase", "tmo", "Unify", 20, 100.0),
            obs("spambase", "tmm", "Unify", 20, 2.0),
            obs("spambase", "tmm", "PruneBox", 5, 0.5),
            obs("cardio", "tmm", "Unify", 7, 4.0),
            obs("cardio", "tmm", "PruneBox", 3, 6.0),
            obs("cardio", "tmm", "PruneBox", 1, 2.0),
            obs("magic", "tmo", "Unify", 1, 1.0),
        ])
    }

    #[test]
    fn unit_window_sorts_by_in_total() {
        let table = two_sort_rows();
        let out = SeriesBuilder::new(&table, "tmm", trailing(1))
            .build()
            .unwrap();
        assert_eq!(pairs(&out["Sort"]["A"]), vec![(5, 3.0), (10, 5.0)]);
        assert_eq!(out["Sort"]["A"].samples, 2);
    }

    #[test]
    fn window_of_two_averages_pairs() {
        let table = two_sort_rows();
        let out = SeriesBuilder::new(&table, "tmm", trailing(2))
            .build()
            .unwrap();
        assert_eq!(pairs(&out["Sort"]["A"]), vec![(10, 4.0)]);
    }

    #[test]
    fn unmatched_classifier_is_an_empty_filter_result() {
        let table = two_sort_rows();
        let err = SeriesBuilder::new(&table, "tmo", trailing(1))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SeriesError::EmptyFilterResult {
                operation: "Sort".into(),
                dataset: "A".into(),
                classifier: "tmo".into(),
            }
        );
    }

    #[test]
    fn other_classifiers_do_not_leak_into_series() {
        let table = mixed_table();
        let out = SeriesBuilder::new(&table, "tmm", trailing(1))
            .datasets(["spambase"])
            .build()
            .unwrap();
        assert_eq!(
            pairs(&out["Unify"]["spambase"]),
            vec![(10, 1.0), (20, 2.0), (30, 3.0)]
        );
    }

    #[test]
    fn equal_in_total_keeps_file_order() {
        let table = RawTable::new(vec![
            obs("A", "tmm", "Sort", 7, 1.0),
            obs("A", "tmm", "Sort", 3, 9.0),
            obs("A", "tmm", "Sort", 7, 2.0),
            obs("A", "tmm", "Sort", 7, 3.0),
        ]);
        let out = SeriesBuilder::new(&table, "tmm", trailing(1))
            .build()
            .unwrap();
        assert_eq!(
            pairs(&out["Sort"]["A"]),
            vec![(3, 9.0), (7, 1.0), (7, 2.0), (7, 3.0)]
        );
    }

    #[test]
    fn full_window_yields_single_point() {
        let table = RawTable::new(
            (1..=4)
                .map(|i| obs("A", "tmm", "Sort", i * 10, i as f64))
                .collect(),
        );
        let out = SeriesBuilder::new(&table, "tmm", trailing(4))
            .build()
            .unwrap();
        assert_eq!(pairs(&out["Sort"]["A"]), vec![(40, 2.5)]);
    }

    #[test]
    fn window_longer_than_series_leaves_it_empty() {
        let table = two_sort_rows();
        let out = SeriesBuilder::new(&table, "tmm", trailing(3))
            .build()
            .unwrap();
        assert!(out["Sort"]["A"].points.is_empty());
        assert_eq!(out["Sort"]["A"].samples, 2);
    }

    #[test]
    fn centered_window_labels_the_middle_point() {
        let table = mixed_table();
        let out = SeriesBuilder::new(&table, "tmm", Window::new(3, WindowPolicy::Centered).unwrap())
            .datasets(["spambase"])
            .operations(["Unify"])
            .build()
            .unwrap();
        assert_eq!(pairs(&out["Unify"]["spambase"]), vec![(20, 2.0)]);
    }

    #[test]
    fn lenient_build_covers_keys_with_rows() {
        let table = mixed_table();
        let built = SeriesBuilder::new(&table, "tmm", trailing(1))
            .build_lenient()
            .unwrap();

        let keys: BTreeSet<(String, String)> = built
            .series
            .iter()
            .flat_map(|(op, by_ds)| by_ds.keys().map(move |ds| (op.clone(), ds.clone())))
            .collect();

        // Expected: operations seen x datasets that have tmm rows for them.
        let mut expected = BTreeSet::new();
        for op in table.operations().keys() {
            for ds in table.datasets().keys() {
                if table
                    .rows()
                    .iter()
                    .any(|o| o.classifier == "tmm" && &o.operation == op && &o.dataset == ds)
                {
                    expected.insert((op.to_string(), ds.to_string()));
                }
            }
        }
        assert_eq!(keys, expected);

        // "magic" only has tmo rows, so it is not selected at all.
        assert!(built.skipped.is_empty());
    }

    #[test]
    fn lenient_build_skips_sparse_pairs() {
        let table = RawTable::new(vec![
            obs("A", "tmm", "Sort", 1, 1.0),
            obs("A", "tmm", "Join", 1, 2.0),
            obs("B", "tmm", "Sort", 1, 3.0),
        ]);
        let built = SeriesBuilder::new(&table, "tmm", trailing(1))
            .build_lenient()
            .unwrap();
        assert_eq!(
            built
                .skipped
                .iter()
                .map(|(k, e)| (k.operation.as_str(), k.dataset.as_str(), e.is_per_key()))
                .collect::<Vec<_>>(),
            vec![("Join", "B", true)]
        );
        assert_eq!(built.series["Sort"].keys().collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn default_datasets_follow_the_classifier() {
        let table = RawTable::new(vec![
            obs("A", "tmm", "Sort", 1, 1.0),
            obs("B", "tmo", "Sort", 1, 2.0),
        ]);
        let out = SeriesBuilder::new(&table, "tmm", trailing(1)).build().unwrap();
        assert_eq!(out["Sort"].keys().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn strict_build_without_allow_list() {
        let table = mixed_table();
        let out = SeriesBuilder::new(&table, "tmm", trailing(1)).build().unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["PruneBox", "Unify"]);
        for by_ds in out.values() {
            assert_eq!(by_ds.keys().collect::<Vec<_>>(), vec!["cardio", "spambase"]);
        }
    }

    #[test]
    fn strict_build_covers_full_cross_product() {
        let table = mixed_table();
        let out = SeriesBuilder::new(&table, "tmm", trailing(1))
            .datasets(["spambase", "cardio"])
            .build()
            .unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["PruneBox", "Unify"]);
        for by_ds in out.values() {
            assert_eq!(by_ds.keys().collect::<Vec<_>>(), vec!["cardio", "spambase"]);
        }
    }

    #[test]
    fn series_are_sorted_by_in_total() {
        let table = mixed_table();
        for size in 1..=3 {
            let built = SeriesBuilder::new(&table, "tmm", trailing(size))
                .build_lenient()
                .unwrap();
            for series in built.series.values().flat_map(|m| m.values()) {
                assert!(series.points.windows(2).all(|w| w[0].in_total <= w[1].in_total));
            }
        }
    }

    #[test]
    fn build_is_repeatable() {
        let table = mixed_table();
        let builder = SeriesBuilder::new(&table, "tmm", trailing(2));
        assert_eq!(builder.build_lenient().unwrap(), builder.build_lenient().unwrap());
    }

    #[test]
    fn unknown_names_fail_the_whole_build() {
        let table = mixed_table();
        let window = trailing(1);

        let err = SeriesBuilder::new(&table, "tmm", window)
            .datasets(["spambase", "iris"])
            .build_lenient()
            .unwrap_err();
        assert_eq!(err, SeriesError::UnknownDataset("iris".into()));

        let err = SeriesBuilder::new(&table, "tmm", window)
            .operations(["TreeBuild"])
            .build()
            .unwrap_err();
        assert_eq!(err, SeriesError::UnknownOperation("TreeBuild".into()));
    }

    #[test]
    fn build_one_selects_a_single_pair() {
        let table = mixed_table();
        let builder = SeriesBuilder::new(&table, "tmm", trailing(2));
        let series = builder.build_one("PruneBox", "cardio").unwrap();
        assert_eq!(pairs(&series), vec![(3, 4.0)]);

        assert_eq!(
            builder.build_one("PruneBox", "iris").unwrap_err(),
            SeriesError::UnknownDataset("iris".into())
        );
        assert!(builder.build_one("PruneBox", "magic").unwrap_err().is_per_key());
    }
}
