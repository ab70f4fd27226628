//! Chart config (charts.json): per-run settings for series building and plotting.
//!
//! JSON shape (every field optional):
//! {
//!   "classifier": "tmm",
//!   "window": 10,
//!   "window_policy": "trailing",      // or "centered"
//!   "skip_missing": true,             // skip (operation, dataset) pairs without rows
//!   "log_y": false,                   // default for every operation
//!   "datasets": [
//!     { "name": "spambase.arff", "label": "D3" },
//!     "MAGICGammaTelescope.arff"      // label defaults to the name
//!   ],
//!   "operations": {
//!     "ComputeCoverage": { "title": "Pruning", "x_limit": 100000, "log_y": true }
//!   }
//! }
//!
//! Dataset order is plot order. Names and labels must be unique.

use crate::Result;
use crate::series::WindowPolicy;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawChartConfig {
    #[serde(default)]
    pub classifier: Option<String>,

    #[serde(default)]
    pub window: Option<usize>,

    #[serde(default)]
    pub window_policy: Option<WindowPolicy>,

    #[serde(default)]
    pub skip_missing: Option<bool>,

    #[serde(default)]
    pub log_y: bool,

    #[serde(default)]
    pub datasets: Vec<RawDataset>,

    #[serde(default)]
    pub operations: BTreeMap<String, RawOperation>,
}

/// Dataset entries in charts.json.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDataset {
    // Bare name: "spambase.arff"
    Name(String),
    // { "name": "spambase.arff", "label": "D3" }
    Labeled(LabeledDataset),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabeledDataset {
    pub name: String,

    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawOperation {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub x_limit: Option<u64>,

    #[serde(default)]
    pub log_y: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub name: String,
    pub label: String,
}

/// Resolved plotting options for one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationStyle {
    pub title: String,
    pub x_limit: Option<u64>,
    pub log_y: bool,
}

/// Validated chart config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChartConfig {
    pub classifier: Option<String>,
    pub window: Option<usize>,
    pub window_policy: Option<WindowPolicy>,
    pub skip_missing: Option<bool>,
    pub log_y: bool,
    /// Empty means every dataset in the table, with its name as label.
    pub datasets: Vec<DatasetSpec>,
    pub operations: BTreeMap<String, RawOperation>,
}

impl RawChartConfig {
    /// Check dataset names/labels for duplicates and normalize labels.
    pub fn validate_and_build(self) -> Result<ChartConfig> {
        let mut names = BTreeSet::new();
        let mut labels = BTreeSet::new();
        let mut datasets = Vec::with_capacity(self.datasets.len());

        for raw in self.datasets {
            let (name, label) = match raw {
                RawDataset::Name(name) => (name.clone(), name),
                RawDataset::Labeled(LabeledDataset { name, label }) => {
                    let label = label
                        .as_deref()
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .unwrap_or_else(|| name.clone());
                    (name, label)
                }
            };

            if name.trim().is_empty() {
                bail!("charts.json: dataset name must not be empty");
            }
            if !names.insert(name.clone()) {
                bail!("charts.json: duplicate dataset name: {}", name);
            }
            if !labels.insert(label.clone()) {
                bail!("charts.json: duplicate dataset label: {}", label);
            }
            datasets.push(DatasetSpec { name, label });
        }

        if self.window == Some(0) {
            bail!("charts.json: window must be at least 1");
        }

        Ok(ChartConfig {
            classifier: self.classifier,
            window: self.window,
            window_policy: self.window_policy,
            skip_missing: self.skip_missing,
            log_y: self.log_y,
            datasets,
            operations: self.operations,
        })
    }
}

impl ChartConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read chart config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("load chart config {}", path.display()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let raw: RawChartConfig = serde_json::from_str(text)?;
        raw.validate_and_build()
    }

    /// Dataset names in plot order, or None when the config leaves it to the table.
    pub fn dataset_names(&self) -> Option<Vec<String>> {
        if self.datasets.is_empty() {
            None
        } else {
            Some(self.datasets.iter().map(|d| d.name.clone()).collect())
        }
    }

    /// Replace the dataset list with `names`, in that order, keeping configured labels.
    pub fn select_datasets(&mut self, names: &[String]) -> Result<()> {
        let mut seen = BTreeSet::new();
        let mut labels = BTreeSet::new();
        let mut selected = Vec::with_capacity(names.len());
        for name in names {
            if !seen.insert(name.as_str()) {
                bail!("dataset given more than once: {}", name);
            }
            let label = self.label_for(name).to_string();
            if !labels.insert(label.clone()) {
                bail!("dataset label used twice: {}", label);
            }
            selected.push(DatasetSpec {
                name: name.clone(),
                label,
            });
        }
        self.datasets = selected;
        Ok(())
    }

    /// Legend label for a dataset.
    pub fn label_for<'a>(&'a self, dataset: &'a str) -> &'a str {
        self.datasets
            .iter()
            .find(|d| d.name == dataset)
            .map(|d| d.label.as_str())
            .unwrap_or(dataset)
    }

    /// Plotting options for an operation, falling back to config-wide defaults.
    pub fn style_for(&self, operation: &str) -> OperationStyle {
        let op = self.operations.get(operation);
        OperationStyle {
            title: op
                .and_then(|o| o.title.clone())
                .unwrap_or_else(|| operation.to_string()),
            x_limit: op.and_then(|o| o.x_limit),
            log_y: op.and_then(|o| o.log_y).unwrap_or(self.log_y),
        }
    }
}
