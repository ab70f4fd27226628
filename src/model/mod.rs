//! Chart model: combine built series with chart config into serializable views.

use crate::Result;
use crate::chart::{self, ChartConfig};
use crate::render::chart_file_name;
use crate::series::SeriesMap;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesView {
    pub dataset: String,
    pub label: String,
    pub color: String,
    /// SVG `stroke-dasharray`; empty for a solid line.
    pub dash: String,
    /// Observations that fed the series before smoothing.
    pub samples: usize,
    /// `[in_total, smoothed time_delta]` pairs.
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartView {
    pub operation: String,
    pub title: String,
    pub file_name: String,
    pub x_limit: Option<u64>,
    pub log_y: bool,
    pub series: Vec<SeriesView>,
    pub totals: TotalsView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TotalsView {
    pub series: usize,
    pub points: usize,
    pub samples: usize,
}

/// Build one chart per operation. Performs:
/// - order series by the config's dataset list (table order otherwise)
/// - assign colour and dash by position in that order
/// - drop non-positive values from log-scale charts (warned)
pub fn build_chart_views(series: &SeriesMap, config: &ChartConfig) -> Result<Vec<ChartView>> {
    let order = config.dataset_names();
    let mut charts = Vec::with_capacity(series.len());

    for (operation, by_dataset) in series {
        let style = config.style_for(operation);

        let datasets: Vec<&String> = match &order {
            Some(names) => names.iter().filter(|n| by_dataset.contains_key(*n)).collect(),
            None => by_dataset.keys().collect(),
        };

        let mut views = Vec::with_capacity(datasets.len());
        let mut total_points = 0usize;
        let mut total_samples = 0usize;

        for (i, dataset) in datasets.into_iter().enumerate() {
            let Some(ts) = by_dataset.get(dataset) else {
                continue;
            };

            let mut points: Vec<[f64; 2]> = Vec::with_capacity(ts.points.len());
            let mut dropped = 0usize;
            for p in &ts.points {
                if style.log_y && p.time_delta <= 0.0 {
                    dropped += 1;
                    continue;
                }
                points.push([p.in_total as f64, p.time_delta]);
            }
            if dropped > 0 {
                log::warn!(
                    "{} / {}: dropped {} non-positive point(s) from log-scale chart",
                    operation,
                    dataset,
                    dropped
                );
            }
            if points.is_empty() {
                log::warn!(
                    "{} / {}: nothing to plot ({} sample(s) before smoothing)",
                    operation,
                    dataset,
                    ts.samples
                );
            }

            total_points += points.len();
            total_samples += ts.samples;
            views.push(SeriesView {
                dataset: dataset.clone(),
                label: config.label_for(dataset).to_string(),
                color: chart::color_at(i).to_string(),
                dash: chart::dash_at(i).to_string(),
                samples: ts.samples,
                points,
            });
        }

        charts.push(ChartView {
            operation: operation.clone(),
            title: style.title,
            file_name: chart_file_name(operation),
            x_limit: style.x_limit,
            log_y: style.log_y,
            totals: TotalsView {
                series: views.len(),
                points: total_points,
                samples: total_samples,
            },
            series: views,
        });
    }

    Ok(charts)
}
