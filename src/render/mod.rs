//! Output documents: one self-contained HTML chart per operation.

pub mod html;

pub use html::render_chart_html;

use crate::Result;
use crate::model::ChartView;

use anyhow::Context;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("file name pattern is valid"));

/// Output file name for an operation's chart: `perf-<operation>.html`, with
/// every character outside `[A-Za-z0-9._-]` replaced by `_`.
pub fn chart_file_name(operation: &str) -> String {
    let stem = UNSAFE_NAME_CHARS.replace_all(operation.trim(), "_");
    let stem = if stem.is_empty() { "_".into() } else { stem };
    format!("perf-{}.html", stem)
}

/// Render every chart into `out_dir`, creating it if needed.
pub fn write_charts(charts: &[ChartView], out_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = out_dir.join(&chart.file_name);
        if written.contains(&path) {
            anyhow::bail!(
                "operation '{}' maps to {} which another operation already uses",
                chart.operation,
                path.display()
            );
        }
        let html = render_chart_html(chart)?;
        fs::write(&path, html).with_context(|| format!("write {}", path.display()))?;
        log::info!(
            "wrote {} ({} series, {} points)",
            path.display(),
            chart.totals.series,
            chart.totals.points
        );
        written.push(path);
    }
    Ok(written)
}
