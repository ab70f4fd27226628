//! Chart layer: config schema and per-series line styling.
//!
//! Kept apart from series building and rendering. It owns:
//! - chart config (charts.json) with dataset aliases and per-operation options
//! - the colour and dash cycles used for consecutive series

pub mod config;

pub use config::ChartConfig;

/// Line colours, cycled in dataset order: blue, green, red, cyan, magenta, yellow, black.
pub const COLORS: [&str; 7] = [
    "#0000ff", "#008000", "#ff0000", "#00bfbf", "#bf00bf", "#bfbf00", "#000000",
];

/// SVG dash patterns, cycled in dataset order: solid, dashed, dotted, dash-dot.
pub const DASHES: [&str; 4] = ["", "12 6", "3 5", "12 5 3 5"];

pub fn color_at(i: usize) -> &'static str {
    COLORS[i % COLORS.len()]
}

pub fn dash_at(i: usize) -> &'static str {
    DASHES[i % DASHES.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_cycle() {
        assert_eq!(color_at(0), color_at(COLORS.len()));
        assert_eq!(dash_at(1), dash_at(1 + DASHES.len()));
        assert_ne!(color_at(0), color_at(1));
        assert_eq!(dash_at(0), "");
    }
}
