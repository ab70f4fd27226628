//! Sliding-window mean over an index-sorted series.
//!
//! Only full windows produce a value. A series of `n` points smoothed with a
//! window of `w` yields `n - w + 1` points, or none when `n < w`. The policy
//! decides which index a window's mean is placed at and therefore which end of
//! the series loses points.

use crate::error::SeriesError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WindowPolicy {
    /// Mean of the point and the `w - 1` points before it. The first `w - 1`
    /// points have no value.
    #[default]
    Trailing,
    /// Mean of a window around the point, `(w - 1) / 2` points after it and the
    /// rest before it. Points near both ends have no value.
    Centered,
}

/// A validated smoothing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    size: usize,
    policy: WindowPolicy,
}

impl Window {
    pub fn new(size: usize, policy: WindowPolicy) -> Result<Self, SeriesError> {
        if size < 1 {
            return Err(SeriesError::InvalidWindowSize(size));
        }
        Ok(Self { size, policy })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Position, within a window, of the point the window's mean is placed at.
    fn anchor(&self) -> usize {
        match self.policy {
            WindowPolicy::Trailing => self.size - 1,
            WindowPolicy::Centered => self.size - 1 - (self.size - 1) / 2,
        }
    }

    /// Smooth `values`, returning `(position, mean)` pairs where `position`
    /// indexes into `values`. Positions are strictly increasing.
    pub fn apply(&self, values: &[f64]) -> Vec<(usize, f64)> {
        let anchor = self.anchor();
        values
            .windows(self.size)
            .enumerate()
            .map(|(start, w)| (start + anchor, w.iter().sum::<f64>() / w.len() as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn trailing(size: usize) -> Result<Window, SeriesError> {
        Window::new(size, WindowPolicy::Trailing)
    }

    #[test]
    fn zero_window_is_rejected() {
        assert_eq!(trailing(0), Err(SeriesError::InvalidWindowSize(0)));
        assert_eq!(
            Window::new(0, WindowPolicy::Centered),
            Err(SeriesError::InvalidWindowSize(0))
        );
    }

    #[test]
    fn unit_window_is_identity() {
        let values = [3.0, 5.0, 0.5, 7.25];
        for policy in [WindowPolicy::Trailing, WindowPolicy::Centered] {
            let out = Window::new(1, policy).unwrap().apply(&values);
            assert_eq!(out, vec![(0, 3.0), (1, 5.0), (2, 0.5), (3, 7.25)]);
        }
    }

    #[test]
    fn trailing_drops_leading_points() {
        let out = trailing(3).unwrap().apply(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(out, vec![(2, 2.0), (3, 3.0), (4, 4.0)]);
    }

    #[test]
    fn centered_drops_points_at_both_ends() {
        let w = Window::new(3, WindowPolicy::Centered).unwrap();
        assert_eq!(
            w.apply(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            vec![(1, 2.0), (2, 3.0), (3, 4.0)]
        );

        // Even widths lean backwards: one point after, two before.
        let w = Window::new(4, WindowPolicy::Centered).unwrap();
        assert_eq!(w.apply(&[1.0, 2.0, 3.0, 4.0, 5.0]), vec![(2, 2.5), (3, 3.5)]);
    }

    #[test]
    fn full_length_window_yields_one_point() {
        let values = [2.0, 4.0, 6.0, 8.0];
        assert_eq!(trailing(4).unwrap().apply(&values), vec![(3, 5.0)]);
        assert_eq!(
            Window::new(4, WindowPolicy::Centered).unwrap().apply(&values),
            vec![(2, 5.0)]
        );
    }

    #[test]
    fn short_series_yields_nothing() {
        assert!(trailing(5).unwrap().apply(&[1.0, 2.0]).is_empty());
        assert!(trailing(1).unwrap().apply(&[]).is_empty());
    }
}
