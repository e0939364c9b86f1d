// Linear regression primitives and coefficient hypothesis tests
//
// Every component of the segmentation pipeline fits straight lines over
// index ranges and compares their slopes. This module provides:
// - `fit_line`: ordinary least squares, optionally forced through a point
//   (`Intersection::Forced`) so adjacent segments join end-to-end
// - `test_slope` / `test_slope_difference` / `test_joint`: two-sided t / F
//   tests of a fitted line against a reference slope or a reference line
//
// Fits fail loudly (`InsufficientData`, `DegenerateFit`) instead of
// returning NaN, so nothing non-finite can reach a breakpoint list.

mod fit;
mod statistics;

pub use fit::{fit_line, FittedLine, Intersection};
pub use statistics::{
    compare, f_upper_tail, median, student_t_two_sided, test_joint, test_slope,
    test_slope_difference, StatisticalTest, TestMode,
};
