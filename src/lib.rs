//! motionseg - Sequential changepoint segmentation of motion-capture signals
//!
//! Partitions a noisy one-dimensional signal (speed, distance or
//! acceleration over time) into piecewise-linear regimes. A left segment
//! grows sample by sample while a fixed-width lookahead window is tested
//! for a change of slope; capture pauses split the series into independent
//! super-segments first.
//!
//! ```
//! use motionseg::segmentation::{segment_series, SegmentationConfig};
//! use motionseg::series::Series;
//!
//! let time: Vec<f64> = (0..30).map(|i| i as f64 * 0.01).collect();
//! let value: Vec<f64> = time.iter().map(|t| 0.4 * t).collect();
//! let series = Series::new(time, value).unwrap();
//!
//! let result = segment_series(&series, &SegmentationConfig::default()).unwrap();
//! assert_eq!(result.breakpoints.as_slice().first(), Some(&0));
//! assert_eq!(result.breakpoints.series_len(), 30);
//! ```

pub mod batch;
pub mod cli;
pub mod csv_output;
pub mod error;
pub mod json_output;
pub mod noise_filter;
pub mod regression;
pub mod segmentation;
pub mod series;
pub mod summary;
