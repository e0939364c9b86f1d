// Signal generators for integration tests
//
// Gaussian noise comes from a seeded `StdRng` through the Box-Muller
// transform, so every test run sees the same samples.

#![allow(dead_code)]

use motionseg::series::Series;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Sampling interval of the capture rig (100 Hz)
pub const DT: f64 = 0.01;

pub fn gaussian(rng: &mut StdRng, sigma: f64) -> f64 {
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// One linear regime: value = intercept + slope·t + noise
pub fn single_regime(n: usize, slope: f64, intercept: f64, sigma: f64, seed: u64) -> Series {
    let mut rng = StdRng::seed_from_u64(seed);
    let time: Vec<f64> = (0..n).map(|i| i as f64 * DT).collect();
    let value = time
        .iter()
        .map(|&t| intercept + slope * t + gaussian(&mut rng, sigma))
        .collect();
    Series::new(time, value).unwrap()
}

/// Rising at slope 1 for `junction` samples, then falling at slope -1
pub fn peak(n: usize, junction: usize, sigma: f64, seed: u64) -> Series {
    let mut rng = StdRng::seed_from_u64(seed);
    let t_peak = junction as f64 * DT;
    let time: Vec<f64> = (0..n).map(|i| i as f64 * DT).collect();
    let value = time
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let trend = if i < junction { t } else { t_peak - (t - t_peak) };
            trend + gaussian(&mut rng, sigma)
        })
        .collect();
    Series::new(time, value).unwrap()
}

/// Hand reach at 100 Hz: 0.413·t up to 0.3 s, then -0.5·t + 0.27, plus noise
pub fn reach(sigma: f64, seed: u64) -> Series {
    let mut rng = StdRng::seed_from_u64(seed);
    let time: Vec<f64> = (0..60).map(|i| i as f64 * DT).collect();
    let value = time
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let trend = if i < 30 { 0.413 * t } else { -0.5 * t + 0.27 };
            trend + gaussian(&mut rng, sigma)
        })
        .collect();
    Series::new(time, value).unwrap()
}

/// Copy of `series` with `pause` seconds added to every sample from `at` on
pub fn with_pause(series: &Series, at: usize, pause: f64) -> Series {
    let time = series
        .time()
        .iter()
        .enumerate()
        .map(|(i, &t)| if i >= at { t + pause } else { t })
        .collect();
    Series::new(time, series.value().to_vec()).unwrap()
}

/// Write `series` as a `time,value` file with a header line
pub fn write_series(dir: &Path, name: &str, series: &Series) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "time,value").unwrap();
    for (t, v) in series.time().iter().zip(series.value()) {
        writeln!(file, "{},{}", t, v).unwrap();
    }
    path
}
