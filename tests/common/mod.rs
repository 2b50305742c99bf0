//! Shared fixtures: a small synthetic crop dataset

#![allow(dead_code)]

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Write as _;
use std::path::Path;

/// Cluster centers (temperature, humidity, ph, rainfall) per crop
pub const CROPS: [(&str, [f64; 4]); 5] = [
    ("rice", [23.5, 82.0, 6.4, 235.0]),
    ("maize", [22.0, 65.0, 6.2, 85.0]),
    ("chickpea", [18.5, 17.0, 7.3, 80.0]),
    ("coffee", [25.5, 58.0, 6.8, 160.0]),
    ("mango", [31.5, 50.0, 5.8, 95.0]),
];

const SPREAD: [f64; 4] = [1.0, 2.5, 0.15, 8.0];

pub const HEADER: &str = "N,P,K,temperature,humidity,ph,rainfall,label";

/// CSV text with `rows_per_class` rows for every crop in [`CROPS`]
pub fn crop_csv(rows_per_class: usize, seed: u64) -> String {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut out = String::from(HEADER);
    out.push('\n');
    for i in 0..rows_per_class {
        for (label, center) in CROPS.iter() {
            let v: Vec<f64> = center
                .iter()
                .zip(SPREAD.iter())
                .map(|(c, s)| c + rng.gen_range(-s..*s))
                .collect();
            writeln!(
                out,
                "{},{},{},{:.4},{:.4},{:.4},{:.4},{}",
                50 + i % 40,
                40 + i % 20,
                30 + i % 10,
                v[0],
                v[1],
                v[2],
                v[3],
                label
            )
            .unwrap();
        }
    }
    out
}

pub fn write_crop_csv(path: &Path, rows_per_class: usize, seed: u64) {
    std::fs::write(path, crop_csv(rows_per_class, seed)).unwrap();
}

pub fn sorted_labels() -> Vec<String> {
    let mut labels: Vec<String> = CROPS.iter().map(|(l, _)| l.to_string()).collect();
    labels.sort();
    labels
}
