//! # Spectral similarity
//!
//! Cosine similarity between two nominal-mass spectra. Each spectrum is laid
//! out as a dense intensity vector indexed by m/z from 0 to the largest m/z
//! present in either spectrum; missing masses have zero intensity. If the same
//! mass occurs twice in a spectrum, the later peak wins.

use crate::compound::{max_mz, Peak};

/// Cosine similarity of two peak lists, in `[0, 1]` for non-negative intensities.
///
/// Returns `None` when either list is empty (the spectra are incomparable).
/// An all-zero intensity vector yields `Some(0.0)`.
pub fn similarity(a: &[Peak], b: &[Peak]) -> Option<f64> {
    let len = max_mz(a)?.max(max_mz(b)?) as usize + 1;
    let va = dense_vector(a, len);
    let vb = dense_vector(b, len);
    Some(cosine_similarity(&va, &vb))
}

/// Similarity with incomparable spectra scored as 0.
pub fn similarity_or_zero(a: &[Peak], b: &[Peak]) -> f64 {
    similarity(a, b).unwrap_or(0.0)
}

/// Lay out a peak list as a dense vector of length `len`.
fn dense_vector(peaks: &[Peak], len: usize) -> Vec<f64> {
    let mut vector = vec![0.0; len];
    for peak in peaks {
        vector[peak.mz as usize] = peak.intensity;
    }
    vector
}

/// Cosine similarity of two equal-length vectors; 0 if either has zero norm.
///
/// Each vector is scaled by its largest magnitude first, so finite inputs
/// of any size cannot overflow the dot product.
pub fn cosine_similarity(v1: &[f64], v2: &[f64]) -> f64 {
    if v1.len() != v2.len() {
        return 0.0;
    }
    let scale1 = max_abs(v1);
    let scale2 = max_abs(v2);
    if scale1 == 0.0 || scale2 == 0.0 || !scale1.is_finite() || !scale2.is_finite() {
        return 0.0;
    }

    let mut dot = 0.0;
    let mut norm1 = 0.0;
    let mut norm2 = 0.0;
    for (x, y) in v1.iter().zip(v2) {
        let (x, y) = (x / scale1, y / scale2);
        dot += x * y;
        norm1 += x * x;
        norm2 += y * y;
    }
    dot / (norm1.sqrt() * norm2.sqrt())
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |max, v| max.max(v.abs()))
}
