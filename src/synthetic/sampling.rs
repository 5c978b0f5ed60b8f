//! Random draws used by the generator.

use rand::seq::SliceRandom;
use rand::Rng;

/// Standard normal draw scaled to `mean` and `sd` (Box-Muller).
pub fn gauss<R: Rng + ?Sized>(rng: &mut R, mean: f64, sd: f64) -> f64 {
    // Open interval keeps ln() finite.
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + z * sd
}

/// Normal draw centred in `[low, high]` with sd = range / 4, clipped to the
/// range.
pub fn clipped_normal<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    let mid = (low + high) / 2.0;
    let sd = (high - low) / 4.0;
    gauss(rng, mid, sd).clamp(low, high)
}

pub fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
    rng.gen_range(low..=high)
}

/// Index drawn proportionally to `weights`. All-zero weights pick index 0.
pub fn weighted_index<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> usize {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return 0;
    }
    let mut target = rng.gen_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        if target < *w {
            return i;
        }
        target -= w;
    }
    weights.len() - 1
}

/// `k` distinct items in random order (fewer if the pool is smaller).
pub fn sample<R: Rng + ?Sized, T: Copy>(rng: &mut R, pool: &[T], k: usize) -> Vec<T> {
    pool.choose_multiple(rng, k.min(pool.len()))
        .copied()
        .collect()
}

pub fn pick<'a, R: Rng + ?Sized, T>(rng: &mut R, pool: &'a [T]) -> Option<&'a T> {
    pool.choose(rng)
}

pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen_bool(p.clamp(0.0, 1.0))
}

#[must_use]
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}
