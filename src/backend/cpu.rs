//! Serial CPU backend

use super::{count_pixel, Confusion, NumericBackend};
use ndarray::{ArrayD, Zip};

/// Single-threaded ndarray backend
pub struct CpuBackend;

impl NumericBackend for CpuBackend {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn unary_map(&self, a: &ArrayD<f32>, f: &(dyn Fn(f32) -> f32 + Sync)) -> ArrayD<f32> {
        a.mapv(f)
    }

    fn zip_map(
        &self,
        a: &ArrayD<f32>,
        b: &ArrayD<f32>,
        f: &(dyn Fn(f32, f32) -> f32 + Sync),
    ) -> ArrayD<f32> {
        Zip::from(a).and(b).map_collect(|&x, &y| f(x, y))
    }

    fn zip_sum(
        &self,
        a: &ArrayD<f32>,
        b: &ArrayD<f32>,
        f: &(dyn Fn(f32, f32) -> f64 + Sync),
    ) -> f64 {
        let mut acc = 0.0f64;
        Zip::from(a).and(b).for_each(|&x, &y| acc += f(x, y));
        acc
    }

    fn sum(&self, a: &ArrayD<f32>) -> f64 {
        a.iter().map(|&x| x as f64).sum()
    }

    fn confusion(&self, probs: &ArrayD<f32>, mask: &ArrayD<f32>, threshold: f32) -> Confusion {
        let mut counts = Confusion::default();
        Zip::from(probs)
            .and(mask)
            .for_each(|&p, &m| count_pixel(&mut counts, p, m, threshold));
        counts
    }
}
