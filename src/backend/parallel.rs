//! Rayon-parallel CPU backend

use super::{count_pixel, Confusion, NumericBackend};
use ndarray::{ArrayD, Zip};
use rayon::prelude::*;

const CHUNK: usize = 4096;

/// Rayon-parallel ndarray backend
///
/// Parallelism stays inside each call: results are bitwise identical to
/// [`CpuBackend`](super::CpuBackend) for maps and confusion counts, and
/// reductions keep exact integer / deterministically-chunked accumulation.
pub struct ParallelBackend;

impl NumericBackend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn unary_map(&self, a: &ArrayD<f32>, f: &(dyn Fn(f32) -> f32 + Sync)) -> ArrayD<f32> {
        Zip::from(a).par_map_collect(|&x| f(x))
    }

    fn zip_map(
        &self,
        a: &ArrayD<f32>,
        b: &ArrayD<f32>,
        f: &(dyn Fn(f32, f32) -> f32 + Sync),
    ) -> ArrayD<f32> {
        Zip::from(a).and(b).par_map_collect(|&x, &y| f(x, y))
    }

    fn zip_sum(
        &self,
        a: &ArrayD<f32>,
        b: &ArrayD<f32>,
        f: &(dyn Fn(f32, f32) -> f64 + Sync),
    ) -> f64 {
        match (a.as_slice(), b.as_slice()) {
            // Chunk sums are collected in order so the final reduction is
            // deterministic regardless of thread scheduling.
            (Some(xs), Some(ys)) => xs
                .par_chunks(CHUNK)
                .zip(ys.par_chunks(CHUNK))
                .map(|(xc, yc)| {
                    xc.iter()
                        .zip(yc.iter())
                        .map(|(&x, &y)| f(x, y))
                        .sum::<f64>()
                })
                .collect::<Vec<_>>()
                .into_iter()
                .sum(),
            // Non-contiguous views take the serial path
            _ => {
                let mut acc = 0.0f64;
                Zip::from(a).and(b).for_each(|&x, &y| acc += f(x, y));
                acc
            }
        }
    }

    fn sum(&self, a: &ArrayD<f32>) -> f64 {
        match a.as_slice() {
            Some(xs) => xs
                .par_chunks(CHUNK)
                .map(|c| c.iter().map(|&x| x as f64).sum::<f64>())
                .collect::<Vec<_>>()
                .into_iter()
                .sum(),
            _ => a.iter().map(|&x| x as f64).sum(),
        }
    }

    fn confusion(&self, probs: &ArrayD<f32>, mask: &ArrayD<f32>, threshold: f32) -> Confusion {
        match (probs.as_slice(), mask.as_slice()) {
            (Some(ps), Some(ms)) => ps
                .par_chunks(CHUNK)
                .zip(ms.par_chunks(CHUNK))
                .map(|(pc, mc)| {
                    let mut counts = Confusion::default();
                    for (&p, &m) in pc.iter().zip(mc.iter()) {
                        count_pixel(&mut counts, p, m, threshold);
                    }
                    counts
                })
                .reduce(Confusion::default, |a, b| a + b),
            _ => {
                let mut counts = Confusion::default();
                Zip::from(probs)
                    .and(mask)
                    .for_each(|&p, &m| count_pixel(&mut counts, p, m, threshold));
                counts
            }
        }
    }
}
