use crate::error::{Error, Result};
use crate::model::{Grid, TimeStepBuffers, WaveParameters};
use rayon::prelude::*;
use rayon::ThreadPool;

#[inline(always)]
fn update(prev: f64, center: f64, north: f64, south: f64, west: f64, east: f64, k: f64) -> f64 {
    -prev + 2.0 * center + k * (north + south + west + east - 4.0 * center)
}

/// One owned row of `next`, `row` being the full halo-padded row `i + 1`.
#[inline]
fn update_row(row: &mut [f64], i: usize, prev: &[f64], curr: &[f64], stride: usize, k: f64) {
    let base = (i + 1) * stride;
    for j in 1..stride - 1 {
        let idx = base + j;
        row[j] = update(
            prev[idx],
            curr[idx],
            curr[idx - stride],
            curr[idx + stride],
            curr[idx - 1],
            curr[idx + 1],
            k,
        );
    }
}

/// `next = -prev + 2 curr + k * laplacian(curr)` over the owned cells.
pub fn integrate(prev: &Grid, curr: &Grid, next: &mut Grid, k: f64) {
    let stride = next.stride();
    let rows = next.rows();
    let (p, c) = (prev.as_slice(), curr.as_slice());
    next.as_mut_slice()[stride..stride * (rows + 1)]
        .chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| update_row(row, i, p, c, stride, k));
}

/// Same as [`integrate`], rows spread over the current rayon pool.
pub fn integrate_parallel(prev: &Grid, curr: &Grid, next: &mut Grid, k: f64) {
    let stride = next.stride();
    let rows = next.rows();
    let (p, c) = (prev.as_slice(), curr.as_slice());
    next.as_mut_slice()[stride..stride * (rows + 1)]
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(i, row)| update_row(row, i, p, c, stride, k));
}

/// Time integrator of one tile.
pub struct Integrator {
    coefficient: f64,
    pool: Option<ThreadPool>,
}

impl Integrator {
    /// `threads == 0` runs the serial loop.
    pub fn new(params: &WaveParameters, threads: usize) -> Result<Self> {
        let pool = if threads > 0 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| {
                        Error::InvalidParameters(format!("Failed to build stencil pool: {}", e))
                    })?,
            )
        } else {
            None
        };
        Ok(Self {
            coefficient: params.coefficient(),
            pool,
        })
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Write the next time level into `buffers.next()`.
    pub fn step(&self, buffers: &mut TimeStepBuffers) {
        let (prev, curr, next) = buffers.split();
        let k = self.coefficient;
        match &self.pool {
            Some(pool) => pool.install(|| integrate_parallel(prev, curr, next, k)),
            None => integrate(prev, curr, next, k),
        }
    }
}

impl std::fmt::Debug for Integrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Integrator")
            .field("coefficient", &self.coefficient)
            .field("threads", &self.pool.as_ref().map(|p| p.current_num_threads()))
            .finish()
    }
}
