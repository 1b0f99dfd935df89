use super::{Domain, ProcessTopology, TimeStepBuffers, WaveParameters};
use crate::boundary;
use crate::comm::Communicator;
use crate::config::SimulationConfig;
use crate::error::Result;
use crate::halo::HaloExchange;
use crate::snapshot::SnapshotWriter;
use crate::stencil::Integrator;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub config: SimulationConfig,
    pub params: WaveParameters,
    pub topology: ProcessTopology,
    /// `None` on a dedicated root.
    pub domain: Option<Domain>,
}

/// Initial displacement: a Gaussian bump centred on the grid.
pub fn initial_condition(i: usize, j: usize, m: usize, n: usize) -> f64 {
    let (i, j, m, n) = (i as f64, j as f64, m as f64, n as f64);
    let delta = (((i - m / 2.0) * (i - m / 2.0)) / m + ((j - n / 2.0) * (j - n / 2.0)) / n).sqrt();
    (-4.0 * delta * delta).exp()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub iterations: usize,
    pub snapshots: usize,
    pub elapsed: Duration,
    /// Global `max|u|` at the last snapshot.
    pub max_amplitude: f64,
}

#[derive(Debug)]
pub struct WaveSimulation {
    pub(super) context: SimulationContext,
    pub(super) buffers: Option<TimeStepBuffers>,
    pub(super) halo: HaloExchange,
    pub(super) integrator: Integrator,
    pub(super) snapshots: SnapshotWriter,
    pub(super) iteration: usize,
}

impl WaveSimulation {
    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    pub fn buffers(&self) -> Option<&TimeStepBuffers> {
        self.buffers.as_ref()
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Fill `prev` and `curr` with the initial bump; the field starts at rest.
    pub fn initialize(&mut self) {
        let (Some(domain), Some(buffers)) = (self.context.domain, self.buffers.as_mut()) else {
            return;
        };
        let (m, n) = (domain.total_m, domain.total_n);
        let init =
            |i: usize, j: usize| initial_condition(domain.row_offset + i, domain.col_offset + j, m, n);
        buffers.prev_mut().fill_owned(init);
        buffers.curr_mut().fill_owned(init);
    }

    pub fn exchange_halos(&mut self, comm: &dyn Communicator) -> Result<()> {
        match self.buffers.as_mut() {
            Some(buffers) => self.halo.exchange(comm, buffers.curr_mut()),
            None => Ok(()),
        }
    }

    pub fn apply_boundary(&mut self) {
        if let Some(buffers) = self.buffers.as_mut() {
            boundary::apply_reflective(buffers.curr_mut(), self.halo.neighbors());
        }
    }

    pub fn step(&mut self, comm: &dyn Communicator) -> Result<()> {
        self.exchange_halos(comm)?;
        self.apply_boundary();
        if let Some(buffers) = self.buffers.as_mut() {
            self.integrator.step(buffers);
            buffers.rotate();
        }
        self.iteration += 1;
        Ok(())
    }

    pub fn write_snapshot(&mut self, comm: &dyn Communicator, index: usize) -> Result<()> {
        let grid = self.buffers.as_ref().map(|b| b.curr());
        let path = self.snapshots.write(comm, index, grid)?;
        debug!(path = %path.display(), "snapshot written");
        Ok(())
    }

    pub fn local_max_abs(&self) -> f64 {
        self.buffers
            .as_ref()
            .map_or(0.0, |b| b.curr().max_abs())
    }

    pub fn global_max_abs(&self, comm: &dyn Communicator) -> Result<f64> {
        comm.all_reduce_max(self.local_max_abs())
    }

    /// Run every iteration, writing a snapshot every `snapshot_frequency`
    /// steps starting at step 0.
    pub fn run(&mut self, comm: &dyn Communicator) -> Result<RunSummary> {
        let max_iteration = self.context.config.max_iteration;
        let frequency = self.context.config.snapshot_frequency;

        self.snapshots.prepare(comm)?;
        comm.barrier()?;
        let start = Instant::now();

        let mut snapshots = 0;
        let mut max_amplitude = 0.0;
        for iteration in 0..=max_iteration {
            if iteration % frequency == 0 {
                let index = iteration / frequency;
                self.write_snapshot(comm, index)?;
                max_amplitude = self.global_max_abs(comm)?;
                snapshots += 1;
                if comm.is_root() {
                    info!(snapshot = index, iteration, max_amplitude, "snapshot");
                }
            }
            self.step(comm)?;
        }

        comm.barrier()?;
        let elapsed = start.elapsed();
        if comm.is_root() {
            info!("Simulation time: {:.6} s", elapsed.as_secs_f64());
        }

        Ok(RunSummary {
            iterations: self.iteration,
            snapshots,
            elapsed,
            max_amplitude,
        })
    }
}
