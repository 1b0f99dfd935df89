use wave2d::config::{RunSettings, SimulationConfig};
use wave2d::model::TopologyPolicy;
use clap::Parser;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Distributed finite-difference solver for the 2D wave equation"
)]
pub struct Cli {
    // Grid and time stepping
    #[arg(short = 'm', long = "rows-global", default_value = "256")]
    pub m: usize,
    #[arg(short = 'n', long = "cols-global", default_value = "256")]
    pub n: usize,
    #[arg(short = 'i', long, default_value = "4000")]
    pub max_iteration: usize,
    #[arg(short = 's', long, default_value = "20")]
    pub snapshot_frequency: usize,

    // Physical parameters
    #[arg(long, default_value = "1.0")]
    pub c: f64,
    #[arg(long, default_value = "1.0")]
    pub dx: f64,
    #[arg(long, default_value = "1.0")]
    pub dy: f64,
    /// Defaults to the stability limit min(dx, dy) / (c * sqrt 2)
    #[arg(long)]
    pub dt: Option<f64>,

    // Process grid
    #[arg(long, default_value = "0")]
    pub cart_rows: usize,
    #[arg(long, default_value = "0")]
    pub cart_cols: usize,
    #[arg(long, value_enum, default_value = "shared-root")]
    pub topology: Topology,

    // Execution
    #[arg(long, value_enum, default_value = "local")]
    pub backend: Backend,
    /// Worker count for the local backend
    #[arg(long, default_value = "1")]
    pub np: usize,
    /// Rayon threads per worker for the stencil, 0 for the serial loop
    #[arg(long, default_value = "0")]
    pub threads: usize,
    #[arg(long, default_value = "data")]
    pub output: PathBuf,

    #[arg(short, long)]
    pub verbose: bool,
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Launcher-level checks. Model parameters are checked by
    /// [`SimulationConfig::validate`].
    pub fn validate_parameters(&self) -> Result<(), String> {
        if self.backend == Backend::Local && self.np == 0 {
            return Err("--np must be at least 1".to_string());
        }
        if self.backend == Backend::Local
            && self.topology == Topology::DedicatedRoot
            && self.np < 2
        {
            return Err("A dedicated root needs --np of at least 2".to_string());
        }
        Ok(())
    }

    pub fn nr_snapshots(&self) -> usize {
        if self.snapshot_frequency == 0 {
            return 0;
        }
        self.max_iteration / self.snapshot_frequency + 1
    }

    pub fn simulation_config(&self) -> SimulationConfig {
        SimulationConfig {
            m: self.m,
            n: self.n,
            max_iteration: self.max_iteration,
            snapshot_frequency: self.snapshot_frequency,
            c: self.c,
            dx: self.dx,
            dy: self.dy,
            dt: self.dt,
            cart_dims: [self.cart_rows, self.cart_cols],
            policy: self.topology.into(),
        }
    }

    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            output_dir: self.output.clone(),
            threads: self.threads,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Topology {
    SharedRoot,
    DedicatedRoot,
}

impl From<Topology> for TopologyPolicy {
    fn from(topology: Topology) -> Self {
        match topology {
            Topology::SharedRoot => TopologyPolicy::SharedRoot,
            Topology::DedicatedRoot => TopologyPolicy::DedicatedRoot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    Local,
    Mpi,
}
