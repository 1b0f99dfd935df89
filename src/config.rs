use crate::comm::Communicator;
use crate::error::{Error, Result};
use crate::model::{TopologyPolicy, WaveParameters};
use std::path::PathBuf;

/// Run configuration shared by every worker. Rank 0 reads it, the others
/// receive it through [`SimulationConfig::share`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub m: usize,
    pub n: usize,
    pub max_iteration: usize,
    pub snapshot_frequency: usize,
    pub c: f64,
    pub dx: f64,
    pub dy: f64,
    /// Explicit time step; `None` uses the stability limit.
    pub dt: Option<f64>,
    /// Requested process grid, 0 meaning "choose".
    pub cart_dims: [usize; 2],
    pub policy: TopologyPolicy,
}

/// Per-process settings that do not take part in the broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub threads: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            threads: 0,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            m: 256,
            n: 256,
            max_iteration: 4000,
            snapshot_frequency: 20,
            c: 1.0,
            dx: 1.0,
            dy: 1.0,
            dt: None,
            cart_dims: [0, 0],
            policy: TopologyPolicy::SharedRoot,
        }
    }
}

const PACKED_LEN: usize = 12;

impl SimulationConfig {
    pub fn global(&self) -> [usize; 2] {
        [self.m, self.n]
    }

    pub fn wave_parameters(&self) -> WaveParameters {
        match self.dt {
            Some(dt) => WaveParameters::with_dt(self.c, self.dx, self.dy, dt),
            None => WaveParameters::new(self.c, self.dx, self.dy),
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.max_iteration / self.snapshot_frequency + 1
    }

    pub fn validate(&self) -> Result<()> {
        if self.m < 2 || self.n < 2 {
            return Err(Error::InvalidParameters(format!(
                "Grid must be at least 2x2 for reflective boundaries, got {}x{}",
                self.m, self.n
            )));
        }
        if self.snapshot_frequency == 0 {
            return Err(Error::invalid_parameters(
                "Snapshot frequency must be >= 1",
            ));
        }
        self.wave_parameters().validate()
    }

    fn pack(&self) -> [f64; PACKED_LEN] {
        [
            self.m as f64,
            self.n as f64,
            self.max_iteration as f64,
            self.snapshot_frequency as f64,
            self.c,
            self.dx,
            self.dy,
            self.dt.unwrap_or(0.0),
            self.cart_dims[0] as f64,
            self.cart_dims[1] as f64,
            self.policy.to_code(),
            if self.dt.is_some() { 1.0 } else { 0.0 },
        ]
    }

    fn unpack(packed: &[f64; PACKED_LEN]) -> Result<Self> {
        let count = |v: f64, name: &str| -> Result<usize> {
            if v.is_finite() && v >= 0.0 && v.fract() == 0.0 {
                Ok(v as usize)
            } else {
                Err(Error::InvalidParameters(format!(
                    "Received {} = {} is not a count",
                    name, v
                )))
            }
        };
        Ok(Self {
            m: count(packed[0], "M")?,
            n: count(packed[1], "N")?,
            max_iteration: count(packed[2], "max_iteration")?,
            snapshot_frequency: count(packed[3], "snapshot_frequency")?,
            c: packed[4],
            dx: packed[5],
            dy: packed[6],
            dt: (packed[11] != 0.0).then_some(packed[7]),
            cart_dims: [count(packed[8], "rows")?, count(packed[9], "cols")?],
            policy: TopologyPolicy::from_code(packed[10]),
        })
    }

    /// Broadcast the root's configuration. Rank 0 passes `Some`, the other
    /// ranks' argument is ignored. Every rank returns the same value.
    pub fn share<C: Communicator + ?Sized>(comm: &C, local: Option<Self>) -> Result<Self> {
        let mut packed = [0.0; PACKED_LEN];
        if comm.is_root() {
            let config = local.ok_or_else(|| {
                Error::invalid_parameters("Root rank has no configuration to share")
            })?;
            packed = config.pack();
            comm.broadcast(0, &mut packed)?;
            Ok(config)
        } else {
            comm.broadcast(0, &mut packed)?;
            Self::unpack(&packed)
        }
    }
}
