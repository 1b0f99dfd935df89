use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveParameters {
    pub c: f64,  // wave speed
    pub dx: f64, // grid spacing along columns
    pub dy: f64, // grid spacing along rows
    pub dt: f64, // time step
}

impl WaveParameters {
    /// Parameters with `dt` set to the stability limit of the 5-point stencil.
    pub fn new(c: f64, dx: f64, dy: f64) -> Self {
        let mut params = Self { c, dx, dy, dt: 0.0 };
        params.dt = params.stability_limit();
        params
    }

    /// Parameters with an explicit time step. No stability check is made here.
    pub fn with_dt(c: f64, dx: f64, dy: f64, dt: f64) -> Self {
        Self { c, dx, dy, dt }
    }

    /// Largest stable time step: `min(dx, dy) / (c * sqrt(2))`.
    pub fn stability_limit(&self) -> f64 {
        self.dx.min(self.dy) / (self.c * std::f64::consts::SQRT_2)
    }

    /// Laplacian weight of the leapfrog update, `dt² c² / (dx dy)`.
    pub fn coefficient(&self) -> f64 {
        (self.dt * self.dt * self.c * self.c) / (self.dx * self.dy)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.c) {
            return Err(Error::InvalidParameters(
                "Wave speed c must be > 0".to_string(),
            ));
        }
        if !positive(self.dx) || !positive(self.dy) {
            return Err(Error::InvalidParameters(
                "Grid spacings dx and dy must be > 0".to_string(),
            ));
        }
        if !positive(self.dt) {
            return Err(Error::InvalidParameters(
                "Time step must be > 0".to_string(),
            ));
        }

        let max_stable_dt = self.stability_limit();
        if self.dt > max_stable_dt {
            return Err(Error::InvalidParameters(format!(
                "Time step {} exceeds stability limit (max: {})",
                self.dt, max_stable_dt
            )));
        }

        Ok(())
    }
}

impl Default for WaveParameters {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0)
    }
}
