use crate::comm::{local, Communicator};
use crate::config::{RunSettings, SimulationConfig};
use crate::error::Result;
use crate::model::{RunSummary, SimulationFactory};

/// Everything one worker does: agree on the configuration, build the tile,
/// run. Only the root's `config` is used.
pub fn run_worker(
    comm: &dyn Communicator,
    config: Option<SimulationConfig>,
    settings: &RunSettings,
) -> Result<RunSummary> {
    let config = SimulationConfig::share(comm, config)?;
    let mut simulation = SimulationFactory::create(comm, config, settings)?;
    simulation.run(comm)
}

/// Run `np` workers as threads of this process. Summaries come back in rank
/// order; on failure the error that started the shutdown is returned.
pub fn run_local(
    np: usize,
    config: SimulationConfig,
    settings: &RunSettings,
) -> Result<Vec<RunSummary>> {
    let results = local::launch(np, |comm| {
        let local = comm.is_root().then(|| config.clone());
        run_worker(&comm, local, settings)
    });
    local::collect(results)
}

/// Run this process as one rank of an MPI job. Any failure after MPI is up
/// aborts the whole job with the error's exit code.
#[cfg(feature = "mpi")]
pub fn run_mpi(config: SimulationConfig, settings: &RunSettings) -> Result<RunSummary> {
    use crate::comm::mpi::MpiComm;
    use crate::error::Error;

    let universe =
        mpi::initialize().ok_or_else(|| Error::mpi_error(-1, "MPI is already initialized"))?;
    let comm = MpiComm::new(universe.world());
    let local = comm.is_root().then_some(config);
    match run_worker(&comm, local, settings) {
        Ok(summary) => Ok(summary),
        Err(e) => {
            tracing::error!(rank = comm.rank(), "{}", e);
            comm.abort(e.exit_code())
        }
    }
}
