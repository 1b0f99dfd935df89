use super::wave::{SimulationContext, WaveSimulation};
use super::{Domain, ProcessTopology, TimeStepBuffers};
use crate::comm::Communicator;
use crate::config::{RunSettings, SimulationConfig};
use crate::error::Result;
use crate::halo::HaloExchange;
use crate::snapshot::SnapshotWriter;
use crate::stencil::Integrator;
use tracing::{debug, info};

pub struct SimulationFactory;

impl SimulationFactory {
    /// Build this rank's simulation from a configuration every rank agrees
    /// on, with the initial condition already in place.
    pub fn create(
        comm: &dyn Communicator,
        config: SimulationConfig,
        settings: &RunSettings,
    ) -> Result<WaveSimulation> {
        config.validate()?;
        let params = config.wave_parameters();
        let global = config.global();

        let topology = Self::create_topology(comm, &config)?;
        let domain = Domain::from_topology(&topology, global);
        match (&topology.coords, &domain) {
            (Some(coords), Some(domain)) => debug!(
                ?coords,
                rows = domain.local_m,
                cols = domain.local_n,
                row_offset = domain.row_offset,
                col_offset = domain.col_offset,
                neighbors = ?topology.neighbors,
                "tile assigned"
            ),
            _ => debug!("no tile, coordinating only"),
        }

        let buffers = domain
            .as_ref()
            .map(|d| {
                debug!(
                    bytes = 3 * d.size_with_halo() * std::mem::size_of::<f64>(),
                    "allocating time levels"
                );
                TimeStepBuffers::new(d.local_m, d.local_n)
            })
            .transpose()?;
        let halo = HaloExchange::new(&topology);
        let integrator = Integrator::new(&params, settings.threads)?;
        let snapshots = SnapshotWriter::new(&settings.output_dir, domain.as_ref(), global);

        let mut simulation = WaveSimulation {
            context: SimulationContext {
                config,
                params,
                topology,
                domain,
            },
            buffers,
            halo,
            integrator,
            snapshots,
            iteration: 0,
        };
        simulation.initialize();
        Ok(simulation)
    }

    fn create_topology(
        comm: &dyn Communicator,
        config: &SimulationConfig,
    ) -> Result<ProcessTopology> {
        let topology = ProcessTopology::new(
            comm.size(),
            comm.rank(),
            config.policy,
            config.cart_dims,
            config.global(),
        )?;
        if comm.is_root() {
            info!(
                "Process grid {}x{} ({:?})",
                topology.dims[0], topology.dims[1], topology.policy
            );
        }
        Ok(topology)
    }
}
