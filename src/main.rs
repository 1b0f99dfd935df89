mod cli;
use cli::{Backend, Cli};
use wave2d::error::{Error, Result};
use wave2d::{driver, logging};

fn run(cli: &Cli) -> Result<()> {
    let config = cli.simulation_config();
    let settings = cli.run_settings();
    tracing::debug!(?config, ?settings, snapshots = cli.nr_snapshots(), "starting");

    match cli.backend {
        Backend::Local => driver::run_local(cli.np, config, &settings).map(|_| ()),
        #[cfg(feature = "mpi")]
        Backend::Mpi => driver::run_mpi(config, &settings).map(|_| ()),
        #[cfg(not(feature = "mpi"))]
        Backend::Mpi => Err(Error::invalid_parameters(
            "This build has no MPI support, rebuild with --features mpi",
        )),
    }
}

fn main() {
    let cli = Cli::from_args();
    logging::init(cli.verbose, cli.quiet);
    if let Err(e) = cli.validate_parameters() {
        eprintln!("Error: {}", e);
        std::process::exit(Error::InvalidParameters(e).exit_code());
    }
    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}
