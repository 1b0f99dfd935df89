use wave2d::comm::{local, Communicator};
use wave2d::config::{RunSettings, SimulationConfig};
use wave2d::driver::run_local;
use wave2d::error::{Error, ErrorKind};
use wave2d::model::SimulationFactory;

#[test]
fn unstable_time_step_is_rejected_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = RunSettings {
        output_dir: dir.path().join("data"),
        threads: 0,
    };
    let config = SimulationConfig {
        m: 16,
        n: 16,
        dt: Some(0.8),
        ..SimulationConfig::default()
    };
    let err = run_local(2, config, &settings).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert_eq!(err.exit_code(), 2);
    assert!(!settings.output_dir.exists());
}

#[test]
fn too_many_workers_for_the_grid() {
    let settings = RunSettings::default();
    let config = SimulationConfig {
        m: 3,
        n: 2,
        cart_dims: [0, 4],
        ..SimulationConfig::default()
    };
    let err = run_local(4, config, &settings).unwrap_err();
    assert!(matches!(err, Error::InvalidDomain { np: 4, .. }));
}

#[test]
fn unwritable_output_stops_every_worker() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();
    let settings = RunSettings {
        output_dir: blocker.join("data"),
        threads: 0,
    };
    let config = SimulationConfig {
        m: 10,
        n: 10,
        max_iteration: 4,
        snapshot_frequency: 2,
        ..SimulationConfig::default()
    };
    let results = local::launch(4, |comm| {
        let local = if comm.rank() == 0 {
            Some(config.clone())
        } else {
            None
        };
        wave2d::driver::run_worker(&comm, local, &settings)
    });
    assert!(matches!(results[0], Err(Error::Io(_))));
    assert!(results[1..]
        .iter()
        .all(|r| matches!(r, Err(Error::Communication { .. }))));
    assert!(matches!(local::collect(results), Err(Error::Io(_))));
}

#[test]
fn ghosts_mirror_the_interior_on_global_edges() {
    let dir = tempfile::tempdir().unwrap();
    let settings = RunSettings {
        output_dir: dir.path().to_path_buf(),
        threads: 0,
    };
    let config = SimulationConfig {
        m: 9,
        n: 7,
        ..SimulationConfig::default()
    };
    let results = local::launch(6, |comm| {
        let mut sim = SimulationFactory::create(&comm, config.clone(), &settings)?;
        for _ in 0..3 {
            sim.step(&comm)?;
        }
        sim.exchange_halos(&comm)?;
        sim.apply_boundary();

        let neighbors = sim.context().topology.neighbors;
        let grid = sim.buffers().unwrap().curr();
        let (m, n) = (grid.rows() as isize, grid.cols() as isize);
        for j in 0..n {
            if neighbors.north.is_none() {
                assert_eq!(grid.at(-1, j), grid.at(1, j));
            }
            if neighbors.south.is_none() {
                assert_eq!(grid.at(m, j), grid.at(m - 2, j));
            }
        }
        for i in 0..m {
            if neighbors.west.is_none() {
                assert_eq!(grid.at(i, -1), grid.at(i, 1));
            }
            if neighbors.east.is_none() {
                assert_eq!(grid.at(i, n), grid.at(i, n - 2));
            }
        }
        Ok(sim.iteration())
    });
    for iteration in local::collect(results).unwrap() {
        assert_eq!(iteration, 3);
    }
}
