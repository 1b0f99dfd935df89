use crate::comm::{Communicator, FileRegion};
use crate::error::{Error, Result};
use crate::model::{Domain, Grid};
use std::path::{Path, PathBuf};

pub fn snapshot_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{:05}.dat", index))
}

/// Read a whole snapshot back as a row-major vector.
pub fn read_snapshot(path: &Path, m: usize, n: usize) -> Result<Vec<f64>> {
    let bytes = std::fs::read(path)?;
    let expected = m * n * std::mem::size_of::<f64>();
    if bytes.len() != expected {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!(
                "{} holds {} bytes, a {}x{} snapshot needs {}",
                path.display(),
                bytes.len(),
                m,
                n,
                expected
            ),
        )));
    }
    Ok(bytemuck::pod_collect_to_vec(&bytes[..]))
}

/// Collective writer of one rank's share of every snapshot.
#[derive(Debug)]
pub struct SnapshotWriter {
    dir: PathBuf,
    region: FileRegion,
    scratch: Vec<f64>,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, domain: Option<&Domain>, global: [usize; 2]) -> Self {
        let region = match domain {
            Some(domain) => FileRegion::from_domain(domain),
            None => FileRegion::empty(global),
        };
        Self {
            dir: dir.into(),
            region,
            scratch: Vec::with_capacity(region.len()),
        }
    }

    /// Create the output directory on rank 0 before anyone writes.
    pub fn prepare(&self, comm: &dyn Communicator) -> Result<()> {
        if comm.is_root() {
            std::fs::create_dir_all(&self.dir)?;
        }
        comm.barrier()
    }

    /// Write the owned cells of `grid` as snapshot `index`. Ranks without a
    /// tile pass `None` and still take part.
    pub fn write(
        &mut self,
        comm: &dyn Communicator,
        index: usize,
        grid: Option<&Grid>,
    ) -> Result<PathBuf> {
        self.scratch.clear();
        if let Some(grid) = grid {
            for i in 0..grid.rows() {
                self.scratch.extend_from_slice(grid.row(i as isize));
            }
        }
        let path = snapshot_path(&self.dir, index);
        comm.write_at_all(&path, &self.region, &self.scratch)?;
        tracing::trace!(path = %path.display(), values = self.scratch.len(), "snapshot share written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::local;
    use crate::model::{ProcessTopology, TopologyPolicy};

    #[test]
    fn path_is_zero_padded() {
        assert_eq!(
            snapshot_path(Path::new("data"), 7),
            PathBuf::from("data/00007.dat")
        );
        assert_eq!(
            snapshot_path(Path::new("out"), 123456),
            PathBuf::from("out/123456.dat")
        );
    }

    #[test]
    fn short_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("00000.dat");
        std::fs::write(&path, [0u8; 24]).unwrap();
        assert!(read_snapshot(&path, 2, 2).is_err());
    }

    #[test]
    fn tiles_reassemble_into_the_global_grid() {
        let dir = tempfile::tempdir().unwrap();
        let global = [5, 6];
        let np = 4;
        let results = local::launch(np, |comm| {
            let topology =
                ProcessTopology::new(np, comm.rank(), TopologyPolicy::SharedRoot, [0, 0], global)?;
            let domain = Domain::from_topology(&topology, global).unwrap();
            let mut grid = Grid::new(domain.local_m, domain.local_n)?;
            grid.fill_owned(|i, j| ((domain.row_offset + i) * 100 + domain.col_offset + j) as f64);
            let mut writer = SnapshotWriter::new(dir.path(), Some(&domain), global);
            writer.prepare(&comm)?;
            writer.write(&comm, 3, Some(&grid))
        });
        let paths = local::collect(results).unwrap();
        assert!(paths.iter().all(|p| p == &paths[0]));

        let values = read_snapshot(&paths[0], 5, 6).unwrap();
        for i in 0..5 {
            for j in 0..6 {
                assert_eq!(values[i * 6 + j], (i * 100 + j) as f64);
            }
        }
    }
}
