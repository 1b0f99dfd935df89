use super::{FileRegion, Tag};
use crate::error::{Error, Result};
use mpi::collective::SystemOperation;
use mpi::ffi;
use mpi::point_to_point as p2p;
use mpi::raw::AsRaw;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;
use std::ffi::{c_int, c_void, CString};
use std::path::Path;

pub struct MpiComm {
    world: SimpleCommunicator,
}

impl MpiComm {
    pub fn new(world: SimpleCommunicator) -> Self {
        Self { world }
    }

    /// Terminate every rank of the job.
    pub fn abort(&self, code: i32) -> ! {
        self.world.abort(code)
    }
}

fn check(code: c_int, call: &str) -> Result<()> {
    if code == ffi::MPI_SUCCESS as c_int {
        Ok(())
    } else {
        Err(Error::mpi_error(code, &format!("{} failed", call)))
    }
}

impl super::Communicator for MpiComm {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn send_receive(
        &self,
        peer: usize,
        send_tag: Tag,
        send: &[f64],
        recv_tag: Tag,
        recv: &mut [f64],
    ) -> Result<()> {
        let process = self.world.process_at_rank(peer as i32);
        p2p::send_receive_into_with_tags(
            send,
            &process,
            send_tag.code(),
            recv,
            &process,
            recv_tag.code(),
        );
        Ok(())
    }

    fn broadcast(&self, root: usize, buf: &mut [f64]) -> Result<()> {
        self.world.process_at_rank(root as i32).broadcast_into(buf);
        Ok(())
    }

    fn barrier(&self) -> Result<()> {
        self.world.barrier();
        Ok(())
    }

    fn all_reduce_max(&self, local: f64) -> Result<f64> {
        // MPI_MAX leaves NaN handling to the implementation; count NaNs separately.
        let mut global = 0.0f64;
        let clean = if local.is_nan() { f64::NEG_INFINITY } else { local };
        self.world
            .all_reduce_into(&clean, &mut global, SystemOperation::max());
        let nan_here = if local.is_nan() { 1.0f64 } else { 0.0 };
        let mut nan_anywhere = 0.0f64;
        self.world
            .all_reduce_into(&nan_here, &mut nan_anywhere, SystemOperation::max());
        Ok(if nan_anywhere > 0.0 { f64::NAN } else { global })
    }

    fn write_at_all(&self, path: &Path, region: &FileRegion, data: &[f64]) -> Result<()> {
        if data.len() != region.len() {
            return Err(Error::InvalidParameters(format!(
                "snapshot region holds {} values, got {}",
                region.len(),
                data.len()
            )));
        }
        let c_path = CString::new(path.to_string_lossy().into_owned())
            .map_err(|_| Error::invalid_parameters("snapshot path contains a NUL byte"))?;
        let native = c"native";

        let sizes = [region.global[0] as c_int, region.global[1] as c_int];
        let subsizes = [region.local[0] as c_int, region.local[1] as c_int];
        let starts = [region.offset[0] as c_int, region.offset[1] as c_int];

        unsafe {
            let mut fh: ffi::MPI_File = std::mem::zeroed();
            check(
                ffi::MPI_File_open(
                    self.world.as_raw(),
                    c_path.as_ptr() as *mut _,
                    (ffi::MPI_MODE_CREATE | ffi::MPI_MODE_WRONLY) as c_int,
                    ffi::RSMPI_INFO_NULL,
                    &mut fh,
                ),
                "MPI_File_open",
            )?;
            check(
                ffi::MPI_File_set_size(fh, region.file_bytes() as ffi::MPI_Offset),
                "MPI_File_set_size",
            )?;

            // Ranks without a tile still join the collective with an empty write.
            let mut filetype: ffi::MPI_Datatype = ffi::RSMPI_DOUBLE;
            let owns_type = !region.is_empty();
            if owns_type {
                check(
                    ffi::MPI_Type_create_subarray(
                        2,
                        sizes.as_ptr(),
                        subsizes.as_ptr(),
                        starts.as_ptr(),
                        ffi::MPI_ORDER_C as c_int,
                        ffi::RSMPI_DOUBLE,
                        &mut filetype,
                    ),
                    "MPI_Type_create_subarray",
                )?;
                check(ffi::MPI_Type_commit(&mut filetype), "MPI_Type_commit")?;
            }

            check(
                ffi::MPI_File_set_view(
                    fh,
                    0,
                    ffi::RSMPI_DOUBLE,
                    filetype,
                    native.as_ptr() as *mut _,
                    ffi::RSMPI_INFO_NULL,
                ),
                "MPI_File_set_view",
            )?;

            let mut status: ffi::MPI_Status = std::mem::zeroed();
            check(
                ffi::MPI_File_write_all(
                    fh,
                    data.as_ptr() as *const c_void,
                    data.len() as c_int,
                    ffi::RSMPI_DOUBLE,
                    &mut status,
                ),
                "MPI_File_write_all",
            )?;

            if owns_type {
                check(ffi::MPI_Type_free(&mut filetype), "MPI_Type_free")?;
            }
            check(ffi::MPI_File_close(&mut fh), "MPI_File_close")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_backend<C: crate::comm::Communicator>() {}

    #[test]
    fn mpi_comm_is_a_backend() {
        assert_backend::<MpiComm>();
    }

    #[test]
    fn tags_are_distinct_and_valid() {
        let tags = [
            Tag::Halo(crate::model::Direction::North),
            Tag::Halo(crate::model::Direction::South),
            Tag::Halo(crate::model::Direction::West),
            Tag::Halo(crate::model::Direction::East),
            Tag::Broadcast,
            Tag::Barrier,
            Tag::Reduce,
        ];
        for (i, a) in tags.iter().enumerate() {
            assert!(a.code() >= 0);
            for b in &tags[i + 1..] {
                assert_ne!(a.code(), b.code());
            }
        }
    }
}
