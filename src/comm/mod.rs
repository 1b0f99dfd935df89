pub mod local;
#[cfg(feature = "mpi")]
pub mod mpi;

use crate::error::Result;
use crate::model::{Direction, Domain};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Edge data travelling towards the given side of the sender.
    Halo(Direction),
    Broadcast,
    Barrier,
    Reduce,
}

impl Tag {
    pub fn code(self) -> i32 {
        match self {
            Tag::Halo(Direction::North) => 1,
            Tag::Halo(Direction::South) => 2,
            Tag::Halo(Direction::West) => 3,
            Tag::Halo(Direction::East) => 4,
            Tag::Broadcast => 10,
            Tag::Barrier => 11,
            Tag::Reduce => 12,
        }
    }
}

/// The sub-rectangle one worker contributes to a row-major
/// `global[0] x global[1]` file of doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileRegion {
    pub global: [usize; 2],
    pub local: [usize; 2],
    pub offset: [usize; 2],
}

impl FileRegion {
    pub fn from_domain(domain: &Domain) -> Self {
        Self {
            global: [domain.total_m, domain.total_n],
            local: [domain.local_m, domain.local_n],
            offset: [domain.row_offset, domain.col_offset],
        }
    }

    pub fn empty(global: [usize; 2]) -> Self {
        Self {
            global,
            local: [0, 0],
            offset: [0, 0],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.local[0] == 0 || self.local[1] == 0
    }

    pub fn len(&self) -> usize {
        self.local[0] * self.local[1]
    }

    pub fn file_bytes(&self) -> u64 {
        (self.global[0] * self.global[1] * std::mem::size_of::<f64>()) as u64
    }

    pub fn row_byte_offset(&self, i: usize) -> u64 {
        (((self.offset[0] + i) * self.global[1] + self.offset[1]) * std::mem::size_of::<f64>())
            as u64
    }
}

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    fn is_root(&self) -> bool {
        self.rank() == 0
    }

    /// Send `send` to `peer` and receive `recv` from it in one paired
    /// operation. Both sides must call this with each other; the pair never
    /// deadlocks regardless of buffering.
    fn send_receive(
        &self,
        peer: usize,
        send_tag: Tag,
        send: &[f64],
        recv_tag: Tag,
        recv: &mut [f64],
    ) -> Result<()>;

    fn broadcast(&self, root: usize, buf: &mut [f64]) -> Result<()>;

    fn barrier(&self) -> Result<()>;

    /// Maximum over all ranks. A NaN on any rank yields NaN.
    fn all_reduce_max(&self, local: f64) -> Result<f64>;

    /// Collective write of `data` (row-major, `region.local` shaped) into the
    /// shared file at `path`. Every rank must call this for the same path.
    fn write_at_all(&self, path: &Path, region: &FileRegion, data: &[f64]) -> Result<()>;
}

pub(crate) fn max_propagating_nan(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}
