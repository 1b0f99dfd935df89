use crate::error::{Error, Result};
use std::cmp::Reverse;

/// Whether rank 0 owns a tile or only coordinates the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopologyPolicy {
    #[default]
    SharedRoot,
    /// Rank 0 handles configuration and collectives only; ranks `1..P` compute.
    DedicatedRoot,
}

impl TopologyPolicy {
    pub fn rank_offset(self) -> usize {
        match self {
            TopologyPolicy::SharedRoot => 0,
            TopologyPolicy::DedicatedRoot => 1,
        }
    }

    pub fn worker_count(self, world_size: usize) -> usize {
        world_size.saturating_sub(self.rank_offset())
    }

    pub(crate) fn to_code(self) -> f64 {
        match self {
            TopologyPolicy::SharedRoot => 0.0,
            TopologyPolicy::DedicatedRoot => 1.0,
        }
    }

    pub(crate) fn from_code(code: f64) -> Self {
        if code == 1.0 {
            TopologyPolicy::DedicatedRoot
        } else {
            TopologyPolicy::SharedRoot
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    pub fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::East => Direction::West,
        }
    }
}

/// World ranks of the adjacent tiles. `None` marks the global domain edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Neighbors {
    pub north: Option<usize>,
    pub south: Option<usize>,
    pub west: Option<usize>,
    pub east: Option<usize>,
}

impl Neighbors {
    pub fn get(&self, direction: Direction) -> Option<usize> {
        match direction {
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::West => self.west,
            Direction::East => self.east,
        }
    }

    pub fn is_interior(&self) -> bool {
        Direction::ALL.iter().all(|&d| self.get(d).is_some())
    }
}

/// Cartesian mapping of the compute ranks onto a `rows x cols` grid, seen
/// from one rank. Coordinates are `[y, x]`, row-major like `MPI_Cart_create`
/// without reordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessTopology {
    pub dims: [usize; 2],
    pub policy: TopologyPolicy,
    pub world_size: usize,
    pub rank: usize,
    pub coords: Option<[usize; 2]>,
    pub neighbors: Neighbors,
}

impl ProcessTopology {
    pub fn new(
        world_size: usize,
        rank: usize,
        policy: TopologyPolicy,
        requested: [usize; 2],
        global: [usize; 2],
    ) -> Result<Self> {
        if rank >= world_size {
            return Err(Error::InvalidParameters(format!(
                "Rank {} outside a world of {} processes",
                rank, world_size
            )));
        }
        if policy == TopologyPolicy::DedicatedRoot && world_size < 2 {
            return Err(Error::InvalidParameters(
                "A dedicated root needs at least one more process to compute".to_string(),
            ));
        }

        let dims = Self::create_dims(policy.worker_count(world_size), requested, global)?;
        let mut topology = Self {
            dims,
            policy,
            world_size,
            rank,
            coords: None,
            neighbors: Neighbors::default(),
        };
        topology.coords = topology.coords_of(rank);
        if let Some([y, x]) = topology.coords {
            let [rows, cols] = dims;
            let neighbors = Neighbors {
                north: (y > 0).then(|| topology.rank_of([y - 1, x])),
                south: (y + 1 < rows).then(|| topology.rank_of([y + 1, x])),
                west: (x > 0).then(|| topology.rank_of([y, x - 1])),
                east: (x + 1 < cols).then(|| topology.rank_of([y, x + 1])),
            };
            topology.neighbors = neighbors;
        }
        Ok(topology)
    }

    /// Factor `np` workers into `[rows, cols]`.
    ///
    /// A non-zero entry of `requested` pins that dimension. Among the
    /// remaining factor pairs the most square one wins, ties going to more
    /// rows; pairs leaving a tile without a row or column of the `global`
    /// grid are skipped.
    pub fn create_dims(np: usize, requested: [usize; 2], global: [usize; 2]) -> Result<[usize; 2]> {
        if np == 0 {
            return Err(Error::InvalidParameters(
                "Number of processes must be positive".to_string(),
            ));
        }
        let [req_rows, req_cols] = requested;
        if req_rows > 0 && req_cols > 0 && req_rows * req_cols != np {
            return Err(Error::invalid_domain(
                np,
                requested.to_vec(),
                "Requested process grid does not match the process count",
            ));
        }

        let mut candidates: Vec<[usize; 2]> = (1..=np)
            .filter(|rows| np % rows == 0)
            .map(|rows| [rows, np / rows])
            .filter(|&[rows, cols]| {
                (req_rows == 0 || rows == req_rows) && (req_cols == 0 || cols == req_cols)
            })
            .collect();
        candidates.sort_by_key(|&[rows, cols]| (rows.abs_diff(cols), Reverse(rows)));

        candidates
            .into_iter()
            .find(|&[rows, cols]| global[0] >= rows && global[1] >= cols)
            .ok_or_else(|| {
                Error::invalid_domain(
                    np,
                    requested.to_vec(),
                    &format!(
                        "No process grid gives every tile at least one cell of the {}x{} domain",
                        global[0], global[1]
                    ),
                )
            })
    }

    pub fn is_compute(&self) -> bool {
        self.coords.is_some()
    }

    pub fn worker_count(&self) -> usize {
        self.dims[0] * self.dims[1]
    }

    pub fn coords_of(&self, rank: usize) -> Option<[usize; 2]> {
        let index = rank.checked_sub(self.policy.rank_offset())?;
        if index >= self.worker_count() {
            return None;
        }
        Some([index / self.dims[1], index % self.dims[1]])
    }

    pub fn rank_of(&self, coords: [usize; 2]) -> usize {
        coords[0] * self.dims[1] + coords[1] + self.policy.rank_offset()
    }

    pub fn on_boundary(&self) -> bool {
        self.is_compute() && !self.neighbors.is_interior()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dims_prefer_square_then_rows() {
        assert_eq!(ProcessTopology::create_dims(4, [0, 0], [64, 64]).unwrap(), [2, 2]);
        assert_eq!(ProcessTopology::create_dims(6, [0, 0], [64, 64]).unwrap(), [3, 2]);
        assert_eq!(ProcessTopology::create_dims(2, [0, 0], [64, 64]).unwrap(), [2, 1]);
        assert_eq!(ProcessTopology::create_dims(7, [0, 0], [64, 64]).unwrap(), [7, 1]);
        assert_eq!(ProcessTopology::create_dims(1, [0, 0], [2, 2]).unwrap(), [1, 1]);
    }

    #[test]
    fn dims_fall_back_when_tiles_would_be_empty() {
        // 7 rows do not fit a 4-row grid, 1x7 does.
        assert_eq!(ProcessTopology::create_dims(7, [0, 0], [4, 16]).unwrap(), [1, 7]);
    }

    #[test]
    fn dims_honour_requested_axis() {
        assert_eq!(ProcessTopology::create_dims(4, [1, 0], [8, 8]).unwrap(), [1, 4]);
        assert_eq!(ProcessTopology::create_dims(4, [0, 1], [8, 8]).unwrap(), [4, 1]);
        assert_eq!(ProcessTopology::create_dims(6, [2, 3], [8, 8]).unwrap(), [2, 3]);
    }

    #[test]
    fn dims_reject_impossible_grids() {
        assert!(matches!(
            ProcessTopology::create_dims(5, [0, 0], [2, 2]),
            Err(Error::InvalidDomain { np: 5, .. })
        ));
        assert!(matches!(
            ProcessTopology::create_dims(4, [3, 0], [8, 8]),
            Err(Error::InvalidDomain { .. })
        ));
        assert!(matches!(
            ProcessTopology::create_dims(4, [2, 3], [8, 8]),
            Err(Error::InvalidDomain { .. })
        ));
        assert!(ProcessTopology::create_dims(0, [0, 0], [8, 8]).is_err());
    }

    #[test]
    fn neighbours_have_no_wraparound() {
        let corner = ProcessTopology::new(6, 0, TopologyPolicy::SharedRoot, [0, 0], [9, 9]).unwrap();
        assert_eq!(corner.dims, [3, 2]);
        assert_eq!(corner.coords, Some([0, 0]));
        assert_eq!(
            corner.neighbors,
            Neighbors {
                north: None,
                south: Some(2),
                west: None,
                east: Some(1),
            }
        );
        assert!(corner.on_boundary());

        let middle = ProcessTopology::new(6, 3, TopologyPolicy::SharedRoot, [0, 0], [9, 9]).unwrap();
        assert_eq!(middle.coords, Some([1, 1]));
        assert_eq!(middle.neighbors.north, Some(1));
        assert_eq!(middle.neighbors.south, Some(5));
        assert_eq!(middle.neighbors.west, Some(2));
        assert_eq!(middle.neighbors.east, None);
    }

    #[test]
    fn interior_tile_is_not_on_boundary() {
        let topo = ProcessTopology::new(9, 4, TopologyPolicy::SharedRoot, [0, 0], [9, 9]).unwrap();
        assert_eq!(topo.coords, Some([1, 1]));
        assert!(topo.neighbors.is_interior());
        assert!(!topo.on_boundary());
    }

    #[test]
    fn dedicated_root_shifts_ranks() {
        let root = ProcessTopology::new(5, 0, TopologyPolicy::DedicatedRoot, [0, 0], [8, 8]).unwrap();
        assert_eq!(root.dims, [2, 2]);
        assert!(!root.is_compute());
        assert!(!root.on_boundary());

        let worker = ProcessTopology::new(5, 1, TopologyPolicy::DedicatedRoot, [0, 0], [8, 8]).unwrap();
        assert_eq!(worker.coords, Some([0, 0]));
        assert_eq!(worker.neighbors.east, Some(2));
        assert_eq!(worker.neighbors.south, Some(3));
        assert_eq!(worker.rank_of([1, 1]), 4);

        assert!(ProcessTopology::new(1, 0, TopologyPolicy::DedicatedRoot, [0, 0], [8, 8]).is_err());
    }

    #[test]
    fn direction_opposites() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }
}
