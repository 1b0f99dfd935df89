use super::ProcessTopology;

/// Placement of one tile in the global `total_m x total_n` grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Domain {
    pub total_m: usize,
    pub total_n: usize,
    pub local_m: usize,
    pub local_n: usize,
    pub row_offset: usize,
    pub col_offset: usize,
}

impl Domain {
    pub fn new(global: [usize; 2], dims: [usize; 2], coords: [usize; 2]) -> Self {
        let (local_m, row_offset) = Self::split(global[0], dims[0], coords[0]);
        let (local_n, col_offset) = Self::split(global[1], dims[1], coords[1]);
        Self {
            total_m: global[0],
            total_n: global[1],
            local_m,
            local_n,
            row_offset,
            col_offset,
        }
    }

    /// Tile of the calling rank, or `None` for a rank that does not compute.
    pub fn from_topology(topology: &ProcessTopology, global: [usize; 2]) -> Option<Self> {
        topology
            .coords
            .map(|coords| Self::new(global, topology.dims, coords))
    }

    pub fn serial(global: [usize; 2]) -> Self {
        Self::new(global, [1, 1], [0, 0])
    }

    fn split(total: usize, parts: usize, index: usize) -> (usize, usize) {
        let base = total / parts;
        let extra = if index + 1 == parts { total % parts } else { 0 };
        (base + extra, index * base)
    }

    pub fn m_with_halo(&self) -> usize {
        self.local_m + 2
    }
    pub fn n_with_halo(&self) -> usize {
        self.local_n + 2
    }
    pub fn size_with_halo(&self) -> usize {
        self.m_with_halo() * self.n_with_halo()
    }
    pub fn size(&self) -> usize {
        self.local_m * self.local_n
    }
    pub fn total_size(&self) -> usize {
        self.total_m * self.total_n
    }
}
