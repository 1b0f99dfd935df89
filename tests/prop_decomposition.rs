//! Property tests for process-grid factorization and tile sizing.

use proptest::prelude::*;
use wave2d::model::{Domain, ProcessTopology, TopologyPolicy};

proptest! {
    /// Tiles along each axis cover the global grid exactly once, in order.
    #[test]
    fn tiles_partition_the_grid(m in 1usize..200, n in 1usize..200, rows in 1usize..8, cols in 1usize..8) {
        prop_assume!(m >= rows && n >= cols);
        let global = [m, n];

        let mut next_row = 0;
        for y in 0..rows {
            let d = Domain::new(global, [rows, cols], [y, 0]);
            prop_assert_eq!(d.row_offset, next_row);
            prop_assert!(d.local_m >= 1);
            next_row += d.local_m;
        }
        prop_assert_eq!(next_row, m);

        let mut next_col = 0;
        for x in 0..cols {
            let d = Domain::new(global, [rows, cols], [0, x]);
            prop_assert_eq!(d.col_offset, next_col);
            next_col += d.local_n;
        }
        prop_assert_eq!(next_col, n);
    }

    /// Whenever a factorization is found it uses every worker and gives each
    /// tile at least one cell.
    #[test]
    fn factorization_uses_every_worker(np in 1usize..64, m in 1usize..40, n in 1usize..40) {
        if let Ok([rows, cols]) = ProcessTopology::create_dims(np, [0, 0], [m, n]) {
            prop_assert_eq!(rows * cols, np);
            prop_assert!(rows <= m && cols <= n);
        }
    }

    /// Neighbour links are symmetric: if A sees B to the east, B sees A to
    /// the west.
    #[test]
    fn neighbours_are_symmetric(np in 1usize..24, dedicated in any::<bool>()) {
        let policy = if dedicated { TopologyPolicy::DedicatedRoot } else { TopologyPolicy::SharedRoot };
        let world = np + policy.rank_offset();
        let global = [64, 64];
        let topologies: Vec<_> = (0..world)
            .map(|rank| ProcessTopology::new(world, rank, policy, [0, 0], global).unwrap())
            .collect();
        for t in topologies.iter().filter(|t| t.is_compute()) {
            if let Some(east) = t.neighbors.east {
                prop_assert_eq!(topologies[east].neighbors.west, Some(t.rank));
            }
            if let Some(south) = t.neighbors.south {
                prop_assert_eq!(topologies[south].neighbors.north, Some(t.rank));
            }
        }
    }
}
