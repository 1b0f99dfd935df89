use crate::model::{Grid, Neighbors};

/// Reflective (Neumann) boundary: on every side without a neighbour, the
/// ghost line mirrors the owned line one step inside the edge.
///
/// Must run after the halo exchange. When a tile is a single cell thick the
/// mirrored line is the opposite ghost line, which the exchange has filled.
pub fn apply_reflective(grid: &mut Grid, neighbors: &Neighbors) {
    let m = grid.rows() as isize;
    let n = grid.cols() as isize;

    if neighbors.north.is_none() {
        let (src, ghost) = grid.row_pair_mut(1, -1);
        ghost.copy_from_slice(src);
    }
    if neighbors.south.is_none() {
        let (src, ghost) = grid.row_pair_mut(m - 2, m);
        ghost.copy_from_slice(src);
    }
    if neighbors.west.is_none() {
        for i in 0..m {
            grid.set(i, -1, grid.at(i, 1));
        }
    }
    if neighbors.east.is_none() {
        for i in 0..m {
            grid.set(i, n, grid.at(i, n - 2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(m: usize, n: usize) -> Grid {
        let mut g = Grid::new(m, n).unwrap();
        g.fill_owned(|i, j| (i * 10 + j) as f64 + 1.0);
        g
    }

    #[test]
    fn all_edges_mirror_interior() {
        let mut g = filled(4, 5);
        apply_reflective(&mut g, &Neighbors::default());
        for j in 0..5 {
            assert_eq!(g.at(-1, j), g.at(1, j));
            assert_eq!(g.at(4, j), g.at(2, j));
        }
        for i in 0..4 {
            assert_eq!(g.at(i, -1), g.at(i, 1));
            assert_eq!(g.at(i, 5), g.at(i, 3));
        }
    }

    #[test]
    fn sides_with_neighbours_are_untouched() {
        let mut g = filled(3, 3);
        g.row_mut(-1).fill(-7.0);
        g.row_mut(3).fill(-8.0);
        let neighbors = Neighbors {
            north: Some(1),
            south: Some(2),
            west: None,
            east: Some(3),
        };
        apply_reflective(&mut g, &neighbors);
        assert!(g.row(-1).iter().all(|&v| v == -7.0));
        assert!(g.row(3).iter().all(|&v| v == -8.0));
        for i in 0..3 {
            assert_eq!(g.at(i, -1), g.at(i, 1));
            assert_eq!(g.at(i, 3), 0.0);
        }
    }

    #[test]
    fn interior_tile_is_a_no_op() {
        let mut g = filled(2, 2);
        let before = g.clone();
        let neighbors = Neighbors {
            north: Some(0),
            south: Some(1),
            west: Some(2),
            east: Some(3),
        };
        apply_reflective(&mut g, &neighbors);
        assert_eq!(g, before);
    }

    #[test]
    fn one_row_tile_mirrors_received_ghost() {
        let mut g = filled(1, 3);
        g.row_mut(1).copy_from_slice(&[5.0, 6.0, 7.0]);
        let neighbors = Neighbors {
            north: None,
            south: Some(4),
            west: Some(1),
            east: Some(2),
        };
        apply_reflective(&mut g, &neighbors);
        assert_eq!(g.row(-1), &[5.0, 6.0, 7.0]);
    }
}
