use crate::comm::{Communicator, Tag};
use crate::error::Result;
use crate::model::{Direction, Grid, Neighbors, ProcessTopology};

pub trait HaloTransferStrategy {
    /// Send line `send_line` of `grid` to `peer` and receive its counterpart
    /// into line `ghost_line`. `side` is where `peer` lies.
    fn exchange(
        &mut self,
        comm: &dyn Communicator,
        grid: &mut Grid,
        side: Direction,
        peer: usize,
        send_line: isize,
        ghost_line: isize,
    ) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct ContiguousRow;

impl HaloTransferStrategy for ContiguousRow {
    fn exchange(
        &mut self,
        comm: &dyn Communicator,
        grid: &mut Grid,
        side: Direction,
        peer: usize,
        send_line: isize,
        ghost_line: isize,
    ) -> Result<()> {
        let (send, recv) = grid.row_pair_mut(send_line, ghost_line);
        comm.send_receive(peer, Tag::Halo(side), send, Tag::Halo(side.opposite()), recv)
    }
}

#[derive(Debug, Default)]
pub struct PackedColumn {
    send: Vec<f64>,
    recv: Vec<f64>,
}

impl HaloTransferStrategy for PackedColumn {
    fn exchange(
        &mut self,
        comm: &dyn Communicator,
        grid: &mut Grid,
        side: Direction,
        peer: usize,
        send_line: isize,
        ghost_line: isize,
    ) -> Result<()> {
        self.send.resize(grid.rows(), 0.0);
        self.recv.resize(grid.rows(), 0.0);
        grid.read_column(send_line, &mut self.send);
        comm.send_receive(
            peer,
            Tag::Halo(side),
            &self.send,
            Tag::Halo(side.opposite()),
            &mut self.recv,
        )?;
        grid.write_column(ghost_line, &self.recv);
        Ok(())
    }
}

/// Per-rank exchange engine. Pairs every transfer with the neighbour's
/// opposite transfer in the same phase, so the exchange completes on any
/// process grid even when sends only finish once received.
#[derive(Debug)]
pub struct HaloExchange {
    neighbors: Neighbors,
    schedule: [Direction; 4],
    rows: ContiguousRow,
    columns: PackedColumn,
}

impl HaloExchange {
    pub fn new(topology: &ProcessTopology) -> Self {
        let [y, x] = topology.coords.unwrap_or([0, 0]);
        Self {
            neighbors: topology.neighbors,
            schedule: Self::schedule_for([y, x]),
            rows: ContiguousRow,
            columns: PackedColumn::default(),
        }
    }

    /// Even rows talk south first and odd rows north first, so in each phase
    /// tile `y` and tile `y + 1` address each other. Columns likewise.
    pub fn schedule_for(coords: [usize; 2]) -> [Direction; 4] {
        let [y, x] = coords;
        let (v1, v2) = if y % 2 == 0 {
            (Direction::South, Direction::North)
        } else {
            (Direction::North, Direction::South)
        };
        let (h1, h2) = if x % 2 == 0 {
            (Direction::East, Direction::West)
        } else {
            (Direction::West, Direction::East)
        };
        [v1, v2, h1, h2]
    }

    pub fn neighbors(&self) -> &Neighbors {
        &self.neighbors
    }

    /// Fill every ghost line that has a neighbour. Sides on the global edge
    /// are left for the boundary condition.
    pub fn exchange(&mut self, comm: &dyn Communicator, grid: &mut Grid) -> Result<()> {
        let m = grid.rows() as isize;
        let n = grid.cols() as isize;
        for side in self.schedule {
            let Some(peer) = self.neighbors.get(side) else {
                continue;
            };
            let (send_line, ghost_line) = match side {
                Direction::North => (0, -1),
                Direction::South => (m - 1, m),
                Direction::West => (0, -1),
                Direction::East => (n - 1, n),
            };
            let strategy: &mut dyn HaloTransferStrategy = match side {
                Direction::North | Direction::South => &mut self.rows,
                Direction::West | Direction::East => &mut self.columns,
            };
            strategy.exchange(comm, grid, side, peer, send_line, ghost_line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::local;
    use crate::model::{Domain, TopologyPolicy};

    fn tagged(rank: usize, i: usize, j: usize) -> f64 {
        (rank * 1000 + i * 10 + j) as f64
    }

    #[test]
    fn schedules_pair_up() {
        assert_eq!(
            HaloExchange::schedule_for([0, 0]),
            [Direction::South, Direction::North, Direction::East, Direction::West]
        );
        assert_eq!(
            HaloExchange::schedule_for([1, 1]),
            [Direction::North, Direction::South, Direction::West, Direction::East]
        );
        // Phase k of tile y and tile y+1 name each other.
        for y in 0..4 {
            let upper = HaloExchange::schedule_for([y, 0]);
            let lower = HaloExchange::schedule_for([y + 1, 0]);
            let phase = upper.iter().position(|&d| d == Direction::South).unwrap();
            assert_eq!(lower[phase], Direction::North);
        }
    }

    #[test]
    fn ghosts_match_neighbour_edges() {
        let global = [7, 9];
        let np = 6;
        let results = local::launch(np, |comm| {
            let topology =
                ProcessTopology::new(np, comm.rank(), TopologyPolicy::SharedRoot, [0, 0], global)?;
            let domain = Domain::from_topology(&topology, global).unwrap();
            let mut grid = Grid::new(domain.local_m, domain.local_n)?;
            grid.fill_owned(|i, j| tagged(comm.rank(), i, j));
            let mut halo = HaloExchange::new(&topology);
            halo.exchange(&comm, &mut grid)?;
            Ok((topology, domain, grid))
        });
        let tiles = local::collect(results).unwrap();

        for (topology, domain, grid) in &tiles {
            let m = domain.local_m as isize;
            let n = domain.local_n as isize;
            let nb = topology.neighbors;
            if let Some(north) = nb.north {
                let other = &tiles[north].2;
                for j in 0..n {
                    assert_eq!(grid.at(-1, j), other.at(other.rows() as isize - 1, j));
                }
            } else {
                assert!(grid.row(-1).iter().all(|&v| v == 0.0));
            }
            if let Some(south) = nb.south {
                for j in 0..n {
                    assert_eq!(grid.at(m, j), tiles[south].2.at(0, j));
                }
            }
            if let Some(west) = nb.west {
                let other = &tiles[west].2;
                for i in 0..m {
                    assert_eq!(grid.at(i, -1), other.at(i, other.cols() as isize - 1));
                }
            }
            if let Some(east) = nb.east {
                for i in 0..m {
                    assert_eq!(grid.at(i, n), tiles[east].2.at(i, 0));
                }
            } else {
                for i in 0..m {
                    assert_eq!(grid.at(i, n), 0.0);
                }
            }
        }
    }

    #[test]
    fn single_rank_exchange_is_a_no_op() {
        let results = local::launch(1, |comm| {
            let topology =
                ProcessTopology::new(1, 0, TopologyPolicy::SharedRoot, [0, 0], [3, 3])?;
            let mut grid = Grid::new(3, 3)?;
            grid.fill_owned(|i, j| (i + j) as f64);
            let before = grid.clone();
            HaloExchange::new(&topology).exchange(&comm, &mut grid)?;
            Ok(grid == before)
        });
        assert!(local::collect(results).unwrap()[0]);
    }
}
