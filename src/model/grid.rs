use crate::error::{Error, Result};

/// A `rows x cols` tile of doubles with a one-cell halo on every side.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Grid {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        let len = (rows + 2)
            .checked_mul(cols + 2)
            .ok_or_else(|| Error::allocation(usize::MAX))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| Error::allocation(len.saturating_mul(std::mem::size_of::<f64>())))?;
        data.resize(len, 0.0);
        Ok(Self { rows, cols, data })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn stride(&self) -> usize {
        self.cols + 2
    }

    #[inline]
    fn index(&self, i: isize, j: isize) -> usize {
        debug_assert!(
            (-1..=self.rows as isize).contains(&i) && (-1..=self.cols as isize).contains(&j),
            "({}, {}) outside halo-padded {}x{} grid",
            i,
            j,
            self.rows,
            self.cols
        );
        (i + 1) as usize * self.stride() + (j + 1) as usize
    }

    #[inline]
    pub fn at(&self, i: isize, j: isize) -> f64 {
        self.data[self.index(i, j)]
    }

    #[inline]
    pub fn at_mut(&mut self, i: isize, j: isize) -> &mut f64 {
        let idx = self.index(i, j);
        &mut self.data[idx]
    }

    #[inline]
    pub fn set(&mut self, i: isize, j: isize, value: f64) {
        *self.at_mut(i, j) = value;
    }

    /// Owned part of row `i` (halo row `-1` or `rows` allowed), without the
    /// ghost corners.
    pub fn row(&self, i: isize) -> &[f64] {
        let start = self.index(i, 0);
        &self.data[start..start + self.cols]
    }

    pub fn row_mut(&mut self, i: isize) -> &mut [f64] {
        let start = self.index(i, 0);
        let cols = self.cols;
        &mut self.data[start..start + cols]
    }

    /// Borrow row `src` for reading and row `dst` for writing at once.
    pub fn row_pair_mut(&mut self, src: isize, dst: isize) -> (&[f64], &mut [f64]) {
        assert_ne!(src, dst, "row pair must name two distinct rows");
        let cols = self.cols;
        let src_start = self.index(src, 0);
        let dst_start = self.index(dst, 0);
        if src_start < dst_start {
            let (head, tail) = self.data.split_at_mut(dst_start);
            (&head[src_start..src_start + cols], &mut tail[..cols])
        } else {
            let (head, tail) = self.data.split_at_mut(src_start);
            (&tail[..cols], &mut head[dst_start..dst_start + cols])
        }
    }

    pub fn read_column(&self, j: isize, out: &mut [f64]) {
        debug_assert_eq!(out.len(), self.rows);
        for (i, value) in out.iter_mut().enumerate() {
            *value = self.at(i as isize, j);
        }
    }

    pub fn write_column(&mut self, j: isize, values: &[f64]) {
        debug_assert_eq!(values.len(), self.rows);
        for (i, &value) in values.iter().enumerate() {
            self.set(i as isize, j, value);
        }
    }

    pub fn fill_owned(&mut self, mut f: impl FnMut(usize, usize) -> f64) {
        for i in 0..self.rows {
            for (j, cell) in self.row_mut(i as isize).iter_mut().enumerate() {
                *cell = f(i, j);
            }
        }
    }

    pub fn owned(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.rows * self.cols);
        for i in 0..self.rows {
            out.extend_from_slice(self.row(i as isize));
        }
        out
    }

    pub fn max_abs(&self) -> f64 {
        (0..self.rows)
            .flat_map(|i| self.row(i as isize).iter())
            .fold(0.0, |acc: f64, &v| {
                if acc.is_nan() || v.is_nan() {
                    f64::NAN
                } else {
                    acc.max(v.abs())
                }
            })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Three time levels of one tile. Rotation moves an index, never data.
#[derive(Debug)]
pub struct TimeStepBuffers {
    buffers: [Grid; 3],
    curr: usize,
}

impl TimeStepBuffers {
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        Ok(Self {
            buffers: [
                Grid::new(rows, cols)?,
                Grid::new(rows, cols)?,
                Grid::new(rows, cols)?,
            ],
            curr: 0,
        })
    }

    fn prev_index(&self) -> usize {
        (self.curr + 2) % 3
    }

    fn next_index(&self) -> usize {
        (self.curr + 1) % 3
    }

    pub fn prev(&self) -> &Grid {
        &self.buffers[self.prev_index()]
    }

    pub fn prev_mut(&mut self) -> &mut Grid {
        let idx = self.prev_index();
        &mut self.buffers[idx]
    }

    pub fn curr(&self) -> &Grid {
        &self.buffers[self.curr]
    }

    pub fn curr_mut(&mut self) -> &mut Grid {
        &mut self.buffers[self.curr]
    }

    pub fn next(&self) -> &Grid {
        &self.buffers[self.next_index()]
    }

    pub fn split(&mut self) -> (&Grid, &Grid, &mut Grid) {
        let [a, b, c] = &mut self.buffers;
        match self.curr {
            0 => (&*c, &*a, b),
            1 => (&*a, &*b, c),
            _ => (&*b, &*c, a),
        }
    }

    /// prev <- curr, curr <- next, next <- old prev.
    pub fn rotate(&mut self) {
        self.curr = self.next_index();
    }
}
