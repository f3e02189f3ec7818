/* ************************************************************************ **
** This file is part of tbkit, and is licensed under EITHER the MIT license **
** or the Apache 2.0 license, at your option.                               **
**                                                                          **
**     http://www.apache.org/licenses/LICENSE-2.0                           **
**     http://opensource.org/licenses/MIT                                   **
** ************************************************************************ */

use crate::{Error, Result};

use std::iter;
use std::ops::Range;

use tbkit_assert_close::Tolerances;

/// Smallest capacity a row grows to once it needs to grow at all.
const MIN_ROW_CAPACITY: usize = 4;

/// Compressed sparse row matrix with `D` values per nonzero.
///
/// Storage is laid out like this:
///
/// * `ptr[r]..ptr[r + 1]` is the *capacity* reserved for row `r` inside `col`.
/// * Only the first `ncol[r]` slots of that range are in use; the rest is padding
///   that lets rows grow without shifting the whole matrix every time.
/// * `data` is a dense `(col.len(), D)` block parallel to `col`, so the `D` values
///   of one nonzero are contiguous.
///
/// A row that runs out of capacity at least doubles it, so building a row one
/// element at a time costs amortized O(1) reallocations per element of that row.
/// [`PhysCsr::finalize`] removes all padding and sorts the columns of each row.
///
/// `D` is either given up front or fixed by the first call to [`PhysCsr::set`];
/// it never changes afterwards.
#[derive(Debug, Clone)]
pub struct PhysCsr {
    shape: (usize, usize),
    dim: Option<usize>,
    ptr: Vec<usize>,
    ncol: Vec<usize>,
    col: Vec<usize>,
    data: Vec<f64>,
    nnz: usize,
    // the used part of every row is in increasing column order
    sorted: bool,
}

/// The stored part of a single row.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    cols: &'a [usize],
    values: &'a [f64],
    dim: usize,
}

impl<'a> RowView<'a> {
    pub fn len(&self) -> usize
    { self.cols.len() }

    pub fn is_empty(&self) -> bool
    { self.cols.is_empty() }

    /// Column indices, in storage order.
    pub fn cols(&self) -> &'a [usize]
    { self.cols }

    /// The `(len, D)` block of values, row-major.
    pub fn values(&self) -> &'a [f64]
    { self.values }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &'a [f64])> + 'a {
        let RowView { cols, values, dim } = *self;
        cols.iter().enumerate().map(move |(k, &c)| (c, &values[k * dim..(k + 1) * dim]))
    }
}

impl PhysCsr {
    /// An empty matrix storing `dim` values per nonzero.
    pub fn new(shape: (usize, usize), dim: usize) -> Result<Self>
    { PhysCsr::with_row_capacity(shape, dim, 0) }

    /// An empty matrix whose `D` is fixed by the first value stored.
    pub fn with_lazy_dim(shape: (usize, usize)) -> Self {
        PhysCsr {
            shape,
            dim: None,
            ptr: vec![0; shape.0 + 1],
            ncol: vec![0; shape.0],
            col: vec![],
            data: vec![],
            nnz: 0,
            sorted: true,
        }
    }

    /// An empty matrix with room for `per_row` nonzeros in every row.
    pub fn with_row_capacity(shape: (usize, usize), dim: usize, per_row: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::ZeroDim);
        }
        let capacity = shape.0 * per_row;
        Ok(validate_csr!(debug, PhysCsr {
            shape,
            dim: Some(dim),
            ptr: (0..=shape.0).map(|r| r * per_row).collect(),
            ncol: vec![0; shape.0],
            col: vec![0; capacity],
            data: vec![0.0; capacity * dim],
            nnz: 0,
            sorted: true,
        }))
    }

    /// Build from compressed (unpadded) parts, as read from a file.
    ///
    /// * `ptr`: `nrows + 1` offsets; row `r` is `col[ptr[r]..ptr[r + 1]]`.
    /// * `col`: column of each nonzero.
    /// * `data`: `col.len() * dim` values, the `dim` values of each nonzero contiguous.
    ///
    /// Every invariant is checked. Columns within a row may come in any order;
    /// the result is finalized (sorted).
    pub fn from_parts(
        shape: (usize, usize),
        dim: usize,
        ptr: Vec<usize>,
        col: Vec<usize>,
        data: Vec<f64>,
    ) -> Result<Self> {
        if dim == 0 {
            return Err(Error::ZeroDim);
        }
        let ncol = ptr.windows(2).map(|w| w[1].saturating_sub(w[0])).collect();
        let nnz = col.len();
        let mut csr = validate_csr!(always, PhysCsr {
            shape, ptr, ncol, col, data, nnz,
            dim: Some(dim),
            sorted: false,
        });
        csr.finalize();
        Ok(csr)
    }

    /// `(nrows, ncols)`
    #[inline]
    pub fn shape(&self) -> (usize, usize)
    { self.shape }

    #[inline]
    pub fn nrows(&self) -> usize
    { self.shape.0 }

    #[inline]
    pub fn ncols(&self) -> usize
    { self.shape.1 }

    /// Number of values per nonzero, if fixed yet.
    #[inline]
    pub fn dim(&self) -> Option<usize>
    { self.dim }

    /// Total number of stored nonzeros.
    #[inline]
    pub fn nnz(&self) -> usize
    { self.nnz }

    /// Number of nonzero slots allocated, including padding.
    pub fn capacity(&self) -> usize
    { self.col.len() }

    pub fn row_capacity(&self, row: usize) -> Result<usize> {
        self.check_row(row)?;
        Ok(self.ptr[row + 1] - self.ptr[row])
    }

    /// True when there is no padding and every row is sorted.
    pub fn is_finalized(&self) -> bool
    { self.sorted && self.col.len() == self.nnz }

    /// Make sure row `row` can take `additional` more nonzeros without reallocating.
    pub fn reserve_row(&mut self, row: usize, additional: usize) -> Result<()> {
        self.check_row(row)?;
        let needed = self.ncol[row] + additional;
        self.grow_row(row, needed);
        Ok(())
    }

    /// Store `values` at `(row, col)`, inserting the entry if it is absent.
    ///
    /// Nothing is modified when this returns an error.
    pub fn set(&mut self, row: usize, col: usize, values: &[f64]) -> Result<()> {
        self.check_row(row)?;
        self.check_col(col)?;
        let dim = match self.dim {
            Some(dim) => dim,
            None => {
                if values.is_empty() {
                    return Err(Error::ZeroDim);
                }
                self.fix_dim(values.len());
                values.len()
            },
        };
        if values.len() != dim {
            return Err(Error::DimMismatch { expected: dim, found: values.len() });
        }

        let k = match self.find(row, col) {
            Some(k) => k,
            None => self.push_col(row, col),
        };
        self.data[k * dim..(k + 1) * dim].copy_from_slice(values);
        Ok(())
    }

    /// Values at `(row, col)`, or `None` if the entry is not stored.
    pub fn get(&self, row: usize, col: usize) -> Result<Option<&[f64]>> {
        self.check_row(row)?;
        self.check_col(col)?;
        Ok(match (self.dim, self.find(row, col)) {
            (Some(dim), Some(k)) => Some(&self.data[k * dim..(k + 1) * dim]),
            _ => None,
        })
    }

    pub fn get_mut(&mut self, row: usize, col: usize) -> Result<Option<&mut [f64]>> {
        self.check_row(row)?;
        self.check_col(col)?;
        Ok(match (self.dim, self.find(row, col)) {
            (Some(dim), Some(k)) => Some(&mut self.data[k * dim..(k + 1) * dim]),
            _ => None,
        })
    }

    /// Remove an entry, returning its values if it was stored.
    ///
    /// The remaining columns of the row keep their order; capacity is kept.
    pub fn remove(&mut self, row: usize, col: usize) -> Result<Option<Vec<f64>>> {
        self.check_row(row)?;
        self.check_col(col)?;
        let (dim, k) = match (self.dim, self.find(row, col)) {
            (Some(dim), Some(k)) => (dim, k),
            _ => return Ok(None),
        };
        let removed = self.data[k * dim..(k + 1) * dim].to_vec();
        let end = self.ptr[row] + self.ncol[row];
        self.col.copy_within(k + 1..end, k);
        self.data.copy_within((k + 1) * dim..end * dim, k * dim);
        self.ncol[row] -= 1;
        self.nnz -= 1;
        Ok(Some(removed))
    }

    /// The stored part of a row.
    pub fn row(&self, row: usize) -> Result<RowView<'_>> {
        self.check_row(row)?;
        Ok(self.row_view(row))
    }

    /// Iterate over all nonzeros as `(row, col, values)`, row by row.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &[f64])> + '_ {
        (0..self.nrows()).flat_map(move |r| {
            self.row_view(r).iter().map(move |(c, values)| (r, c, values))
        })
    }

    /// Test whether both matrices store exactly the same `(row, col)` positions.
    ///
    /// Values, `D`, and the order of columns within a row are all ignored.
    pub fn same_sparsity(&self, other: &PhysCsr) -> bool {
        if self.shape != other.shape || self.nnz != other.nnz {
            return false;
        }
        let both_sorted = self.sorted && other.sorted;
        let (mut a, mut b) = (vec![], vec![]);
        (0..self.nrows()).all(|r| {
            let (ca, cb) = (self.row_cols(r), other.row_cols(r));
            if ca.len() != cb.len() {
                return false;
            }
            if both_sorted {
                return ca == cb;
            }
            a.clear();
            a.extend_from_slice(ca);
            a.sort_unstable();
            b.clear();
            b.extend_from_slice(cb);
            b.sort_unstable();
            a == b
        })
    }

    /// Same sparsity, same `D`, and every value close within `tol`.
    ///
    /// Entries are matched by position, not by storage order.
    pub fn close_to(&self, other: &PhysCsr, tol: Tolerances) -> bool {
        if self.dim != other.dim || !self.same_sparsity(other) {
            return false;
        }
        let dim = match self.dim {
            Some(dim) => dim,
            None => return true, // nothing stored in either
        };
        (0..self.nrows()).all(|r| {
            self.row_range(r).all(|k| match other.find(r, self.col[k]) {
                Some(j) => {
                    let a = &self.data[k * dim..(k + 1) * dim];
                    let b = &other.data[j * dim..(j + 1) * dim];
                    a.iter().zip(b).all(|(&a, &b)| tol.is_close(a, b))
                },
                None => false,
            })
        })
    }

    /// Apply `f` in place to value `d` of every stored nonzero.
    pub fn transform<F>(&mut self, d: usize, mut f: F) -> Result<()>
    where F: FnMut(f64) -> f64,
    {
        let dim = self.dim.ok_or(Error::DimUnset)?;
        if d >= dim {
            return Err(Error::DimOutOfRange { d, dim });
        }
        for r in 0..self.nrows() {
            for k in self.row_range(r) {
                let x = &mut self.data[k * dim + d];
                *x = f(*x);
            }
        }
        Ok(())
    }

    /// A new matrix with the same sparsity, keeping only the listed values.
    ///
    /// `dims` may reorder or repeat value indices.
    pub fn select_dims(&self, dims: &[usize]) -> Result<PhysCsr> {
        let dim = self.dim.ok_or(Error::DimUnset)?;
        if dims.is_empty() {
            return Err(Error::ZeroDim);
        }
        if let Some(&d) = dims.iter().find(|&&d| d >= dim) {
            return Err(Error::DimOutOfRange { d, dim });
        }

        let mut ptr = Vec::with_capacity(self.nrows() + 1);
        let mut col = Vec::with_capacity(self.nnz);
        let mut data = Vec::with_capacity(self.nnz * dims.len());
        ptr.push(0);
        for r in 0..self.nrows() {
            for k in self.row_range(r) {
                col.push(self.col[k]);
                data.extend(dims.iter().map(|&d| self.data[k * dim + d]));
            }
            ptr.push(col.len());
        }
        Ok(validate_csr!(debug, PhysCsr {
            shape: self.shape,
            dim: Some(dims.len()),
            ncol: ptr.windows(2).map(|w| w[1] - w[0]).collect(),
            nnz: col.len(),
            sorted: self.sorted,
            ptr, col, data,
        }))
    }

    /// Drop all padding and sort the columns of each row.
    pub fn finalize(&mut self) {
        if self.is_finalized() {
            return;
        }
        let dim = self.dim.unwrap_or(0);
        let mut ptr = Vec::with_capacity(self.nrows() + 1);
        let mut col = Vec::with_capacity(self.nnz);
        let mut data = Vec::with_capacity(self.nnz * dim);
        let mut order = vec![];
        ptr.push(0);
        for r in 0..self.nrows() {
            order.clear();
            order.extend(self.row_range(r));
            order.sort_by_key(|&k| self.col[k]);
            for &k in &order {
                col.push(self.col[k]);
                data.extend_from_slice(&self.data[k * dim..(k + 1) * dim]);
            }
            ptr.push(col.len());
        }
        self.ncol = ptr.windows(2).map(|w| w[1] - w[0]).collect();
        self.ptr = ptr;
        self.col = col;
        self.data = data;
        self.sorted = true;
    }

    /// Check every class invariant. O(nnz log nnz).
    pub fn validate(&self) -> Result<()> {
        let (nrows, ncols) = self.shape;
        ensure!(self.ptr.len() == nrows + 1, "ptr has length {}, expected {}", self.ptr.len(), nrows + 1);
        ensure!(self.ncol.len() == nrows, "ncol has length {}, expected {}", self.ncol.len(), nrows);
        ensure!(self.ptr[0] == 0, "ptr must start at 0");
        ensure!(self.ptr[nrows] == self.col.len(), "ptr must end at the number of slots");
        ensure!(
            self.ptr.windows(2).zip(&self.ncol).all(|(w, &n)| w[0] <= w[1] && n <= w[1] - w[0]),
            "a row overflows its capacity",
        );
        ensure!(self.ncol.iter().sum::<usize>() == self.nnz, "nnz does not match the row lengths");
        match self.dim {
            Some(dim) => {
                ensure!(dim > 0, "zero values per nonzero");
                ensure!(
                    self.data.len() == self.col.len() * dim,
                    "{} values do not fill {} slots of {} values", self.data.len(), self.col.len(), dim,
                );
            },
            None => ensure!(self.nnz == 0 && self.data.is_empty(), "values stored before D was fixed"),
        }

        let mut seen = vec![];
        for r in 0..nrows {
            let cols = self.row_cols(r);
            ensure!(cols.iter().all(|&c| c < ncols), "column out of range in row {}", r);
            seen.clear();
            seen.extend_from_slice(cols);
            seen.sort_unstable();
            ensure!(seen.windows(2).all(|w| w[0] != w[1]), "duplicate column in row {}", r);
            if self.sorted {
                ensure!(cols == &seen[..], "row {} is not sorted", r);
            }
        }
        Ok(())
    }
}

// private helpers
impl PhysCsr {
    fn check_row(&self, row: usize) -> Result<()> {
        match row < self.nrows() {
            true => Ok(()),
            false => Err(Error::RowOutOfRange { row, nrows: self.nrows() }),
        }
    }

    fn check_col(&self, col: usize) -> Result<()> {
        match col < self.ncols() {
            true => Ok(()),
            false => Err(Error::ColOutOfRange { col, ncols: self.ncols() }),
        }
    }

    // used slots of a row (row must be in range)
    fn row_range(&self, row: usize) -> Range<usize>
    { self.ptr[row]..self.ptr[row] + self.ncol[row] }

    fn row_cols(&self, row: usize) -> &[usize]
    { &self.col[self.row_range(row)] }

    fn row_view(&self, row: usize) -> RowView<'_> {
        let range = self.row_range(row);
        let dim = self.dim.unwrap_or(0);
        RowView {
            cols: &self.col[range.clone()],
            values: &self.data[range.start * dim..range.end * dim],
            dim,
        }
    }

    // slot holding (row, col), if stored
    fn find(&self, row: usize, col: usize) -> Option<usize> {
        let range = self.row_range(row);
        let cols = &self.col[range.clone()];
        let found = match self.sorted {
            true => cols.binary_search(&col).ok(),
            false => cols.iter().position(|&c| c == col),
        };
        found.map(|k| range.start + k)
    }

    fn fix_dim(&mut self, dim: usize) {
        debug_assert!(self.dim.is_none() && self.nnz == 0);
        self.dim = Some(dim);
        self.data = vec![0.0; self.col.len() * dim];
    }

    // append a new column to a row (which must not contain it), returning its slot
    fn push_col(&mut self, row: usize, col: usize) -> usize {
        let used = self.ncol[row];
        if self.ptr[row] + used == self.ptr[row + 1] {
            self.grow_row(row, used + 1);
        }
        let k = self.ptr[row] + used;
        if used > 0 && self.col[k - 1] > col {
            self.sorted = false;
        }
        self.col[k] = col;
        self.ncol[row] += 1;
        self.nnz += 1;
        k
    }

    fn grow_row(&mut self, row: usize, min_capacity: usize) {
        let capacity = self.ptr[row + 1] - self.ptr[row];
        if capacity >= min_capacity {
            return;
        }
        let new_capacity = min_capacity.max(2 * capacity).max(MIN_ROW_CAPACITY);
        let extra = new_capacity - capacity;
        let at = self.ptr[row + 1];

        self.col.splice(at..at, iter::repeat(0).take(extra));
        if let Some(dim) = self.dim {
            self.data.splice(at * dim..at * dim, iter::repeat(0.0).take(extra * dim));
        }
        for p in &mut self.ptr[row + 1..] {
            *p += extra;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_pattern(nrows: usize, ncols: usize, density: f64) -> Vec<(usize, usize)> {
        let mut rng = rand::thread_rng();
        let mut out = vec![];
        for r in 0..nrows {
            for c in 0..ncols {
                if rng.next_f64() < density {
                    out.push((r, c));
                }
            }
        }
        rng.shuffle(&mut out);
        out
    }

    fn build(shape: (usize, usize), entries: &[(usize, usize)]) -> PhysCsr {
        let mut csr = PhysCsr::new(shape, 2).unwrap();
        for &(r, c) in entries {
            csr.set(r, c, &[r as f64, c as f64]).unwrap();
        }
        csr
    }

    #[test]
    fn set_get_overwrite() {
        let mut csr = PhysCsr::new((3, 9), 2).unwrap();
        csr.set(1, 7, &[1.0, 2.0]).unwrap();
        csr.set(1, 2, &[3.0, 4.0]).unwrap();
        assert_eq!(csr.get(1, 7).unwrap(), Some(&[1.0, 2.0][..]));
        assert_eq!(csr.get(1, 3).unwrap(), None);
        assert_eq!(csr.nnz(), 2);

        csr.set(1, 7, &[5.0, 6.0]).unwrap();
        assert_eq!(csr.get(1, 7).unwrap(), Some(&[5.0, 6.0][..]));
        assert_eq!(csr.nnz(), 2);
        csr.validate().unwrap();
    }

    #[test]
    fn errors_do_not_modify() {
        let mut csr = PhysCsr::new((2, 4), 2).unwrap();
        csr.set(0, 0, &[1.0, 1.0]).unwrap();
        let before = csr.clone();

        assert_eq!(csr.set(0, 1, &[1.0]), Err(Error::DimMismatch { expected: 2, found: 1 }));
        assert_eq!(csr.set(0, 4, &[1.0, 1.0]), Err(Error::ColOutOfRange { col: 4, ncols: 4 }));
        assert_eq!(csr.set(2, 0, &[1.0, 1.0]), Err(Error::RowOutOfRange { row: 2, nrows: 2 }));
        assert!(csr.get(5, 0).unwrap_err().is_index_error());
        assert!(csr.set(0, 1, &[]).unwrap_err().is_shape_error());

        assert!(csr.close_to(&before, Tolerances::abs(0.0)));
        assert_eq!(csr.nnz(), 1);
    }

    #[test]
    fn lazy_dim() {
        let mut csr = PhysCsr::with_lazy_dim((2, 2));
        assert_eq!(csr.dim(), None);
        assert_eq!(csr.get(0, 0).unwrap(), None);
        assert_eq!(csr.transform(0, |x| x), Err(Error::DimUnset));
        assert_eq!(csr.select_dims(&[0]).unwrap_err(), Error::DimUnset);

        csr.set(0, 1, &[1.0, 2.0, 3.0]).unwrap();
        assert_eq!(csr.dim(), Some(3));
        assert_eq!(csr.set(1, 1, &[1.0]), Err(Error::DimMismatch { expected: 3, found: 1 }));
        csr.validate().unwrap();
    }

    #[test]
    fn zero_dim_is_rejected() {
        assert_eq!(PhysCsr::new((1, 1), 0).unwrap_err(), Error::ZeroDim);
    }

    #[test]
    fn growth_is_geometric() {
        let n = 1000;
        let mut csr = PhysCsr::new((3, n), 1).unwrap();
        let mut capacities = vec![];
        for c in (0..n).rev() {
            csr.set(1, c, &[c as f64]).unwrap();
            let cap = csr.row_capacity(1).unwrap();
            if capacities.last() != Some(&cap) {
                capacities.push(cap);
            }
        }
        // 4, 8, ..., 1024
        assert_eq!(capacities.len(), 9);
        assert!(capacities.windows(2).all(|w| w[1] == 2 * w[0]));
        assert_eq!(csr.row_capacity(0).unwrap(), 0);
        for c in 0..n {
            assert_eq!(csr.get(1, c).unwrap(), Some(&[c as f64][..]));
        }
        csr.validate().unwrap();
    }

    #[test]
    fn growth_keeps_other_rows() {
        let mut csr = PhysCsr::with_row_capacity((3, 50), 1, 1).unwrap();
        csr.set(0, 3, &[3.0]).unwrap();
        csr.set(2, 5, &[5.0]).unwrap();
        for c in 0..20 {
            csr.set(1, c, &[100.0 + c as f64]).unwrap();
        }
        assert_eq!(csr.get(0, 3).unwrap(), Some(&[3.0][..]));
        assert_eq!(csr.get(2, 5).unwrap(), Some(&[5.0][..]));
        assert_eq!(csr.get(1, 19).unwrap(), Some(&[119.0][..]));
        csr.validate().unwrap();
    }

    #[test]
    fn reserve_row() {
        let mut csr = PhysCsr::new((2, 10), 1).unwrap();
        csr.reserve_row(1, 7).unwrap();
        assert!(csr.row_capacity(1).unwrap() >= 7);
        let cap = csr.capacity();
        for c in 0..7 {
            csr.set(1, c, &[1.0]).unwrap();
        }
        assert_eq!(csr.capacity(), cap);
        assert!(csr.reserve_row(2, 1).is_err());
    }

    #[test]
    fn same_sparsity_is_order_independent() {
        let shape = (12, 36);
        let entries = random_pattern(shape.0, shape.1, 0.3);
        let a = build(shape, &entries);

        let mut reversed = entries.clone();
        reversed.reverse();
        let mut b = build(shape, &reversed);

        assert!(a.same_sparsity(&a));
        assert!(a.same_sparsity(&b));
        assert!(b.same_sparsity(&a));
        assert!(a.close_to(&b, Tolerances::abs(0.0)));

        b.finalize();
        assert!(a.same_sparsity(&b));
        assert!(b.same_sparsity(&a));

        // values do not matter
        let (r, c) = entries[0];
        b.set(r, c, &[-1.0, -1.0]).unwrap();
        assert!(a.same_sparsity(&b));
        assert!(!a.close_to(&b, Tolerances::abs(1e-3)));

        // one extra entry does
        let free = (0..shape.1).find(|&c| a.get(0, c).unwrap().is_none());
        if let Some(c) = free {
            b.set(0, c, &[0.0, 0.0]).unwrap();
            assert!(!a.same_sparsity(&b));
            assert!(!b.same_sparsity(&a));
        }
    }

    #[test]
    fn same_sparsity_moved_entry() {
        let a = build((2, 4), &[(0, 0), (1, 1)]);
        let b = build((2, 4), &[(0, 0), (1, 2)]);
        assert!(!a.same_sparsity(&b));
        let c = build((2, 5), &[(0, 0), (1, 1)]);
        assert!(!a.same_sparsity(&c));
    }

    #[test]
    fn transform_and_undo() {
        let entries = random_pattern(6, 18, 0.4);
        let mut csr = build((6, 18), &entries);
        let orig = csr.clone();

        csr.transform(0, |x| x + 0.25).unwrap();
        for (r, c, v) in csr.iter() {
            assert_eq!(v, &[r as f64 + 0.25, c as f64][..]);
        }
        csr.transform(0, |x| x - 0.25).unwrap();
        assert!(csr.close_to(&orig, Tolerances::abs(1e-12)));
        assert_eq!(csr.transform(2, |x| x), Err(Error::DimOutOfRange { d: 2, dim: 2 }));
    }

    #[test]
    fn finalize_compacts_and_sorts() {
        let mut csr = build((3, 9), &[(0, 5), (0, 1), (2, 8), (2, 0), (2, 4)]);
        assert!(!csr.is_finalized());
        csr.finalize();
        assert!(csr.is_finalized());
        assert_eq!(csr.capacity(), csr.nnz());
        assert_eq!(csr.row(0).unwrap().cols(), &[1, 5]);
        assert_eq!(csr.row(1).unwrap().cols(), &[] as &[usize]);
        assert_eq!(csr.row(2).unwrap().cols(), &[0, 4, 8]);
        assert_eq!(csr.row(2).unwrap().values(), &[2.0, 0.0, 2.0, 4.0, 2.0, 8.0]);
        csr.validate().unwrap();

        // still usable afterwards
        csr.set(1, 3, &[1.0, 3.0]).unwrap();
        assert_eq!(csr.get(1, 3).unwrap(), Some(&[1.0, 3.0][..]));
    }

    #[test]
    fn remove_entry() {
        let mut csr = build((1, 6), &[(0, 1), (0, 3), (0, 5)]);
        assert_eq!(csr.remove(0, 3).unwrap(), Some(vec![0.0, 3.0]));
        assert_eq!(csr.remove(0, 3).unwrap(), None);
        assert_eq!(csr.row(0).unwrap().cols(), &[1, 5]);
        assert_eq!(csr.get(0, 5).unwrap(), Some(&[0.0, 5.0][..]));
        assert_eq!(csr.nnz(), 2);
        csr.validate().unwrap();
    }

    #[test]
    fn select_dims() {
        let csr = build((2, 4), &[(0, 3), (1, 2)]);
        let swapped = csr.select_dims(&[1, 0]).unwrap();
        assert!(swapped.same_sparsity(&csr));
        assert_eq!(swapped.get(0, 3).unwrap(), Some(&[3.0, 0.0][..]));

        let one = csr.select_dims(&[1]).unwrap();
        assert_eq!(one.dim(), Some(1));
        assert_eq!(one.get(1, 2).unwrap(), Some(&[2.0][..]));
        assert_eq!(csr.select_dims(&[2]).unwrap_err(), Error::DimOutOfRange { d: 2, dim: 2 });
    }

    #[test]
    fn from_parts_validates() {
        let csr = PhysCsr::from_parts((2, 4), 1, vec![0, 2, 3], vec![3, 1, 0], vec![3.0, 1.0, 0.0]).unwrap();
        assert!(csr.is_finalized());
        assert_eq!(csr.row(0).unwrap().cols(), &[1, 3]);
        assert_eq!(csr.get(0, 3).unwrap(), Some(&[3.0][..]));

        let dup = PhysCsr::from_parts((1, 4), 1, vec![0, 2], vec![1, 1], vec![0.0, 0.0]);
        assert!(matches!(dup, Err(Error::BadParts(_))));

        let oob = PhysCsr::from_parts((1, 4), 1, vec![0, 1], vec![4], vec![0.0]);
        assert!(matches!(oob, Err(Error::BadParts(_))));

        let short = PhysCsr::from_parts((1, 4), 2, vec![0, 1], vec![0], vec![0.0]);
        assert!(matches!(short, Err(Error::BadParts(_))));

        let bad_ptr = PhysCsr::from_parts((2, 4), 1, vec![0, 2, 1], vec![0, 1], vec![0.0, 0.0]);
        assert!(matches!(bad_ptr, Err(Error::BadParts(_))));
    }

    #[test]
    fn iter_visits_everything() {
        let entries = random_pattern(5, 15, 0.5);
        let csr = build((5, 15), &entries);
        let mut seen = csr.iter().map(|(r, c, _)| (r, c)).collect::<Vec<_>>();
        let mut expected = entries.clone();
        seen.sort();
        expected.sort();
        assert_eq!(seen, expected);
    }
}
