/**
 * File: /src/Submatrix.rs
 * Created Date: Monday January 22nd 2024
 * Author: Zihan
 * -----
 * Last Modified: Wednesday, 14th October 2026 3:12:40 pm
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-14		Zihan	Block view over index sets, weight / non-zero stats
**/

/// Extend the usage of slice for ndarray
/// A block is the Cartesian product of a row index set and a column index
/// set; the sets need not be contiguous.
use ndarray::Array2;
use std::ops::Index;

///
/// # Example
/// ```
/// use gcp_inspect::submatrix::Submatrix;
/// use ndarray::Array2;
/// let a = Array2::from_shape_vec((3, 3), vec![1, 2, 3, 4, 5, 6, 7, 8, 9]).unwrap();
/// let b = Submatrix::from_indices(&a, &[0, 2], &[1, 2]).unwrap();
///
/// assert_eq!(b[(1, 1)], 9);
/// assert_eq!(b[(0, 0)], 2);
/// ```
/// b = [[2, 3],
///     [8, 9]]
pub struct Submatrix<'a, T> {
    data: &'a Array2<T>,
    row_indices: &'a [usize],
    col_indices: &'a [usize],
}

impl<'a, T> Submatrix<'a, T> {
    /// `None` when an index falls outside the matrix.
    pub fn from_indices(
        matrix: &'a Array2<T>,
        row_indices: &'a [usize],
        col_indices: &'a [usize],
    ) -> Option<Self> {
        let (row_max, col_max) = matrix.dim();

        if row_indices.iter().any(|&r| r >= row_max) || col_indices.iter().any(|&c| c >= col_max) {
            None
        } else {
            Some(Submatrix {
                data: matrix,
                row_indices,
                col_indices,
            })
        }
    }

    /// Number of cells in the block, |rows| * |cols|.
    pub fn size(&self) -> usize {
        self.row_indices.len() * self.col_indices.len()
    }

    /// Original (row, col) coordinates covered by the block, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + 'a {
        let (rows, cols) = (self.row_indices, self.col_indices);
        rows.iter()
            .flat_map(move |&r| cols.iter().map(move |&c| (r, c)))
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
        let data = self.data;
        self.cells().map(move |idx| &data[idx])
    }
}

impl<'a> Submatrix<'a, f64> {
    /// Sum of the block values.
    pub fn weight(&self) -> f64 {
        self.iter().sum()
    }

    pub fn non_zero(&self) -> usize {
        self.iter().filter(|&&v| v != 0.0).count()
    }
}

impl<'a, T> Index<(usize, usize)> for Submatrix<'a, T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (i, j) = index;
        &self.data[(self.row_indices[i], self.col_indices[j])]
    }
}

// impl Display
/// # Example
/// ```log
/// [2, 3, ]
/// [8, 9, ]
/// ```
impl<'a, T> std::fmt::Display for Submatrix<'a, T>
where
    T: std::fmt::Display,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = String::new();
        for i in 0..self.row_indices.len() {
            s.push('[');
            for j in 0..self.col_indices.len() {
                s.push_str(&format!("{}, ", &self[(i, j)]));
            }
            s.push_str("]\n");
        }

        write!(f, "{}", s)
    }
}
