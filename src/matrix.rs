/*
 * File: /matrix.rs
 * Created Date: Thursday November 23rd 2023
 * Author: Zihan
 * -----
 * Last Modified: Monday, 19th October 2026 11:20:05 am
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-13		Zihan	Square observation matrix + text/npy loader
 */

use std::fs::{self, File};
use std::ops::Index;
use std::path::Path;

use log::debug;
use ndarray::Array2;
use ndarray_npy::ReadNpyExt;

use crate::error::{InspectError, Result};

/// Dense observation matrix, rows and cols kept alongside the data.
#[derive(Debug, Clone)]
pub struct Matrix<T> {
    pub data: Array2<T>,
    pub rows: usize,
    pub cols: usize,
}

impl<T> Matrix<T> {
    // constructor with Array2<T>, no validation
    pub fn new(data: Array2<T>) -> Matrix<T> {
        let rows = data.shape()[0];
        let cols = data.shape()[1];
        Matrix { data, rows, cols }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&T> {
        if row >= self.rows || col >= self.cols {
            None
        } else {
            Some(&self.data[(row, col)])
        }
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &Self::Output {
        let (row, col) = index;
        &self.data[(row, col)]
    }
}

impl Matrix<f64> {
    /// Wrap an array after checking it is a non-empty square grid of
    /// non-negative finite values.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        let (rows, cols) = data.dim();
        if rows == 0 || cols == 0 {
            return Err(InspectError::format("matrix is empty"));
        }
        if rows != cols {
            return Err(InspectError::format(format!(
                "matrix is not square: {} rows, {} cols",
                rows, cols
            )));
        }
        if let Some(((i, j), v)) = data
            .indexed_iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            return Err(InspectError::format(format!(
                "invalid value {} at ({}, {}): expected a non-negative number",
                v, i, j
            )));
        }
        Ok(Matrix::new(data))
    }

    /// Parse a whitespace-delimited, headerless table.
    pub fn parse(text: &str) -> Result<Self> {
        let mut values: Vec<f64> = Vec::new();
        let mut width: Option<usize> = None;
        let mut rows = 0;

        for (lineno, line) in text.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.is_empty() {
                continue;
            }
            match width {
                None => width = Some(tokens.len()),
                Some(w) if w != tokens.len() => {
                    return Err(InspectError::format(format!(
                        "line {}: expected {} columns, found {}",
                        lineno + 1,
                        w,
                        tokens.len()
                    )));
                }
                _ => {}
            }
            for tok in tokens {
                let v = tok.parse::<f64>().map_err(|_| {
                    InspectError::format(format!("line {}: `{}` is not a number", lineno + 1, tok))
                })?;
                values.push(v);
            }
            rows += 1;
        }

        let cols = width.unwrap_or(0);
        let data = Array2::from_shape_vec((rows, cols), values)
            .map_err(|e| InspectError::format(e.to_string()))?;
        Self::from_array(data)
    }

    /// Side length N.
    pub fn side(&self) -> usize {
        self.rows
    }

    /// Number of cells, N*N.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Sum of all cell values, row-major.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn non_zero_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0.0).count()
    }
}

/// Load the original matrix. `.npy` files go through `ndarray-npy`, anything
/// else is read as a space separated text table.
pub fn load_matrix<P: AsRef<Path>>(path: P) -> Result<Matrix<f64>> {
    let path = path.as_ref();
    let matrix = if path.extension().map_or(false, |ext| ext == "npy") {
        let reader = File::open(path)?;
        Matrix::from_array(Array2::<f64>::read_npy(reader)?)?
    } else {
        Matrix::parse(&fs::read_to_string(path)?)?
    };
    debug!(
        "loaded {}x{} matrix from {} (weight {})",
        matrix.rows,
        matrix.cols,
        path.display(),
        matrix.total()
    );
    Ok(matrix)
}
