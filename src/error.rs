/**
 * File: /src/error.rs
 * Created Date: Monday, October 12th 2026
 * Author: Zihan
 * -----
 * Last Modified: Monday, 19th October 2026 10:02:11 am
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-12		Zihan	Error taxonomy for loading and evaluating partitions
**/
use std::error::Error;
use std::fmt;

/// Errors raised while loading run artifacts or recomputing a partition cost.
///
/// None of these are recovered from inside the crate: a degenerate input never
/// turns into a default value.
#[derive(Debug)]
pub enum InspectError {
    Io(std::io::Error),
    /// Malformed matrix, partition, metadata or trace file.
    Format(String),
    /// Required field missing or inconsistent with the rest of the record.
    Schema(String),
    /// Cells left unassigned after reconstruction.
    Coverage {
        unassigned: usize,
        first: (usize, usize),
    },
    /// A cell claimed by two rectangles in strict mode.
    Overlap {
        cell: (usize, usize),
        first: usize,
        second: usize,
    },
    /// Whole-matrix divergence is zero (empty or uniform matrix).
    DegenerateNorm(f64),
    /// `E <= 1` makes `log2(sqrt(E))` non-positive.
    DegenerateE(i64),
    /// Rectangle with zero weight that still claims non-zero cells.
    DegenerateRect { key: usize, non_zero: usize },
}

pub type Result<T> = std::result::Result<T, InspectError>;

impl InspectError {
    pub fn format(msg: impl Into<String>) -> Self {
        InspectError::Format(msg.into())
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        InspectError::Schema(msg.into())
    }
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InspectError::Io(e) => write!(f, "I/O error: {}", e),
            InspectError::Format(msg) => write!(f, "Format error: {}", msg),
            InspectError::Schema(msg) => write!(f, "Schema error: {}", msg),
            InspectError::Coverage { unassigned, first } => write!(
                f,
                "Coverage error: {} cell(s) unassigned, first at ({}, {})",
                unassigned, first.0, first.1
            ),
            InspectError::Overlap {
                cell,
                first,
                second,
            } => write!(
                f,
                "Overlap error: cell ({}, {}) covered by rectangles {} and {}",
                cell.0, cell.1, first, second
            ),
            InspectError::DegenerateNorm(norm) => {
                write!(f, "Degenerate matrix: divergence norm is {}", norm)
            }
            InspectError::DegenerateE(e) => {
                write!(f, "Degenerate E statistic {} (must be greater than 1)", e)
            }
            InspectError::DegenerateRect { key, non_zero } => write!(
                f,
                "Degenerate rectangle {}: zero weight but {} non-zero cell(s)",
                key, non_zero
            ),
        }
    }
}

impl Error for InspectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InspectError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for InspectError {
    fn from(e: std::io::Error) -> Self {
        InspectError::Io(e)
    }
}

impl From<serde_json::Error> for InspectError {
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            // missing field, wrong type, failed validation inside a visitor
            Category::Data => InspectError::Schema(e.to_string()),
            Category::Io => InspectError::Format(format!("read failed: {}", e)),
            Category::Syntax | Category::Eof => InspectError::Format(e.to_string()),
        }
    }
}

impl From<ndarray_npy::ReadNpyError> for InspectError {
    fn from(e: ndarray_npy::ReadNpyError) -> Self {
        InspectError::Format(format!("npy: {}", e))
    }
}
