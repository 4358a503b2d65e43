/**
 * File: /src/reconstruction.rs
 * Created Date: Wednesday, October 14th 2026
 * Author: Zihan
 * -----
 * Last Modified: Friday, 16th October 2026 5:31:18 pm
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-14		Zihan	Label matrix from a partition, strict / overwrite modes
**/
use log::{debug, warn};
use ndarray::Array2;

use crate::error::{InspectError, Result};
use crate::matrix::Matrix;
use crate::partition::Partition;

/// Cell -> 1-based rectangle label, 0 for unassigned.
pub type LabelMatrix = Array2<usize>;

/// What to do when two rectangles claim the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Later rectangles overwrite earlier ones, as the optimizer's own plot did.
    #[default]
    Overwrite,
    /// Fail on the first cell assigned twice.
    Strict,
}

/// Paint every rectangle onto an `n x n` grid in key order, label = key + 1.
pub fn rebuild_label_matrix(
    n: usize,
    partition: &Partition,
    policy: OverlapPolicy,
) -> Result<LabelMatrix> {
    let mut labels = LabelMatrix::zeros((n, n));
    let mut overwritten = 0usize;

    for rect in partition.iter() {
        if let Some(&i) = rect.rows.iter().chain(rect.cols.iter()).find(|&&i| i >= n) {
            return Err(InspectError::schema(format!(
                "rectangle {}: index {} outside a {}x{} matrix",
                rect.key, i, n, n
            )));
        }
        let label = rect.key + 1;
        for &i in &rect.rows {
            for &j in &rect.cols {
                let cell = &mut labels[(i, j)];
                if *cell != 0 {
                    if policy == OverlapPolicy::Strict {
                        return Err(InspectError::Overlap {
                            cell: (i, j),
                            first: *cell - 1,
                            second: rect.key,
                        });
                    }
                    overwritten += 1;
                }
                *cell = label;
            }
        }
    }

    if overwritten > 0 {
        warn!("{} cell(s) overwritten by later rectangles", overwritten);
    }
    debug!("rebuilt {}x{} label matrix from {} rectangles", n, n, partition.len());
    Ok(labels)
}

/// Every cell must carry a label.
pub fn validate_full_coverage(labels: &LabelMatrix) -> Result<()> {
    let mut unassigned = labels.indexed_iter().filter(|(_, &l)| l == 0);
    match unassigned.next() {
        None => Ok(()),
        Some((first, _)) => Err(InspectError::Coverage {
            unassigned: 1 + unassigned.count(),
            first,
        }),
    }
}

/// Strict rebuild followed by the coverage check: succeeds only when the
/// partition tiles the grid exactly.
pub fn rebuild_strict(n: usize, partition: &Partition) -> Result<LabelMatrix> {
    let labels = rebuild_label_matrix(n, partition, OverlapPolicy::Strict)?;
    validate_full_coverage(&labels)?;
    Ok(labels)
}

/// 1.0 where the matrix is non-zero, 0.0 elsewhere.
pub fn binarize(matrix: &Matrix<f64>) -> Array2<f64> {
    matrix.data.mapv(|v| if v != 0.0 { 1.0 } else { 0.0 })
}
