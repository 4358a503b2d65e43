/**
 * File: /src/lib.rs
 * Created Date: Monday, January 22nd 2024
 * Author: Zihan
 * -----
 * Last Modified: Monday, 19th October 2026 11:02:48 am
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-12		Zihan	Repurposed as the partition inspection library
**/
pub mod config;
pub mod error;
pub mod evaluator;
pub mod matrix;
pub mod metadata;
pub mod partition;
pub mod reconstruction;
pub mod submatrix;
pub mod trace;

pub use error::{InspectError, Result};
pub use evaluator::{check_against_stored, evaluate, evaluate_many, CostCheck, CostReport};
pub use matrix::{load_matrix, Matrix};
pub use metadata::{load_metadata, Metadata};
pub use partition::{load_partition, FinalSummary, Partition, Rectangle};
pub use reconstruction::{
    binarize, rebuild_label_matrix, rebuild_strict, validate_full_coverage, LabelMatrix,
    OverlapPolicy,
};

use log::{info, warn};

/// Everything recomputed for one run.
#[derive(Debug)]
pub struct Inspection {
    pub metadata: Metadata,
    pub report: CostReport,
    pub check: CostCheck,
    pub labels: LabelMatrix,
    /// `Some(true)` when the trace confirms a penalty linear in Rsize
    pub linear_penalty: Option<bool>,
}

/// Load the artifacts named by `config`, rebuild the label matrix and
/// recompute the cost.
pub fn run(config: &config::Config) -> Result<Inspection> {
    let matrix = load_matrix(config.get_matrix_path())?;
    let metadata = load_metadata(config.get_meta_path())?;
    let partition = load_partition(config.get_partition_path())?;

    let labels = match config.get_policy() {
        OverlapPolicy::Strict => rebuild_strict(matrix.side(), &partition)?,
        OverlapPolicy::Overwrite => {
            rebuild_label_matrix(matrix.side(), &partition, OverlapPolicy::Overwrite)?
        }
    };

    let report = evaluate(&matrix, &metadata, &partition)?;
    info!(
        "lambda {}: Rsize {}, total dkl {:.6}, penalty {:.6}, cost {:.6}",
        metadata.lambda,
        partition.len(),
        report.total_dkl,
        report.penalty,
        report.cost
    );
    let check = check_against_stored(&matrix, &partition, &report, config.get_tol())?;

    let linear_penalty = match config.get_trace_path() {
        Some(path) => {
            let trace = trace::load_trace(path)?;
            let linear = trace.is_linear_penalty(config.get_trace_tol());
            if !linear {
                warn!("trace penalty is not proportional to Rsize");
            }
            Some(linear)
        }
        None => None,
    };

    Ok(Inspection {
        metadata,
        report,
        check,
        labels,
        linear_penalty,
    })
}
