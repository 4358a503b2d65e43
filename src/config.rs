/**
 * File: /src/config.rs
 * Created Date: Friday, January 26th 2024
 * Author: Zihan
 * -----
 * Last Modified: Saturday, 17th October 2026 4:15:09 pm
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-17		Zihan	Run artifacts for partition inspection
 */
use std::path::PathBuf;

use crate::evaluator::CHECK_TOLERANCE;
use crate::reconstruction::OverlapPolicy;
use crate::trace::TRACE_TOLERANCE;

pub struct Config {
    // run artifacts
    matrix_path:    PathBuf,
    partition_path: PathBuf,
    meta_path:      PathBuf,
    trace_path:     Option<PathBuf>,
    // overlap handling for the label matrix
    policy:         OverlapPolicy,
    // tolerance for stored-vs-recomputed checks
    tol:            f64,
    // relative tolerance for the trace, which is written with fewer digits
    trace_tol:      f64,
}

impl Config {
    /// constructor
    ///
    /// # Examples
    /// ```bash
    /// $ cargo run -- run/matrix_data.csv run/lambda=0.25_2018.json run/meta.txt --strict
    /// $ cargo run -- run/matrix_data.csv run/lambda=0.25_2018.json run/meta.txt --trace run/optim_data.csv --tol 1e-6
    /// $ cargo run -- run/matrix_data.csv run/lambda=0.25_2018.json run/meta.txt --trace run/optim_data.csv --trace-tol 1e-3
    /// ```
    pub fn new(
        mut args: impl Iterator<Item = String>,
    ) -> Result<Config, Box<dyn std::error::Error>> {
        // args:
        // 0: program name
        // 1: matrix path
        // 2: partition path
        // 3: meta path
        // then flags: --strict, --trace <path>, --tol <f64>, --trace-tol <f64>
        args.next();
        let matrix_path = PathBuf::from(args.next().ok_or("missing matrix path")?);
        let partition_path = PathBuf::from(args.next().ok_or("missing partition path")?);
        let meta_path = PathBuf::from(args.next().ok_or("missing meta path")?);

        let mut trace_path = None;
        let mut policy = OverlapPolicy::Overwrite;
        let mut tol = CHECK_TOLERANCE;
        let mut trace_tol = TRACE_TOLERANCE;
        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--strict" => policy = OverlapPolicy::Strict,
                "--trace" => {
                    trace_path = Some(PathBuf::from(args.next().ok_or("--trace needs a path")?))
                }
                "--tol" => tol = args.next().ok_or("--tol needs a value")?.parse::<f64>()?,
                "--trace-tol" => {
                    trace_tol = args.next().ok_or("--trace-tol needs a value")?.parse::<f64>()?
                }
                other => return Err(format!("unknown argument `{}`", other).into()),
            }
        }

        Ok(Config {
            matrix_path,
            partition_path,
            meta_path,
            trace_path,
            policy,
            tol,
            trace_tol,
        })
    }

    pub fn get_matrix_path(&self) -> &PathBuf {
        &self.matrix_path
    }

    pub fn get_partition_path(&self) -> &PathBuf {
        &self.partition_path
    }

    pub fn get_meta_path(&self) -> &PathBuf {
        &self.meta_path
    }

    pub fn get_trace_path(&self) -> Option<&PathBuf> {
        self.trace_path.as_ref()
    }

    pub fn get_policy(&self) -> OverlapPolicy {
        self.policy
    }

    pub fn get_tol(&self) -> f64 {
        self.tol
    }

    pub fn get_trace_tol(&self) -> f64 {
        self.trace_tol
    }
}
