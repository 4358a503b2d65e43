/**
 * File: /src/trace.rs
 * Created Date: Friday, October 16th 2026
 * Author: Zihan
 * -----
 * Last Modified: Saturday, 17th October 2026 11:47:02 am
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-16		Zihan	Per-iteration optimizer trace (optim_data.csv)
**/

// Space separated, one header line:
// cost ldkl penalty Rsize d_cost d_ldkl d_penalty d_Rsize found accepted tfind tdelta tdone
// Only the objective columns are required; the rest are kept by name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;

use crate::error::{InspectError, Result};

/// One recorded iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRow {
    pub cost: f64,
    pub ldkl: f64,
    pub penalty: f64,
    pub rsize: f64,
    pub extra: HashMap<String, f64>,
}

#[derive(Debug, Clone)]
pub struct Trace {
    pub columns: Vec<String>,
    pub rows: Vec<TraceRow>,
}

/// The optimizer prints its trace with six significant digits, so a ratio
/// can drift by about 1e-5 between iterations from rounding alone.
pub const TRACE_TOLERANCE: f64 = 1e-4;

const REQUIRED: [&str; 4] = ["cost", "ldkl", "penalty", "Rsize"];

impl Trace {
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty());
        let (_, header) = lines
            .next()
            .ok_or_else(|| InspectError::format("trace: empty file"))?;

        // trailing separators leave "Unnamed" columns in other readers; drop them
        let columns: Vec<String> = header.split(' ').map(str::to_string).collect();
        let named: Vec<usize> = (0..columns.len()).filter(|&i| !columns[i].is_empty()).collect();

        let position = |name: &str| -> Result<usize> {
            named
                .iter()
                .position(|&i| columns[i] == name)
                .ok_or_else(|| InspectError::schema(format!("trace: no `{}` column", name)))
        };
        let [cost, ldkl, penalty, rsize] = [
            position(REQUIRED[0])?,
            position(REQUIRED[1])?,
            position(REQUIRED[2])?,
            position(REQUIRED[3])?,
        ];

        let mut rows = Vec::new();
        for (lineno, line) in lines {
            let fields = line
                .split_whitespace()
                .map(|t| {
                    t.parse::<f64>().map_err(|_| {
                        InspectError::format(format!("trace line {}: `{}` is not a number", lineno + 1, t))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            if fields.len() != named.len() {
                return Err(InspectError::format(format!(
                    "trace line {}: {} fields for {} columns",
                    lineno + 1,
                    fields.len(),
                    named.len()
                )));
            }
            let extra = named
                .iter()
                .enumerate()
                .filter(|(pos, _)| ![cost, ldkl, penalty, rsize].contains(pos))
                .map(|(pos, &col)| (columns[col].clone(), fields[pos]))
                .collect();
            rows.push(TraceRow {
                cost: fields[cost],
                ldkl: fields[ldkl],
                penalty: fields[penalty],
                rsize: fields[rsize],
                extra,
            });
        }

        let columns = named.into_iter().map(|i| columns[i].clone()).collect();
        Ok(Trace { columns, rows })
    }

    pub fn last(&self) -> Option<&TraceRow> {
        self.rows.last()
    }

    /// `penalty / Rsize` for every iteration with a non-zero size.
    pub fn penalty_per_rectangle(&self) -> Vec<f64> {
        self.rows
            .iter()
            .filter(|r| r.rsize > 0.0)
            .map(|r| r.penalty / r.rsize)
            .collect()
    }

    /// True when every iteration is consistent with
    /// `penalty = c * Rsize` and `cost = ldkl + penalty` for a single `c`.
    /// `tolerance` is relative.
    pub fn is_linear_penalty(&self, tolerance: f64) -> bool {
        let ratios = self.penalty_per_rectangle();
        let first = match ratios.first() {
            Some(&c) => c,
            None => return false,
        };
        ratios.iter().all(|c| (c - first).abs() <= tolerance * first.abs())
            && self
                .rows
                .iter()
                .all(|r| (r.ldkl + r.penalty - r.cost).abs() <= tolerance * r.cost.abs().max(1.0))
    }
}

pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Trace> {
    let trace = Trace::parse(&fs::read_to_string(path.as_ref())?)?;
    debug!("trace: {} iterations, columns {:?}", trace.rows.len(), trace.columns);
    Ok(trace)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACE: &str = "cost ldkl penalty Rsize d_cost found \n\
        3.5 0.5 3 3 -0.1 1\n\
        4.2 0.2 4 4 0.7 1\n\
        \n\
        4.1 0.1 4 4 -0.1 0\n";

    #[test]
    fn test_parse_trace() {
        let t = Trace::parse(TRACE).unwrap();
        assert_eq!(t.columns, vec!["cost", "ldkl", "penalty", "Rsize", "d_cost", "found"]);
        assert_eq!(t.rows.len(), 3);
        let last = t.last().unwrap();
        assert_eq!(last.cost, 4.1);
        assert_eq!(last.rsize, 4.0);
        assert_eq!(last.extra["found"], 0.0);
        assert_eq!(last.extra["d_cost"], -0.1);
    }

    #[test]
    fn test_linear_penalty() {
        let t = Trace::parse(TRACE).unwrap();
        assert_eq!(t.penalty_per_rectangle(), vec![1.0, 1.0, 1.0]);
        assert!(t.is_linear_penalty(1e-9));

        let skewed = TRACE.replace("4.2 0.2 4 4", "5.2 0.2 5 4");
        assert!(!Trace::parse(&skewed).unwrap().is_linear_penalty(1e-9));
    }

    #[test]
    fn test_six_digit_trace() {
        // λ = 0.25, E = 812, printed the way the optimizer prints doubles
        let text = "cost ldkl penalty Rsize d_cost \n\
            1.06754 0.912346 0.155194 3 -0.01\n\
            0.980153 0.618034 0.362119 7 -0.01\n\
            1.03499 0.414214 0.620775 12 -0.01\n\
            1.25472 0.271828 0.982894 19 -0.01\n\
            1.51822 0.173205 1.34501 26 -0.01\n";
        let t = Trace::parse(text).unwrap();
        assert!(t.is_linear_penalty(TRACE_TOLERANCE));
        assert!(!t.is_linear_penalty(1e-9));

        // a penalty growing faster than Rsize
        let curved = text.replace("1.34501 26", "1.57311 26");
        assert!(!Trace::parse(&curved).unwrap().is_linear_penalty(TRACE_TOLERANCE));
    }

    #[test]
    fn test_missing_column() {
        let text = TRACE.replace("ldkl", "loss");
        assert!(matches!(Trace::parse(&text), Err(InspectError::Schema(_))));
    }

    #[test]
    fn test_short_row() {
        let text = TRACE.replace("4.2 0.2 4 4 0.7 1", "4.2 0.2 4 4");
        assert!(matches!(Trace::parse(&text), Err(InspectError::Format(_))));
    }
}
