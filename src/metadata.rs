/**
 * File: /src/metadata.rs
 * Created Date: Tuesday, October 13th 2026
 * Author: Zihan
 * -----
 * Last Modified: Thursday, 15th October 2026 2:08:33 pm
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-13		Zihan	Parser for the optimizer's meta.txt
**/
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::error::{InspectError, Result};

/// Problem description recorded next to a partition.
///
/// ```text
/// Problem metadata :
/// Dimensions : 2
/// N : 64 64
/// E : 812
/// Ew : 1034.5
///
/// Algorithm metadata :
/// lambda : 0.25
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// D
    pub dimensions: usize,
    /// N, one extent per axis
    pub extents: Vec<usize>,
    pub lambda: f64,
    /// Non-zero cell count, when recorded
    pub edges: Option<u64>,
    /// Total matrix weight, when recorded
    pub total_weight: Option<f64>,
}

impl Metadata {
    pub fn new(dimensions: usize, extents: Vec<usize>, lambda: f64) -> Self {
        Metadata {
            dimensions,
            extents,
            lambda,
            edges: None,
            total_weight: None,
        }
    }

    /// Scan every line; later lines win when a key repeats.
    pub fn parse(text: &str) -> Result<Self> {
        let mut dimensions = None;
        let mut extents = None;
        let mut lambda = None;
        let mut edges = None;
        let mut total_weight = None;

        for (lineno, line) in text.lines().enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let last = match tokens.last() {
                Some(last) => *last,
                None => continue,
            };
            let lineno = lineno + 1;

            if tokens.iter().any(|t| t.contains("Dimensions")) {
                dimensions = Some(number::<usize>(last, lineno)?);
            }
            if tokens.iter().any(|t| *t == "N") {
                let values = tokens
                    .iter()
                    .skip(2)
                    .map(|t| number::<usize>(t, lineno))
                    .collect::<Result<Vec<_>>>()?;
                extents = Some(values);
            }
            if tokens.iter().any(|t| t.contains("lambda")) {
                lambda = Some(number::<f64>(last, lineno)?);
            }
            match tokens[0] {
                "E" => edges = Some(number::<u64>(last, lineno)?),
                "Ew" => total_weight = Some(number::<f64>(last, lineno)?),
                _ => {}
            }
        }

        let dimensions = dimensions.ok_or_else(|| InspectError::schema("metadata: no `Dimensions` line"))?;
        let extents = extents.ok_or_else(|| InspectError::schema("metadata: no `N` line"))?;
        let lambda = lambda.ok_or_else(|| InspectError::schema("metadata: no `lambda` line"))?;

        if extents.is_empty() {
            return Err(InspectError::schema("metadata: `N` line lists no extents"));
        }
        if extents.len() != dimensions {
            return Err(InspectError::schema(format!(
                "metadata: {} dimension(s) but {} extent(s)",
                dimensions,
                extents.len()
            )));
        }
        if !lambda.is_finite() {
            return Err(InspectError::format(format!("metadata: lambda is {}", lambda)));
        }

        Ok(Metadata {
            dimensions,
            extents,
            lambda,
            edges,
            total_weight,
        })
    }

    /// Extent of the first axis.
    pub fn side(&self) -> Option<usize> {
        self.extents.first().copied()
    }
}

fn number<T: FromStr>(token: &str, lineno: usize) -> Result<T> {
    token.parse::<T>().map_err(|_| {
        InspectError::format(format!("metadata line {}: `{}` is not a valid number", lineno, token))
    })
}

pub fn load_metadata<P: AsRef<Path>>(path: P) -> Result<Metadata> {
    let meta = Metadata::parse(&fs::read_to_string(path.as_ref())?)?;
    debug!(
        "metadata: D={} N={:?} lambda={}",
        meta.dimensions, meta.extents, meta.lambda
    );
    Ok(meta)
}
