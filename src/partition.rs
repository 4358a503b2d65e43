/*
 * File: /src/partition.rs
 * Created Date: Tuesday, October 13th 2026
 * Author: Zihan
 * -----
 * Last Modified: Monday, 19th October 2026 9:40:52 am
 * Modified By: the developer formerly known as Zihan at <wzh4464@gmail.com>
 * -----
 * HISTORY:
 * Date      		By   	Comments
 * ----------		------	---------------------------------------------------------
 * 2026-10-13		Zihan	Partition model and JSON loader
 * 2026-10-16		Zihan	Reject duplicate / gapped rectangle keys
**/

//! # Partition model
//!
//! A partition as written by the optimizer:
//!
//! ```json
//! {
//!   "R": {
//!     "0": {"geometry": [[0, 2], [1]], "size": 2, "non zero": 1, "weight": 3.0, "dkl": 0.0}
//!   },
//!   "final": {"Rsize": 1, "cost": 1.5, "dkl": 0.0, "E": 12}
//! }
//! ```
//!
//! The string-keyed `"R"` map becomes a dense `Vec<Rectangle>` indexed by key.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::marker::PhantomData;
use std::path::Path;

use log::{debug, info};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{InspectError, Result};
use crate::matrix::Matrix;
use crate::submatrix::Submatrix;

/// One axis-aligned combinatorial block of the partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rectangle {
    /// 0-based position in the partition
    pub key: usize,
    /// Row index set (axis 0)
    pub rows: Vec<usize>,
    /// Column index set (axis 1)
    pub cols: Vec<usize>,
    pub size: usize,
    pub non_zero: usize,
    pub weight: f64,
    /// Divergence as recorded by the optimizer
    pub dkl: f64,
}

impl Rectangle {
    pub fn new(
        key: usize,
        rows: Vec<usize>,
        cols: Vec<usize>,
        non_zero: usize,
        weight: f64,
        dkl: f64,
    ) -> Result<Self> {
        let size = rows.len() * cols.len();
        let rect = Rectangle {
            key,
            rows,
            cols,
            size,
            non_zero,
            weight,
            dkl,
        };
        rect.validate()?;
        Ok(rect)
    }

    /// Build a rectangle whose weight and non-zero count are measured on
    /// `matrix`. The stored divergence is left at 0.
    pub fn measured(
        key: usize,
        rows: Vec<usize>,
        cols: Vec<usize>,
        matrix: &Matrix<f64>,
    ) -> Result<Self> {
        let (weight, non_zero) = {
            let block = Submatrix::from_indices(&matrix.data, &rows, &cols).ok_or_else(|| {
                InspectError::schema(format!("rectangle {}: index outside the matrix", key))
            })?;
            (block.weight(), block.non_zero())
        };
        Self::new(key, rows, cols, non_zero, weight, 0.0)
    }

    pub fn geometry(&self) -> (&[usize], &[usize]) {
        (&self.rows, &self.cols)
    }

    /// Fraction of non-zero cells.
    pub fn density(&self) -> f64 {
        self.non_zero as f64 / self.size as f64
    }

    /// Mean cell value.
    pub fn activity(&self) -> f64 {
        self.weight / self.size as f64
    }

    pub fn is_empty(&self) -> bool {
        self.non_zero == 0
    }

    fn validate(&self) -> Result<()> {
        let key = self.key;
        for (axis, set) in [&self.rows, &self.cols].iter().enumerate() {
            if set.is_empty() {
                return Err(InspectError::schema(format!(
                    "rectangle {}: empty index set on axis {}",
                    key, axis
                )));
            }
            let mut seen = HashSet::with_capacity(set.len());
            if let Some(dup) = set.iter().find(|&&i| !seen.insert(i)) {
                return Err(InspectError::schema(format!(
                    "rectangle {}: index {} repeated on axis {}",
                    key, dup, axis
                )));
            }
        }
        let expected = self.rows.len() * self.cols.len();
        if self.size != expected {
            return Err(InspectError::schema(format!(
                "rectangle {}: size {} but geometry spans {}x{} = {}",
                key,
                self.size,
                self.rows.len(),
                self.cols.len(),
                expected
            )));
        }
        if self.non_zero > self.size {
            return Err(InspectError::schema(format!(
                "rectangle {}: non zero {} exceeds size {}",
                key, self.non_zero, self.size
            )));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(InspectError::schema(format!(
                "rectangle {}: invalid weight {}",
                key, self.weight
            )));
        }
        Ok(())
    }
}

/// Summary written by the optimizer at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalSummary {
    #[serde(rename = "Rsize")]
    pub rsize: usize,
    pub cost: f64,
    pub dkl: f64,
    /// Number of non-zero cells of the whole matrix
    #[serde(rename = "E")]
    pub e: i64,
}

#[derive(Debug, Clone)]
pub struct Partition {
    pub rectangles: Vec<Rectangle>,
    pub summary: FinalSummary,
}

impl Partition {
    /// Rectangles must already be in key order 0..n, and `summary.rsize`
    /// must match their count.
    pub fn new(rectangles: Vec<Rectangle>, summary: FinalSummary) -> Result<Self> {
        if let Some(r) = rectangles.iter().enumerate().find(|(i, r)| r.key != *i) {
            return Err(InspectError::schema(format!(
                "rectangle at position {} has key {}",
                r.0, r.1.key
            )));
        }
        if summary.rsize != rectangles.len() {
            return Err(InspectError::schema(format!(
                "Rsize is {} but {} rectangles are listed",
                summary.rsize,
                rectangles.len()
            )));
        }
        Ok(Partition {
            rectangles,
            summary,
        })
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let raw: RawPartition = serde_json::from_str(text)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawPartition) -> Result<Self> {
        let n = raw.rectangles.len();
        let mut slots: Vec<Option<RawRectangle>> = (0..n).map(|_| None).collect();

        for (name, rect) in raw.rectangles {
            let key: usize = name.trim().parse().map_err(|_| {
                InspectError::schema(format!("rectangle key `{}` is not an integer", name))
            })?;
            let slot = slots.get_mut(key).ok_or_else(|| {
                InspectError::schema(format!(
                    "rectangle key {} out of range for {} rectangles (gap in keys)",
                    key, n
                ))
            })?;
            if slot.is_some() {
                return Err(InspectError::schema(format!("duplicate rectangle key {}", key)));
            }
            *slot = Some(rect);
        }

        // n entries, all keys distinct and < n: every slot is filled
        let rectangles = slots
            .into_iter()
            .enumerate()
            .map(|(key, slot)| -> Result<Rectangle> {
                let rect = slot.ok_or_else(|| {
                    InspectError::schema(format!("missing rectangle key {}", key))
                })?;
                rect.into_rectangle(key)
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(rectangles, raw.summary)
    }

    pub fn len(&self) -> usize {
        self.rectangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rectangles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rectangle> {
        self.rectangles.iter()
    }

    /// Rectangles holding at least one non-zero cell.
    pub fn non_empty(&self) -> impl Iterator<Item = &Rectangle> {
        self.rectangles.iter().filter(|r| !r.is_empty())
    }

    /// Sum of the recorded non-zero counts; equals `E` for an exact tiling.
    pub fn non_zero_total(&self) -> usize {
        self.rectangles.iter().map(|r| r.non_zero).sum()
    }

    pub fn total_weight(&self) -> f64 {
        self.rectangles.iter().map(|r| r.weight).sum()
    }
}

/// Read a partition JSON file.
pub fn load_partition<P: AsRef<Path>>(path: P) -> Result<Partition> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let partition = Partition::from_json_str(&text)?;
    info!(
        "loaded partition {} ({} rectangles, {} non-empty)",
        path.display(),
        partition.len(),
        partition.non_empty().count()
    );
    debug!(
        "non zero total {} vs E {}",
        partition.non_zero_total(),
        partition.summary.e
    );
    Ok(partition)
}

// ============================================================================
// On-disk layout
// ============================================================================

#[derive(Deserialize)]
struct RawPartition {
    #[serde(rename = "R", deserialize_with = "ordered_entries")]
    rectangles: Vec<(String, RawRectangle)>,
    #[serde(rename = "final")]
    summary: FinalSummary,
}

#[derive(Deserialize)]
struct RawRectangle {
    geometry: Vec<Vec<usize>>,
    size: usize,
    #[serde(rename = "non zero")]
    non_zero: usize,
    weight: f64,
    dkl: f64,
}

impl RawRectangle {
    fn into_rectangle(self, key: usize) -> Result<Rectangle> {
        let mut geometry = self.geometry.into_iter();
        let (rows, cols) = match (geometry.next(), geometry.next(), geometry.next()) {
            (Some(rows), Some(cols), None) => (rows, cols),
            _ => {
                return Err(InspectError::schema(format!(
                    "rectangle {}: geometry must hold exactly two index sets",
                    key
                )))
            }
        };
        let rect = Rectangle {
            key,
            rows,
            cols,
            size: self.size,
            non_zero: self.non_zero,
            weight: self.weight,
            dkl: self.dkl,
        };
        rect.validate()?;
        Ok(rect)
    }
}

/// Keep every map entry, including repeated keys that a `HashMap` would
/// silently collapse.
fn ordered_entries<'de, D, V>(deserializer: D) -> std::result::Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map from rectangle key to rectangle record")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, V>()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TWO_RECTS: &str = r#"{
        "R": {
            "1": {"geometry": [[1], [0, 1]], "size": 2, "non zero": 1, "weight": 4.0, "dkl": 0.0},
            "0": {"geometry": [[0], [0, 1]], "size": 2, "non zero": 1, "weight": 4.0, "dkl": 0.5}
        },
        "final": {"Rsize": 2, "cost": 3.25, "dkl": 0.5, "E": 2}
    }"#;

    #[test]
    fn test_load_orders_by_key() {
        let p = Partition::from_json_str(TWO_RECTS).unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.rectangles[0].rows, vec![0]);
        assert_eq!(p.rectangles[0].dkl, 0.5);
        assert_eq!(p.rectangles[1].geometry(), (&[1][..], &[0, 1][..]));
        assert_eq!(p.summary.rsize, 2);
        assert_eq!(p.summary.e, 2);
        assert_eq!(p.non_zero_total(), 2);
        assert_eq!(p.total_weight(), 8.0);
    }

    #[test]
    fn test_missing_non_zero_is_schema_error() {
        let text = TWO_RECTS.replace(r#""non zero": 1, "weight": 4.0, "dkl": 0.0"#, r#""weight": 4.0, "dkl": 0.0"#);
        let err = Partition::from_json_str(&text).unwrap_err();
        assert!(matches!(err, InspectError::Schema(_)), "{}", err);
        assert!(err.to_string().contains("non zero"));
    }

    #[test]
    fn test_missing_final_field() {
        let text = TWO_RECTS.replace(r#""E": 2"#, r#""F": 2"#);
        assert!(matches!(
            Partition::from_json_str(&text),
            Err(InspectError::Schema(_))
        ));
    }

    #[test]
    fn test_gap_in_keys() {
        let text = TWO_RECTS.replace(r#""1": {"#, r#""2": {"#);
        let err = Partition::from_json_str(&text).unwrap_err();
        assert!(err.to_string().contains("gap"), "{}", err);
    }

    #[test]
    fn test_duplicate_keys() {
        let text = TWO_RECTS.replace(r#""1": {"#, r#""0": {"#);
        let err = Partition::from_json_str(&text).unwrap_err();
        assert!(err.to_string().contains("duplicate"), "{}", err);

        let text = TWO_RECTS.replace(r#""1": {"#, r#""00": {"#);
        assert!(matches!(
            Partition::from_json_str(&text),
            Err(InspectError::Schema(_))
        ));
    }

    #[test]
    fn test_rsize_mismatch() {
        let text = TWO_RECTS.replace(r#""Rsize": 2"#, r#""Rsize": 3"#);
        let err = Partition::from_json_str(&text).unwrap_err();
        assert!(err.to_string().contains("Rsize"), "{}", err);
    }

    #[test]
    fn test_size_must_match_geometry() {
        let text = TWO_RECTS.replace(r#""geometry": [[1], [0, 1]], "size": 2"#, r#""geometry": [[1], [0, 1]], "size": 3"#);
        let err = Partition::from_json_str(&text).unwrap_err();
        assert!(err.to_string().contains("size 3"), "{}", err);
    }

    #[test]
    fn test_geometry_shape_checks() {
        let three_axes = TWO_RECTS.replace(r#"[[1], [0, 1]]"#, r#"[[1], [0, 1], [0]]"#);
        assert!(matches!(
            Partition::from_json_str(&three_axes),
            Err(InspectError::Schema(_))
        ));
        let repeated = TWO_RECTS.replace(r#"[[1], [0, 1]], "size": 2"#, r#"[[1], [1, 1]], "size": 2"#);
        let err = Partition::from_json_str(&repeated).unwrap_err();
        assert!(err.to_string().contains("repeated"), "{}", err);
    }

    #[test]
    fn test_malformed_json_is_format_error() {
        assert!(matches!(
            Partition::from_json_str("{\"R\": {"),
            Err(InspectError::Format(_))
        ));
    }

    #[test]
    fn test_rectangle_stats() {
        let r = Rectangle::new(0, vec![0, 1], vec![3], 1, 6.0, 0.0).unwrap();
        assert_eq!(r.size, 2);
        assert_eq!(r.density(), 0.5);
        assert_eq!(r.activity(), 3.0);
        assert!(!r.is_empty());
        assert!(Rectangle::new(0, vec![0], vec![1], 2, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_measured_rectangle() {
        let m = Matrix::parse("1 0 2\n0 0 0\n3 0 0").unwrap();
        let r = Rectangle::measured(3, vec![0, 2], vec![0, 2], &m).unwrap();
        assert_eq!(r.weight, 6.0);
        assert_eq!(r.non_zero, 3);
        assert!(Rectangle::measured(0, vec![3], vec![0], &m).is_err());
    }

    #[test]
    fn test_load_partition_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_RECTS.as_bytes()).unwrap();
        let p = load_partition(file.path()).unwrap();
        assert_eq!(p.non_empty().count(), 2);
    }
}
