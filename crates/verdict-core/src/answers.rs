//! The flat answer table: (item, annotator, label) records.
//!
//! Answers are stored compactly as one record per judgment. Aggregators
//! reason about per-item groups and per-annotator groups; this module bridges
//! the two representations and owns schema validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::labels::LabelSpace;

fn default_weight() -> f64 {
    1.0
}

/// A single annotator judgment about one item.
/// Mirrors the JSON shape accepted at the string boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub item: String,
    pub annotator: String,
    pub label: String,
    /// Record weight; 1.0 when absent.
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl Answer {
    /// Unit-weight record.
    pub fn new(item: &str, annotator: &str, label: &str) -> Self {
        Self {
            item: item.to_string(),
            annotator: annotator.to_string(),
            label: label.to_string(),
            weight: 1.0,
        }
    }

    /// Record with an explicit weight.
    pub fn weighted(item: &str, annotator: &str, label: &str, weight: f64) -> Self {
        Self {
            weight,
            ..Self::new(item, annotator, label)
        }
    }
}

/// A validated table of answers.
///
/// Construction checks the schema once; aggregators can then assume every
/// record carries non-empty identifiers and a finite, non-negative weight.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct AnswerTable {
    records: Vec<Answer>,
}

impl AnswerTable {
    /// Validate records into a table.
    pub fn new(records: Vec<Answer>) -> Result<Self> {
        for (pos, record) in records.iter().enumerate() {
            if record.item.is_empty() {
                return Err(Error::Schema(format!("record {pos}: empty item identifier")));
            }
            if record.annotator.is_empty() {
                return Err(Error::Schema(format!(
                    "record {pos}: empty annotator identifier"
                )));
            }
            if record.label.is_empty() {
                return Err(Error::Schema(format!("record {pos}: empty label")));
            }
            if !record.weight.is_finite() || record.weight < 0.0 {
                return Err(Error::Schema(format!(
                    "record {pos}: weight {} is not a finite non-negative number",
                    record.weight
                )));
            }
        }
        Ok(Self { records })
    }

    /// Parse and validate a JSON array of answer records.
    pub fn from_json(input: &str) -> Result<Self> {
        let records: Vec<Answer> = serde_json::from_str(input)?;
        Self::new(records)
    }

    pub fn records(&self) -> &[Answer] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The sorted label alphabet observed in this table.
    pub fn label_space(&self) -> LabelSpace {
        LabelSpace::discover(self.records.iter().map(|r| r.label.as_str()))
    }

    /// Records grouped by item, in sorted item order.
    pub fn by_item(&self) -> BTreeMap<&str, Vec<&Answer>> {
        let mut groups: BTreeMap<&str, Vec<&Answer>> = BTreeMap::new();
        for record in &self.records {
            groups.entry(record.item.as_str()).or_default().push(record);
        }
        groups
    }

    /// Records grouped by annotator, in sorted annotator order.
    pub fn by_annotator(&self) -> BTreeMap<&str, Vec<&Answer>> {
        let mut groups: BTreeMap<&str, Vec<&Answer>> = BTreeMap::new();
        for record in &self.records {
            groups
                .entry(record.annotator.as_str())
                .or_default()
                .push(record);
        }
        groups
    }
}
