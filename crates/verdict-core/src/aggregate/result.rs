//! Immutable aggregation results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::labels::LabelSpace;

/// Per-annotator error matrix.
///
/// Rows are true labels, columns observed labels, both indexed by alphabet
/// position. Every row sums to 1; zero-mass rows were smoothed to uniform
/// during estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    rows: Vec<Vec<f64>>,
}

impl ConfusionMatrix {
    pub fn new(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    /// Observed-label distribution given a true label.
    pub fn row(&self, true_label: usize) -> Option<&[f64]> {
        self.rows.get(true_label).map(Vec::as_slice)
    }

    /// P(observed | true) for a pair of alphabet positions.
    pub fn get(&self, true_label: usize, observed: usize) -> f64 {
        self.rows
            .get(true_label)
            .and_then(|row| row.get(observed))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Prior-weighted diagonal mass: the probability this annotator reports
    /// the true label, under the given label prior.
    pub fn diagonal_mass(&self, prior: &[f64]) -> f64 {
        self.rows
            .iter()
            .enumerate()
            .map(|(t, row)| prior.get(t).copied().unwrap_or(0.0) * row.get(t).copied().unwrap_or(0.0))
            .sum()
    }
}

/// The frozen output of a `fit` call.
///
/// Analytics consumers receive this by reference and never mutate it. Fields
/// an aggregator variant does not estimate stay `None`; the corresponding
/// accessors surface a capability error naming the producing estimator.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    /// Name of the estimator that produced this result.
    pub estimator: &'static str,
    /// The sorted label alphabet all matrices are indexed by.
    pub label_space: LabelSpace,
    /// Per-item posterior label distributions; each row sums to 1.
    pub posteriors: BTreeMap<String, Vec<f64>>,
    /// Per-item argmax labels.
    pub labels: BTreeMap<String, String>,
    /// Global label prior, summing to 1.
    pub prior: Option<Vec<f64>>,
    /// Per-annotator confusion matrices.
    pub confusion: Option<BTreeMap<String, ConfusionMatrix>>,
    /// Per-annotator quality scores.
    pub skills: Option<BTreeMap<String, f64>>,
    /// Raw, unnormalized per-item label scores.
    pub scores: Option<BTreeMap<String, Vec<f64>>>,
}

impl FitResult {
    /// Posterior probability of a label for an item; 0.0 when either is unknown.
    pub fn proba(&self, item: &str, label: &str) -> f64 {
        let Some(position) = self.label_space.position(label) else {
            return 0.0;
        };
        self.posteriors
            .get(item)
            .and_then(|row| row.get(position))
            .copied()
            .unwrap_or(0.0)
    }

    /// Skills, or a capability error instructing the caller to supply them.
    pub fn require_skills(&self) -> Result<&BTreeMap<String, f64>> {
        self.skills.as_ref().ok_or_else(|| {
            Error::missing_capability(
                self.estimator,
                "skills",
                "provide annotator skills explicitly",
            )
        })
    }

    /// Confusion matrices, or a capability error.
    pub fn require_confusion(&self) -> Result<&BTreeMap<String, ConfusionMatrix>> {
        self.confusion.as_ref().ok_or_else(|| {
            Error::missing_capability(
                self.estimator,
                "confusion matrices",
                "use an estimator that models annotator errors",
            )
        })
    }
}
