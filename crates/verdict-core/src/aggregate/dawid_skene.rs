//! Dawid-Skene EM label aggregation.
//!
//! Jointly estimates per-item posterior label distributions, per-annotator
//! confusion matrices, and a global label prior from the answer table. The
//! engine runs a caller-specified number of E/M iterations with no
//! convergence detection, so output depends only on the input table and the
//! iteration count.
//!
//! The E-step works in log-space: per-item scores are sums of log-confusion
//! terms plus the log-prior, normalized with a max-subtracted softmax. This
//! is the documented underflow strategy for items with many annotators.
//! Confusion cells are floored at [`EPS`] before row normalization, which
//! turns a zero-mass (annotator, true-label) row into uniform and keeps every
//! log term finite in the following E-step.

use std::collections::BTreeMap;

use tracing::debug;

use crate::answers::AnswerTable;
use crate::error::{Error, Result};
use crate::labels::{LabelSpace, TieBreak};

use super::majority::{empirical_posteriors, most_probable_labels};
use super::result::{ConfusionMatrix, FitResult};
use super::traits::{Aggregator, SkillAware};

/// Smoothing floor for expected-count confusion cells.
const EPS: f64 = 1e-10;

/// One answer with identifiers resolved to dense indices.
struct Record {
    item: usize,
    annotator: usize,
    label: usize,
    weight: f64,
}

/// The Dawid-Skene estimator.
///
/// `n_iter = 0` is valid: the result is the initial majority-vote posteriors
/// together with the confusion matrices and prior derived from them.
#[derive(Debug, Clone)]
pub struct DawidSkene {
    n_iter: usize,
    tie: TieBreak,
    gold: Option<BTreeMap<String, String>>,
    result: Option<FitResult>,
}

impl Default for DawidSkene {
    fn default() -> Self {
        Self::new(100)
    }
}

impl DawidSkene {
    pub fn new(n_iter: usize) -> Self {
        Self {
            n_iter,
            tie: TieBreak::default(),
            gold: None,
            result: None,
        }
    }

    pub fn with_tie_break(mut self, tie: TieBreak) -> Self {
        self.tie = tie;
        self
    }

    /// Anchor the initial estimate with a partial gold label map: covered
    /// items seed one-hot. The E/M updates themselves are unchanged.
    pub fn with_gold(mut self, gold: BTreeMap<String, String>) -> Self {
        self.gold = Some(gold);
        self
    }
}

/// M-step, error half: expected-count confusion rows per annotator,
/// floored at EPS and normalized. An all-zero row comes out uniform.
fn confusion_step(
    records: &[Record],
    n_annotators: usize,
    n_labels: usize,
    posteriors: &[Vec<f64>],
) -> Vec<Vec<Vec<f64>>> {
    let mut confusion = vec![vec![vec![0.0; n_labels]; n_labels]; n_annotators];
    for record in records {
        for t in 0..n_labels {
            confusion[record.annotator][t][record.label] +=
                posteriors[record.item][t] * record.weight;
        }
    }
    for annotator in confusion.iter_mut() {
        for row in annotator.iter_mut() {
            for cell in row.iter_mut() {
                if *cell < EPS {
                    *cell = EPS;
                }
            }
            let total: f64 = row.iter().sum();
            for cell in row.iter_mut() {
                *cell /= total;
            }
        }
    }
    confusion
}

/// M-step, prior half: mean posterior per label, renormalized to absorb
/// floating-point drift.
fn prior_step(posteriors: &[Vec<f64>], n_labels: usize) -> Vec<f64> {
    let mut prior = vec![0.0; n_labels];
    for row in posteriors {
        for (t, &p) in row.iter().enumerate() {
            prior[t] += p;
        }
    }
    let total: f64 = prior.iter().sum();
    if total > 0.0 {
        for p in prior.iter_mut() {
            *p /= total;
        }
    }
    prior
}

/// E-step: log-space posterior recomputation with softmax normalization.
fn posterior_step(
    records: &[Record],
    n_items: usize,
    confusion: &[Vec<Vec<f64>>],
    prior: &[f64],
) -> Vec<Vec<f64>> {
    let log_prior: Vec<f64> = prior.iter().map(|p| p.ln()).collect();
    let mut log_scores = vec![log_prior; n_items];
    for record in records {
        for (t, score) in log_scores[record.item].iter_mut().enumerate() {
            *score += confusion[record.annotator][t][record.label].ln() * record.weight;
        }
    }
    for row in log_scores.iter_mut() {
        let max = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            continue;
        }
        let mut total = 0.0;
        for score in row.iter_mut() {
            *score = (*score - max).exp();
            total += *score;
        }
        for score in row.iter_mut() {
            *score /= total;
        }
    }
    log_scores
}

impl Aggregator for DawidSkene {
    fn name(&self) -> &'static str {
        "dawid_skene"
    }

    fn fit(&mut self, answers: &AnswerTable) -> Result<&FitResult> {
        let mut observed: Vec<&str> = answers
            .records()
            .iter()
            .map(|r| r.label.as_str())
            .collect();
        if let Some(gold) = &self.gold {
            observed.extend(gold.values().map(String::as_str));
        }
        let space = LabelSpace::discover(observed);
        let n_labels = space.len();

        let items: Vec<String> = answers.by_item().keys().map(|s| s.to_string()).collect();
        let annotators: Vec<String> = answers
            .by_annotator()
            .keys()
            .map(|s| s.to_string())
            .collect();
        let item_index: BTreeMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(idx, item)| (item.as_str(), idx))
            .collect();
        let annotator_index: BTreeMap<&str, usize> = annotators
            .iter()
            .enumerate()
            .map(|(idx, annotator)| (annotator.as_str(), idx))
            .collect();
        let records: Vec<Record> = answers
            .records()
            .iter()
            .filter_map(|r| {
                Some(Record {
                    item: item_index.get(r.item.as_str()).copied()?,
                    annotator: annotator_index.get(r.annotator.as_str()).copied()?,
                    label: space.position(&r.label)?,
                    weight: r.weight,
                })
            })
            .collect();

        let initial = empirical_posteriors(answers, &space, self.gold.as_ref());
        let mut posteriors: Vec<Vec<f64>> = items
            .iter()
            .map(|item| initial.get(item).cloned().unwrap_or_else(|| space.uniform()))
            .collect();
        let mut prior = prior_step(&posteriors, n_labels);
        let mut confusion = confusion_step(&records, annotators.len(), n_labels, &posteriors);
        debug!(
            iteration = 0,
            n_items = items.len(),
            n_annotators = annotators.len(),
            n_labels,
            "initial estimates ready"
        );

        for iteration in 1..=self.n_iter {
            posteriors = posterior_step(&records, items.len(), &confusion, &prior);
            prior = prior_step(&posteriors, n_labels);
            confusion = confusion_step(&records, annotators.len(), n_labels, &posteriors);
            debug!(iteration, "em iteration complete");
        }

        let skills: BTreeMap<String, f64> = annotators
            .iter()
            .enumerate()
            .map(|(a, annotator)| {
                let matrix = ConfusionMatrix::new(confusion[a].clone());
                (annotator.clone(), matrix.diagonal_mass(&prior))
            })
            .collect();
        let posterior_map: BTreeMap<String, Vec<f64>> = items
            .iter()
            .cloned()
            .zip(posteriors)
            .collect();
        let labels = most_probable_labels(&posterior_map, &space, self.tie);
        let confusion_map: BTreeMap<String, ConfusionMatrix> = annotators
            .iter()
            .cloned()
            .zip(confusion.into_iter().map(ConfusionMatrix::new))
            .collect();

        self.result = Some(FitResult {
            estimator: self.name(),
            label_space: space,
            posteriors: posterior_map,
            labels,
            prior: Some(prior),
            confusion: Some(confusion_map),
            skills: Some(skills),
            scores: None,
        });
        self.result.as_ref().ok_or(Error::NotFitted)
    }

    fn fitted(&self) -> Option<&FitResult> {
        self.result.as_ref()
    }

    fn as_skill_aware(&self) -> Option<&dyn SkillAware> {
        Some(self)
    }
}

impl SkillAware for DawidSkene {
    fn skills(&self) -> Result<&BTreeMap<String, f64>> {
        let result = self.result.as_ref().ok_or(Error::NotFitted)?;
        result.require_skills()
    }
}

// Missing test coverage:
// - Weighted records through a full E/M cycle (weights are exercised only in
//   the vote-counting tests).
// - Alphabets with more than two labels end-to-end.
// - Gold seeding combined with n_iter > 0.
