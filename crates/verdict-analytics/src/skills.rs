//! Shared skill resolution for the metric calculators.

use std::collections::BTreeMap;

use verdict_core::error::{Error, Result};
use verdict_core::AnswerTable;

/// Probability a record assigns to a candidate label under the skill model:
/// `skill` on the record's own label, the remainder spread over the rest.
pub(crate) fn label_probability(skill: f64, matches: bool, n_labels: usize) -> f64 {
    if matches {
        skill
    } else {
        (1.0 - skill) / n_labels.saturating_sub(1).max(1) as f64
    }
}

/// Per-record skill values. With an explicit map every answering annotator
/// must be covered; without one everybody counts at full weight.
pub(crate) fn resolve_record_skills(
    answers: &AnswerTable,
    skills: Option<&BTreeMap<String, f64>>,
) -> Result<Vec<f64>> {
    let Some(map) = skills else {
        return Ok(vec![1.0; answers.len()]);
    };
    let mut resolved = Vec::with_capacity(answers.len());
    let mut missing: Vec<&str> = Vec::new();
    for record in answers.records() {
        match map.get(&record.annotator) {
            Some(&skill) => resolved.push(skill),
            None => {
                if !missing.contains(&record.annotator.as_str()) {
                    missing.push(&record.annotator);
                }
            }
        }
    }
    if !missing.is_empty() {
        return Err(Error::Degenerate(format!(
            "no skill provided for annotators: {}; provide skills for every annotator",
            missing.join(", ")
        )));
    }
    Ok(resolved)
}
