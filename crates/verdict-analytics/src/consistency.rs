//! Consistency: posterior probability of the aggregated label given annotator
//! skills, under a per-record Bayes model.
//!
//! Each record contributes `skill` to its own label and spreads the rest
//! evenly; the per-item product of record contributions, normalized across
//! labels, is the posterior the aggregated label is scored against.

use std::collections::BTreeMap;

use verdict_core::aggregate::FitResult;
use verdict_core::error::{Error, Result};
use verdict_core::AnswerTable;

use crate::skills::label_probability;

fn resolve_skills<'a>(
    fit: &'a FitResult,
    skills: Option<&'a BTreeMap<String, f64>>,
) -> Result<&'a BTreeMap<String, f64>> {
    match skills {
        Some(map) => Ok(map),
        None => fit.require_skills(),
    }
}

/// Per-item consistency of the aggregated labels.
///
/// Skills come from the explicit override, or from the fit's skill capability;
/// with neither available this is a capability error naming the estimator.
pub fn consistency_by_item(
    answers: &AnswerTable,
    fit: &FitResult,
    skills: Option<&BTreeMap<String, f64>>,
) -> Result<BTreeMap<String, f64>> {
    let skills = resolve_skills(fit, skills)?;
    let space = &fit.label_space;
    let n_labels = space.len();

    let mut consistencies = BTreeMap::new();
    for (item, records) in answers.by_item() {
        let Some(aggregated) = fit.labels.get(item) else {
            continue;
        };
        let Some(aggregated_position) = space.position(aggregated) else {
            continue;
        };

        let mut mass = vec![1.0; n_labels];
        for record in &records {
            let Some(&skill) = skills.get(&record.annotator) else {
                return Err(Error::Degenerate(format!(
                    "no skill provided for annotator {}; provide skills explicitly",
                    record.annotator
                )));
            };
            let own = space.position(&record.label);
            for (position, cell) in mass.iter_mut().enumerate() {
                *cell *= label_probability(skill, own == Some(position), n_labels);
            }
        }

        let denominator: f64 = mass.iter().sum();
        let value = if denominator > 0.0 {
            mass[aggregated_position] / denominator
        } else {
            0.0
        };
        consistencies.insert(item.to_string(), value);
    }
    Ok(consistencies)
}

/// Mean consistency over all aggregated items.
pub fn consistency(
    answers: &AnswerTable,
    fit: &FitResult,
    skills: Option<&BTreeMap<String, f64>>,
) -> Result<f64> {
    let by_item = consistency_by_item(answers, fit, skills)?;
    if by_item.is_empty() {
        return Err(Error::Degenerate(
            "consistency is undefined without aggregated items".to_string(),
        ));
    }
    Ok(by_item.values().sum::<f64>() / by_item.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::aggregate::{Aggregator, MajorityVote, Wawa};
    use verdict_core::Answer;

    fn table() -> AnswerTable {
        AnswerTable::new(vec![
            Answer::new("X", "A", "yes"),
            Answer::new("X", "B", "yes"),
            Answer::new("Y", "A", "no"),
            Answer::new("Y", "B", "yes"),
        ])
        .unwrap()
    }

    #[test]
    fn matches_the_bayes_posterior_by_hand() {
        let answers = table();
        let mut mv = MajorityVote::new();
        let fit = mv.fit(&answers).unwrap().clone();
        let skills = BTreeMap::from([("A".to_string(), 0.8), ("B".to_string(), 0.6)]);

        let by_item = consistency_by_item(&answers, &fit, Some(&skills)).unwrap();
        // X: P(yes) = 0.8 * 0.6, P(no) = 0.2 * 0.4 -> consistency 0.48 / 0.56
        assert!((by_item["X"] - 0.48 / 0.56).abs() < 1e-12);
    }

    #[test]
    fn skill_less_aggregator_is_a_capability_error() {
        let answers = table();
        let mut mv = MajorityVote::new();
        let fit = mv.fit(&answers).unwrap().clone();
        let err = consistency(&answers, &fit, None).unwrap_err();
        assert!(err.to_string().contains("majority_vote"));
        assert!(err.to_string().contains("skills"));
    }

    #[test]
    fn skill_aware_aggregator_needs_no_override() {
        let answers = table();
        let mut wawa = Wawa::new();
        let fit = wawa.fit(&answers).unwrap().clone();
        let mean = consistency(&answers, &fit, None).unwrap();
        assert!((0.0..=1.0).contains(&mean));
    }

    #[test]
    fn incomplete_override_names_the_annotator() {
        let answers = table();
        let mut mv = MajorityVote::new();
        let fit = mv.fit(&answers).unwrap().clone();
        let skills = BTreeMap::from([("A".to_string(), 0.8)]);
        let err = consistency(&answers, &fit, Some(&skills)).unwrap_err();
        assert!(err.to_string().contains('B'));
    }
}
