//! Majority-vote aggregation.
//!
//! The empirical vote fractions computed here double as the initial estimate
//! for the EM engine, and the weighted tally is the common kernel behind the
//! skill-weighted variants.

use std::collections::BTreeMap;

use crate::answers::AnswerTable;
use crate::error::{Error, Result};
use crate::labels::{normalize, LabelSpace, TieBreak};

use super::result::FitResult;
use super::traits::{Aggregator, ScoreProducing};

/// Raw per-item label tallies. Each record contributes its own weight scaled
/// by the annotator weight supplied by the caller.
pub(crate) fn weighted_tally(
    answers: &AnswerTable,
    space: &LabelSpace,
    annotator_weight: impl Fn(&str) -> f64,
) -> BTreeMap<String, Vec<f64>> {
    let mut tallies: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for record in answers.records() {
        let Some(position) = space.position(&record.label) else {
            continue;
        };
        let row = tallies
            .entry(record.item.clone())
            .or_insert_with(|| space.zero_row());
        row[position] += record.weight * annotator_weight(&record.annotator);
    }
    tallies
}

/// Per-item empirical label fractions, the initial posterior estimate.
///
/// Items covered by the optional gold map get a one-hot row regardless of
/// votes; everything else is plain (weighted) vote counting. Single-annotator
/// items come out one-hot by construction.
pub(crate) fn empirical_posteriors(
    answers: &AnswerTable,
    space: &LabelSpace,
    gold: Option<&BTreeMap<String, String>>,
) -> BTreeMap<String, Vec<f64>> {
    let mut posteriors = weighted_tally(answers, space, |_| 1.0);
    for (item, row) in posteriors.iter_mut() {
        let anchored = gold
            .and_then(|map| map.get(item))
            .and_then(|label| space.position(label));
        match anchored {
            Some(position) => {
                row.iter_mut().for_each(|value| *value = 0.0);
                row[position] = 1.0;
            }
            None => normalize(row),
        }
    }
    posteriors
}

/// Argmax labels for a posterior matrix under the given tie policy.
pub(crate) fn most_probable_labels(
    posteriors: &BTreeMap<String, Vec<f64>>,
    space: &LabelSpace,
    tie: TieBreak,
) -> BTreeMap<String, String> {
    let mut breaker = tie.breaker();
    posteriors
        .iter()
        .filter_map(|(item, row)| {
            let position = breaker.argmax(row)?;
            let label = space.label(position)?;
            Some((item.clone(), label.to_string()))
        })
        .collect()
}

/// Plain majority vote: per-item empirical label fractions.
///
/// Exposes raw weighted tallies through the `ScoreProducing` capability but
/// estimates no annotator skills.
#[derive(Debug, Clone, Default)]
pub struct MajorityVote {
    tie: TieBreak,
    result: Option<FitResult>,
}

impl MajorityVote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tie_break(tie: TieBreak) -> Self {
        Self { tie, result: None }
    }
}

impl Aggregator for MajorityVote {
    fn name(&self) -> &'static str {
        "majority_vote"
    }

    fn fit(&mut self, answers: &AnswerTable) -> Result<&FitResult> {
        let space = answers.label_space();
        let scores = weighted_tally(answers, &space, |_| 1.0);
        let posteriors = empirical_posteriors(answers, &space, None);
        let labels = most_probable_labels(&posteriors, &space, self.tie);
        self.result = Some(FitResult {
            estimator: self.name(),
            label_space: space,
            posteriors,
            labels,
            prior: None,
            confusion: None,
            skills: None,
            scores: Some(scores),
        });
        self.result.as_ref().ok_or(Error::NotFitted)
    }

    fn fitted(&self) -> Option<&FitResult> {
        self.result.as_ref()
    }

    fn as_score_producing(&self) -> Option<&dyn ScoreProducing> {
        Some(self)
    }
}

impl ScoreProducing for MajorityVote {
    fn scores(&self) -> Result<&BTreeMap<String, Vec<f64>>> {
        let result = self.result.as_ref().ok_or(Error::NotFitted)?;
        result.scores.as_ref().ok_or(Error::NotFitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::Answer;
    use pretty_assertions::assert_eq;

    fn table() -> AnswerTable {
        AnswerTable::new(vec![
            Answer::new("t1", "w1", "yes"),
            Answer::new("t1", "w2", "yes"),
            Answer::new("t1", "w3", "no"),
            Answer::new("t2", "w1", "no"),
        ])
        .unwrap()
    }

    #[test]
    fn vote_fractions_sum_to_one() {
        let mut mv = MajorityVote::new();
        let result = mv.fit(&table()).unwrap();
        let t1 = &result.posteriors["t1"];
        assert!((t1.iter().sum::<f64>() - 1.0).abs() < 1e-6);
        assert!((result.proba("t1", "yes") - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(result.labels["t1"], "yes");
    }

    #[test]
    fn single_annotator_item_is_one_hot() {
        let mut mv = MajorityVote::new();
        let result = mv.fit(&table()).unwrap();
        assert_eq!(result.posteriors["t2"], vec![1.0, 0.0]);
        assert_eq!(result.labels["t2"], "no");
    }

    #[test]
    fn record_weights_scale_votes() {
        let table = AnswerTable::new(vec![
            Answer::weighted("t1", "w1", "yes", 1.0),
            Answer::weighted("t1", "w2", "no", 3.0),
        ])
        .unwrap();
        let mut mv = MajorityVote::new();
        let result = mv.fit(&table).unwrap();
        assert_eq!(result.labels["t1"], "no");
        assert!((result.proba("t1", "no") - 0.75).abs() < 1e-12);
    }

    #[test]
    fn scores_are_raw_tallies() {
        let mut mv = MajorityVote::new();
        mv.fit(&table()).unwrap();
        let scores = mv.scores().unwrap();
        assert_eq!(scores["t1"], vec![1.0, 2.0]);
    }

    #[test]
    fn gold_anchors_override_votes() {
        let table = table();
        let space = table.label_space();
        let gold = BTreeMap::from([("t1".to_string(), "no".to_string())]);
        let posteriors = empirical_posteriors(&table, &space, Some(&gold));
        assert_eq!(posteriors["t1"], vec![1.0, 0.0]);
        assert_eq!(posteriors["t2"], vec![1.0, 0.0]);
    }

    #[test]
    fn empty_table_yields_empty_result() {
        let table = AnswerTable::new(Vec::new()).unwrap();
        let mut mv = MajorityVote::new();
        let result = mv.fit(&table).unwrap();
        assert!(result.posteriors.is_empty());
        assert!(result.labels.is_empty());
    }
}
