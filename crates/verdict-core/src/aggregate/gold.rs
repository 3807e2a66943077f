//! Gold-supervised majority vote.
//!
//! A partial item → true-label map anchors annotator quality: skills are the
//! weighted fraction of each annotator's answers that match the gold label,
//! and prediction is a skill-weighted vote over the full table.

use std::collections::BTreeMap;

use crate::answers::AnswerTable;
use crate::error::{Error, Result};
use crate::labels::{normalize, TieBreak};

use super::majority::{most_probable_labels, weighted_tally};
use super::result::FitResult;
use super::traits::{Aggregator, SkillAware};

/// Weighted fraction of each annotator's answers matching the reference
/// labels. Records on items absent from the reference are ignored; annotators
/// with no covered records get no entry.
pub(crate) fn agreement_skills(
    answers: &AnswerTable,
    reference: &BTreeMap<String, String>,
) -> BTreeMap<String, f64> {
    let mut matched: BTreeMap<&str, f64> = BTreeMap::new();
    let mut total: BTreeMap<&str, f64> = BTreeMap::new();
    for record in answers.records() {
        let Some(reference_label) = reference.get(&record.item) else {
            continue;
        };
        *total.entry(record.annotator.as_str()).or_default() += record.weight;
        if *reference_label == record.label {
            *matched.entry(record.annotator.as_str()).or_default() += record.weight;
        }
    }
    total
        .into_iter()
        .filter(|(_, weight)| *weight > 0.0)
        .map(|(annotator, weight)| {
            let hits = matched.get(annotator).copied().unwrap_or(0.0);
            (annotator.to_string(), hits / weight)
        })
        .collect()
}

/// Majority vote supervised by a partial gold label map.
#[derive(Debug, Clone)]
pub struct GoldMajorityVote {
    gold: BTreeMap<String, String>,
    tie: TieBreak,
    result: Option<FitResult>,
}

impl GoldMajorityVote {
    pub fn with_gold(gold: BTreeMap<String, String>) -> Self {
        Self {
            gold,
            tie: TieBreak::default(),
            result: None,
        }
    }

    pub fn with_tie_break(mut self, tie: TieBreak) -> Self {
        self.tie = tie;
        self
    }
}

impl Aggregator for GoldMajorityVote {
    fn name(&self) -> &'static str {
        "gold_majority_vote"
    }

    fn fit(&mut self, answers: &AnswerTable) -> Result<&FitResult> {
        if self.gold.is_empty() {
            return Err(Error::Schema("gold label map is empty".to_string()));
        }
        let skills = agreement_skills(answers, &self.gold);
        if skills.is_empty() && !answers.is_empty() {
            return Err(Error::Schema(
                "gold label map does not cover any answered item".to_string(),
            ));
        }

        // Annotators the gold map never saw vote with the mean observed skill.
        let fallback = if skills.is_empty() {
            0.0
        } else {
            skills.values().sum::<f64>() / skills.len() as f64
        };

        let space = answers.label_space();
        let mut posteriors = weighted_tally(answers, &space, |annotator| {
            skills.get(annotator).copied().unwrap_or(fallback)
        });
        for row in posteriors.values_mut() {
            normalize(row);
        }
        let labels = most_probable_labels(&posteriors, &space, self.tie);
        self.result = Some(FitResult {
            estimator: self.name(),
            label_space: space,
            posteriors,
            labels,
            prior: None,
            confusion: None,
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

impl SkillAware for GoldMajorityVote {
    fn skills(&self) -> Result<&BTreeMap<String, f64>> {
        let result = self.result.as_ref().ok_or(Error::NotFitted)?;
        result.require_skills()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answers::Answer;
    use pretty_assertions::assert_eq;

    fn table() -> AnswerTable {
        AnswerTable::new(vec![
            Answer::new("t1", "w1", "no"),
            Answer::new("t1", "w2", "yes"),
            Answer::new("t1", "w5", "no"),
            Answer::new("t2", "w1", "yes"),
            Answer::new("t2", "w2", "yes"),
            Answer::new("t2", "w3", "yes"),
            Answer::new("t2", "w5", "no"),
            Answer::new("t3", "w4", "yes"),
        ])
        .unwrap()
    }

    fn gold() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("t1".to_string(), "no".to_string()),
            ("t2".to_string(), "yes".to_string()),
        ])
    }

    #[test]
    fn skills_are_accuracy_on_gold() {
        let skills = agreement_skills(&table(), &gold());
        assert_eq!(skills["w1"], 1.0);
        assert_eq!(skills["w2"], 0.5);
        assert_eq!(skills["w3"], 1.0);
        assert_eq!(skills["w5"], 0.5);
        // w4 answered no gold-covered item
        assert!(!skills.contains_key("w4"));
    }

    #[test]
    fn prediction_weights_votes_by_skill() {
        let mut gmv = GoldMajorityVote::with_gold(gold());
        let result = gmv.fit(&table()).unwrap();
        // t1: no mass 1.0 + 0.5, yes mass 0.5
        assert_eq!(result.labels["t1"], "no");
        assert!((result.proba("t1", "no") - 0.75).abs() < 1e-12);
        // w4 votes with the mean skill of the others
        assert_eq!(result.labels["t3"], "yes");
        assert!((result.proba("t3", "yes") - 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_gold_is_rejected() {
        let mut gmv = GoldMajorityVote::with_gold(BTreeMap::new());
        assert!(gmv.fit(&table()).is_err());
    }

    #[test]
    fn uncovered_gold_is_rejected() {
        let mut gmv =
            GoldMajorityVote::with_gold(BTreeMap::from([("t9".to_string(), "no".to_string())]));
        assert!(gmv.fit(&table()).is_err());
    }
}
