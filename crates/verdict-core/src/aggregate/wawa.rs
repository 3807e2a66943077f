//! Worker-agreement-with-aggregate aggregation ("Wawa").
//!
//! Two-pass scheme: a plain majority vote produces reference labels, each
//! annotator's skill is their weighted agreement with that reference, and the
//! final answer is a skill-weighted re-vote.

use std::collections::BTreeMap;

use crate::answers::AnswerTable;
use crate::error::{Error, Result};
use crate::labels::{normalize, TieBreak};

use super::gold::agreement_skills;
use super::majority::{empirical_posteriors, most_probable_labels, weighted_tally};
use super::result::FitResult;
use super::traits::{Aggregator, SkillAware};

#[derive(Debug, Clone, Default)]
pub struct Wawa {
    tie: TieBreak,
    result: Option<FitResult>,
}

impl Wawa {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tie_break(tie: TieBreak) -> Self {
        Self { tie, result: None }
    }
}

impl Aggregator for Wawa {
    fn name(&self) -> &'static str {
        "wawa"
    }

    fn fit(&mut self, answers: &AnswerTable) -> Result<&FitResult> {
        let space = answers.label_space();
        let majority = empirical_posteriors(answers, &space, None);
        let reference = most_probable_labels(&majority, &space, self.tie);
        let skills = agreement_skills(answers, &reference);

        let mut posteriors = weighted_tally(answers, &space, |annotator| {
            skills.get(annotator).copied().unwrap_or(0.0)
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

impl SkillAware for Wawa {
    fn skills(&self) -> Result<&BTreeMap<String, f64>> {
        let result = self.result.as_ref().ok_or(Error::NotFitted)?;
        result.require_skills()
    }
}
