//! Aggregator trait definitions.
//!
//! Every aggregator implements the same fit/predict contract so analytics
//! consumers can treat them uniformly. Optional capabilities (annotator
//! skills, raw scores) are separate traits reached through explicit `as_*`
//! queries; a variant that lacks a capability returns `None` and callers
//! surface a descriptive error instead of assuming the attribute exists.

use std::collections::BTreeMap;

use crate::answers::AnswerTable;
use crate::error::{Error, Result};

use super::result::FitResult;

/// Core aggregation contract.
///
/// `fit` estimates from scratch and freezes a [`FitResult`]; `predict` and
/// `predict_proba` after `fit` return the stored result without
/// re-estimation. Called on an unfitted aggregator, they fit first.
pub trait Aggregator {
    /// Short name used in capability errors.
    fn name(&self) -> &'static str;

    /// Estimate from the answer table, replacing any previous result.
    fn fit(&mut self, answers: &AnswerTable) -> Result<&FitResult>;

    /// The stored result of the last `fit`, if any.
    fn fitted(&self) -> Option<&FitResult>;

    /// Aggregated labels for the fitted table.
    fn predict(&mut self, answers: &AnswerTable) -> Result<&BTreeMap<String, String>> {
        if self.fitted().is_none() {
            self.fit(answers)?;
        }
        let result = self.fitted().ok_or(Error::NotFitted)?;
        Ok(&result.labels)
    }

    /// Posterior label distributions for the fitted table.
    fn predict_proba(&mut self, answers: &AnswerTable) -> Result<&BTreeMap<String, Vec<f64>>> {
        if self.fitted().is_none() {
            self.fit(answers)?;
        }
        let result = self.fitted().ok_or(Error::NotFitted)?;
        Ok(&result.posteriors)
    }

    /// Capability query: per-annotator skill scores.
    fn as_skill_aware(&self) -> Option<&dyn SkillAware> {
        None
    }

    /// Capability query: raw unnormalized label scores.
    fn as_score_producing(&self) -> Option<&dyn ScoreProducing> {
        None
    }
}

/// Aggregators that estimate per-annotator quality.
pub trait SkillAware {
    /// Skill scores from the last `fit`.
    fn skills(&self) -> Result<&BTreeMap<String, f64>>;
}

/// Aggregators that expose raw scores instead of (or besides) probabilities.
pub trait ScoreProducing {
    /// Raw per-item label scores from the last `fit`.
    fn scores(&self) -> Result<&BTreeMap<String, Vec<f64>>>;
}

/// Skills from an aggregator's capability, with a descriptive error when the
/// variant has none.
pub fn require_skills(aggregator: &dyn Aggregator) -> Result<&BTreeMap<String, f64>> {
    match aggregator.as_skill_aware() {
        Some(skill_aware) => skill_aware.skills(),
        None => Err(Error::missing_capability(
            aggregator.name(),
            "skills",
            "provide annotator skills explicitly",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::majority::MajorityVote;
    use crate::aggregate::wawa::Wawa;
    use crate::answers::Answer;

    fn table() -> AnswerTable {
        AnswerTable::new(vec![
            Answer::new("t1", "w1", "yes"),
            Answer::new("t1", "w2", "yes"),
            Answer::new("t2", "w1", "no"),
            Answer::new("t2", "w2", "no"),
        ])
        .unwrap()
    }

    #[test]
    fn majority_vote_has_no_skill_capability() {
        let mut mv = MajorityVote::new();
        mv.fit(&table()).unwrap();
        let err = require_skills(&mv).unwrap_err();
        assert!(err.to_string().contains("majority_vote"));
        assert!(mv.as_score_producing().is_some());
    }

    #[test]
    fn wawa_exposes_skills_through_the_capability() {
        let mut wawa = Wawa::new();
        wawa.fit(&table()).unwrap();
        let skills = require_skills(&wawa).unwrap();
        assert_eq!(skills.len(), 2);
        assert!((skills["w1"] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn predict_on_unfitted_aggregator_fits_first() {
        let mut mv = MajorityVote::new();
        let labels = mv.predict(&table()).unwrap();
        assert_eq!(labels["t1"], "yes");
        assert_eq!(labels["t2"], "no");
    }
}
