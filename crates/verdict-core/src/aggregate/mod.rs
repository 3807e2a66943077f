//! Label aggregation engines.
//!
//! Every engine implements the same [`Aggregator`] contract:
//!
//! - **MajorityVote**: empirical vote fractions; raw tallies through
//!   `ScoreProducing`.
//! - **Wawa**: skill-weighted re-vote, skills from agreement with the
//!   majority aggregate.
//! - **GoldMajorityVote**: skill-weighted vote, skills anchored on a partial
//!   gold label map.
//! - **DawidSkene**: the EM engine jointly estimating posteriors, confusion
//!   matrices, and the label prior.
//!
//! # Example
//!
//! ```rust
//! use verdict_core::aggregate::{Aggregator, DawidSkene};
//! use verdict_core::{Answer, AnswerTable};
//!
//! let table = AnswerTable::new(vec![
//!     Answer::new("t1", "w1", "yes"),
//!     Answer::new("t1", "w2", "yes"),
//!     Answer::new("t1", "w3", "no"),
//! ]).unwrap();
//! let mut ds = DawidSkene::new(5);
//! let result = ds.fit(&table).unwrap();
//! assert_eq!(result.labels["t1"], "yes");
//! ```

pub mod dawid_skene;
pub mod gold;
pub mod majority;
pub mod result;
pub mod traits;
pub mod wawa;

pub use dawid_skene::DawidSkene;
pub use gold::GoldMajorityVote;
pub use majority::MajorityVote;
pub use result::{ConfusionMatrix, FitResult};
pub use traits::{require_skills, Aggregator, ScoreProducing, SkillAware};
pub use wawa::Wawa;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::answers::{Answer, AnswerTable};
use crate::error::{Error, Result};
use crate::labels::TieBreak;

fn default_n_iter() -> usize {
    100
}

/// Aggregation method selector for the JSON boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    #[default]
    MajorityVote,
    Wawa,
    GoldMajorityVote,
    DawidSkene,
}

/// Input for the string-boundary aggregation entry point.
#[derive(Debug, Serialize, Deserialize)]
pub struct AggregateInput {
    pub records: Vec<Answer>,
    #[serde(default)]
    pub method: Method,
    /// EM iteration count; only used by `dawid_skene`.
    #[serde(default = "default_n_iter")]
    pub n_iter: usize,
    /// Seed for randomized tie-breaking; stable alphabet order when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Partial item → true-label map for the supervised variants.
    #[serde(default)]
    pub gold: Option<BTreeMap<String, String>>,
}

/// Output of the string-boundary aggregation entry point.
#[derive(Debug, Serialize, Deserialize)]
pub struct AggregateOutput {
    pub label_space: Vec<String>,
    pub labels: BTreeMap<String, String>,
    pub posteriors: BTreeMap<String, Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prior: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<BTreeMap<String, f64>>,
}

/// Run one aggregation method over a record list.
pub fn aggregate(input: &AggregateInput) -> Result<AggregateOutput> {
    let table = AnswerTable::new(input.records.clone())?;
    let tie = match input.seed {
        Some(seed) => TieBreak::Seeded(seed),
        None => TieBreak::FirstAlphabetical,
    };
    let result = match input.method {
        Method::MajorityVote => {
            let mut aggregator = MajorityVote::with_tie_break(tie);
            aggregator.fit(&table)?.clone()
        }
        Method::Wawa => {
            let mut aggregator = Wawa::with_tie_break(tie);
            aggregator.fit(&table)?.clone()
        }
        Method::GoldMajorityVote => {
            let gold = input.gold.clone().ok_or_else(|| {
                Error::Schema("gold_majority_vote requires a gold label map".to_string())
            })?;
            let mut aggregator = GoldMajorityVote::with_gold(gold).with_tie_break(tie);
            aggregator.fit(&table)?.clone()
        }
        Method::DawidSkene => {
            let mut aggregator = DawidSkene::new(input.n_iter).with_tie_break(tie);
            if let Some(gold) = input.gold.clone() {
                aggregator = aggregator.with_gold(gold);
            }
            aggregator.fit(&table)?.clone()
        }
    };
    Ok(AggregateOutput {
        label_space: result.label_space.as_slice().to_vec(),
        labels: result.labels,
        posteriors: result.posteriors,
        prior: result.prior,
        skills: result.skills,
    })
}

/// Top-level function: aggregate answer records from JSON input, return JSON
/// output. Schema violations come back as an `error` field, never a panic.
pub fn aggregate_answers(input: &str) -> String {
    let parsed: AggregateInput = match serde_json::from_str(input) {
        Ok(value) => value,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid aggregate input: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    match aggregate(&parsed) {
        Ok(output) => match serde_json::to_string(&output) {
            Ok(json) => json,
            Err(e) => format!(r#"{{"error":"serialization failed: {}"}}"#, e),
        },
        Err(e) => format!(
            r#"{{"error":"{}"}}"#,
            e.to_string().replace('"', "\\\"")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_answers_json_roundtrip() {
        let input_json = serde_json::json!({
            "records": [
                {"item": "t1", "annotator": "w1", "label": "yes"},
                {"item": "t1", "annotator": "w2", "label": "yes"},
                {"item": "t1", "annotator": "w3", "label": "no"}
            ],
            "method": "dawid_skene",
            "n_iter": 3
        });

        let result = aggregate_answers(&input_json.to_string());
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();

        assert!(parsed["error"].is_null(), "unexpected error: {}", result);
        assert_eq!(parsed["labels"]["t1"], "yes");
        assert_eq!(parsed["label_space"][0], "no");
        assert!(parsed["skills"]["w1"].is_number());
    }

    #[test]
    fn aggregate_answers_invalid_json() {
        let result = aggregate_answers("not json");
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert!(parsed["error"]
            .as_str()
            .unwrap()
            .contains("invalid aggregate input"));
    }

    #[test]
    fn gold_method_without_gold_is_a_schema_error() {
        let input_json = serde_json::json!({
            "records": [{"item": "t1", "annotator": "w1", "label": "yes"}],
            "method": "gold_majority_vote"
        });
        let result = aggregate_answers(&input_json.to_string());
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert!(parsed["error"].as_str().unwrap().contains("gold"));
    }

    #[test]
    fn default_method_is_majority_vote() {
        let input_json = serde_json::json!({
            "records": [
                {"item": "t1", "annotator": "w1", "label": "no"},
                {"item": "t1", "annotator": "w2", "label": "no"}
            ]
        });
        let result = aggregate_answers(&input_json.to_string());
        let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
        assert_eq!(parsed["labels"]["t1"], "no");
        assert!(parsed["skills"].is_null());
    }
}
