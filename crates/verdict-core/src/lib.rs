//! Verdict Core Engine
//!
//! This crate aggregates redundant, noisy categorical judgments from many
//! independent annotators into a best estimate of each item's true label,
//! together with a quality estimate for each annotator. The centerpiece is
//! the Dawid-Skene EM estimator; majority-vote style baselines share the same
//! aggregator contract so downstream consumers can treat them uniformly.
//!
//! # Example
//!
//! ```rust
//! use verdict_core::aggregate::{Aggregator, DawidSkene, MajorityVote};
//! use verdict_core::{Answer, AnswerTable};
//!
//! let table = AnswerTable::new(vec![
//!     Answer::new("t1", "w1", "yes"),
//!     Answer::new("t1", "w2", "yes"),
//!     Answer::new("t1", "w3", "no"),
//!     Answer::new("t2", "w1", "no"),
//!     Answer::new("t2", "w3", "no"),
//! ]).unwrap();
//!
//! // Quick baseline
//! let mut vote = MajorityVote::new();
//! assert_eq!(vote.predict(&table).unwrap()["t2"], "no");
//!
//! // The EM engine also estimates confusion matrices and a label prior
//! let mut ds = DawidSkene::new(10);
//! let result = ds.fit(&table).unwrap();
//! assert_eq!(result.labels["t1"], "yes");
//! assert!(result.prior.is_some());
//! ```

pub mod aggregate;
pub mod answers;
pub mod error;
pub mod labels;
pub mod trace;

// Re-export main types at crate root
pub use aggregate::{
    aggregate, aggregate_answers, AggregateInput, AggregateOutput, Aggregator, ConfusionMatrix,
    DawidSkene, FitResult, GoldMajorityVote, MajorityVote, Method, ScoreProducing, SkillAware,
    Wawa,
};
pub use answers::{Answer, AnswerTable};
pub use error::{Error, Result};
pub use labels::{LabelSpace, TieBreak};
