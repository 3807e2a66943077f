//! Post-hoc crowd metrics over verdict aggregation results.
//!
//! Every calculator reads only the published aggregation surface: the answer
//! table and the immutable [`FitResult`](verdict_core::aggregate::FitResult)
//! a fit produced. Aggregators that estimate no annotator skills surface a
//! capability error; callers can always pass skills explicitly instead.
//!
//! - **agreement**: Krippendorff's alpha inter-annotator agreement.
//! - **uncertainty**: entropy of skill-weighted label mass, by item or by
//!   annotator.
//! - **consistency**: posterior probability of the aggregated label under a
//!   per-record skill model.
//! - **accuracy**: fraction of answers matching the aggregate.
//!
//! # Example
//!
//! ```rust
//! use verdict_analytics::{accuracy_on_aggregates, alpha_krippendorff};
//! use verdict_core::aggregate::{Aggregator, MajorityVote};
//! use verdict_core::{Answer, AnswerTable};
//!
//! let table = AnswerTable::new(vec![
//!     Answer::new("t1", "w1", "yes"),
//!     Answer::new("t1", "w2", "yes"),
//!     Answer::new("t2", "w1", "no"),
//!     Answer::new("t2", "w2", "no"),
//! ]).unwrap();
//!
//! assert!((alpha_krippendorff(&table).unwrap() - 1.0).abs() < 1e-12);
//!
//! let mut vote = MajorityVote::new();
//! let fit = vote.fit(&table).unwrap().clone();
//! assert_eq!(accuracy_on_aggregates(&table, &fit.labels).unwrap(), 1.0);
//! ```

pub mod accuracy;
pub mod agreement;
pub mod consistency;
mod skills;
pub mod uncertainty;

pub use accuracy::{accuracy_by_annotator, accuracy_on_aggregates};
pub use agreement::{alpha_krippendorff, alpha_krippendorff_with, binary_distance};
pub use consistency::{consistency, consistency_by_item};
pub use uncertainty::{uncertainty, uncertainty_by_annotator, uncertainty_by_item};
