//! Inter-annotator agreement (Krippendorff's alpha).
//!
//! The amount annotators agreed on label assignments beyond what is expected
//! by chance. Interpretation guideline: alpha >= 0.8 indicates a reliable
//! annotation, alpha >= 0.667 allows tentative conclusions only, lower values
//! suggest the annotation is unreliable.

use std::collections::BTreeMap;

use verdict_core::error::{Error, Result};
use verdict_core::AnswerTable;

/// 0.0 for equal labels, 1.0 otherwise.
pub fn binary_distance(a: &str, b: &str) -> f64 {
    if a == b {
        0.0
    } else {
        1.0
    }
}

/// Mean pairwise distance within a bag of label counts:
/// `sum n_j n_l d(j, l) / (n (n - 1))`.
fn disagreement(counts: &BTreeMap<&str, f64>, distance: &impl Fn(&str, &str) -> f64) -> f64 {
    let total: f64 = counts.values().sum();
    if total < 2.0 {
        return 0.0;
    }
    let mut pairs = 0.0;
    for (&left, n_left) in counts {
        for (&right, n_right) in counts {
            pairs += n_left * n_right * distance(left, right);
        }
    }
    pairs / (total * (total - 1.0))
}

/// Krippendorff's alpha with the binary distance.
///
/// ```rust
/// use verdict_analytics::alpha_krippendorff;
/// use verdict_core::{Answer, AnswerTable};
///
/// let table = AnswerTable::new(vec![
///     Answer::new("X", "A", "yes"),
///     Answer::new("X", "B", "yes"),
///     Answer::new("Y", "A", "no"),
///     Answer::new("Y", "B", "no"),
/// ]).unwrap();
/// assert!((alpha_krippendorff(&table).unwrap() - 1.0).abs() < 1e-12);
/// ```
pub fn alpha_krippendorff(answers: &AnswerTable) -> Result<f64> {
    alpha_krippendorff_with(answers, binary_distance)
}

/// Krippendorff's alpha with a caller-supplied distance metric returning a
/// value between 0.0 and 1.0.
pub fn alpha_krippendorff_with(
    answers: &AnswerTable,
    distance: impl Fn(&str, &str) -> f64,
) -> Result<f64> {
    let space = answers.label_space();
    if space.is_empty() {
        return Err(Error::Degenerate(
            "alpha is undefined for an empty answer table".to_string(),
        ));
    }
    if space.len() == 1 {
        return Ok(1.0);
    }

    // Items with a single record carry no pairable information.
    let mut observed = 0.0;
    let mut total_records = 0.0;
    let mut pooled: BTreeMap<&str, f64> = BTreeMap::new();
    for (_, records) in answers.by_item() {
        if records.len() < 2 {
            continue;
        }
        let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
        for record in &records {
            *counts.entry(record.label.as_str()).or_default() += 1.0;
        }
        let item_records = records.len() as f64;
        observed += disagreement(&counts, &distance) * item_records;
        total_records += item_records;
        for (label, count) in counts {
            *pooled.entry(label).or_default() += count;
        }
    }

    if total_records == 0.0 {
        return Err(Error::Degenerate(
            "alpha requires at least one item with two annotations".to_string(),
        ));
    }

    let expected = disagreement(&pooled, &distance);
    if expected == 0.0 {
        return Ok(1.0);
    }
    Ok(1.0 - (observed / total_records) / expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::Answer;

    fn table(rows: &[(&str, &str, &str)]) -> AnswerTable {
        AnswerTable::new(
            rows.iter()
                .map(|(item, annotator, label)| Answer::new(item, annotator, label))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn consistent_answers_score_one() {
        let answers = table(&[
            ("X", "A", "yes"),
            ("X", "B", "yes"),
            ("Y", "A", "no"),
            ("Y", "B", "no"),
        ]);
        assert!((alpha_krippendorff(&answers).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn partially_inconsistent_answers() {
        let answers = table(&[
            ("X", "A", "yes"),
            ("X", "B", "yes"),
            ("Y", "A", "no"),
            ("Y", "B", "no"),
            ("Z", "A", "yes"),
            ("Z", "B", "no"),
        ]);
        let alpha = alpha_krippendorff(&answers).unwrap();
        assert!((alpha - 0.4444444444444444).abs() < 1e-12);
    }

    #[test]
    fn single_label_alphabet_is_perfect_agreement() {
        let answers = table(&[("X", "A", "yes"), ("X", "B", "yes")]);
        assert_eq!(alpha_krippendorff(&answers).unwrap(), 1.0);
    }

    #[test]
    fn empty_table_is_degenerate() {
        let answers = AnswerTable::new(Vec::new()).unwrap();
        assert!(alpha_krippendorff(&answers).is_err());
    }

    #[test]
    fn no_pairable_items_is_degenerate() {
        let answers = table(&[("X", "A", "yes"), ("Y", "B", "no")]);
        assert!(alpha_krippendorff(&answers).is_err());
    }

    #[test]
    fn custom_distance_changes_the_score() {
        let answers = table(&[
            ("X", "A", "2"),
            ("X", "B", "3"),
            ("Y", "A", "1"),
            ("Y", "B", "1"),
        ]);
        // Adjacent numeric labels count as half a disagreement.
        let soft = |a: &str, b: &str| {
            let delta = (a.parse::<i32>().unwrap() - b.parse::<i32>().unwrap()).abs();
            match delta {
                0 => 0.0,
                1 => 0.5,
                _ => 1.0,
            }
        };
        let hard = alpha_krippendorff(&answers).unwrap();
        let softened = alpha_krippendorff_with(&answers, soft).unwrap();
        assert!(softened > hard);
    }
}
