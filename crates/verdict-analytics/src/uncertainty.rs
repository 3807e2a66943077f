//! Label uncertainty: Shannon entropy of skill-weighted label mass.
//!
//! Each record spreads one unit of mass over the alphabet: `skill` on its own
//! label and `(1 - skill) / (n_labels - 1)` on every other. Mass is summed by
//! item or by annotator and the entropy of the normalized sum is reported.
//! Without skills every annotator counts at full weight, which reduces to the
//! entropy of the empirical label distribution.

use std::collections::BTreeMap;

use verdict_core::error::{Error, Result};
use verdict_core::labels::entropy;
use verdict_core::AnswerTable;

use crate::skills::{label_probability, resolve_record_skills};

fn mass_by(
    answers: &AnswerTable,
    skills: Option<&BTreeMap<String, f64>>,
    key_of: impl Fn(&verdict_core::Answer) -> String,
) -> Result<BTreeMap<String, Vec<f64>>> {
    let space = answers.label_space();
    let n_labels = space.len();
    let record_skills = resolve_record_skills(answers, skills)?;

    let mut mass: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (record, skill) in answers.records().iter().zip(record_skills) {
        let own = space.position(&record.label);
        let row = mass
            .entry(key_of(record))
            .or_insert_with(|| space.zero_row());
        for (position, cell) in row.iter_mut().enumerate() {
            *cell += label_probability(skill, own == Some(position), n_labels);
        }
    }
    Ok(mass)
}

/// Entropy per item.
pub fn uncertainty_by_item(
    answers: &AnswerTable,
    skills: Option<&BTreeMap<String, f64>>,
) -> Result<BTreeMap<String, f64>> {
    let mass = mass_by(answers, skills, |record| record.item.clone())?;
    Ok(mass
        .into_iter()
        .map(|(item, row)| (item, entropy(&row)))
        .collect())
}

/// Entropy per annotator.
pub fn uncertainty_by_annotator(
    answers: &AnswerTable,
    skills: Option<&BTreeMap<String, f64>>,
) -> Result<BTreeMap<String, f64>> {
    let mass = mass_by(answers, skills, |record| record.annotator.clone())?;
    Ok(mass
        .into_iter()
        .map(|(annotator, row)| (annotator, entropy(&row)))
        .collect())
}

/// Mean per-item entropy.
pub fn uncertainty(answers: &AnswerTable, skills: Option<&BTreeMap<String, f64>>) -> Result<f64> {
    let by_item = uncertainty_by_item(answers, skills)?;
    if by_item.is_empty() {
        return Err(Error::Degenerate(
            "uncertainty is undefined for an empty answer table".to_string(),
        ));
    }
    Ok(by_item.values().sum::<f64>() / by_item.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use verdict_core::Answer;

    fn table() -> AnswerTable {
        AnswerTable::new(vec![
            Answer::new("t1", "w1", "yes"),
            Answer::new("t1", "w2", "yes"),
            Answer::new("t2", "w1", "yes"),
            Answer::new("t2", "w2", "no"),
        ])
        .unwrap()
    }

    #[test]
    fn unanimous_item_has_near_zero_entropy() {
        let by_item = uncertainty_by_item(&table(), None).unwrap();
        assert!(by_item["t1"] < 1e-5);
        assert!((by_item["t2"] - std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn mean_is_the_average_over_items() {
        let by_item = uncertainty_by_item(&table(), None).unwrap();
        let mean = uncertainty(&table(), None).unwrap();
        let want = by_item.values().sum::<f64>() / 2.0;
        assert!((mean - want).abs() < 1e-12);
    }

    #[test]
    fn by_annotator_reflects_each_annotators_label_mix() {
        let by_annotator = uncertainty_by_annotator(&table(), None).unwrap();
        assert!(by_annotator["w1"] < 1e-5);
        assert!((by_annotator["w2"] - std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn skills_sharpen_or_flatten_the_mass() {
        let skills = BTreeMap::from([("w1".to_string(), 0.5), ("w2".to_string(), 0.5)]);
        let by_item = uncertainty_by_item(&table(), Some(&skills)).unwrap();
        // With skill 0.5 on a binary alphabet every record spreads evenly.
        assert!((by_item["t1"] - std::f64::consts::LN_2).abs() < 1e-5);
    }

    #[test]
    fn missing_skill_for_an_annotator_errors() {
        let skills = BTreeMap::from([("w1".to_string(), 0.9)]);
        let err = uncertainty_by_item(&table(), Some(&skills)).unwrap_err();
        assert!(err.to_string().contains("w2"));
    }

    #[test]
    fn empty_table_mean_is_degenerate() {
        let empty = AnswerTable::new(Vec::new()).unwrap();
        assert!(uncertainty(&empty, None).is_err());
    }
}
