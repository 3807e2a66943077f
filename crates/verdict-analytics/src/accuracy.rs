//! Accuracy on aggregates: the weighted fraction of answers matching the
//! aggregated label of their item.

use std::collections::BTreeMap;

use verdict_core::error::{Error, Result};
use verdict_core::AnswerTable;

/// Deduplicated (item, annotator, label) scores. Duplicate triples keep the
/// higher-scoring record; answers on items without an aggregate are ignored.
fn scored_records<'a>(
    answers: &'a AnswerTable,
    aggregates: &BTreeMap<String, String>,
) -> BTreeMap<(&'a str, &'a str, &'a str), (f64, f64)> {
    let mut scored: BTreeMap<(&str, &str, &str), (f64, f64)> = BTreeMap::new();
    for record in answers.records() {
        let Some(aggregated) = aggregates.get(&record.item) else {
            continue;
        };
        let score = if *aggregated == record.label {
            record.weight
        } else {
            0.0
        };
        let key = (
            record.item.as_str(),
            record.annotator.as_str(),
            record.label.as_str(),
        );
        let entry = scored.entry(key).or_insert((record.weight, score));
        if score > entry.1 {
            *entry = (record.weight, score);
        }
    }
    scored
}

/// Overall accuracy across all annotators.
pub fn accuracy_on_aggregates(
    answers: &AnswerTable,
    aggregates: &BTreeMap<String, String>,
) -> Result<f64> {
    let scored = scored_records(answers, aggregates);
    let total: f64 = scored.values().map(|(weight, _)| weight).sum();
    if total == 0.0 {
        return Err(Error::Degenerate(
            "no answers overlap the aggregated items".to_string(),
        ));
    }
    let matched: f64 = scored.values().map(|(_, score)| score).sum();
    Ok(matched / total)
}

/// Accuracy grouped per annotator.
pub fn accuracy_by_annotator(
    answers: &AnswerTable,
    aggregates: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, f64>> {
    let scored = scored_records(answers, aggregates);
    if scored.is_empty() {
        return Err(Error::Degenerate(
            "no answers overlap the aggregated items".to_string(),
        ));
    }
    let mut totals: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for (key, (weight, score)) in &scored {
        let entry = totals.entry(key.1).or_default();
        entry.0 += weight;
        entry.1 += score;
    }
    Ok(totals
        .into_iter()
        .filter(|(_, (weight, _))| *weight > 0.0)
        .map(|(annotator, (weight, score))| (annotator.to_string(), score / weight))
        .collect())
}
