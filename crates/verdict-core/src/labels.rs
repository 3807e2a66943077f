//! Label space and distribution helpers.
//!
//! The label alphabet is discovered at runtime from the answer table and kept
//! sorted: every matrix in the crate is indexed by position in this alphabet,
//! and the stable ordering is what makes the default tie-break deterministic.

use ahash::AHashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tie-breaking policy for argmax label selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Pick the tied label that comes first in the sorted alphabet.
    #[default]
    FirstAlphabetical,
    /// Pick uniformly among tied labels with an RNG seeded from the value.
    Seeded(u64),
}

impl TieBreak {
    /// Build the stateful breaker used across a whole fit pass.
    pub fn breaker(&self) -> TieBreaker {
        let rng = match self {
            Self::FirstAlphabetical => None,
            Self::Seeded(seed) => Some(StdRng::seed_from_u64(*seed)),
        };
        TieBreaker { rng }
    }
}

/// Stateful argmax tie-breaker.
///
/// One breaker is used per fit pass so a seeded policy yields the same label
/// sequence on every run over the same table.
pub struct TieBreaker {
    rng: Option<StdRng>,
}

impl TieBreaker {
    /// Index of the maximal entry; ties resolved per the policy.
    pub fn argmax(&mut self, row: &[f64]) -> Option<usize> {
        let mut best = f64::NEG_INFINITY;
        let mut tied: Vec<usize> = Vec::new();
        for (idx, &value) in row.iter().enumerate() {
            if value > best {
                best = value;
                tied.clear();
                tied.push(idx);
            } else if value == best {
                tied.push(idx);
            }
        }
        match (tied.len(), self.rng.as_mut()) {
            (0, _) => None,
            (1, _) | (_, None) => tied.first().copied(),
            (n, Some(rng)) => tied.get(rng.gen_range(0..n)).copied(),
        }
    }
}

/// The finite label alphabet discovered from an answer table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSpace {
    labels: Vec<String>,
    index: AHashMap<String, usize>,
}

impl LabelSpace {
    /// Discover the alphabet from an iterator of observed labels.
    pub fn discover<'a>(observed: impl IntoIterator<Item = &'a str>) -> Self {
        let labels: Vec<String> = observed.into_iter().map(str::to_string).collect();
        Self::from(labels)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Position of a label in the sorted alphabet.
    pub fn position(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    /// Label at an alphabet position.
    pub fn label(&self, position: usize) -> Option<&str> {
        self.labels.get(position).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.labels
    }

    /// A fresh all-zero row over this alphabet.
    pub fn zero_row(&self) -> Vec<f64> {
        vec![0.0; self.labels.len()]
    }

    /// The uniform distribution over this alphabet.
    pub fn uniform(&self) -> Vec<f64> {
        let k = self.labels.len();
        if k == 0 {
            return Vec::new();
        }
        vec![1.0 / k as f64; k]
    }
}

impl From<Vec<String>> for LabelSpace {
    fn from(mut labels: Vec<String>) -> Self {
        labels.sort();
        labels.dedup();
        let index = labels
            .iter()
            .enumerate()
            .map(|(idx, label)| (label.clone(), idx))
            .collect();
        Self { labels, index }
    }
}

impl From<LabelSpace> for Vec<String> {
    fn from(space: LabelSpace) -> Self {
        space.labels
    }
}

/// Normalize a row in place to sum to 1. Rows with no mass are left untouched.
pub fn normalize(row: &mut [f64]) {
    let total: f64 = row.iter().sum();
    if total > 0.0 {
        for value in row.iter_mut() {
            *value /= total;
        }
    }
}

/// Shannon entropy (natural log) of a non-negative mass vector.
///
/// The mass is normalized before the entropy is taken; an extra 1e-6 on the
/// denominator keeps all-zero rows defined.
pub fn entropy(mass: &[f64]) -> f64 {
    let total: f64 = mass.iter().sum::<f64>() + 1e-6;
    mass.iter()
        .filter(|&&m| m > 0.0)
        .map(|&m| {
            let p = m / total;
            -p * p.ln()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn discover_sorts_and_dedups() {
        let space = LabelSpace::discover(["yes", "no", "yes", "maybe"]);
        assert_eq!(space.as_slice(), &["maybe", "no", "yes"]);
        assert_eq!(space.position("no"), Some(1));
        assert_eq!(space.label(2), Some("yes"));
        assert_eq!(space.position("unknown"), None);
    }

    #[test]
    fn alphabetical_tie_break_is_first_index() {
        let mut breaker = TieBreak::FirstAlphabetical.breaker();
        assert_eq!(breaker.argmax(&[0.5, 0.5]), Some(0));
        assert_eq!(breaker.argmax(&[0.2, 0.8]), Some(1));
        assert_eq!(breaker.argmax(&[]), None);
    }

    #[test]
    fn seeded_tie_break_is_reproducible() {
        let picks: Vec<Option<usize>> = (0..2)
            .map(|_| {
                let mut breaker = TieBreak::Seeded(42).breaker();
                breaker.argmax(&[0.5, 0.5])
            })
            .collect();
        assert_eq!(picks[0], picks[1]);
        assert!(matches!(picks[0], Some(0) | Some(1)));
    }

    #[test]
    fn normalize_sums_to_one() {
        let mut row = vec![2.0, 1.0, 1.0];
        normalize(&mut row);
        assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((row[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn entropy_of_certain_and_even_mass() {
        assert!(entropy(&[3.0, 0.0]) < 1e-5);
        let even = entropy(&[2.0, 2.0]);
        assert!((even - std::f64::consts::LN_2).abs() < 1e-5);
    }
}
