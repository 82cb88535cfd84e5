//! k-nearest-neighbor pose classifier.
//!
//! Examples are stored per label; a query votes with its `k` most similar
//! examples by cosine similarity.

use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::Serialize;

pub const DEFAULT_K: usize = 3;

/// Outcome of a single classification.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub label: String,
    /// Vote share per known label, each in `[0, 1]`
    pub confidences_by_label: BTreeMap<String, f32>,
}

impl Classification {
    /// Confidence of the winning label.
    pub fn confidence(&self) -> f32 {
        self.confidences_by_label
            .get(&self.label)
            .copied()
            .unwrap_or(0.0)
    }
}

struct Example {
    pose: Vec<f32>,
    norm: f32,
    label: String,
}

#[derive(Default)]
pub struct KnnClassifier {
    examples: Vec<Example>,
}

impl KnnClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_example(&mut self, pose: Vec<f32>, label: impl Into<String>) -> Result<()> {
        if pose.is_empty() {
            bail!("pose vector is empty");
        }
        if let Some(dimension) = self.dimension() {
            if pose.len() != dimension {
                bail!(
                    "pose has {} values but stored examples have {}",
                    pose.len(),
                    dimension
                );
            }
        }

        let norm = l2_norm(&pose);
        self.examples.push(Example {
            pose,
            norm,
            label: label.into(),
        });
        Ok(())
    }

    pub fn clear_all_labels(&mut self) {
        self.examples.clear();
    }

    pub fn example_count(&self) -> usize {
        self.examples.len()
    }

    pub fn dimension(&self) -> Option<usize> {
        self.examples.first().map(|example| example.pose.len())
    }

    pub fn label_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for example in &self.examples {
            *counts.entry(example.label.clone()).or_insert(0) += 1;
        }
        counts
    }

    pub fn classify(&self, pose: &[f32], k: usize) -> Result<Classification> {
        if self.examples.is_empty() {
            bail!("classifier has no examples");
        }
        if pose.is_empty() {
            bail!("pose vector is empty");
        }
        if let Some(dimension) = self.dimension() {
            if pose.len() != dimension {
                bail!(
                    "pose has {} values but classifier expects {}",
                    pose.len(),
                    dimension
                );
            }
        }

        let query_norm = l2_norm(pose);
        let mut ranked: Vec<(f32, &Example)> = self
            .examples
            .iter()
            .map(|example| (cosine_similarity(pose, query_norm, example), example))
            .collect();
        // Stable sort keeps insertion order among equal similarities
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let k_effective = k.max(1).min(ranked.len());
        let mut votes: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, example) in ranked.iter().take(k_effective) {
            *votes.entry(example.label.as_str()).or_insert(0) += 1;
        }

        // Most votes wins; ties go to the label of the closest neighbor
        let mut label = ranked[0].1.label.as_str();
        let mut best_votes = votes.get(label).copied().unwrap_or(0);
        for (candidate, &count) in &votes {
            if count > best_votes {
                label = *candidate;
                best_votes = count;
            }
        }

        let mut confidences_by_label: BTreeMap<String, f32> = self
            .label_counts()
            .into_keys()
            .map(|known| (known, 0.0))
            .collect();
        for (candidate, count) in &votes {
            confidences_by_label.insert((*candidate).to_string(), *count as f32 / k_effective as f32);
        }

        Ok(Classification {
            label: label.to_string(),
            confidences_by_label,
        })
    }
}

fn l2_norm(values: &[f32]) -> f32 {
    values.iter().map(|v| v * v).sum::<f32>().sqrt()
}

fn cosine_similarity(query: &[f32], query_norm: f32, example: &Example) -> f32 {
    let denom = query_norm * example.norm;
    if denom <= f32::EPSILON {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(&example.pose).map(|(a, b)| a * b).sum();
    dot / denom
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> KnnClassifier {
        let mut knn = KnnClassifier::new();
        knn.add_example(vec![1.0, 0.0, 0.0], "A").unwrap();
        knn.add_example(vec![0.9, 0.1, 0.0], "A").unwrap();
        knn.add_example(vec![0.0, 1.0, 0.0], "B").unwrap();
        knn.add_example(vec![0.1, 0.9, 0.0], "B").unwrap();
        knn.add_example(vec![0.0, 0.0, 1.0], "C").unwrap();
        knn
    }

    #[test]
    fn nearest_label_wins() {
        let result = trained().classify(&[0.95, 0.05, 0.0], 3).unwrap();
        assert_eq!(result.label, "A");
        assert!((result.confidence() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn confidences_cover_every_label() {
        let result = trained().classify(&[0.0, 0.0, 1.0], 3).unwrap();
        assert_eq!(result.confidences_by_label.len(), 3);
        let total: f32 = result.confidences_by_label.values().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(result
            .confidences_by_label
            .values()
            .all(|c| (0.0..=1.0).contains(c)));
    }

    #[test]
    fn k_is_capped_by_example_count() {
        let mut knn = KnnClassifier::new();
        knn.add_example(vec![1.0, 0.0], "rock").unwrap();
        let result = knn.classify(&[1.0, 0.1], 5).unwrap();
        assert_eq!(result.label, "rock");
        assert_eq!(result.confidence(), 1.0);
    }

    #[test]
    fn vote_tie_goes_to_closest_neighbor() {
        let mut knn = KnnClassifier::new();
        knn.add_example(vec![1.0, 0.0], "paper").unwrap();
        knn.add_example(vec![0.0, 1.0], "scissors").unwrap();
        let result = knn.classify(&[0.2, 1.0], 2).unwrap();
        assert_eq!(result.label, "scissors");
    }

    #[test]
    fn empty_classifier_refuses() {
        assert!(KnnClassifier::new().classify(&[1.0], 3).is_err());
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let mut knn = trained();
        assert!(knn.classify(&[1.0, 0.0], 3).is_err());
        assert!(knn.add_example(vec![1.0], "D").is_err());
        assert_eq!(knn.example_count(), 5);
    }

    #[test]
    fn clear_removes_everything() {
        let mut knn = trained();
        knn.clear_all_labels();
        assert_eq!(knn.example_count(), 0);
        assert_eq!(knn.dimension(), None);
    }
}
