use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, RwLock,
    },
};

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::knn::{Classification, KnnClassifier, DEFAULT_K};

/// Field of the model document holding the labeled examples.
const TRAINING_FIELD: &str = "trainingsData";

#[derive(Debug, Deserialize)]
struct TrainingExample {
    pose: Vec<f32>,
    label: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub examples: usize,
    pub labels: BTreeMap<String, usize>,
    pub dimension: Option<usize>,
    pub loaded_at: DateTime<Utc>,
}

/// Shared handle to the pose classifier.
///
/// Classification only runs once a training set has been loaded completely.
#[derive(Clone)]
pub struct PoseClassifier {
    knn: Arc<RwLock<KnnClassifier>>,
    trained: Arc<AtomicBool>,
    k: Arc<AtomicUsize>,
}

impl Default for PoseClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_K)
    }
}

impl PoseClassifier {
    pub fn new(k: usize) -> Self {
        Self {
            knn: Arc::new(RwLock::new(KnnClassifier::new())),
            trained: Arc::new(AtomicBool::new(false)),
            k: Arc::new(AtomicUsize::new(k.max(1))),
        }
    }

    pub fn is_trained(&self) -> bool {
        self.trained.load(Ordering::SeqCst)
    }

    pub fn set_k(&self, k: usize) {
        self.k.store(k.max(1), Ordering::SeqCst);
    }

    pub fn example_count(&self) -> usize {
        self.knn.read().map(|knn| knn.example_count()).unwrap_or(0)
    }

    /// Replace the examples with the ones in a model document.
    ///
    /// The document is parsed up front, so malformed JSON leaves the current
    /// examples alone. Records are then added one by one; a bad record stops
    /// the load with the earlier records kept, and the classifier stays
    /// usable only if at least one of them made it in.
    pub fn load_training_set(&self, document: &str) -> Result<ModelInfo> {
        let mut root: serde_json::Value =
            serde_json::from_str(document).context("model file is not valid JSON")?;
        let records = match root.get_mut(TRAINING_FIELD).map(serde_json::Value::take) {
            Some(serde_json::Value::Array(records)) => records,
            Some(_) => bail!("field '{TRAINING_FIELD}' is not a list"),
            None => bail!("model file has no '{TRAINING_FIELD}' field"),
        };

        let mut knn = self
            .knn
            .write()
            .map_err(|_| anyhow!("classifier lock poisoned"))?;
        knn.clear_all_labels();

        if let Err(err) = add_records(&mut knn, records) {
            let kept = knn.example_count();
            warn!("Stopped model load; {kept} examples kept");
            self.trained.store(kept > 0, Ordering::SeqCst);
            return Err(err);
        }

        self.trained.store(knn.example_count() > 0, Ordering::SeqCst);

        let info = ModelInfo {
            examples: knn.example_count(),
            labels: knn.label_counts(),
            dimension: knn.dimension(),
            loaded_at: Utc::now(),
        };
        info!(
            "Model loaded with {} examples across {} labels",
            info.examples,
            info.labels.len()
        );
        Ok(info)
    }

    /// Classify one flattened pose on a blocking worker.
    pub async fn classify(&self, pose: Vec<f32>) -> Result<Classification> {
        if !self.is_trained() {
            bail!("no model loaded");
        }

        let knn = Arc::clone(&self.knn);
        let k = self.k.load(Ordering::SeqCst);
        tokio::task::spawn_blocking(move || {
            let guard = knn
                .read()
                .map_err(|_| anyhow!("classifier lock poisoned"))?;
            guard.classify(&pose, k)
        })
        .await
        .context("classification worker join failed")?
    }
}

fn add_records(knn: &mut KnnClassifier, records: Vec<serde_json::Value>) -> Result<()> {
    for (index, record) in records.into_iter().enumerate() {
        let example: TrainingExample = serde_json::from_value(record)
            .with_context(|| format!("training record {index} is malformed"))?;
        let label = example.label.clone();
        knn.add_example(example.pose, example.label)
            .with_context(|| format!("training record {index} ({label}) rejected"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "trainingsData": [
            {"pose": [1.0, 0.0, 0.0], "label": "A"},
            {"pose": [0.0, 1.0, 0.0], "label": "B"},
            {"pose": [0.0, 0.0, 1.0], "label": "C"}
        ]
    }"#;

    #[tokio::test]
    async fn classify_requires_a_loaded_model() {
        let classifier = PoseClassifier::default();
        assert!(classifier.classify(vec![1.0, 0.0, 0.0]).await.is_err());
    }

    #[tokio::test]
    async fn loaded_model_classifies() {
        let classifier = PoseClassifier::new(1);
        let info = classifier.load_training_set(MODEL).unwrap();
        assert_eq!(info.examples, 3);
        assert_eq!(info.dimension, Some(3));
        assert!(classifier.is_trained());

        let result = classifier.classify(vec![0.1, 0.9, 0.0]).await.unwrap();
        assert_eq!(result.label, "B");
        assert_eq!(result.confidence(), 1.0);
    }

    #[test]
    fn invalid_json_leaves_examples_untouched() {
        let classifier = PoseClassifier::default();
        classifier.load_training_set(MODEL).unwrap();

        assert!(classifier.load_training_set("{not json").is_err());
        assert!(classifier.load_training_set(r#"{"other": []}"#).is_err());
        assert_eq!(classifier.example_count(), 3);
        assert!(classifier.is_trained());
    }

    #[test]
    fn bad_record_keeps_earlier_examples() {
        let classifier = PoseClassifier::default();
        let partial = r#"{"trainingsData": [
            {"pose": [1.0, 0.0], "label": "rock"},
            {"pose": [0.0, 1.0], "label": "paper"},
            {"pose": "oops", "label": "scissors"},
            {"pose": [0.5, 0.5], "label": "scissors"}
        ]}"#;

        let err = classifier.load_training_set(partial).unwrap_err();
        assert!(err.to_string().contains("record 2"));
        assert_eq!(classifier.example_count(), 2);
        assert!(classifier.is_trained());
    }

    #[tokio::test]
    async fn failed_reload_with_nothing_kept_untrains() {
        let classifier = PoseClassifier::default();
        classifier.load_training_set(MODEL).unwrap();

        let broken = r#"{"trainingsData": [{"pose": "bad", "label": "A"}]}"#;
        assert!(classifier.load_training_set(broken).is_err());
        assert_eq!(classifier.example_count(), 0);
        assert!(!classifier.is_trained());
        assert!(classifier.classify(vec![1.0, 0.0, 0.0]).await.is_err());
    }

    #[test]
    fn reload_replaces_previous_examples() {
        let classifier = PoseClassifier::default();
        classifier.load_training_set(MODEL).unwrap();
        let info = classifier
            .load_training_set(r#"{"trainingsData": [{"pose": [1.0], "label": "rock"}]}"#)
            .unwrap();
        assert_eq!(info.examples, 1);
        assert_eq!(info.labels.get("rock"), Some(&1));
    }
}
