// Next-symbol predictors.
//
// The generator only ever talks to a `Predictor`: given the most recent
// context ids, return a probability vector over the whole vocabulary. A
// neural model trained elsewhere plugs in behind this trait; the generator
// never looks inside it.
//
// `NgramPredictor` is the in-crate implementation, trained directly on the
// corpus training windows. It counts which id follows each context of
// length 1..=order and, at prediction time, backs off from the longest
// context it has seen to shorter ones and finally to the unigram
// distribution. Add-alpha smoothing keeps every id strictly possible so the
// returned vector always has full support.

use crate::corpus::TrainingWindow;
use crate::error::PredictorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// A next-symbol model: context ids in, probability vector out.
///
/// Implementations must return exactly one probability per vocabulary id,
/// each finite and non-negative, summing to 1 (within float tolerance). The
/// generator checks this and aborts on violation.
pub trait Predictor {
    fn predict(&mut self, context: &[usize]) -> Result<Vec<f64>, PredictorError>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(&mut self, context: &[usize]) -> Result<Vec<f64>, PredictorError> {
        (**self).predict(context)
    }
}

/// Count table: next id -> occurrences.
type CountTable = BTreeMap<usize, f64>;

/// Smoothing mass added to every id.
const ALPHA: f64 = 0.01;

/// Back-off n-gram predictor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NgramPredictor {
    pub order: usize,
    pub vocab_size: usize,
    /// `contexts[k - 1]`: context of the last k ids -> next-id counts.
    pub contexts: Vec<BTreeMap<String, CountTable>>,
    /// Overall next-id counts.
    pub unigram: CountTable,
}

impl NgramPredictor {
    /// Count every window's target under each suffix of its context up to
    /// `order` ids long.
    pub fn train(windows: &[TrainingWindow], vocab_size: usize, order: usize) -> Self {
        let mut contexts = vec![BTreeMap::new(); order];
        let mut unigram = CountTable::new();

        for window in windows {
            *unigram.entry(window.target).or_insert(0.0) += 1.0;
            let max_k = order.min(window.context.len());
            for k in 1..=max_k {
                let key = context_key(&window.context[window.context.len() - k..]);
                let table: &mut CountTable = contexts[k - 1].entry(key).or_default();
                *table.entry(window.target).or_insert(0.0) += 1.0;
            }
        }

        log::info!(
            "trained order-{order} n-gram predictor on {} windows ({} distinct contexts)",
            windows.len(),
            contexts.iter().map(BTreeMap::len).sum::<usize>()
        );
        NgramPredictor {
            order,
            vocab_size,
            contexts,
            unigram,
        }
    }

    /// Smoothed next-id distribution for `context`.
    pub fn distribution(&self, context: &[usize]) -> Vec<f64> {
        let max_k = self.order.min(context.len());
        let table = (1..=max_k)
            .rev()
            .find_map(|k| {
                let key = context_key(&context[context.len() - k..]);
                self.contexts.get(k - 1)?.get(&key)
            })
            .unwrap_or(&self.unigram);

        let total: f64 = table.values().sum();
        let denom = total + ALPHA * self.vocab_size as f64;
        (0..self.vocab_size)
            .map(|id| (table.get(&id).copied().unwrap_or(0.0) + ALPHA) / denom)
            .collect()
    }

    /// Check that a deserialized model is internally consistent: one
    /// context table per order, and every counted id inside the vocabulary.
    pub fn validate(&self) -> Result<(), PredictorError> {
        let malformed = |msg: String| Err(PredictorError::MalformedModel(msg));
        if self.order == 0 || self.vocab_size == 0 {
            return malformed("order and vocab_size must be at least 1".to_string());
        }
        if self.contexts.len() != self.order {
            return malformed(format!(
                "{} context tables for an order-{} model",
                self.contexts.len(),
                self.order
            ));
        }
        let tables = self.contexts.iter().flat_map(BTreeMap::values);
        for table in tables.chain(std::iter::once(&self.unigram)) {
            if let Some((&id, _)) = table.iter().find(|&(&id, _)| id >= self.vocab_size) {
                return malformed(format!(
                    "id {id} is outside a vocabulary of {}",
                    self.vocab_size
                ));
            }
            if let Some(count) = table.values().find(|c| !c.is_finite() || **c < 0.0) {
                return malformed(format!("invalid count {count}"));
            }
        }
        Ok(())
    }

    /// Load from a JSON file and validate.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let model: NgramPredictor = serde_json::from_str(data)?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }
}

impl Predictor for NgramPredictor {
    fn predict(&mut self, context: &[usize]) -> Result<Vec<f64>, PredictorError> {
        if let Some(&id) = context.iter().find(|&&id| id >= self.vocab_size) {
            return Err(PredictorError::ContextIdOutOfRange {
                id,
                vocab_size: self.vocab_size,
            });
        }
        Ok(self.distribution(context))
    }
}

/// Encode a context as a string key for BTreeMap lookup (and JSON keys).
fn context_key(context: &[usize]) -> String {
    context
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::training_windows;

    fn cyclic_model() -> NgramPredictor {
        // 0 1 2 0 1 2 ... : every context determines its successor.
        let ids: Vec<usize> = (0..60).map(|i| i % 3).collect();
        NgramPredictor::train(&training_windows(&ids, 4), 4, 2)
    }

    #[test]
    fn test_context_key() {
        assert_eq!(context_key(&[2, 10, 3]), "2,10,3");
        assert_eq!(context_key(&[]), "");
    }

    #[test]
    fn test_distribution_is_normalized_with_full_support() {
        let model = cyclic_model();
        let p = model.distribution(&[0, 1, 2, 0]);
        assert_eq!(p.len(), 4);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p.iter().all(|&x| x > 0.0));
        // After ...2 0 the cycle continues with 1.
        assert!(p[1] > 0.9, "{p:?}");
    }

    #[test]
    fn test_backs_off_to_unigram() {
        let model = cyclic_model();
        // Id 3 never occurs, so no context ending in it was seen.
        let p = model.distribution(&[3, 3]);
        let unseen = p[3];
        // Targets 4..60 of the cycle: 1 and 2 occur 19 times, 0 occurs 18.
        assert!((p[1] - p[2]).abs() < 1e-9);
        assert!(p[0] < p[1]);
        assert!(unseen < p[0]);
    }

    #[test]
    fn test_rejects_out_of_range_context() {
        let mut model = cyclic_model();
        assert_eq!(
            model.predict(&[0, 9]),
            Err(PredictorError::ContextIdOutOfRange { id: 9, vocab_size: 4 })
        );
    }

    #[test]
    fn test_json_round_trip() {
        let model = cyclic_model();
        let json = serde_json::to_string(&model).unwrap();
        let restored = NgramPredictor::from_json(&json).unwrap();
        assert_eq!(restored.distribution(&[1, 2]), model.distribution(&[1, 2]));
    }

    #[test]
    fn test_malformed_model_is_rejected() {
        // Order 4 but no context tables.
        let missing_tables = r#"{"order":4,"vocab_size":3,"contexts":[],"unigram":{}}"#;
        assert!(NgramPredictor::from_json(missing_tables).is_err());

        let id_out_of_range = r#"{"order":1,"vocab_size":3,"contexts":[{"0":{"7":2.0}}],"unigram":{"0":1.0}}"#;
        assert!(NgramPredictor::from_json(id_out_of_range).is_err());

        let bad_unigram = r#"{"order":1,"vocab_size":3,"contexts":[{}],"unigram":{"3":1.0}}"#;
        let model: NgramPredictor = serde_json::from_str(bad_unigram).unwrap();
        assert!(matches!(
            model.validate(),
            Err(PredictorError::MalformedModel(_))
        ));

        let ok = r#"{"order":1,"vocab_size":3,"contexts":[{"0":{"1":2.0}}],"unigram":{"1":2.0}}"#;
        assert!(NgramPredictor::from_json(ok).is_ok());
    }

    #[test]
    fn test_short_context_table_list_does_not_panic() {
        let mut model: NgramPredictor =
            serde_json::from_str(r#"{"order":4,"vocab_size":3,"contexts":[],"unigram":{}}"#)
                .unwrap();
        let p = model.predict(&[0, 1]).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}
