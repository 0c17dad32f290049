//! Step-level scalar logging

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Sink for scalars reported by training, validation and test steps
pub trait StepLogger {
    fn log(&mut self, key: &str, value: f64);
}

/// Running summary of one logged key
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LossRecord {
    pub count: u64,
    pub sum: f64,
    pub last: f64,
}

impl LossRecord {
    pub fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Logger that keeps count, mean and last value per key
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LossHistory {
    records: HashMap<String, LossRecord>,
}

impl LossHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&LossRecord> {
        self.records.get(key)
    }

    pub fn count(&self, key: &str) -> u64 {
        self.records.get(key).map(|r| r.count).unwrap_or(0)
    }

    pub fn mean(&self, key: &str) -> Option<f64> {
        self.records.get(key).and_then(LossRecord::mean)
    }

    pub fn last(&self, key: &str) -> Option<f64> {
        self.records.get(key).filter(|r| r.count > 0).map(|r| r.last)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn reset(&mut self) {
        self.records.clear();
    }
}

impl StepLogger for LossHistory {
    fn log(&mut self, key: &str, value: f64) {
        let record = self.records.entry(key.to_string()).or_default();
        record.count += 1;
        record.sum += value;
        record.last = value;
    }
}

/// Forwards every scalar to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl StepLogger for TracingLogger {
    fn log(&mut self, key: &str, value: f64) {
        debug!(key, value, "Step scalar");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loss_history() {
        let mut history = LossHistory::new();
        history.log("loss/training", 1.0);
        history.log("loss/training", 3.0);
        history.log("loss/validation", 0.5);

        assert_eq!(history.count("loss/training"), 2);
        assert_eq!(history.mean("loss/training"), Some(2.0));
        assert_eq!(history.last("loss/training"), Some(3.0));
        assert_eq!(history.mean("loss/validation"), Some(0.5));
        assert_eq!(history.mean("loss/test"), None);
        assert_eq!(history.last("loss/test"), None);
    }

    #[test]
    fn test_reset() {
        let mut history = LossHistory::new();
        history.log("k", 1.0);
        history.reset();
        assert_eq!(history.count("k"), 0);
        assert_eq!(history.keys().count(), 0);
    }
}
