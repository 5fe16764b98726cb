//! Aggregates registered health checkers into a single verdict.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

use super::HealthChecker;

/// Per-checker line of the health summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub name: String,
    pub status: String,
}

/// Collects health checkers and computes the overall health.
pub trait HealthCalculator: Send + Sync {
    /// Appends a checker. No validation and no deduplication.
    fn add(&self, checker: Arc<dyn HealthChecker>);

    /// Returns the overall health and one record per checker in registration order.
    fn calculate(&self) -> (bool, Vec<Record>);
}

/// Default calculator backed by an append-only list.
///
/// Checkers are expected to be registered before the application starts;
/// adding while `calculate` runs on another task is not a supported pattern.
#[derive(Default)]
pub struct Calculator {
    checkers: RwLock<Vec<Arc<dyn HealthChecker>>>,
}

impl Calculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.checkers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.read().is_empty()
    }
}

impl HealthCalculator for Calculator {
    fn add(&self, checker: Arc<dyn HealthChecker>) {
        self.checkers.write().push(checker);
    }

    fn calculate(&self) -> (bool, Vec<Record>) {
        let checkers = self.checkers.read();
        let mut healthy = true;
        let mut records = Vec::with_capacity(checkers.len());

        for checker in checkers.iter() {
            // Single read per pass, the checker may flip while we iterate.
            let status = checker.status();
            if status.is_down() {
                healthy = false;
            }
            records.push(Record {
                name: checker.name().to_string(),
                status: status.as_str().to_string(),
            });
        }

        (healthy, records)
    }
}

/// Encodes a summary as a JSON array of `{"name","status"}` objects.
pub fn encode_summary(records: &[Record]) -> serde_json::Result<Vec<u8>> {
    serde_json::to_vec(records)
}

/// Calculates and encodes in one step. Without a calculator the service is healthy.
pub fn report(calculator: Option<&dyn HealthCalculator>) -> serde_json::Result<(bool, Vec<u8>)> {
    let Some(calculator) = calculator else {
        return Ok((true, b"[]".to_vec()));
    };
    let (healthy, records) = calculator.calculate();
    Ok((healthy, encode_summary(&records)?))
}
