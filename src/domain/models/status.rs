//! Derived experiment status. Recomputed on demand, never stored.

use serde::{Deserialize, Serialize};

/// Live counters from the trial queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueDepth {
    pub waiting: usize,
    pub active: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Progress view for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentStatus {
    pub experiment_id: String,
    /// Total scenarios in the experiment
    pub total: u64,
    /// Scenarios with a durably persisted trial
    pub completed: u64,
    pub waiting: usize,
    pub active: usize,
    pub failed: usize,
    /// completed / total * 100
    pub progress: f64,
}

impl ExperimentStatus {
    pub fn compute(experiment_id: String, total: u64, completed: u64, depth: QueueDepth) -> Self {
        let progress = if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            {
                completed as f64 / total as f64 * 100.0
            }
        };
        Self {
            experiment_id,
            total,
            completed,
            waiting: depth.waiting,
            active: depth.active,
            failed: depth.failed,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let status = ExperimentStatus::compute("e".into(), 8, 2, QueueDepth::default());
        assert!((status.progress - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_progress_empty_experiment() {
        let status = ExperimentStatus::compute("e".into(), 0, 0, QueueDepth::default());
        assert!((status.progress - 0.0).abs() < f64::EPSILON);
    }
}
