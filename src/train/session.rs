//! Training session state

use std::fmt;

/// Phase of one epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Train,
    Val,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Train => write!(f, "train"),
            Phase::Val => write!(f, "val"),
        }
    }
}

/// One epoch's results for one phase
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochRecord {
    pub loss: f32,
    pub dice: f32,
    pub iou: f32,
    pub accuracy: f32,
}

/// Explicit value object holding all mutable cross-epoch training state
///
/// Owned by the trainer; nothing here is ambient or shared. Histories are
/// append-only for the life of the run, and `best_loss` only ever
/// decreases.
#[derive(Clone, Debug)]
pub struct TrainingSession {
    epoch: usize,
    best_loss: f32,
    train_history: Vec<EpochRecord>,
    val_history: Vec<EpochRecord>,
}

impl TrainingSession {
    /// Fresh session with no history and no best loss yet
    pub fn new() -> Self {
        Self {
            epoch: 0,
            best_loss: f32::INFINITY,
            train_history: Vec::new(),
            val_history: Vec::new(),
        }
    }

    /// Current epoch index (last one started)
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Mark an epoch as started
    pub fn begin_epoch(&mut self, epoch: usize) {
        self.epoch = epoch;
    }

    /// Best validation loss seen so far (infinite before any validation)
    pub fn best_loss(&self) -> f32 {
        self.best_loss
    }

    /// Append one phase's epoch record
    pub fn record(&mut self, phase: Phase, record: EpochRecord) {
        match phase {
            Phase::Train => self.train_history.push(record),
            Phase::Val => self.val_history.push(record),
        }
    }

    /// Full history for a phase, oldest first
    pub fn history(&self, phase: Phase) -> &[EpochRecord] {
        match phase {
            Phase::Train => &self.train_history,
            Phase::Val => &self.val_history,
        }
    }

    /// Report a validation loss; returns true (and lowers the best) only on
    /// strict improvement
    pub fn observe_val_loss(&mut self, val_loss: f32) -> bool {
        if val_loss < self.best_loss {
            self.best_loss = val_loss;
            true
        } else {
            false
        }
    }
}

impl Default for TrainingSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(loss: f32) -> EpochRecord {
        EpochRecord {
            loss,
            dice: 0.5,
            iou: 0.4,
            accuracy: 0.9,
        }
    }

    #[test]
    fn test_histories_are_separate_and_append_only() {
        let mut session = TrainingSession::new();
        session.record(Phase::Train, record(1.0));
        session.record(Phase::Train, record(0.8));
        session.record(Phase::Val, record(0.9));

        assert_eq!(session.history(Phase::Train).len(), 2);
        assert_eq!(session.history(Phase::Val).len(), 1);
        assert_eq!(session.history(Phase::Train)[0].loss, 1.0);
    }

    #[test]
    fn test_first_val_loss_always_improves() {
        let mut session = TrainingSession::new();
        assert!(session.observe_val_loss(123.0));
        assert_eq!(session.best_loss(), 123.0);
    }

    #[test]
    fn test_best_loss_requires_strict_improvement() {
        let mut session = TrainingSession::new();
        assert!(session.observe_val_loss(1.0));
        assert!(!session.observe_val_loss(1.0));
        assert!(!session.observe_val_loss(1.5));
        assert!(session.observe_val_loss(0.5));
        assert_eq!(session.best_loss(), 0.5);
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(Phase::Train.to_string(), "train");
        assert_eq!(Phase::Val.to_string(), "val");
    }
}
