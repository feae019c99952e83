//! Learning rate scheduling

use super::Optimizer;

/// Reduce-on-plateau learning rate scheduler
///
/// Watches validation loss and multiplies the learning rate by `factor`
/// once the loss has failed to improve for more than `patience` consecutive
/// checks. The rate never drops below `min_lr`. After a reduction an
/// optional `cooldown` number of checks is ignored before counting resumes.
pub struct ReduceOnPlateau {
    factor: f32,
    patience: usize,
    cooldown: usize,
    min_lr: f32,
    best: Option<f32>,
    bad_checks: usize,
    cooldown_left: usize,
}

impl ReduceOnPlateau {
    /// Create a new scheduler
    pub fn new(factor: f32, patience: usize, cooldown: usize, min_lr: f32) -> Self {
        Self {
            factor,
            patience,
            cooldown,
            min_lr,
            best: None,
            bad_checks: 0,
            cooldown_left: 0,
        }
    }

    /// Scheduler matching the engine defaults: factor 0.1, patience 3,
    /// no cooldown, floor 3e-6
    pub fn default_params() -> Self {
        Self::new(0.1, 3, 0, 3e-6)
    }

    /// Feed one validation loss and adjust the optimizer if needed
    ///
    /// Returns the learning rate in effect after the check.
    pub fn step(&mut self, val_loss: f32, optimizer: &mut dyn Optimizer) -> f32 {
        let improved = match self.best {
            Some(best) => val_loss < best,
            None => true,
        };

        if improved {
            self.best = Some(val_loss);
            self.bad_checks = 0;
        } else {
            self.bad_checks += 1;
        }

        // Cooldown elapses one check at a time, improving or not, and
        // suppresses the patience counter while it lasts
        if self.cooldown_left > 0 {
            self.cooldown_left -= 1;
            self.bad_checks = 0;
        }

        if self.bad_checks > self.patience {
            let current = optimizer.lr();
            let reduced = (current * self.factor).max(self.min_lr);
            if reduced < current {
                optimizer.set_lr(reduced);
                println!("Reducing learning rate: {current:.2e} -> {reduced:.2e}");
            }
            self.bad_checks = 0;
            self.cooldown_left = self.cooldown;
        }

        optimizer.lr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optim::Adam;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_no_reduction_while_improving() {
        let mut optimizer = Adam::default_params(0.1);
        let mut scheduler = ReduceOnPlateau::new(0.1, 2, 0, 1e-6);

        for loss in [1.0, 0.9, 0.8, 0.7, 0.6] {
            scheduler.step(loss, &mut optimizer);
        }
        assert_abs_diff_eq!(optimizer.lr(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_reduction_after_patience_exceeded() {
        let mut optimizer = Adam::default_params(0.1);
        let mut scheduler = ReduceOnPlateau::new(0.1, 2, 0, 1e-6);

        scheduler.step(1.0, &mut optimizer);
        // Three non-improving checks: patience 2 is exceeded on the third
        scheduler.step(1.0, &mut optimizer);
        scheduler.step(1.0, &mut optimizer);
        assert_abs_diff_eq!(optimizer.lr(), 0.1, epsilon = 1e-9);
        scheduler.step(1.0, &mut optimizer);
        assert_abs_diff_eq!(optimizer.lr(), 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_improvement_resets_patience() {
        let mut optimizer = Adam::default_params(0.1);
        let mut scheduler = ReduceOnPlateau::new(0.1, 2, 0, 1e-6);

        scheduler.step(1.0, &mut optimizer);
        scheduler.step(1.0, &mut optimizer);
        scheduler.step(1.0, &mut optimizer);
        scheduler.step(0.5, &mut optimizer); // improvement
        scheduler.step(0.5, &mut optimizer);
        scheduler.step(0.5, &mut optimizer);
        assert_abs_diff_eq!(optimizer.lr(), 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_min_lr_floor() {
        let mut optimizer = Adam::default_params(1e-5);
        let mut scheduler = ReduceOnPlateau::new(0.1, 0, 0, 3e-6);

        scheduler.step(1.0, &mut optimizer);
        for _ in 0..10 {
            scheduler.step(1.0, &mut optimizer);
        }
        assert_abs_diff_eq!(optimizer.lr(), 3e-6, epsilon = 1e-12);
    }

    #[test]
    fn test_cooldown_suppresses_counting() {
        let mut optimizer = Adam::default_params(0.1);
        let mut scheduler = ReduceOnPlateau::new(0.1, 0, 2, 1e-6);

        scheduler.step(1.0, &mut optimizer);
        scheduler.step(1.0, &mut optimizer); // reduces, enters cooldown
        assert_abs_diff_eq!(optimizer.lr(), 0.01, epsilon = 1e-9);
        scheduler.step(1.0, &mut optimizer); // cooldown
        scheduler.step(1.0, &mut optimizer); // cooldown
        assert_abs_diff_eq!(optimizer.lr(), 0.01, epsilon = 1e-9);
        scheduler.step(1.0, &mut optimizer); // counting resumes, patience 0 exceeded
        assert_abs_diff_eq!(optimizer.lr(), 0.001, epsilon = 1e-9);
    }

    #[test]
    fn test_improving_checks_consume_cooldown() {
        let mut optimizer = Adam::default_params(0.1);
        let mut scheduler = ReduceOnPlateau::new(0.1, 0, 2, 1e-6);

        scheduler.step(1.0, &mut optimizer);
        scheduler.step(1.0, &mut optimizer); // reduces, enters cooldown
        assert_abs_diff_eq!(optimizer.lr(), 0.01, epsilon = 1e-9);
        scheduler.step(0.9, &mut optimizer); // improving, cooldown 2 -> 1
        scheduler.step(0.8, &mut optimizer); // improving, cooldown 1 -> 0
        scheduler.step(0.9, &mut optimizer); // cooldown over, patience 0 exceeded
        assert_abs_diff_eq!(optimizer.lr(), 0.001, epsilon = 1e-9);
    }
}
