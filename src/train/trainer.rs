//! Epoch orchestration
//!
//! The trainer drives epochs 1..=N on a single thread. Every epoch runs a
//! train phase; every `validation_interval`-th epoch also runs a validation
//! phase, after which the scheduler sees the validation loss and a
//! checkpoint is written if (and only if) that loss beats the best seen so
//! far.

use crate::backend::NumericBackend;
use crate::checkpoint::Checkpoint;
use crate::error::Result;
use crate::optim::{Adam, Optimizer, ReduceOnPlateau};
use crate::train::batch::{ensure_channel_axis, BatchProvider};
use crate::train::config::TrainConfig;
use crate::train::loss::MixedLoss;
use crate::train::meter::Meter;
use crate::train::model::SegmentationModel;
use crate::train::session::{EpochRecord, Phase, TrainingSession};
use chrono::Local;
use std::time::Instant;

/// Result of a completed training run
#[derive(Debug, Clone)]
pub struct TrainResult {
    /// Number of epochs run
    pub epochs_run: usize,
    /// Final training loss
    pub final_loss: f32,
    /// Best validation loss (infinite if validation never ran)
    pub best_loss: f32,
    /// Number of checkpoints written
    pub checkpoints_written: usize,
    /// Total wall time in seconds
    pub elapsed_secs: f64,
}

/// Orchestrates training and validation of a segmentation model
pub struct Trainer<M: SegmentationModel, P: BatchProvider> {
    model: M,
    provider: P,
    optimizer: Box<dyn Optimizer>,
    scheduler: ReduceOnPlateau,
    loss: MixedLoss,
    backend: Box<dyn NumericBackend>,
    config: TrainConfig,
    session: TrainingSession,
    checkpoints_written: usize,
}

impl<M: SegmentationModel, P: BatchProvider> Trainer<M, P> {
    /// Build a trainer with Adam and the plateau scheduler
    pub fn new(model: M, mut provider: P, config: TrainConfig) -> Result<Self> {
        config.validate()?;
        provider.configure(config.num_workers, config.batch_size);
        let optimizer = Box::new(Adam::default_params(config.learning_rate));
        let backend = config.device.backend();
        let loss = MixedLoss::new(config.loss_alpha, config.loss_gamma);
        Ok(Self {
            model,
            provider,
            optimizer,
            scheduler: ReduceOnPlateau::default_params(),
            loss,
            backend,
            config,
            session: TrainingSession::new(),
            checkpoints_written: 0,
        })
    }

    /// Replace the optimizer (must be done before `run`)
    pub fn with_optimizer(mut self, optimizer: Box<dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    /// Replace the scheduler (must be done before `run`)
    pub fn with_scheduler(mut self, scheduler: ReduceOnPlateau) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Session state: best loss and per-phase histories
    pub fn session(&self) -> &TrainingSession {
        &self.session
    }

    /// Current learning rate
    pub fn lr(&self) -> f32 {
        self.optimizer.lr()
    }

    /// Access the model
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run one phase of one epoch; returns the mean batch loss
    fn run_phase(&mut self, epoch: usize, phase: Phase) -> Result<f32> {
        let started = Instant::now();
        println!(
            "Starting epoch {} | phase {} | {}",
            epoch,
            phase,
            Local::now().format("%I:%M:%S %p")
        );

        self.model.set_training(phase == Phase::Train);
        let mut meter = Meter::new(phase, epoch, &self.config.threshold_grid);
        let params = self.model.parameters();

        let mut running_loss = 0.0f64;
        let mut batch_count = 0usize;

        for batch in self.provider.batches(phase) {
            let masks = ensure_channel_axis(batch.masks);
            let logits = self.model.forward(&batch.images)?;
            let loss = self.loss.forward(self.backend.as_ref(), &logits, &masks)?;

            if phase == Phase::Train {
                // Atomic per-batch protocol: reset, accumulate, apply.
                // Gradients never survive into the next batch.
                self.optimizer.zero_grad(&params);
                let grad = self
                    .loss
                    .grad_logits(self.backend.as_ref(), &logits, &masks)?;
                self.model.backward(&batch.images, &grad)?;
                self.optimizer.step(&params);
            }

            running_loss += loss as f64;
            batch_count += 1;
            meter.update(self.backend.as_ref(), &masks, &logits)?;
        }

        let epoch_loss = if batch_count > 0 {
            (running_loss / batch_count as f64) as f32
        } else {
            0.0
        };

        let scores = meter.summarize(epoch_loss, started);
        self.session.record(
            phase,
            EpochRecord {
                loss: epoch_loss,
                dice: scores.dice,
                iou: scores.iou,
                accuracy: scores.accuracy,
            },
        );

        self.backend.release_cache();
        Ok(epoch_loss)
    }

    fn save_checkpoint(&mut self, epoch: usize) -> Result<()> {
        let checkpoint = Checkpoint {
            epoch,
            best_loss: self.session.best_loss(),
            model_state: self.model.state_dict(),
            optimizer_state: self.optimizer.state_dict(),
        };
        checkpoint.save(&self.config.checkpoint_path)?;
        self.checkpoints_written += 1;
        Ok(())
    }

    /// Run the configured number of epochs
    ///
    /// A failed checkpoint write aborts the run; there are no retries.
    pub fn run(&mut self) -> Result<TrainResult> {
        let started = Instant::now();
        let mut final_loss = 0.0;

        for epoch in 1..=self.config.num_epochs {
            self.session.begin_epoch(epoch);
            final_loss = self.run_phase(epoch, Phase::Train)?;

            if epoch % self.config.validation_interval == 0 {
                let val_loss = self.run_phase(epoch, Phase::Val)?;
                self.scheduler.step(val_loss, self.optimizer.as_mut());

                if self.session.observe_val_loss(val_loss) {
                    println!("New best validation loss {val_loss:.4}, saving checkpoint");
                    self.save_checkpoint(epoch)?;
                }
            }
        }

        Ok(TrainResult {
            epochs_run: self.config.num_epochs,
            final_loss,
            best_loss: self.session.best_loss(),
            checkpoints_written: self.checkpoints_written,
            elapsed_secs: started.elapsed().as_secs_f64(),
        })
    }
}
