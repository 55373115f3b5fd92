//! Simulate command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, SimulateArgs};
use crate::config::load_config;
use crate::prune::{DataStream, EngineCheckpoint, Granularity, UnlearningPruner};
use crate::train::{SyntheticBackend, TrainingBackend, UnlearningTrainer};

/// What a simulated run achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSummary {
    /// Optimizer and sensitivity steps taken.
    pub steps: usize,
    /// Final sparsity.
    pub achieved_ratio: f32,
    /// Pruning decisions that zeroed at least one unit.
    pub pruning_events: usize,
    /// Units zeroed during this run.
    pub units_pruned: usize,
    /// Pruned channels that were forget rows, if pruning is per channel.
    pub forget_precision: Option<f32>,
    /// Forget-row MSE before training.
    pub forget_loss_before: f32,
    /// Forget-row MSE after training.
    pub forget_loss_after: f32,
    /// Retain-row MSE before training.
    pub retain_loss_before: f32,
    /// Retain-row MSE after training.
    pub retain_loss_after: f32,
    /// Retain performance relative to the starting model, capped at 1.
    pub retain_performance: f32,
    /// Whether `retain_performance` meets `min_retain_performance`.
    pub retain_ok: bool,
}

/// Fraction of pruned channels that fall on forget rows.
fn forget_precision(backend: &SyntheticBackend, pruner: &UnlearningPruner) -> Option<f32> {
    let state = pruner.pruning_state();
    if state.granularity() != Granularity::Channel || state.pruned_units() == 0 {
        return None;
    }
    let hits: usize = state
        .iter()
        .filter_map(|(name, mask)| {
            let rows = backend.forget_rows(name)?;
            Some(mask.pruned_indices().filter(|&unit| rows.get(unit).copied().unwrap_or(false)).count())
        })
        .sum();
    Some(hits as f32 / state.pruned_units() as f32)
}

pub fn run_simulate(args: SimulateArgs, level: LogLevel) -> Result<SimulationSummary, String> {
    let mut spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    if let Some(seed) = args.seed {
        spec.model.seed = seed;
    }

    let mut backend = SyntheticBackend::new(spec.model.clone()).map_err(|e| e.to_string())?;
    let mut pruner =
        UnlearningPruner::new(spec.pruning.clone(), backend.model()).map_err(|e| e.to_string())?;
    if let Some(path) = &args.warm_start {
        let checkpoint = EngineCheckpoint::load(path).map_err(|e| e.to_string())?;
        checkpoint.restore(&mut pruner, backend.model_mut()).map_err(|e| e.to_string())?;
        log(level, LogLevel::Verbose, &format!("Warm start from {} (step counter starts at 0)", path.display()));
    }

    let forget_loss_before = backend.evaluate(DataStream::Forget);
    let retain_loss_before = backend.evaluate(DataStream::Retain);

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Simulating {} groups of [{}, {}] (seed {})",
            spec.model.groups, spec.model.d_out, spec.model.d_in, spec.model.seed
        ),
    );

    let mut trainer = UnlearningTrainer::new(pruner, spec.training.clone());
    let output = trainer.train(&mut backend).map_err(|e| format!("Training failed: {e}"))?;

    let forget_loss_after = backend.evaluate(DataStream::Forget);
    let retain_loss_after = backend.evaluate(DataStream::Retain);
    let retain_performance = if retain_loss_after <= retain_loss_before {
        1.0
    } else {
        (retain_loss_before + f32::EPSILON) / (retain_loss_after + f32::EPSILON)
    };

    let history = trainer.history();
    let summary = SimulationSummary {
        steps: output.global_step,
        achieved_ratio: output.achieved_ratio,
        pruning_events: history.pruning.iter().filter(|d| !d.is_noop()).count(),
        units_pruned: history.units_pruned(),
        forget_precision: forget_precision(&backend, trainer.pruner()),
        forget_loss_before,
        forget_loss_after,
        retain_loss_before,
        retain_loss_after,
        retain_performance,
        retain_ok: trainer.retain_performance_ok(retain_performance),
    };

    if let Some(path) = &args.checkpoint {
        EngineCheckpoint::capture(trainer.pruner()).save(path).map_err(|e| e.to_string())?;
        log(level, LogLevel::Normal, &format!("Engine checkpoint written to {}", path.display()));
    }

    log(level, LogLevel::Normal, &format!("Steps: {}", summary.steps));
    log(level, LogLevel::Normal, &format!("Achieved sparsity: {:.4}", summary.achieved_ratio));
    log(
        level,
        LogLevel::Normal,
        &format!("Pruning events: {} ({} units)", summary.pruning_events, summary.units_pruned),
    );
    if let Some(precision) = summary.forget_precision {
        log(level, LogLevel::Verbose, &format!("Pruned channels on forget rows: {:.1}%", precision * 100.0));
    }
    log(
        level,
        LogLevel::Normal,
        &format!("Forget loss: {:.4} → {:.4}", summary.forget_loss_before, summary.forget_loss_after),
    );
    log(
        level,
        LogLevel::Normal,
        &format!("Retain loss: {:.4} → {:.4}", summary.retain_loss_before, summary.retain_loss_after),
    );
    let verdict = if summary.retain_ok { "ok" } else { "BELOW MINIMUM" };
    log(
        level,
        LogLevel::Normal,
        &format!("Retain performance: {:.3} ({verdict})", summary.retain_performance),
    );
    if history.filtered_losses > 0 {
        log(level, LogLevel::Verbose, &format!("Filtered {} non-finite losses", history.filtered_losses));
    }

    Ok(summary)
}
