//! Validate command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, ValidateArgs};
use crate::config::{load_config, UnlearnSpec};

/// Format pruning configuration as a string
pub fn format_pruning_info(spec: &UnlearnSpec) -> String {
    let p = &spec.pruning;
    let mut lines = vec![
        format!("  Ratio: {} → {}", p.init_ratio(), p.ratio()),
        format!("  Warmup / cooldown: {} / {}", p.warmup_iters(), p.cooldown_iters()),
        format!("  Ramp: {:?}", p.ramp()),
        format!("  Prune every: {} steps", p.prune_freq()),
        format!("  Metric: {}", p.prune_metric()),
        format!("  Granularity: {:?}", p.granularity()),
        format!("  Unlearning threshold: {}", p.unlearning_threshold()),
        format!("  Min retain performance: {}", p.min_retain_performance()),
    ];
    if let Some(clip) = p.outlier_clip() {
        lines.push(format!("  Outlier clip: {clip}×"));
    }
    lines.join("\n")
}

/// Format training configuration as a string
pub fn format_training_info(spec: &UnlearnSpec) -> String {
    let t = &spec.training;
    let length = match t.max_steps {
        Some(steps) => format!("  Max steps: {steps}"),
        None => format!("  Epochs: {}", t.epochs),
    };
    format!("{length}\n  Gradient accumulation: {}", t.gradient_accumulation_steps)
}

/// Format synthetic model configuration as a string
pub fn format_model_info(spec: &UnlearnSpec) -> String {
    let m = &spec.model;
    format!(
        "  Groups: {} × [{}, {}]\n  LoRA rank: {}\n  Batches: {} forget / {} retain",
        m.groups, m.d_out, m.d_in, m.lora_rank, m.forget_batches, m.retain_batches
    )
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(level, LogLevel::Normal, &format!("Validating config: {}", args.config.display()));

    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;

    log(level, LogLevel::Normal, "Configuration is valid");

    if args.detailed {
        log(level, LogLevel::Normal, "\nPruning:");
        log(level, LogLevel::Normal, &format_pruning_info(&spec));
        log(level, LogLevel::Normal, "\nTraining:");
        log(level, LogLevel::Normal, &format_training_info(&spec));
        log(level, LogLevel::Normal, "\nModel:");
        log(level, LogLevel::Normal, &format_model_info(&spec));
    }

    Ok(())
}
