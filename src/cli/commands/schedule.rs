//! Schedule command implementation

use crate::cli::logging::log;
use crate::cli::{LogLevel, ScheduleArgs};
use crate::config::{load_config, UnlearnSpec};
use crate::prune::RatioSchedule;

/// One printed row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleRow {
    pub step: usize,
    pub ratio: f32,
    /// Whether a retain step here would attempt pruning.
    pub prunes: bool,
}

/// Sample the schedule of `spec` at `points` evenly spaced steps.
pub fn sample_schedule(
    spec: &UnlearnSpec,
    max_steps: usize,
    points: usize,
) -> crate::Result<Vec<ScheduleRow>> {
    let p = &spec.pruning;
    let schedule =
        RatioSchedule::new(max_steps, p.warmup_iters(), p.cooldown_iters(), p.init_ratio(), p.ratio())?
            .with_shape(p.ramp());

    let points = points.max(2);
    let mut rows: Vec<ScheduleRow> = (0..points)
        .map(|i| {
            let step = i * max_steps / (points - 1);
            let ratio = schedule.ratio_at(step);
            let prunes = step % p.prune_freq().max(1) == 0 && ratio > p.init_ratio() && ratio < p.ratio();
            ScheduleRow { step, ratio, prunes }
        })
        .collect();
    rows.dedup_by_key(|row| row.step);
    Ok(rows)
}

pub fn run_schedule(args: ScheduleArgs, level: LogLevel) -> Result<(), String> {
    let spec = load_config(&args.config).map_err(|e| format!("Config error: {e}"))?;
    let max_steps = match args.max_steps {
        Some(steps) => steps,
        None => {
            spec.training
                .plan(spec.model.forget_batches, spec.model.retain_batches)
                .map_err(|e| format!("Config error: {e}"))?
                .max_steps
        }
    };

    let rows = sample_schedule(&spec, max_steps, args.points).map_err(|e| e.to_string())?;

    log(level, LogLevel::Normal, &format!("Schedule over {max_steps} steps:"));
    log(level, LogLevel::Normal, "    step   ratio  prune");
    for row in rows {
        let marker = if row.prunes { "*" } else { "" };
        log(level, LogLevel::Normal, &format!("{:>8}  {:>6.4}  {marker}", row.step, row.ratio));
    }
    Ok(())
}
