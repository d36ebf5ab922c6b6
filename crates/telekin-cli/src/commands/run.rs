use crate::cli::RunArgs;
use crate::config::PartialSetupConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use telekin::core::models::fragment::ReactionChannel;
use telekin::core::tables::masses::{BUILTIN, MassTable};
use telekin::engine::error::EngineError;
use telekin::engine::state::{CurveSample, FragmentResult};
use telekin::engine::worker::{Job, SweepWorker, WorkerMessage};
use telekin::workflows::telescope::TelescopeResult;
use tracing::{debug, error, info, warn};

pub async fn run(args: RunArgs, quiet: bool) -> Result<()> {
    let masses = Arc::new(load_masses(args.masses.as_deref())?);
    let jobs = build_jobs(&args)?;
    let names: Vec<String> = jobs.iter().map(|job| job.name.clone()).collect();
    info!(jobs = jobs.len(), "Setups resolved");

    let worker = SweepWorker::spawn(jobs, masses)?;
    let token = worker.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received; cancelling after the current sample.");
            token.cancel();
        }
    });

    let progress = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let curve_csv = args.curve_csv.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        collect(worker, &names, &progress, curve_csv.as_deref())
    })
    .await
    .map_err(|e| CliError::Other(anyhow::anyhow!("Sweep consumer task failed: {}", e)))?;

    interrupt.abort();
    outcome
}

fn load_masses(path: Option<&Path>) -> Result<MassTable> {
    match path {
        None => Ok(BUILTIN.clone()),
        Some(path) => {
            let table = MassTable::with_overlay_csv(path).map_err(|e| CliError::FileParsing {
                path: path.to_path_buf(),
                source: e.into(),
            })?;
            info!(path = ?path, entries = table.overlay_len(), "Loaded mass overlay");
            Ok(table)
        }
    }
}

fn build_jobs(args: &RunArgs) -> Result<Vec<Job>> {
    if args.configs.is_empty() {
        info!("No setup file given; using the built-in default setup.");
        let resolved = PartialSetupConfig::default().merge_with_cli(args)?;
        return Ok(vec![Job {
            name: resolved.name.unwrap_or_else(|| "default".to_string()),
            setup: resolved.setup,
            config: resolved.config,
        }]);
    }

    args.configs
        .iter()
        .map(|path| {
            let resolved = PartialSetupConfig::from_file(path)?.merge_with_cli(args)?;
            let name = resolved.name.unwrap_or_else(|| job_name_from_path(path));
            Ok(Job {
                name,
                setup: resolved.setup,
                config: resolved.config,
            })
        })
        .collect()
}

fn job_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// One line of the curve CSV; gap rows leave the energy columns empty.
#[derive(Debug, Serialize)]
struct CurveRow<'a> {
    job: &'a str,
    channel: String,
    excitation: f64,
    ejectile_energy: Option<f64>,
    delta_e: Option<f64>,
    e: Option<f64>,
    total: Option<f64>,
    stopped_in: Option<&'static str>,
    punch_through: Option<bool>,
    gap: Option<String>,
}

impl<'a> CurveRow<'a> {
    fn new(job: &'a str, channel: &ReactionChannel, sample: &CurveSample) -> Self {
        let point = sample.point();
        Self {
            job,
            channel: channel.label(),
            excitation: sample.excitation(),
            ejectile_energy: point.map(|p| p.ejectile_energy),
            delta_e: point.map(|p| p.delta_e),
            e: point.map(|p| p.e),
            total: point.map(|p| p.total()),
            stopped_in: point.and_then(|p| p.stopped_in).map(|role| role.name()),
            punch_through: point.map(|p| p.punch_through),
            gap: match sample {
                CurveSample::Gap(gap) => Some(gap.reason.to_string()),
                CurveSample::Point(_) => None,
            },
        }
    }
}

/// Drains the worker, rendering progress and writing results as they arrive.
fn collect(
    worker: SweepWorker,
    names: &[String],
    progress: &CliProgressHandler,
    curve_csv: Option<&Path>,
) -> Result<()> {
    let mut writer = curve_csv.map(csv::Writer::from_path).transpose()?;
    let callback = progress.get_callback();
    let name_of = |job: usize| names.get(job).map(String::as_str).unwrap_or("?");

    let mut failed = 0;
    let mut cancelled = false;
    for message in worker.messages() {
        match message {
            WorkerMessage::JobStarted { job, name } => {
                info!(job, name = %name, "Job started");
            }
            WorkerMessage::Progress(event) => callback(event),
            WorkerMessage::SweepStarted {
                channel,
                total_samples,
                ..
            } => {
                debug!(channel = %channel, total_samples, "Sweep started");
            }
            WorkerMessage::Sample {
                job,
                channel,
                sample,
            } => {
                if let Some(writer) = writer.as_mut() {
                    writer.serialize(CurveRow::new(name_of(job), &channel, &sample))?;
                }
            }
            WorkerMessage::SweepFinished { result, .. } => {
                debug!(
                    channel = %result.channel,
                    points = result.points().count(),
                    "Sweep result received"
                );
            }
            WorkerMessage::JobFinished { job, result } => match result {
                Ok(result) => {
                    progress.finish_and_clear();
                    println!("{}", format_summary(name_of(job), &result));
                }
                Err(EngineError::Cancelled) => cancelled = true,
                Err(e) => {
                    failed += 1;
                    error!(job, error = %e, "Job failed");
                    progress.println(format!("✗ {}: {}", name_of(job), e));
                }
            },
            WorkerMessage::Finished => break,
        }
    }
    progress.finish_and_clear();

    if let Some(mut writer) = writer {
        writer.flush()?;
        if let Some(path) = curve_csv {
            println!("Curve samples written to: {}", path.display());
        }
    }
    worker.join()?;

    if cancelled {
        return Err(EngineError::Cancelled.into());
    }
    if failed > 0 {
        return Err(CliError::JobsFailed {
            failed,
            total: names.len(),
        });
    }
    Ok(())
}

fn format_summary(name: &str, result: &TelescopeResult) -> String {
    let mut lines = vec![
        format!("== {} ==", name),
        format!(
            "Beam at vertex: {:.3} MeV (σ {:.1} keV); angle {:.1}°, incidence {:.1}°",
            result.vertex.energy,
            result.vertex.variance.sqrt() * 1000.0,
            result.geometry.angle,
            result.geometry.incidence
        ),
    ];
    for fragment in &result.fragments {
        lines.extend(fragment_lines(fragment));
    }
    lines.join("\n")
}

fn fragment_lines(result: &FragmentResult) -> Vec<String> {
    let mut lines = vec![format!(
        "{}: {} points, {} gaps",
        result.channel.label(),
        result.points().count(),
        result.gaps().count()
    )];

    match &result.fit {
        Ok(fit) => {
            let [c0, c1, c2] = fit.coefficients;
            lines.push(format!(
                "  fit Ex = {:.4} + {:.4}·T + {:.6}·T² (rms {:.3} MeV over {} points)",
                c0, c1, c2, fit.rms_residual, fit.points
            ));
        }
        Err(e) => lines.push(format!("  fit unavailable: {}", e)),
    }

    for scatter in &result.scatter {
        match scatter {
            Ok(point) => {
                let sample = &point.sample;
                let sigma_ex = point
                    .sigma_excitation
                    .map(|s| format!("{:.3}", s))
                    .unwrap_or_else(|| "n/a".to_string());
                lines.push(format!(
                    "  scatter Ex={:.2}: E={:.3} ± {:.3}  dE={:.3} ± {:.3}  σEx={} MeV",
                    sample.excitation,
                    sample.e,
                    point.sigma_e,
                    sample.delta_e,
                    point.sigma_delta_e,
                    sigma_ex
                ));
            }
            Err(gap) => lines.push(format!(
                "  scatter Ex={:.2}: {}",
                gap.excitation, gap.reason
            )),
        }
    }
    lines
}
