//! Shared plumbing for the scenario binaries: logging setup, the per-model summary
//! and the JSON report written to stdout.

use anyhow::{Context, Result};
use genex_core::{
    analysis::{conservation_drift, min_concentration, OscillationSummary},
    grid::IntegrationStats,
    models::Repressilator,
    plot::Figure,
    scenario::{Circuit, ScenarioKind, ScenarioOutput},
};
use serde::Serialize;
use std::io::Write;
use std::sync::Once;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "GENEX_LOG";

/// Peak detection threshold for repressilator proteins (M).
const PEAK_THRESHOLD: f64 = 0.01;

static TRACING: Once = Once::new();

/// Installs the stderr subscriber, filtered by `GENEX_LOG` (default `info`).
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
        // Another subscriber may already be installed by an embedding program.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[derive(Debug, Serialize)]
pub struct Report<'a> {
    pub scenario: ScenarioKind,
    pub stats: IntegrationStats,
    pub figure: &'a Figure,
}

/// Runs a preset, logs what it found and writes the figure report to stdout.
pub fn run_and_report(kind: ScenarioKind) -> Result<()> {
    init_tracing();
    let scenario = kind.preset();
    let output = scenario.run()?;
    summarize(&scenario.circuit, &scenario.initial, &output);

    let report = Report {
        scenario: kind,
        stats: output.trajectory.stats(),
        figure: &output.figure,
    };
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer(&mut handle, &report).context("Failed to write figure report.")?;
    writeln!(handle).context("Failed to write figure report.")?;
    Ok(())
}

/// Logs the quantities each model is run for.
pub fn summarize(circuit: &Circuit, initial: &[f64], output: &ScenarioOutput) {
    let traj = &output.trajectory;
    let final_state = traj.final_state();

    let (min, row, column) = min_concentration(traj);
    if min < 0.0 {
        warn!(min, t = traj.times()[row], column, "negative concentration in trajectory");
    }

    match circuit {
        Circuit::BasicExpression(model) => {
            let [mrna, protein] = model.steady_state();
            info!(
                mrna = final_state[0],
                protein = final_state[1],
                steady_mrna = mrna,
                steady_protein = protein,
                "final concentrations"
            );
        }
        Circuit::AutoInhibition(model) => match model.steady_state_protein() {
            Ok(steady) => info!(
                protein = final_state[1],
                steady_protein = steady,
                residual = model.hill_balance_residual(final_state[1]),
                "hill balance"
            ),
            Err(err) => warn!(%err, "no steady state for these parameters"),
        },
        Circuit::Binding(model) => {
            let drift = conservation_drift(traj, &[1.0, 0.0, 1.0])
                .max(conservation_drift(traj, &[0.0, 1.0, 1.0]));
            info!(
                a = final_state[0],
                b = final_state[1],
                c = final_state[2],
                hill_bound = model.hill_bound(initial[0], initial[1]),
                conservation_drift = drift,
                "binding at end of run"
            );
        }
        Circuit::Repressilator(_) => {
            let seconds_per_hour = 3600.0;
            for gene in 0..genex_core::models::repressilator::GENES {
                let series = traj.column(Repressilator::protein_index(gene));
                let Some(summary) =
                    OscillationSummary::from_series(traj.times(), &series, PEAK_THRESHOLD)
                else {
                    continue;
                };
                info!(
                    protein = gene + 1,
                    peaks = summary.peak_count(),
                    period_hours = summary.mean_period.map(|p| p / seconds_per_hour),
                    last_amplitude = summary.last_amplitude,
                    sustained = summary.is_sustained(2, PEAK_THRESHOLD),
                    "oscillation"
                );
            }
        }
    }
}
