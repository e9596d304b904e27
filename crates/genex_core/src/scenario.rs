//! Preset runs: one model, its initial state, a time horizon and the figure to draw.

use crate::{
    grid::{TimeGrid, Trajectory},
    integrate::{integrate, IntegratorSettings},
    models::{AutoInhibition, BasicExpression, Binding, GeneCircuit, Repressilator},
    plot::{Figure, FigureBuilder, PlotStyle, TimeUnit},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

pub const PRESET_POINTS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScenarioKind {
    BasicExpression,
    AutoInhibition,
    Binding,
    Repressilator,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::BasicExpression,
        ScenarioKind::AutoInhibition,
        ScenarioKind::Binding,
        ScenarioKind::Repressilator,
    ];

    pub fn preset(self) -> Scenario {
        let (circuit, initial, end) = match self {
            ScenarioKind::BasicExpression => (
                Circuit::BasicExpression(BasicExpression::default()),
                vec![0.0, 0.0],
                9_000.0,
            ),
            ScenarioKind::AutoInhibition => (
                Circuit::AutoInhibition(AutoInhibition::default()),
                vec![0.0, 1e-4],
                7_200.0,
            ),
            ScenarioKind::Binding => (
                Circuit::Binding(Binding::default()),
                vec![1.0, 5.0, 0.0],
                100.0,
            ),
            ScenarioKind::Repressilator => (
                Circuit::Repressilator(Repressilator::default()),
                vec![0.1, 0.2, 0.0, 0.0, 0.0, 0.0],
                36_000.0,
            ),
        };
        Scenario {
            circuit,
            initial,
            start: 0.0,
            end,
            points: PRESET_POINTS,
            settings: IntegratorSettings::default(),
        }
    }
}

/// The model of a scenario, with its own parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Circuit {
    BasicExpression(BasicExpression),
    AutoInhibition(AutoInhibition),
    Binding(Binding),
    Repressilator(Repressilator),
}

impl Circuit {
    pub fn as_gene_circuit(&self) -> &dyn GeneCircuit {
        match self {
            Circuit::BasicExpression(m) => m,
            Circuit::AutoInhibition(m) => m,
            Circuit::Binding(m) => m,
            Circuit::Repressilator(m) => m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub circuit: Circuit,
    pub initial: Vec<f64>,
    pub start: f64,
    pub end: f64,
    pub points: usize,
    pub settings: IntegratorSettings,
}

#[derive(Debug, Clone)]
pub struct ScenarioOutput {
    pub trajectory: Trajectory,
    pub figure: Figure,
}

impl Scenario {
    /// Validates the parameters and initial state, integrates over the grid and
    /// builds the figure.
    pub fn run(&self) -> Result<ScenarioOutput> {
        let model = self.circuit.as_gene_circuit();
        let span = info_span!("scenario", model = model.name(), points = self.points);
        let _enter = span.enter();

        model
            .validate()
            .with_context(|| format!("Invalid parameters for {}.", model.name()))?;
        model
            .validate_state(&self.initial)
            .context("Invalid initial state.")?;

        let grid = TimeGrid::linspace(self.start, self.end, self.points)?;
        let trajectory = integrate(model, &self.initial, &grid, &self.settings)
            .with_context(|| format!("Integration of {} failed.", model.name()))?
            .with_species(model.species().iter().copied())?;

        let stats = trajectory.stats();
        info!(
            accepted = stats.accepted_steps,
            rejected = stats.rejected_steps,
            evaluations = stats.evaluations,
            "integration finished"
        );

        let figure = self.figure(&trajectory);
        Ok(ScenarioOutput { trajectory, figure })
    }

    fn figure(&self, trajectory: &Trajectory) -> Figure {
        const CONCENTRATION: &str = "Concentration (M)";

        match &self.circuit {
            Circuit::BasicExpression(_) => FigureBuilder::new(trajectory, TimeUnit::Hours)
                .axes("Time (hours)", CONCENTRATION)
                .column(0, "mRNA concentration (M)")
                .column(1, "Protein concentration (M)")
                .build(),
            Circuit::AutoInhibition(_) => FigureBuilder::new(trajectory, TimeUnit::Hours)
                .axes("Time (hours)", CONCENTRATION)
                .style(PlotStyle::compact())
                .column(0, "mRNA conc.")
                .column(1, "Protein conc.")
                .build(),
            Circuit::Binding(model) => {
                let (a0, b0) = (self.initial[0], self.initial[1]);
                FigureBuilder::new(trajectory, TimeUnit::Seconds)
                    .axes("Time (s)", CONCENTRATION)
                    .column(0, "A conc.")
                    .column(1, "B conc.")
                    .column(2, "C (complex) conc.")
                    .constant(model.hill_bound(a0, b0), "Hill approx. bound conc.")
                    .constant(model.hill_unbound(a0, b0), "Hill approx. unbound conc.")
                    .build()
            }
            Circuit::Repressilator(_) => {
                let mut builder = FigureBuilder::new(trajectory, TimeUnit::Hours)
                    .axes("Time (hours)", CONCENTRATION);
                for gene in 0..crate::models::repressilator::GENES {
                    builder = builder.column(
                        Repressilator::protein_index(gene),
                        format!("Protein{} concentration (M)", gene + 1),
                    );
                }
                builder.build()
            }
        }
    }
}
