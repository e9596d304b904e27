//! Figure descriptions for trajectory plots.
//!
//! Rendering is left to whatever consumes the serialized [`Figure`]; this module
//! only decides which columns are drawn, how the time axis is scaled and which
//! cosmetic settings apply.

use crate::grid::Trajectory;
use serde::{Deserialize, Serialize};

/// Cosmetic settings applied once per figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotStyle {
    pub axes_label_size: f64,
    pub font_size: f64,
    pub legend_font_size: f64,
    pub xtick_label_size: f64,
    pub ytick_label_size: f64,
    /// Width and height in inches.
    pub figure_size: [f64; 2],
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            axes_label_size: 16.0,
            font_size: 20.0,
            legend_font_size: 13.0,
            xtick_label_size: 10.0,
            ytick_label_size: 10.0,
            figure_size: [9.0, 9.0],
        }
    }
}

impl PlotStyle {
    /// Smaller fonts on an 8×8 canvas.
    pub fn compact() -> Self {
        Self {
            axes_label_size: 10.0,
            font_size: 15.0,
            legend_font_size: 10.0,
            xtick_label_size: 8.0,
            ytick_label_size: 8.0,
            figure_size: [8.0, 8.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Hours,
}

impl TimeUnit {
    pub fn seconds_per_unit(self) -> f64 {
        match self {
            TimeUnit::Seconds => 1.0,
            TimeUnit::Hours => 3600.0,
        }
    }

    pub fn rescale(self, seconds: &[f64]) -> Vec<f64> {
        let factor = self.seconds_per_unit();
        seconds.iter().map(|t| t / factor).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub grid: bool,
    pub legend: bool,
    pub style: PlotStyle,
    pub series: Vec<Series>,
}

/// Builds a [`Figure`] over one trajectory's time axis.
pub struct FigureBuilder<'a> {
    trajectory: &'a Trajectory,
    x: Vec<f64>,
    figure: Figure,
}

impl<'a> FigureBuilder<'a> {
    pub fn new(trajectory: &'a Trajectory, unit: TimeUnit) -> Self {
        Self {
            trajectory,
            x: unit.rescale(trajectory.times()),
            figure: Figure {
                title: "Variation of concentration with time".to_string(),
                x_label: String::new(),
                y_label: String::new(),
                grid: true,
                legend: true,
                style: PlotStyle::default(),
                series: Vec::new(),
            },
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.figure.title = title.into();
        self
    }

    pub fn axes(mut self, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        self.figure.x_label = x_label.into();
        self.figure.y_label = y_label.into();
        self
    }

    pub fn style(mut self, style: PlotStyle) -> Self {
        self.figure.style = style;
        self
    }

    /// Draws trajectory column `column`.
    pub fn column(mut self, column: usize, label: impl Into<String>) -> Self {
        self.figure.series.push(Series {
            label: label.into(),
            x: self.x.clone(),
            y: self.trajectory.column(column),
        });
        self
    }

    /// Draws a horizontal reference line across the whole time axis.
    pub fn constant(mut self, value: f64, label: impl Into<String>) -> Self {
        self.figure.series.push(Series {
            label: label.into(),
            x: self.x.clone(),
            y: vec![value; self.x.len()],
        });
        self
    }

    pub fn build(self) -> Figure {
        self.figure
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{IntegrationStats, Trajectory};

    fn table() -> Trajectory {
        Trajectory::new(
            vec![0.0, 3600.0, 7200.0],
            Vec::new(),
            2,
            vec![0.0, 0.0, 0.5, 0.2, 0.8, 0.9],
            IntegrationStats::default(),
        )
    }

    #[test]
    fn hours_axis_is_rescaled() {
        let traj = table();
        let figure = FigureBuilder::new(&traj, TimeUnit::Hours)
            .axes("Time (hours)", "Concentration (M)")
            .column(1, "Protein conc.")
            .build();
        assert_eq!(figure.series.len(), 1);
        assert_eq!(figure.series[0].x, vec![0.0, 1.0, 2.0]);
        assert_eq!(figure.series[0].y, vec![0.0, 0.2, 0.9]);
        assert_eq!(figure.x_label, "Time (hours)");
        assert_eq!(figure.style, PlotStyle::default());
    }

    #[test]
    fn constant_lines_span_the_axis() {
        let traj = table();
        let figure = FigureBuilder::new(&traj, TimeUnit::Seconds)
            .style(PlotStyle::compact())
            .constant(0.75, "Hill Approx conc.")
            .build();
        assert_eq!(figure.series[0].x, vec![0.0, 3600.0, 7200.0]);
        assert_eq!(figure.series[0].y, vec![0.75; 3]);
        assert_eq!(figure.style.figure_size, [8.0, 8.0]);
    }

    #[test]
    fn figure_serializes_with_style_keys() {
        let traj = table();
        let figure = FigureBuilder::new(&traj, TimeUnit::Hours).column(0, "mRNA").build();
        let json = serde_json::to_value(&figure).unwrap();
        assert_eq!(json["style"]["legend_font_size"], 13.0);
        assert_eq!(json["series"][0]["label"], "mRNA");
        assert_eq!(json["grid"], true);
    }
}
