use crate::error::{IntegrationError, ParameterError};
use serde::{Deserialize, Serialize};

/// Evenly spaced, strictly increasing sample times including both endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeGrid {
    times: Vec<f64>,
}

impl TimeGrid {
    /// Builds `count` evenly spaced points from `t0` to `t1`.
    pub fn linspace(t0: f64, t1: f64, count: usize) -> Result<Self, IntegrationError> {
        if !t0.is_finite() || !t1.is_finite() {
            return Err(IntegrationError::InvalidGrid(format!(
                "endpoints must be finite (t0 = {t0}, t1 = {t1})"
            )));
        }
        if t1 <= t0 {
            return Err(IntegrationError::InvalidGrid(format!(
                "final time {t1} must exceed initial time {t0}"
            )));
        }
        if count < 2 {
            return Err(IntegrationError::InvalidGrid(format!(
                "at least two points are required, got {count}"
            )));
        }

        let spacing = (t1 - t0) / (count - 1) as f64;
        let mut times: Vec<f64> = (0..count).map(|i| t0 + spacing * i as f64).collect();
        // Pin the last point so the horizon is hit exactly.
        times[count - 1] = t1;
        Ok(Self { times })
    }

    /// Wraps explicit sample times, which must be finite and strictly increasing.
    pub fn from_times(times: Vec<f64>) -> Result<Self, IntegrationError> {
        if times.len() < 2 {
            return Err(IntegrationError::InvalidGrid(format!(
                "at least two points are required, got {}",
                times.len()
            )));
        }
        if let Some(bad) = times.iter().find(|t| !t.is_finite()) {
            return Err(IntegrationError::InvalidGrid(format!(
                "time {bad} is not finite"
            )));
        }
        if let Some(idx) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(IntegrationError::InvalidGrid(format!(
                "times must be strictly increasing (index {} -> {})",
                idx,
                idx + 1
            )));
        }
        Ok(Self { times })
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.times[0]
    }

    pub fn end(&self) -> f64 {
        self.times[self.times.len() - 1]
    }
}

/// Counters reported by the integration driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    pub evaluations: usize,
}

/// Integrated solution: one row per grid time, one column per species.
///
/// Stored row-major; the table is immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    times: Vec<f64>,
    species: Vec<String>,
    dimension: usize,
    values: Vec<f64>,
    stats: IntegrationStats,
}

impl Trajectory {
    pub(crate) fn new(
        times: Vec<f64>,
        species: Vec<String>,
        dimension: usize,
        values: Vec<f64>,
        stats: IntegrationStats,
    ) -> Self {
        debug_assert_eq!(values.len(), times.len() * dimension);
        debug_assert!(species.is_empty() || species.len() == dimension);
        Self {
            times,
            species,
            dimension,
            values,
            stats,
        }
    }

    /// Attaches species labels, one per column.
    pub fn with_species<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Result<Self, ParameterError> {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.len() != self.dimension {
            return Err(ParameterError::SpeciesCountMismatch {
                expected: self.dimension,
                got: names.len(),
            });
        }
        self.species = names;
        Ok(self)
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn species(&self) -> &[String] {
        &self.species
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of rows (grid points).
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn stats(&self) -> IntegrationStats {
        self.stats
    }

    /// Raw row-major table.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row(&self, index: usize) -> &[f64] {
        let start = index * self.dimension;
        &self.values[start..start + self.dimension]
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.dimension + column]
    }

    pub fn column(&self, column: usize) -> Vec<f64> {
        self.rows().map(|row| row[column]).collect()
    }

    /// Column lookup by species label.
    pub fn column_by_name(&self, name: &str) -> Option<Vec<f64>> {
        self.species
            .iter()
            .position(|s| s == name)
            .map(|idx| self.column(idx))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.dimension)
    }

    pub fn initial_state(&self) -> &[f64] {
        self.row(0)
    }

    pub fn final_state(&self) -> &[f64] {
        self.row(self.len() - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_includes_both_endpoints() {
        let grid = TimeGrid::linspace(0.0, 36000.0, 100_000).expect("valid grid");
        assert_eq!(grid.len(), 100_000);
        assert_eq!(grid.start(), 0.0);
        assert_eq!(grid.end(), 36000.0);
        let spacing = 36000.0 / 99_999.0;
        assert!((grid.times()[1] - spacing).abs() < 1e-12);
        assert!(grid.times().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn linspace_rejects_degenerate_requests() {
        assert!(matches!(
            TimeGrid::linspace(0.0, 1.0, 1),
            Err(IntegrationError::InvalidGrid(_))
        ));
        assert!(matches!(
            TimeGrid::linspace(5.0, 5.0, 10),
            Err(IntegrationError::InvalidGrid(_))
        ));
        assert!(matches!(
            TimeGrid::linspace(0.0, f64::INFINITY, 10),
            Err(IntegrationError::InvalidGrid(_))
        ));
    }

    #[test]
    fn from_times_requires_strict_increase() {
        assert!(TimeGrid::from_times(vec![0.0, 1.0, 3.0]).is_ok());
        let err = TimeGrid::from_times(vec![0.0, 2.0, 2.0]).unwrap_err();
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn trajectory_accessors_are_row_major() {
        let traj = Trajectory::new(
            vec![0.0, 1.0, 2.0],
            Vec::new(),
            2,
            vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0],
            IntegrationStats::default(),
        )
        .with_species(["mRNA", "Protein"])
        .unwrap();

        assert_eq!(traj.len(), 3);
        assert_eq!(traj.row(1), &[2.0, 20.0]);
        assert_eq!(traj.value(2, 1), 30.0);
        assert_eq!(traj.column(0), vec![1.0, 2.0, 3.0]);
        assert_eq!(traj.column_by_name("Protein"), Some(vec![10.0, 20.0, 30.0]));
        assert_eq!(traj.column_by_name("Ligand"), None);
        assert_eq!(traj.final_state(), &[3.0, 30.0]);
    }

    #[test]
    fn species_labels_must_cover_every_column() {
        let traj = Trajectory::new(
            vec![0.0, 1.0],
            Vec::new(),
            3,
            vec![0.0; 6],
            IntegrationStats::default(),
        );
        assert_eq!(
            traj.with_species(["A", "B"]).unwrap_err(),
            ParameterError::SpeciesCountMismatch {
                expected: 3,
                got: 2
            }
        );
    }
}
