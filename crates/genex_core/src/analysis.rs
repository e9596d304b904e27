use crate::grid::Trajectory;
use rustfft::{num_complex::Complex, FftPlanner};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExtremumKind {
    Peak,
    Trough,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Extremum {
    pub kind: ExtremumKind,
    pub index: usize,
    pub value: f64,
}

/// Alternating peaks and troughs of `series`.
///
/// A peak is only confirmed once the series has fallen `threshold` below it, and a
/// trough once it has risen `threshold` above it, so ripples smaller than the
/// threshold and the open ends of the series are ignored.
pub fn find_extrema(series: &[f64], threshold: f64) -> Vec<Extremum> {
    #[derive(Clone, Copy)]
    enum Trend {
        Unknown,
        Rising,
        Falling,
    }

    let mut extrema = Vec::new();
    let Some(&first) = series.first() else {
        return extrema;
    };

    let mut trend = Trend::Unknown;
    let mut anchor = first;
    let mut anchor_index = 0usize;
    // Unknown trend tracks both sides until one moves by the threshold.
    let (mut lo, mut lo_index, mut hi, mut hi_index) = (first, 0usize, first, 0usize);

    for (i, &v) in series.iter().enumerate().skip(1) {
        match trend {
            Trend::Unknown => {
                if v > hi {
                    hi = v;
                    hi_index = i;
                }
                if v < lo {
                    lo = v;
                    lo_index = i;
                }
                if v >= lo + threshold {
                    if lo_index > 0 {
                        extrema.push(Extremum {
                            kind: ExtremumKind::Trough,
                            index: lo_index,
                            value: lo,
                        });
                    }
                    trend = Trend::Rising;
                    anchor = hi;
                    anchor_index = hi_index;
                } else if v <= hi - threshold {
                    if hi_index > 0 {
                        extrema.push(Extremum {
                            kind: ExtremumKind::Peak,
                            index: hi_index,
                            value: hi,
                        });
                    }
                    trend = Trend::Falling;
                    anchor = lo;
                    anchor_index = lo_index;
                }
            }
            Trend::Rising => {
                if v > anchor {
                    anchor = v;
                    anchor_index = i;
                } else if v <= anchor - threshold {
                    extrema.push(Extremum {
                        kind: ExtremumKind::Peak,
                        index: anchor_index,
                        value: anchor,
                    });
                    trend = Trend::Falling;
                    anchor = v;
                    anchor_index = i;
                }
            }
            Trend::Falling => {
                if v < anchor {
                    anchor = v;
                    anchor_index = i;
                } else if v >= anchor + threshold {
                    extrema.push(Extremum {
                        kind: ExtremumKind::Trough,
                        index: anchor_index,
                        value: anchor,
                    });
                    trend = Trend::Rising;
                    anchor = v;
                    anchor_index = i;
                }
            }
        }
    }
    extrema
}

/// Summary of the oscillatory content of one trajectory column.
#[derive(Debug, Clone, Serialize)]
pub struct OscillationSummary {
    pub extrema: Vec<Extremum>,
    /// Mean spacing between successive peaks, in the units of `times`.
    pub mean_period: Option<f64>,
    /// Height of the last peak-to-trough (or trough-to-peak) swing.
    pub last_amplitude: Option<f64>,
}

impl OscillationSummary {
    /// `None` when `times` and `series` differ in length.
    pub fn from_series(times: &[f64], series: &[f64], threshold: f64) -> Option<Self> {
        if times.len() != series.len() {
            return None;
        }
        let extrema = find_extrema(series, threshold);

        let peak_times: Vec<f64> = extrema
            .iter()
            .filter(|e| e.kind == ExtremumKind::Peak)
            .map(|e| times[e.index])
            .collect();
        let mean_period = (peak_times.len() >= 2).then(|| {
            (peak_times[peak_times.len() - 1] - peak_times[0]) / (peak_times.len() - 1) as f64
        });

        let last_amplitude = match extrema.as_slice() {
            [.., a, b] => Some((b.value - a.value).abs()),
            _ => None,
        };

        Some(Self {
            extrema,
            mean_period,
            last_amplitude,
        })
    }

    pub fn peaks(&self) -> impl Iterator<Item = &Extremum> + '_ {
        self.extrema.iter().filter(|e| e.kind == ExtremumKind::Peak)
    }

    pub fn troughs(&self) -> impl Iterator<Item = &Extremum> + '_ {
        self.extrema
            .iter()
            .filter(|e| e.kind == ExtremumKind::Trough)
    }

    pub fn peak_count(&self) -> usize {
        self.peaks().count()
    }

    /// At least `min_peaks` confirmed peaks and a last swing no smaller than `min_amplitude`.
    pub fn is_sustained(&self, min_peaks: usize, min_amplitude: f64) -> bool {
        self.peak_count() >= min_peaks
            && self.last_amplitude.is_some_and(|a| a >= min_amplitude)
    }
}

/// Period of the strongest non-constant Fourier mode of an evenly sampled series.
///
/// Resolution is limited to `span / k`; this is a coarse cross-check for
/// [`OscillationSummary::mean_period`], not a replacement.
pub fn dominant_period(times: &[f64], series: &[f64]) -> Option<f64> {
    let n = series.len();
    if n < 4 || times.len() != n {
        return None;
    }
    let dt = (times[n - 1] - times[0]) / (n - 1) as f64;
    if !(dt > 0.0) {
        return None;
    }

    let mean = series.iter().sum::<f64>() / n as f64;
    let mut buffer: Vec<Complex<f64>> = series
        .iter()
        .map(|&v| Complex::new(v - mean, 0.0))
        .collect();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let (k, power) = buffer[1..=n / 2]
        .iter()
        .enumerate()
        .map(|(i, c)| (i + 1, c.norm_sqr()))
        .fold((0usize, 0.0), |best, cur| if cur.1 > best.1 { cur } else { best });

    (k > 0 && power > 0.0).then(|| n as f64 * dt / k as f64)
}

/// Largest deviation of `weights · row` from its initial value over the trajectory.
pub fn conservation_drift(trajectory: &Trajectory, weights: &[f64]) -> f64 {
    let dot = |row: &[f64]| row.iter().zip(weights).map(|(x, w)| x * w).sum::<f64>();
    let reference = dot(trajectory.initial_state());
    trajectory
        .rows()
        .map(|row| (dot(row) - reference).abs())
        .fold(0.0, f64::max)
}

/// Smallest concentration anywhere in the table, with its (row, column).
pub fn min_concentration(trajectory: &Trajectory) -> (f64, usize, usize) {
    let dim = trajectory.dimension();
    trajectory
        .values()
        .iter()
        .enumerate()
        .fold((f64::INFINITY, 0, 0), |best, (idx, &v)| {
            if v < best.0 {
                (v, idx / dim, idx % dim)
            } else {
                best
            }
        })
}

/// Mean of the final `fraction` of a column, a plateau estimate.
pub fn tail_mean(series: &[f64], fraction: f64) -> Option<f64> {
    if series.is_empty() || !(fraction > 0.0 && fraction <= 1.0) {
        return None;
    }
    let count = ((series.len() as f64 * fraction).ceil() as usize).clamp(1, series.len());
    let tail = &series[series.len() - count..];
    Some(tail.iter().sum::<f64>() / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(n: usize, cycles: f64, damping: f64) -> (Vec<f64>, Vec<f64>) {
        let times: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64 * 100.0).collect();
        let values = times
            .iter()
            .map(|&t| (-damping * t).exp() * (2.0 * std::f64::consts::PI * cycles * t / 100.0).sin())
            .collect();
        (times, values)
    }

    #[test]
    fn extrema_alternate_and_skip_ripples() {
        let series = [0.0, 1.0, 0.95, 1.02, 0.0, -1.0, -0.97, 0.5, 2.0, 1.0];
        let extrema = find_extrema(&series, 0.2);
        let kinds: Vec<_> = extrema.iter().map(|e| (e.kind, e.index)).collect();
        assert_eq!(
            kinds,
            vec![(ExtremumKind::Peak, 3), (ExtremumKind::Trough, 5), (ExtremumKind::Peak, 8)]
        );
    }

    #[test]
    fn monotone_series_has_no_extrema() {
        let series: Vec<f64> = (0..100).map(|i| 1.0 - (-(i as f64) / 10.0).exp()).collect();
        assert!(find_extrema(&series, 1e-3).is_empty());
    }

    #[test]
    fn summary_measures_period_of_a_sine() {
        let (times, values) = sine(10_001, 5.0, 0.0);
        let summary = OscillationSummary::from_series(&times, &values, 0.1).unwrap();
        assert_eq!(summary.peak_count(), 5);
        assert!((summary.mean_period.unwrap() - 20.0).abs() < 0.05);
        assert!((summary.last_amplitude.unwrap() - 2.0).abs() < 1e-3);
        assert!(summary.is_sustained(3, 1.5));
    }

    #[test]
    fn damped_oscillation_is_not_sustained() {
        let (times, values) = sine(10_001, 5.0, 0.08);
        let summary = OscillationSummary::from_series(&times, &values, 0.01).unwrap();
        assert!(!summary.is_sustained(3, 0.5));
    }

    #[test]
    fn summary_needs_one_time_per_sample() {
        let (times, values) = sine(101, 2.0, 0.0);
        assert!(OscillationSummary::from_series(&times[..50], &values, 0.1).is_none());
        assert!(OscillationSummary::from_series(&times, &values[..50], 0.1).is_none());
    }

    #[test]
    fn fft_recovers_the_dominant_period() {
        let (times, values) = sine(4_096, 8.0, 0.0);
        let period = dominant_period(&times, &values).unwrap();
        assert!((period - 12.5).abs() < 0.1, "period {period}");
        assert_eq!(dominant_period(&times[..2], &values[..2]), None);
        assert_eq!(dominant_period(&times, &vec![3.0; times.len()]), None);
    }

    #[test]
    fn tail_mean_averages_the_end() {
        let series = [0.0, 0.0, 1.0, 3.0];
        assert_eq!(tail_mean(&series, 0.5), Some(2.0));
        assert_eq!(tail_mean(&series, 0.0), None);
        assert_eq!(tail_mean(&[], 0.5), None);
    }
}
