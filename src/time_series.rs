use crate::results::TestResult;

/// One point of the WPM trend: `t` is the 1-based attempt number
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// WPM per attempt, oldest first, over the last `window` results
pub fn wpm_trend(results: &[TestResult], window: usize) -> Vec<TimeSeriesPoint> {
    let skip = results.len().saturating_sub(window);
    results
        .iter()
        .enumerate()
        .skip(skip)
        .map(|(idx, r)| TimeSeriesPoint::new((idx + 1) as f64, r.wpm as f64))
        .collect()
}
