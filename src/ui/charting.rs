use typemaster::time_series::TimeSeriesPoint;

/// X (attempt number) and Y (WPM) bounds for the history trend chart
pub fn compute_chart_params(points: &[TimeSeriesPoint]) -> ([f64; 2], f64) {
    let highest_wpm = points.iter().map(|p| p.wpm).fold(0.0, f64::max);

    let first = points.first().map_or(1.0, |p| p.t);
    let mut last = points.last().map_or(1.0, |p| p.t);
    // a single attempt still needs a non-empty axis
    if last <= first {
        last = first + 1.0;
    }

    ([first, last], highest_wpm.max(10.0).ceil())
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
