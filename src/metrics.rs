/// Characters that make up one "word" for WPM purposes
pub const CHARS_PER_WORD: f64 = 5.0;

/// Words per minute from correctly typed characters over elapsed seconds.
/// Returns 0 when no time has elapsed.
pub fn wpm(correct_chars: usize, elapsed_secs: f64) -> u32 {
    if elapsed_secs <= 0.0 {
        return 0;
    }
    let words = correct_chars as f64 / CHARS_PER_WORD;
    let minutes = elapsed_secs / 60.0;
    (words / minutes).round() as u32
}

/// Percentage of typed characters that were correct, rounded.
/// No input yet counts as 100. Callers keep `correct_chars <= total_chars`.
pub fn accuracy(correct_chars: usize, total_chars: usize) -> u32 {
    if total_chars == 0 {
        return 100;
    }
    (correct_chars as f64 / total_chars as f64 * 100.0).round() as u32
}

/// `M:SS`, minutes unpadded
pub fn format_duration(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

pub fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        count => Some(data.iter().sum::<f64>() / count as f64),
    }
}

/// Verbal rating shown next to a final result
pub fn rating(wpm: u32) -> &'static str {
    match wpm {
        80.. => "Excellent!",
        60..=79 => "Great!",
        40..=59 => "Good",
        _ => "Keep Practicing",
    }
}
