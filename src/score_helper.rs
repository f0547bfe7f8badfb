use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

pub const DEFAULT_SCORE: u8 = 5;

static RATING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rating:?\s*(\d+)(?:\s*/\s*10)?").expect("Invalid rating regex pattern")
});

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)score:?\s*(\d+)(?:\s*/\s*10)?").expect("Invalid score regex pattern")
});

fn first_number(re: &Regex, text: &str) -> Option<Option<u8>> {
    let captures = re.captures(text)?;
    // Digits that overflow are simply out of range.
    let value = captures[1].parse::<u32>().ok();
    Some(value.filter(|v| *v <= 10).map(|v| v as u8))
}

/// Pulls a 0..=10 score out of free-form evaluation text.
///
/// The first `rating` match wins over any `score` match. A rating outside the range
/// is rejected and the default is used; it does not fall through to `score`.
pub fn extract_score(text: &str) -> u8 {
    let found = first_number(&RATING_RE, text).or_else(|| first_number(&SCORE_RE, text));

    match found {
        Some(Some(score)) => score,
        Some(None) => {
            debug!("Rejected out-of-range score, using default {}", DEFAULT_SCORE);
            DEFAULT_SCORE
        }
        None => {
            debug!("No score found in evaluation, using default {}", DEFAULT_SCORE);
            DEFAULT_SCORE
        }
    }
}
