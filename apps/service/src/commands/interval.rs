use thiserror::Error;

/// Rejections for the `<n><unit>` interval argument. The messages are
/// sent back to the chat verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("Minutes should be between 5 and 60")]
    MinutesOutOfRange,
    #[error("Hours should be between 1 and 24")]
    HoursOutOfRange,
    #[error("Days should be between 1 and 7")]
    DaysOutOfRange,
    #[error("Interval should look like 30m, 2h or 3d")]
    Malformed,
}

/// Parse a check cadence like `30m`, `2h` or `3d` into minutes.
///
/// A missing or unknown unit falls back to minutes, so `30` and `30m`
/// are the same request. Bounds are per unit; the composite result is
/// always within 5..=10080 minutes.
pub fn parse_interval(value: &str) -> Result<u32, IntervalError> {
    let value = value.trim();
    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);

    let amount: u32 = digits.parse().map_err(|_| IntervalError::Malformed)?;
    if !unit.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(IntervalError::Malformed);
    }

    match unit.to_ascii_lowercase().as_str() {
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            if !(1..=24).contains(&amount) {
                return Err(IntervalError::HoursOutOfRange);
            }
            Ok(amount * 60)
        }
        "d" | "day" | "days" => {
            if !(1..=7).contains(&amount) {
                return Err(IntervalError::DaysOutOfRange);
            }
            Ok(amount * 24 * 60)
        }
        // Minutes, including bare numbers and unrecognized units.
        _ => {
            if !(5..=60).contains(&amount) {
                return Err(IntervalError::MinutesOutOfRange);
            }
            Ok(amount)
        }
    }
}

/// Render stored minutes the way registration confirmations show them.
pub fn interval_text(minutes: u32) -> String {
    if minutes >= 1440 {
        format!("{} days", minutes / 1440)
    } else if minutes >= 60 {
        format!("{} hours", minutes / 60)
    } else {
        format!("{minutes} minutes")
    }
}
