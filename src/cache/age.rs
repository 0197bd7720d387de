//! Human-readable staleness of cached data.

use chrono::{Local, TimeZone, Utc};

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;

/// Describe how long ago `captured_at` (epoch milliseconds) was, relative to now.
pub fn format_age(captured_at: i64) -> String {
  format_age_at(captured_at, Utc::now().timestamp_millis())
}

/// Same as [`format_age`] with an explicit current time.
///
/// Units are floor-divided. Anything a week or older is shown as a calendar date.
pub fn format_age_at(captured_at: i64, now: i64) -> String {
  let elapsed = now.saturating_sub(captured_at);

  // Negative elapsed means clock skew; treat as fresh
  if elapsed < MINUTE_MS {
    "Just now".to_string()
  } else if elapsed < HOUR_MS {
    plural(elapsed / MINUTE_MS, "minute")
  } else if elapsed < DAY_MS {
    plural(elapsed / HOUR_MS, "hour")
  } else if elapsed < WEEK_MS {
    plural(elapsed / DAY_MS, "day")
  } else {
    format_date(captured_at)
  }
}

fn plural(n: i64, unit: &str) -> String {
  if n == 1 {
    format!("1 {} ago", unit)
  } else {
    format!("{} {}s ago", n, unit)
  }
}

/// Short calendar date in local time, e.g. `3/7/2026`.
fn format_date(millis: i64) -> String {
  match Local.timestamp_millis_opt(millis).single() {
    Some(dt) => dt.format("%-m/%-d/%Y").to_string(),
    None => "Unknown date".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const NOW: i64 = 1_760_000_000_000;

  #[test]
  fn test_format_age_thresholds() {
    assert_eq!(format_age_at(NOW - 30 * 1000, NOW), "Just now");
    assert_eq!(format_age_at(NOW - 90 * 1000, NOW), "1 minute ago");
    assert_eq!(format_age_at(NOW - 59 * MINUTE_MS, NOW), "59 minutes ago");
    assert_eq!(format_age_at(NOW - 2 * HOUR_MS, NOW), "2 hours ago");
    assert_eq!(format_age_at(NOW - HOUR_MS - 59 * MINUTE_MS, NOW), "1 hour ago");
    assert_eq!(format_age_at(NOW - 3 * DAY_MS, NOW), "3 days ago");
    assert_eq!(format_age_at(NOW - DAY_MS, NOW), "1 day ago");
  }

  #[test]
  fn test_format_age_old_entries_show_date() {
    let captured = NOW - 10 * DAY_MS;
    let expected = Local
      .timestamp_millis_opt(captured)
      .unwrap()
      .format("%-m/%-d/%Y")
      .to_string();

    let formatted = format_age_at(captured, NOW);
    assert_eq!(formatted, expected);
    assert!(!formatted.ends_with("ago"));
  }

  #[test]
  fn test_format_age_exactly_one_week_is_a_date() {
    assert!(!format_age_at(NOW - WEEK_MS, NOW).ends_with("ago"));
  }

  #[test]
  fn test_format_age_future_timestamp() {
    assert_eq!(format_age_at(NOW + 5 * MINUTE_MS, NOW), "Just now");
  }

  #[test]
  fn test_format_age_extreme_timestamps() {
    assert_eq!(format_age_at(i64::MIN, NOW), "Unknown date");
    assert_eq!(format_age_at(i64::MAX, NOW), "Just now");
  }

  #[test]
  fn test_format_age_uses_current_time() {
    let just_written = Utc::now().timestamp_millis();
    assert_eq!(format_age(just_written), "Just now");
  }
}
