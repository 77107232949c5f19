//! Display formatters
//!
//! Pure helpers that turn metric values into the short strings shown in
//! progress lines, tables and KPI cards.

use chrono::{DateTime, TimeZone, Utc};

/// Sign classification of a value, for choosing how to render it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTone {
    Positive,
    Negative,
    Neutral,
}

impl ValueTone {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            ValueTone::Positive
        } else if value < 0.0 {
            ValueTone::Negative
        } else {
            ValueTone::Neutral
        }
    }
}

/// `+$12.45K`, `-$1.20M`, `$0.00`
pub fn currency(value: f64, decimals: usize) -> String {
    let abs = value.abs();
    let sign = match ValueTone::of(value) {
        ValueTone::Positive => "+",
        ValueTone::Negative => "-",
        ValueTone::Neutral => "",
    };

    if abs >= 1_000_000.0 {
        format!("{sign}${:.2}M", abs / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("{sign}${:.2}K", abs / 1_000.0)
    } else {
        format!("{sign}${abs:.decimals$}")
    }
}

pub fn percent(value: f64, decimals: usize, show_sign: bool) -> String {
    let sign = if show_sign && value > 0.0 { "+" } else { "" };
    format!("{sign}{value:.decimals$}%")
}

/// `1.5M`, `12.3K`, `950.0`
pub fn compact_number(value: f64, decimals: usize) -> String {
    if value >= 1_000_000.0 {
        format!("{:.decimals$}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.decimals$}K", value / 1_000.0)
    } else {
        format!("{value:.decimals$}")
    }
}

fn plural(n: u64, unit: &str) -> String {
    if n == 1 {
        format!("{n} {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// `2 hours 15 minutes`, `5 minutes 3 seconds`, `42 seconds`; empty for zero
pub fn human_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    let parts: Vec<String> = if hours > 0 {
        [(hours, "hour"), (minutes, "minute")]
            .into_iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, unit)| plural(n, unit))
            .collect()
    } else if minutes > 0 {
        [(minutes, "minute"), (secs, "second")]
            .into_iter()
            .filter(|(n, _)| *n > 0)
            .map(|(n, unit)| plural(n, unit))
            .collect()
    } else if secs > 0 {
        vec![plural(secs, "second")]
    } else {
        Vec::new()
    };
    parts.join(" ")
}

/// `2h 15m`, `5m 3s`, `42s`
pub fn short_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

/// `Jun 1, 2024`
pub fn date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%b %-d, %Y").to_string()
}

/// `3 hours ago`, `in 2 days`
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now.signed_duration_since(at);
    let past = delta.num_seconds() >= 0;
    let secs = delta.num_seconds().unsigned_abs();

    let minutes = (secs as f64 / 60.0).round() as u64;
    let hours = (secs as f64 / 3600.0).round() as u64;
    let days = (secs as f64 / 86_400.0).round() as u64;

    let text = if secs < 45 {
        "less than a minute".to_string()
    } else if minutes < 45 {
        plural(minutes.max(1), "minute")
    } else if hours < 24 {
        format!("about {}", plural(hours.max(1), "hour"))
    } else if days < 30 {
        plural(days, "day")
    } else if days < 365 {
        plural((days / 30).max(1), "month")
    } else {
        format!("about {}", plural(days / 365, "year"))
    };

    if past {
        format!("{text} ago")
    } else {
        format!("in {text}")
    }
}

/// `HH:MM:SS` of a Unix millisecond timestamp, in UTC
pub fn log_time(timestamp_ms: i64) -> String {
    Utc.timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// `$42,520.00`
pub fn price(value: f64, symbol: &str) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let digits: Vec<char> = int_part.chars().collect();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{frac_part}")
}

/// Fixed notation down to 0.01, exponent notation below (`3.0e-4`)
pub fn scientific(value: f64) -> String {
    if value >= 0.01 {
        format!("{value:.4}")
    } else {
        format!("{value:.1e}")
    }
}

pub fn ratio(value: f64) -> String {
    format!("{value:.2}")
}

/// `1d 2h`, `3h 20m`, `45m`
pub fn minutes(total_minutes: f64) -> String {
    let total = total_minutes.max(0.0).floor() as u64;
    let hours = total / 60;
    let mins = total % 60;

    if hours > 24 {
        format!("{}d {}h", hours / 24, hours % 24)
    } else if hours > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{mins}m")
    }
}

pub fn bytes(n: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match n {
        n if n >= GB => format!("{:.1} GB", n as f64 / GB as f64),
        n if n >= MB => format!("{:.1} MB", n as f64 / MB as f64),
        n if n >= KB => format!("{:.1} KB", n as f64 / KB as f64),
        n => format!("{n} B"),
    }
}

/// Rough wall-clock estimate for a run, rounded up to whole hours
pub fn estimate_training_time(total_timesteps: u64, steps_per_second: f64) -> String {
    let seconds = if steps_per_second > 0.0 {
        total_timesteps as f64 / steps_per_second
    } else {
        0.0
    };
    let hours = (seconds / 3600.0).ceil() as u64;

    if hours >= 24 {
        format!("~{}d {}h", hours / 24, hours % 24)
    } else {
        format!("~{hours}h")
    }
}

/// Span of market history covered by `timesteps` bars of `timeframe_minutes`
pub fn timesteps_to_date_range(timesteps: u64, timeframe_minutes: u64) -> String {
    let days = timesteps.saturating_mul(timeframe_minutes) / 1440;
    let months = days / 30;

    let (n, unit) = if months >= 12 {
        (months / 12, "year")
    } else if months > 0 {
        (months, "month")
    } else {
        (days, "day")
    };
    format!("≈ {}", plural_gt_one(n, unit))
}

// "0 day" and "1 day" both stay singular here
fn plural_gt_one(n: u64, unit: &str) -> String {
    if n > 1 {
        format!("{n} {unit}s")
    } else {
        format!("{n} {unit}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_currency() {
        assert_eq!(currency(12450.0, 2), "+$12.45K");
        assert_eq!(currency(-1_200_000.0, 2), "-$1.20M");
        assert_eq!(currency(0.0, 2), "$0.00");
        assert_eq!(currency(-3.5, 1), "-$3.5");
    }

    #[test]
    fn test_percent_and_numbers() {
        assert_eq!(percent(45.04, 1, true), "+45.0%");
        assert_eq!(percent(-2.5, 2, true), "-2.50%");
        assert_eq!(percent(3.0, 0, false), "3%");
        assert_eq!(compact_number(1_500_000.0, 1), "1.5M");
        assert_eq!(compact_number(2048.0, 1), "2.0K");
        assert_eq!(compact_number(950.0, 1), "950.0");
    }

    #[test]
    fn test_durations() {
        assert_eq!(human_duration(8100.0), "2 hours 15 minutes");
        assert_eq!(human_duration(3600.0), "1 hour");
        assert_eq!(human_duration(303.0), "5 minutes 3 seconds");
        assert_eq!(human_duration(42.0), "42 seconds");
        assert_eq!(human_duration(0.0), "");
        assert_eq!(human_duration(0.9), "");
        assert_eq!(short_duration(8100.0), "2h 15m");
        assert_eq!(short_duration(303.0), "5m 3s");
        assert_eq!(short_duration(0.0), "0s");
        assert_eq!(minutes(1560.0), "1d 2h");
        assert_eq!(minutes(200.0), "3h 20m");
        assert_eq!(minutes(45.0), "45m");
    }

    #[test]
    fn test_dates() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 14, 32, 15).unwrap();
        assert_eq!(date(&at), "Jun 1, 2024");
        assert_eq!(log_time(at.timestamp_millis()), "14:32:15");
        assert_eq!(relative_time(at, at + Duration::hours(3)), "about 3 hours ago");
        assert_eq!(relative_time(at, at + Duration::seconds(10)), "less than a minute ago");
        assert_eq!(relative_time(at + Duration::days(2), at), "in 2 days");
    }

    #[test]
    fn test_price_grouping() {
        assert_eq!(price(42520.0, "$"), "$42,520.00");
        assert_eq!(price(1_234_567.891, "$"), "$1,234,567.89");
        assert_eq!(price(999.5, "$"), "$999.50");
        assert_eq!(price(-1000.0, "$"), "-$1,000.00");
    }

    #[test]
    fn test_scientific_and_sizes() {
        assert_eq!(scientific(0.0003), "3.0e-4");
        assert_eq!(scientific(0.99), "0.9900");
        assert_eq!(ratio(1.654), "1.65");
        assert_eq!(bytes(512), "512 B");
        assert_eq!(bytes(1536), "1.5 KB");
        assert_eq!(bytes(17 * 1024 * 1024 * 1024), "17.0 GB");
    }

    #[test]
    fn test_estimates() {
        assert_eq!(estimate_training_time(200_000_000, 1500.0), "~1d 14h");
        assert_eq!(estimate_training_time(1_000_000, 1500.0), "~1h");
        assert_eq!(timesteps_to_date_range(1_000_000, 1), "≈ 1 year");
        assert_eq!(timesteps_to_date_range(100_000, 1), "≈ 2 months");
        assert_eq!(timesteps_to_date_range(5000, 1), "≈ 3 days");
    }

    #[test]
    fn test_tone() {
        assert_eq!(ValueTone::of(1.0), ValueTone::Positive);
        assert_eq!(ValueTone::of(-0.1), ValueTone::Negative);
        assert_eq!(ValueTone::of(0.0), ValueTone::Neutral);
    }
}
