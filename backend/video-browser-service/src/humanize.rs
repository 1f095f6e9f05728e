/// Display formatting for object sizes and timestamps
///
/// Byte sizes use SI units ("82 MB"); times are relative to a reference
/// instant ("3 hours ago", "2 days from now").
use chrono::{DateTime, Duration, Utc};

const SI_SUFFIXES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];

/// Format a byte count with SI prefixes
pub fn human_bytes(size: u64) -> String {
    if size < 10 {
        return format!("{size} B");
    }

    let mut exp = 0;
    let mut scaled = size;
    while scaled >= 1000 && exp < SI_SUFFIXES.len() - 1 {
        scaled /= 1000;
        exp += 1;
    }

    let value = (size as f64 / 1000f64.powi(exp as i32) * 10.0 + 0.5).floor() / 10.0;

    if value < 10.0 {
        format!("{value:.1} {}", SI_SUFFIXES[exp])
    } else {
        format!("{value:.0} {}", SI_SUFFIXES[exp])
    }
}

struct Magnitude {
    below: Duration,
    format: &'static str,
    unit: Option<Duration>,
}

const fn fixed(below: Duration, format: &'static str) -> Magnitude {
    Magnitude {
        below,
        format,
        unit: None,
    }
}

const fn counted(below: Duration, format: &'static str, unit: Duration) -> Magnitude {
    Magnitude {
        below,
        format,
        unit: Some(unit),
    }
}

fn magnitudes() -> [Magnitude; 16] {
    let second = Duration::seconds(1);
    let minute = Duration::minutes(1);
    let hour = Duration::hours(1);
    let day = Duration::days(1);
    let week = Duration::days(7);
    let month = Duration::days(30);
    let year = Duration::days(360);

    [
        fixed(second, "now"),
        fixed(second * 2, "1 second"),
        counted(minute, "{} seconds", second),
        fixed(minute * 2, "1 minute"),
        counted(hour, "{} minutes", minute),
        fixed(hour * 2, "1 hour"),
        counted(day, "{} hours", hour),
        fixed(day * 2, "1 day"),
        counted(week, "{} days", day),
        fixed(week * 2, "1 week"),
        counted(month, "{} weeks", week),
        fixed(month * 2, "1 month"),
        counted(year, "{} months", month),
        fixed(month * 18, "1 year"),
        fixed(year * 2, "2 years"),
        counted(year * 37, "{} years", year),
    ]
}

/// Describe `then` relative to `now`
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let (diff, label) = if then > now {
        (then - now, "from now")
    } else {
        (now - then, "ago")
    };

    let Some(magnitude) = magnitudes().into_iter().find(|m| diff < m.below) else {
        return format!("a long while {label}");
    };

    if magnitude.format == "now" {
        return "now".to_string();
    }

    let text = match magnitude.unit {
        Some(unit) => {
            let count = diff.num_milliseconds() / unit.num_milliseconds();
            magnitude.format.replace("{}", &count.to_string())
        }
        None => magnitude.format.to_string(),
    };

    format!("{text} {label}")
}

/// Relative time for an RFC 3339 string; unparseable input is shown as "now"
pub fn human_time(input: &str, now: DateTime<Utc>) -> String {
    match DateTime::parse_from_rfc3339(input) {
        Ok(parsed) => relative_time(parsed.with_timezone(&Utc), now),
        Err(e) => {
            tracing::warn!(input_time = %input, error = %e, "Could not parse timestamp");
            relative_time(now, now)
        }
    }
}
