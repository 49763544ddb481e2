use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Clone, Copy, Debug)]
enum ParsedTimezone {
    Named(Tz),
    Fixed(FixedOffset),
}

fn parse_fixed_offset(raw: &str) -> Option<FixedOffset> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (sign, rest) = match trimmed.chars().next()? {
        '+' => (1, &trimmed[1..]),
        '-' => (-1, &trimmed[1..]),
        _ => return None,
    };

    let rest = rest.trim();
    if rest.is_empty() || !rest.is_ascii() {
        return None;
    }

    let (hours, minutes) = if let Some((h, m)) = rest.split_once(':') {
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else if rest.len() > 2 {
        let (h, m) = rest.split_at(rest.len() - 2);
        (h.parse::<i32>().ok()?, m.parse::<i32>().ok()?)
    } else {
        (rest.parse::<i32>().ok()?, 0)
    };

    if hours > 14 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn canonical_name(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("gmt") {
        "UTC".to_string()
    } else if trimmed == "Europe/Kiev" {
        "Europe/Kyiv".to_string()
    } else {
        trimmed.to_string()
    }
}

fn parse_timezone(raw: &str) -> Option<ParsedTimezone> {
    let normalized = canonical_name(raw);
    if normalized.is_empty() {
        return None;
    }
    if normalized == "UTC" {
        return FixedOffset::east_opt(0).map(ParsedTimezone::Fixed);
    }

    let prefix = normalized.get(..3).unwrap_or_default();
    if prefix.eq_ignore_ascii_case("UTC") || prefix.eq_ignore_ascii_case("GMT") {
        let offset = &normalized[3..];
        if offset.trim().is_empty() {
            return FixedOffset::east_opt(0).map(ParsedTimezone::Fixed);
        }
        if let Some(parsed) = parse_fixed_offset(offset) {
            return Some(ParsedTimezone::Fixed(parsed));
        }
    }

    if let Some(parsed) = parse_fixed_offset(&normalized) {
        return Some(ParsedTimezone::Fixed(parsed));
    }

    normalized.parse::<Tz>().ok().map(ParsedTimezone::Named)
}

/// Calendar date at `utc_dt` in the given zone; unparseable zones resolve as UTC.
pub fn local_date(raw_tz: &str, utc_dt: DateTime<Utc>) -> NaiveDate {
    match parse_timezone(raw_tz) {
        Some(ParsedTimezone::Named(tz)) => utc_dt.with_timezone(&tz).date_naive(),
        Some(ParsedTimezone::Fixed(offset)) => utc_dt.with_timezone(&offset).date_naive(),
        None => {
            tracing::warn!("Unknown timezone '{}', using UTC", raw_tz);
            utc_dt.date_naive()
        }
    }
}
