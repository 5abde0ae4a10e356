//! Permissive date/time text parsing for hand-entered spreadsheet cells.
//!
//! Accepted input, tried in this order after trimming:
//!
//! 1. RFC 3339 (`2023-04-05T10:30:00Z`) and RFC 2822
//!    (`Wed, 05 Apr 2023 10:30:00 +0000`).
//! 2. A date part optionally followed by a time part. The two are split at an
//!    ISO `T` sitting between two digits, otherwise at the first
//!    whitespace-separated token containing `:`.
//!
//! Date parts starting with a 4-digit year: `2023-04-05`, `2023/04/05`,
//! `2023.04.05`, `20230405`. Anything else is read month-first like
//! `04/05/2023` (also with `-` or `.`), falling back to day-first when the
//! month-first reading is invalid (`25/12/2023`). Month names are accepted as
//! `April 5, 2023`, `April 5 2023`, `5 April 2023`, `5 April, 2023`,
//! `05-Apr-2023` and `Apr-05-2023`, optionally after a weekday name. A
//! trailing two-digit year is expanded with chrono's `%y` rule.
//!
//! Time parts: `10:30`, `10:30:00`, `10:30:00.250`, `10:30 PM`,
//! `10:30:00PM`, each optionally followed by `Z` or an offset written as
//! `+02`, `+0200` or `+02:00`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

const YEAR_FIRST_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d", "%Y%m%d"];

// Month-first readings come before day-first ones.
const YEAR_LAST_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%d-%b-%Y",
    "%b-%d-%Y",
];

const TIME_FORMATS: &[&str] = &[
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
    "%I:%M:%S %p",
    "%I:%M %p",
    "%I:%M:%S%p",
    "%I:%M%p",
];

const WEEKDAYS: &[&str] = &["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

/// Calendar date with an optional time of day and UTC offset, as read from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temporal {
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub offset: Option<FixedOffset>,
}

impl Temporal {
    fn from_fixed(dt: DateTime<FixedOffset>) -> Self {
        let local = dt.naive_local();
        Self {
            date: local.date(),
            time: Some(local.time()),
            offset: Some(*dt.offset()),
        }
    }

    /// Local date and time, midnight when the input carried no time.
    pub fn naive(&self) -> NaiveDateTime {
        self.date.and_time(self.time.unwrap_or(NaiveTime::MIN))
    }

    /// The zoned timestamp, if the input carried an offset.
    pub fn zoned(&self) -> Option<DateTime<FixedOffset>> {
        let offset = self.offset?;
        self.naive().and_local_timezone(offset).single()
    }
}

/// Parses `input` with the rules listed in the module docs.
///
/// Returns `None` when nothing matches, including for blank input.
pub fn parse(input: &str) -> Option<Temporal> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(Temporal::from_fixed(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(Temporal::from_fixed(dt));
    }

    let (date_part, time_part) = split_date_time(s);
    let date = parse_date(date_part)?;

    let (time, offset) = match time_part {
        Some(t) => {
            let (clock, offset) = split_offset(t)?;
            (Some(parse_time(clock)?), offset)
        }
        None => (None, None),
    };

    Some(Temporal { date, time, offset })
}

fn split_date_time(s: &str) -> (&str, Option<&str>) {
    let bytes = s.as_bytes();
    for i in 1..bytes.len().saturating_sub(1) {
        if matches!(bytes[i], b'T' | b't')
            && bytes[i - 1].is_ascii_digit()
            && bytes[i + 1].is_ascii_digit()
        {
            return (&s[..i], Some(&s[i + 1..]));
        }
    }

    let Some(colon) = s.find(':') else {
        return (s, None);
    };
    let token_start = s[..colon]
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map(|(i, c)| i + c.len_utf8());

    match token_start {
        Some(start) => {
            let date = s[..start].trim_end().trim_end_matches(',').trim_end();
            (date, Some(&s[start..]))
        }
        // A bare time has no date to anchor it.
        None => (s, None),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let d = strip_weekday(raw.trim());

    let leading_digits = d.bytes().take_while(u8::is_ascii_digit).count();
    if leading_digits >= 4 {
        return YEAR_FIRST_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(d, fmt).ok());
    }

    let short_year = d.bytes().rev().take_while(u8::is_ascii_digit).count() == 2;
    YEAR_LAST_FORMATS.iter().find_map(|fmt| {
        if short_year {
            NaiveDate::parse_from_str(d, &fmt.replace("%Y", "%y")).ok()
        } else {
            NaiveDate::parse_from_str(d, fmt).ok()
        }
    })
}

fn strip_weekday(d: &str) -> &str {
    let word_len = d.bytes().take_while(u8::is_ascii_alphabetic).count();
    if word_len < 3 {
        return d;
    }
    let prefix = d[..3].to_ascii_lowercase();
    if !WEEKDAYS.contains(&prefix.as_str()) {
        return d;
    }
    d[word_len..].trim_start_matches(',').trim_start()
}

fn split_offset(t: &str) -> Option<(&str, Option<FixedOffset>)> {
    let t = t.trim();
    if let Some(rest) = t.strip_suffix(['Z', 'z']) {
        return Some((rest.trim_end(), FixedOffset::east_opt(0)));
    }

    match t.rfind(['+', '-']) {
        Some(i) if i > 0 => {
            let offset = parse_offset(&t[i..])?;
            Some((t[..i].trim_end(), Some(offset)))
        }
        _ => Some((t, None)),
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, digits) = match s.as_bytes().first()? {
        b'+' => (1, &s[1..]),
        b'-' => (-1, &s[1..]),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn parse_time(t: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(t, fmt).ok())
}
