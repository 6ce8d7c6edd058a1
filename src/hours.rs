use thiserror::Error;

/// Sentence shown instead of a full seven-day schedule.
pub const OPEN_DAILY: &str = "Работает ежедневно";

/// One `<label>[<time-range>]` segment of a working-hours descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySegment {
    pub label: String,
    pub range: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleParseError {
    #[error("segment has no bracketed time range: {0:?}")]
    MissingBrackets(String),
    #[error("segment has text after the closing bracket: {0:?}")]
    TrailingText(String),
    #[error("segment has an empty day label: {0:?}")]
    EmptyLabel(String),
}

/// Parses a comma-joined day schedule. Labels are trimmed; the time
/// range is everything between the brackets, verbatim.
pub fn parse_schedule(raw: &str) -> Result<Vec<DaySegment>, ScheduleParseError> {
    raw.split(',').map(parse_segment).collect()
}

fn parse_segment(segment: &str) -> Result<DaySegment, ScheduleParseError> {
    let (label, rest) = segment
        .split_once('[')
        .ok_or_else(|| ScheduleParseError::MissingBrackets(segment.to_string()))?;
    let (range, tail) = rest
        .split_once(']')
        .ok_or_else(|| ScheduleParseError::MissingBrackets(segment.to_string()))?;
    if !tail.trim().is_empty() {
        return Err(ScheduleParseError::TrailingText(segment.to_string()));
    }
    let label = label.trim();
    if label.is_empty() {
        return Err(ScheduleParseError::EmptyLabel(segment.to_string()));
    }
    Ok(DaySegment {
        label: label.to_string(),
        range: range.to_string(),
    })
}

pub fn render_schedule(segments: &[DaySegment]) -> String {
    segments
        .iter()
        .map(|s| format!("{}[{}]", s.label, s.range))
        .collect::<Vec<_>>()
        .join(",")
}

/// Reformats a raw working-hours descriptor. A descriptor that splits
/// into exactly seven day segments collapses to [`OPEN_DAILY`]; anything
/// that fails the grammar is returned unchanged rather than guessed at.
pub fn reformat(raw: &str) -> String {
    if raw.split(',').count() == 7 {
        return OPEN_DAILY.to_string();
    }
    match parse_schedule(raw) {
        Ok(segments) => render_schedule(&segments),
        Err(_) => raw.to_string(),
    }
}
