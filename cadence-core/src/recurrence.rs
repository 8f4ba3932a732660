//! Recurrence description and remote rule construction.
//!
//! A `RecurrenceSpec` is transient input: it describes how a series expands
//! but is never persisted as its own entity. Local expansion (see
//! `generator`) is authoritative; the rule string built here is a
//! best-effort approximation sent to the remote calendar for display.

use chrono::{Months, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

/// How often a series repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    fn as_rule_str(self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }
}

/// Which day a monthly series lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyPattern {
    /// Same day-of-month as the template start, clamped in shorter months.
    #[default]
    DayOfMonth,
    /// The Nth occurrence of the template start's weekday (e.g. 2nd Tuesday).
    NthWeekday,
}

fn default_interval() -> u32 {
    1
}

/// Recurrence description supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub frequency: Frequency,

    /// Step multiplier (every N days/weeks/months).
    #[serde(default = "default_interval")]
    pub interval: u32,

    /// Weekly only. Empty defaults to the template start's weekday.
    #[serde(default)]
    pub days_of_week: Vec<Weekday>,

    /// Monthly only.
    #[serde(default)]
    pub monthly_pattern: MonthlyPattern,

    /// Inclusive end date. Absent means the default span after the
    /// template start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_end_date: Option<NaiveDateTime>,
}

impl RecurrenceSpec {
    pub fn new(frequency: Frequency) -> Self {
        RecurrenceSpec {
            frequency,
            interval: 1,
            days_of_week: Vec::new(),
            monthly_pattern: MonthlyPattern::default(),
            recurring_end_date: None,
        }
    }

    /// The caller-supplied end date pushed to the last instant of its
    /// calendar day, so the end date is inclusive.
    pub fn normalized_end_date(&self) -> Option<NaiveDateTime> {
        self.recurring_end_date
            .and_then(|end| end.date().and_hms_opt(23, 59, 59))
    }

    /// The instant generation stops at: the normalized end date, or
    /// `template_start` plus the default span when none was given.
    pub fn resolved_end(
        &self,
        template_start: NaiveDateTime,
        default_span_months: u32,
    ) -> NaiveDateTime {
        match self.normalized_end_date() {
            Some(end) => end,
            None => template_start
                .checked_add_months(Months::new(default_span_months))
                .unwrap_or(template_start),
        }
    }

    /// Build the recurrence rule string sent to the remote calendar.
    ///
    /// Deliberately lossy: monthly patterns emit a bare `FREQ=MONTHLY` with
    /// no BYMONTHDAY/BYSETPOS, so the remote rule only approximates the
    /// locally generated occurrences.
    pub fn to_remote_rule(&self) -> String {
        let mut rule = format!("FREQ={}", self.frequency.as_rule_str());

        if self.frequency == Frequency::Weekly && !self.days_of_week.is_empty() {
            let mut offsets: Vec<u32> = self
                .days_of_week
                .iter()
                .map(|d| d.num_days_from_sunday())
                .collect();
            offsets.sort_unstable();
            offsets.dedup();
            let codes: Vec<&str> = offsets.iter().map(|o| weekday_code_from_offset(*o)).collect();
            rule.push_str(";BYDAY=");
            rule.push_str(&codes.join(","));
        }

        if let Some(end) = self.normalized_end_date() {
            rule.push_str(&format!(";UNTIL={}", end.format("%Y%m%dT%H%M%SZ")));
        }

        rule
    }
}

/// Two-letter weekday codes used in rule strings.
pub fn weekday_code(day: Weekday) -> &'static str {
    weekday_code_from_offset(day.num_days_from_sunday())
}

fn weekday_code_from_offset(days_from_sunday: u32) -> &'static str {
    match days_from_sunday {
        0 => "SU",
        1 => "MO",
        2 => "TU",
        3 => "WE",
        4 => "TH",
        5 => "FR",
        _ => "SA",
    }
}
