//! Occurrence expansion for recurring events.
//!
//! Expands a recurrence spec plus a template interval into an ordered list
//! of concrete (start, end) windows. Pure computation: no I/O, no side
//! effects, bounded by `GeneratorLimits` so generation can never run away.

use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime};

use crate::recurrence::{Frequency, MonthlyPattern, RecurrenceSpec};

/// Expansion bounds, injected at construction.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorLimits {
    /// Span used when the spec carries no end date (months after start).
    pub default_span_months: u32,
    /// Hard cap on generated windows regardless of span.
    pub max_occurrences: usize,
}

impl Default for GeneratorLimits {
    fn default() -> Self {
        GeneratorLimits {
            default_span_months: 6,
            max_occurrences: 365,
        }
    }
}

/// One generated (start, end) pair. Every window spans the same duration
/// as the template interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OccurrenceWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OccurrenceGenerator {
    limits: GeneratorLimits,
}

impl OccurrenceGenerator {
    pub fn new(limits: GeneratorLimits) -> Self {
        OccurrenceGenerator { limits }
    }

    /// Expand `spec` into ordered occurrence windows.
    ///
    /// Returns an empty list when no valid occurrence exists in the
    /// resolved span; callers must treat that as a rejectable condition
    /// rather than creating a series with zero instances.
    pub fn generate(
        &self,
        template_start: NaiveDateTime,
        template_end: NaiveDateTime,
        spec: &RecurrenceSpec,
    ) -> Vec<OccurrenceWindow> {
        let until = spec.resolved_end(template_start, self.limits.default_span_months);
        let duration = template_end - template_start;
        // Interval 0 would stall the scan; treat it as the default step.
        let interval = spec.interval.max(1);

        let starts = match spec.frequency {
            Frequency::Daily => self.daily_starts(template_start, interval, until),
            Frequency::Weekly => self.weekly_starts(template_start, spec, interval, until),
            Frequency::Monthly => match spec.monthly_pattern {
                MonthlyPattern::DayOfMonth => {
                    self.monthly_day_starts(template_start, interval, until)
                }
                MonthlyPattern::NthWeekday => {
                    self.monthly_nth_weekday_starts(template_start, interval, until)
                }
            },
        };

        starts
            .into_iter()
            .map(|start| OccurrenceWindow {
                start,
                end: start + duration,
            })
            .collect()
    }

    fn daily_starts(
        &self,
        start: NaiveDateTime,
        interval: u32,
        until: NaiveDateTime,
    ) -> Vec<NaiveDateTime> {
        let mut starts = Vec::new();
        let mut current = start;
        while current <= until && starts.len() < self.limits.max_occurrences {
            starts.push(current);
            current += Duration::days(i64::from(interval));
        }
        starts
    }

    /// Weekly scan over calendar weeks beginning at the Sunday of the week
    /// containing `start`. Candidates earlier than `start` in that first
    /// week are dropped while later weekdays of the same week are kept;
    /// this first-week asymmetry is part of the contract.
    fn weekly_starts(
        &self,
        start: NaiveDateTime,
        spec: &RecurrenceSpec,
        interval: u32,
        until: NaiveDateTime,
    ) -> Vec<NaiveDateTime> {
        let mut offsets: Vec<u32> = if spec.days_of_week.is_empty() {
            vec![start.weekday().num_days_from_sunday()]
        } else {
            spec.days_of_week
                .iter()
                .map(|d| d.num_days_from_sunday())
                .collect()
        };
        offsets.sort_unstable();
        offsets.dedup();

        let time_of_day = start.time();
        let mut week_sunday =
            start.date() - Duration::days(i64::from(start.weekday().num_days_from_sunday()));

        let mut starts = Vec::new();
        'weeks: while week_sunday <= until.date() {
            for offset in &offsets {
                let candidate = (week_sunday + Duration::days(i64::from(*offset))).and_time(time_of_day);
                if candidate < start {
                    continue;
                }
                // Candidates ascend across the scan, so the first one past
                // the end finishes the whole expansion.
                if candidate > until {
                    break 'weeks;
                }
                starts.push(candidate);
                if starts.len() >= self.limits.max_occurrences {
                    break 'weeks;
                }
            }
            week_sunday += Duration::days(7 * i64::from(interval));
        }
        starts
    }

    /// Monthly stepping anchored on the previous occurrence. The day of
    /// month clamps at shorter months and does not recover afterwards
    /// (Jan 31 -> Feb 28 -> Mar 28); see DESIGN.md.
    fn monthly_day_starts(
        &self,
        start: NaiveDateTime,
        interval: u32,
        until: NaiveDateTime,
    ) -> Vec<NaiveDateTime> {
        let mut starts = Vec::new();
        let mut current = start;
        while current <= until && starts.len() < self.limits.max_occurrences {
            starts.push(current);
            match current.checked_add_months(Months::new(interval)) {
                Some(next) => current = next,
                None => break,
            }
        }
        starts
    }

    /// Monthly "Nth weekday" stepping (e.g. 2nd Tuesday). Months that lack
    /// the Nth weekday are skipped without counting toward the cap, but the
    /// month cursor always advances, and the scan ends once the first day
    /// of the candidate month passes the end date.
    fn monthly_nth_weekday_starts(
        &self,
        start: NaiveDateTime,
        interval: u32,
        until: NaiveDateTime,
    ) -> Vec<NaiveDateTime> {
        let target_offset = start.weekday().num_days_from_sunday();
        let ordinal = (start.day() - 1) / 7;
        let time_of_day = start.time();

        let mut starts = Vec::new();
        let mut month_first = match start.date().with_day(1) {
            Some(first) => first,
            None => return starts,
        };

        while month_first <= until.date() && starts.len() < self.limits.max_occurrences {
            let first_offset = month_first.weekday().num_days_from_sunday();
            let day = 1 + (target_offset + 7 - first_offset) % 7 + ordinal * 7;

            if day <= days_in_month(month_first) {
                if let Some(date) = month_first.with_day(day) {
                    let candidate = date.and_time(time_of_day);
                    if candidate >= start && candidate <= until {
                        starts.push(candidate);
                    }
                }
            }

            match month_first.checked_add_months(Months::new(interval)) {
                Some(next) => month_first = next,
                None => break,
            }
        }
        starts
    }
}

fn days_in_month(date: NaiveDate) -> u32 {
    date.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.pred_opt())
        .map_or(31, |last| last.day())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, MonthlyPattern, RecurrenceSpec};
    use chrono::{NaiveDate, Weekday};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn generate(
        start: NaiveDateTime,
        end: NaiveDateTime,
        spec: &RecurrenceSpec,
    ) -> Vec<OccurrenceWindow> {
        OccurrenceGenerator::default().generate(start, end, spec)
    }

    #[test]
    fn test_daily_every_third_day_inclusive_end() {
        let mut spec = RecurrenceSpec::new(Frequency::Daily);
        spec.interval = 3;
        spec.recurring_end_date = Some(at(2026, 1, 10, 0, 0));

        let windows = generate(at(2026, 1, 1, 9, 0), at(2026, 1, 1, 10, 0), &spec);

        let days: Vec<u32> = windows.iter().map(|w| w.start.day()).collect();
        assert_eq!(days, vec![1, 4, 7, 10]);
        for w in &windows {
            assert_eq!(w.end - w.start, Duration::hours(1));
        }
    }

    #[test]
    fn test_weekly_default_span_yields_every_monday() {
        // Monday 2026-03-02, no end date: runs through 2026-09-02 14:00,
        // so the last Monday is Aug 31.
        let mut spec = RecurrenceSpec::new(Frequency::Weekly);
        spec.days_of_week = vec![Weekday::Mon];

        let windows = generate(at(2026, 3, 2, 14, 0), at(2026, 3, 2, 16, 0), &spec);

        assert_eq!(windows.len(), 27);
        assert_eq!(windows[0].start, at(2026, 3, 2, 14, 0));
        assert_eq!(windows[26].start, at(2026, 8, 31, 14, 0));
        for w in &windows {
            assert_eq!(w.start.weekday(), Weekday::Mon);
            assert_eq!(w.end - w.start, Duration::hours(2));
        }
    }

    #[test]
    fn test_weekly_two_days_ascending_within_bounds() {
        let mut spec = RecurrenceSpec::new(Frequency::Weekly);
        spec.days_of_week = vec![Weekday::Wed, Weekday::Mon];
        spec.recurring_end_date = Some(at(2026, 4, 30, 0, 0));

        let start = at(2026, 3, 2, 14, 0); // a Monday
        let windows = generate(start, at(2026, 3, 2, 15, 0), &spec);

        assert!(!windows.is_empty());
        for w in &windows {
            assert!(matches!(w.start.weekday(), Weekday::Mon | Weekday::Wed));
            assert!(w.start >= start);
            assert!(w.start <= at(2026, 4, 30, 23, 59));
        }
        for pair in windows.windows(2) {
            assert!(pair[0].start < pair[1].start);
        }
    }

    #[test]
    fn test_weekly_first_week_asymmetry() {
        // Start on Wednesday with Monday also targeted: the Monday of the
        // start week precedes the start and is dropped, while the
        // Wednesday itself is kept.
        let mut spec = RecurrenceSpec::new(Frequency::Weekly);
        spec.days_of_week = vec![Weekday::Mon, Weekday::Wed];
        spec.recurring_end_date = Some(at(2026, 3, 10, 0, 0));

        let windows = generate(at(2026, 3, 4, 14, 0), at(2026, 3, 4, 15, 0), &spec);

        let starts: Vec<NaiveDateTime> = windows.iter().map(|w| w.start).collect();
        assert_eq!(starts, vec![at(2026, 3, 4, 14, 0), at(2026, 3, 9, 14, 0)]);
    }

    #[test]
    fn test_weekly_empty_days_defaults_to_start_weekday() {
        let mut spec = RecurrenceSpec::new(Frequency::Weekly);
        spec.recurring_end_date = Some(at(2026, 3, 31, 0, 0));

        let windows = generate(at(2026, 3, 4, 9, 0), at(2026, 3, 4, 10, 0), &spec);

        assert_eq!(windows.len(), 4); // Mar 4, 11, 18, 25
        for w in &windows {
            assert_eq!(w.start.weekday(), Weekday::Wed);
        }
    }

    #[test]
    fn test_weekly_interval_skips_weeks() {
        let mut spec = RecurrenceSpec::new(Frequency::Weekly);
        spec.interval = 2;
        spec.recurring_end_date = Some(at(2026, 3, 31, 0, 0));

        let windows = generate(at(2026, 3, 2, 14, 0), at(2026, 3, 2, 15, 0), &spec);

        let days: Vec<u32> = windows.iter().map(|w| w.start.day()).collect();
        assert_eq!(days, vec![2, 16, 30]);
    }

    #[test]
    fn test_monthly_day_of_month_clamps_and_drifts() {
        // Starting on the 31st: February clamps to the 28th and the
        // anchor stays there for the rest of the run.
        let mut spec = RecurrenceSpec::new(Frequency::Monthly);
        spec.recurring_end_date = Some(at(2026, 5, 31, 0, 0));

        let windows = generate(at(2026, 1, 31, 10, 0), at(2026, 1, 31, 11, 0), &spec);

        let dates: Vec<(u32, u32)> = windows.iter().map(|w| (w.start.month(), w.start.day())).collect();
        assert_eq!(dates, vec![(1, 31), (2, 28), (3, 28), (4, 28), (5, 28)]);
    }

    #[test]
    fn test_monthly_nth_weekday_first_friday() {
        // 2026-01-02 is the first Friday of January.
        let mut spec = RecurrenceSpec::new(Frequency::Monthly);
        spec.monthly_pattern = MonthlyPattern::NthWeekday;
        spec.recurring_end_date = Some(at(2026, 6, 30, 0, 0));

        let windows = generate(at(2026, 1, 2, 10, 0), at(2026, 1, 2, 11, 0), &spec);

        assert_eq!(windows.len(), 6);
        let dates: Vec<(u32, u32)> = windows.iter().map(|w| (w.start.month(), w.start.day())).collect();
        assert_eq!(dates, vec![(1, 2), (2, 6), (3, 6), (4, 3), (5, 1), (6, 5)]);
        for w in &windows {
            assert_eq!(w.start.weekday(), Weekday::Fri);
        }
    }

    #[test]
    fn test_monthly_nth_weekday_skips_months_without_fifth_friday() {
        // 2026-01-30 is the fifth Friday of January; only May and July
        // have one before the end of July.
        let mut spec = RecurrenceSpec::new(Frequency::Monthly);
        spec.monthly_pattern = MonthlyPattern::NthWeekday;
        spec.recurring_end_date = Some(at(2026, 7, 31, 0, 0));

        let windows = generate(at(2026, 1, 30, 17, 0), at(2026, 1, 30, 19, 0), &spec);

        let dates: Vec<(u32, u32)> = windows.iter().map(|w| (w.start.month(), w.start.day())).collect();
        assert_eq!(dates, vec![(1, 30), (5, 29), (7, 31)]);
    }

    #[test]
    fn test_monthly_nth_weekday_terminates_without_matches() {
        // Fifth Friday with an end date inside a stretch of four-Friday
        // months: the month cursor still advances and the scan ends.
        let mut spec = RecurrenceSpec::new(Frequency::Monthly);
        spec.monthly_pattern = MonthlyPattern::NthWeekday;
        spec.recurring_end_date = Some(at(2026, 4, 30, 0, 0));

        let windows = generate(at(2026, 1, 30, 17, 0), at(2026, 1, 30, 19, 0), &spec);

        let dates: Vec<(u32, u32)> = windows.iter().map(|w| (w.start.month(), w.start.day())).collect();
        assert_eq!(dates, vec![(1, 30)]);
    }

    #[test]
    fn test_occurrence_cap_is_enforced() {
        let mut spec = RecurrenceSpec::new(Frequency::Daily);
        spec.recurring_end_date = Some(at(2027, 12, 31, 0, 0));

        let windows = generate(at(2026, 1, 1, 9, 0), at(2026, 1, 1, 10, 0), &spec);

        assert_eq!(windows.len(), 365);
    }

    #[test]
    fn test_end_before_start_yields_nothing() {
        let mut spec = RecurrenceSpec::new(Frequency::Weekly);
        spec.recurring_end_date = Some(at(2025, 12, 1, 0, 0));

        let windows = generate(at(2026, 1, 5, 9, 0), at(2026, 1, 5, 10, 0), &spec);

        assert!(windows.is_empty());
    }

    #[test]
    fn test_zero_interval_treated_as_one() {
        let mut spec = RecurrenceSpec::new(Frequency::Daily);
        spec.interval = 0;
        spec.recurring_end_date = Some(at(2026, 1, 3, 0, 0));

        let windows = generate(at(2026, 1, 1, 9, 0), at(2026, 1, 1, 10, 0), &spec);

        assert_eq!(windows.len(), 3);
    }
}
