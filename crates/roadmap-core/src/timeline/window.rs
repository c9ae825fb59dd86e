//! Fixed-length date window for placing interval bars.
//!
//! Windows start on a Monday and span [`DEFAULT_WINDOW_DAYS`] days unless
//! configured otherwise, never more than [`MAX_WINDOW_DAYS`]. Navigation
//! moves by exactly one window length, so repeated `next()`/`previous()`
//! calls never drift off the Monday grid. Dates past the calendar's range
//! saturate at `NaiveDate::MIN`/`NaiveDate::MAX`.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::ParseEnumError;

/// Eight weeks.
pub const DEFAULT_WINDOW_DAYS: u32 = 56;

/// Upper bound on a window's length: ten years of days.
pub const MAX_WINDOW_DAYS: u32 = 3653;

/// Monday on or before `date`.
#[must_use]
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    shift(date, -i64::from(date.weekday().num_days_from_monday()))
}

fn shift(date: NaiveDate, days: i64) -> NaiveDate {
    let edge = if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX };
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(edge)
}

fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineWindow {
    pub start: NaiveDate,
    pub days: u32,
}

/// Horizontal placement of one bar, as percentages of the window width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarPosition {
    pub left_pct: f64,
    pub width_pct: f64,
}

impl TimelineWindow {
    /// The default-length window whose first day is the Monday on or before
    /// `reference`.
    #[must_use]
    pub fn containing(reference: NaiveDate) -> Self {
        Self::with_days(reference, DEFAULT_WINDOW_DAYS)
    }

    /// Like [`containing`](Self::containing) with a custom length, clamped
    /// to `1..=MAX_WINDOW_DAYS`.
    #[must_use]
    pub fn with_days(reference: NaiveDate, days: u32) -> Self {
        Self {
            start: monday_of(reference),
            days: days.clamp(1, MAX_WINDOW_DAYS),
        }
    }

    /// Last visible day, inclusive.
    #[must_use]
    pub fn end(&self) -> NaiveDate {
        shift(self.start, i64::from(self.days) - 1)
    }

    #[must_use]
    pub fn next(&self) -> Self {
        self.offset(1)
    }

    #[must_use]
    pub fn previous(&self) -> Self {
        self.offset(-1)
    }

    /// Move by `windows` whole window lengths; negative moves back.
    #[must_use]
    pub fn offset(&self, windows: i64) -> Self {
        Self {
            start: shift(self.start, windows.saturating_mul(i64::from(self.days))),
            days: self.days,
        }
    }

    #[must_use]
    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.start && day <= self.end()
    }

    /// True when `start..=end` shares at least one day with the window.
    #[must_use]
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        end >= self.start && start <= self.end()
    }

    /// Bar for `start..=end`, clipped to the window. `None` when the range
    /// is entirely outside it. A visible span shorter than a day still gets
    /// one day of width.
    #[must_use]
    pub fn bar_position(&self, start: NaiveDate, end: NaiveDate) -> Option<BarPosition> {
        if !self.overlaps(start, end) {
            return None;
        }
        let visible_start = start.max(self.start);
        let visible_end = end.min(self.end());
        let offset = days_between(self.start, visible_start);
        let visible = (days_between(visible_start, visible_end) + 1).max(1);

        let total = f64::from(self.days);
        let left_pct = f64::from(u32::try_from(offset).unwrap_or(0)) / total * 100.0;
        let width_pct = f64::from(u32::try_from(visible).unwrap_or(self.days)) / total * 100.0;
        Some(BarPosition {
            left_pct,
            width_pct: width_pct.min(100.0 - left_pct),
        })
    }

    /// Column headers for `view`.
    #[must_use]
    pub fn periods(&self, view: TimelineView) -> Vec<Period> {
        match view.span_days() {
            Some(span) => self.fixed_periods(span),
            None => self.month_periods(),
        }
    }

    fn fixed_periods(&self, span: u32) -> Vec<Period> {
        let count = self.days.div_ceil(span);
        let last = self.end();
        (0..count)
            .map(|i| {
                let start = shift(self.start, i64::from(i * span));
                let end = shift(start, i64::from(span) - 1).min(last);
                Period {
                    label: format!("{} - {}", start.format("%b %-d"), end.format("%b %-d")),
                    start,
                    end,
                }
            })
            .collect()
    }

    fn month_periods(&self) -> Vec<Period> {
        let last = self.end();
        let mut periods = Vec::new();
        let mut month = self.start.with_day(1).unwrap_or(self.start);
        while month <= last {
            let next = month
                .checked_add_months(chrono::Months::new(1))
                .unwrap_or(last.succ_opt().unwrap_or(last));
            periods.push(Period {
                label: month.format("%b %Y").to_string(),
                start: month,
                end: next.pred_opt().unwrap_or(month),
            });
            if next <= month {
                break;
            }
            month = next;
        }
        periods
    }
}

/// One column header. Month periods cover the whole calendar month even
/// when it extends past the window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Period {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimelineView {
    Weekly,
    #[default]
    BiWeekly,
    Monthly,
}

impl TimelineView {
    pub const ALL: [Self; 3] = [Self::Weekly, Self::BiWeekly, Self::Monthly];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::BiWeekly => "bi-weekly",
            Self::Monthly => "monthly",
        }
    }

    /// Column width in days; `None` for calendar months.
    #[must_use]
    pub const fn span_days(self) -> Option<u32> {
        match self {
            Self::Weekly => Some(7),
            Self::BiWeekly => Some(14),
            Self::Monthly => None,
        }
    }
}

impl fmt::Display for TimelineView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimelineView {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "weekly" | "week" => Ok(Self::Weekly),
            "bi-weekly" | "biweekly" => Ok(Self::BiWeekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(ParseEnumError {
                expected: "timeline view",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn monday_of_aligns_backwards() {
        // 2025-01-06 is a Monday.
        assert_eq!(monday_of(day(2025, 1, 6)), day(2025, 1, 6));
        assert_eq!(monday_of(day(2025, 1, 8)), day(2025, 1, 6));
        // Sunday belongs to the week that started six days earlier.
        assert_eq!(monday_of(day(2025, 1, 12)), day(2025, 1, 6));
        assert_eq!(monday_of(day(2025, 1, 13)), day(2025, 1, 13));
    }

    #[test]
    fn window_spans_56_inclusive_days() {
        let window = TimelineWindow::containing(day(2025, 1, 8));
        assert_eq!(window.start, day(2025, 1, 6));
        assert_eq!(window.end(), day(2025, 3, 2));
        assert!(window.contains(day(2025, 3, 2)));
        assert!(!window.contains(day(2025, 3, 3)));
    }

    #[test]
    fn navigation_moves_exactly_one_window() {
        let window = TimelineWindow::containing(day(2025, 1, 6));
        assert_eq!(window.next().start, day(2025, 3, 3));
        assert_eq!(window.previous().start, day(2024, 11, 11));
        assert_eq!(window.next().previous(), window);
        assert_eq!(window.offset(3), window.next().next().next());
    }

    #[test]
    fn overlap_is_inclusive_on_both_edges() {
        let window = TimelineWindow::containing(day(2025, 1, 6));
        assert!(window.overlaps(day(2024, 12, 1), day(2025, 1, 6)));
        assert!(window.overlaps(day(2025, 3, 2), day(2025, 4, 1)));
        assert!(!window.overlaps(day(2024, 12, 1), day(2025, 1, 5)));
        assert!(!window.overlaps(day(2025, 3, 3), day(2025, 4, 1)));
    }

    #[test]
    fn bar_position_clips_to_window() {
        let window = TimelineWindow::containing(day(2025, 1, 6));

        let inside = window
            .bar_position(day(2025, 1, 20), day(2025, 1, 26))
            .expect("overlaps");
        assert!((inside.left_pct - 25.0).abs() < 1e-9);
        assert!((inside.width_pct - 12.5).abs() < 1e-9);

        let spanning = window
            .bar_position(day(2024, 1, 1), day(2026, 1, 1))
            .expect("overlaps");
        assert!(spanning.left_pct.abs() < 1e-9);
        assert!((spanning.width_pct - 100.0).abs() < 1e-9);

        assert_eq!(window.bar_position(day(2025, 4, 1), day(2025, 4, 2)), None);
    }

    #[test]
    fn single_day_bar_has_minimum_width() {
        let window = TimelineWindow::containing(day(2025, 1, 6));
        let bar = window
            .bar_position(day(2025, 3, 2), day(2025, 3, 2))
            .expect("overlaps");
        assert!((bar.width_pct - 100.0 / 56.0).abs() < 1e-9);
        assert!(bar.left_pct + bar.width_pct <= 100.0 + 1e-9);
    }

    #[test]
    fn weekly_and_biweekly_periods() {
        let window = TimelineWindow::containing(day(2025, 1, 6));
        let weeks = window.periods(TimelineView::Weekly);
        assert_eq!(weeks.len(), 8);
        assert_eq!(weeks[0].label, "Jan 6 - Jan 12");
        assert_eq!(weeks[7].end, window.end());

        let fortnights = window.periods(TimelineView::BiWeekly);
        assert_eq!(fortnights.len(), 4);
        assert_eq!(fortnights[1].label, "Jan 20 - Feb 2");
    }

    #[test]
    fn monthly_periods_cover_intersecting_months() {
        let window = TimelineWindow::containing(day(2025, 1, 6));
        let months = window.periods(TimelineView::Monthly);
        let labels: Vec<&str> = months.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 2025", "Feb 2025", "Mar 2025"]);
        assert_eq!(months[0].start, day(2025, 1, 1));
        assert_eq!(months[1].end, day(2025, 2, 28));
    }

    #[test]
    fn oversized_window_is_clamped() {
        let window = TimelineWindow::with_days(day(2025, 1, 6), 100_000_000);
        assert_eq!(window.days, MAX_WINDOW_DAYS);
        assert!(window.end() > window.start);
        assert!(window.contains(day(2025, 1, 7)));
        assert!(window.bar_position(day(2025, 1, 6), day(2025, 1, 6)).is_some());

        let weeks = window.periods(TimelineView::Weekly);
        assert_eq!(weeks.len(), 522);
        assert_eq!(weeks.last().map(|p| p.end), Some(window.end()));

        assert_eq!(TimelineWindow::with_days(day(2025, 1, 6), 0).days, 1);
    }

    #[test]
    fn navigation_saturates_at_calendar_edges() {
        let window = TimelineWindow::containing(day(2025, 1, 6));

        let last = window.offset(i64::MAX);
        assert_eq!(last.start, NaiveDate::MAX);
        assert_eq!(last.end(), NaiveDate::MAX);
        assert!(last.contains(NaiveDate::MAX));

        let first = window.offset(i64::MIN);
        assert_eq!(first.start, NaiveDate::MIN);
        assert!(first.end() > first.start);
    }

    #[test]
    fn view_round_trips_through_strings() {
        for view in TimelineView::ALL {
            assert_eq!(view.as_str().parse::<TimelineView>().ok(), Some(view));
        }
        assert_eq!("BI_WEEKLY".parse::<TimelineView>().ok(), Some(TimelineView::BiWeekly));
        assert!("daily".parse::<TimelineView>().is_err());
        assert_eq!(TimelineView::default(), TimelineView::BiWeekly);
    }
}
