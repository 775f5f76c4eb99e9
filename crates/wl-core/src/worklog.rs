//! Work-log entries and the timeline they form.
//!
//! [`WorkLogData`] keeps its entries sorted by start time after every
//! mutation. Neighbours (for joins and merges) are defined by list position,
//! not by the gap between entries.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{Interval, truncate_to_minute};

/// Default window within which the periodic tick extends the recent entry.
pub const DEFAULT_TICK_MAX_GAP_MINUTES: i64 = 120;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkLogError {
    #[error("no entry at index {0}")]
    OutOfRange(usize),
    #[error("entry {index} has no {direction} neighbour")]
    NoNeighbor {
        index: usize,
        direction: &'static str,
    },
    #[error("entry would end ({end}) before it starts ({start})")]
    InvalidRange {
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// One new interval touches several recorded entries; which one to widen
    /// is a user decision.
    #[error(
        "interval {start} - {end} overlaps {overlaps} existing entries, manual reconciliation required"
    )]
    AmbiguousOverlap {
        start: NaiveDateTime,
        end: NaiveDateTime,
        overlaps: usize,
    },
}

/// A user-facing timeline record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLogEntry {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    /// `true` for work, `false` for a break.
    pub work: bool,
    #[serde(default)]
    pub description: String,
}

impl WorkLogEntry {
    /// Creates an entry at minute resolution.
    pub fn new(
        start_time: NaiveDateTime,
        end_time: NaiveDateTime,
        work: bool,
        description: impl Into<String>,
    ) -> Result<Self, WorkLogError> {
        let start_time = truncate_to_minute(start_time);
        let end_time = truncate_to_minute(end_time);
        if end_time < start_time {
            return Err(WorkLogError::InvalidRange {
                start: start_time,
                end: end_time,
            });
        }
        Ok(Self {
            start_time,
            end_time,
            work,
            description: description.into(),
        })
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// Inclusive overlap test against `[start, end]`.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_time <= end && start <= self.end_time
    }

    /// Part of `day` covered by the entry as fractions of the day.
    ///
    /// Returns `None` when the entry does not touch the day.
    pub fn day_span(&self, day: NaiveDate) -> Option<(f64, f64)> {
        let day_start = day.and_hms_opt(0, 0, 0)?;
        let day_end = day_start + Duration::days(1);
        // ending exactly at midnight does not touch the next day
        let ends_before = self.end_time < day_start
            || (self.end_time == day_start && self.start_time < day_start);
        if ends_before || self.start_time >= day_end {
            return None;
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "seconds within a day fit exactly in f64"
        )]
        let fraction = |value: NaiveDateTime| {
            let clamped = value.clamp(day_start, day_end);
            (clamped - day_start).num_seconds() as f64 / 86_400.0
        };
        Some((fraction(self.start_time), fraction(self.end_time)))
    }

    fn absorb(&mut self, other: Self, other_is_earlier: bool) {
        self.start_time = self.start_time.min(other.start_time);
        self.end_time = self.end_time.max(other.end_time);
        let (first, second) = if other_is_earlier {
            (other.description, std::mem::take(&mut self.description))
        } else {
            (std::mem::take(&mut self.description), other.description)
        };
        self.description = match (first.is_empty(), second.is_empty()) {
            (true, _) => second,
            (_, true) => first,
            _ => format!("{first}\n{second}"),
        };
    }
}

/// Outcome of [`WorkLogData::merge_intervals`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub created: usize,
    pub extended: usize,
    pub discarded: usize,
}

/// Chronological collection of work-log entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkLogData {
    entries: Vec<WorkLogEntry>,
}

impl WorkLogData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from arbitrary entries, sorting them.
    pub fn from_entries(mut entries: Vec<WorkLogEntry>) -> Self {
        entries.sort_by_key(|e| e.start_time);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WorkLogEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkLogEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[WorkLogEntry] {
        &self.entries
    }

    /// The entry that starts last.
    pub fn recent_entry(&self) -> Option<&WorkLogEntry> {
        self.entries.last()
    }

    pub fn next_entry(&self, index: usize) -> Option<&WorkLogEntry> {
        self.entries.get(index.checked_add(1)?)
    }

    pub fn prev_entry(&self, index: usize) -> Option<&WorkLogEntry> {
        self.entries.get(index.checked_sub(1)?)
    }

    /// Inserts an entry at its sorted position and returns that position.
    ///
    /// Entries with equal start times keep insertion order.
    pub fn add_entry(&mut self, entry: WorkLogEntry) -> usize {
        let index = self
            .entries
            .partition_point(|e| e.start_time <= entry.start_time);
        self.entries.insert(index, entry);
        index
    }

    pub fn remove_entry(&mut self, index: usize) -> Result<WorkLogEntry, WorkLogError> {
        self.check_index(index)?;
        Ok(self.entries.remove(index))
    }

    /// Replaces the entry at `index`, returning the old one.
    pub fn replace_entry(
        &mut self,
        index: usize,
        entry: WorkLogEntry,
    ) -> Result<WorkLogEntry, WorkLogError> {
        self.check_index(index)?;
        let old = std::mem::replace(&mut self.entries[index], entry);
        self.sort();
        Ok(old)
    }

    /// Entries intersecting the calendar day, in order.
    pub fn entries_for_date(&self, day: NaiveDate) -> Vec<&WorkLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.day_span(day).is_some())
            .collect()
    }

    /// Moves the start of entry `index` onto the end of its predecessor.
    ///
    /// Returns the entry's index after re-sorting; it moves down the list when
    /// the predecessor ends after later entries start.
    pub fn join_up(&mut self, index: usize) -> Result<usize, WorkLogError> {
        self.check_index(index)?;
        let prev_end = self
            .prev_entry(index)
            .ok_or(WorkLogError::NoNeighbor {
                index,
                direction: "previous",
            })?
            .end_time;
        if self.entries[index].end_time < prev_end {
            return Err(WorkLogError::InvalidRange {
                start: prev_end,
                end: self.entries[index].end_time,
            });
        }
        let mut entry = self.entries.remove(index);
        entry.start_time = prev_end;
        Ok(self.add_entry(entry))
    }

    /// Moves the end of entry `index` onto the start of its successor.
    ///
    /// The start is unchanged, so the entry keeps its index.
    pub fn join_down(&mut self, index: usize) -> Result<usize, WorkLogError> {
        self.check_index(index)?;
        let next_start = self
            .next_entry(index)
            .ok_or(WorkLogError::NoNeighbor {
                index,
                direction: "next",
            })?
            .start_time;
        let entry = &mut self.entries[index];
        if next_start < entry.start_time {
            return Err(WorkLogError::InvalidRange {
                start: entry.start_time,
                end: next_start,
            });
        }
        entry.end_time = next_start;
        Ok(index)
    }

    /// Absorbs entry `index` into its predecessor.
    pub fn merge_up(&mut self, index: usize) -> Result<(), WorkLogError> {
        self.check_index(index)?;
        if index == 0 {
            return Err(WorkLogError::NoNeighbor {
                index,
                direction: "previous",
            });
        }
        let entry = self.entries.remove(index);
        self.entries[index - 1].absorb(entry, false);
        self.sort();
        Ok(())
    }

    /// Absorbs entry `index` into its successor.
    pub fn merge_down(&mut self, index: usize) -> Result<(), WorkLogError> {
        self.check_index(index)?;
        if index + 1 >= self.entries.len() {
            return Err(WorkLogError::NoNeighbor {
                index,
                direction: "next",
            });
        }
        let entry = self.entries.remove(index);
        self.entries[index].absorb(entry, true);
        self.sort();
        Ok(())
    }

    /// Integrates freshly parsed activity intervals.
    ///
    /// Intervals ending before the recent entry's end are already recorded.
    /// The others either widen the single entry they overlap or become new
    /// entries; the newest created entry gets `work_default`. Nothing changes
    /// when an interval overlaps more than one entry.
    pub fn merge_intervals(
        &mut self,
        intervals: &[Interval],
        work_default: bool,
    ) -> Result<MergeSummary, MergeError> {
        let recent_date = self.recent_entry().map(|e| e.end_time);
        let mut staged = self.entries.clone();
        let mut summary = MergeSummary::default();
        let mut last_created: Option<usize> = None;

        for interval in intervals {
            let start = truncate_to_minute(interval.start);
            let end = truncate_to_minute(interval.end);
            if recent_date.is_some_and(|recent| end < recent) {
                summary.discarded += 1;
                continue;
            }

            let overlapping: Vec<usize> = staged
                .iter()
                .enumerate()
                .filter(|(_, e)| e.overlaps(start, end))
                .map(|(idx, _)| idx)
                .collect();

            match overlapping.as_slice() {
                [] => {
                    staged.push(WorkLogEntry {
                        start_time: start,
                        end_time: end,
                        work: false,
                        description: String::new(),
                    });
                    last_created = Some(staged.len() - 1);
                    summary.created += 1;
                }
                [idx] => {
                    let entry = &mut staged[*idx];
                    entry.start_time = entry.start_time.min(start);
                    entry.end_time = entry.end_time.max(end);
                    summary.extended += 1;
                }
                many => {
                    return Err(MergeError::AmbiguousOverlap {
                        start,
                        end,
                        overlaps: many.len(),
                    });
                }
            }
        }

        if let Some(idx) = last_created {
            staged[idx].work = work_default;
        }
        staged.sort_by_key(|e| e.start_time);
        self.entries = staged;

        tracing::debug!(
            created = summary.created,
            extended = summary.extended,
            discarded = summary.discarded,
            "merged intervals"
        );
        Ok(summary)
    }

    /// Periodic tick: stretches the recent entry up to `now` when it ended
    /// no longer than `max_gap` ago. Returns whether anything changed.
    pub fn extend_recent(&mut self, now: NaiveDateTime, max_gap: Duration) -> bool {
        let now = truncate_to_minute(now);
        let Some(recent) = self.entries.last_mut() else {
            return false;
        };
        if now <= recent.end_time || now - recent.end_time > max_gap {
            return false;
        }
        recent.end_time = now;
        true
    }

    fn check_index(&self, index: usize) -> Result<(), WorkLogError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(WorkLogError::OutOfRange(index))
        }
    }

    fn sort(&mut self) {
        self.entries.sort_by_key(|e| e.start_time);
    }
}

impl<'a> IntoIterator for &'a WorkLogData {
    type Item = &'a WorkLogEntry;
    type IntoIter = std::slice::Iter<'a, WorkLogEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 3, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn entry(start: NaiveDateTime, end: NaiveDateTime, description: &str) -> WorkLogEntry {
        WorkLogEntry::new(start, end, true, description).unwrap()
    }

    fn interval(start: NaiveDateTime, end: NaiveDateTime) -> Interval {
        Interval::new(start, end).unwrap()
    }

    fn sample() -> WorkLogData {
        WorkLogData::from_entries(vec![
            entry(dt(24, 6, 0), dt(24, 12, 0), "xxx"),
            entry(dt(25, 6, 0), dt(25, 12, 0), "yyy"),
            entry(dt(23, 6, 0), dt(23, 12, 0), "zzz"),
        ])
    }

    #[test]
    fn entry_truncates_to_minute() {
        let start = NaiveDate::from_ymd_opt(2020, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 59)
            .unwrap();
        let e = WorkLogEntry::new(start, dt(1, 9, 0), false, "").unwrap();
        assert_eq!(e.start_time, dt(1, 8, 0));
    }

    #[test]
    fn entry_rejects_inverted_range() {
        assert!(WorkLogEntry::new(dt(1, 9, 0), dt(1, 8, 0), true, "").is_err());
    }

    #[test]
    fn add_entry_keeps_sorted() {
        let mut history = WorkLogData::new();
        history.add_entry(entry(dt(24, 6, 0), dt(24, 12, 0), "xxx"));
        history.add_entry(entry(dt(25, 6, 0), dt(25, 12, 0), "yyy"));
        let idx = history.add_entry(entry(dt(23, 6, 0), dt(23, 12, 0), "zzz"));

        assert_eq!(idx, 0);
        let order: Vec<_> = history.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(order, ["zzz", "xxx", "yyy"]);
        assert_eq!(history.recent_entry().unwrap().description, "yyy");
    }

    #[test]
    fn neighbours_follow_list_position() {
        let history = sample();
        assert_eq!(history.next_entry(0).unwrap().description, "xxx");
        assert_eq!(history.prev_entry(2).unwrap().description, "xxx");
        assert!(history.prev_entry(0).is_none());
        assert!(history.next_entry(2).is_none());
    }

    #[test]
    fn replace_entry_resorts() {
        let mut history = sample();
        let old = history
            .replace_entry(0, entry(dt(26, 6, 0), dt(26, 7, 0), "later"))
            .unwrap();
        assert_eq!(old.description, "zzz");
        assert_eq!(history.recent_entry().unwrap().description, "later");
        assert!(history.replace_entry(9, old).is_err());
    }

    #[test]
    fn remove_entry_out_of_range() {
        let mut history = sample();
        assert_eq!(history.remove_entry(3), Err(WorkLogError::OutOfRange(3)));
        assert_eq!(history.remove_entry(1).unwrap().description, "xxx");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn join_down_moves_end_to_next_start() {
        let mut history = sample();
        history.join_down(0).unwrap();
        assert_eq!(history.get(0).unwrap().end_time, dt(24, 6, 0));
        assert_eq!(history.len(), 3);
        assert!(matches!(
            history.join_down(2),
            Err(WorkLogError::NoNeighbor { .. })
        ));
    }

    #[test]
    fn join_up_moves_start_to_prev_end() {
        let mut history = sample();
        history.join_up(1).unwrap();
        assert_eq!(history.get(1).unwrap().start_time, dt(23, 12, 0));
        assert_eq!(history.get(1).unwrap().end_time, dt(24, 12, 0));
        assert!(history.join_up(0).is_err());
    }

    #[test]
    fn join_up_reports_new_position_after_resort() {
        let mut history = WorkLogData::from_entries(vec![
            entry(dt(1, 8, 0), dt(1, 18, 0), "a"),
            entry(dt(1, 9, 0), dt(1, 20, 0), "b"),
            entry(dt(1, 10, 0), dt(1, 11, 0), "c"),
        ]);
        let index = history.join_up(1).unwrap();
        assert_eq!(index, 2);
        let joined = history.get(index).unwrap();
        assert_eq!(joined.description, "b");
        assert_eq!(joined.start_time, dt(1, 18, 0));
        let order: Vec<_> = history.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(order, ["a", "c", "b"]);
    }

    #[test]
    fn join_down_keeps_index() {
        let mut history = sample();
        assert_eq!(history.join_down(1).unwrap(), 1);
    }

    #[test]
    fn join_up_rejects_inverted_result() {
        let mut history = WorkLogData::from_entries(vec![
            entry(dt(1, 8, 0), dt(1, 18, 0), "long"),
            entry(dt(1, 9, 0), dt(1, 10, 0), "nested"),
        ]);
        assert!(matches!(
            history.join_up(1),
            Err(WorkLogError::InvalidRange { .. })
        ));
        assert_eq!(history.get(1).unwrap().start_time, dt(1, 9, 0));
    }

    #[test]
    fn merge_up_absorbs_into_previous() {
        let mut history = sample();
        history.merge_up(1).unwrap();
        assert_eq!(history.len(), 2);
        let merged = history.get(0).unwrap();
        assert_eq!(merged.start_time, dt(23, 6, 0));
        assert_eq!(merged.end_time, dt(24, 12, 0));
        assert_eq!(merged.description, "zzz\nxxx");
        assert!(history.merge_up(0).is_err());
    }

    #[test]
    fn merge_down_absorbs_into_next() {
        let mut history = sample();
        history.merge_down(1).unwrap();
        assert_eq!(history.len(), 2);
        let merged = history.get(1).unwrap();
        assert_eq!(merged.start_time, dt(24, 6, 0));
        assert_eq!(merged.end_time, dt(25, 12, 0));
        assert_eq!(merged.description, "xxx\nyyy");
        assert!(history.merge_down(1).is_err());
    }

    #[test]
    fn merge_skips_empty_descriptions() {
        let mut history = WorkLogData::from_entries(vec![
            entry(dt(1, 8, 0), dt(1, 9, 0), ""),
            entry(dt(1, 9, 0), dt(1, 10, 0), "meeting"),
        ]);
        history.merge_up(1).unwrap();
        assert_eq!(history.get(0).unwrap().description, "meeting");
    }

    #[test]
    fn merge_intervals_extends_recent_entry() {
        let t = dt(2, 12, 0);
        let mut history = WorkLogData::from_entries(vec![entry(dt(2, 8, 0), t, "morning")]);

        let summary = history
            .merge_intervals(
                &[interval(t - Duration::minutes(5), t + Duration::minutes(10))],
                true,
            )
            .unwrap();

        assert_eq!(summary.extended, 1);
        assert_eq!(summary.created, 0);
        assert_eq!(history.len(), 1);
        let e = history.get(0).unwrap();
        assert_eq!(e.start_time, dt(2, 8, 0));
        assert_eq!(e.end_time, t + Duration::minutes(10));
    }

    #[test]
    fn merge_intervals_discards_already_recorded() {
        let mut history = WorkLogData::from_entries(vec![entry(dt(2, 8, 0), dt(2, 12, 0), "")]);
        let before = history.clone();

        let summary = history
            .merge_intervals(&[interval(dt(1, 8, 0), dt(1, 17, 0))], true)
            .unwrap();

        assert_eq!(summary.discarded, 1);
        assert_eq!(history, before);
    }

    #[test]
    fn merge_intervals_appends_new_entries() {
        let mut history = WorkLogData::from_entries(vec![entry(dt(2, 8, 0), dt(2, 12, 0), "")]);

        let summary = history
            .merge_intervals(
                &[
                    interval(dt(3, 8, 0), dt(3, 9, 0)),
                    interval(dt(3, 10, 0), dt(3, 11, 30)),
                ],
                true,
            )
            .unwrap();

        assert_eq!(summary.created, 2);
        assert_eq!(history.len(), 3);
        assert!(!history.get(1).unwrap().work);
        assert!(history.get(2).unwrap().work);
        assert_eq!(history.get(2).unwrap().end_time, dt(3, 11, 30));
    }

    #[test]
    fn merge_intervals_into_empty_log() {
        let mut history = WorkLogData::new();
        history
            .merge_intervals(&[interval(dt(3, 8, 0), dt(3, 9, 0))], false)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert!(!history.get(0).unwrap().work);
    }

    #[test]
    fn merge_intervals_ambiguous_overlap_leaves_data_untouched() {
        let mut history = WorkLogData::from_entries(vec![
            entry(dt(2, 8, 0), dt(2, 9, 0), "a"),
            entry(dt(2, 10, 0), dt(2, 11, 0), "b"),
        ]);
        let before = history.clone();

        let result = history.merge_intervals(
            &[
                interval(dt(2, 11, 30), dt(2, 11, 45)),
                interval(dt(2, 8, 30), dt(2, 12, 0)),
            ],
            true,
        );

        assert_eq!(
            result,
            Err(MergeError::AmbiguousOverlap {
                start: dt(2, 8, 30),
                end: dt(2, 12, 0),
                overlaps: 3,
            })
        );
        assert_eq!(history, before);
    }

    #[test]
    fn extend_recent_within_gap() {
        let mut history = WorkLogData::from_entries(vec![entry(dt(2, 8, 0), dt(2, 12, 0), "")]);
        assert!(history.extend_recent(dt(2, 13, 30), Duration::hours(2)));
        assert_eq!(history.recent_entry().unwrap().end_time, dt(2, 13, 30));
    }

    #[test]
    fn extend_recent_ignores_stale_entry() {
        let mut history = WorkLogData::from_entries(vec![entry(dt(2, 8, 0), dt(2, 12, 0), "")]);
        assert!(!history.extend_recent(dt(2, 14, 1), Duration::hours(2)));
        assert!(!WorkLogData::new().extend_recent(dt(2, 14, 1), Duration::hours(2)));
    }

    #[test]
    fn day_span_clamps_to_day() {
        let e = entry(dt(1, 18, 0), dt(2, 6, 0), "");
        let day1 = NaiveDate::from_ymd_opt(2020, 3, 1).unwrap();
        let day2 = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        let day3 = NaiveDate::from_ymd_opt(2020, 3, 3).unwrap();

        let (start, end) = e.day_span(day1).unwrap();
        assert!((start - 0.75).abs() < 1e-9);
        assert!((end - 1.0).abs() < 1e-9);

        let (start, end) = e.day_span(day2).unwrap();
        assert!(start.abs() < 1e-9);
        assert!((end - 0.25).abs() < 1e-9);

        assert!(e.day_span(day3).is_none());
    }

    #[test]
    fn day_span_ignores_midnight_boundary_touch() {
        let evening = entry(dt(1, 20, 0), dt(2, 0, 0), "evening");
        let day2 = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        assert!(evening.day_span(day2).is_none());

        let mut history = WorkLogData::new();
        history.add_entry(evening);
        assert!(history.entries_for_date(day2).is_empty());

        let marker = entry(dt(2, 0, 0), dt(2, 0, 0), "marker");
        assert_eq!(marker.day_span(day2), Some((0.0, 0.0)));
    }

    #[test]
    fn entries_for_date_includes_overnight() {
        let mut history = sample();
        history.add_entry(entry(dt(23, 22, 0), dt(24, 1, 0), "night"));
        let day = NaiveDate::from_ymd_opt(2020, 3, 24).unwrap();
        let found: Vec<_> = history
            .entries_for_date(day)
            .into_iter()
            .map(|e| e.description.as_str())
            .collect();
        assert_eq!(found, ["night", "xxx"]);
    }

    #[test]
    fn serde_roundtrip() {
        let history = sample();
        let json = serde_json::to_string(&history).unwrap();
        let parsed: WorkLogData = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, history);
    }
}
