//! Day-view layout: placing overlapping entries side by side.

use crate::worklog::WorkLogEntry;

/// Assigns each entry (in start order) to the first lane whose last entry
/// has already ended, opening a new lane otherwise.
///
/// Returns the lane of every entry and the number of lanes used.
pub fn assign_lanes<'a, I>(entries: I) -> (Vec<usize>, usize)
where
    I: IntoIterator<Item = &'a WorkLogEntry>,
{
    let mut lanes: Vec<&WorkLogEntry> = Vec::new();
    let mut assigned = Vec::new();

    for entry in entries {
        match lanes
            .iter()
            .position(|last| last.end_time <= entry.start_time)
        {
            Some(lane) => {
                lanes[lane] = entry;
                assigned.push(lane);
            }
            None => {
                assigned.push(lanes.len());
                lanes.push(entry);
            }
        }
    }

    (assigned, lanes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 11, 2)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn entry(start: NaiveDateTime, end: NaiveDateTime) -> WorkLogEntry {
        WorkLogEntry::new(start, end, true, "").unwrap()
    }

    #[test]
    fn sequential_entries_share_one_lane() {
        let entries = [
            entry(at(8, 0), at(9, 0)),
            entry(at(9, 0), at(10, 0)),
            entry(at(11, 0), at(12, 0)),
        ];
        assert_eq!(assign_lanes(&entries), (vec![0, 0, 0], 1));
    }

    #[test]
    fn overlapping_entries_open_lanes() {
        let entries = [
            entry(at(8, 0), at(12, 0)),
            entry(at(9, 0), at(10, 0)),
            entry(at(9, 30), at(11, 0)),
            entry(at(10, 0), at(13, 0)),
            entry(at(12, 0), at(12, 30)),
        ];
        assert_eq!(assign_lanes(&entries), (vec![0, 1, 2, 1, 0], 3));
    }

    #[test]
    fn empty_input() {
        let entries: &[WorkLogEntry] = &[];
        assert_eq!(assign_lanes(entries), (Vec::new(), 0));
    }
}
