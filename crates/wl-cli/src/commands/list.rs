//! List command for showing work-log entries.

use std::io::Write;

use anyhow::Result;
use chrono::NaiveDate;
use serde::Serialize;
use wl_core::{WorkLogData, WorkLogEntry, assign_lanes};

use super::util::format_duration;

/// Width of the day bar in characters (one per hour).
const DAY_BAR_WIDTH: usize = 24;

/// An entry as shown to the user, with its position in the full log.
#[derive(Debug, Clone, Serialize)]
pub struct ListedEntry<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub entry: &'a WorkLogEntry,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane: Option<usize>,
}

/// Selects entries for display; with a date, only those touching that day.
pub fn select_entries(data: &WorkLogData, date: Option<NaiveDate>) -> Vec<ListedEntry<'_>> {
    let Some(day) = date else {
        return data
            .iter()
            .enumerate()
            .map(|(index, entry)| ListedEntry {
                index,
                entry,
                lane: None,
            })
            .collect();
    };

    let (lanes, _) = assign_lanes(data.entries_for_date(day));
    data.iter()
        .enumerate()
        .filter(|(_, entry)| entry.day_span(day).is_some())
        .zip(lanes)
        .map(|((index, entry), lane)| ListedEntry {
            index,
            entry,
            lane: Some(lane),
        })
        .collect()
}

/// Renders the part of `day` an entry covers, one cell per hour.
#[expect(
    clippy::cast_precision_loss,
    reason = "bar cell positions are tiny integers"
)]
pub fn day_bar(entry: &WorkLogEntry, day: NaiveDate) -> String {
    let Some((start, end)) = entry.day_span(day) else {
        return "·".repeat(DAY_BAR_WIDTH);
    };
    (0..DAY_BAR_WIDTH)
        .map(|cell| {
            let cell_start = cell as f64 / DAY_BAR_WIDTH as f64;
            let cell_end = (cell + 1) as f64 / DAY_BAR_WIDTH as f64;
            if start < cell_end && cell_start < end {
                '█'
            } else {
                '·'
            }
        })
        .collect()
}

pub fn format_entries(entries: &[ListedEntry<'_>], date: Option<NaiveDate>) -> String {
    if entries.is_empty() {
        return "No entries.\n".to_string();
    }

    let mut output = String::new();
    for listed in entries {
        let entry = listed.entry;
        let kind = if entry.work { "work" } else { "break" };
        let summary = entry.description.lines().next().unwrap_or_default();
        let prefix = match (date, listed.lane) {
            (Some(day), Some(lane)) => format!("{} L{lane} ", day_bar(entry, day)),
            _ => String::new(),
        };
        output.push_str(&format!(
            "{prefix}[{}] {} - {}  {:>7}  {kind:<5}  {summary}",
            listed.index,
            entry.start_time.format("%Y-%m-%d %H:%M"),
            entry.end_time.format("%Y-%m-%d %H:%M"),
            format_duration(entry.duration()),
        ));
        output.truncate(output.trim_end().len());
        output.push('\n');
    }
    output
}

pub fn format_entries_json(entries: &[ListedEntry<'_>]) -> Result<String> {
    Ok(serde_json::to_string_pretty(entries)?)
}

pub fn run<W: Write>(
    writer: &mut W,
    data: &WorkLogData,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let entries = select_entries(data, date);
    if json {
        writeln!(writer, "{}", format_entries_json(&entries)?)?;
    } else {
        write!(writer, "{}", format_entries(&entries, date))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDateTime;
    use insta::assert_snapshot;

    fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample() -> WorkLogData {
        WorkLogData::from_entries(vec![
            WorkLogEntry::new(dt(14, 22, 0), dt(15, 2, 0), false, "").unwrap(),
            WorkLogEntry::new(dt(15, 8, 0), dt(15, 12, 30), true, "review\nsecond line").unwrap(),
            WorkLogEntry::new(dt(15, 11, 0), dt(15, 13, 0), true, "pairing").unwrap(),
            WorkLogEntry::new(dt(16, 9, 0), dt(16, 10, 0), true, "standup").unwrap(),
        ])
    }

    #[test]
    fn list_all_entries() {
        let mut output = Vec::new();
        run(&mut output, &sample(), None, false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        [0] 2025-01-14 22:00 - 2025-01-15 02:00    4h 0m  break
        [1] 2025-01-15 08:00 - 2025-01-15 12:30   4h 30m  work   review
        [2] 2025-01-15 11:00 - 2025-01-15 13:00    2h 0m  work   pairing
        [3] 2025-01-16 09:00 - 2025-01-16 10:00    1h 0m  work   standup
        ");
    }

    #[test]
    fn list_day_keeps_global_indices_and_lanes() {
        let data = sample();
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let entries = select_entries(&data, Some(day));

        let picked: Vec<_> = entries.iter().map(|e| (e.index, e.lane)).collect();
        assert_eq!(picked, [(0, Some(0)), (1, Some(0)), (2, Some(1))]);
    }

    #[test]
    fn list_day_shows_bars() {
        let mut output = Vec::new();
        let day = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        run(&mut output, &sample(), Some(day), false).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r"
        ██······················ L0 [0] 2025-01-14 22:00 - 2025-01-15 02:00    4h 0m  break
        ········█████··········· L0 [1] 2025-01-15 08:00 - 2025-01-15 12:30   4h 30m  work   review
        ···········██··········· L1 [2] 2025-01-15 11:00 - 2025-01-15 13:00    2h 0m  work   pairing
        ");
    }

    #[test]
    fn list_empty_day() {
        let mut output = Vec::new();
        let day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        run(&mut output, &sample(), Some(day), false).unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "No entries.\n");
    }

    #[test]
    fn list_json_flattens_entries() {
        let mut output = Vec::new();
        let day = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        run(&mut output, &sample(), Some(day), true).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        [
          {
            "index": 3,
            "start_time": "2025-01-16T09:00:00",
            "end_time": "2025-01-16T10:00:00",
            "work": true,
            "description": "standup",
            "lane": 0
          }
        ]
        "#);
    }
}
