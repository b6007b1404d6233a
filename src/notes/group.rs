//! Month grouping

use super::Note;
use std::collections::BTreeMap;
use std::fmt;

/// Key of a month group.
///
/// Known months order chronologically; `Unknown` always sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Month { year: i32, month: u32 },
    Unknown,
}

impl GroupKey {
    /// Sentinel string for undated notes
    pub const UNKNOWN: &'static str = "unknown";

    pub fn is_unknown(&self) -> bool {
        matches!(self, GroupKey::Unknown)
    }

    /// Display label, e.g. `March 2025` or `Unknown Date`
    pub fn label(&self) -> String {
        match self {
            GroupKey::Month { year, month } => {
                format!("{} {}", super::month_name(*month), year)
            }
            GroupKey::Unknown => "Unknown Date".to_string(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Month { year, month } => write!(f, "{:04}-{:02}", year, month),
            GroupKey::Unknown => f.write_str(Self::UNKNOWN),
        }
    }
}

/// All notes of one calendar month (or all undated notes).
#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    pub key: GroupKey,
    /// Notes by day ascending; undated notes keep scan order
    pub notes: Vec<Note>,
}

impl MonthGroup {
    /// `YYYY-MM` or `unknown`
    pub fn key_string(&self) -> String {
        self.key.to_string()
    }

    pub fn display_name(&self) -> String {
        self.key.label()
    }

    /// Notes with something left after cleaning
    pub fn notes_with_content(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(|n| n.has_content())
    }

    pub fn is_empty(&self) -> bool {
        self.notes_with_content().next().is_none()
    }
}

/// Partition notes into month groups.
///
/// Every note lands in exactly one group. Dated notes are sorted by day
/// (stable, so same-day notes keep scan order); groups are returned in
/// chronological order with the undated group, if any, last.
pub fn group_by_month(notes: Vec<Note>) -> Vec<MonthGroup> {
    let mut buckets: BTreeMap<GroupKey, Vec<Note>> = BTreeMap::new();

    for note in notes {
        let key = match note.date {
            Some(date) => GroupKey::Month {
                year: date.year,
                month: date.month,
            },
            None => GroupKey::Unknown,
        };
        buckets.entry(key).or_default().push(note);
    }

    buckets
        .into_iter()
        .map(|(key, mut notes)| {
            if !key.is_unknown() {
                notes.sort_by_key(|n| n.date.map(|d| d.day).unwrap_or(0));
            }
            MonthGroup { key, notes }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(name: &str, heading: &str) -> Note {
        Note::new(name, format!("{}\nsomething happened", heading), 2025)
    }

    #[test]
    fn groups_are_chronological_with_unknown_last() {
        let notes = vec![
            note("x.md", "no heading"),
            note("a.md", "## 11/3/25"),
            note("b.md", "## 2/9/25"),
            note("c.md", "## 2/1/25"),
        ];
        let groups = group_by_month(notes);
        let keys: Vec<String> = groups.iter().map(|g| g.key_string()).collect();
        assert_eq!(keys, vec!["2025-02", "2025-11", "unknown"]);
        assert_eq!(groups[2].display_name(), "Unknown Date");
        assert_eq!(groups[0].display_name(), "February 2025");
    }

    #[test]
    fn dated_notes_sort_by_day_stably() {
        let notes = vec![
            note("late.md", "## 2/20/25"),
            note("first-tie.md", "## 2/3/25"),
            note("second-tie.md", "## 2/3/25"),
            note("early.md", "## 2/1/25"),
        ];
        let groups = group_by_month(notes);
        let names: Vec<&str> = groups[0].notes.iter().map(|n| n.filename.as_str()).collect();
        assert_eq!(names, vec!["early.md", "first-tie.md", "second-tie.md", "late.md"]);
    }

    #[test]
    fn unknown_group_keeps_scan_order() {
        let notes = vec![
            note("z.md", "## 40/40/25"),
            note("a.md", "plain"),
            note("m.md", "# Title"),
        ];
        let groups = group_by_month(notes);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].key.is_unknown());
        let names: Vec<&str> = groups[0].notes.iter().map(|n| n.filename.as_str()).collect();
        assert_eq!(names, vec!["z.md", "a.md", "m.md"]);
    }

    #[test]
    fn corrected_years_merge_into_one_month() {
        let notes = vec![note("a.md", "## 5/1/24"), note("b.md", "## 5/2/25")];
        let groups = group_by_month(notes);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].notes.len(), 2);
    }

    #[test]
    fn grouping_is_exhaustive_and_exclusive() {
        let notes: Vec<Note> = (0..40)
            .map(|i| {
                let heading = if i % 7 == 0 {
                    "undated".to_string()
                } else {
                    format!("## {}/{}/25", i % 12 + 1, i % 28 + 1)
                };
                note(&format!("{:02}.md", i), &heading)
            })
            .collect();
        let mut expected: Vec<String> = notes.iter().map(|n| n.filename.clone()).collect();

        let groups = group_by_month(notes);
        let mut seen: Vec<String> = groups
            .iter()
            .flat_map(|g| g.notes.iter().map(|n| n.filename.clone()))
            .collect();

        expected.sort();
        seen.sort();
        assert_eq!(seen, expected);
    }

    #[test]
    fn empty_group_detection() {
        let group = MonthGroup {
            key: GroupKey::Unknown,
            notes: vec![Note::unreadable("a.md"), Note::new("b.md", "Mood:\n-\n", 2025)],
        };
        assert!(group.is_empty());
    }

    #[test]
    fn no_notes_no_groups() {
        assert!(group_by_month(Vec::new()).is_empty());
    }
}
