use std::collections::HashMap;
use std::iter::{Peekable, Rev};
use std::slice::Iter;

use clap::ValueEnum;

use crate::display::display_clock;
use crate::entry::{EntryKind, State, TimeEntry, Timestamp};

/// A start and the stop that closed it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPair {
    pub start: TimeEntry,
    pub stop: Option<TimeEntry>,
}

impl EntryPair {
    pub fn is_open(&self) -> bool {
        self.stop.is_none()
    }

    /// Milliseconds covered by the pair; an open pair runs until `now`.
    pub fn duration_millis(&self, now: Timestamp) -> i64 {
        let closed_at = self.stop.as_ref().map(|stop| stop.time).unwrap_or(now);
        closed_at.millis_since(self.start.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntryGroup {
    pub label: String,
    pub items: Vec<EntryPair>,
}

impl TimeEntryGroup {
    fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            items: Vec::new(),
        }
    }

    /// Applies the pairing rule: a start opens a pair, a stop closes the most
    /// recent pair if it is still open and is dropped otherwise.
    fn push(&mut self, entry: &TimeEntry) {
        match entry.kind {
            EntryKind::Start => self.items.push(EntryPair {
                start: entry.clone(),
                stop: None,
            }),
            EntryKind::Stop => {
                if let Some(pair) = self.items.last_mut().filter(|pair| pair.is_open()) {
                    pair.stop = Some(entry.clone());
                }
            }
        }
    }

    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            "Unlabeled"
        } else {
            &self.label
        }
    }

    /// `label (HH:MM)` line shown above the pairs.
    pub fn heading(&self, now: Timestamp) -> String {
        let clock = display_clock(group_elapsed_millis(self, now));
        format!("{} ({})", self.display_label(), &clock[..5])
    }
}

/// Total milliseconds of every pair in the group, live pairs counted up to `now`.
pub fn group_elapsed_millis(group: &TimeEntryGroup, now: Timestamp) -> i64 {
    group
        .items
        .iter()
        .map(|pair| pair.duration_millis(now))
        .sum()
}

/// Groups temporal runs of the same label, oldest first.
pub fn contiguous_label_summary(state: &State) -> ContiguousGroups<'_> {
    ContiguousGroups {
        entries: state.entries.iter().rev().peekable(),
    }
}

/// Single-pass iterator behind [`contiguous_label_summary`].
pub struct ContiguousGroups<'a> {
    entries: Peekable<Rev<Iter<'a, TimeEntry>>>,
}

impl Iterator for ContiguousGroups<'_> {
    type Item = TimeEntryGroup;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let first = self.entries.next()?;
            let mut group = TimeEntryGroup::new(first.label.clone());
            group.push(first);

            while let Some(entry) = self.entries.next_if(|entry| entry.label == group.label) {
                group.push(entry);
            }

            // A run made only of orphan stops has nothing to show.
            if !group.items.is_empty() {
                return Some(group);
            }
        }
    }
}

/// One group per label, in order of each label's first appearance.
pub fn distinct_label_summary(state: &State) -> Vec<TimeEntryGroup> {
    let mut groups: Vec<TimeEntryGroup> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for entry in state.chronological() {
        let index = *positions.entry(entry.label.as_str()).or_insert_with(|| {
            groups.push(TimeEntryGroup::new(entry.label.clone()));
            groups.len() - 1
        });
        groups[index].push(entry);
    }

    groups
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SummaryGrouping {
    Contiguous,
    #[default]
    Distinct,
}

impl SummaryGrouping {
    pub fn groups(self, state: &State) -> Vec<TimeEntryGroup> {
        match self {
            SummaryGrouping::Contiguous => contiguous_label_summary(state).collect(),
            SummaryGrouping::Distinct => distinct_label_summary(state),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            SummaryGrouping::Contiguous => "contiguous",
            SummaryGrouping::Distinct => "distinct",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            SummaryGrouping::Contiguous => SummaryGrouping::Distinct,
            SummaryGrouping::Distinct => SummaryGrouping::Contiguous,
        }
    }
}

/// `start - stop` in local wall-clock time; the stop is blank while open.
pub fn pair_line(pair: &EntryPair) -> String {
    let format_time = |time: Timestamp| {
        time.to_local()
            .map(|local| local.format("%H:%M:%S").to_string())
            .unwrap_or_default()
    };
    let stop = pair
        .stop
        .as_ref()
        .map(|stop| format_time(stop.time))
        .unwrap_or_default();
    format!("{} - {}", format_time(pair.start.time), stop)
}

#[cfg(test)]
mod tests {
    use super::{
        EntryPair, SummaryGrouping, TimeEntryGroup, contiguous_label_summary,
        distinct_label_summary, group_elapsed_millis,
    };
    use crate::entry::{State, TimeEntry, Timestamp};

    fn at(millis: i64) -> Timestamp {
        Timestamp::from_millis(millis).expect("valid timestamp")
    }

    fn log(entries: Vec<TimeEntry>) -> State {
        State {
            entries,
            ..State::default()
        }
    }

    fn labels(groups: &[TimeEntryGroup]) -> Vec<&str> {
        groups.iter().map(|group| group.label.as_str()).collect()
    }

    #[test]
    fn groups_uninterrupted_labels_the_same_both_ways() {
        let state = log(vec![
            TimeEntry::stop("B", at(3000)),
            TimeEntry::start("B", at(2000)),
            TimeEntry::stop("A", at(1500)),
            TimeEntry::start("A", at(1000)),
        ]);
        let now = at(10_000);

        let contiguous = contiguous_label_summary(&state).collect::<Vec<_>>();
        let distinct = distinct_label_summary(&state);
        assert_eq!(labels(&contiguous), vec!["A", "B"]);
        assert_eq!(contiguous, distinct);

        for group in &contiguous {
            assert_eq!(group.items.len(), 1);
            assert!(!group.items[0].is_open());
        }
        assert_eq!(group_elapsed_millis(&contiguous[0], now), 500);
        assert_eq!(group_elapsed_millis(&contiguous[1], now), 1000);
    }

    #[test]
    fn interrupted_label_splits_only_in_contiguous_grouping() {
        let state = log(vec![
            TimeEntry::stop("A", at(6000)),
            TimeEntry::start("A", at(5000)),
            TimeEntry::stop("B", at(4000)),
            TimeEntry::start("B", at(3000)),
            TimeEntry::stop("A", at(2000)),
            TimeEntry::start("A", at(1000)),
        ]);
        let now = at(10_000);

        let contiguous = contiguous_label_summary(&state).collect::<Vec<_>>();
        assert_eq!(labels(&contiguous), vec!["A", "B", "A"]);

        let distinct = distinct_label_summary(&state);
        assert_eq!(labels(&distinct), vec!["A", "B"]);
        assert_eq!(distinct[0].items.len(), 2);
        assert_eq!(group_elapsed_millis(&distinct[0], now), 2000);
        assert_eq!(group_elapsed_millis(&distinct[1], now), 1000);
    }

    #[test]
    fn open_pair_counts_up_to_now() {
        let state = log(vec![
            TimeEntry::start("A", at(3000)),
            TimeEntry::stop("A", at(2000)),
            TimeEntry::start("A", at(1000)),
        ]);
        let groups = distinct_label_summary(&state);
        assert_eq!(groups.len(), 1);
        assert!(groups[0].items[1].is_open());
        assert_eq!(group_elapsed_millis(&groups[0], at(3500)), 1500);
        assert_eq!(group_elapsed_millis(&groups[0], at(4000)), 2000);
    }

    #[test]
    fn orphan_stops_are_dropped() {
        let state = log(vec![
            TimeEntry::stop("A", at(4000)),
            TimeEntry::stop("A", at(3000)),
            TimeEntry::start("A", at(2000)),
            TimeEntry::stop("A", at(1000)),
        ]);
        let groups = contiguous_label_summary(&state).collect::<Vec<_>>();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].items,
            vec![EntryPair {
                start: TimeEntry::start("A", at(2000)),
                stop: Some(TimeEntry::stop("A", at(3000))),
            }]
        );
    }

    #[test]
    fn empty_runs_are_skipped_by_contiguous_but_kept_by_distinct() {
        let state = log(vec![
            TimeEntry::stop("A", at(3000)),
            TimeEntry::start("A", at(2000)),
            TimeEntry::stop("X", at(1000)),
        ]);
        let contiguous = contiguous_label_summary(&state).collect::<Vec<_>>();
        assert_eq!(labels(&contiguous), vec!["A"]);

        let distinct = distinct_label_summary(&state);
        assert_eq!(labels(&distinct), vec!["X", "A"]);
        assert!(distinct[0].items.is_empty());
    }

    #[test]
    fn distinct_grouping_partitions_the_log() {
        let state = log(vec![
            TimeEntry::start("C", at(9000)),
            TimeEntry::stop("A", at(8000)),
            TimeEntry::start("A", at(7000)),
            TimeEntry::stop("B", at(6000)),
            TimeEntry::start("B", at(5000)),
            TimeEntry::stop("A", at(4000)),
            TimeEntry::start("A", at(3000)),
        ]);
        let groups = distinct_label_summary(&state);
        let mut seen = groups
            .iter()
            .flat_map(|group| {
                group
                    .items
                    .iter()
                    .flat_map(|pair| std::iter::once(&pair.start).chain(pair.stop.as_ref()))
            })
            .cloned()
            .collect::<Vec<_>>();
        seen.sort_by_key(|entry| entry.time);

        let mut expected = state.entries.clone();
        expected.sort_by_key(|entry| entry.time);
        assert_eq!(seen, expected);
    }

    #[test]
    fn group_total_is_additive() {
        let first = EntryPair {
            start: TimeEntry::start("A", at(1000)),
            stop: Some(TimeEntry::stop("A", at(1700))),
        };
        let second = EntryPair {
            start: TimeEntry::start("A", at(5000)),
            stop: Some(TimeEntry::stop("A", at(5300))),
        };
        let now = at(99_000);
        let combined = TimeEntryGroup {
            label: "A".to_string(),
            items: vec![first.clone(), second.clone()],
        };
        assert_eq!(
            group_elapsed_millis(&combined, now),
            first.duration_millis(now) + second.duration_millis(now)
        );
    }

    #[test]
    fn contiguous_iterator_is_single_pass() {
        let state = log(vec![
            TimeEntry::stop("A", at(2000)),
            TimeEntry::start("A", at(1000)),
        ]);
        let mut groups = contiguous_label_summary(&state);
        assert!(groups.next().is_some());
        assert!(groups.next().is_none());
        assert!(groups.next().is_none());
    }

    #[test]
    fn heading_uses_unlabeled_and_hours_minutes() {
        let group = TimeEntryGroup {
            label: String::new(),
            items: vec![EntryPair {
                start: TimeEntry::start("", at(0)),
                stop: Some(TimeEntry::stop("", at(3_900_000))),
            }],
        };
        assert_eq!(group.heading(at(0)), "Unlabeled (01:05)");
    }

    #[test]
    fn grouping_selector_dispatches() {
        let state = log(vec![
            TimeEntry::stop("A", at(4000)),
            TimeEntry::start("A", at(3000)),
            TimeEntry::stop("B", at(2000)),
            TimeEntry::start("B", at(1500)),
            TimeEntry::stop("A", at(1200)),
            TimeEntry::start("A", at(1000)),
        ]);
        assert_eq!(SummaryGrouping::Contiguous.groups(&state).len(), 3);
        assert_eq!(SummaryGrouping::Distinct.groups(&state).len(), 2);
        assert_eq!(SummaryGrouping::Distinct.toggle(), SummaryGrouping::Contiguous);
    }
}
