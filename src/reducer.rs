use crate::entry::{ButtonDisplayMode, EntryKind, State, TimeEntry, Timestamp};

/// Prepends the next entry for `label`, alternating with the newest entry's kind.
///
/// A clock that steps backwards is pinned to the newest entry's time so the log
/// stays non-decreasing. Equal timestamps are allowed.
pub fn add_entry(state: &State, label: impl Into<String>, now: Timestamp) -> State {
    let (kind, time) = match state.newest() {
        None => (EntryKind::Start, now),
        Some(newest) => (newest.kind.opposite(), now.max(newest.time)),
    };

    let mut entries = Vec::with_capacity(state.entries.len() + 1);
    entries.push(TimeEntry::new(label, time, kind));
    entries.extend(state.entries.iter().cloned());

    State {
        display_mode: state.display_mode,
        current_label: state.current_label.clone(),
        entries,
    }
}

/// Start/stop using the label currently typed in.
pub fn toggle(state: &State, now: Timestamp) -> State {
    add_entry(state, state.current_label.clone(), now)
}

pub fn with_label(state: &State, label: impl Into<String>) -> State {
    State {
        current_label: label.into(),
        ..state.clone()
    }
}

pub fn with_display_mode(state: &State, display_mode: ButtonDisplayMode) -> State {
    State {
        display_mode,
        ..state.clone()
    }
}
