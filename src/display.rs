use std::fmt::{Display, Formatter};

use crate::entry::{ButtonDisplayMode, EntryKind, State, TimeEntry, Timestamp};

pub const BLANK_DISPLAY: &str = "\u{a0}";

const MILLIS_PER_SECOND: i64 = 1000;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Start,
    Stop,
    Resume,
}

impl Display for ButtonAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ButtonAction::Start => "Start",
            ButtonAction::Stop => "Stop",
            ButtonAction::Resume => "Resume",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonText {
    pub action: ButtonAction,
    pub display: String,
}

impl ButtonText {
    fn idle() -> Self {
        Self {
            action: ButtonAction::Start,
            display: BLANK_DISPLAY.to_string(),
        }
    }
}

/// Modulus whose result carries the sign of `n`, so `modulo(-50, 1200) == 1150`.
pub fn modulo(a: i64, n: i64) -> i64 {
    ((a % n) + n) % n
}

pub fn is_running(state: &State) -> bool {
    state.newest().is_some_and(TimeEntry::is_start)
}

/// The button only starts a session once a label is set; stopping is always allowed.
pub fn can_toggle(state: &State) -> bool {
    is_running(state) || !state.current_label.is_empty()
}

/// Whole seconds since `entry` started, or `None` when nothing is running.
///
/// Not clamped: a clock behind the entry yields a negative (floored) value.
pub fn elapsed_seconds(entry: Option<&TimeEntry>, now: Timestamp) -> Option<i64> {
    let entry = entry.filter(|entry| entry.is_start())?;
    Some(now.millis_since(entry.time).div_euclid(MILLIS_PER_SECOND))
}

/// Formats a duration as `HH:MM:SS`, wrapping at 24 hours.
pub fn display_clock(millis: i64) -> String {
    let seconds_of_day = millis
        .div_euclid(MILLIS_PER_SECOND)
        .rem_euclid(SECONDS_PER_DAY);
    let hours = seconds_of_day / 3600;
    let minutes = (seconds_of_day % 3600) / 60;
    let seconds = seconds_of_day % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Seconds left in the current lap of a `target_seconds` countdown.
///
/// Zero elapsed shows the full countdown; afterwards the value wraps into
/// `[0, target_seconds)` however many laps have passed.
pub fn countdown_value(target_seconds: i64, elapsed_seconds: i64) -> i64 {
    if target_seconds <= 0 {
        return 0;
    }
    if elapsed_seconds == 0 {
        return target_seconds;
    }
    modulo(target_seconds - elapsed_seconds, target_seconds)
}

/// Applies the display mode to a total elapsed second count.
pub fn display_value(mode: ButtonDisplayMode, elapsed_seconds: i64) -> i64 {
    match mode.target_seconds() {
        None => elapsed_seconds,
        Some(target) => countdown_value(target, elapsed_seconds),
    }
}

/// Completed time for `label`, summed over its closed start/stop pairs.
pub fn completed_label_time(state: &State, label: &str) -> LabelTime {
    let mut total = LabelTime::default();
    let mut pending: Option<Timestamp> = None;

    for entry in state.chronological().filter(|entry| entry.label == label) {
        match entry.kind {
            EntryKind::Start => pending = Some(entry.time),
            EntryKind::Stop => {
                if let Some(started_at) = pending.take() {
                    total.millis += entry.time.millis_since(started_at);
                    total.pairs += 1;
                }
            }
        }
    }

    total
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LabelTime {
    pub millis: i64,
    pub pairs: usize,
}

impl LabelTime {
    pub fn whole_seconds(self) -> i64 {
        self.millis.div_euclid(MILLIS_PER_SECOND)
    }
}

/// Text for the main button: `Start` while idle, otherwise `Stop` with the
/// current label's accumulated time (all completed sessions plus the live one).
pub fn primary_button_text(state: &State, live_elapsed_seconds: i64) -> ButtonText {
    if !is_running(state) {
        return ButtonText::idle();
    }

    let total = completed_label_time(state, &state.current_label).whole_seconds() + live_elapsed_seconds;
    ButtonText {
        action: ButtonAction::Stop,
        display: display_clock(display_value(state.display_mode, total) * MILLIS_PER_SECOND),
    }
}

/// `Resume` hint for an idle timer whose current label already has tracked time.
pub fn resume_button_text(state: &State) -> Option<ButtonText> {
    if is_running(state) {
        return None;
    }

    let completed = completed_label_time(state, &state.current_label);
    if completed.pairs == 0 {
        return None;
    }

    Some(ButtonText {
        action: ButtonAction::Resume,
        display: display_clock(
            display_value(state.display_mode, completed.whole_seconds()) * MILLIS_PER_SECOND,
        ),
    })
}
