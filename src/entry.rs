use std::fmt::{Display, Formatter};

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "i64")]
pub struct Timestamp(i64);

impl Timestamp {
    pub const EPOCH: Timestamp = Timestamp(0);
    /// Latest representable instant, 100 000 000 days after the epoch.
    pub const MAX: Timestamp = Timestamp(8_640_000_000_000_000);

    pub fn from_millis(millis: i64) -> Result<Self, EntryError> {
        if millis < 0 {
            return Err(EntryError::NegativeTimestamp(millis));
        }
        if millis > Self::MAX.0 {
            return Err(EntryError::OutOfRange(millis as f64));
        }
        Ok(Self(millis))
    }

    pub fn from_datetime(datetime: DateTime<Utc>) -> Result<Self, EntryError> {
        Self::from_millis(datetime.timestamp_millis())
    }

    pub fn millis(self) -> i64 {
        self.0
    }

    /// Signed distance `self - earlier` in milliseconds.
    pub fn millis_since(self, earlier: Timestamp) -> i64 {
        self.0 - earlier.0
    }

    pub fn to_local(self) -> Option<DateTime<Local>> {
        DateTime::from_timestamp_millis(self.0).map(|datetime| datetime.with_timezone(&Local))
    }
}

impl TryFrom<f64> for Timestamp {
    type Error = EntryError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() {
            return Err(EntryError::NonFiniteTimestamp);
        }
        if value < 0.0 {
            return Err(EntryError::NegativeTimestamp(value.floor() as i64));
        }
        if value > Self::MAX.0 as f64 {
            return Err(EntryError::OutOfRange(value));
        }
        Ok(Self(value.floor() as i64))
    }
}

impl From<Timestamp> for i64 {
    fn from(value: Timestamp) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryError {
    NegativeTimestamp(i64),
    NonFiniteTimestamp,
    OutOfRange(f64),
    DoubleStart { index: usize, label: String },
    OrphanStop { index: usize, label: String },
    LabelMismatch { index: usize, started: String, stopped: String },
    TimeWentBackwards { index: usize },
}

impl Display for EntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryError::NegativeTimestamp(millis) => write!(f, "negative timestamp: {millis}"),
            EntryError::NonFiniteTimestamp => write!(f, "timestamp is not a finite number"),
            EntryError::OutOfRange(millis) => write!(f, "timestamp out of range: {millis}"),
            EntryError::DoubleStart { index, label } => {
                write!(f, "entry {index} starts {label:?} while another session is open")
            }
            EntryError::OrphanStop { index, label } => {
                write!(f, "entry {index} stops {label:?} with no open session")
            }
            EntryError::LabelMismatch {
                index,
                started,
                stopped,
            } => write!(f, "entry {index} stops {stopped:?} but {started:?} is open"),
            EntryError::TimeWentBackwards { index } => {
                write!(f, "entry {index} is older than the entry before it")
            }
        }
    }
}

impl std::error::Error for EntryError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Start,
    Stop,
}

impl EntryKind {
    pub fn opposite(self) -> Self {
        match self {
            EntryKind::Start => EntryKind::Stop,
            EntryKind::Stop => EntryKind::Start,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub label: String,
    pub time: Timestamp,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl TimeEntry {
    pub fn new(label: impl Into<String>, time: Timestamp, kind: EntryKind) -> Self {
        Self {
            label: label.into(),
            time,
            kind,
        }
    }

    pub fn start(label: impl Into<String>, time: Timestamp) -> Self {
        Self::new(label, time, EntryKind::Start)
    }

    pub fn stop(label: impl Into<String>, time: Timestamp) -> Self {
        Self::new(label, time, EntryKind::Stop)
    }

    pub fn is_start(&self) -> bool {
        self.kind == EntryKind::Start
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ButtonDisplayMode {
    #[default]
    Elapsed,
    #[serde(rename = "20 minutes")]
    Countdown20Min,
    #[serde(rename = "1 hour")]
    Countdown60Min,
}

impl ButtonDisplayMode {
    pub const ALL: [ButtonDisplayMode; 3] = [
        ButtonDisplayMode::Elapsed,
        ButtonDisplayMode::Countdown20Min,
        ButtonDisplayMode::Countdown60Min,
    ];

    /// Countdown length in seconds, `None` for plain elapsed display.
    pub fn target_seconds(self) -> Option<i64> {
        match self {
            ButtonDisplayMode::Elapsed => None,
            ButtonDisplayMode::Countdown20Min => Some(20 * 60),
            ButtonDisplayMode::Countdown60Min => Some(60 * 60),
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ButtonDisplayMode::Elapsed => "Elapsed",
            ButtonDisplayMode::Countdown20Min => "20 minutes",
            ButtonDisplayMode::Countdown60Min => "1 hour",
        }
    }

    pub fn cycle(self) -> Self {
        match self {
            ButtonDisplayMode::Elapsed => ButtonDisplayMode::Countdown20Min,
            ButtonDisplayMode::Countdown20Min => ButtonDisplayMode::Countdown60Min,
            ButtonDisplayMode::Countdown60Min => ButtonDisplayMode::Elapsed,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    #[serde(rename = "buttonDisplayType", default)]
    pub display_mode: ButtonDisplayMode,
    #[serde(rename = "label", default)]
    pub current_label: String,
    /// Newest first.
    pub entries: Vec<TimeEntry>,
}

impl State {
    pub fn newest(&self) -> Option<&TimeEntry> {
        self.entries.first()
    }

    /// Entries oldest to newest.
    pub fn chronological(&self) -> impl DoubleEndedIterator<Item = &TimeEntry> + '_ {
        self.entries.iter().rev()
    }

    /// Walks the log oldest to newest and reports the first broken invariant.
    /// Indices in the error are newest-first positions, matching `entries`.
    pub fn check_invariants(&self) -> Result<(), EntryError> {
        let len = self.entries.len();
        let mut open: Option<&TimeEntry> = None;
        let mut previous: Option<Timestamp> = None;

        for (offset, entry) in self.chronological().enumerate() {
            let index = len - 1 - offset;
            if previous.is_some_and(|time| entry.time < time) {
                return Err(EntryError::TimeWentBackwards { index });
            }
            previous = Some(entry.time);

            match (entry.kind, open) {
                (EntryKind::Start, None) => open = Some(entry),
                (EntryKind::Start, Some(_)) => {
                    return Err(EntryError::DoubleStart {
                        index,
                        label: entry.label.clone(),
                    });
                }
                (EntryKind::Stop, None) => {
                    return Err(EntryError::OrphanStop {
                        index,
                        label: entry.label.clone(),
                    });
                }
                (EntryKind::Stop, Some(started)) if started.label != entry.label => {
                    return Err(EntryError::LabelMismatch {
                        index,
                        started: started.label.clone(),
                        stopped: entry.label.clone(),
                    });
                }
                (EntryKind::Stop, Some(_)) => open = None,
            }
        }

        Ok(())
    }
}
