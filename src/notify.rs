use std::thread;

use notify_rust::Notification;
use tracing::{debug, info, warn};

use crate::display::{completed_label_time, display_clock, is_running};
use crate::entry::{ButtonDisplayMode, State, Timestamp};

const NOTIFICATION_TITLE: &str = "Timer Done";
const APP_NAME: &str = "chronos-tally";

pub trait Notifier {
    fn show_notification(&self, message: &str);
}

/// Desktop notifications. Delivery runs on its own thread and never blocks the caller.
pub struct DesktopNotifier;

impl DesktopNotifier {
    pub fn register() -> Self {
        info!("desktop notifications enabled");
        Self
    }
}

impl Notifier for DesktopNotifier {
    fn show_notification(&self, message: &str) {
        let body = message.to_string();
        let spawned = thread::Builder::new()
            .name("notification".to_string())
            .spawn(move || {
                let result = Notification::new()
                    .summary(NOTIFICATION_TITLE)
                    .body(&body)
                    .appname(APP_NAME)
                    .icon("alarm-clock")
                    .show();
                match result {
                    Ok(_) => debug!(%body, "notification delivered"),
                    Err(err) => warn!(%err, "notification was not delivered"),
                }
            });
        if let Err(err) = spawned {
            warn!(%err, "failed to spawn notification thread");
        }
    }
}

/// Used when notifications are switched off.
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn show_notification(&self, message: &str) {
        debug!(%message, "notification suppressed");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunKey {
    mode: ButtonDisplayMode,
    label: String,
    started_at: Timestamp,
}

/// Fires once for every countdown lap that completes while the timer runs.
#[derive(Debug, Default)]
pub struct CountdownAlarm {
    run: Option<RunKey>,
    laps: i64,
}

impl CountdownAlarm {
    /// Feeds one display tick. Returns the message to show when a lap just ended.
    ///
    /// The first tick of a run only records where the countdown stands.
    pub fn observe(&mut self, state: &State, live_elapsed_seconds: Option<i64>) -> Option<String> {
        let (Some(target), Some(live), Some(newest)) = (
            state.display_mode.target_seconds(),
            live_elapsed_seconds,
            state.newest(),
        ) else {
            self.run = None;
            return None;
        };
        if !is_running(state) {
            self.run = None;
            return None;
        }

        let total = completed_label_time(state, &state.current_label).whole_seconds() + live;
        let laps = total.max(0) / target;
        let key = RunKey {
            mode: state.display_mode,
            label: state.current_label.clone(),
            started_at: newest.time,
        };

        if self.run.as_ref() != Some(&key) {
            self.run = Some(key);
            self.laps = laps;
            return None;
        }

        if laps > self.laps {
            self.laps = laps;
            return Some(display_clock(0));
        }

        None
    }
}

#[cfg(test)]
pub use recording::RecordingNotifier;


#[cfg(test)]
mod tests {
    use super::CountdownAlarm;
    use crate::entry::{ButtonDisplayMode, State, TimeEntry, Timestamp};

    fn running(mode: ButtonDisplayMode, started_at: i64) -> State {
        State {
            display_mode: mode,
            current_label: "Focus".to_string(),
            entries: vec![TimeEntry::start(
                "Focus",
                Timestamp::from_millis(started_at).expect("valid timestamp"),
            )],
        }
    }

    #[test]
    fn fires_once_when_countdown_hits_zero() {
        let state = running(ButtonDisplayMode::Countdown20Min, 1000);
        let mut alarm = CountdownAlarm::default();

        let fired = (0..=1205)
            .filter_map(|elapsed| alarm.observe(&state, Some(elapsed)))
            .collect::<Vec<_>>();
        assert_eq!(fired, vec!["00:00:00".to_string()]);

        // Repeated ticks inside the same second stay quiet.
        assert_eq!(alarm.observe(&state, Some(1205)), None);
    }

    #[test]
    fn fires_again_on_every_wrapped_lap() {
        let state = running(ButtonDisplayMode::Countdown20Min, 1000);
        let mut alarm = CountdownAlarm::default();
        assert_eq!(alarm.observe(&state, Some(0)), None);
        assert!(alarm.observe(&state, Some(1200)).is_some());
        assert_eq!(alarm.observe(&state, Some(1800)), None);
        assert!(alarm.observe(&state, Some(2400)).is_some());
    }

    #[test]
    fn quiet_in_elapsed_mode_or_when_stopped() {
        let mut alarm = CountdownAlarm::default();
        let elapsed = running(ButtonDisplayMode::Elapsed, 1000);
        assert_eq!(alarm.observe(&elapsed, Some(0)), None);
        assert_eq!(alarm.observe(&elapsed, Some(1200)), None);

        let stopped = State {
            display_mode: ButtonDisplayMode::Countdown20Min,
            ..State::default()
        };
        assert_eq!(alarm.observe(&stopped, None), None);
    }

    #[test]
    fn first_observation_sets_the_baseline() {
        let state = running(ButtonDisplayMode::Countdown20Min, 1000);
        let mut alarm = CountdownAlarm::default();
        assert_eq!(alarm.observe(&state, Some(5000)), None);
        assert_eq!(alarm.observe(&state, Some(5001)), None);
    }

    #[test]
    fn changing_mode_rearms() {
        let mut alarm = CountdownAlarm::default();
        let twenty = running(ButtonDisplayMode::Countdown20Min, 1000);
        assert_eq!(alarm.observe(&twenty, Some(1100)), None);

        let hour = State {
            display_mode: ButtonDisplayMode::Countdown60Min,
            ..twenty
        };
        assert_eq!(alarm.observe(&hour, Some(1300)), None);
        assert_eq!(alarm.observe(&hour, Some(3599)), None);
        assert!(alarm.observe(&hour, Some(3600)).is_some());
    }
}
