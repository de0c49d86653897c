use tracing::{debug, info};

use crate::clock::Clock;
use crate::display::elapsed_seconds;
use crate::entry::{State, Timestamp};
use crate::notify::{CountdownAlarm, Notifier};
use crate::storage::{KeyValueStore, StorageError, clear_state, load_state, save_state};

/// Everything the timer needs at runtime, built once at startup.
pub struct AppContext {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    notifier: Box<dyn Notifier>,
    alarm: CountdownAlarm,
    state: State,
    live: bool,
}

impl AppContext {
    pub fn init(
        store: Box<dyn KeyValueStore>,
        clock: Box<dyn Clock>,
        notifier: Box<dyn Notifier>,
    ) -> Result<Self, StorageError> {
        let state = load_state(store.as_ref())?;
        info!(entries = state.entries.len(), "timer context ready");
        Ok(Self {
            store,
            clock,
            notifier,
            alarm: CountdownAlarm::default(),
            state,
            live: true,
        })
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Swaps in the state `transition` derives, then persists it.
    pub fn apply(&mut self, transition: impl FnOnce(&State, Timestamp) -> State) -> Result<&State, StorageError> {
        let next = transition(&self.state, self.clock.now());
        save_state(self.store.as_mut(), &next)?;
        if let Some(newest) = next.newest().filter(|_| next.entries.len() != self.state.entries.len()) {
            info!(label = %newest.label, kind = ?newest.kind, "recorded entry");
        } else {
            debug!("state updated");
        }
        self.state = next;
        Ok(&self.state)
    }

    /// Live seconds of the running session, also driving countdown notifications.
    pub fn tick(&mut self) -> Option<i64> {
        if !self.live {
            return None;
        }

        let elapsed = elapsed_seconds(self.state.newest(), self.clock.now());
        if let Some(message) = self.alarm.observe(&self.state, elapsed) {
            info!(%message, "countdown reached zero");
            self.notifier.show_notification(&message);
        }
        elapsed
    }

    pub fn clear(&mut self) -> Result<&State, StorageError> {
        self.state = clear_state(self.store.as_mut())?;
        self.alarm = CountdownAlarm::default();
        info!("cleared all entries");
        Ok(&self.state)
    }

    /// Stops ticking. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.live {
            self.live = false;
            debug!("timer context torn down");
        }
    }
}
