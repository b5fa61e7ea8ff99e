use parking_lot::Mutex;
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

use crate::{
    config::DEFAULT_SEARCH_DEBOUNCE,
    error::Failure,
    model::{Location, SearchResultSet, SessionState},
    provider::WeatherProvider,
    session::Sequenced,
    weather::WeatherSession,
};

pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search locations. Please try again.";

/// Keystroke-driven place search.
///
/// Feed every edit of the search box to [`SearchSession::on_query_changed`].
/// A search is issued only after the debounce interval passes without another
/// edit, and only the response to the most recently issued search is ever
/// shown. Must be used from within a Tokio runtime.
#[derive(Debug)]
pub struct SearchSession {
    provider: Arc<dyn WeatherProvider>,
    debounce: Duration,
    cell: Arc<Sequenced<SearchResultSet>>,
    pending: Arc<Mutex<Pending>>,
}

/// The debounce timer and the generation it was scheduled under.
///
/// Aborting only stops a timer that is still asleep, so a woken timer must
/// also find its generation current before it may issue a search.
#[derive(Debug, Default)]
struct Pending {
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Pending {
    fn cancel(&mut self) -> u64 {
        self.generation += 1;
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.generation
    }
}

impl SearchSession {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self::with_debounce(provider, DEFAULT_SEARCH_DEBOUNCE)
    }

    pub fn with_debounce(provider: Arc<dyn WeatherProvider>, debounce: Duration) -> Self {
        Self {
            provider,
            debounce,
            cell: Arc::new(Sequenced::new()),
            pending: Arc::new(Mutex::new(Pending::default())),
        }
    }

    pub fn on_query_changed(&self, text: &str) {
        let mut pending = self.pending.lock();
        let generation = pending.cancel();

        let query = text.trim();
        if query.is_empty() {
            self.cell.reset(SessionState::Idle);
            return;
        }

        let query = query.to_string();
        let provider = Arc::clone(&self.provider);
        let cell = Arc::clone(&self.cell);
        let slot = Arc::clone(&self.pending);
        let debounce = self.debounce;

        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            issue_search(&slot, generation, &cell, provider, query);
        }));
    }

    /// Pick a result: clears the result set and loads weather for it.
    pub fn select(&self, location: Location, weather: &WeatherSession) {
        self.clear();
        weather.set_location(location);
    }

    /// Drop the result set, any pending keystroke and any in-flight search.
    pub fn clear(&self) {
        let mut pending = self.pending.lock();
        pending.cancel();
        self.cell.reset(SessionState::Idle);
    }

    pub fn state(&self) -> SessionState<SearchResultSet> {
        self.cell.snapshot()
    }

    /// Locations currently shown, empty unless the latest search succeeded.
    pub fn results(&self) -> Vec<Location> {
        self.state().ready().map(|set| set.locations.clone()).unwrap_or_default()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState<SearchResultSet>> {
        self.cell.subscribe()
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.pending.lock().cancel();
    }
}

/// Issue the search for a woken timer, unless an edit or a clear happened
/// since it was scheduled. Returns the request's sequence when issued.
fn issue_search(
    slot: &Mutex<Pending>,
    generation: u64,
    cell: &Arc<Sequenced<SearchResultSet>>,
    provider: Arc<dyn WeatherProvider>,
    query: String,
) -> Option<u64> {
    let sequence = {
        let pending = slot.lock();
        if pending.generation != generation {
            debug!(%query, generation, "debounce timer superseded");
            return None;
        }
        cell.begin()
    };
    debug!(%query, sequence, "issuing search");

    // Detached so a later keystroke only cancels the timer;
    // an in-flight request is superseded by sequence instead.
    let cell = Arc::clone(cell);
    tokio::spawn(async move {
        let state = match provider.search(&query).await {
            Ok(locations) => SessionState::Ready(SearchResultSet { query, sequence, locations }),
            Err(error) => {
                debug!(%query, "search failed: {error}");
                SessionState::Failed(Failure::new(error, SEARCH_FAILED_MESSAGE))
            }
        };

        if !cell.publish(sequence, state) {
            debug!(sequence, "discarding stale search response");
        }
    });

    Some(sequence)
}
