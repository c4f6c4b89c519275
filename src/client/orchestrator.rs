//! Drives one prayer-times load at a time: resolve location, call the proxy,
//! classify the outcome, publish it. A newer load supersedes an older one;
//! the older one's outcome is dropped instead of published.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Days, Local, NaiveDate};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::api::PrayerApi;
use super::location::{Geolocator, LocationResolver, LocationStore};
use crate::constants::DEFAULT_METHOD;
use crate::error::AppError;
use crate::models::{Coordinates, PrayerApiResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Success(Arc<PrayerApiResponse>),
    Error(AppError),
}

/// What the user currently has selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub method: u32,
    pub date: NaiveDate,
}

impl Selection {
    pub fn today(method: u32) -> Self {
        Self {
            method,
            date: Local::now().date_naive(),
        }
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::today(DEFAULT_METHOD)
    }
}

pub struct PrayerTimesController<A, G, S> {
    inner: Arc<Inner<A, G, S>>,
}

struct Inner<A, G, S> {
    api: A,
    resolver: LocationResolver<G, S>,
    selection: Mutex<Selection>,
    in_flight: Mutex<Option<CancellationToken>>,
    state: watch::Sender<LoadState>,
    location: watch::Sender<Option<Coordinates>>,
}

impl<A, G, S> PrayerTimesController<A, G, S>
where
    A: PrayerApi,
    G: Geolocator,
    S: LocationStore,
{
    pub fn new(api: A, resolver: LocationResolver<G, S>, selection: Selection) -> Self {
        let (state, _) = watch::channel(LoadState::Idle);
        let (location, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                api,
                resolver,
                selection: Mutex::new(selection),
                in_flight: Mutex::new(None),
                state,
                location,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.inner.state.subscribe()
    }

    pub fn state(&self) -> LoadState {
        self.inner.state.borrow().clone()
    }

    pub fn location(&self) -> Option<Coordinates> {
        *self.inner.location.borrow()
    }

    pub fn selection(&self) -> Selection {
        *lock(&self.inner.selection)
    }

    pub fn is_today(&self) -> bool {
        self.selection().date == Local::now().date_naive()
    }

    pub fn set_method(&self, method: u32) -> JoinHandle<()> {
        lock(&self.inner.selection).method = method;
        self.load()
    }

    pub fn set_date(&self, date: NaiveDate) -> JoinHandle<()> {
        lock(&self.inner.selection).date = date;
        self.load()
    }

    /// Moves the selected date by `days` (negative goes back)
    pub fn shift_date(&self, days: i64) -> JoinHandle<()> {
        let current = self.selection().date;
        let shifted = if days >= 0 {
            current.checked_add_days(Days::new(days.unsigned_abs()))
        } else {
            current.checked_sub_days(Days::new(days.unsigned_abs()))
        };
        self.set_date(shifted.unwrap_or(current))
    }

    pub fn go_to_today(&self) -> JoinHandle<()> {
        self.set_date(Local::now().date_naive())
    }

    /// Re-runs the load after forgetting the in-session location, e.g. once
    /// the user has changed a location permission.
    pub fn retry(&self) -> JoinHandle<()> {
        self.inner.resolver.clear_session();
        self.load()
    }

    /// Starts a load for the current selection, superseding any load in flight.
    pub fn load(&self) -> JoinHandle<()> {
        let token = self.inner.begin();
        let selection = self.selection();
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move { inner.run(token, selection).await })
    }

    /// Abandons the load in flight, if any; its outcome is never published
    /// and the state falls back to `Idle`.
    pub fn cancel(&self) {
        let mut in_flight = lock(&self.inner.in_flight);
        if let Some(token) = in_flight.take() {
            token.cancel();
            self.inner.state.send_replace(LoadState::Idle);
        }
    }
}

impl<A, G, S> Inner<A, G, S>
where
    A: PrayerApi,
    G: Geolocator,
    S: LocationStore,
{
    fn begin(&self) -> CancellationToken {
        let mut in_flight = lock(&self.in_flight);
        if let Some(previous) = in_flight.take() {
            tracing::debug!("superseding in-flight prayer times load");
            previous.cancel();
        }
        let token = CancellationToken::new();
        *in_flight = Some(token.clone());
        self.state.send_replace(LoadState::Loading);
        token
    }

    async fn run(&self, token: CancellationToken, selection: Selection) {
        let coordinates = match self.resolver.resolve().await {
            Ok((coordinates, source)) => {
                tracing::debug!(?source, "location resolved");
                coordinates
            }
            Err(error) => {
                self.finish(&token, LoadState::Error(error));
                return;
            }
        };

        if !self.publish_location(&token, coordinates) {
            return;
        }

        let outcome = self
            .api
            .fetch_prayer_times(coordinates, selection.method, selection.date)
            .await;
        let state = match outcome {
            Ok(data) => LoadState::Success(Arc::new(data)),
            Err(error) => {
                tracing::warn!(kind = error.kind(), %error, "prayer times load failed");
                LoadState::Error(error)
            }
        };
        self.finish(&token, state);
    }

    fn publish_location(&self, token: &CancellationToken, coordinates: Coordinates) -> bool {
        let _in_flight = lock(&self.in_flight);
        if token.is_cancelled() {
            tracing::debug!("discarding location of superseded load");
            return false;
        }
        self.location.send_replace(Some(coordinates));
        true
    }

    /// Publishes the terminal `state` of the load owning `token` and clears
    /// the in-flight slot, unless that load was superseded or cancelled.
    ///
    /// Holding `in_flight` makes the check and the update atomic with
    /// respect to a concurrent `begin` or `cancel`.
    fn finish(&self, token: &CancellationToken, state: LoadState) {
        let mut in_flight = lock(&self.in_flight);
        if token.is_cancelled() {
            tracing::debug!("discarding outcome of superseded load");
            return;
        }
        *in_flight = None;
        self.state.send_replace(state);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
