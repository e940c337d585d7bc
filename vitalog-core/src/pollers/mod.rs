//! Background pollers
//!
//! Pollers watch third-party APIs (music playback, gaming presence,
//! weather) and write plain events to the store. The API clients
//! themselves live outside this crate; implementations of [`Poller`] wrap
//! them and own their deduplication state as instance fields - a "last
//! track id" or "last game" belongs to the poller that tracks it, never to
//! process-wide state, so multiple independent instances can coexist and
//! be tested in isolation.
//!
//! The [`PollerRunner`] drives every registered poller on one shared
//! interval. A failing poller is logged and skipped for the round; it must
//! not take its peers down with it.

use crate::db::Database;
use crate::error::Result;
use crate::types::Event;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::time::Duration;

/// An event produced by a poll round, before it is stamped and stored.
#[derive(Debug, Clone)]
pub struct PolledEvent {
    /// Payload shape discriminator (`track_played`, `game_activity`, ...)
    pub event_type: String,
    /// Arbitrary JSON payload
    pub data: Value,
}

/// A background poller for one external integration.
///
/// ```rust,ignore
/// struct PlaybackPoller {
///     client: PlaybackClient,
///     last_track_id: Option<String>, // dedup state lives here
/// }
///
/// #[async_trait]
/// impl Poller for PlaybackPoller {
///     fn source(&self) -> &str { "spotify" }
///
///     async fn poll(&mut self) -> Result<Vec<PolledEvent>> {
///         let Some(track) = self.client.now_playing().await? else {
///             return Ok(vec![]);
///         };
///         if self.last_track_id.as_deref() == Some(&track.id) {
///             return Ok(vec![]); // unchanged, nothing to record
///         }
///         self.last_track_id = Some(track.id.clone());
///         Ok(vec![PolledEvent { event_type: "track_played".into(), data: track.into_json() }])
///     }
/// }
/// ```
#[async_trait]
pub trait Poller: Send {
    /// Source identifier stamped onto every event this poller produces
    fn source(&self) -> &str;

    /// Check the integration and return any new events since the last poll.
    ///
    /// Returning an empty vec is the normal "nothing changed" case.
    async fn poll(&mut self) -> Result<Vec<PolledEvent>>;
}

/// Drives registered pollers against the event store.
pub struct PollerRunner<'a> {
    db: &'a Database,
    pollers: Vec<Box<dyn Poller>>,
}

impl<'a> PollerRunner<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            pollers: Vec::new(),
        }
    }

    /// Register a poller.
    pub fn register(&mut self, poller: Box<dyn Poller>) {
        self.pollers.push(poller);
    }

    /// Number of registered pollers.
    pub fn poller_count(&self) -> usize {
        self.pollers.len()
    }

    /// Run a single poll round across all pollers.
    ///
    /// Returns the number of events stored. Poller failures are logged and
    /// skipped; store failures propagate.
    pub async fn run_once(&mut self) -> Result<usize> {
        let mut stored = 0;

        for poller in &mut self.pollers {
            let source = poller.source().to_string();
            let polled = match poller.poll().await {
                Ok(events) => events,
                Err(e) => {
                    tracing::warn!(source = %source, error = %e, "Poller failed, skipping round");
                    continue;
                }
            };

            for polled_event in polled {
                let event = Event::new(
                    source.clone(),
                    polled_event.event_type,
                    polled_event.data,
                    Utc::now(),
                );
                self.db.insert_event(&event)?;
                stored += 1;
            }
        }

        if stored > 0 {
            tracing::debug!(stored, "Poll round stored events");
        }
        Ok(stored)
    }

    /// Run poll rounds forever on the given interval.
    pub async fn run(&mut self, interval: Duration) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.run_once().await?;
        }
    }
}
