//! The rotation scheduler: owns both directions' slide sets, advances them
//! on a fixed tick, and refreshes the underlying data on a slower one.
//!
//! The refresh fetch runs as a background task posting into a single-slot
//! mailbox, so rotation is never blocked on the network. A failed refresh
//! keeps the previous slides on the board.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use super::slides::{Slide, SlideSet};
use crate::config::Config;
use crate::decode::decode_trip_departures;
use crate::departures::{StopEstimates, aggregate};
use crate::error::FeedError;
use crate::fetch::{HttpClient, fetch_bytes};
use crate::render::Renderer;

/// The currently visible slide per direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardFrame {
    pub uptown: Slide,
    pub downtown: Slide,
}

/// Both directions' slide sets. Constructed once and owned by the run loop
/// (or a test driving it directly); nothing else mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationBoard {
    uptown: SlideSet,
    downtown: SlideSet,
    max_slides: usize,
}

impl RotationBoard {
    pub fn new(max_slides: usize) -> Self {
        RotationBoard {
            uptown: SlideSet::placeholder(),
            downtown: SlideSet::placeholder(),
            max_slides,
        }
    }

    /// Replaces both slide sets wholesale from freshly aggregated estimates.
    pub fn install(&mut self, estimates: &StopEstimates) {
        self.uptown = SlideSet::from_bucket(&estimates.uptown, self.max_slides);
        self.downtown = SlideSet::from_bucket(&estimates.downtown, self.max_slides);
    }

    /// Applies the outcome of a refresh cycle. Failures leave the current
    /// slides untouched; the board degrades to stale data rather than
    /// going dark.
    pub fn apply_refresh(&mut self, result: Result<StopEstimates, FeedError>) {
        match result {
            Ok(estimates) => {
                debug!(
                    uptown = estimates.uptown.len(),
                    downtown = estimates.downtown.len(),
                    "Installing refreshed departures"
                );
                self.install(&estimates);
            }
            Err(e) => {
                error!(error = %e, "Feed refresh failed, keeping previous slides");
            }
        }
    }

    /// Advances both directions by one slide.
    pub fn rotate(&mut self) {
        self.uptown.rotate();
        self.downtown.rotate();
    }

    pub fn current_state(&self) -> BoardFrame {
        BoardFrame {
            uptown: self.uptown.visible().clone(),
            downtown: self.downtown.visible().clone(),
        }
    }
}

/// Runs the full refresh pipeline once: fetch, decode, aggregate against
/// the current wall clock.
pub async fn fetch_estimates<C: HttpClient + ?Sized>(
    client: &C,
    feed_url: &str,
    stop_id: &str,
    horizon_secs: i64,
) -> Result<StopEstimates, FeedError> {
    let bytes = fetch_bytes(client, feed_url).await?;
    let records = decode_trip_departures(&bytes)?;
    let now = Utc::now().timestamp();
    Ok(aggregate(&records, stop_id, now, horizon_secs))
}

/// Drives the board until `shutdown` fires.
///
/// Two timers are multiplexed on one task: the refresh interval spawns a
/// background fetch (skipped while one is already in flight), and the
/// rotation interval advances the slides. Both a delivered refresh and a
/// rotation notify the renderer with the new visible frame. A fetch still
/// in flight at shutdown is abandoned; its request timeout bounds it.
pub async fn run<R: Renderer>(
    config: Config,
    client: Arc<dyn HttpClient>,
    mut renderer: R,
    mut shutdown: oneshot::Receiver<()>,
) {
    let (tx, mut rx) = mpsc::channel::<Result<StopEstimates, FeedError>>(1);

    let mut board = RotationBoard::new(config.max_slides);
    let mut refresh = interval(config.refresh_interval);
    let mut rotate = interval(config.rotate_interval);
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);
    rotate.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut fetch_in_flight = false;

    info!(
        feed_url = %config.feed_url,
        stop_id = %config.stop_id,
        "Starting departure board"
    );

    loop {
        tokio::select! {
            _ = refresh.tick() => {
                if fetch_in_flight {
                    warn!("Refresh tick skipped, fetch already in flight");
                    continue;
                }
                fetch_in_flight = true;

                let tx = tx.clone();
                let client = client.clone();
                let feed_url = config.feed_url.clone();
                let stop_id = config.stop_id.clone();
                let horizon_secs = config.horizon_secs;
                tokio::spawn(async move {
                    let result =
                        fetch_estimates(client.as_ref(), &feed_url, &stop_id, horizon_secs).await;
                    let _ = tx.try_send(result);
                });
            }
            Some(result) = rx.recv() => {
                fetch_in_flight = false;
                board.apply_refresh(result);
                renderer.render(&board.current_state());
            }
            _ = rotate.tick() => {
                board.rotate();
                renderer.render(&board.current_state());
            }
            _ = &mut shutdown => {
                info!("Shutting down rotation loop");
                break;
            }
        }
    }
}
