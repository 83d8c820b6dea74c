//! Concurrent per-leg routing.
//!
//! One request per consecutive waypoint pair. Requests run as futures on a
//! runtime owned by the fetcher, bounded by a semaphore. Every leg owns a
//! pre-allocated slot addressed by its index, so results land in leg order no
//! matter which request finishes first. Cancelling a build drops every
//! in-flight request future, which aborts the request and frees its permit.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::runtime::Runtime;
use tokio::sync::{Semaphore, watch};
use tracing::{debug, warn};

use crate::error::{LegFetchError, TripRouteError};
use crate::traits::LegRouteProvider;
use crate::waypoint::Waypoint;

pub const DEFAULT_MAX_PARALLEL_REQUESTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchOptions {
    pub max_parallel_requests: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            max_parallel_requests: DEFAULT_MAX_PARALLEL_REQUESTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LegStatus {
    Pending,
    Fetched,
    Failed(LegFetchError),
}

/// Routing state of the path between waypoints `from_index` and `to_index`.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub from_index: usize,
    pub to_index: usize,
    pub status: LegStatus,
    pub encoded_geometry: Option<String>,
    pub distance_meters: Option<f64>,
    pub duration_seconds: Option<f64>,
}

impl RouteLeg {
    pub fn pending(from_index: usize) -> Self {
        Self {
            from_index,
            to_index: from_index + 1,
            status: LegStatus::Pending,
            encoded_geometry: None,
            distance_meters: None,
            duration_seconds: None,
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.status, LegStatus::Pending)
    }

    fn fail(&mut self, error: LegFetchError) {
        self.status = LegStatus::Failed(error);
        self.encoded_geometry = None;
        self.distance_meters = None;
        self.duration_seconds = None;
    }
}

/// Shared cancellation signal for one build.
///
/// Clones observe the same signal. Once cancelled it stays cancelled.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<watch::Sender<bool>>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            cancelled: Arc::new(sender),
        }
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once [`CancellationToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut receiver = self.cancelled.subscribe();
        // The sender lives as long as `self`, so this only ends on cancel.
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

pub struct LegRouteFetcher<P> {
    provider: P,
    runtime: Runtime,
    permits: Semaphore,
}

impl<P> LegRouteFetcher<P>
where
    P: LegRouteProvider,
{
    pub fn new(provider: P, options: &FetchOptions) -> std::io::Result<Self> {
        let parallel = options.max_parallel_requests.max(1);
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(parallel)
            .thread_name("leg-fetch")
            .enable_all()
            .build()?;
        Ok(Self {
            provider,
            runtime,
            permits: Semaphore::new(parallel),
        })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Routes every consecutive waypoint pair.
    ///
    /// Returns once every leg is `Fetched` or `Failed`. A failed leg never
    /// stops the others. If `token` is cancelled, every request still in
    /// flight is dropped and the whole result is discarded.
    ///
    /// Blocks the calling thread; must not be called from within an async
    /// context.
    pub fn fetch(
        &self,
        waypoints: &[Waypoint],
        token: &CancellationToken,
    ) -> Result<Vec<RouteLeg>, TripRouteError> {
        let leg_count = waypoints.len().saturating_sub(1);
        let mut legs: Vec<RouteLeg> = (0..leg_count).map(RouteLeg::pending).collect();

        if token.is_cancelled() {
            warn!(legs = leg_count, "leg fetch cancelled before start");
            return Err(TripRouteError::Cancelled);
        }

        let completed = self.runtime.block_on(async {
            let requests = join_all(legs.iter_mut().map(|leg| self.settle(leg, waypoints)));
            tokio::select! {
                biased;
                _ = token.cancelled() => false,
                _ = requests => true,
            }
        });

        if !completed || token.is_cancelled() {
            warn!(legs = leg_count, "leg fetch cancelled, discarding results");
            return Err(TripRouteError::Cancelled);
        }
        Ok(legs)
    }

    async fn settle(&self, leg: &mut RouteLeg, waypoints: &[Waypoint]) {
        let from = waypoints[leg.from_index].coordinate;
        let to = waypoints[leg.to_index].coordinate;

        let Ok(_permit) = self.permits.acquire().await else {
            leg.fail(LegFetchError::Transport("leg request limiter closed".to_string()));
            return;
        };
        let started = Instant::now();

        match self.provider.route_leg(from, to).await {
            Ok(route) => {
                debug!(leg = leg.from_index, elapsed = ?started.elapsed(), "leg fetched");
                leg.status = LegStatus::Fetched;
                leg.encoded_geometry = Some(route.encoded_geometry);
                leg.distance_meters = route.distance_meters;
                leg.duration_seconds = route.duration_seconds;
            }
            Err(err) => {
                warn!(leg = leg.from_index, error = %err, "leg fetch failed");
                leg.fail(err);
            }
        }
    }
}
