//! Per-client fixed-window admission control.
//!
//! Each client identity gets a counter that resets once its window has
//! elapsed. Bursts of up to twice the limit are possible across a window
//! boundary; the counter trades smoothness for a single map lookup per
//! request.
//!
//! Idle clients are removed by a sweeper task owned by the [`RateLimiter`]
//! and stopped when the limiter is dropped.

use actix_web::{
    body::{BoxBody, EitherBody},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderValue, RETRY_AFTER},
    Error, HttpRequest, ResponseError,
};
use futures_util::future::LocalBoxFuture;
use std::collections::HashMap;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::core::AppError;

/// How often the sweeper scans for idle clients
pub const EVICTION_INTERVAL: Duration = Duration::from_secs(60);

/// Clients idle for longer than this are forgotten
pub const STALE_AFTER: Duration = Duration::from_secs(300);

/// Paths that are never rate limited
const EXEMPT_PATHS: &[&str] = &["/api/health", "/api/ready", "/health", "/ready"];

/// Counter state for one client identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientWindowState {
    /// Requests observed in the current window
    pub count: u32,
    /// When the current window ends
    pub reset_at: Instant,
    /// Most recent request, used for eviction
    pub last_access: Instant,
}

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Exceeded { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateLimitDecision::Allowed)
    }
}

struct ClientTable {
    clients: RwLock<HashMap<String, ClientWindowState>>,
    limit: u32,
    window: Duration,
}

impl ClientTable {
    fn check_at(&self, client_id: &str, now: Instant) -> RateLimitDecision {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(state) = clients.get_mut(client_id) {
            if now <= state.reset_at {
                state.last_access = now;

                if state.count >= self.limit {
                    return RateLimitDecision::Exceeded {
                        retry_after_secs: whole_seconds(state.reset_at - now),
                    };
                }

                state.count += 1;
                return RateLimitDecision::Allowed;
            }
        }

        clients.insert(
            client_id.to_owned(),
            ClientWindowState {
                count: 1,
                reset_at: now + self.window,
                last_access: now,
            },
        );
        RateLimitDecision::Allowed
    }

    fn evict_stale_at(&self, now: Instant, stale_after: Duration) -> usize {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        let before = clients.len();
        clients.retain(|_, state| now.saturating_duration_since(state.last_access) <= stale_after);
        before - clients.len()
    }
}

/// Rounds up, never below one second
fn whole_seconds(remaining: Duration) -> u64 {
    let secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
    secs.max(1)
}

/// Fixed-window request counter keyed by an opaque client identity.
///
/// Independent instances share nothing, so separate limiters can guard
/// separate route groups.
pub struct RateLimiter {
    table: Arc<ClientTable>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    /// Limiter without background eviction
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            table: Arc::new(ClientTable {
                clients: RwLock::new(HashMap::new()),
                limit,
                window,
            }),
            sweeper: Mutex::new(None),
        }
    }

    /// Limiter with the default eviction schedule.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_eviction(limit: u32, window: Duration) -> Self {
        Self::with_eviction_schedule(limit, window, EVICTION_INTERVAL, STALE_AFTER)
    }

    pub fn with_eviction_schedule(
        limit: u32,
        window: Duration,
        every: Duration,
        stale_after: Duration,
    ) -> Self {
        let limiter = Self::new(limit, window);
        let handle = spawn_sweeper(Arc::downgrade(&limiter.table), every, stale_after);
        *limiter.sweeper.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        limiter
    }

    pub fn limit(&self) -> u32 {
        self.table.limit
    }

    pub fn window(&self) -> Duration {
        self.table.window
    }

    /// Admit or reject one request from `client_id`
    pub fn check(&self, client_id: &str) -> RateLimitDecision {
        self.table.check_at(client_id, Instant::now())
    }

    pub fn allow(&self, client_id: &str) -> bool {
        self.check(client_id).is_allowed()
    }

    /// `check` against an explicit clock reading
    pub fn check_at(&self, client_id: &str, now: Instant) -> RateLimitDecision {
        self.table.check_at(client_id, now)
    }

    /// Drop every client whose last request is older than `stale_after`.
    /// Returns how many were removed.
    pub fn evict_stale(&self, now: Instant, stale_after: Duration) -> usize {
        self.table.evict_stale_at(now, stale_after)
    }

    pub fn client_state(&self, client_id: &str) -> Option<ClientWindowState> {
        self.table
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(client_id)
            .copied()
    }

    pub fn tracked_clients(&self) -> usize {
        self.table
            .clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Stop the eviction task. Idempotent.
    pub fn shutdown(&self) {
        if let Some(handle) = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn spawn_sweeper(table: Weak<ClientTable>, every: Duration, stale_after: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(table) = table.upgrade() else {
                break;
            };

            let evicted = table.evict_stale_at(Instant::now(), stale_after);
            if evicted > 0 {
                debug!(evicted = evicted, "Evicted idle rate limit clients");
            }
        }
    })
}

/// Client identity: first `X-Forwarded-For` hop, then `X-Real-IP`,
/// then the peer address.
pub fn client_identity(req: &HttpRequest) -> String {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("X-Forwarded-For")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header("X-Real-IP"))
        .map(String::from)
        .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// Actix middleware that gates requests through a shared [`RateLimiter`]
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<BoxBody, B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitService<S>;
    type Future = Ready<std::result::Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    limiter: Arc<RateLimiter>,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<BoxBody, B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, std::result::Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();

        if EXEMPT_PATHS.contains(&req.path()) {
            return Box::pin(async move { svc.call(req).await.map(|res| res.map_into_right_body()) });
        }

        let client_id = client_identity(req.request());

        match self.limiter.check(&client_id) {
            RateLimitDecision::Allowed => {
                Box::pin(async move { svc.call(req).await.map(|res| res.map_into_right_body()) })
            }
            RateLimitDecision::Exceeded { retry_after_secs } => {
                warn!(
                    client_id = %client_id,
                    path = %req.path(),
                    retry_after_secs = retry_after_secs,
                    "Rate limit exceeded"
                );

                let mut denied = AppError::RateLimitExceeded(
                    "Too many requests. Please try again later.".to_string(),
                )
                .error_response();
                denied
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));

                Box::pin(async move { Ok(req.into_response(denied).map_into_left_body()) })
            }
        }
    }
}
