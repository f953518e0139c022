// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Token refresh scheduler.
//!
//! Keeps one bearer token alive by renewing it shortly before it expires.
//!
//! ```text
//!   Idle ──start──► Scheduled ──timer──► Refreshing ──ok──► Scheduled
//!    ▲                  │                    │
//!    └──────stop────────┘◄───────error───────┘ (Idle)
//! ```
//!
//! At most one refresh runs at a time. A refresh that completes after
//! [`TokenRefreshManager::stop_auto_refresh`] keeps its token but does not
//! re-arm the timer.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use minder_core::jwt::{self, DEFAULT_REFRESH_THRESHOLD};
use minder_core::{system_clock, SharedClock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::events::{NoopEvents, TokenEvents};

/// Error returned by a [`TokenRefresher`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Boxed future returned by [`TokenRefresher::refresh`].
pub type RefreshFuture<'a> = Pin<Box<dyn Future<Output = Result<String, BoxError>> + Send + 'a>>;

/// Obtains a fresh token from the identity provider.
pub trait TokenRefresher: Send + Sync {
    fn refresh(&self) -> RefreshFuture<'_>;
}

impl<F, Fut> TokenRefresher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<String, BoxError>> + Send + 'static,
{
    fn refresh(&self) -> RefreshFuture<'_> {
        Box::pin(self())
    }
}

/// Supplies the credential attached to outbound requests.
pub trait CredentialSource: Send + Sync {
    /// Token to send, if any.
    fn current_token(&self) -> Option<String>;

    /// Called when the server rejected the current token.
    fn on_unauthorized(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async {})
    }
}

/// A fixed token that is never renewed.
#[derive(Debug, Clone)]
pub struct StaticCredential(pub String);

impl CredentialSource for StaticCredential {
    fn current_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Error type for token operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,

    #[error("refreshed token is empty")]
    Empty,

    #[error("token refresh failed: {0}")]
    Refresh(String),

    #[error("token was replaced while the refresh was running")]
    Superseded,
}

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Scheduled,
    Refreshing,
}

struct Shared {
    token: Option<String>,
    state: RefreshState,
    timer: Option<CancellationToken>,
    auto_refresh: bool,
    /// Bumped by every start and stop; a refresh only re-arms if unchanged.
    generation: u64,
}

struct Inner {
    refresher: Arc<dyn TokenRefresher>,
    events: Arc<dyn TokenEvents>,
    clock: SharedClock,
    threshold: Duration,
    shared: Mutex<Shared>,
    refresh_lock: tokio::sync::Mutex<()>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let shared = self.shared.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Some(timer) = shared.timer.take() {
            timer.cancel();
        }
    }
}

/// Builder for [`TokenRefreshManager`].
pub struct TokenRefreshManagerBuilder {
    refresher: Arc<dyn TokenRefresher>,
    events: Arc<dyn TokenEvents>,
    clock: SharedClock,
    threshold: Duration,
}

impl TokenRefreshManagerBuilder {
    /// Lead time before expiry at which to refresh (default: 5 minutes).
    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn events(mut self, events: Arc<dyn TokenEvents>) -> Self {
        self.events = events;
        self
    }

    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> TokenRefreshManager {
        TokenRefreshManager {
            inner: Arc::new(Inner {
                refresher: self.refresher,
                events: self.events,
                clock: self.clock,
                threshold: self.threshold,
                shared: Mutex::new(Shared {
                    token: None,
                    state: RefreshState::Idle,
                    timer: None,
                    auto_refresh: false,
                    generation: 0,
                }),
                refresh_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }
}

/// Renews a token ahead of its expiration.
///
/// Cloning yields another handle to the same scheduler.
#[derive(Clone)]
pub struct TokenRefreshManager {
    inner: Arc<Inner>,
}

impl TokenRefreshManager {
    pub fn builder(refresher: impl TokenRefresher + 'static) -> TokenRefreshManagerBuilder {
        TokenRefreshManagerBuilder {
            refresher: Arc::new(refresher),
            events: Arc::new(NoopEvents),
            clock: system_clock(),
            threshold: DEFAULT_REFRESH_THRESHOLD,
        }
    }

    pub fn new(refresher: impl TokenRefresher + 'static) -> Self {
        Self::builder(refresher).build()
    }

    /// Store `token` and schedule its renewal.
    ///
    /// A token without a decodable expiration is stored but not scheduled.
    /// Must be called from within a tokio runtime for the timer to arm.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Expired`] if `token` has already expired; the
    /// scheduler is left unchanged.
    pub fn start_auto_refresh(&self, token: impl Into<String>) -> Result<(), TokenError> {
        let token = token.into();
        let now = self.inner.clock.now_ms();
        if jwt::is_expired(&token, now) {
            warn!("refusing to schedule refresh for an expired token");
            return Err(TokenError::Expired);
        }

        let mut shared = self.inner.lock();
        shared.generation += 1;
        shared.auto_refresh = true;
        shared.token = Some(token.clone());
        self.inner.arm(&mut shared, &token, now);
        Ok(())
    }

    /// Cancel the timer and return to idle.
    pub fn stop_auto_refresh(&self) {
        let mut shared = self.inner.lock();
        shared.generation += 1;
        shared.auto_refresh = false;
        if let Some(timer) = shared.timer.take() {
            timer.cancel();
        }
        shared.state = RefreshState::Idle;
        debug!("auto refresh stopped");
    }

    /// Refresh immediately.
    ///
    /// If a refresh is already running, waits for it instead of starting
    /// another. Returns the token current afterwards, which is the prior
    /// token when the refresh failed.
    pub async fn refresh_now(&self) -> Option<String> {
        match self.inner.refresh_lock.try_lock() {
            Ok(_guard) => match self.inner.run_refresh().await {
                Ok(token) => Some(token),
                Err(_) => self.current_token(),
            },
            Err(_) => {
                debug!("refresh in flight, waiting for it");
                let _guard = self.inner.refresh_lock.lock().await;
                self.current_token()
            }
        }
    }

    pub fn current_token(&self) -> Option<String> {
        self.inner.lock().token.clone()
    }

    pub fn state(&self) -> RefreshState {
        self.inner.lock().state
    }

    pub fn is_refreshing(&self) -> bool {
        self.state() == RefreshState::Refreshing
    }

    pub fn threshold(&self) -> Duration {
        self.inner.threshold
    }

    /// True once `token` has expired. Undecodable tokens are not expired.
    pub fn is_token_expired(&self, token: &str) -> bool {
        jwt::is_expired(token, self.inner.clock.now_ms())
    }

    /// True when `token` expires within the refresh threshold.
    pub fn needs_refresh(&self, token: &str) -> bool {
        jwt::needs_refresh(token, self.inner.clock.now_ms(), self.inner.threshold)
    }

    /// Time left before `token` expires, zero once expired.
    ///
    /// `None` if the expiration cannot be decoded.
    pub fn time_until_expiration(&self, token: &str) -> Option<Duration> {
        jwt::time_until_expiration_ms(token, self.inner.clock.now_ms())
            .map(|ms| Duration::from_millis(ms.max(0).unsigned_abs()))
    }
}

impl CredentialSource for TokenRefreshManager {
    fn current_token(&self) -> Option<String> {
        TokenRefreshManager::current_token(self)
    }

    fn on_unauthorized(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move {
            self.refresh_now().await;
        })
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace any pending timer with one for `token`.
    fn arm(self: &Arc<Self>, shared: &mut Shared, token: &str, now_ms: u64) {
        if let Some(timer) = shared.timer.take() {
            timer.cancel();
        }

        let Some(remaining_ms) = jwt::time_until_expiration_ms(token, now_ms) else {
            info!("token has no expiration claim, not scheduling refresh");
            shared.state = RefreshState::Idle;
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("no async runtime, not scheduling refresh");
            shared.state = RefreshState::Idle;
            return;
        };

        let threshold_ms = i64::try_from(self.threshold.as_millis()).unwrap_or(i64::MAX);
        let delay = Duration::from_millis(remaining_ms.saturating_sub(threshold_ms).max(0).unsigned_abs());
        let cancel = CancellationToken::new();
        let fired = cancel.clone();
        let weak = Arc::downgrade(self);
        let generation = shared.generation;

        handle.spawn(async move {
            tokio::select! {
                _ = fired.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if let Some(inner) = weak.upgrade() {
                        inner.on_timer(generation).await;
                    }
                }
            }
        });

        debug!(delay_secs = delay.as_secs(), "token refresh scheduled");
        shared.timer = Some(cancel);
        shared.state = RefreshState::Scheduled;
    }

    async fn on_timer(self: &Arc<Self>, generation: u64) {
        if self.lock().generation != generation {
            return;
        }
        let Ok(_guard) = self.refresh_lock.try_lock() else {
            debug!("refresh already in flight, skipping timer");
            return;
        };
        let _ = self.run_refresh().await;
    }

    /// Call the refresher and apply its result. Caller holds `refresh_lock`.
    async fn run_refresh(self: &Arc<Self>) -> Result<String, TokenError> {
        let (generation, prior) = {
            let mut shared = self.lock();
            if let Some(timer) = shared.timer.take() {
                timer.cancel();
            }
            shared.state = RefreshState::Refreshing;
            (shared.generation, shared.token.clone())
        };

        let result = self.refresher.refresh().await;
        let now = self.clock.now_ms();
        let validated = match result {
            Ok(token) if token.trim().is_empty() => Err(TokenError::Empty),
            Ok(token) if jwt::is_expired(&token, now) => Err(TokenError::Expired),
            Ok(token) => Ok(token),
            Err(e) => Err(TokenError::Refresh(e.to_string())),
        };

        match validated {
            Ok(token) => {
                {
                    let mut shared = self.lock();
                    if shared.token != prior {
                        debug!("token replaced during refresh, discarding result");
                        return Err(TokenError::Superseded);
                    }
                    shared.token = Some(token.clone());
                    // A newer cycle owns the state once the generation moved on.
                    if shared.generation == generation {
                        if shared.auto_refresh {
                            self.arm(&mut shared, &token, now);
                        } else {
                            shared.state = RefreshState::Idle;
                        }
                    }
                }
                info!("token refreshed");
                self.events.on_token_refreshed(&token);
                Ok(token)
            }
            Err(e) => {
                {
                    let mut shared = self.lock();
                    if shared.generation == generation {
                        shared.state = RefreshState::Idle;
                    }
                }
                warn!(error = %e, "token refresh failed");
                self.events.on_refresh_error(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
