//! Lifecycle of the shared backend handle
//!
//! eSpeak accumulates open files and child processes when driven at high
//! volume. The manager keeps a single handle, hands out shared references to
//! it, and throws it away every `reset_interval` acquisitions so the next
//! request starts from a fresh engine. Callers already holding the old handle
//! finish on it; it is released when the last reference drops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use super::{BackendFactory, BackendHandle, BackendOptions};
use crate::core::health::EngineHealth;
use crate::core::language::LanguageCode;
use crate::errors::{PhonemizerError, PhonemizerResult};

/// Acquisitions between forced resets
pub const DEFAULT_RESET_INTERVAL: u64 = 50;

/// Bound on creating a handle, which holds the manager lock
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Default)]
struct ManagerState {
    handle: Option<BackendHandle>,
    acquisitions: u64,
    generation: u64,
}

/// Owns the live backend handle and enforces the periodic reset
pub struct BackendManager {
    factory: Arc<dyn BackendFactory>,
    options: BackendOptions,
    reset_interval: u64,
    create_timeout: Duration,
    health: Arc<EngineHealth>,
    state: Mutex<ManagerState>,
}

impl BackendManager {
    /// Create a manager. A `reset_interval` of 0 disables periodic resets.
    pub fn new(
        factory: Arc<dyn BackendFactory>,
        options: BackendOptions,
        reset_interval: u64,
        health: Arc<EngineHealth>,
    ) -> Self {
        Self {
            factory,
            options,
            reset_interval,
            create_timeout: DEFAULT_CREATE_TIMEOUT,
            health,
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Bound how long a single handle creation may take. Expiry fails the
    /// acquisition and leaves the slot empty.
    pub fn with_create_timeout(mut self, timeout: Duration) -> Self {
        self.create_timeout = timeout;
        self
    }

    /// Acquire a handle for a language given as a string code
    pub async fn acquire_code(&self, language: &str) -> PhonemizerResult<BackendHandle> {
        let language = language.parse::<LanguageCode>()?;
        self.acquire(language).await
    }

    /// Acquire the handle for `language`, creating or recreating it as needed.
    ///
    /// Every call counts towards the reset interval. On the call that reaches
    /// a multiple of the interval the cached handle is dropped and a new one is
    /// created before returning. A cached handle for another language is
    /// replaced. If creation fails the slot stays empty and the next call
    /// tries again.
    pub async fn acquire(&self, language: LanguageCode) -> PhonemizerResult<BackendHandle> {
        let mut state = self.state.lock().await;
        state.acquisitions += 1;

        if self.reset_interval > 0
            && state.acquisitions % self.reset_interval == 0
            && state.handle.take().is_some()
        {
            tracing::info!(
                "Resetting {} backend after {} acquisitions",
                self.factory.name(),
                state.acquisitions
            );
        }

        if let Some(handle) = &state.handle {
            if handle.language() == language {
                return Ok(handle.clone());
            }
            tracing::warn!(
                "Switching {} backend from {} to {}",
                self.factory.name(),
                handle.language(),
                language
            );
            state.handle = None;
        }

        let handle = self.create(language).await?;
        state.handle = Some(handle.clone());
        state.generation += 1;
        Ok(handle)
    }

    async fn create(&self, language: LanguageCode) -> PhonemizerResult<BackendHandle> {
        if !self.factory.is_available().await {
            let reason = format!("{} is not installed or not responding", self.factory.name());
            self.health.mark_degraded(reason.clone());
            return Err(PhonemizerError::EngineNotInstalled(reason));
        }

        let created = tokio::time::timeout(
            self.create_timeout,
            self.factory.create(language, self.options),
        )
        .await
        .unwrap_or_else(|_| Err(PhonemizerError::timeout("backend creation", self.create_timeout)));

        match created {
            Ok(handle) => {
                tracing::debug!(
                    "Created {} backend for {}",
                    self.factory.name(),
                    language
                );
                Ok(handle)
            }
            Err(e) => {
                let err = match e {
                    PhonemizerError::EngineInitializationFailed(_)
                    | PhonemizerError::EngineNotInstalled(_) => e,
                    other => PhonemizerError::EngineInitializationFailed(other.to_string()),
                };
                self.health.mark_degraded(err.to_string());
                Err(err)
            }
        }
    }

    /// Drop the cached handle; the next acquisition creates a new one
    pub async fn reset(&self) {
        if self.state.lock().await.handle.take().is_some() {
            tracing::info!("Backend handle discarded on request");
        }
    }

    /// Total acquisitions so far
    pub async fn acquisitions(&self) -> u64 {
        self.state.lock().await.acquisitions
    }

    /// Number of handles created so far
    pub async fn generation(&self) -> u64 {
        self.state.lock().await.generation
    }

    pub fn reset_interval(&self) -> u64 {
        self.reset_interval
    }

    pub fn create_timeout(&self) -> Duration {
        self.create_timeout
    }

    pub fn health(&self) -> &Arc<EngineHealth> {
        &self.health
    }

    pub fn factory(&self) -> &Arc<dyn BackendFactory> {
        &self.factory
    }
}
