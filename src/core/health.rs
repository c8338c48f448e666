//! Shared engine health state
//!
//! The phonemizer only ever marks the engine as degraded; clearing the flag is
//! left to whoever owns the process lifecycle (usually by restarting it).

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Default grace period after startup during which health checks always pass
pub const DEFAULT_WARMUP_PERIOD: Duration = Duration::from_secs(60);

/// Process-wide "engine unusable" flag plus startup bookkeeping
#[derive(Debug)]
pub struct EngineHealth {
    degraded: AtomicBool,
    reason: OnceLock<String>,
    started_at: Instant,
    warmup_period: Duration,
}

impl Default for EngineHealth {
    fn default() -> Self {
        Self::new(DEFAULT_WARMUP_PERIOD)
    }
}

impl EngineHealth {
    pub fn new(warmup_period: Duration) -> Self {
        Self {
            degraded: AtomicBool::new(false),
            reason: OnceLock::new(),
            started_at: Instant::now(),
            warmup_period,
        }
    }

    /// Flag the engine as unusable. The first reason wins.
    pub fn mark_degraded(&self, reason: impl Into<String>) {
        let _ = self.reason.set(reason.into());
        if !self.degraded.swap(true, Ordering::AcqRel) {
            tracing::error!(
                "Phonemizer engine marked degraded: {}",
                self.reason().unwrap_or("unknown")
            );
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Reason recorded by the first `mark_degraded` call
    pub fn reason(&self) -> Option<&str> {
        self.reason.get().map(String::as_str)
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }

    pub fn is_warming_up(&self) -> bool {
        self.uptime() < self.warmup_period
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Health summary handed to the surrounding service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HealthReport {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
            reason: None,
        }
    }

    pub fn warming_up() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: Some("warming up".to_string()),
            reason: None,
        }
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: None,
            reason: Some(reason.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_healthy() {
        let health = EngineHealth::default();
        assert!(!health.is_degraded());
        assert!(health.reason().is_none());
        assert!(health.is_warming_up());
    }

    #[test]
    fn test_mark_degraded_keeps_first_reason() {
        let health = EngineHealth::new(Duration::ZERO);
        health.mark_degraded("espeak-ng not found");
        health.mark_degraded("second failure");

        assert!(health.is_degraded());
        assert_eq!(health.reason(), Some("espeak-ng not found"));
    }

    #[test]
    fn test_zero_warmup_period() {
        let health = EngineHealth::new(Duration::ZERO);
        assert!(!health.is_warming_up());
    }

    #[test]
    fn test_report_serialization() {
        let json = serde_json::to_value(HealthReport::unhealthy("espeak not working")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "unhealthy", "reason": "espeak not working"})
        );

        let json = serde_json::to_value(HealthReport::warming_up()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "healthy", "message": "warming up"})
        );

        let json = serde_json::to_value(HealthReport::healthy()).unwrap();
        assert_eq!(json, serde_json::json!({"status": "healthy"}));
    }

    #[test]
    fn test_concurrent_marking() {
        let health = std::sync::Arc::new(EngineHealth::default());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let health = health.clone();
                std::thread::spawn(move || health.mark_degraded(format!("failure {i}")))
            })
            .collect();
        for handle in handles {
            handle.join().expect("Thread panicked");
        }
        assert!(health.is_degraded());
        assert!(health.reason().unwrap().starts_with("failure "));
    }
}
