//! Startup and shutdown logging around the serving period.
//!
//! [`Lifecycle::start`] logs the resolved settings and returns a
//! [`LifecycleGuard`]; the shutdown line is logged once, either through
//! [`LifecycleGuard::stop`] or when the guard is dropped.

use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::{info, warn};

use crate::config::Settings;

pub struct Lifecycle;

impl Lifecycle {
    pub fn start(settings: &Settings) -> LifecycleGuard {
        quietly(|| {
            info!("Starting JARVIS...");
            info!("Memory API URL: {}", settings.mem0_api_url);
            info!("User ID: {}", settings.user_id);

            // Logging only; no telemetry client is created.
            if settings.telemetry_enabled() {
                info!("Azure Application Insights configured");
            }

            if settings.cors_allowed_origins.is_empty() {
                warn!(
                    "CORS allows any origin with credentials; set CORS_ALLOWED_ORIGINS outside local development"
                );
            }
        });

        LifecycleGuard { stopped: false }
    }
}

#[must_use = "dropping the guard immediately logs shutdown"]
pub struct LifecycleGuard {
    stopped: bool,
}

impl LifecycleGuard {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        quietly(|| info!("Shutting down JARVIS..."));
    }
}

impl Drop for LifecycleGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Runs a logging step, swallowing any panic raised by the subscriber.
fn quietly<F: FnOnce()>(f: F) {
    let _ = catch_unwind(AssertUnwindSafe(f));
}
