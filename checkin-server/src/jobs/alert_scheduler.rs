//! Alert batch scheduler
//!
//! Sleeps until the next cron fire time in the configured zone, runs the
//! no-quiz pass then the reminder pass, and repeats until shutdown. A failed
//! run is logged; the next tick is the retry.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use tokio_util::sync::CancellationToken;

use crate::services::BatchService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub struct AlertScheduler {
    batch: Arc<BatchService>,
    schedule: Schedule,
    tz: Tz,
    shutdown: CancellationToken,
}

impl AlertScheduler {
    /// `expression` must be in the seconds-first form produced by
    /// [`crate::config::normalize_cron`]
    pub fn new(
        batch: Arc<BatchService>,
        expression: &str,
        tz: Tz,
        shutdown: CancellationToken,
    ) -> Result<Self, BoxError> {
        let schedule = Schedule::from_str(expression)
            .map_err(|e| format!("invalid alert schedule {expression:?}: {e}"))?;
        Ok(Self {
            batch,
            schedule,
            tz,
            shutdown,
        })
    }

    /// Main loop
    pub async fn run(self) {
        tracing::info!(tz = %self.tz, "Alert scheduler started");

        loop {
            let Some(next) = next_fire(&self.schedule, self.tz, Utc::now()) else {
                tracing::warn!("Alert schedule has no upcoming fire time, stopping");
                break;
            };
            let wait = (next.with_timezone(&Utc) - Utc::now())
                .to_std()
                .unwrap_or(Duration::ZERO);
            tracing::debug!(next = %next, "Next alert batch scheduled");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Alert scheduler received shutdown signal");
                    break;
                }
            }

            self.tick().await;
        }

        tracing::info!("Alert scheduler stopped");
    }

    async fn tick(&self) {
        tracing::info!("Alert batch started");
        match self.batch.run_all().await {
            Ok((no_quiz, reminder)) => {
                tracing::info!(
                    no_quiz = ?no_quiz,
                    reminder = ?reminder,
                    "Alert batch completed"
                );
            }
            Err(e) => tracing::error!(error = ?e, "Alert batch failed"),
        }
    }
}

/// First fire time strictly after `after`, in `tz`
fn next_fire(schedule: &Schedule, tz: Tz, after: DateTime<Utc>) -> Option<DateTime<Tz>> {
    schedule.after(&after.with_timezone(&tz)).next()
}
