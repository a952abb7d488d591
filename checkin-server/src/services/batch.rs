//! Scheduled alert batch
//!
//! Scans every group and fires two independent alerts measured from the
//! group's latest quiz:
//!
//! - **No quiz**: family members are told nothing was posted for
//!   `alert_frequency_days`.
//! - **Reminder**: grandparents are nudged a little earlier, at
//!   `alert_frequency_days - max(alert_frequency_days / 4, 3 hours)`.
//!
//! Each alert fires at most once per quiz: the alert history row written on
//! send is newer than the quiz and suppresses repeats until the next quiz.

use std::sync::Arc;

use serde::Serialize;
use shared::models::{AlertKind, Group};
use shared::util::{days_between, now_millis};

use crate::db::{AlertRepository, GroupRepository, QuizRepository, Repositories};
use crate::error::ServiceResult;
use crate::line::{BulkResult, LineMessage, Messenger, messages, send_bulk};

use super::{FrontendLinks, is_family, is_grandparent, line_ids};

/// Minimum reminder lead: three hours, in days
const MIN_REMINDER_LEAD_DAYS: f64 = 3.0 / 24.0;

/// Alert kinds produced by the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    NoQuiz,
    Reminder,
}

impl BatchKind {
    pub fn alert_kind(self) -> AlertKind {
        match self {
            BatchKind::NoQuiz => AlertKind::NoQuiz,
            BatchKind::Reminder => AlertKind::GrandparentQuizReminder,
        }
    }

    /// Days since the latest quiz at which this alert becomes due
    pub fn threshold_days(self, alert_frequency_days: f64) -> f64 {
        match self {
            BatchKind::NoQuiz => alert_frequency_days,
            BatchKind::Reminder => {
                alert_frequency_days - (alert_frequency_days / 4.0).max(MIN_REMINDER_LEAD_DAYS)
            }
        }
    }
}

/// Counters of one batch pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total_groups: usize,
    pub alert_sent: usize,
    pub skipped: usize,
    pub line_success: usize,
    pub line_failure: usize,
}

enum GroupOutcome {
    Sent(BulkResult),
    Skipped(&'static str),
}

pub struct BatchService {
    groups: Arc<dyn GroupRepository>,
    quizzes: Arc<dyn QuizRepository>,
    alerts: Arc<dyn AlertRepository>,
    messenger: Arc<dyn Messenger>,
    links: FrontendLinks,
}

impl BatchService {
    pub fn new(repos: &Repositories, messenger: Arc<dyn Messenger>, links: FrontendLinks) -> Self {
        Self {
            groups: repos.groups.clone(),
            quizzes: repos.quizzes.clone(),
            alerts: repos.alerts.clone(),
            messenger,
            links,
        }
    }

    /// No-quiz pass, then reminder pass
    pub async fn run_all(&self) -> ServiceResult<(BatchSummary, BatchSummary)> {
        let no_quiz = self.run(BatchKind::NoQuiz, now_millis()).await?;
        let reminder = self.run(BatchKind::Reminder, now_millis()).await?;
        Ok((no_quiz, reminder))
    }

    /// One pass over every group.
    ///
    /// Only listing the groups can fail the pass; a failing group is logged
    /// and the scan moves on.
    pub async fn run(&self, kind: BatchKind, now_ms: i64) -> ServiceResult<BatchSummary> {
        let groups = self.groups.list_all().await?;
        let mut summary = BatchSummary {
            total_groups: groups.len(),
            ..Default::default()
        };

        for group in &groups {
            match self.process_group(kind, group, now_ms).await {
                Ok(GroupOutcome::Sent(result)) => {
                    summary.alert_sent += 1;
                    summary.line_success += result.success;
                    summary.line_failure += result.failure;
                }
                Ok(GroupOutcome::Skipped(reason)) => {
                    tracing::debug!(group_id = group.id, ?kind, reason, "Alert skipped");
                    summary.skipped += 1;
                }
                Err(e) => {
                    tracing::error!(
                        group_id = group.id,
                        ?kind,
                        error = ?e,
                        "Alert batch failed for group"
                    );
                }
            }
        }

        tracing::info!(
            ?kind,
            total_groups = summary.total_groups,
            alert_sent = summary.alert_sent,
            skipped = summary.skipped,
            line_success = summary.line_success,
            line_failure = summary.line_failure,
            "Alert batch finished"
        );
        Ok(summary)
    }

    async fn process_group(
        &self,
        kind: BatchKind,
        group: &Group,
        now_ms: i64,
    ) -> ServiceResult<GroupOutcome> {
        let Some(latest) = self.quizzes.latest_for_group(group.id).await? else {
            return Ok(GroupOutcome::Skipped("no quiz yet"));
        };

        let elapsed_days = days_between(latest.created_at, now_ms);
        if elapsed_days < kind.threshold_days(group.alert_frequency_days) {
            return Ok(GroupOutcome::Skipped("not due"));
        }

        let alert_kind = kind.alert_kind();
        if let Some(last) = self.alerts.latest(group.id, alert_kind).await?
            && last.created_at >= latest.created_at
        {
            return Ok(GroupOutcome::Skipped("already sent"));
        }

        let members = self.groups.list_members(group.id).await?;
        let (recipients, messages) = match kind {
            BatchKind::NoQuiz => (
                line_ids(&members, is_family),
                messages::no_quiz_alert(elapsed_days),
            ),
            BatchKind::Reminder => (
                line_ids(&members, is_grandparent),
                messages::quiz_reminder(&self.links.create_page()),
            ),
        };
        if recipients.is_empty() {
            return Ok(GroupOutcome::Skipped("no recipients"));
        }

        let result = self.send(&recipients, &messages).await;
        self.alerts.create(group.id, alert_kind, None).await?;
        tracing::info!(
            group_id = group.id,
            kind = alert_kind.as_str(),
            elapsed_days,
            success = result.success,
            failure = result.failure,
            "Alert sent"
        );
        Ok(GroupOutcome::Sent(result))
    }

    async fn send(&self, recipients: &[String], messages: &[LineMessage]) -> BulkResult {
        send_bulk(self.messenger.as_ref(), recipients, messages).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeMessenger, MemoryStore};
    use shared::models::Role;
    use shared::util::DAY_MS;

    const HOUR_MS: i64 = DAY_MS / 24;

    struct Fixture {
        store: MemoryStore,
        messenger: Arc<FakeMessenger>,
        service: BatchService,
        group_id: i64,
        grandma: i64,
    }

    fn fixture(freq: f64) -> Fixture {
        let store = MemoryStore::new();
        let grandma = store.add_user("UG", "Grandma", Some(Role::Grandparent)).id;
        let son = store.add_user("US", "Son", Some(Role::Family)).id;
        let unset = store.add_user("UN", "Newcomer", None).id;
        let group = store.add_group("ABCD1234", "G", "password1", freq);
        store.add_member(group.id, grandma, true);
        store.add_member(group.id, son, false);
        store.add_member(group.id, unset, false);

        let messenger = Arc::new(FakeMessenger::new());
        let service = BatchService::new(
            &store.repositories(),
            messenger.clone(),
            FrontendLinks::new("https://app.example"),
        );
        Fixture {
            store,
            messenger,
            service,
            group_id: group.id,
            grandma,
        }
    }

    #[test]
    fn thresholds() {
        assert_eq!(BatchKind::NoQuiz.threshold_days(2.0), 2.0);
        assert_eq!(BatchKind::Reminder.threshold_days(2.0), 1.5);
        assert_eq!(BatchKind::NoQuiz.threshold_days(1.0), 1.0);
        assert_eq!(BatchKind::Reminder.threshold_days(1.0), 0.75);
        // Quarter of half a day is below the three hour floor
        assert!((BatchKind::Reminder.threshold_days(0.5) - (0.5 - 0.125)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn group_without_quiz_is_skipped() {
        let f = fixture(1.0);
        let summary = f.service.run(BatchKind::NoQuiz, now_millis()).await.unwrap();
        assert_eq!(
            summary,
            BatchSummary {
                total_groups: 1,
                skipped: 1,
                ..Default::default()
            }
        );
        assert!(f.messenger.recipients().is_empty());
    }

    #[tokio::test]
    async fn no_quiz_alert_fires_once_per_quiz() {
        let f = fixture(2.0);
        // Two and a half days against a two day frequency
        f.store.add_quiz(f.group_id, f.grandma, "Q", 5 * DAY_MS / 2);
        let now = now_millis();

        let summary = f.service.run(BatchKind::NoQuiz, now).await.unwrap();
        assert_eq!(summary.alert_sent, 1);
        assert_eq!(summary.line_success, 2);
        assert_eq!(f.messenger.recipients(), vec!["US", "UN"]);
        assert!(f.messenger.texts()[0].contains("2日"));

        let alerts = f.store.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::NoQuiz);
        assert_eq!(alerts[0].triggered_by, None);
        assert!(alerts[0].created_at >= now);

        let summary = f.service.run(BatchKind::NoQuiz, now).await.unwrap();
        assert_eq!(summary.alert_sent, 0);
        assert_eq!(summary.skipped, 1);
        assert_eq!(f.store.alerts().len(), 1);

        // A new quiz resets eligibility
        f.store.backdate_alerts(HOUR_MS);
        f.store.add_quiz(f.group_id, f.grandma, "Q2", 0);
        let later = now_millis() + 3 * DAY_MS;
        let summary = f.service.run(BatchKind::NoQuiz, later).await.unwrap();
        assert_eq!(summary.alert_sent, 1);
    }

    #[tokio::test]
    async fn no_quiz_alert_waits_for_threshold() {
        let f = fixture(2.0);
        f.store.add_quiz(f.group_id, f.grandma, "Q", DAY_MS);
        let summary = f.service.run(BatchKind::NoQuiz, now_millis()).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(f.store.alerts().is_empty());
    }

    #[tokio::test]
    async fn reminder_targets_grandparents_before_deadline() {
        let f = fixture(2.0);
        // 1.6 days: past the 1.5 day reminder point, before the 2 day alert
        f.store.add_quiz(f.group_id, f.grandma, "Q", 16 * DAY_MS / 10);
        let now = now_millis();

        let reminder = f.service.run(BatchKind::Reminder, now).await.unwrap();
        assert_eq!(reminder.alert_sent, 1);
        assert_eq!(f.messenger.recipients(), vec!["UG"]);
        assert!(f.messenger.texts()[0].contains("https://app.example/old"));

        let no_quiz = f.service.run(BatchKind::NoQuiz, now).await.unwrap();
        assert_eq!(no_quiz.alert_sent, 0);

        let kinds: Vec<AlertKind> = f.store.alerts().iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AlertKind::GrandparentQuizReminder]);
    }

    #[tokio::test]
    async fn send_failures_are_counted_and_history_still_written() {
        let f = fixture(1.0);
        f.store.add_quiz(f.group_id, f.grandma, "Q", 2 * DAY_MS);
        f.messenger.fail_all();

        let summary = f.service.run(BatchKind::NoQuiz, now_millis()).await.unwrap();
        assert_eq!(summary.alert_sent, 1);
        assert_eq!(summary.line_success, 0);
        assert_eq!(summary.line_failure, 2);
        assert_eq!(f.store.alerts().len(), 1);
    }

    #[tokio::test]
    async fn group_without_audience_is_skipped() {
        let store = MemoryStore::new();
        let grandma = store.add_user("UG", "Grandma", Some(Role::Grandparent)).id;
        let group = store.add_group("ABCD1234", "G", "password1", 1.0);
        store.add_member(group.id, grandma, true);
        store.add_quiz(group.id, grandma, "Q", 5 * DAY_MS);

        let service = BatchService::new(
            &store.repositories(),
            Arc::new(FakeMessenger::new()),
            FrontendLinks::new("https://app.example"),
        );
        let summary = service.run(BatchKind::NoQuiz, now_millis()).await.unwrap();
        assert_eq!(summary.skipped, 1);
        assert!(store.alerts().is_empty());
    }

    #[tokio::test]
    async fn failing_group_does_not_stop_the_batch() {
        let f = fixture(1.0);
        let broken = f.store.add_group("BROKEN00", "Broken", "password1", 1.0);
        f.store.fail_latest_quiz_for(broken.id);
        f.store.add_quiz(f.group_id, f.grandma, "Q", 2 * DAY_MS);

        let summary = f.service.run(BatchKind::NoQuiz, now_millis()).await.unwrap();
        assert_eq!(summary.total_groups, 2);
        assert_eq!(summary.alert_sent, 1);
        assert_eq!(summary.skipped, 0);
    }
}
