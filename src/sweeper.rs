use async_trait::async_trait;
use sqlx::PgPool;
use time::{Date, Duration, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::diet::repo as diet_repo;
use crate::exercise::repo as exercise_repo;
use crate::state::AppState;

/// Persistence capabilities the sweep needs, kept behind a trait so the
/// batch logic runs against an in-memory store in tests.
#[async_trait]
pub trait SweepStore: Send + Sync {
    /// Exercises dated strictly before `now` that are still scheduled.
    async fn overdue_scheduled_exercises(&self, now: OffsetDateTime) -> anyhow::Result<Vec<Uuid>>;

    /// Demote one exercise, only if it is still scheduled. Returns whether a
    /// row changed.
    async fn demote_exercise(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Diet entries dated strictly before the given day.
    async fn diets_before(&self, day: Date) -> anyhow::Result<Vec<Uuid>>;

    /// Detail rows of a diet that are still scheduled.
    async fn scheduled_details(&self, diet_id: Uuid) -> anyhow::Result<Vec<Uuid>>;

    /// Demote one detail row, only if it is still scheduled.
    async fn demote_detail(&self, id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgSweepStore {
    pub db: PgPool,
}

#[async_trait]
impl SweepStore for PgSweepStore {
    async fn overdue_scheduled_exercises(&self, now: OffsetDateTime) -> anyhow::Result<Vec<Uuid>> {
        Ok(exercise_repo::overdue_scheduled(&self.db, now).await?)
    }

    async fn demote_exercise(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(exercise_repo::demote_if_scheduled(&self.db, id).await?)
    }

    async fn diets_before(&self, day: Date) -> anyhow::Result<Vec<Uuid>> {
        Ok(diet_repo::diets_before(&self.db, day).await?)
    }

    async fn scheduled_details(&self, diet_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        Ok(diet_repo::scheduled_details(&self.db, diet_id).await?)
    }

    async fn demote_detail(&self, id: Uuid) -> anyhow::Result<bool> {
        Ok(diet_repo::demote_detail_if_scheduled(&self.db, id).await?)
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub exercises_demoted: usize,
    pub details_demoted: usize,
    pub failures: usize,
}

/// One reconciliation pass. `now` is resolved by the caller at invocation
/// time. Running the sweep twice in succession is a no-op the second time:
/// the store predicates only match `Scheduled` rows. Per-row failures are
/// logged and skipped, never aborting the batch.
pub async fn run_sweep<S: SweepStore + ?Sized>(store: &S, now: OffsetDateTime) -> SweepReport {
    let mut report = SweepReport::default();

    match store.overdue_scheduled_exercises(now).await {
        Ok(ids) => {
            for id in ids {
                match store.demote_exercise(id).await {
                    Ok(true) => report.exercises_demoted += 1,
                    Ok(false) => {} // changed out from under us, nothing to do
                    Err(e) => {
                        warn!(exercise_id = %id, error = %e, "failed to demote exercise");
                        report.failures += 1;
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, "failed to list overdue exercises");
            report.failures += 1;
        }
    }

    match store.diets_before(now.date()).await {
        Ok(diet_ids) => {
            for diet_id in diet_ids {
                let detail_ids = match store.scheduled_details(diet_id).await {
                    Ok(ids) => ids,
                    Err(e) => {
                        warn!(diet_id = %diet_id, error = %e, "failed to list scheduled details");
                        report.failures += 1;
                        continue;
                    }
                };
                for id in detail_ids {
                    match store.demote_detail(id).await {
                        Ok(true) => report.details_demoted += 1,
                        Ok(false) => {}
                        Err(e) => {
                            warn!(detail_id = %id, error = %e, "failed to demote diet detail");
                            report.failures += 1;
                        }
                    }
                }
            }
        }
        Err(e) => {
            error!(error = %e, "failed to list overdue diets");
            report.failures += 1;
        }
    }

    report
}

fn next_midnight_utc(now: OffsetDateTime) -> OffsetDateTime {
    (now.date() + Duration::days(1)).midnight().assume_utc()
}

/// Background task firing the sweep at every UTC midnight. The daily cadence
/// vastly exceeds a batch's runtime, so invocations never overlap.
pub fn spawn(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let store = PgSweepStore {
            db: state.db.clone(),
        };
        loop {
            let now = state.clock.now_utc();
            let wake_at = next_midnight_utc(now);
            let wait = (wake_at - now).whole_seconds().max(1) as u64;
            tokio::time::sleep(std::time::Duration::from_secs(wait)).await;

            let now = state.clock.now_utc();
            let report = run_sweep(&store, now).await;
            info!(
                exercises_demoted = report.exercises_demoted,
                details_demoted = report.details_demoted,
                failures = report.failures,
                "daily reconciliation sweep finished"
            );
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::EntryStatus;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use time::macros::{date, datetime};

    #[derive(Default)]
    struct MemStore {
        exercises: Mutex<HashMap<Uuid, (OffsetDateTime, EntryStatus)>>,
        diets: Mutex<HashMap<Uuid, Date>>,
        details: Mutex<HashMap<Uuid, (Uuid, EntryStatus)>>,
        // ids whose demote call should error, to exercise the skip path
        poisoned: Mutex<Vec<Uuid>>,
    }

    impl MemStore {
        fn add_exercise(&self, at: OffsetDateTime, status: EntryStatus) -> Uuid {
            let id = Uuid::new_v4();
            self.exercises.lock().unwrap().insert(id, (at, status));
            id
        }

        fn add_diet(&self, day: Date) -> Uuid {
            let id = Uuid::new_v4();
            self.diets.lock().unwrap().insert(id, day);
            id
        }

        fn add_detail(&self, diet_id: Uuid, status: EntryStatus) -> Uuid {
            let id = Uuid::new_v4();
            self.details.lock().unwrap().insert(id, (diet_id, status));
            id
        }

        fn exercise_status(&self, id: Uuid) -> EntryStatus {
            self.exercises.lock().unwrap()[&id].1
        }

        fn detail_status(&self, id: Uuid) -> EntryStatus {
            self.details.lock().unwrap()[&id].1
        }
    }

    #[async_trait]
    impl SweepStore for MemStore {
        async fn overdue_scheduled_exercises(
            &self,
            now: OffsetDateTime,
        ) -> anyhow::Result<Vec<Uuid>> {
            Ok(self
                .exercises
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, (at, status))| *at < now && *status == EntryStatus::Scheduled)
                .map(|(id, _)| *id)
                .collect())
        }

        async fn demote_exercise(&self, id: Uuid) -> anyhow::Result<bool> {
            if self.poisoned.lock().unwrap().contains(&id) {
                anyhow::bail!("simulated row failure");
            }
            let mut map = self.exercises.lock().unwrap();
            let entry = map.get_mut(&id).expect("known id");
            match entry.1.demote_if_overdue() {
                Some(next) => {
                    entry.1 = next;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn diets_before(&self, day: Date) -> anyhow::Result<Vec<Uuid>> {
            Ok(self
                .diets
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, d)| **d < day)
                .map(|(id, _)| *id)
                .collect())
        }

        async fn scheduled_details(&self, diet_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
            Ok(self
                .details
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, (parent, status))| {
                    *parent == diet_id && *status == EntryStatus::Scheduled
                })
                .map(|(id, _)| *id)
                .collect())
        }

        async fn demote_detail(&self, id: Uuid) -> anyhow::Result<bool> {
            if self.poisoned.lock().unwrap().contains(&id) {
                anyhow::bail!("simulated row failure");
            }
            let mut map = self.details.lock().unwrap();
            let entry = map.get_mut(&id).expect("known id");
            match entry.1.demote_if_overdue() {
                Some(next) => {
                    entry.1 = next;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
    }

    const SWEEP_AT: OffsetDateTime = datetime!(2024-05-18 00:00:00 UTC);

    #[tokio::test]
    async fn yesterdays_scheduled_exercise_is_demoted_tomorrows_is_not() {
        let store = MemStore::default();
        let yesterday = store.add_exercise(datetime!(2024-05-17 09:00:00 UTC), EntryStatus::Scheduled);
        let tomorrow = store.add_exercise(datetime!(2024-05-19 09:00:00 UTC), EntryStatus::Scheduled);

        let report = run_sweep(&store, SWEEP_AT).await;

        assert_eq!(report.exercises_demoted, 1);
        assert_eq!(report.failures, 0);
        assert_eq!(store.exercise_status(yesterday), EntryStatus::Incomplete);
        assert_eq!(store.exercise_status(tomorrow), EntryStatus::Scheduled);
    }

    #[tokio::test]
    async fn completed_entries_are_never_demoted_regardless_of_date() {
        let store = MemStore::default();
        let done = store.add_exercise(datetime!(2024-05-10 09:00:00 UTC), EntryStatus::Complete);
        let diet = store.add_diet(date!(2024 - 05 - 10));
        let eaten = store.add_detail(diet, EntryStatus::Complete);

        let report = run_sweep(&store, SWEEP_AT).await;

        assert_eq!(report, SweepReport::default());
        assert_eq!(store.exercise_status(done), EntryStatus::Complete);
        assert_eq!(store.detail_status(eaten), EntryStatus::Complete);
    }

    #[tokio::test]
    async fn overdue_diet_details_are_demoted() {
        let store = MemStore::default();
        let old_diet = store.add_diet(date!(2024 - 05 - 17));
        let scheduled = store.add_detail(old_diet, EntryStatus::Scheduled);
        let complete = store.add_detail(old_diet, EntryStatus::Complete);
        let today_diet = store.add_diet(date!(2024 - 05 - 18));
        let today_detail = store.add_detail(today_diet, EntryStatus::Scheduled);

        let report = run_sweep(&store, SWEEP_AT).await;

        assert_eq!(report.details_demoted, 1);
        assert_eq!(store.detail_status(scheduled), EntryStatus::Incomplete);
        assert_eq!(store.detail_status(complete), EntryStatus::Complete);
        assert_eq!(store.detail_status(today_detail), EntryStatus::Scheduled);
    }

    #[tokio::test]
    async fn second_run_with_same_now_is_a_noop() {
        let store = MemStore::default();
        store.add_exercise(datetime!(2024-05-17 09:00:00 UTC), EntryStatus::Scheduled);
        let diet = store.add_diet(date!(2024 - 05 - 16));
        store.add_detail(diet, EntryStatus::Scheduled);

        let first = run_sweep(&store, SWEEP_AT).await;
        assert_eq!(first.exercises_demoted, 1);
        assert_eq!(first.details_demoted, 1);

        let second = run_sweep(&store, SWEEP_AT).await;
        assert_eq!(second, SweepReport::default());
    }

    #[tokio::test]
    async fn row_failure_is_skipped_and_counted_not_fatal() {
        let store = MemStore::default();
        let bad = store.add_exercise(datetime!(2024-05-17 08:00:00 UTC), EntryStatus::Scheduled);
        let good = store.add_exercise(datetime!(2024-05-17 09:00:00 UTC), EntryStatus::Scheduled);
        store.poisoned.lock().unwrap().push(bad);

        let report = run_sweep(&store, SWEEP_AT).await;

        assert_eq!(report.failures, 1);
        assert_eq!(report.exercises_demoted, 1);
        assert_eq!(store.exercise_status(good), EntryStatus::Incomplete);
        assert_eq!(store.exercise_status(bad), EntryStatus::Scheduled);
    }

    #[test]
    fn next_midnight_is_start_of_following_day() {
        let at = next_midnight_utc(datetime!(2024-05-17 15:30:00 UTC));
        assert_eq!(at, datetime!(2024-05-18 00:00:00 UTC));

        // already at midnight: the next tick is a full day away
        let at = next_midnight_utc(datetime!(2024-05-17 00:00:00 UTC));
        assert_eq!(at, datetime!(2024-05-18 00:00:00 UTC));
    }

    #[test]
    fn next_midnight_handles_month_and_leap_rollover() {
        let at = next_midnight_utc(datetime!(2024-02-28 23:59:00 UTC));
        assert_eq!(at, datetime!(2024-02-29 00:00:00 UTC));
        let at = next_midnight_utc(datetime!(2023-12-31 12:00:00 UTC));
        assert_eq!(at, datetime!(2024-01-01 00:00:00 UTC));
    }
}
