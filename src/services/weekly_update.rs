use crate::{
    config::WeeklyUpdateConfig,
    errors::ServiceError,
    services::{
        inventory_fetch::InventoryFetchService, room_types::RoomTypeService,
        snapshots::SnapshotService, weekly_statistics::WeeklyStatisticsService,
    },
    tracing::with_metrics,
};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, Utc};
use dashmap::DashMap;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info, warn, Instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Outcome of one weekly update run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeeklyUpdateReport {
    pub run_date: NaiveDate,
    pub hotel_id: Option<String>,
    pub pre_update_snapshot_id: Option<i32>,
    pub snapshot_error: Option<String>,
    pub fetch_start: NaiveDate,
    pub fetch_end: NaiveDate,
    pub fetch_succeeded: usize,
    pub fetch_failed: usize,
    pub room_types_with_data: usize,
    pub weeks_processed: usize,
    pub statistics_calculated: usize,
    pub statistics_failed: usize,
}

/// Monday of the week containing `date`
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Week starts from `weeks_back` weeks before to `weeks_ahead` weeks after the current Monday
pub fn week_window(today: NaiveDate, weeks_back: i64, weeks_ahead: i64) -> Vec<NaiveDate> {
    let monday = week_monday(today);
    (-weeks_back..=weeks_ahead)
        .map(|offset| monday + Duration::weeks(offset))
        .collect()
}

/// Runs snapshot, fetch and recompute in sequence
pub struct WeeklyUpdateOrchestrator {
    snapshots: Arc<SnapshotService>,
    fetcher: Arc<InventoryFetchService>,
    room_types: Arc<RoomTypeService>,
    statistics: Arc<WeeklyStatisticsService>,
    window: WeeklyUpdateConfig,
}

impl WeeklyUpdateOrchestrator {
    pub fn new(
        snapshots: Arc<SnapshotService>,
        fetcher: Arc<InventoryFetchService>,
        room_types: Arc<RoomTypeService>,
        statistics: Arc<WeeklyStatisticsService>,
        window: WeeklyUpdateConfig,
    ) -> Self {
        Self {
            snapshots,
            fetcher,
            room_types,
            statistics,
            window,
        }
    }

    /// Runs the whole update for `today`.
    ///
    /// Only failing to list room types aborts the run; every other failure is
    /// logged and counted in the report.
    pub async fn run(
        &self,
        today: NaiveDate,
        hotel_id: Option<&str>,
    ) -> Result<WeeklyUpdateReport, ServiceError> {
        with_metrics("weekly_update", || self.run_inner(today, hotel_id)).await
    }

    async fn run_inner(
        &self,
        today: NaiveDate,
        hotel_id: Option<&str>,
    ) -> Result<WeeklyUpdateReport, ServiceError> {
        info!(%today, hotel_id, "Weekly update started");

        let (pre_update_snapshot_id, snapshot_error) = match self
            .snapshots
            .create_snapshot_for_date(today, Some(format!("Pre-update snapshot - {}", today)))
            .await
        {
            Ok(created) => (Some(created.snapshot_id), None),
            Err(e) => {
                warn!(error = %e, "Pre-update snapshot failed, continuing");
                (None, Some(e.to_string()))
            }
        };

        let fetch_start = today;
        let fetch_end = today + Duration::days(self.window.fetch_horizon_days);
        let outcomes = self.fetcher.fetch_all(fetch_start, fetch_end, hotel_id).await?;
        let fetch_succeeded = outcomes.iter().filter(|o| o.success).count();
        let fetch_failed = outcomes.len() - fetch_succeeded;

        let room_types = self.room_types.list_with_inventory(hotel_id).await?;
        let weeks = week_window(today, self.window.weeks_back, self.window.weeks_ahead);

        let mut statistics_calculated = 0;
        let mut statistics_failed = 0;
        for week_start in &weeks {
            for (inv_type_code, room_hotel_id) in &room_types {
                match self
                    .statistics
                    .calculate(inv_type_code, room_hotel_id, *week_start)
                    .await
                {
                    Ok(_) => statistics_calculated += 1,
                    Err(e) => {
                        statistics_failed += 1;
                        counter!("hotel_inventory.weekly_update.statistics_failed", 1);
                        warn!(
                            inv_type_code = %inv_type_code,
                            hotel_id = %room_hotel_id,
                            %week_start,
                            error = %e,
                            "Weekly statistics calculation failed"
                        );
                    }
                }
            }
        }

        let report = WeeklyUpdateReport {
            run_date: today,
            hotel_id: hotel_id.map(str::to_string),
            pre_update_snapshot_id,
            snapshot_error,
            fetch_start,
            fetch_end,
            fetch_succeeded,
            fetch_failed,
            room_types_with_data: room_types.len(),
            weeks_processed: weeks.len(),
            statistics_calculated,
            statistics_failed,
        };

        info!(
            fetch_succeeded,
            fetch_failed,
            statistics_calculated,
            statistics_failed,
            "Weekly update finished"
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    Queued,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct JobStatus {
    pub job_id: Uuid,
    pub hotel_id: Option<String>,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub report: Option<WeeklyUpdateReport>,
    pub error: Option<String>,
}

impl JobStatus {
    fn queued(job_id: Uuid, hotel_id: Option<String>) -> Self {
        Self {
            job_id,
            hotel_id,
            state: JobState::Queued,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
            report: None,
            error: None,
        }
    }
}

/// Finished jobs kept for status queries; older ones are pruned
pub const RETAINED_FINISHED_JOBS: usize = 50;

type JobHandles = Arc<Mutex<HashMap<Uuid, JoinHandle<()>>>>;

/// Registry of background weekly update runs
pub struct WeeklyUpdateJobs {
    orchestrator: Arc<WeeklyUpdateOrchestrator>,
    jobs: Arc<DashMap<Uuid, JobStatus>>,
    handles: JobHandles,
    retain_finished: usize,
}

impl WeeklyUpdateJobs {
    pub fn new(orchestrator: Arc<WeeklyUpdateOrchestrator>) -> Self {
        Self::with_retention(orchestrator, RETAINED_FINISHED_JOBS)
    }

    pub fn with_retention(orchestrator: Arc<WeeklyUpdateOrchestrator>, retain_finished: usize) -> Self {
        Self {
            orchestrator,
            jobs: Arc::new(DashMap::new()),
            handles: Arc::new(Mutex::new(HashMap::new())),
            retain_finished,
        }
    }

    /// Queues a run and returns immediately with its status
    pub async fn submit(&self, hotel_id: Option<String>) -> JobStatus {
        let job_id = Uuid::new_v4();
        let status = JobStatus::queued(job_id, hotel_id.clone());
        self.jobs.insert(job_id, status.clone());

        let jobs = Arc::clone(&self.jobs);
        let handles = Arc::clone(&self.handles);
        let orchestrator = Arc::clone(&self.orchestrator);
        let retain_finished = self.retain_finished;
        let span = tracing::info_span!("weekly_update_job", %job_id);

        // Held across the spawn so the task cannot deregister before it is registered
        let mut registered = self.handles.lock().await;
        let handle = tokio::spawn(
            async move {
                if let Some(mut job) = jobs.get_mut(&job_id) {
                    job.state = JobState::Running;
                    job.started_at = Some(Utc::now());
                }

                let today = Local::now().date_naive();
                let result = orchestrator.run(today, hotel_id.as_deref()).await;

                if let Some(mut job) = jobs.get_mut(&job_id) {
                    job.finished_at = Some(Utc::now());
                    match result {
                        Ok(report) => {
                            job.state = JobState::Completed;
                            job.report = Some(report);
                        }
                        Err(e) => {
                            error!(error = %e, "Weekly update job failed");
                            job.state = JobState::Failed;
                            job.error = Some(e.to_string());
                        }
                    }
                }

                prune_finished(&jobs, retain_finished);
                handles.lock().await.remove(&job_id);
            }
            .instrument(span),
        );
        registered.insert(job_id, handle);
        drop(registered);

        info!(%job_id, "Weekly update job submitted");
        status
    }

    pub fn status(&self, job_id: Uuid) -> Option<JobStatus> {
        self.jobs.get(&job_id).map(|job| job.clone())
    }

    /// All known jobs, newest first
    pub fn list(&self) -> Vec<JobStatus> {
        let mut jobs: Vec<JobStatus> = self.jobs.iter().map(|job| job.value().clone()).collect();
        jobs.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        jobs
    }

    /// Number of job tasks that have not finished yet
    pub async fn in_flight(&self) -> usize {
        self.handles.lock().await.len()
    }

    /// Waits for a job's task to finish and returns its final status
    pub async fn wait(&self, job_id: Uuid) -> Option<JobStatus> {
        let handle = self.handles.lock().await.remove(&job_id);
        if let Some(handle) = handle {
            self.join(job_id, handle).await;
        }
        self.status(job_id)
    }

    /// Waits for every running job; called on shutdown before the pool closes
    pub async fn drain(&self) -> usize {
        let pending: Vec<(Uuid, JoinHandle<()>)> = self.handles.lock().await.drain().collect();
        let count = pending.len();
        if count > 0 {
            info!(jobs = count, "Waiting for weekly update jobs to finish");
        }
        for (job_id, handle) in pending {
            self.join(job_id, handle).await;
        }
        count
    }

    async fn join(&self, job_id: Uuid, handle: JoinHandle<()>) {
        if let Err(e) = handle.await {
            error!(%job_id, error = %e, "Weekly update job task panicked");
            if let Some(mut job) = self.jobs.get_mut(&job_id) {
                job.state = JobState::Failed;
                job.error = Some(e.to_string());
                job.finished_at = Some(Utc::now());
            }
        }
    }
}

/// Drops the oldest finished jobs beyond `keep`
fn prune_finished(jobs: &DashMap<Uuid, JobStatus>, keep: usize) {
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .iter()
        .filter(|job| matches!(job.state, JobState::Completed | JobState::Failed))
        .map(|job| (job.submitted_at, job.job_id))
        .collect();
    if finished.len() <= keep {
        return;
    }
    finished.sort_by(|a, b| b.0.cmp(&a.0));
    for (_, job_id) in finished.into_iter().skip(keep) {
        jobs.remove(&job_id);
    }
}
