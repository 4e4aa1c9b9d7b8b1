use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::Context;
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::{
    dal::{keyword_db, project_db, result_db},
    services::{
        google_fetcher::GoogleFetcher,
        pacer::TokioSleeper,
        rank_tracker::{KeywordOutcome, RankTracker},
    },
};

/// The production tracker wiring: real Google fetch, real clock.
pub type GoogleRankTracker = RankTracker<GoogleFetcher, TokioSleeper>;

/// Membership set of projects with a check currently in flight. The only
/// shared mutable state in the tracking core: runs for different projects
/// proceed in parallel, runs for the same project are serialized here.
#[derive(Default)]
pub struct RunningGuard {
    running: Mutex<HashSet<i32>>,
}

impl RunningGuard {
    /// Claims the project for a run. Returns `None` while another run for
    /// the same project holds the claim; the token releases it on drop,
    /// whether the run succeeds, errors, panics or is cancelled.
    pub fn try_acquire(self: &Arc<Self>, project_id: i32) -> Option<RunningToken> {
        let mut running = self.lock_running();
        match running.insert(project_id) {
            true => Some(RunningToken {
                guard: Arc::clone(self),
                project_id,
            }),
            false => None,
        }
    }

    pub fn is_running(&self, project_id: i32) -> bool {
        self.lock_running().contains(&project_id)
    }

    fn lock_running(&self) -> MutexGuard<'_, HashSet<i32>> {
        // A panicked run must not wedge the guard for its project forever.
        match self.running.lock() {
            Ok(running) => running,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub struct RunningToken {
    guard: Arc<RunningGuard>,
    project_id: i32,
}

impl Drop for RunningToken {
    fn drop(&mut self) {
        self.guard.lock_running().remove(&self.project_id);
    }
}

/// Single entry point for both scheduled and manual triggers.
///
/// Overlapping triggers for the same project are skipped outright; anything
/// that goes wrong past the guard is logged and contained here.
pub async fn check_project(
    project_id: i32,
    pool: PgPool,
    tracker: Arc<GoogleRankTracker>,
    guard: Arc<RunningGuard>,
) {
    let Some(_token) = guard.try_acquire(project_id) else {
        log::info!("Project {} check already running, skipping trigger", project_id);
        return;
    };

    if let Err(e) = run_project_check(project_id, &pool, &tracker).await {
        log::error!("Check for project {} failed: {:#}", project_id, e);
    }
    // _token drops here and frees the project for the next trigger
}

async fn run_project_check(
    project_id: i32,
    pool: &PgPool,
    tracker: &GoogleRankTracker,
) -> anyhow::Result<()> {
    let project = project_db::get_project(pool, project_id)
        .await
        .context("failed to load project")?
        .with_context(|| format!("project {} not found", project_id))?;

    if !project.active {
        log::info!("Project {} is inactive, skipping check", project_id);
        return Ok(());
    }

    let keywords = keyword_db::get_keywords(pool, project_id)
        .await
        .context("failed to load keywords")?;
    if keywords.is_empty() {
        log::info!("No keywords found for project {}", project_id);
        return Ok(());
    }

    let localization = project.localization_config();
    let tracking = project.tracking_config();

    let results = tracker
        .check_rankings(&project.domain, &keywords, &localization, tracking)
        .await;

    save_check_results(pool, project_id, &results)
        .await
        .context("failed to persist check results")?;
    project_db::update_last_check(pool, project_id)
        .await
        .context("failed to update last_check")?;

    let (found_count, average_position) = summarize(&results);
    log::info!(
        "Check completed for project {}: {}/{} keywords found, average position {:.1}",
        project_id,
        found_count,
        keywords.len(),
        average_position
    );

    Ok(())
}

/// Stores the organic position history row plus every retained SERP feature
/// for each keyword that produced an analysis. Failed keywords are skipped;
/// their error already went to the log.
async fn save_check_results(
    pool: &PgPool,
    project_id: i32,
    results: &HashMap<String, KeywordOutcome>,
) -> Result<(), sqlx::Error> {
    for (keyword, outcome) in results {
        let Some(analysis) = outcome.analysis() else {
            continue;
        };

        let organic_position = analysis.organic_position().map(|p| p as i32);
        result_db::insert_ranking_result(pool, project_id, keyword, organic_position).await?;

        for list in analysis.results.values() {
            result_db::insert_serp_features(pool, project_id, keyword, list).await?;
        }
    }

    Ok(())
}

fn summarize(results: &HashMap<String, KeywordOutcome>) -> (usize, f64) {
    let positions: Vec<u32> = results
        .values()
        .filter_map(|outcome| outcome.analysis())
        .filter_map(|analysis| analysis.organic_position())
        .collect();

    let found_count = positions.len();
    let total: u32 = positions.iter().sum();
    let average = f64::from(total) / found_count.max(1) as f64;

    (found_count, average)
}

/// Re-checks every active project on its own interval. Each tick goes
/// through [`check_project`], so a slow run makes the next tick a no-op
/// instead of a second concurrent run.
pub struct RankScheduler {
    jobs: Mutex<HashMap<i32, JoinHandle<()>>>,
    pool: PgPool,
    tracker: Arc<GoogleRankTracker>,
    guard: Arc<RunningGuard>,
}

impl RankScheduler {
    pub fn new(pool: PgPool, tracker: Arc<GoogleRankTracker>, guard: Arc<RunningGuard>) -> Self {
        RankScheduler {
            jobs: Mutex::new(HashMap::new()),
            pool,
            tracker,
            guard,
        }
    }

    /// Schedules a project every `hours` hours, replacing any existing job.
    pub fn schedule_project(&self, project_id: i32, hours: u32) {
        let period = Duration::from_secs(u64::from(hours.max(1)) * 3600);
        let pool = self.pool.clone();
        let tracker = Arc::clone(&self.tracker);
        let guard = Arc::clone(&self.guard);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the check should not.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                check_project(project_id, pool.clone(), Arc::clone(&tracker), Arc::clone(&guard))
                    .await;
            }
        });

        let mut jobs = self.lock_jobs();
        if let Some(previous) = jobs.insert(project_id, handle) {
            previous.abort();
        }
        log::info!("Project {} scheduled every {} hours", project_id, hours);
    }

    pub fn remove_project(&self, project_id: i32) {
        if let Some(handle) = self.lock_jobs().remove(&project_id) {
            handle.abort();
            log::info!("Schedule removed for project {}", project_id);
        }
    }

    /// Schedules every active project found in storage. Called once at
    /// startup.
    pub async fn load_existing(&self) -> anyhow::Result<usize> {
        let projects = project_db::get_active_projects(&self.pool)
            .await
            .context("failed to load active projects")?;
        let count = projects.len();

        for project in projects {
            self.schedule_project(project.id, project.schedule_hours.max(1) as u32);
        }

        Ok(count)
    }

    fn lock_jobs(&self) -> MutexGuard<'_, HashMap<i32, JoinHandle<()>>> {
        match self.jobs.lock() {
            Ok(jobs) => jobs,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for RankScheduler {
    fn drop(&mut self) {
        for handle in self.lock_jobs().values() {
            handle.abort();
        }
    }
}
