use std::{net::TcpListener, sync::Arc, time::Duration};

use env_logger::Env;
use serprank::{
    configuration::get_configuration,
    services::{
        GoogleFetcher, RankScheduler, RankTracker, RequestPacer, RunningGuard, TokioSleeper,
    },
    startup::run,
};
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().expect("Failed to read configuration.");

    let pool_options = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(15 * 60)) // 15 minutes
        .max_lifetime(None);
    let connection_pool = pool_options.connect_lazy_with(configuration.database.with_db());

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(address)?;

    let fetcher = GoogleFetcher::new(configuration.tracker.captcha_retries);
    let pacer = RequestPacer::new(&configuration.tracker, TokioSleeper);
    let tracker = Arc::new(RankTracker::new(
        fetcher,
        pacer,
        configuration.tracker.batch_size,
    ));
    let guard = Arc::new(RunningGuard::default());
    let scheduler = Arc::new(RankScheduler::new(
        connection_pool.clone(),
        Arc::clone(&tracker),
        Arc::clone(&guard),
    ));

    match scheduler.load_existing().await {
        Ok(count) => log::info!("Loaded {} project schedules", count),
        Err(e) => log::error!("Failed to load existing schedules: {:#}", e),
    }

    run(listener, connection_pool, tracker, guard, scheduler)?.await
}
