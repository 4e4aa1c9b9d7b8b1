use std::net::TcpListener;
use std::sync::Arc;

use actix_web::{
    dev::Server,
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};
use sqlx::PgPool;

use crate::{
    routes::{default_route, project_route},
    services::{GoogleRankTracker, RankScheduler, RunningGuard},
};

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    tracker: Arc<GoogleRankTracker>,
    guard: Arc<RunningGuard>,
    scheduler: Arc<RankScheduler>,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let tracker: Data<GoogleRankTracker> = Data::from(tracker);
    let guard: Data<RunningGuard> = Data::from(guard);
    let scheduler: Data<RankScheduler> = Data::from(scheduler);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::health)
            .service(
                web::scope("/project")
                    .service(project_route::create_project)
                    .service(project_route::run_check)
                    .service(project_route::ranking_history)
                    .service(project_route::latest_serp_features)
                    .service(project_route::project_detail),
            )
            .app_data(db_pool.clone())
            .app_data(tracker.clone())
            .app_data(guard.clone())
            .app_data(scheduler.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
