use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

use crate::{
    dal::{
        keyword_db,
        project_db::{self, NewProject},
        result_db,
    },
    domain::{localization::LocalizationConfig, tracking::TrackingConfig},
    services::{check_project, GoogleRankTracker, RankScheduler, RunningGuard},
};

#[derive(Deserialize)]
struct CreateProjectBody {
    name: String,
    domain: String,
    keywords: Vec<String>,
    #[serde(default = "default_schedule_hours")]
    schedule_hours: i32,
    #[serde(default = "default_country_code")]
    country_code: String,
    #[serde(default = "default_language_code")]
    language_code: String,
    #[serde(default)]
    city_code: Option<String>,
    #[serde(default = "default_true")]
    content_restriction: bool,
    #[serde(default = "default_tracking_mode")]
    tracking_mode: String,
    #[serde(default)]
    track_ads: bool,
    #[serde(default)]
    track_snippets: bool,
    #[serde(default)]
    track_local: bool,
    #[serde(default)]
    track_shopping: bool,
}

fn default_schedule_hours() -> i32 {
    24
}

fn default_country_code() -> String {
    "IT".to_string()
}

fn default_language_code() -> String {
    "it".to_string()
}

fn default_true() -> bool {
    true
}

fn default_tracking_mode() -> String {
    "ORGANIC_ONLY".to_string()
}

#[post("")]
async fn create_project(
    pool: web::Data<PgPool>,
    scheduler: web::Data<RankScheduler>,
    body: web::Json<CreateProjectBody>,
) -> HttpResponse {
    let body = body.into_inner();

    let keywords: Vec<String> = body
        .keywords
        .iter()
        .map(|keyword| keyword.trim().to_string())
        .filter(|keyword| !keyword.is_empty())
        .collect();
    if keywords.is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "no keywords supplied" }));
    }

    let new_project = NewProject {
        name: body.name,
        domain: body.domain,
        schedule_hours: body.schedule_hours.max(1),
        localization: LocalizationConfig {
            country_code: body.country_code,
            language_code: body.language_code,
            city_code: body.city_code,
            content_restriction: body.content_restriction,
        },
        tracking: TrackingConfig::from_row(
            &body.tracking_mode,
            body.track_ads,
            body.track_snippets,
            body.track_local,
            body.track_shopping,
        ),
    };

    let project_id = match project_db::insert_project(pool.get_ref(), &new_project).await {
        Ok(project_id) => project_id,
        Err(e) => {
            log::error!("Error inserting project: {:?}", e);
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "failed to create project" }));
        }
    };

    if let Err(e) = keyword_db::insert_keywords(pool.get_ref(), project_id, &keywords).await {
        log::error!("Error inserting keywords for project {}: {:?}", project_id, e);
        return HttpResponse::InternalServerError()
            .json(json!({ "error": "failed to store keywords" }));
    }

    scheduler.schedule_project(project_id, new_project.schedule_hours as u32);

    HttpResponse::Ok().json(json!({ "status": "success", "project_id": project_id }))
}

#[get("/{project_id}")]
async fn project_detail(path: web::Path<i32>, pool: web::Data<PgPool>) -> HttpResponse {
    let project_id = path.into_inner();

    let project = match project_db::get_project(pool.get_ref(), project_id).await {
        Ok(Some(project)) => project,
        Ok(None) => {
            return HttpResponse::NotFound().json(json!({ "error": "project not found" }))
        }
        Err(e) => {
            log::error!("Error loading project {}: {:?}", project_id, e);
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "failed to load project" }));
        }
    };

    match keyword_db::get_keywords(pool.get_ref(), project_id).await {
        Ok(keywords) => {
            HttpResponse::Ok().json(json!({ "project": project, "keywords": keywords }))
        }
        Err(e) => {
            log::error!("Error loading keywords for project {}: {:?}", project_id, e);
            HttpResponse::InternalServerError().json(json!({ "error": "failed to load keywords" }))
        }
    }
}

#[post("/{project_id}/check")]
async fn run_check(
    path: web::Path<i32>,
    pool: web::Data<PgPool>,
    tracker: web::Data<GoogleRankTracker>,
    guard: web::Data<RunningGuard>,
) -> HttpResponse {
    let project_id = path.into_inner();

    tokio::spawn(check_project(
        project_id,
        pool.get_ref().clone(),
        tracker.into_inner(),
        guard.into_inner(),
    ));

    HttpResponse::Ok().json(json!({ "status": "started" }))
}

#[derive(Deserialize)]
struct HistoryQuery {
    #[serde(default = "default_days")]
    days: i32,
}

fn default_days() -> i32 {
    30
}

#[get("/{project_id}/results")]
async fn ranking_history(
    path: web::Path<i32>,
    query: web::Query<HistoryQuery>,
    pool: web::Data<PgPool>,
) -> HttpResponse {
    let project_id = path.into_inner();

    match result_db::get_ranking_history(pool.get_ref(), project_id, query.days).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => {
            log::error!("Error loading results for project {}: {:?}", project_id, e);
            HttpResponse::InternalServerError().json(json!({ "error": "failed to load results" }))
        }
    }
}

#[get("/{project_id}/serp")]
async fn latest_serp_features(path: web::Path<i32>, pool: web::Data<PgPool>) -> HttpResponse {
    let project_id = path.into_inner();

    match result_db::get_latest_serp_features(pool.get_ref(), project_id).await {
        Ok(rows) => HttpResponse::Ok().json(rows),
        Err(e) => {
            log::error!(
                "Error loading serp features for project {}: {:?}",
                project_id,
                e
            );
            HttpResponse::InternalServerError()
                .json(json!({ "error": "failed to load serp features" }))
        }
    }
}
