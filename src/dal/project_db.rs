use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::domain::{localization::LocalizationConfig, tracking::TrackingConfig};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i32,
    pub name: String,
    pub domain: String,
    pub schedule_hours: i32,
    pub country_code: String,
    pub language_code: String,
    pub city_code: Option<String>,
    pub content_restriction: bool,
    pub tracking_mode: String,
    pub track_ads: bool,
    pub track_snippets: bool,
    pub track_local: bool,
    pub track_shopping: bool,
    pub created_at: DateTime<Utc>,
    pub last_check: Option<DateTime<Utc>>,
    pub active: bool,
}

impl ProjectRow {
    pub fn localization_config(&self) -> LocalizationConfig {
        LocalizationConfig {
            country_code: self.country_code.clone(),
            language_code: self.language_code.clone(),
            city_code: self.city_code.clone(),
            content_restriction: self.content_restriction,
        }
    }

    pub fn tracking_config(&self) -> TrackingConfig {
        TrackingConfig::from_row(
            &self.tracking_mode,
            self.track_ads,
            self.track_snippets,
            self.track_local,
            self.track_shopping,
        )
    }
}

pub struct NewProject {
    pub name: String,
    pub domain: String,
    pub schedule_hours: i32,
    pub localization: LocalizationConfig,
    pub tracking: TrackingConfig,
}

pub async fn insert_project(pool: &PgPool, project: &NewProject) -> Result<i32, sqlx::Error> {
    let (track_ads, track_snippets, track_local, track_shopping) =
        project.tracking.flag_columns();

    sqlx::query_scalar::<_, i32>(
        r"
        insert into projects
            (name, domain, schedule_hours, country_code, language_code, city_code,
             content_restriction, tracking_mode, track_ads, track_snippets, track_local,
             track_shopping)
        values
            ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        returning id
        ",
    )
    .bind(&project.name)
    .bind(&project.domain)
    .bind(project.schedule_hours)
    .bind(&project.localization.country_code)
    .bind(&project.localization.language_code)
    .bind(&project.localization.city_code)
    .bind(project.localization.content_restriction)
    .bind(project.tracking.mode_str())
    .bind(track_ads)
    .bind(track_snippets)
    .bind(track_local)
    .bind(track_shopping)
    .fetch_one(pool)
    .await
}

pub async fn get_project(pool: &PgPool, project_id: i32) -> Result<Option<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        r"
        select
            id, name, domain, schedule_hours, country_code, language_code, city_code,
            content_restriction, tracking_mode, track_ads, track_snippets, track_local,
            track_shopping, created_at, last_check, active
        from
            projects
        where
            id = $1
        ",
    )
    .bind(project_id)
    .fetch_optional(pool)
    .await
}

pub async fn get_active_projects(pool: &PgPool) -> Result<Vec<ProjectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProjectRow>(
        r"
        select
            id, name, domain, schedule_hours, country_code, language_code, city_code,
            content_restriction, tracking_mode, track_ads, track_snippets, track_local,
            track_shopping, created_at, last_check, active
        from
            projects
        where
            active
        order by
            id
        ",
    )
    .fetch_all(pool)
    .await
}

pub async fn update_last_check(pool: &PgPool, project_id: i32) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        update projects set
            last_check = now()
        where
            id = $1
        ",
    )
    .bind(project_id)
    .execute(pool)
    .await?;

    Ok(())
}
