use axum::{debug_handler, extract::State, Extension};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    models::{ApplicationStatus, Vacancy},
    res::{AppQuery, Data},
    session::Principal,
    AppResult,
};

use super::{
    money,
    projection::{self, Viewer, ViewerState},
    repo::{self, VacancyFilters},
};

/// A vacancy as one viewer sees it.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VacancyView {
    #[serde(flatten)]
    pub vacancy: Vacancy,
    pub salary_label: String,
    pub viewer_state: ViewerState,
}

impl VacancyView {
    pub fn new(vacancy: Vacancy, viewer: Viewer<'_>, application_status: Option<ApplicationStatus>) -> Self {
        VacancyView {
            salary_label: money::salary_label(vacancy.salary_min, vacancy.salary_max),
            viewer_state: projection::project(&vacancy, Some(viewer), application_status),
            vacancy,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VacancyPage {
    items: Vec<VacancyView>,
    total: i64,
    page: i64,
    page_size: i64,
    has_more: bool,
}

#[debug_handler]
pub(crate) async fn list(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppQuery(filters): AppQuery<VacancyFilters>,
) -> AppResult<Data<VacancyPage>> {
    let (vacancies, total) = repo::list(&db_pool, &filters, &principal.id).await?;

    let ids: Vec<&str> = vacancies.iter().map(|v| v.id.as_str()).collect();
    let mut statuses = repo::application_statuses(&db_pool, &principal.id, &ids).await?;

    let viewer = Viewer::from(&principal);
    let items = vacancies
        .into_iter()
        .map(|v| {
            let status = statuses.remove(&v.id);
            VacancyView::new(v, viewer, status)
        })
        .collect();

    let page = filters.page();
    let page_size = filters.page_size();
    Ok(Data(VacancyPage {
        items,
        total,
        page,
        page_size,
        has_more: page.saturating_mul(page_size) < total,
    }))
}
