use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor, SqlitePool};

use crate::{
    db,
    models::{
        ApplicationStatus, ContractType, Modality, Seniority, Vacancy, VacancyApplication, VacancyStatus,
    },
    AppResult,
};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancyFilters {
    pub q: Option<String>,
    pub modality: Option<Modality>,
    pub seniority: Option<Seniority>,
    pub contract_type: Option<ContractType>,
    pub course: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub status: Option<VacancyStatus>,
    /// Only the viewer's own vacancies, drafts included.
    #[serde(default)]
    pub mine: bool,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl VacancyFilters {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: VacancyApplication,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_curso: Option<String>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OwnApplicationRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: VacancyApplication,
    pub vacancy_title: String,
    pub vacancy_company: Option<String>,
    pub vacancy_status: VacancyStatus,
}

fn like_pattern(q: &str) -> String {
    let mut escaped = String::with_capacity(q.len() + 2);
    escaped.push('%');
    for c in q.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_owned)
}

/// Appends the WHERE conditions shared by the page query and the count query.
/// Other recruiters' drafts are excluded here so they never leave the database.
fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filters: &VacancyFilters, viewer_id: &str) {
    if filters.mine {
        qb.push(" AND v.recruiter_id = ").push_bind(viewer_id.to_owned());
    } else {
        qb.push(" AND (v.is_draft = 0 OR v.recruiter_id = ").push_bind(viewer_id.to_owned()).push(")");
    }

    if let Some(q) = non_blank(&filters.q) {
        let pattern = like_pattern(&q);
        qb.push(" AND (v.title LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'")
            .push(" OR v.description LIKE ").push_bind(pattern.clone()).push(" ESCAPE '\\'")
            .push(" OR v.company LIKE ").push_bind(pattern).push(" ESCAPE '\\')");
    }
    if let Some(modality) = filters.modality {
        qb.push(" AND v.modality = ").push_bind(modality);
    }
    if let Some(seniority) = filters.seniority {
        qb.push(" AND v.seniority = ").push_bind(seniority);
    }
    if let Some(contract_type) = filters.contract_type {
        qb.push(" AND v.contract_type = ").push_bind(contract_type);
    }
    if let Some(course) = non_blank(&filters.course) {
        qb.push(" AND v.course_key = ").push_bind(course.to_lowercase());
    }
    if let Some(state) = non_blank(&filters.state) {
        qb.push(" AND v.state = ").push_bind(state.to_ascii_uppercase());
    }
    if let Some(city) = non_blank(&filters.city) {
        qb.push(" AND v.city_key = ").push_bind(city.to_lowercase());
    }
    if let Some(status) = filters.status {
        qb.push(" AND v.status = ").push_bind(status);
    }
}

/// One page of vacancies visible to `viewer_id`, newest first, plus the total match count.
pub async fn list(db_pool: &SqlitePool, filters: &VacancyFilters, viewer_id: &str) -> sqlx::Result<(Vec<Vacancy>, i64)> {
    let mut count: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM vacancies v WHERE 1=1");
    push_filters(&mut count, filters, viewer_id);
    let total: i64 = count.build_query_scalar().fetch_one(db_pool).await?;

    let page_size = filters.page_size();
    let offset = (filters.page() - 1).saturating_mul(page_size);

    let mut items: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT v.* FROM vacancies v WHERE 1=1");
    push_filters(&mut items, filters, viewer_id);
    items
        .push(" ORDER BY v.created_at DESC, v.id DESC LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind(offset);
    let vacancies = items.build_query_as::<Vacancy>().fetch_all(db_pool).await?;

    Ok((vacancies, total))
}

pub async fn load<'e>(db: impl SqliteExecutor<'e>, vacancy_id: &str) -> sqlx::Result<Option<Vacancy>> {
    sqlx::query_as("SELECT * FROM vacancies WHERE id=?")
        .bind(vacancy_id)
        .fetch_optional(db)
        .await
}

/// Match key for the course and city filters.
fn search_key(value: &Option<String>) -> Option<String> {
    value.as_deref().map(str::to_lowercase)
}

pub async fn insert<'e>(db: impl SqliteExecutor<'e>, vacancy: &Vacancy) -> sqlx::Result<()> {
    sqlx::query(
        "INSERT INTO vacancies (id,recruiter_id,title,description,company,modality,seniority,contract_type,course,state,city,
                                course_key,city_key,salary_min,salary_max,status,is_draft,created_at,updated_at)
         VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)",
    )
        .bind(&vacancy.id)
        .bind(&vacancy.recruiter_id)
        .bind(&vacancy.title)
        .bind(&vacancy.description)
        .bind(&vacancy.company)
        .bind(vacancy.modality)
        .bind(vacancy.seniority)
        .bind(vacancy.contract_type)
        .bind(&vacancy.course)
        .bind(&vacancy.state)
        .bind(&vacancy.city)
        .bind(search_key(&vacancy.course))
        .bind(search_key(&vacancy.city))
        .bind(vacancy.salary_min)
        .bind(vacancy.salary_max)
        .bind(vacancy.status)
        .bind(vacancy.is_draft)
        .bind(&vacancy.created_at)
        .bind(&vacancy.updated_at)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn save<'e>(db: impl SqliteExecutor<'e>, vacancy: &Vacancy) -> sqlx::Result<()> {
    sqlx::query(
        "UPDATE vacancies SET title=?,description=?,company=?,modality=?,seniority=?,contract_type=?,course=?,state=?,city=?,
                              course_key=?,city_key=?,salary_min=?,salary_max=?,status=?,is_draft=?,updated_at=?
         WHERE id=?",
    )
        .bind(&vacancy.title)
        .bind(&vacancy.description)
        .bind(&vacancy.company)
        .bind(vacancy.modality)
        .bind(vacancy.seniority)
        .bind(vacancy.contract_type)
        .bind(&vacancy.course)
        .bind(&vacancy.state)
        .bind(&vacancy.city)
        .bind(search_key(&vacancy.course))
        .bind(search_key(&vacancy.city))
        .bind(vacancy.salary_min)
        .bind(vacancy.salary_max)
        .bind(vacancy.status)
        .bind(vacancy.is_draft)
        .bind(&vacancy.updated_at)
        .bind(&vacancy.id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn delete<'e>(db: impl SqliteExecutor<'e>, vacancy_id: &str) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM vacancies WHERE id=?")
        .bind(vacancy_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn application_status<'e>(db: impl SqliteExecutor<'e>, vacancy_id: &str, applicant_id: &str) -> sqlx::Result<Option<ApplicationStatus>> {
    let row: Option<(ApplicationStatus,)> = sqlx::query_as("SELECT status FROM vacancy_applications WHERE vacancy_id=? AND applicant_id=?")
        .bind(vacancy_id)
        .bind(applicant_id)
        .fetch_optional(db)
        .await?;
    Ok(row.map(|(status,)| status))
}

/// The applicant's status for each of `vacancy_ids` they applied to.
pub async fn application_statuses(
    db_pool: &SqlitePool,
    applicant_id: &str,
    vacancy_ids: &[&str],
) -> sqlx::Result<HashMap<String, ApplicationStatus>> {
    if vacancy_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT vacancy_id, status FROM vacancy_applications WHERE applicant_id = ");
    qb.push_bind(applicant_id);
    qb.push(" AND vacancy_id IN (");
    let mut separated = qb.separated(",");
    for id in vacancy_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(String, ApplicationStatus)> = qb.build_query_as().fetch_all(db_pool).await?;
    Ok(rows.into_iter().collect())
}

/// Creates the application, or resubmits a pending/rejected one. Returns `false`
/// when the existing application was already accepted and nothing changed.
pub async fn upsert_application<'e>(
    db: impl SqliteExecutor<'e>,
    vacancy_id: &str,
    applicant_id: &str,
    cover_letter: Option<&str>,
) -> AppResult<bool> {
    let now = db::now()?;
    let res = sqlx::query(
        "INSERT INTO vacancy_applications (id,vacancy_id,applicant_id,cover_letter,status,created_at,updated_at)
         VALUES (?,?,?,?,'PENDING',?,?)
         ON CONFLICT (vacancy_id,applicant_id) DO UPDATE SET
             cover_letter=excluded.cover_letter,
             status='PENDING',
             updated_at=excluded.updated_at,
             decided_at=NULL,
             decided_by=NULL
         WHERE vacancy_applications.status <> 'ACCEPTED'",
    )
        .bind(db::new_id())
        .bind(vacancy_id)
        .bind(applicant_id)
        .bind(cover_letter)
        .bind(&now)
        .bind(&now)
        .execute(db)
        .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn load_application<'e>(db: impl SqliteExecutor<'e>, vacancy_id: &str, application_id: &str) -> sqlx::Result<Option<VacancyApplication>> {
    sqlx::query_as("SELECT * FROM vacancy_applications WHERE id=? AND vacancy_id=?")
        .bind(application_id)
        .bind(vacancy_id)
        .fetch_optional(db)
        .await
}

pub async fn application_of<'e>(db: impl SqliteExecutor<'e>, vacancy_id: &str, applicant_id: &str) -> sqlx::Result<Option<VacancyApplication>> {
    sqlx::query_as("SELECT * FROM vacancy_applications WHERE vacancy_id=? AND applicant_id=?")
        .bind(vacancy_id)
        .bind(applicant_id)
        .fetch_optional(db)
        .await
}

/// Moves a pending application to `status`. Returns `false` if it was no longer pending.
pub async fn decide<'e>(db: impl SqliteExecutor<'e>, application_id: &str, status: ApplicationStatus, decided_by: &str) -> AppResult<bool> {
    let now = db::now()?;
    let res = sqlx::query(
        "UPDATE vacancy_applications SET status=?,decided_at=?,decided_by=?,updated_at=?
         WHERE id=? AND status='PENDING'",
    )
        .bind(status)
        .bind(&now)
        .bind(decided_by)
        .bind(&now)
        .bind(application_id)
        .execute(db)
        .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn list_applicants(db_pool: &SqlitePool, vacancy_id: &str) -> sqlx::Result<Vec<ApplicantRow>> {
    sqlx::query_as(
        "SELECT a.*, u.name AS applicant_name, u.email AS applicant_email, u.curso AS applicant_curso
         FROM vacancy_applications a JOIN users u ON u.id = a.applicant_id
         WHERE a.vacancy_id=?
         ORDER BY a.created_at DESC, a.id DESC",
    )
        .bind(vacancy_id)
        .fetch_all(db_pool)
        .await
}

pub async fn list_own_applications(db_pool: &SqlitePool, applicant_id: &str) -> sqlx::Result<Vec<OwnApplicationRow>> {
    sqlx::query_as(
        "SELECT a.*, v.title AS vacancy_title, v.company AS vacancy_company, v.status AS vacancy_status
         FROM vacancy_applications a JOIN vacancies v ON v.id = a.vacancy_id
         WHERE a.applicant_id=? AND v.is_draft = 0
         ORDER BY a.updated_at DESC, a.id DESC",
    )
        .bind(applicant_id)
        .fetch_all(db_pool)
        .await
}
