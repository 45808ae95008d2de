use axum::{debug_handler, extract::{Path, State}, Extension};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db,
    models::{ContractType, Modality, Seniority, UserType, Vacancy, VacancyStatus},
    profiles,
    res::{nullable, AppJson, Created, Data},
    session::Principal,
    validate::{self, clean},
    AppError, AppResult, FieldErrors,
};

use super::{
    listing::VacancyView,
    load_owned, load_visible,
    projection::Viewer,
    repo,
};

/// The full set of editable fields. New vacancies are checked as sent;
/// patches are merged onto the stored vacancy and the result is checked again.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VacancyBody {
    #[garde(length(min = 3, max = 120), custom(validate::not_blank))]
    title: String,
    #[garde(length(min = 1, max = 10000), custom(validate::not_blank))]
    description: String,
    #[garde(length(max = 120))]
    company: Option<String>,
    #[garde(skip)]
    modality: Modality,
    #[garde(skip)]
    seniority: Seniority,
    #[garde(skip)]
    contract_type: ContractType,
    #[garde(length(max = 120))]
    course: Option<String>,
    #[garde(custom(validate::uf))]
    state: Option<String>,
    #[garde(length(max = 80))]
    city: Option<String>,
    #[garde(range(min = 0))]
    salary_min: Option<i64>,
    #[garde(range(min = 0))]
    salary_max: Option<i64>,
    #[garde(skip)]
    status: Option<VacancyStatus>,
    #[garde(skip)]
    #[serde(default)]
    is_draft: bool,
}

impl VacancyBody {
    fn check_salary(&self) -> AppResult<()> {
        let mut errors = FieldErrors::default();
        if let (Some(min), Some(max)) = (self.salary_min, self.salary_max) {
            if min > max {
                errors.add("salaryMax", "must not be less than salaryMin");
            }
        }
        errors.into_result()
    }

    /// Trims the free text and maps blank optional fields to `None` so the
    /// length rules see what will be stored.
    fn normalize(&mut self) {
        self.title = self.title.trim().to_owned();
        self.description = self.description.trim().to_owned();
        self.company = clean(self.company.take());
        self.course = clean(self.course.take());
        self.state = clean(self.state.take());
        self.city = clean(self.city.take());
    }

    fn check(&self) -> AppResult<()> {
        self.validate()?;
        self.check_salary()
    }

    fn from_vacancy(v: &Vacancy) -> Self {
        VacancyBody {
            title: v.title.clone(),
            description: v.description.clone(),
            company: v.company.clone(),
            modality: v.modality,
            seniority: v.seniority,
            contract_type: v.contract_type,
            course: v.course.clone(),
            state: v.state.clone(),
            city: v.city.clone(),
            salary_min: v.salary_min,
            salary_max: v.salary_max,
            status: Some(v.status),
            is_draft: v.is_draft,
        }
    }

    /// Writes a normalized body into `v`.
    fn write_to(self, v: &mut Vacancy) {
        v.title = self.title;
        v.description = self.description;
        v.company = self.company;
        v.modality = self.modality;
        v.seniority = self.seniority;
        v.contract_type = self.contract_type;
        v.course = self.course;
        v.state = self.state.map(|s| s.to_ascii_uppercase());
        v.city = self.city;
        v.salary_min = self.salary_min;
        v.salary_max = self.salary_max;
        v.status = self.status.unwrap_or(VacancyStatus::Open);
        v.is_draft = self.is_draft;
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VacancyPatch {
    title: Option<String>,
    description: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    company: Option<Option<String>>,
    modality: Option<Modality>,
    seniority: Option<Seniority>,
    contract_type: Option<ContractType>,
    #[serde(default, deserialize_with = "nullable")]
    course: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    state: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    city: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    salary_min: Option<Option<i64>>,
    #[serde(default, deserialize_with = "nullable")]
    salary_max: Option<Option<i64>>,
    status: Option<VacancyStatus>,
    is_draft: Option<bool>,
}

impl VacancyPatch {
    fn merge(self, mut body: VacancyBody) -> VacancyBody {
        fn text(target: &mut Option<String>, value: Option<Option<String>>) {
            if let Some(value) = value {
                *target = clean(value);
            }
        }

        if let Some(title) = self.title {
            body.title = title;
        }
        if let Some(description) = self.description {
            body.description = description;
        }
        text(&mut body.company, self.company);
        text(&mut body.course, self.course);
        text(&mut body.state, self.state);
        text(&mut body.city, self.city);
        if let Some(modality) = self.modality {
            body.modality = modality;
        }
        if let Some(seniority) = self.seniority {
            body.seniority = seniority;
        }
        if let Some(contract_type) = self.contract_type {
            body.contract_type = contract_type;
        }
        if let Some(salary_min) = self.salary_min {
            body.salary_min = salary_min;
        }
        if let Some(salary_max) = self.salary_max {
            body.salary_max = salary_max;
        }
        if let Some(status) = self.status {
            body.status = Some(status);
        }
        if let Some(is_draft) = self.is_draft {
            body.is_draft = is_draft;
        }
        body
    }
}

#[derive(Serialize)]
pub(crate) struct Deleted {
    id: String,
}

#[debug_handler]
pub(crate) async fn create(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(mut body): AppJson<VacancyBody>,
) -> AppResult<Created<VacancyView>> {
    if !principal.is(UserType::Recrutador) {
        return Err(AppError::forbidden("only recruiters post vacancies"));
    }
    body.normalize();
    body.check()?;

    if body.company.is_none() {
        body.company = profiles::repo::load_user(&db_pool, &principal.id)
            .await?
            .and_then(|u| u.company);
    }

    let now = db::now()?;
    let mut vacancy = Vacancy {
        id: db::new_id(),
        recruiter_id: principal.id.clone(),
        title: String::new(),
        description: String::new(),
        company: None,
        modality: body.modality,
        seniority: body.seniority,
        contract_type: body.contract_type,
        course: None,
        state: None,
        city: None,
        salary_min: None,
        salary_max: None,
        status: VacancyStatus::Open,
        is_draft: false,
        created_at: now.clone(),
        updated_at: now,
    };
    body.write_to(&mut vacancy);

    repo::insert(&db_pool, &vacancy).await?;
    tracing::info!(vacancy_id = %vacancy.id, by = %principal.id, draft = vacancy.is_draft, "vacancy created");

    Ok(Created(VacancyView::new(vacancy, Viewer::from(&principal), None)))
}

#[debug_handler]
pub(crate) async fn detail(
    Path(vacancy_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<VacancyView>> {
    let vacancy = load_visible(&db_pool, &vacancy_id, &principal).await?;
    let status = repo::application_status(&db_pool, &vacancy.id, &principal.id).await?;
    Ok(Data(VacancyView::new(vacancy, Viewer::from(&principal), status)))
}

#[debug_handler]
pub(crate) async fn update(
    Path(vacancy_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(patch): AppJson<VacancyPatch>,
) -> AppResult<Data<VacancyView>> {
    let mut vacancy = load_owned(&db_pool, &vacancy_id, &principal).await?;

    let mut merged = patch.merge(VacancyBody::from_vacancy(&vacancy));
    merged.normalize();
    merged.check()?;
    merged.write_to(&mut vacancy);
    vacancy.updated_at = db::now()?;

    repo::save(&db_pool, &vacancy).await?;
    tracing::info!(%vacancy_id, by = %principal.id, "vacancy updated");

    Ok(Data(VacancyView::new(vacancy, Viewer::from(&principal), None)))
}

#[debug_handler]
pub(crate) async fn remove(
    Path(vacancy_id): Path<String>,
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Deleted>> {
    let vacancy = load_owned(&db_pool, &vacancy_id, &principal).await?;
    repo::delete(&db_pool, &vacancy.id).await?;

    tracing::info!(%vacancy_id, by = %principal.id, "vacancy deleted");
    Ok(Data(Deleted { id: vacancy.id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> VacancyBody {
        serde_json::from_value(serde_json::json!({
            "title": "Estágio em Backend",
            "description": "APIs em Rust",
            "modality": "REMOTO",
            "seniority": "ESTAGIO",
            "contractType": "ESTAGIO",
            "salaryMin": 150000,
            "salaryMax": 200000
        }))
        .unwrap()
    }

    #[test]
    fn salary_range_must_be_ordered() {
        assert!(body().check().is_ok());

        let mut inverted = body();
        inverted.salary_min = Some(300_000);
        assert!(matches!(inverted.check(), Err(AppError::Validation(_))));

        let mut negative = body();
        negative.salary_max = Some(-1);
        assert!(matches!(negative.check(), Err(AppError::Validation(_))));
    }

    #[test]
    fn patch_distinguishes_null_from_absent() {
        let patch: VacancyPatch = serde_json::from_value(serde_json::json!({ "salaryMax": null })).unwrap();
        let merged = patch.merge(body());
        assert_eq!(merged.salary_min, Some(150_000));
        assert_eq!(merged.salary_max, None);
    }

    #[test]
    fn merged_patch_is_validated_as_a_whole() {
        let patch: VacancyPatch = serde_json::from_value(serde_json::json!({ "salaryMin": 250000 })).unwrap();
        assert!(patch.merge(body()).check().is_err());

        let patch: VacancyPatch = serde_json::from_value(serde_json::json!({ "title": "  " })).unwrap();
        let mut merged = patch.merge(body());
        merged.normalize();
        assert!(merged.check().is_err());
    }

    #[test]
    fn lengths_are_checked_after_trimming() {
        let mut padded = body();
        padded.title = "  ab  ".to_owned();
        padded.normalize();
        assert_eq!(padded.title, "ab");
        assert!(matches!(padded.check(), Err(AppError::Validation(_))));

        let mut blank_state = body();
        blank_state.state = Some(" ".to_owned());
        blank_state.normalize();
        assert_eq!(blank_state.state, None);
        assert!(blank_state.check().is_ok());
    }
}
