use axum::{debug_handler, extract::State, Extension};
use garde::Validate;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::{
    models::{User, UserType},
    res::{AppJson, Data},
    session::Principal,
    validate::{self, clean, digits, parse_date},
    AppError, AppResult, FieldErrors,
};

use super::repo::{self, NewExperience, Profile};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ExperienceInput {
    #[garde(length(max = 120), custom(validate::not_blank))]
    title: String,
    #[garde(length(max = 120), custom(validate::not_blank))]
    organization: String,
    #[garde(custom(validate::date))]
    start_date: String,
    #[garde(custom(validate::optional_date))]
    end_date: Option<String>,
    #[garde(length(max = 2000))]
    description: Option<String>,
}

/// Absent fields are left alone; blank strings clear optional fields.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfilePatch {
    #[garde(length(min = 2, max = 100), custom(validate::optional_person_name))]
    name: Option<String>,
    #[garde(custom(validate::phone))]
    phone: Option<String>,
    #[garde(length(max = 2000))]
    bio: Option<String>,
    #[garde(custom(validate::cep))]
    cep: Option<String>,
    #[garde(custom(validate::uf))]
    state: Option<String>,
    #[garde(length(max = 80))]
    city: Option<String>,
    #[garde(length(max = 120))]
    curso: Option<String>,
    #[garde(length(max = 120))]
    university: Option<String>,
    #[garde(custom(validate::cpf))]
    cpf: Option<String>,
    #[garde(custom(validate::cnpj))]
    cnpj: Option<String>,
    #[garde(length(max = 120))]
    company: Option<String>,
    #[garde(length(max = 30), dive)]
    experiences: Option<Vec<ExperienceInput>>,
}

/// A blank string means "clear this field" and skips the format rules.
fn blank_to_none(value: &mut Option<String>) -> bool {
    if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
        *value = None;
        true
    } else {
        false
    }
}

impl ProfilePatch {
    fn check_allowed(&self, user_type: UserType) -> AppResult<()> {
        let mut errors = FieldErrors::default();
        let mut forbid = |field: &str, present: bool| {
            if present {
                errors.add(field, "not editable for this user type");
            }
        };

        match user_type {
            UserType::Aluno => {
                forbid("cnpj", self.cnpj.is_some());
                forbid("company", self.company.is_some());
            }
            UserType::Recrutador => {
                forbid("cpf", self.cpf.is_some());
                forbid("curso", self.curso.is_some());
                forbid("university", self.university.is_some());
            }
            UserType::Gestor => {
                forbid("cpf", self.cpf.is_some());
                forbid("curso", self.curso.is_some());
                forbid("cnpj", self.cnpj.is_some());
                forbid("company", self.company.is_some());
            }
        }

        if let Some(experiences) = &self.experiences {
            for (i, e) in experiences.iter().enumerate() {
                let start = parse_date(&e.start_date);
                let end = e.end_date.as_deref().and_then(parse_date);
                if let (Some(start), Some(end)) = (start, end) {
                    if end < start {
                        errors.add(format!("experiences[{i}].endDate"), "must not be before startDate");
                    }
                }
            }
        }

        errors.into_result()
    }

    fn apply(self, user: &mut User, cleared: &[&str]) -> Option<Vec<NewExperience>> {
        fn set(target: &mut Option<String>, value: Option<String>, field: &str, cleared: &[&str]) {
            if cleared.contains(&field) {
                *target = None;
            } else if let Some(value) = clean(value) {
                *target = Some(value);
            }
        }

        if let Some(name) = clean(self.name) {
            user.name = name;
        }
        set(&mut user.phone, self.phone.map(|v| digits(&v)), "phone", cleared);
        set(&mut user.bio, self.bio, "bio", cleared);
        set(&mut user.cep, self.cep.map(|v| digits(&v)), "cep", cleared);
        set(&mut user.state, self.state.map(|v| v.to_ascii_uppercase()), "state", cleared);
        set(&mut user.city, self.city, "city", cleared);
        set(&mut user.curso, self.curso, "curso", cleared);
        set(&mut user.university, self.university, "university", cleared);
        set(&mut user.cpf, self.cpf.map(|v| digits(&v)), "cpf", cleared);
        set(&mut user.cnpj, self.cnpj.map(|v| digits(&v)), "cnpj", cleared);
        set(&mut user.company, self.company, "company", cleared);

        self.experiences.map(|experiences| {
            experiences
                .into_iter()
                .map(|e| NewExperience {
                    title: e.title.trim().to_owned(),
                    organization: e.organization.trim().to_owned(),
                    start_date: e.start_date.trim().to_owned(),
                    end_date: clean(e.end_date),
                    description: clean(e.description),
                })
                .collect()
        })
    }
}

#[debug_handler]
pub(crate) async fn own_profile(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Data<Profile>> {
    let profile = repo::load_profile(&db_pool, &principal.id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Data(profile))
}

#[debug_handler]
pub(crate) async fn update_profile(
    State(db_pool): State<SqlitePool>,
    Extension(principal): Extension<Principal>,
    AppJson(mut patch): AppJson<ProfilePatch>,
) -> AppResult<Data<Profile>> {
    let mut cleared = Vec::new();
    for (field, value) in [
        ("phone", &mut patch.phone),
        ("bio", &mut patch.bio),
        ("cep", &mut patch.cep),
        ("state", &mut patch.state),
        ("city", &mut patch.city),
        ("curso", &mut patch.curso),
        ("university", &mut patch.university),
        ("cpf", &mut patch.cpf),
        ("cnpj", &mut patch.cnpj),
        ("company", &mut patch.company),
    ] {
        if blank_to_none(value) {
            cleared.push(field);
        }
    }

    patch.validate()?;
    patch.check_allowed(principal.user_type)?;

    let mut tx = db_pool.begin().await?;

    let mut user = repo::load_user(&mut *tx, &principal.id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    let experiences = patch.apply(&mut user, &cleared);

    repo::save_user(&mut tx, &user).await?;
    if let Some(experiences) = experiences {
        repo::replace_experiences(&mut tx, &user.id, experiences).await?;
    }

    tx.commit().await?;
    tracing::info!(user_id = %principal.id, "profile updated");

    let profile = repo::load_profile(&db_pool, &principal.id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Data(profile))
}
