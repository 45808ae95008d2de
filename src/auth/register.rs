use axum::{debug_handler, extract::State};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::Session;

use crate::{
    models::UserType,
    res::{AppJson, Created},
    session::USER_ID,
    validate::{self, clean, digits},
    AppError, AppResult, FieldErrors,
};

use super::{create_user, NewUser};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisterBody {
    #[garde(length(min = 2, max = 100), custom(validate::person_name))]
    name: String,
    #[garde(email, length(max = 254))]
    email: String,
    #[garde(skip)]
    user_type: UserType,
    #[garde(custom(validate::phone))]
    phone: Option<String>,
    #[garde(custom(validate::cpf))]
    cpf: Option<String>,
    #[garde(length(max = 120))]
    curso: Option<String>,
    #[garde(length(max = 120))]
    university: Option<String>,
    #[garde(custom(validate::cnpj))]
    cnpj: Option<String>,
    #[garde(length(max = 120))]
    company: Option<String>,
    #[garde(custom(validate::cep))]
    cep: Option<String>,
    #[garde(custom(validate::uf))]
    state: Option<String>,
    #[garde(length(max = 80))]
    city: Option<String>,
}

impl RegisterBody {
    /// Documents each user type has to provide at sign-up.
    fn check_required(&self) -> AppResult<()> {
        let mut errors = FieldErrors::default();
        let mut require = |field: &str, value: &Option<String>| {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                errors.add(field, "required");
            }
        };

        match self.user_type {
            UserType::Aluno => {
                require("cpf", &self.cpf);
                require("curso", &self.curso);
            }
            UserType::Recrutador => {
                require("cnpj", &self.cnpj);
                require("company", &self.company);
            }
            UserType::Gestor => {
                require("university", &self.university);
            }
        }

        errors.into_result()
    }

    fn into_new_user(self) -> NewUser {
        NewUser {
            name: self.name.trim().to_owned(),
            email: self.email.trim().to_lowercase(),
            user_type: self.user_type,
            phone: clean(self.phone).map(|v| digits(&v)),
            cpf: clean(self.cpf).map(|v| digits(&v)),
            curso: clean(self.curso),
            university: clean(self.university),
            cnpj: clean(self.cnpj).map(|v| digits(&v)),
            company: clean(self.company),
            cep: clean(self.cep).map(|v| digits(&v)),
            state: clean(self.state).map(|v| v.to_ascii_uppercase()),
            city: clean(self.city),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Registered {
    id: String,
    user_type: UserType,
}

#[debug_handler]
pub(crate) async fn register(
    State(db_pool): State<SqlitePool>,
    session: Session,
    AppJson(body): AppJson<RegisterBody>,
) -> AppResult<Created<Registered>> {
    body.validate()?;
    body.check_required()?;

    let user_type = body.user_type;
    let id = match create_user(&db_pool, body.into_new_user()).await {
        Ok(id) => id,
        Err(AppError::Internal(err))
            if err
                .downcast_ref::<sqlx::Error>()
                .and_then(|e| e.as_database_error())
                .is_some_and(|e| e.is_unique_violation()) =>
        {
            return Err(AppError::conflict("email already registered"));
        }
        Err(err) => return Err(err),
    };

    session.cycle_id().await?;
    session.insert(USER_ID, &id).await?;

    Ok(Created(Registered { id, user_type }))
}
