use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum VacancyStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Modality {
    Presencial,
    Remoto,
    Hibrido,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Seniority {
    Estagio,
    Junior,
    Pleno,
    Senior,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ContractType {
    Clt,
    Pj,
    Estagio,
    Temporario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Vacancy {
    pub id: String,
    pub recruiter_id: String,
    pub title: String,
    pub description: String,
    pub company: Option<String>,
    pub modality: Modality,
    pub seniority: Seniority,
    pub contract_type: ContractType,
    pub course: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    /// Cents.
    pub salary_min: Option<i64>,
    /// Cents.
    pub salary_max: Option<i64>,
    pub status: VacancyStatus,
    pub is_draft: bool,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VacancyApplication {
    pub id: String,
    pub vacancy_id: String,
    pub applicant_id: String,
    pub cover_letter: Option<String>,
    pub status: ApplicationStatus,
    pub created_at: String,
    pub updated_at: String,
    pub decided_at: Option<String>,
    pub decided_by: Option<String>,
}
