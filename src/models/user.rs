use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserType {
    Aluno,
    Recrutador,
    Gestor,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub user_type: UserType,
    pub phone: Option<String>,
    pub cpf: Option<String>,
    pub curso: Option<String>,
    pub university: Option<String>,
    pub cnpj: Option<String>,
    pub company: Option<String>,
    pub cep: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub bio: Option<String>,
    pub image_url: Option<String>,
    pub gold_medals: i64,
    pub silver_medals: i64,
    pub bronze_medals: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub title: String,
    pub organization: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub description: Option<String>,
}
