//! Profile entities - Competenze, formazione ed esperienze di un utente

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Skill {
    pub skill_id: i32,
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Education {
    pub education_id: i32,
    pub user_id: i32,
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Experience {
    pub experience_id: i32,
    pub user_id: i32,
    pub company: String,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    // None = posizione attuale
    pub end_date: Option<NaiveDate>,
}
