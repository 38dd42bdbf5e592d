//! ProfileRepository - Competenze, formazione, esperienze e contatori del profilo

use crate::dtos::{CreateEducationDTO, CreateExperienceDTO};
use crate::entities::{Education, Experience, Skill};
use sqlx::{Error, MySqlPool};
use tracing::{debug, info, instrument};

pub struct ProfileRepository {
    connection_pool: MySqlPool,
}

impl ProfileRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    #[instrument(skip(self))]
    pub async fn find_skills(&self, user_id: &i32) -> Result<Vec<Skill>, Error> {
        sqlx::query_as::<_, Skill>(
            r#"
            SELECT s.skill_id, s.name
            FROM skills s
            INNER JOIN user_skills us ON us.skill_id = s.skill_id
            WHERE us.user_id = ?
            ORDER BY s.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    /// Replaces the whole skill set of a user in a single transaction.
    /// Skills missing from the catalogue are created on demand.
    #[instrument(skip(self, names), fields(count = names.len()))]
    pub async fn replace_skills(&self, user_id: &i32, names: &[String]) -> Result<Vec<Skill>, Error> {
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query("DELETE FROM user_skills WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for name in names {
            // INSERT IGNORE: la skill può già esistere nel catalogo
            sqlx::query("INSERT IGNORE INTO skills (name) VALUES (?)")
                .bind(name)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "INSERT IGNORE INTO user_skills (user_id, skill_id) \
                 SELECT ?, skill_id FROM skills WHERE name = ?",
            )
            .bind(user_id)
            .bind(name)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        info!("Skills replaced");

        self.find_skills(user_id).await
    }

    pub async fn find_educations(&self, user_id: &i32) -> Result<Vec<Education>, Error> {
        sqlx::query_as::<_, Education>(
            r#"
            SELECT education_id, user_id, institution, degree, field_of_study, start_year, end_year
            FROM educations
            WHERE user_id = ?
            ORDER BY start_year DESC, education_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    #[instrument(skip(self, data))]
    pub async fn add_education(
        &self,
        user_id: &i32,
        data: &CreateEducationDTO,
    ) -> Result<Education, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO educations (user_id, institution, degree, field_of_study, start_year, end_year)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&data.institution)
        .bind(&data.degree)
        .bind(&data.field_of_study)
        .bind(data.start_year)
        .bind(data.end_year)
        .execute(&self.connection_pool)
        .await?;

        Ok(Education {
            education_id: result.last_insert_id() as i32,
            user_id: *user_id,
            institution: data.institution.clone(),
            degree: data.degree.clone(),
            field_of_study: data.field_of_study.clone(),
            start_year: data.start_year,
            end_year: data.end_year,
        })
    }

    /// Deletes an education entry owned by `user_id`; returns false if nothing matched
    #[instrument(skip(self))]
    pub async fn delete_education(&self, user_id: &i32, education_id: &i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM educations WHERE education_id = ? AND user_id = ?")
            .bind(education_id)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_experiences(&self, user_id: &i32) -> Result<Vec<Experience>, Error> {
        sqlx::query_as::<_, Experience>(
            r#"
            SELECT experience_id, user_id, company, title, description, start_date, end_date
            FROM experiences
            WHERE user_id = ?
            ORDER BY start_date DESC, experience_id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await
    }

    #[instrument(skip(self, data))]
    pub async fn add_experience(
        &self,
        user_id: &i32,
        data: &CreateExperienceDTO,
    ) -> Result<Experience, Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO experiences (user_id, company, title, description, start_date, end_date)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&data.company)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.start_date)
        .bind(data.end_date)
        .execute(&self.connection_pool)
        .await?;

        Ok(Experience {
            experience_id: result.last_insert_id() as i32,
            user_id: *user_id,
            company: data.company.clone(),
            title: data.title.clone(),
            description: data.description.clone(),
            start_date: data.start_date,
            end_date: data.end_date,
        })
    }

    #[instrument(skip(self))]
    pub async fn delete_experience(&self, user_id: &i32, experience_id: &i32) -> Result<bool, Error> {
        let result = sqlx::query("DELETE FROM experiences WHERE experience_id = ? AND user_id = ?")
            .bind(experience_id)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Returns (accepted connections, authored posts)
    #[instrument(skip(self))]
    pub async fn counters(&self, user_id: &i32) -> Result<(i64, i64), Error> {
        let (connections, posts): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM connections
                  WHERE status = 'ACCEPTED' AND (requester_id = ? OR addressee_id = ?)),
                (SELECT COUNT(*) FROM posts WHERE author_id = ?)
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await?;
        debug!(connections, posts, "Profile counters loaded");
        Ok((connections, posts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_replace_skills_is_idempotent(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ProfileRepository::new(pool);
        let names = vec!["Rust".to_string(), "SQL".to_string()];

        let first = repo.replace_skills(&1, &names).await?;
        assert_eq!(first.len(), 2);

        let second = repo.replace_skills(&1, &["Rust".to_string()]).await?;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].name, "Rust");

        // la skill "Rust" del catalogo è condivisa tra utenti
        let bob = repo.replace_skills(&2, &["Rust".to_string()]).await?;
        assert_eq!(bob[0].skill_id, second[0].skill_id);
        Ok(())
    }

    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_delete_education_only_own(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = ProfileRepository::new(pool);
        let education = repo
            .add_education(
                &1,
                &CreateEducationDTO {
                    institution: "Politecnico".to_string(),
                    degree: Some("MSc".to_string()),
                    field_of_study: None,
                    start_year: Some(2018),
                    end_year: Some(2020),
                },
            )
            .await?;

        assert!(!repo.delete_education(&2, &education.education_id).await?);
        assert!(repo.delete_education(&1, &education.education_id).await?);
        assert!(repo.find_educations(&1).await?.is_empty());
        Ok(())
    }
}
