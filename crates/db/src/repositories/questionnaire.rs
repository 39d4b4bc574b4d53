use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use focal_core::domain::client::ClientId;
use focal_core::domain::questionnaire::{
    Question, QuestionFieldType, QuestionId, Questionnaire, QuestionnaireId, QuestionnaireStatus,
};

use super::{
    parse_status, parse_timestamp, parse_u32_column, parse_uuid, QuestionnaireRepository,
    RepositoryError,
};
use crate::DbPool;

const QUESTIONNAIRE_COLUMNS: &str = "id,
                client_id,
                title,
                status,
                created_at,
                updated_at";

pub struct SqlQuestionnaireRepository {
    pool: DbPool,
}

impl SqlQuestionnaireRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionnaireRepository for SqlQuestionnaireRepository {
    async fn create(
        &self,
        questionnaire: Questionnaire,
        questions: Vec<Question>,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO questionnaire (
                id,
                client_id,
                title,
                status,
                created_at,
                updated_at
             ) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(questionnaire.id.0.to_string())
        .bind(questionnaire.client_id.as_ref().map(|value| value.0.to_string()))
        .bind(&questionnaire.title)
        .bind(questionnaire.status.as_str())
        .bind(questionnaire.created_at.to_rfc3339())
        .bind(questionnaire.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        for question in &questions {
            let options = serde_json::to_string(&question.options).map_err(|error| {
                RepositoryError::Decode(format!("could not encode question options: {error}"))
            })?;

            sqlx::query(
                "INSERT INTO questionnaire_question (
                    id,
                    questionnaire_id,
                    position,
                    prompt,
                    field_type,
                    required,
                    options
                 ) VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(question.id.0.to_string())
            .bind(question.questionnaire_id.0.to_string())
            .bind(i64::from(question.position))
            .bind(&question.prompt)
            .bind(question.field_type.as_str())
            .bind(i64::from(question.required))
            .bind(options)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn update(&self, questionnaire: Questionnaire) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE questionnaire SET
                client_id = ?,
                title = ?,
                status = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(questionnaire.client_id.as_ref().map(|value| value.0.to_string()))
        .bind(&questionnaire.title)
        .bind(questionnaire.status.as_str())
        .bind(questionnaire.updated_at.to_rfc3339())
        .bind(questionnaire.id.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_by_id(
        &self,
        id: &QuestionnaireId,
    ) -> Result<Option<Questionnaire>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {QUESTIONNAIRE_COLUMNS} FROM questionnaire WHERE id = ?"
        ))
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(questionnaire_from_row).transpose()
    }

    async fn list_questions(
        &self,
        id: &QuestionnaireId,
    ) -> Result<Vec<Question>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, questionnaire_id, position, prompt, field_type, required, options
             FROM questionnaire_question
             WHERE questionnaire_id = ?
             ORDER BY position ASC",
        )
        .bind(id.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(question_from_row).collect()
    }

    async fn list(
        &self,
        client_id: Option<&ClientId>,
        status: Option<QuestionnaireStatus>,
        limit: u32,
    ) -> Result<Vec<Questionnaire>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {QUESTIONNAIRE_COLUMNS}
             FROM questionnaire
             WHERE (?1 IS NULL OR client_id = ?1)
               AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC
             LIMIT ?3"
        ))
        .bind(client_id.map(|value| value.0.to_string()))
        .bind(status.map(|value| value.as_str()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(questionnaire_from_row).collect()
    }

    async fn delete(&self, id: &QuestionnaireId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM questionnaire WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

fn questionnaire_from_row(row: SqliteRow) -> Result<Questionnaire, RepositoryError> {
    let client_id = row
        .get::<Option<String>, _>("client_id")
        .map(|value| parse_uuid("client_id", value).map(ClientId))
        .transpose()?;

    Ok(Questionnaire {
        id: QuestionnaireId(parse_uuid("id", row.get("id"))?),
        client_id,
        title: row.get("title"),
        status: parse_status("status", row.get("status"), QuestionnaireStatus::parse)?,
        created_at: parse_timestamp("created_at", row.get("created_at"))?,
        updated_at: parse_timestamp("updated_at", row.get("updated_at"))?,
    })
}

fn question_from_row(row: SqliteRow) -> Result<Question, RepositoryError> {
    let options_raw = row.get::<String, _>("options");
    let options = serde_json::from_str::<Vec<String>>(&options_raw).map_err(|error| {
        RepositoryError::Decode(format!("invalid question options `{options_raw}`: {error}"))
    })?;

    Ok(Question {
        id: QuestionId(parse_uuid("id", row.get("id"))?),
        questionnaire_id: QuestionnaireId(parse_uuid(
            "questionnaire_id",
            row.get("questionnaire_id"),
        )?),
        position: parse_u32_column("position", row.get("position"))?,
        prompt: row.get("prompt"),
        field_type: parse_status("field_type", row.get("field_type"), QuestionFieldType::parse)?,
        required: row.get::<i64, _>("required") != 0,
        options,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use uuid::Uuid;

    use focal_core::domain::questionnaire::{
        Question, QuestionFieldType, QuestionId, Questionnaire, QuestionnaireId,
        QuestionnaireStatus,
    };

    use super::SqlQuestionnaireRepository;
    use crate::migrations;
    use crate::repositories::QuestionnaireRepository;
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn parse_ts(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value).expect("valid rfc3339").with_timezone(&Utc)
    }

    fn sample_questionnaire() -> Questionnaire {
        Questionnaire {
            id: QuestionnaireId(Uuid::new_v4()),
            client_id: None,
            title: "Wedding day details".to_string(),
            status: QuestionnaireStatus::Draft,
            created_at: parse_ts("2025-06-01T09:00:00Z"),
            updated_at: parse_ts("2025-06-01T09:00:00Z"),
        }
    }

    fn sample_questions(questionnaire_id: &QuestionnaireId) -> Vec<Question> {
        vec![
            Question {
                id: QuestionId(Uuid::new_v4()),
                questionnaire_id: questionnaire_id.clone(),
                position: 1,
                prompt: "Where is the ceremony?".to_string(),
                field_type: QuestionFieldType::Text,
                required: true,
                options: Vec::new(),
            },
            Question {
                id: QuestionId(Uuid::new_v4()),
                questionnaire_id: questionnaire_id.clone(),
                position: 2,
                prompt: "Preferred album size".to_string(),
                field_type: QuestionFieldType::Select,
                required: false,
                options: vec!["8x8".to_string(), "10x10".to_string(), "12x12".to_string()],
            },
        ]
    }

    #[tokio::test]
    async fn create_stores_parent_and_questions_together() {
        let pool = setup_pool().await;
        let repo = SqlQuestionnaireRepository::new(pool.clone());

        let questionnaire = sample_questionnaire();
        let questions = sample_questions(&questionnaire.id);

        repo.create(questionnaire.clone(), questions.clone()).await.expect("create");

        assert_eq!(
            repo.find_by_id(&questionnaire.id).await.expect("find"),
            Some(questionnaire.clone())
        );
        assert_eq!(repo.list_questions(&questionnaire.id).await.expect("questions"), questions);

        pool.close().await;
    }

    #[tokio::test]
    async fn failed_question_insert_leaves_no_parent_row() {
        let pool = setup_pool().await;
        let repo = SqlQuestionnaireRepository::new(pool.clone());

        let questionnaire = sample_questionnaire();
        let mut questions = sample_questions(&questionnaire.id);
        // Point the second question at a questionnaire that does not exist
        // so its foreign key fails mid-transaction.
        questions[1].questionnaire_id = QuestionnaireId(Uuid::new_v4());

        let result = repo.create(questionnaire.clone(), questions).await;
        assert!(result.is_err());

        assert_eq!(repo.find_by_id(&questionnaire.id).await.expect("find"), None);
        assert!(repo.list_questions(&questionnaire.id).await.expect("questions").is_empty());

        pool.close().await;
    }

    #[tokio::test]
    async fn deleting_a_questionnaire_cascades_to_questions() {
        let pool = setup_pool().await;
        let repo = SqlQuestionnaireRepository::new(pool.clone());

        let questionnaire = sample_questionnaire();
        let questions = sample_questions(&questionnaire.id);
        repo.create(questionnaire.clone(), questions).await.expect("create");

        assert_eq!(repo.delete(&questionnaire.id).await.expect("delete"), 1);
        assert!(repo.list_questions(&questionnaire.id).await.expect("questions").is_empty());

        pool.close().await;
    }
}
