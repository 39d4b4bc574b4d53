use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use serde::Deserialize;
use uuid::Uuid;

use focal_core::domain::client::ClientId;
use focal_core::domain::questionnaire::{
    Question, QuestionFieldType, QuestionId, Questionnaire, QuestionnaireId, QuestionnaireStatus,
};
use focal_core::errors::ToolError;
use focal_db::repositories::{ClientRepository, QuestionnaireRepository};

use super::{parse_params, to_json};
use crate::registry::Tool;
use crate::schema::{FieldSpec, ParameterSchema};

pub struct CreateQuestionnaireTool {
    questionnaires: Arc<dyn QuestionnaireRepository>,
    clients: Arc<dyn ClientRepository>,
    schema: ParameterSchema,
}

impl CreateQuestionnaireTool {
    pub fn new(
        questionnaires: Arc<dyn QuestionnaireRepository>,
        clients: Arc<dyn ClientRepository>,
    ) -> Self {
        Self {
            questionnaires,
            clients,
            schema: ParameterSchema::new()
                .field(FieldSpec::string("title").required().min_len(1).max_len(200))
                .field(FieldSpec::uuid("client_id").describe("Client the form is meant for"))
                .field(
                    FieldSpec::object_array("questions")
                        .required()
                        .min_items(1)
                        .describe("Questions: {prompt, field_type, required?, options?}"),
                ),
        }
    }
}

#[async_trait]
impl Tool for CreateQuestionnaireTool {
    fn name(&self) -> &'static str {
        "create_questionnaire"
    }

    fn description(&self) -> &'static str {
        "Create a questionnaire together with its questions"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let title = params
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ToolError::validation("title", "is required"))?;
        let client_id = match params.get("client_id").and_then(Value::as_str) {
            Some(raw) => {
                let parsed = raw
                    .parse::<Uuid>()
                    .map_err(|_| ToolError::validation("client_id", "must be a valid UUID"))?;
                let id = ClientId(parsed);
                if self.clients.find_by_id(&id).await?.is_none() {
                    return Err(ToolError::not_found("client", parsed));
                }
                Some(id)
            }
            None => None,
        };
        let raw_questions = params
            .get("questions")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| ToolError::validation("questions", "is required"))?;

        let questionnaire_id = QuestionnaireId(Uuid::new_v4());
        let mut questions = Vec::with_capacity(raw_questions.len());
        for (index, raw) in raw_questions.iter().enumerate() {
            questions.push(parse_question(index, raw, &questionnaire_id)?);
        }

        let now = Utc::now();
        let questionnaire = Questionnaire {
            id: questionnaire_id,
            client_id,
            title,
            status: QuestionnaireStatus::Draft,
            created_at: now,
            updated_at: now,
        };

        let question_count = questions.len();
        self.questionnaires.create(questionnaire.clone(), questions).await?;
        Ok(json!({
            "questionnaire_id": questionnaire.id.0,
            "question_count": question_count,
            "status": questionnaire.status.as_str(),
        }))
    }
}

/// Each question object is validated here, before any row is written, so a
/// bad entry fails the whole call with a field path like `questions[2]`.
fn parse_question(
    index: usize,
    raw: &Value,
    questionnaire_id: &QuestionnaireId,
) -> Result<Question, ToolError> {
    let field = |suffix: &str| format!("questions[{index}].{suffix}");

    let prompt = raw
        .get("prompt")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .ok_or_else(|| ToolError::validation(field("prompt"), "is required"))?;

    let field_type_raw = raw
        .get("field_type")
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::validation(field("field_type"), "is required"))?;
    let field_type = QuestionFieldType::parse(field_type_raw).ok_or_else(|| {
        ToolError::validation(
            field("field_type"),
            format!("must be one of {}", QuestionFieldType::VALUES.join("|")),
        )
    })?;

    let required = match raw.get("required") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => return Err(ToolError::validation(field("required"), "must be a boolean")),
    };

    let options = match raw.get("options") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let mut options = Vec::with_capacity(items.len());
            for item in items {
                let Some(text) = item.as_str() else {
                    return Err(ToolError::validation(
                        field("options"),
                        "must be an array of strings",
                    ));
                };
                options.push(text.to_string());
            }
            options
        }
        Some(_) => {
            return Err(ToolError::validation(field("options"), "must be an array of strings"))
        }
    };

    if field_type == QuestionFieldType::Select && options.is_empty() {
        return Err(ToolError::validation(
            field("options"),
            "SELECT questions need at least one option",
        ));
    }
    if field_type != QuestionFieldType::Select && !options.is_empty() {
        return Err(ToolError::validation(
            field("options"),
            "options are only allowed on SELECT questions",
        ));
    }

    Ok(Question {
        id: QuestionId(Uuid::new_v4()),
        questionnaire_id: questionnaire_id.clone(),
        position: (index + 1) as u32,
        prompt: prompt.to_string(),
        field_type,
        required,
        options,
    })
}

pub struct GetQuestionnaireTool {
    questionnaires: Arc<dyn QuestionnaireRepository>,
    schema: ParameterSchema,
}

impl GetQuestionnaireTool {
    pub fn new(questionnaires: Arc<dyn QuestionnaireRepository>) -> Self {
        Self {
            questionnaires,
            schema: ParameterSchema::new().field(FieldSpec::uuid("questionnaire_id").required()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GetQuestionnaireParams {
    questionnaire_id: Uuid,
}

#[async_trait]
impl Tool for GetQuestionnaireTool {
    fn name(&self) -> &'static str {
        "get_questionnaire"
    }

    fn description(&self) -> &'static str {
        "Fetch a questionnaire and its questions"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: GetQuestionnaireParams = parse_params(params)?;
        let id = QuestionnaireId(params.questionnaire_id);

        let Some(questionnaire) = self.questionnaires.find_by_id(&id).await? else {
            return Err(ToolError::not_found("questionnaire", params.questionnaire_id));
        };
        let questions = self.questionnaires.list_questions(&id).await?;

        Ok(json!({
            "questionnaire": to_json(&questionnaire)?,
            "questions": to_json(&questions)?,
        }))
    }
}

pub struct ReadQuestionnairesTool {
    questionnaires: Arc<dyn QuestionnaireRepository>,
    schema: ParameterSchema,
}

impl ReadQuestionnairesTool {
    pub fn new(questionnaires: Arc<dyn QuestionnaireRepository>) -> Self {
        Self {
            questionnaires,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("client_id"))
                .field(FieldSpec::enumeration("status", QuestionnaireStatus::VALUES))
                .field(FieldSpec::integer("limit").min(1).max(100).default_value(json!(50))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReadQuestionnairesParams {
    client_id: Option<Uuid>,
    status: Option<QuestionnaireStatus>,
    limit: u32,
}

#[async_trait]
impl Tool for ReadQuestionnairesTool {
    fn name(&self) -> &'static str {
        "read_questionnaires"
    }

    fn description(&self) -> &'static str {
        "List questionnaires, optionally by client or status"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: ReadQuestionnairesParams = parse_params(params)?;
        let client_id = params.client_id.map(ClientId);
        let questionnaires =
            self.questionnaires.list(client_id.as_ref(), params.status, params.limit).await?;

        Ok(json!({
            "count": questionnaires.len(),
            "questionnaires": to_json(&questionnaires)?,
        }))
    }
}

pub struct UpdateQuestionnaireTool {
    questionnaires: Arc<dyn QuestionnaireRepository>,
    schema: ParameterSchema,
}

impl UpdateQuestionnaireTool {
    pub fn new(questionnaires: Arc<dyn QuestionnaireRepository>) -> Self {
        Self {
            questionnaires,
            schema: ParameterSchema::new()
                .field(FieldSpec::uuid("questionnaire_id").required())
                .field(FieldSpec::string("title").min_len(1).max_len(200))
                .field(FieldSpec::enumeration("status", QuestionnaireStatus::VALUES)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UpdateQuestionnaireParams {
    questionnaire_id: Uuid,
    title: Option<String>,
    status: Option<QuestionnaireStatus>,
}

#[async_trait]
impl Tool for UpdateQuestionnaireTool {
    fn name(&self) -> &'static str {
        "update_questionnaire"
    }

    fn description(&self) -> &'static str {
        "Rename a questionnaire or move it through its lifecycle"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: UpdateQuestionnaireParams = parse_params(params)?;
        let id = QuestionnaireId(params.questionnaire_id);

        let Some(mut questionnaire) = self.questionnaires.find_by_id(&id).await? else {
            return Err(ToolError::not_found("questionnaire", params.questionnaire_id));
        };

        if let Some(title) = params.title {
            questionnaire.title = title;
        }
        if let Some(status) = params.status {
            questionnaire.status = status;
        }
        questionnaire.updated_at = Utc::now();

        let status = questionnaire.status.as_str();
        if self.questionnaires.update(questionnaire).await? == 0 {
            return Err(ToolError::not_found("questionnaire", params.questionnaire_id));
        }
        Ok(json!({"questionnaire_id": params.questionnaire_id, "status": status}))
    }
}

pub struct DeleteQuestionnaireTool {
    questionnaires: Arc<dyn QuestionnaireRepository>,
    schema: ParameterSchema,
}

impl DeleteQuestionnaireTool {
    pub fn new(questionnaires: Arc<dyn QuestionnaireRepository>) -> Self {
        Self {
            questionnaires,
            schema: ParameterSchema::new().field(FieldSpec::uuid("questionnaire_id").required()),
        }
    }
}

#[async_trait]
impl Tool for DeleteQuestionnaireTool {
    fn name(&self) -> &'static str {
        "delete_questionnaire"
    }

    fn description(&self) -> &'static str {
        "Delete a questionnaire and its questions"
    }

    fn schema(&self) -> &ParameterSchema {
        &self.schema
    }

    async fn execute(&self, params: Map<String, Value>) -> Result<Value, ToolError> {
        let params: GetQuestionnaireParams = parse_params(params)?;
        let id = QuestionnaireId(params.questionnaire_id);

        if self.questionnaires.delete(&id).await? == 0 {
            return Err(ToolError::not_found("questionnaire", params.questionnaire_id));
        }
        Ok(json!({"questionnaire_id": params.questionnaire_id, "deleted": true}))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use focal_db::repositories::{
        ClientRepository, QuestionnaireRepository, SqlClientRepository,
        SqlQuestionnaireRepository,
    };
    use focal_db::{connect_with_settings, migrations, DbPool};

    use super::{
        CreateQuestionnaireTool, DeleteQuestionnaireTool, GetQuestionnaireTool,
        ReadQuestionnairesTool, UpdateQuestionnaireTool,
    };
    use crate::registry::ToolRegistry;

    async fn setup() -> (DbPool, ToolRegistry) {
        let pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 30)
            .await
            .expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");

        let questionnaires: Arc<dyn QuestionnaireRepository> =
            Arc::new(SqlQuestionnaireRepository::new(pool.clone()));
        let clients: Arc<dyn ClientRepository> = Arc::new(SqlClientRepository::new(pool.clone()));

        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(CreateQuestionnaireTool::new(questionnaires.clone(), clients)))
            .expect("register");
        registry
            .register(Arc::new(GetQuestionnaireTool::new(questionnaires.clone())))
            .expect("register");
        registry
            .register(Arc::new(ReadQuestionnairesTool::new(questionnaires.clone())))
            .expect("register");
        registry
            .register(Arc::new(UpdateQuestionnaireTool::new(questionnaires.clone())))
            .expect("register");
        registry
            .register(Arc::new(DeleteQuestionnaireTool::new(questionnaires)))
            .expect("register");

        (pool, registry)
    }

    #[tokio::test]
    async fn create_round_trips_questions_in_order() {
        let (pool, registry) = setup().await;

        let created = registry
            .dispatch(
                "create_questionnaire",
                &json!({
                    "title": "Wedding day details",
                    "questions": [
                        {"prompt": "Where is the ceremony?", "field_type": "TEXT", "required": true},
                        {"prompt": "Anything else?", "field_type": "MULTILINE"},
                        {
                            "prompt": "Album size",
                            "field_type": "SELECT",
                            "options": ["8x8", "10x10"]
                        }
                    ]
                }),
            )
            .await;
        assert_eq!(created["success"], json!(true));
        assert_eq!(created["question_count"], json!(3));
        let id = created["questionnaire_id"].as_str().expect("id").to_string();

        let fetched = registry
            .dispatch("get_questionnaire", &json!({"questionnaire_id": id}))
            .await;
        assert_eq!(fetched["success"], json!(true));
        let questions = fetched["questions"].as_array().expect("questions");
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0]["position"], json!(1));
        assert_eq!(questions[0]["prompt"], json!("Where is the ceremony?"));
        assert_eq!(questions[2]["options"], json!(["8x8", "10x10"]));

        pool.close().await;
    }

    #[tokio::test]
    async fn bad_question_rejects_the_whole_call_before_storage() {
        let (pool, registry) = setup().await;

        let envelope = registry
            .dispatch(
                "create_questionnaire",
                &json!({
                    "title": "Broken form",
                    "questions": [
                        {"prompt": "Fine", "field_type": "TEXT"},
                        {"prompt": "Broken", "field_type": "SELECT"}
                    ]
                }),
            )
            .await;

        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["error"].as_str().unwrap_or_default().contains("questions[1]"));

        let listed = registry.dispatch("read_questionnaires", &json!({})).await;
        assert_eq!(listed["count"], json!(0));

        pool.close().await;
    }

    #[tokio::test]
    async fn empty_question_list_is_rejected() {
        let (pool, registry) = setup().await;

        let envelope = registry
            .dispatch(
                "create_questionnaire",
                &json!({"title": "Empty form", "questions": []}),
            )
            .await;

        assert_eq!(envelope["success"], json!(false));
        assert!(envelope["error"].as_str().unwrap_or_default().contains("questions"));

        pool.close().await;
    }

    #[tokio::test]
    async fn lifecycle_update_and_delete() {
        let (pool, registry) = setup().await;

        let created = registry
            .dispatch(
                "create_questionnaire",
                &json!({
                    "title": "Portrait prep",
                    "questions": [{"prompt": "Outfit notes?", "field_type": "TEXT"}]
                }),
            )
            .await;
        let id = created["questionnaire_id"].as_str().expect("id").to_string();

        let sent = registry
            .dispatch(
                "update_questionnaire",
                &json!({"questionnaire_id": id, "status": "SENT"}),
            )
            .await;
        assert_eq!(sent["status"], json!("SENT"));

        let deleted = registry
            .dispatch("delete_questionnaire", &json!({"questionnaire_id": id}))
            .await;
        assert_eq!(deleted["success"], json!(true));

        let missing = registry
            .dispatch("get_questionnaire", &json!({"questionnaire_id": id}))
            .await;
        assert_eq!(missing["success"], json!(false));

        pool.close().await;
    }
}
