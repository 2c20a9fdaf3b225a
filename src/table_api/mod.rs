pub mod dto;

use std::collections::HashMap;
use std::env;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};

use crate::error::AppError;
use crate::models::{CourseTable, NewTableRequest};

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_token: Option<String>,
}

impl ApiConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("COURSETABLE_API_URL")
            .map_err(|_| AppError::Config("COURSETABLE_API_URL is not set".to_string()))?;
        let api_token = env::var("COURSETABLE_API_TOKEN").ok();

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }
}

/// Abstract contract toward the external course table service.
///
/// `Ok(None)` means the record is gone (not found or expired); transport and
/// validation failures come back as `AppError::Service` and may be retried.
#[async_trait]
pub trait CourseTableApi: Send + Sync {
    async fn fetch_table(&self, table_id: &str) -> Result<Option<CourseTable>, AppError>;
    async fn create_table(&self, req: &NewTableRequest) -> Result<CourseTable, AppError>;
    async fn replace_table(
        &self,
        table_id: &str,
        name: &str,
        user_id: Option<&str>,
        expire_ts: Option<DateTime<Utc>>,
        courses: &[String],
    ) -> Result<Option<CourseTable>, AppError>;
}

pub struct CourseTableHttpClient {
    client: Client,
    config: ApiConfig,
}

impl CourseTableHttpClient {
    pub fn new(config: ApiConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn table_url(&self, table_id: &str) -> String {
        format!("{}/course_tables/{}", self.config.base_url, table_id)
    }

    fn with_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_token {
            Some(token) => req.header("Authorization", format!("Bearer {}", token)),
            None => req,
        }
    }

    fn is_gone(status: StatusCode) -> bool {
        status == StatusCode::NOT_FOUND || status == StatusCode::GONE
    }

    async fn parse_table(response: reqwest::Response) -> Result<CourseTable, AppError> {
        let body_text = response.text().await.unwrap_or_default();
        serde_json::from_str::<dto::TableResponse>(&body_text)
            .map(|r| r.course_table)
            .map_err(|e| {
                tracing::error!("Failed to parse course table response: {}", e);
                AppError::Service(format!("Failed to parse course table response: {}", e))
            })
    }
}

#[async_trait]
impl CourseTableApi for CourseTableHttpClient {
    async fn fetch_table(&self, table_id: &str) -> Result<Option<CourseTable>, AppError> {
        let response = self
            .with_auth(self.client.get(self.table_url(table_id)))
            .send()
            .await
            .map_err(|e| AppError::Service(format!("fetch course table failed: {}", e)))?;

        let status = response.status();
        if Self::is_gone(status) {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Service(format!(
                "Course table API error {}: {}",
                status, body
            )));
        }

        Ok(Some(Self::parse_table(response).await?))
    }

    async fn create_table(&self, req: &NewTableRequest) -> Result<CourseTable, AppError> {
        let url = format!("{}/course_tables", self.config.base_url);
        let body = dto::CreateTableBody {
            id: &req.id,
            name: &req.name,
            user_id: req.user_id.as_deref(),
            semester: &req.semester,
        };

        let response = self
            .with_auth(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Service(format!("create course table failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Service(format!(
                "Course table API error {}: {}",
                status, body
            )));
        }

        Self::parse_table(response).await
    }

    async fn replace_table(
        &self,
        table_id: &str,
        name: &str,
        user_id: Option<&str>,
        expire_ts: Option<DateTime<Utc>>,
        courses: &[String],
    ) -> Result<Option<CourseTable>, AppError> {
        let body = dto::ReplaceTableBody {
            name,
            user_id,
            expire_ts,
            courses,
        };

        let response = self
            .with_auth(self.client.patch(self.table_url(table_id)))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Service(format!("replace course table failed: {}", e)))?;

        let status = response.status();
        if Self::is_gone(status) {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Service(format!(
                "Course table API error {}: {}",
                status, body
            )));
        }

        Ok(Some(Self::parse_table(response).await?))
    }
}

/// In-process stand-in for the course table service, used by tests and demos.
/// Records past their `expire_ts` behave exactly like deleted ones.
#[derive(Default)]
pub struct InMemoryTableApi {
    tables: Mutex<HashMap<String, CourseTable>>,
    fail_next: Mutex<bool>,
}

impl InMemoryTableApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, table: CourseTable) {
        self.tables
            .lock()
            .expect("table map poisoned")
            .insert(table.id.clone(), table);
    }

    /// Simulate server-side deletion of a record.
    pub fn remove(&self, table_id: &str) {
        self.tables
            .lock()
            .expect("table map poisoned")
            .remove(table_id);
    }

    /// Make the next API call fail with a transient service error.
    pub fn fail_next_call(&self) {
        *self.fail_next.lock().expect("flag poisoned") = true;
    }

    pub fn stored(&self, table_id: &str) -> Option<CourseTable> {
        self.tables
            .lock()
            .expect("table map poisoned")
            .get(table_id)
            .cloned()
    }

    fn take_failure(&self) -> Result<(), AppError> {
        let mut flag = self.fail_next.lock().expect("flag poisoned");
        if *flag {
            *flag = false;
            return Err(AppError::Service("simulated service outage".to_string()));
        }
        Ok(())
    }

    fn live_table(&self, table_id: &str) -> Option<CourseTable> {
        let tables = self.tables.lock().expect("table map poisoned");
        tables
            .get(table_id)
            .filter(|t| !t.is_expired(Utc::now()))
            .cloned()
    }
}

#[async_trait]
impl CourseTableApi for InMemoryTableApi {
    async fn fetch_table(&self, table_id: &str) -> Result<Option<CourseTable>, AppError> {
        self.take_failure()?;
        Ok(self.live_table(table_id))
    }

    async fn create_table(&self, req: &NewTableRequest) -> Result<CourseTable, AppError> {
        self.take_failure()?;
        let table = CourseTable {
            id: req.id.clone(),
            name: req.name.clone(),
            user_id: req.user_id.clone(),
            semester: req.semester.clone(),
            expire_ts: None,
            courses: Vec::new(),
        };
        self.insert(table.clone());
        Ok(table)
    }

    async fn replace_table(
        &self,
        table_id: &str,
        name: &str,
        user_id: Option<&str>,
        expire_ts: Option<DateTime<Utc>>,
        courses: &[String],
    ) -> Result<Option<CourseTable>, AppError> {
        self.take_failure()?;
        let Some(current) = self.live_table(table_id) else {
            return Ok(None);
        };
        let table = CourseTable {
            id: table_id.to_string(),
            name: name.to_string(),
            user_id: user_id.map(|s| s.to_string()),
            semester: current.semester,
            expire_ts,
            courses: courses.to_vec(),
        };
        self.insert(table.clone());
        Ok(Some(table))
    }
}
