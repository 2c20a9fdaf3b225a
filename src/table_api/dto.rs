use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::CourseTable;

/// Envelope the course table service wraps every table payload in.
#[derive(Debug, Deserialize)]
pub struct TableResponse {
    pub course_table: CourseTable,
}

#[derive(Debug, Serialize)]
pub struct CreateTableBody<'a> {
    #[serde(rename = "_id")]
    pub id: &'a str,
    pub name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<&'a str>,
    pub semester: &'a str,
}

/// Whole-record replacement body. `courses` always carries the full sequence;
/// the service does not merge partial updates.
#[derive(Debug, Serialize)]
pub struct ReplaceTableBody<'a> {
    pub name: &'a str,
    pub user_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire_ts: Option<DateTime<Utc>>,
    pub courses: &'a [String],
}
