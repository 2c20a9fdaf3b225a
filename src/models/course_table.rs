use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted course table record as the course table service returns it.
/// `courses` is the ordered course-id sequence; an empty string marks a
/// vacated priority slot (see the slot-indexed save path).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseTable {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// None denotes an anonymous/guest table, looked up through the locally
    /// stored table id instead of an account.
    pub user_id: Option<String>,
    pub semester: String,
    /// Guest tables carry a server-enforced expiry; linked tables do not.
    #[serde(default)]
    pub expire_ts: Option<DateTime<Utc>>,
    pub courses: Vec<String>,
}

impl CourseTable {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expire_ts {
            Some(ts) => ts < now,
            None => false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTableRequest {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub semester: String,
}
