//! Student roster reference

use serde::{Deserialize, Serialize};

/// Where a student sits in the school: enough to resolve applicable fees
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct StudentRef {
    pub student_id: i64,
    pub class_id: i64,
    pub section: String,
}
