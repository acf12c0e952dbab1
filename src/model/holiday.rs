use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A company-wide non-working date, independent of any employee.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    pub id: u64,
    #[schema(example = "Independence Day")]
    pub name: String,
    #[schema(example = "2024-07-04", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}
