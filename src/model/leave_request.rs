use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Leave categories. Each one draws from its own entitlement bucket.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveType {
    Sick,
    Paid,
    Casual,
}

impl LeaveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveType::Sick => "sick",
            LeaveType::Paid => "paid",
            LeaveType::Casual => "casual",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sick" => Some(LeaveType::Sick),
            "paid" => Some(LeaveType::Paid),
            "casual" => Some(LeaveType::Casual),
            _ => None,
        }
    }

    /// Column holding the remaining days for this category.
    pub fn balance_column(&self) -> &'static str {
        match self {
            LeaveType::Sick => "sick_leave_balance",
            LeaveType::Paid => "paid_leave_balance",
            LeaveType::Casual => "casual_leave_balance",
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveStatus::Pending => "pending",
            LeaveStatus::Approved => "approved",
            LeaveStatus::Rejected => "rejected",
        }
    }

    /// Approved and rejected requests accept no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(LeaveStatus::Pending),
            "approved" => Some(LeaveStatus::Approved),
            "rejected" => Some(LeaveStatus::Rejected),
            _ => None,
        }
    }
}

/// Inclusive day count of a leave interval. A single-day request is 1 day.
pub fn leave_duration(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days() + 1
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "sick", value_type = String)]
    pub leave_type: String,
    #[schema(example = "2024-07-15", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-07-16", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub reason: Option<String>,
    #[schema(example = "pending", value_type = String)]
    pub status: String,
    pub reviewer_id: Option<u64>,
    pub review_notes: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// True when `day` falls inside the request's inclusive date interval.
    pub fn covers(&self, day: NaiveDate) -> bool {
        self.start_date <= day && day <= self.end_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn single_day_counts_as_one() {
        let d = date(2024, 8, 1);
        assert_eq!(leave_duration(d, d), 1);
    }

    #[test]
    fn duration_is_inclusive_of_both_ends() {
        assert_eq!(leave_duration(date(2024, 8, 1), date(2024, 8, 3)), 3);
        assert_eq!(leave_duration(date(2024, 7, 15), date(2024, 7, 16)), 2);
    }

    #[test]
    fn duration_spans_month_boundary() {
        assert_eq!(leave_duration(date(2024, 1, 30), date(2024, 2, 2)), 4);
    }

    #[test]
    fn terminal_states() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_round_trips_through_db_strings() {
        for status in [
            LeaveStatus::Pending,
            LeaveStatus::Approved,
            LeaveStatus::Rejected,
        ] {
            assert_eq!(LeaveStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(LeaveStatus::parse("cancelled"), None);
    }

    #[test]
    fn leave_type_round_trips_through_db_strings() {
        for leave_type in [LeaveType::Sick, LeaveType::Paid, LeaveType::Casual] {
            assert_eq!(LeaveType::parse(leave_type.as_str()), Some(leave_type));
        }
        assert_eq!(LeaveType::parse("unpaid"), None);
    }

    #[test]
    fn covers_inclusive_interval() {
        let req = LeaveRequest {
            id: 1,
            user_id: 7,
            leave_type: "sick".into(),
            start_date: date(2024, 7, 15),
            end_date: date(2024, 7, 16),
            reason: None,
            status: "approved".into(),
            reviewer_id: Some(2),
            review_notes: None,
            created_at: None,
            updated_at: None,
        };

        assert!(req.covers(date(2024, 7, 15)));
        assert!(req.covers(date(2024, 7, 16)));
        assert!(!req.covers(date(2024, 7, 14)));
        assert!(!req.covers(date(2024, 7, 17)));
    }
}
