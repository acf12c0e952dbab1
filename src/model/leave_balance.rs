use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::leave_request::LeaveType;

/// One live snapshot of remaining entitlement per user.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "user_id": 7,
    "sick_leave_balance": 10,
    "paid_leave_balance": 20,
    "casual_leave_balance": 5
}))]
pub struct LeaveBalance {
    pub user_id: u64,
    #[schema(example = 10)]
    pub sick_leave_balance: i32,
    #[schema(example = 20)]
    pub paid_leave_balance: i32,
    #[schema(example = 5)]
    pub casual_leave_balance: i32,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl LeaveBalance {
    pub fn remaining(&self, leave_type: LeaveType) -> i32 {
        match leave_type {
            LeaveType::Sick => self.sick_leave_balance,
            LeaveType::Paid => self.paid_leave_balance,
            LeaveType::Casual => self.casual_leave_balance,
        }
    }

    /// Admissibility check: the request fits in full or not at all.
    pub fn can_cover(&self, leave_type: LeaveType, days: i64) -> bool {
        days <= self.remaining(leave_type) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(sick: i32, paid: i32, casual: i32) -> LeaveBalance {
        LeaveBalance {
            user_id: 1,
            sick_leave_balance: sick,
            paid_leave_balance: paid,
            casual_leave_balance: casual,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn remaining_reads_the_matching_bucket() {
        let b = balance(10, 20, 5);
        assert_eq!(b.remaining(LeaveType::Sick), 10);
        assert_eq!(b.remaining(LeaveType::Paid), 20);
        assert_eq!(b.remaining(LeaveType::Casual), 5);
    }

    #[test]
    fn request_over_balance_is_not_covered() {
        let b = balance(3, 20, 5);
        assert!(!b.can_cover(LeaveType::Sick, 5));
        assert!(b.can_cover(LeaveType::Sick, 3));
    }

    #[test]
    fn exact_fit_is_covered() {
        let b = balance(10, 20, 5);
        assert!(b.can_cover(LeaveType::Casual, 5));
        assert!(!b.can_cover(LeaveType::Casual, 6));
    }

    #[test]
    fn zero_balance_covers_nothing() {
        let b = balance(0, 0, 0);
        assert!(!b.can_cover(LeaveType::Paid, 1));
    }
}
