use crate::api::calendar::{CalendarDayResponse, CalendarLeave};
use crate::api::holiday::CreateHoliday;
use crate::api::leave_request::{
    AdminLeaveResponse, CreateLeave, LeaveFilter, LeaveListResponse, ReviewDecision, ReviewLeave,
};
use crate::api::me::RoleResponse;
use crate::model::holiday::Holiday;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Management API",
        version = "1.0.0",
        description = r#"
## Leave Management Service

This API powers a **leave management** service: employees request time off
against per-category balances, managers and admins review the requests, and a
calendar view surfaces holidays and approved absences.

### 🔹 Key Features
- **Leave Requests**
  - Submit requests against sick/paid/casual balances, list and review them
- **Balances**
  - Per-user entitlement snapshot, decremented atomically on approval
- **Holidays**
  - Company-wide holiday list, admin managed
- **Calendar**
  - Per-day projection of holidays and approved absences

### 🔐 Security
All endpoints apart from `/auth` require **JWT Bearer authentication**.
Approve/reject operations require the **Manager** or **Admin** role.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported on the reviewer's list endpoint

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::my_leave_list,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::review_leave,

        crate::api::balance::my_balance,

        crate::api::holiday::holiday_list,
        crate::api::holiday::create_holiday,

        crate::api::calendar::calendar_day,

        crate::api::me::my_role
    ),
    components(
        schemas(
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveBalance,
            Holiday,
            CreateLeave,
            ReviewDecision,
            ReviewLeave,
            LeaveFilter,
            AdminLeaveResponse,
            LeaveListResponse,
            CreateHoliday,
            CalendarLeave,
            CalendarDayResponse,
            RoleResponse
        )
    ),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "Balance", description = "Leave balance APIs"),
        (name = "Holiday", description = "Holiday APIs"),
        (name = "Calendar", description = "Calendar projection APIs"),
        (name = "Me", description = "Caller identity APIs"),
    )
)]
pub struct ApiDoc;
