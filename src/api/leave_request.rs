use crate::auth::auth::AuthUser;
use crate::model::leave_balance::LeaveBalance;
use crate::model::leave_request::{LeaveRequest, LeaveStatus, LeaveType, leave_duration};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "paid")]
    pub leave_type: LeaveType,
    #[schema(example = "2024-08-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-08-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    #[schema(example = "Family trip")]
    pub reason: Option<String>,
}

/// Reviewer's verdict. Maps onto the two terminal statuses.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl ReviewDecision {
    pub fn status(&self) -> LeaveStatus {
        match self {
            ReviewDecision::Approved => LeaveStatus::Approved,
            ReviewDecision::Rejected => LeaveStatus::Rejected,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ReviewLeave {
    #[schema(example = "approved")]
    pub decision: ReviewDecision,
    #[schema(example = "enjoy")]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by requesting user ID
    #[schema(example = 7)]
    pub user_id: Option<u64>,
    /// Filter by leave status
    #[schema(example = "pending")]
    pub status: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/// A leave request annotated with the requester's display fields,
/// as shown in the reviewer's list.
#[derive(Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AdminLeaveResponse {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub request: LeaveRequest,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "jane.doe@company.com")]
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<AdminLeaveResponse>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

/// Pagination is opt-in: with neither `page` nor `per_page` given, the
/// reviewer's list returns every matching row.
fn page_window(filter: &LeaveFilter) -> Option<(u64, u64)> {
    if filter.page.is_none() && filter.per_page.is_none() {
        return None;
    }

    let per_page = filter.per_page.unwrap_or(10).clamp(1, 100);
    let page = filter.page.unwrap_or(1).max(1);
    Some((page, per_page))
}

const REASON_MIN_CHARS: usize = 5;
const REASON_MAX_CHARS: usize = 500;

/// Structural validation, performed before any store access.
fn validate_submission(payload: &CreateLeave) -> Result<(), &'static str> {
    if payload.start_date > payload.end_date {
        return Err("start_date cannot be after end_date");
    }

    if let Some(reason) = payload.reason.as_deref() {
        let len = reason.trim().chars().count();
        if len < REASON_MIN_CHARS {
            return Err("Reason must be at least 5 characters");
        }
        if len > REASON_MAX_CHARS {
            return Err("Reason must be at most 500 characters");
        }
    }

    Ok(())
}

async fn fetch_request(
    pool: &MySqlPool,
    leave_id: u64,
) -> Result<Option<LeaveRequest>, sqlx::Error> {
    sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, leave_type, start_date, end_date, reason,
               status, reviewer_id, review_notes, created_at, updated_at
        FROM leave_requests
        WHERE id = ?
        "#,
    )
    .bind(leave_id)
    .fetch_optional(pool)
    .await
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Invalid dates, reason, or insufficient balance"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    if let Err(msg) = validate_submission(&payload) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": msg
        })));
    }

    let balance = sqlx::query_as::<_, LeaveBalance>(
        r#"
        SELECT user_id, sick_leave_balance, paid_leave_balance, casual_leave_balance,
               created_at, updated_at
        FROM leave_balances
        WHERE user_id = ?
        "#,
    )
    .bind(auth.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch leave balance");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let balance = match balance {
        Some(b) => b,
        None => {
            tracing::error!(user_id = auth.user_id, "No leave balance row for user");
            return Err(actix_web::error::ErrorInternalServerError(
                "Could not fetch leave balance",
            ));
        }
    };

    let days = leave_duration(payload.start_date, payload.end_date);

    if !balance.can_cover(payload.leave_type, days) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": format!("Not enough {} leave balance", payload.leave_type.as_str())
        })));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO leave_requests
            (user_id, leave_type, start_date, end_date, reason, status)
        VALUES (?, ?, ?, ?, ?, 'pending')
        "#,
    )
    .bind(auth.user_id)
    .bind(payload.leave_type.as_str())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(payload.reason.as_deref().map(str::trim))
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to create leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let created = fetch_request(pool.get_ref(), inserted.last_insert_id())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch created leave request");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match created {
        Some(request) => Ok(HttpResponse::Created().json(request)),
        None => Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        )),
    }
}

/* =========================
My leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/my",
    responses(
        (status = 200, description = "Caller's leave requests, newest first", body = [LeaveRequest]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn my_leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let requests = sqlx::query_as::<_, LeaveRequest>(
        r#"
        SELECT id, user_id, leave_type, start_date, end_date, reason,
               status, reviewer_id, review_notes, created_at, updated_at
        FROM leave_requests
        WHERE user_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = auth.user_id, "Failed to fetch own leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(requests))
}

/* =========================
All leave requests (Manager/Admin)
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list with requester details", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    // -------------------------
    // Pagination (opt-in)
    // -------------------------
    let window = page_window(&query);

    // -------------------------
    // WHERE clause
    // -------------------------
    let mut where_sql = String::from(" WHERE 1=1");
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(user_id) = query.user_id {
        where_sql.push_str(" AND lr.user_id = ?");
        args.push(FilterValue::U64(user_id));
    }

    if let Some(status) = query.status.as_deref() {
        where_sql.push_str(" AND lr.status = ?");
        args.push(FilterValue::Str(status));
    }

    // -------------------------
    // COUNT query
    // -------------------------
    let count_sql = format!("SELECT COUNT(*) FROM leave_requests lr{}", where_sql);

    let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_q = match arg {
            FilterValue::U64(v) => count_q.bind(*v),
            FilterValue::Str(s) => count_q.bind(*s),
        };
    }

    let total = count_q.fetch_one(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to count leave requests");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // -------------------------
    // DATA query
    // -------------------------
    let mut data_sql = format!(
        r#"
        SELECT lr.id, lr.user_id, lr.leave_type, lr.start_date, lr.end_date, lr.reason,
               lr.status, lr.reviewer_id, lr.review_notes, lr.created_at, lr.updated_at,
               u.full_name, u.email
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        {}
        ORDER BY lr.created_at DESC
        "#,
        where_sql
    );

    if window.is_some() {
        data_sql.push_str(" LIMIT ? OFFSET ?");
    }

    let mut data_q = sqlx::query_as::<_, AdminLeaveResponse>(&data_sql);
    for arg in args {
        data_q = match arg {
            FilterValue::U64(v) => data_q.bind(v),
            FilterValue::Str(s) => data_q.bind(s),
        };
    }

    if let Some((page, per_page)) = window {
        data_q = data_q.bind(per_page).bind((page - 1) * per_page);
    }

    let leaves = data_q.fetch_all(pool.get_ref()).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch leave list");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (page, per_page) = match window {
        Some((page, per_page)) => (page as u32, per_page as u32),
        None => (1, leaves.len() as u32),
    };

    let response = LeaveListResponse {
        data: leaves,
        page,
        per_page,
        total,
    };

    Ok(HttpResponse::Ok().json(response))
}

/* =========================
Single leave request
========================= */
#[utoipa::path(
    get,
    path = "/api/v1/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let leave = fetch_request(pool.get_ref(), leave_id).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match leave {
        Some(request) => {
            // Visible to its owner and to reviewers only
            if request.user_id != auth.user_id {
                auth.require_reviewer()?;
            }
            Ok(HttpResponse::Ok().json(request))
        }
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave request not found"
        }))),
    }
}

/* =========================
Review leave (Manager/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/v1/leave/{leave_id}/review",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to review")
    ),
    request_body(
        content = ReviewLeave,
        description = "Decision and optional notes",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request reviewed", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Already reviewed or insufficient balance", body = Object, example = json!({
            "message": "Leave request already reviewed"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn review_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<ReviewLeave>,
) -> actix_web::Result<impl Responder> {
    auth.require_reviewer()?;

    let leave_id = path.into_inner();

    let mut tx = pool.begin().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to open review transaction");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Lock the row so the status check, the balance decrement and the
    // transition commit or roll back as one unit.
    let row = sqlx::query_as::<_, (u64, String, NaiveDate, NaiveDate, String)>(
        r#"
        SELECT user_id, leave_type, start_date, end_date, status
        FROM leave_requests
        WHERE id = ?
        FOR UPDATE
        "#,
    )
    .bind(leave_id)
    .fetch_optional(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to lock leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let (user_id, leave_type, start_date, end_date, status) = match row {
        Some(r) => r,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Leave request not found"
            })));
        }
    };

    match LeaveStatus::parse(&status) {
        Some(LeaveStatus::Pending) => {}
        Some(s) if s.is_terminal() => {
            return Ok(HttpResponse::Conflict().json(serde_json::json!({
                "message": "Leave request already reviewed"
            })));
        }
        _ => {
            tracing::error!(leave_id, %status, "Unknown leave status in store");
            return Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ));
        }
    }

    // Approval spends the days: decrement only if the bucket still covers
    // the request, in the same transaction as the status change.
    if payload.decision == ReviewDecision::Approved {
        let leave_type = LeaveType::parse(&leave_type).ok_or_else(|| {
            tracing::error!(leave_id, %leave_type, "Unknown leave type in store");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

        let days = leave_duration(start_date, end_date);
        let column = leave_type.balance_column();

        let decrement_sql = format!(
            "UPDATE leave_balances SET {col} = {col} - ? WHERE user_id = ? AND {col} >= ?",
            col = column
        );

        let decremented = sqlx::query(&decrement_sql)
            .bind(days)
            .bind(user_id)
            .bind(days)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, leave_id, "Failed to decrement leave balance");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

        if decremented.rows_affected() == 0 {
            tx.rollback().await.map_err(|e| {
                tracing::error!(error = %e, leave_id, "Failed to roll back review");
                actix_web::error::ErrorInternalServerError("Internal Server Error")
            })?;

            return Ok(HttpResponse::Conflict().json(serde_json::json!({
                "message": format!("Not enough {} leave balance", leave_type.as_str())
            })));
        }
    }

    let updated = sqlx::query(
        r#"
        UPDATE leave_requests
        SET status = ?, reviewer_id = ?, review_notes = ?, updated_at = NOW()
        WHERE id = ?
        AND status = 'pending'
        "#,
    )
    .bind(payload.decision.status().as_str())
    .bind(auth.user_id)
    .bind(payload.notes.as_deref())
    .bind(leave_id)
    .execute(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to update leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    if updated.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(serde_json::json!({
            "message": "Leave request already reviewed"
        })));
    }

    tx.commit().await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to commit review");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let reviewed = fetch_request(pool.get_ref(), leave_id).await.map_err(|e| {
        tracing::error!(error = %e, leave_id, "Failed to fetch reviewed leave request");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    match reviewed {
        Some(request) => Ok(HttpResponse::Ok().json(request)),
        None => Err(actix_web::error::ErrorInternalServerError(
            "Internal Server Error",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn payload(start: NaiveDate, end: NaiveDate, reason: Option<&str>) -> CreateLeave {
        CreateLeave {
            leave_type: LeaveType::Paid,
            start_date: start,
            end_date: end,
            reason: reason.map(str::to_string),
        }
    }

    #[test]
    fn end_before_start_is_rejected() {
        let p = payload(date(2024, 8, 3), date(2024, 8, 1), None);
        assert!(validate_submission(&p).is_err());
    }

    #[test]
    fn single_day_request_is_valid() {
        let p = payload(date(2024, 8, 1), date(2024, 8, 1), None);
        assert!(validate_submission(&p).is_ok());
    }

    #[test]
    fn reason_shorter_than_five_chars_is_rejected() {
        let p = payload(date(2024, 8, 1), date(2024, 8, 2), Some("sick"));
        assert!(validate_submission(&p).is_err());
    }

    #[test]
    fn reason_bounds_are_inclusive() {
        let p = payload(date(2024, 8, 1), date(2024, 8, 2), Some("moved"));
        assert!(validate_submission(&p).is_ok());

        let long = "x".repeat(500);
        let p = payload(date(2024, 8, 1), date(2024, 8, 2), Some(&long));
        assert!(validate_submission(&p).is_ok());

        let too_long = "x".repeat(501);
        let p = payload(date(2024, 8, 1), date(2024, 8, 2), Some(&too_long));
        assert!(validate_submission(&p).is_err());
    }

    #[test]
    fn missing_reason_is_accepted() {
        let p = payload(date(2024, 8, 1), date(2024, 8, 2), None);
        assert!(validate_submission(&p).is_ok());
    }

    fn filter(page: Option<u64>, per_page: Option<u64>) -> LeaveFilter {
        LeaveFilter {
            user_id: None,
            status: None,
            page,
            per_page,
        }
    }

    #[test]
    fn absent_pagination_params_mean_all_rows() {
        assert_eq!(page_window(&filter(None, None)), None);
    }

    #[test]
    fn either_pagination_param_opts_in() {
        assert_eq!(page_window(&filter(Some(2), None)), Some((2, 10)));
        assert_eq!(page_window(&filter(None, Some(25))), Some((1, 25)));
        assert_eq!(page_window(&filter(Some(3), Some(50))), Some((3, 50)));
    }

    #[test]
    fn pagination_params_are_clamped() {
        assert_eq!(page_window(&filter(Some(0), Some(0))), Some((1, 1)));
        assert_eq!(page_window(&filter(Some(1), Some(1000))), Some((1, 100)));
    }

    #[test]
    fn decision_maps_to_terminal_status() {
        assert_eq!(ReviewDecision::Approved.status(), LeaveStatus::Approved);
        assert_eq!(ReviewDecision::Rejected.status(), LeaveStatus::Rejected);
        assert!(ReviewDecision::Approved.status().is_terminal());
        assert!(ReviewDecision::Rejected.status().is_terminal());
    }
}
