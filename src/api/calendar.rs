use crate::auth::auth::AuthUser;
use crate::model::holiday::Holiday;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use utoipa::ToSchema;

/// One approved absence overlapping the requested day.
#[derive(Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CalendarLeave {
    pub id: u64,
    pub user_id: u64,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "paid", value_type = String)]
    pub leave_type: String,
    #[schema(example = "2024-08-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2024-08-03", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct CalendarDayResponse {
    #[schema(example = "2024-08-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub holiday: Option<Holiday>,
    pub leaves: Vec<CalendarLeave>,
}

/// Calendar projection for one day: the holiday falling on it, if any,
/// plus every approved leave whose interval contains it.
#[utoipa::path(
    get,
    path = "/api/v1/calendar/{date}",
    params(
        ("date" = String, Path, description = "Calendar day, YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Holiday and approved absences on that day", body = CalendarDayResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Calendar"
)]
pub async fn calendar_day(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<NaiveDate>,
) -> actix_web::Result<impl Responder> {
    let day = path.into_inner();

    let holiday = sqlx::query_as::<_, Holiday>(
        r#"
        SELECT id, name, date, created_at, updated_at
        FROM holidays
        WHERE date = ?
        "#,
    )
    .bind(day)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, %day, "Failed to fetch holiday for day");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    // Only approved requests show on the calendar; every overlapping one
    // is returned, not just the first.
    let leaves = sqlx::query_as::<_, CalendarLeave>(
        r#"
        SELECT lr.id, lr.user_id, u.full_name, lr.leave_type, lr.start_date, lr.end_date
        FROM leave_requests lr
        JOIN users u ON u.id = lr.user_id
        WHERE lr.status = 'approved'
        AND ? BETWEEN lr.start_date AND lr.end_date
        ORDER BY lr.start_date ASC, lr.id ASC
        "#,
    )
    .bind(day)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, %day, "Failed to fetch approved leaves for day");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(CalendarDayResponse {
        date: day,
        holiday,
        leaves,
    }))
}
