use crate::auth::auth::AuthUser;
use crate::model::holiday::Holiday;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateHoliday {
    #[schema(example = "Independence Day")]
    pub name: String,
    #[schema(example = "2024-07-04", format = "date", value_type = String)]
    pub date: NaiveDate,
}

/// All company holidays, earliest first
#[utoipa::path(
    get,
    path = "/api/v1/holiday",
    responses(
        (status = 200, description = "Holidays ordered by date", body = [Holiday]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn holiday_list(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let holidays = sqlx::query_as::<_, Holiday>(
        r#"
        SELECT id, name, date, created_at, updated_at
        FROM holidays
        ORDER BY date ASC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch holidays");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(holidays))
}

/// Create holiday (Admin)
#[utoipa::path(
    post,
    path = "/api/v1/holiday",
    request_body = CreateHoliday,
    responses(
        (status = 201, description = "Holiday created", body = Holiday),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Holiday"
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateHoliday>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let name = payload.name.trim();
    if name.is_empty() {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Holiday name must not be empty"
        })));
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO holidays (name, date)
        VALUES (?, ?)
        "#,
    )
    .bind(name)
    .bind(payload.date)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to create holiday");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let holiday = sqlx::query_as::<_, Holiday>(
        r#"
        SELECT id, name, date, created_at, updated_at
        FROM holidays
        WHERE id = ?
        "#,
    )
    .bind(inserted.last_insert_id())
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch created holiday");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Created().json(holiday))
}
