use crate::auth::auth::AuthUser;
use crate::model::leave_balance::LeaveBalance;
use actix_web::{HttpResponse, Responder, web};
use sqlx::MySqlPool;

/// Current balance snapshot for the caller
#[utoipa::path(
    get,
    path = "/api/v1/balance",
    responses(
        (status = 200, description = "Caller's leave balance", body = LeaveBalance),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No balance record", body = Object, example = json!({
            "message": "Leave balance not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn my_balance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
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

    match balance {
        Some(b) => Ok(HttpResponse::Ok().json(b)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Leave balance not found"
        }))),
    }
}
