use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct RoleResponse {
    #[schema(example = "manager")]
    pub role: String,
    #[schema(example = true)]
    pub is_reviewer: bool,
}

/// Caller's role assignment and derived reviewer capability
#[utoipa::path(
    get,
    path = "/api/v1/me/role",
    responses(
        (status = 200, description = "Caller's role", body = RoleResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Me"
)]
pub async fn my_role(auth: AuthUser) -> actix_web::Result<impl Responder> {
    Ok(HttpResponse::Ok().json(RoleResponse {
        role: auth.role.as_str().to_string(),
        is_reviewer: auth.role.is_reviewer(),
    }))
}
