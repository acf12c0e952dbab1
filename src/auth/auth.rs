use crate::config::Config;
use crate::{
    model::role::Role,
    models::{Claims, TokenType},
};
use actix_web::{FromRequest, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};
use jsonwebtoken::decode;
use jsonwebtoken::{DecodingKey, Validation};

/// The acting identity, resolved from the bearer token. Every protected
/// handler takes this as an explicit argument instead of reaching into
/// ambient session state.
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(actix_web::error::ErrorInternalServerError(
                    "Config missing",
                )));
            }
        };

        let data = match decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        ) {
            Ok(d) => d,
            Err(_) => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        // Refresh tokens are only good for /auth/refresh and /auth/logout;
        // revocation is never consulted on this path.
        if data.claims.token_type != TokenType::Access {
            return ready(Err(ErrorUnauthorized("Invalid token type")));
        }

        let role = match Role::from_id(data.claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: data.claims.user_id,
            email: data.claims.sub,
            role,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    /// Gate for approve/reject operations. Enforced inside the review
    /// handler itself, not left to route wiring.
    pub fn require_reviewer(&self) -> actix_web::Result<()> {
        if self.role.is_reviewer() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Manager/Admin only"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{generate_access_token, generate_refresh_token};
    use actix_web::test::TestRequest;

    fn test_config() -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            server_addr: String::new(),
            access_token_ttl: 900,
            refresh_token_ttl: 604800,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_protected_per_min: 1000,
            api_prefix: "/api".to_string(),
            default_sick_leave_days: 10,
            default_paid_leave_days: 20,
            default_casual_leave_days: 5,
        }
    }

    async fn extract(token: &str, config: Config) -> Result<AuthUser, actix_web::Error> {
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {}", token)))
            .app_data(Data::new(config))
            .to_http_request();
        AuthUser::from_request(&req, &mut actix_web::dev::Payload::None).await
    }

    #[actix_web::test]
    async fn access_token_yields_auth_user() {
        let config = test_config();
        let token = generate_access_token(
            7,
            "jane.doe@company.com".to_string(),
            Role::Manager as u8,
            &config.jwt_secret,
            config.access_token_ttl,
        );

        let user = extract(&token, config).await.unwrap();
        assert_eq!(user.user_id, 7);
        assert_eq!(user.email, "jane.doe@company.com");
        assert!(user.role.is_reviewer());
    }

    #[actix_web::test]
    async fn refresh_token_is_rejected_for_api_access() {
        let config = test_config();
        let (token, _) = generate_refresh_token(
            7,
            "jane.doe@company.com".to_string(),
            Role::Employee as u8,
            &config.jwt_secret,
            config.refresh_token_ttl,
        );

        assert!(extract(&token, config).await.is_err());
    }

    #[actix_web::test]
    async fn missing_bearer_token_is_rejected() {
        let req = TestRequest::default()
            .app_data(Data::new(test_config()))
            .to_http_request();

        let result = AuthUser::from_request(&req, &mut actix_web::dev::Payload::None).await;
        assert!(result.is_err());
    }
}
