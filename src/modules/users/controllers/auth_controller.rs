use actix_web::{web, HttpResponse};

use crate::core::{response, AppError};
use crate::middleware::{AuthenticatedUser, JwtAuth};
use crate::modules::users::models::{LoginRequest, RegisterRequest};
use crate::modules::users::services::AuthService;

/// POST /auth/register
async fn register(
    service: web::Data<AuthService>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let auth = service.register(request.into_inner()).await?;
    Ok(response::created(auth))
}

/// POST /auth/login
async fn login(
    service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let auth = service.login(request.into_inner()).await?;
    Ok(response::ok(auth))
}

/// POST /auth/refresh
async fn refresh(
    service: web::Data<AuthService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let auth = service.refresh(user.user_id).await?;
    Ok(response::ok(auth))
}

/// Mount the auth routes. Refresh requires a current token.
pub fn configure(cfg: &mut web::ServiceConfig, service: web::Data<AuthService>) {
    let guard = JwtAuth::new(service.tokens().clone());

    cfg.service(
        web::scope("/auth")
            .app_data(service)
            .route("/register", web::post().to(register))
            .route("/login", web::post().to(login))
            .service(
                web::resource("/refresh")
                    .wrap(guard)
                    .route(web::post().to(refresh)),
            ),
    );
}
