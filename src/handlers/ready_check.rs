use crate::middlewares::current_user;
use crate::models::*;
use crate::services::ReadyCheckService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/ready-check",
    tag = "ready-check",
    request_body = CreateReadyCheckRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Ready check started"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn create_ready_check(
    ready_check_service: web::Data<ReadyCheckService>,
    req: HttpRequest,
    request: Option<web::Json<CreateReadyCheckRequest>>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    match ready_check_service.create(&user, request).await {
        Ok(detail) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "readyCheck": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/ready-check",
    tag = "ready-check",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ready checks")
    )
)]
pub async fn list_ready_checks(
    ready_check_service: web::Data<ReadyCheckService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match ready_check_service.list(&user).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "readyChecks": rows
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/ready-check/{id}",
    tag = "ready-check",
    params(("id" = String, Path, description = "Ready check ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ready check detail"),
        (status = 404, description = "Ready check not found")
    )
)]
pub async fn get_ready_check(
    ready_check_service: web::Data<ReadyCheckService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match ready_check_service.detail(&user, &path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "readyCheck": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/ready-check/{id}/respond",
    tag = "ready-check",
    params(("id" = String, Path, description = "Ready check ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Response recorded"),
        (status = 409, description = "Ready check already ended")
    )
)]
pub async fn respond_ready_check(
    ready_check_service: web::Data<ReadyCheckService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match ready_check_service.respond(&user, &path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "readyCheck": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/api/ready-check/{id}/end",
    tag = "ready-check",
    params(("id" = String, Path, description = "Ready check ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Ready check already ended"),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn end_ready_check(
    ready_check_service: web::Data<ReadyCheckService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match ready_check_service.end(&user, &path.into_inner()).await {
        Ok(detail) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "readyCheck": detail
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn ready_check_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/ready-check")
            .route("", web::post().to(create_ready_check))
            .route("", web::get().to(list_ready_checks))
            .route("/{id}", web::get().to(get_ready_check))
            .route("/{id}/respond", web::post().to(respond_ready_check))
            .route("/{id}/end", web::patch().to(end_ready_check)),
    );
}
