use crate::middlewares::current_user;
use crate::models::*;
use crate::services::AccountService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/api/accounts",
    tag = "accounts",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Accounts", body = [AccountResponse]),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_accounts(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match account_service.list(&user).await {
        Ok(accounts) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": accounts
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/accounts",
    tag = "accounts",
    request_body = CreateAccountRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_account(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
    request: web::Json<CreateAccountRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match account_service.create(&user, request.into_inner()).await {
        Ok(account) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": account
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/api/accounts/{id}",
    tag = "accounts",
    params(("id" = String, Path, description = "Account ID")),
    request_body = UpdateAccountRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 404, description = "Account not found")
    )
)]
pub async fn update_account(
    account_service: web::Data<AccountService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateAccountRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match account_service
        .update(&user, &path.into_inner(), request.into_inner())
        .await
    {
        Ok(account) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": account
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn account_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .route("", web::get().to(list_accounts))
            .route("", web::post().to(create_account))
            .route("/{id}", web::patch().to(update_account)),
    );
}
