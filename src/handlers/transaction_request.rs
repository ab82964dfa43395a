use crate::middlewares::current_user;
use crate::models::*;
use crate::services::TransactionRequestService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/transaction-requests",
    tag = "transaction-requests",
    request_body = CreateTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Request created"),
        (status = 400, description = "Invalid request"),
        (status = 429, description = "Too many requests")
    )
)]
pub async fn create_transaction_request(
    service: web::Data<TransactionRequestService>,
    req: HttpRequest,
    request: web::Json<CreateTransactionRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match service.create(&user, request.into_inner()).await {
        Ok(row) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "transactionRequest": row
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/transaction-requests",
    tag = "transaction-requests",
    params(TransactionRequestQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Transaction requests")
    )
)]
pub async fn list_transaction_requests(
    service: web::Data<TransactionRequestService>,
    query: web::Query<TransactionRequestQuery>,
) -> Result<HttpResponse> {
    match service.list(&query).await {
        Ok(rows) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "transactionRequests": rows
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/api/transaction-requests/{id}/status",
    tag = "transaction-requests",
    params(("id" = String, Path, description = "Transaction request ID")),
    request_body = UpdateTransactionRequestStatus,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Status updated"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Transaction request not found"),
        (status = 409, description = "Request already closed")
    )
)]
pub async fn update_transaction_request_status(
    service: web::Data<TransactionRequestService>,
    req: HttpRequest,
    path: web::Path<String>,
    request: web::Json<UpdateTransactionRequestStatus>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match service
        .update_status(&user, &path.into_inner(), request.into_inner())
        .await
    {
        Ok(row) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "transactionRequest": row
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_request_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/transaction-requests")
            .route("", web::post().to(create_transaction_request))
            .route("", web::get().to(list_transaction_requests))
            .route("/{id}/status", web::patch().to(update_transaction_request_status)),
    );
}
