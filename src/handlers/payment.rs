//! Payment-gateway proxies (Dpay, OptimumPay), their webhook receivers and
//! the server-to-server ledger routes.

use crate::entities::{PaymentGateway, PaymentType};
use crate::error::AppError;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{LedgerService, PaymentService, dropped_webhook_line};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::{Value, json};

fn admin_user(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    let user = current_user(req)?;
    if !user.is_admin() {
        return Err(AppError::Forbidden);
    }
    Ok(user)
}

async fn initiate(
    payment_service: &PaymentService,
    gateway: PaymentGateway,
    payment_type: PaymentType,
    user: &CurrentUser,
    request: PaymentRequest,
) -> Result<HttpResponse> {
    match payment_service
        .initiate(gateway, payment_type, Some(user), request)
        .await
    {
        Ok(body) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": body
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

async fn receive_webhook(
    payment_service: &PaymentService,
    gateway: PaymentGateway,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!(
                "{}",
                dropped_webhook_line(gateway, &e.to_string(), &String::from_utf8_lossy(&body))
            );
            return Ok(AppError::ValidationError("Invalid webhook body".to_string()).error_response());
        }
    };
    match payment_service.handle_webhook(gateway, payload).await {
        Ok(row) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "status": row.status,
            "qbetStatus": row.qbet_status
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/dpay/deposit",
    tag = "dpay",
    request_body = PaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Accepted by gateway, raw gateway body returned"),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "Gateway unavailable")
    )
)]
pub async fn dpay_deposit(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    initiate(
        &payment_service,
        PaymentGateway::Dpay,
        PaymentType::Deposit,
        &user,
        request.into_inner(),
    )
    .await
}

#[utoipa::path(
    post,
    path = "/api/dpay/withdraw",
    tag = "dpay",
    request_body = PaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Accepted by gateway"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn dpay_withdraw(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse> {
    let user = match admin_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    initiate(
        &payment_service,
        PaymentGateway::Dpay,
        PaymentType::Withdraw,
        &user,
        request.into_inner(),
    )
    .await
}

#[utoipa::path(
    get,
    path = "/api/dpay/balance",
    tag = "dpay",
    params(GatewayBalanceQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Merchant balance"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn dpay_balance(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    query: web::Query<GatewayBalanceQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = admin_user(&req) {
        return Ok(e.error_response());
    }
    match payment_service
        .balance(PaymentGateway::Dpay, &query.casino_group)
        .await
    {
        Ok(body) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": body
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

/// Gateway callback. Unauthenticated; the raw body is always stored.
#[utoipa::path(
    post,
    path = "/api/dpay/webhook",
    tag = "dpay",
    responses(
        (status = 200, description = "Webhook processed"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn dpay_webhook(
    payment_service: web::Data<PaymentService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    receive_webhook(&payment_service, PaymentGateway::Dpay, body).await
}

#[utoipa::path(
    get,
    path = "/api/dpay/transactions",
    tag = "dpay",
    params(PaymentTransactionQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Payment transactions"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_transactions(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    query: web::Query<PaymentTransactionQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = admin_user(&req) {
        return Ok(e.error_response());
    }
    match payment_service.list(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/dpay/divergent",
    tag = "dpay",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Settled transactions missing a ledger credit"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_divergent(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Err(e) = admin_user(&req) {
        return Ok(e.error_response());
    }
    match payment_service.divergent().await {
        Ok(rows) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": rows
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/dpay/transactions/{id}/retry-credit",
    tag = "dpay",
    params(("id" = String, Path, description = "Transaction ID")),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Credit retried"),
        (status = 409, description = "Ledger credited")
    )
)]
pub async fn retry_credit(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let user = match admin_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let id = path.into_inner();
    log::info!("{} retries ledger credit for {id}", user.username);
    match payment_service.retry_credit(&id).await {
        Ok(row) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": row
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/optimum-pay/deposit",
    tag = "optimum-pay",
    request_body = PaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Accepted by gateway"),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn optimum_pay_deposit(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    initiate(
        &payment_service,
        PaymentGateway::OptimumPay,
        PaymentType::Deposit,
        &user,
        request.into_inner(),
    )
    .await
}

#[utoipa::path(
    post,
    path = "/api/optimum-pay/withdraw",
    tag = "optimum-pay",
    request_body = PaymentRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Accepted by gateway"),
        (status = 403, description = "Admin only")
    )
)]
pub async fn optimum_pay_withdraw(
    payment_service: web::Data<PaymentService>,
    req: HttpRequest,
    request: web::Json<PaymentRequest>,
) -> Result<HttpResponse> {
    let user = match admin_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    initiate(
        &payment_service,
        PaymentGateway::OptimumPay,
        PaymentType::Withdraw,
        &user,
        request.into_inner(),
    )
    .await
}

#[utoipa::path(
    post,
    path = "/api/optimum-pay/webhook",
    tag = "optimum-pay",
    responses(
        (status = 200, description = "Webhook processed")
    )
)]
pub async fn optimum_pay_webhook(
    payment_service: web::Data<PaymentService>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    receive_webhook(&payment_service, PaymentGateway::OptimumPay, body).await
}

fn api_key(req: &HttpRequest) -> Option<&str> {
    req.headers().get("x-api-key").and_then(|v| v.to_str().ok())
}

#[utoipa::path(
    post,
    path = "/api/qbet88/balance",
    tag = "qbet88",
    request_body = LedgerBalanceRequest,
    responses(
        (status = 200, description = "Ledger balance"),
        (status = 401, description = "Invalid API key")
    )
)]
pub async fn ledger_balance(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
    request: web::Json<LedgerBalanceRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = ledger_service.authorize(api_key(&req)) {
        return Ok(e.error_response());
    }
    match ledger_service.balance(&request).await {
        Ok(body) => Ok(HttpResponse::Ok().json(body)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/qbet88/gateway",
    tag = "qbet88",
    request_body = LedgerGatewayRequest,
    responses(
        (status = 200, description = "Raw ledger response"),
        (status = 401, description = "Invalid API key")
    )
)]
pub async fn ledger_gateway(
    ledger_service: web::Data<LedgerService>,
    req: HttpRequest,
    request: web::Json<LedgerGatewayRequest>,
) -> Result<HttpResponse> {
    if let Err(e) = ledger_service.authorize(api_key(&req)) {
        return Ok(e.error_response());
    }
    match ledger_service.call(request.into_inner()).await {
        Ok(body) => Ok(HttpResponse::Ok().json(body)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn dpay_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dpay")
            .route("/deposit", web::post().to(dpay_deposit))
            .route("/withdraw", web::post().to(dpay_withdraw))
            .route("/balance", web::get().to(dpay_balance))
            .route("/webhook", web::post().to(dpay_webhook))
            .route("/transactions", web::get().to(list_transactions))
            .route("/transactions/{id}/retry-credit", web::post().to(retry_credit))
            .route("/divergent", web::get().to(list_divergent)),
    );
}

pub fn optimum_pay_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/optimum-pay")
            .route("/deposit", web::post().to(optimum_pay_deposit))
            .route("/withdraw", web::post().to(optimum_pay_withdraw))
            .route("/webhook", web::post().to(optimum_pay_webhook)),
    );
}

pub fn qbet88_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/qbet88")
            .route("/balance", web::post().to(ledger_balance))
            .route("/gateway", web::post().to(ledger_gateway)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middlewares::AuthMiddleware;
    use crate::test_support::FakeLedger;
    use crate::utils::JwtService;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use std::sync::Arc;

    #[actix_web::test]
    async fn test_ledger_routes_need_api_key_not_session() {
        let ledger = LedgerService::new(Arc::new(FakeLedger::with_code(0)), "k-1".into());
        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(JwtService::new("secret", 3600), "session"))
                .app_data(web::Data::new(ledger))
                .service(web::scope("/api").configure(qbet88_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/qbet88/balance")
            .set_json(json!({"member": "player-1"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/qbet88/balance")
            .insert_header(("x-api-key", "k-1"))
            .set_json(json!({"member": "player-1"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["member"], "player-1");
    }
}
