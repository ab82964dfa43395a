use crate::middlewares::current_user;
use crate::models::*;
use crate::services::AttendanceService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    post,
    path = "/api/attendance/clock-in",
    tag = "attendance",
    request_body = ClockInRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Clocked in"),
        (status = 409, description = "Already clocked in")
    )
)]
pub async fn clock_in(
    attendance_service: web::Data<AttendanceService>,
    req: HttpRequest,
    request: Option<web::Json<ClockInRequest>>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    let ip = req
        .connection_info()
        .realip_remote_addr()
        .map(str::to_string);
    let request = request.map(|r| r.into_inner()).unwrap_or_default();
    match attendance_service.clock_in(&user, request, ip).await {
        Ok(attendance) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "attendance": attendance
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/attendance/clock-out",
    tag = "attendance",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Clocked out"),
        (status = 409, description = "Not clocked in")
    )
)]
pub async fn clock_out(
    attendance_service: web::Data<AttendanceService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match attendance_service.clock_out(&user).await {
        Ok(attendance) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "attendance": attendance
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/attendance/status",
    tag = "attendance",
    params(AttendanceQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Current clock-in status"),
        (status = 403, description = "Cannot view another user's status")
    )
)]
pub async fn attendance_status(
    attendance_service: web::Data<AttendanceService>,
    req: HttpRequest,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match attendance_service
        .status(&user, query.user_id.as_deref())
        .await
    {
        Ok(status) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": status
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/attendance/logs",
    tag = "attendance",
    params(AttendanceQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Attendance logs")
    )
)]
pub async fn attendance_logs(
    attendance_service: web::Data<AttendanceService>,
    req: HttpRequest,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse> {
    let user = match current_user(&req) {
        Ok(user) => user,
        Err(e) => return Ok(e.error_response()),
    };
    match attendance_service.logs(&user, &query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "data": page
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn attendance_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            .route("/clock-in", web::post().to(clock_in))
            .route("/clock-out", web::post().to(clock_out))
            .route("/status", web::get().to(attendance_status))
            .route("/logs", web::get().to(attendance_logs)),
    );
}
