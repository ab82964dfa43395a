use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{
    LedgerCreditStatus, PaymentGateway, PaymentType, SettlementStatus, TransactionRequestStatus,
    TransactionRequestType, UserRole,
};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::auth::change_password,
        handlers::account::list_accounts,
        handlers::account::create_account,
        handlers::account::update_account,
        handlers::casino_group::list_casino_groups,
        handlers::casino_group::pending_counts,
        handlers::ticket::docs::cashin::list,
        handlers::ticket::docs::cashin::create,
        handlers::ticket::docs::cashin::count_pending,
        handlers::ticket::docs::cashin::get,
        handlers::ticket::docs::cashin::update_status,
        handlers::ticket::docs::cashin::add_thread,
        handlers::ticket::docs::cashout::list,
        handlers::ticket::docs::cashout::create,
        handlers::ticket::docs::cashout::count_pending,
        handlers::ticket::docs::cashout::get,
        handlers::ticket::docs::cashout::update_status,
        handlers::ticket::docs::cashout::add_thread,
        handlers::ticket::docs::commission::list,
        handlers::ticket::docs::commission::create,
        handlers::ticket::docs::commission::count_pending,
        handlers::ticket::docs::commission::get,
        handlers::ticket::docs::commission::update_status,
        handlers::ticket::docs::commission::add_thread,
        handlers::ticket::docs::concern::list,
        handlers::ticket::docs::concern::create,
        handlers::ticket::docs::concern::count_pending,
        handlers::ticket::docs::concern::get,
        handlers::ticket::docs::concern::update_status,
        handlers::ticket::docs::concern::add_thread,
        handlers::ticket::docs::customer_support::list,
        handlers::ticket::docs::customer_support::create,
        handlers::ticket::docs::customer_support::count_pending,
        handlers::ticket::docs::customer_support::get,
        handlers::ticket::docs::customer_support::update_status,
        handlers::ticket::docs::customer_support::add_thread,
        handlers::ticket::docs::remittance::list,
        handlers::ticket::docs::remittance::create,
        handlers::ticket::docs::remittance::count_pending,
        handlers::ticket::docs::remittance::get,
        handlers::ticket::docs::remittance::update_status,
        handlers::ticket::docs::remittance::add_thread,
        handlers::ticket::docs::task::list,
        handlers::ticket::docs::task::create,
        handlers::ticket::docs::task::count_pending,
        handlers::ticket::docs::task::get,
        handlers::ticket::docs::task::update_status,
        handlers::ticket::docs::task::add_thread,
        handlers::ticket::close_cashin_chat,
        handlers::transaction_request::create_transaction_request,
        handlers::transaction_request::list_transaction_requests,
        handlers::transaction_request::update_transaction_request_status,
        handlers::payment::dpay_deposit,
        handlers::payment::dpay_withdraw,
        handlers::payment::dpay_balance,
        handlers::payment::dpay_webhook,
        handlers::payment::list_transactions,
        handlers::payment::list_divergent,
        handlers::payment::retry_credit,
        handlers::payment::optimum_pay_deposit,
        handlers::payment::optimum_pay_withdraw,
        handlers::payment::optimum_pay_webhook,
        handlers::payment::ledger_balance,
        handlers::payment::ledger_gateway,
        handlers::attendance::clock_in,
        handlers::attendance::clock_out,
        handlers::attendance::attendance_status,
        handlers::attendance::attendance_logs,
        handlers::ready_check::create_ready_check,
        handlers::ready_check::list_ready_checks,
        handlers::ready_check::get_ready_check,
        handlers::ready_check::respond_ready_check,
        handlers::ready_check::end_ready_check,
        handlers::notification::list_notifications,
        handlers::notification::create_notification,
        handlers::notification::mark_read,
        handlers::notification::mark_all_read,
        handlers::group_chat::list_group_chats,
        handlers::group_chat::create_group_chat,
        handlers::group_chat::update_group_chat_status,
        handlers::realtime::pusher_auth,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            AccountResponse,
            ChangePasswordRequest,
            CreateAccountRequest,
            UpdateAccountRequest,
            CreateTicketRequest,
            UpdateTicketStatusRequest,
            CountResponse,
            PendingCounts,
            CreateTransactionRequest,
            UpdateTransactionRequestStatus,
            PaymentRequest,
            LedgerBalanceRequest,
            LedgerGatewayRequest,
            ClockInRequest,
            CreateReadyCheckRequest,
            CreateNotificationRequest,
            CreateGroupChatRequest,
            UpdateGroupChatStatusRequest,
            ChannelAuthForm,
            UserRole,
            TransactionRequestType,
            TransactionRequestStatus,
            PaymentGateway,
            PaymentType,
            SettlementStatus,
            LedgerCreditStatus,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check"),
        (name = "auth", description = "Session API"),
        (name = "accounts", description = "Staff account management API"),
        (name = "casino-group", description = "Casino group API"),
        (name = "tickets", description = "Ticket workflow API"),
        (name = "transaction-requests", description = "Player transaction request API"),
        (name = "dpay", description = "Dpay gateway API"),
        (name = "optimum-pay", description = "OptimumPay gateway API"),
        (name = "qbet88", description = "Ledger proxy API"),
        (name = "attendance", description = "Attendance API"),
        (name = "ready-check", description = "Ready check API"),
        (name = "notifications", description = "Notification API"),
        (name = "group-chats", description = "Group chat API"),
        (name = "realtime", description = "Realtime channel auth API"),
    ),
    info(
        title = "Backoffice Backend API",
        version = "1.0.0",
        description = "Casino back-office REST API documentation"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
