use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;
use std::time::Duration;

use backoffice_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{
        DpayClient, HttpBlobStore, NoopPublisher, OptimumPayClient, PusherClient, Qbet88Client,
        RealtimePublisher,
    },
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::{InMemoryRateLimiter, JwtService},
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // load configuration
    let config = Config::from_toml().expect("Failed to load configuration file");

    // database pool
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // migrations
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.session_expires_in);

    // outbound clients
    let pusher = config
        .pusher
        .is_enabled()
        .then(|| PusherClient::new(config.pusher.clone()));
    let publisher: Arc<dyn RealtimePublisher> = match &pusher {
        Some(client) => Arc::new(client.clone()),
        None => {
            log::warn!("Pusher is not configured; realtime events are dropped");
            Arc::new(NoopPublisher)
        }
    };
    let ledger = Arc::new(Qbet88Client::new(config.qbet88.clone()));
    let dpay = Arc::new(DpayClient::new(config.dpay.clone()));
    let optimum_pay = Arc::new(OptimumPayClient::new(config.optimum_pay.clone()));
    let blob_store = Arc::new(HttpBlobStore::new(config.blob.clone()));
    let rate_limiter = Arc::new(InMemoryRateLimiter::new(
        config.rate_limit.max_requests,
        Duration::from_secs(config.rate_limit.window_secs),
    ));

    // services
    let notifier = RealtimeNotifier::new(publisher);
    let casino_group_service = CasinoGroupService::new(pool.clone());
    let notification_service = NotificationService::new(pool.clone(), notifier.clone());
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    let account_service = AccountService::new(pool.clone());
    let ticket_service = TicketService::new(
        pool.clone(),
        casino_group_service.clone(),
        notifier.clone(),
        blob_store,
        config.tickets.strict_status_validation,
    );
    let transaction_request_service = TransactionRequestService::new(
        pool.clone(),
        casino_group_service.clone(),
        notifier.clone(),
        ledger.clone(),
        rate_limiter,
    );
    let payment_service = PaymentService::new(
        pool.clone(),
        casino_group_service.clone(),
        dpay,
        optimum_pay,
        ledger.clone(),
        notification_service.clone(),
    );
    let ledger_service = LedgerService::new(ledger, config.qbet88.internal_api_key.clone());
    let attendance_service = AttendanceService::new(pool.clone());
    let ready_check_service = ReadyCheckService::new(pool.clone(), notifier.clone());
    let group_chat_service = GroupChatService::new(pool.clone());
    let channel_auth_service = ChannelAuthService::new(pusher);

    // background tasks
    tasks::spawn_all(payment_service.clone());

    let session_config = config.session.clone();

    // HTTP server
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(
                jwt_service.clone(),
                session_config.cookie_name.clone(),
            ))
            .app_data(web::Data::new(session_config.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(account_service.clone()))
            .app_data(web::Data::new(casino_group_service.clone()))
            .app_data(web::Data::new(ticket_service.clone()))
            .app_data(web::Data::new(transaction_request_service.clone()))
            .app_data(web::Data::new(payment_service.clone()))
            .app_data(web::Data::new(ledger_service.clone()))
            .app_data(web::Data::new(attendance_service.clone()))
            .app_data(web::Data::new(ready_check_service.clone()))
            .app_data(web::Data::new(notification_service.clone()))
            .app_data(web::Data::new(group_chat_service.clone()))
            .app_data(web::Data::new(channel_auth_service.clone()))
            .route("/health", web::get().to(handlers::health))
            .configure(swagger_config)
            .service(
                web::scope("/api")
                    .configure(handlers::auth_config)
                    .configure(handlers::account_config)
                    .configure(handlers::casino_group_config)
                    .configure(handlers::ticket_config)
                    .configure(handlers::transaction_request_config)
                    .configure(handlers::dpay_config)
                    .configure(handlers::optimum_pay_config)
                    .configure(handlers::qbet88_config)
                    .configure(handlers::attendance_config)
                    .configure(handlers::ready_check_config)
                    .configure(handlers::notification_config)
                    .configure(handlers::group_chat_config)
                    .configure(handlers::realtime_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
