use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::from_fn, web};
use dotenvy::dotenv;
use tracing::info;

use leadgate::attribution::AttributionStore;
use leadgate::capture::{CaptureSink, HttpCaptureSink, LeadJournal};
use leadgate::cli;
use leadgate::config::{get_config, init_config};
use leadgate::funnel::{FunnelDeps, FunnelManager};
use leadgate::middleware::{AdminMiddleware, HealthMiddleware};
use leadgate::orchestrator::Orchestrator;
use leadgate::publish_event;
use leadgate::services::{AdminService, AppStartTime, CaptureService, HealthService};
use leadgate::session::SessionRegistry;
use leadgate::system::event::{Event, EventType};
use leadgate::system::init_logging;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 记录程序启动时间
    let app_start_time = AppStartTime {
        start_datetime: chrono::Utc::now(),
    };

    let args: Vec<String> = env::args().collect();
    dotenv().ok();
    init_config();

    // CLI Mode
    if args.len() > 1 {
        cli::run_cli().await;
        return Ok(());
    }

    // Server Mode
    let config = get_config();
    let _log_guard = init_logging(config);

    // 组装共享状态（显式注入，不走环境全局）
    let attribution = Arc::new(AttributionStore::new(&config.attribution));
    let sessions = Arc::new(SessionRegistry::new());
    let journal = Arc::new(LeadJournal::new(&config.journal.file));
    let sink: Arc<dyn CaptureSink> = Arc::new(HttpCaptureSink::new(
        &config.capture.endpoint,
        config.capture.timeout_secs,
    ));
    let orchestrator = Arc::new(Orchestrator::new(config.triggers.clone()));
    let funnel = Arc::new(FunnelManager::new(FunnelDeps {
        sink,
        journal: journal.clone(),
        sessions: sessions.clone(),
        attribution: attribution.clone(),
        strict: config.capture.strict,
        default_source: config.capture.default_source.clone(),
    }));

    info!("Forwarding accepted leads to {}", config.capture.endpoint);
    if config.capture.strict {
        info!("Strict delivery mode enabled: CRM failures will surface to callers");
    }

    // 检查 Admin API 是否启用
    if config.api.admin_token.is_empty() {
        info!("Admin API is disabled (ADMIN_TOKEN not set)");
    } else {
        info!("Admin API available at: {}", config.api.admin_prefix);
    }

    // 检查 Health API 是否启用
    if config.api.health_token.is_empty() {
        info!("Health API is disabled (HEALTH_TOKEN is empty)");
    } else {
        info!("Health API available at: {}", config.api.health_prefix);
    }

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    publish_event!(Event::system_event(
        EventType::SystemStartup,
        "leadgate server starting",
        "main"
    ));

    let admin_prefix = config.api.admin_prefix.clone();
    let health_prefix = config.api.health_prefix.clone();

    // Start the HTTP server
    HttpServer::new(move || {
        // 微站前端跨域调用采集入口
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "OPTIONS"])
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(attribution.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(journal.clone()))
            .app_data(web::Data::new(orchestrator.clone()))
            .app_data(web::Data::new(funnel.clone()))
            .app_data(web::Data::new(app_start_time.clone()))
            .service(
                web::scope("/v1")
                    .wrap(cors)
                    .route("/track", web::post().to(CaptureService::track))
                    .route("/leads", web::post().to(CaptureService::submit_lead))
                    .route("/funnel/advance", web::post().to(CaptureService::funnel_advance))
                    .route("/funnel/back", web::post().to(CaptureService::funnel_back))
                    .route("/triggers", web::post().to(CaptureService::evaluate_trigger))
                    .route("/triggers/dismiss", web::post().to(CaptureService::dismiss_surface)),
            )
            .service(
                web::scope(&admin_prefix)
                    .wrap(from_fn(AdminMiddleware::admin_auth))
                    .route("/leads", web::get().to(AdminService::get_leads))
                    .route("/leads/export", web::get().to(AdminService::export_leads)),
            )
            .service(
                web::scope(&health_prefix)
                    .wrap(from_fn(HealthMiddleware::health_auth))
                    .route("", web::get().to(HealthService::health_check))
                    .route("/ready", web::get().to(HealthService::readiness_check))
                    .route("/live", web::get().to(HealthService::liveness_check)),
            )
    })
    .workers(config.server.cpu_count)
    .bind(bind_address)?
    .run()
    .await?;

    Ok(())
}
