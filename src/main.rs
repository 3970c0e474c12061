use std::sync::Arc;

use anyhow::{bail, Context, Result};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use account_server::domains::auth::models::*;
use account_server::domains::auth::services::{AuthState, JwtService};
use account_server::domains::lifecycle::services::{LifecycleScheduler, LifecycleSweeps};
use account_server::routes::create_router;
use account_server::shared::clients::{
    AuditLogger, HttpAuditLogger, HttpMessageSender, HttpProfileDeprovisioner, MessageSender,
    NoopClient, ProfileDeprovisioner, ServiceClients,
};
use account_server::shared::config::{AppConfig, ServiceUrls};
use account_server::shared::database::{Database, TenantStore};
use account_server::shared::logging::init_tracing;
use account_server::shared::middleware::InstanceAllowList;
use account_server::shared::services::AppState;
use account_server::shared::shutdown::shutdown_signal;

// OpenAPI 스키마 정의: Swagger 문서 자동 생성
#[derive(OpenApi)]
#[openapi(
    paths(
        account_server::domains::auth::handlers::auth_handler::validate,
        account_server::domains::auth::handlers::auth_handler::renew,
        account_server::domains::auth::handlers::auth_handler::revoke_all,
        account_server::domains::auth::handlers::auth_handler::signin,
        account_server::domains::auth::handlers::auth_handler::logout
    ),
    components(schemas(
        JwtRequest,
        RefreshJwtRequest,
        RevokeRefreshTokensRequest,
        SigninRequest,
        LogoutRequest,
        TokenResponse,
        TokenInfos,
        ServiceStatus,
        Profile
    )),
    tags(
        (name = "Auth", description = "Token validation, renewal and revocation")
    ),
    info(
        title = "Account Server",
        description = "Credential rotation and account lifecycle service",
        version = "1.0.0"
    )
)]
struct ApiDoc;

// 외부 서비스 클라이언트 구성 (주소 없으면 no-op)
// Build downstream clients; a missing address gets the no-op adapter
fn build_clients(urls: &ServiceUrls) -> Result<ServiceClients> {
    let messaging: Arc<dyn MessageSender> = match &urls.messaging {
        Some(url) => Arc::new(HttpMessageSender::new(url)?),
        None => {
            tracing::warn!("ADDR_MESSAGING_SERVICE not provided, emails will not be sent");
            Arc::new(NoopClient)
        }
    };
    let audit: Arc<dyn AuditLogger> = match &urls.logging {
        Some(url) => Arc::new(HttpAuditLogger::new(url)?),
        None => {
            tracing::warn!("ADDR_LOGGING_SERVICE not provided, audit events will be dropped");
            Arc::new(NoopClient)
        }
    };
    let study: Arc<dyn ProfileDeprovisioner> = match &urls.study {
        Some(url) => Arc::new(HttpProfileDeprovisioner::new(url)?),
        None => {
            tracing::warn!("ADDR_STUDY_SERVICE not provided, can not connect to study service");
            Arc::new(NoopClient)
        }
    };

    Ok(ServiceClients {
        messaging,
        audit,
        study,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env 파일 (있으면)
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(&config.log)?;

    // 서명 키 검증 (잘못되면 시작 거부)
    let jwt_service = JwtService::from_base64(&config.jwt_token_key)
        .context("invalid configuration")?;

    // DB 연결
    let db = Database::new(&config.database_url).await?;
    db.initialize().await?;
    let store: Arc<dyn TenantStore> = Arc::new(db);

    // 인스턴스 목록 (시작 시 한 번)
    let instance_ids: Vec<String> = store
        .get_all_instances()
        .await?
        .into_iter()
        .map(|i| i.instance_id)
        .collect();
    if instance_ids.is_empty() {
        bail!("no instances registered, nothing to serve");
    }
    tracing::info!(instances = ?instance_ids, "loaded instances");

    if !config.lifecycle.inactivity_enabled() {
        tracing::info!("inactivity thresholds not provided, inactive users will be ignored");
    }
    if let Some(weights) = &config.weekday_assignation_weights {
        tracing::debug!(weights = %weights, "weekday assignation weights configured");
    }

    let clients = build_clients(&config.service_urls)?;

    // 종료 신호 채널
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // 생명주기 스케줄러
    let scheduler_handle = if config.disable_timer_task {
        tracing::info!("timer task disabled");
        None
    } else {
        let sweeps = LifecycleSweeps::new(store.clone(), clients.clone(), config.lifecycle);
        let scheduler =
            LifecycleScheduler::new(sweeps, instance_ids.clone(), config.timer_event_frequency);
        Some(scheduler.start(shutdown_rx.clone()))
    };

    // AppState 생성
    let auth_state = AuthState::new(
        store.clone(),
        jwt_service,
        clients.audit.clone(),
        config.token_expiration,
    );
    let app_state = AppState::new(auth_state, InstanceAllowList::new(instance_ids));

    // Router 생성
    let app = Router::new()
        .merge(create_router())
        .merge(SwaggerUi::new("/api").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server running, Swagger UI at /api");

    // 서버 실행 (종료 신호까지)
    let mut server_shutdown = shutdown_rx.clone();
    tokio::spawn(shutdown_signal(shutdown_tx));
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = server_shutdown.wait_for(|stop| *stop).await;
        })
        .await
        .context("server error")?;

    if let Some(handle) = scheduler_handle {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "lifecycle scheduler task failed");
        }
    }

    tracing::info!("shutdown complete");
    Ok(())
}
