//! Application wiring: collaborator construction and the router.

pub mod errors;
pub mod routes;

use std::sync::Arc;

use axum::routing::get;
use axum::{Extension, Router};
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;

use gatehouse_accounts::{
    AccountLifecycle, AccountStore, AuditLogReader, Hs256VerificationTokens, Notifier,
};
use gatehouse_auth::Hs256JwtValidator;
use gatehouse_infra::{
    InMemoryAccountStore, InMemoryAuditLog, PostgresAccountStore, PostgresAuditLogReader,
    SmtpNotifier, TracingNotifier,
};

use crate::config::AppConfig;
use crate::middleware::{AuthState, auth_middleware};

pub struct AppServices {
    pub lifecycle: AccountLifecycle,
}

pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(build_services(config).await?);
    Ok(build_router(services, &config.jwt_secret))
}

async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let (store, audit): (Arc<dyn AccountStore>, Arc<dyn AuditLogReader>) =
        if config.use_persistent_stores {
            let url = config.database_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("USE_PERSISTENT_STORES is set but DATABASE_URL is not")
            })?;
            let pool = PgPoolOptions::new().max_connections(8).connect(url).await?;
            tracing::info!("using postgres stores");
            (
                Arc::new(PostgresAccountStore::new(pool.clone())),
                Arc::new(PostgresAuditLogReader::new(pool)),
            )
        } else {
            tracing::info!("using in-memory stores");
            (
                Arc::new(InMemoryAccountStore::new()),
                Arc::new(InMemoryAuditLog::new()),
            )
        };

    let notifier: Arc<dyn Notifier> = match &config.smtp {
        Some(smtp) => Arc::new(SmtpNotifier::new(smtp)?),
        None => {
            tracing::info!("SMTP_HOST not set; verification mail will be logged, not sent");
            Arc::new(TracingNotifier)
        }
    };

    let tokens = Arc::new(Hs256VerificationTokens::with_default_ttl(
        config.verify_token_secret.as_bytes(),
    ));

    Ok(AppServices {
        lifecycle: AccountLifecycle::new(store, tokens, notifier, audit, &config.public_base_url),
    })
}

/// Assemble the router. Split out from [`build_app`] so black-box tests can
/// supply their own collaborators.
pub fn build_router(services: Arc<AppServices>, jwt_secret: &str) -> Router {
    let auth_state = AuthState {
        jwt: Arc::new(Hs256JwtValidator::new(jwt_secret.as_bytes())),
    };

    let admin = routes::admin::router().layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/accounts", routes::accounts::router().nest("/admin", admin))
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
