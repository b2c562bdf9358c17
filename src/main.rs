use actix_web::{web, App, HttpServer, middleware::Compress};
use actix_cors::Cors;
use anyhow::Context;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::EnvFilter;
use tracing_actix_web::TracingLogger;

use instafeed::auth::TokenVerifier;
use instafeed::config::AppConfig;
use instafeed::openapi::ApiDoc;
use instafeed::repo::Repo;
use instafeed::{config, AppState, SecurityHeaders};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load .env automatically only in debug builds; deployments set the environment themselves.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Bootstrapping instafeed server");

    let cfg = AppConfig::from_env().context("invalid configuration")?;
    let verifier = TokenVerifier::new(&cfg.token_key, cfg.token_issuer.as_deref())
        .context("failed to build auth token verifier")?;
    info!("Frontend URL: {}", cfg.frontend_url);
    info!("Image origin: {}", cfg.image_origin.as_deref().unwrap_or("(same origin)"));

    let repo = build_repo(&cfg).await?;
    let state = web::Data::new(AppState { repo });
    let verifier = web::Data::new(verifier);
    let security = SecurityHeaders::from_config(&cfg);
    let openapi = ApiDoc::openapi();
    info!("OpenAPI spec generated");

    let frontend_url = cfg.frontend_url.clone();
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_url)
            // local Next.js / Vite dev servers
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
            .allow_any_header()
            .allowed_methods(["GET", "POST", "DELETE", "OPTIONS"])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(security.clone())
            .wrap(cors)
            .app_data(state.clone())
            .app_data(verifier.clone())
            .configure(config)
            .service(SwaggerUi::new("/docs/{_:.*}").url("/docs/openapi.json", openapi.clone()))
    })
    .bind((cfg.bind_addr.as_str(), cfg.port))?;

    info!("Listening on http://{}:{}", cfg.bind_addr, cfg.port);

    server.run().await?;
    Ok(())
}

/// Postgres when `DATABASE_URL` is set, otherwise the in-memory store.
async fn build_repo(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Repo>> {
    if let Some(repo) = postgres_repo(cfg).await? {
        return Ok(repo);
    }
    fallback_repo(cfg)
}

#[cfg(feature = "postgres-store")]
async fn postgres_repo(cfg: &AppConfig) -> anyhow::Result<Option<Arc<dyn Repo>>> {
    use sqlx::postgres::PgPoolOptions;
    let Some(db_url) = cfg.database_url.as_deref() else { return Ok(None) };
    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .connect_lazy(db_url)
        .context("failed to create Pg pool")?;
    if cfg.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await.context("running migrations failed")?;
        info!("Migrations applied");
    }
    info!("Using Postgres repository backend");
    Ok(Some(Arc::new(instafeed::repo::pg::PgRepo::new(pool))))
}

#[cfg(not(feature = "postgres-store"))]
async fn postgres_repo(cfg: &AppConfig) -> anyhow::Result<Option<Arc<dyn Repo>>> {
    if cfg.database_url.is_some() {
        tracing::warn!("DATABASE_URL set but the postgres-store feature is disabled");
    }
    Ok(None)
}

#[cfg(feature = "inmem-store")]
fn fallback_repo(_cfg: &AppConfig) -> anyhow::Result<Arc<dyn Repo>> {
    info!("Using in-memory repository backend");
    Ok(Arc::new(instafeed::repo::inmem::InMemRepo::new()))
}

#[cfg(not(feature = "inmem-store"))]
fn fallback_repo(_cfg: &AppConfig) -> anyhow::Result<Arc<dyn Repo>> {
    anyhow::bail!("DATABASE_URL must be set when the inmem-store feature is disabled")
}
