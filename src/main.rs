use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use taskcache::{
    application::{error::AppError, repos::TasksRepo, tasks::TaskService},
    cache::{CacheBackend, CacheConfig, CacheStore, MemoryCache, RedisCache},
    config::{self, StoreBackend},
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        memory::MemoryTaskStore,
        telemetry,
    },
};
use tokio::{signal, sync::oneshot, task::JoinHandle};
use tracing::{Dispatch, Level, debug, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let store = init_store(&settings).await?;
    let cache_config = CacheConfig::from(&settings.cache);
    let (cache, sweeper) = init_cache(&cache_config).await?;

    let service = TaskService::new(store, cache, &cache_config);
    let result = serve_http(&settings, ApiState::new(service)).await;

    if let Some(handle) = sweeper {
        handle.abort();
        let _ = handle.await;
    }

    result
}

async fn connect_postgres(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .store
        .database_url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    PostgresRepositories::connect(database_url, settings.store.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))
}

async fn init_store(settings: &config::Settings) -> Result<Arc<dyn TasksRepo>, AppError> {
    match settings.store.backend {
        StoreBackend::Postgres => {
            let pool = connect_postgres(settings).await?;
            PostgresRepositories::run_migrations(&pool)
                .await
                .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;
            info!(target = "taskcache::store", backend = "postgres", "Task store ready");
            Ok(Arc::new(PostgresRepositories::new(pool)))
        }
        StoreBackend::Memory => {
            info!(target = "taskcache::store", backend = "memory", "Task store ready");
            Ok(Arc::new(MemoryTaskStore::new()))
        }
    }
}

async fn init_cache(
    config: &CacheConfig,
) -> Result<(Arc<dyn CacheStore>, Option<JoinHandle<()>>), AppError> {
    match config.backend {
        CacheBackend::Redis => {
            let cache = RedisCache::from_url(&config.redis_url)
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
            cache
                .ping()
                .await
                .map_err(|err| AppError::from(InfraError::cache(err.to_string())))?;
            info!(
                target = "taskcache::cache",
                backend = "redis",
                ttl_secs = config.ttl.as_secs(),
                "Task cache ready"
            );
            let cache: Arc<dyn CacheStore> = Arc::new(cache);
            Ok((cache, None))
        }
        CacheBackend::Memory => {
            let cache = Arc::new(MemoryCache::new());
            let sweeper = spawn_sweeper(cache.clone(), config.sweep_interval);
            info!(
                target = "taskcache::cache",
                backend = "memory",
                ttl_secs = config.ttl.as_secs(),
                "Task cache ready"
            );
            let cache: Arc<dyn CacheStore> = cache;
            Ok((cache, Some(sweeper)))
        }
    }
}

fn spawn_sweeper(cache: Arc<MemoryCache>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.tick().await;
        loop {
            interval.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                debug!(target = "taskcache::cache", removed, "Purged expired cache entries");
            }
        }
    })
}

async fn serve_http(settings: &config::Settings, state: ApiState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "taskcache::http",
        addr = %settings.server.addr,
        "Listening"
    );

    let (stopping_tx, stopping_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(());
        })
        .into_future();

    let grace = settings.server.graceful_shutdown;
    let deadline = async move {
        if stopping_rx.await.is_err() {
            return std::future::pending::<()>().await;
        }
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
            info!(target = "taskcache::http", "Server stopped");
        }
        () = deadline => {
            warn!(
                target = "taskcache::http",
                grace_secs = grace.as_secs(),
                "Graceful shutdown timed out; dropping in-flight requests"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!(target = "taskcache::http", "Received Ctrl+C, initiating graceful shutdown");
        }
        () = terminate => {
            info!(target = "taskcache::http", "Received SIGTERM, initiating graceful shutdown");
        }
    }
}
