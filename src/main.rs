use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use gazette::{
    application::{
        comments::{CommentPageLimits, CommentService},
        error::AppError,
        identity::{IdentityProvider, LoginService},
        posts::PostDirectory,
        repos::{CommentsRepo, PostsRepo, StoreHealth},
        session::SessionStore,
        snapshots::SnapshotService,
    },
    cache::SnapshotCacheConfig,
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        identity::GoogleIdentityProvider,
        memory::InMemoryRepositories,
        telemetry,
    },
};
use tokio::{net::TcpListener, sync::watch, task::JoinHandle};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(300);

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
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))?;
    let repositories = PostgresRepositories::from_settings(url, &settings.database);
    repositories
        .run_migrations()
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    info!("migrations applied");
    Ok(())
}

struct Repositories {
    posts: Arc<dyn PostsRepo>,
    comments: Arc<dyn CommentsRepo>,
    health: Arc<dyn StoreHealth>,
}

fn init_repositories(settings: &config::Settings) -> Repositories {
    match settings.database.url.as_deref() {
        Some(url) => {
            let repositories = Arc::new(PostgresRepositories::from_settings(
                url,
                &settings.database,
            ));
            Repositories {
                posts: repositories.clone(),
                comments: repositories.clone(),
                health: repositories,
            }
        }
        None => {
            warn!("no database url configured; posts and comments are kept in memory");
            let repositories = Arc::new(InMemoryRepositories::default());
            Repositories {
                posts: repositories.clone(),
                comments: repositories.clone(),
                health: repositories,
            }
        }
    }
}

fn build_http_state(
    settings: &config::Settings,
    cache_config: &SnapshotCacheConfig,
    repositories: Repositories,
) -> Result<HttpState, AppError> {
    let snapshots = SnapshotService::new(repositories.posts.clone(), cache_config);
    let comments = CommentService::new(
        repositories.comments,
        CommentPageLimits {
            default: settings.comments.page_size_default,
            max: settings.comments.page_size_max,
        },
    );
    let provider: Arc<dyn IdentityProvider> =
        Arc::new(GoogleIdentityProvider::new(&settings.identity)?);
    let login = LoginService::new(provider, SessionStore::new(settings.identity.session_ttl));

    Ok(HttpState {
        snapshots,
        posts: PostDirectory::new(repositories.posts),
        comments,
        login,
        health: repositories.health,
        google_client_id: settings.identity.google_client_id.clone(),
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings);
    let cache_config = SnapshotCacheConfig::from(&settings.snapshots);
    let state = build_http_state(&settings, &cache_config, repositories)?;

    if cache_config.prerender_on_startup
        && let Err(err) = state.snapshots.prerender_all().await
    {
        warn!(error = %err, "prerender skipped; posts will render on first request");
    }

    let purge_handle = spawn_session_purge(state.login.clone());
    let result = serve_http(&settings, state).await;

    purge_handle.abort();
    let _ = purge_handle.await;

    result
}

fn spawn_session_purge(login: LoginService) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        interval.tick().await;
        loop {
            interval.tick().await;
            let purged = login.sessions().purge_expired();
            if purged > 0 {
                info!(purged, "expired sessions removed");
            }
        }
    })
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "listening");

    let (signalled_tx, mut signalled_rx) = watch::channel(false);
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        wait_for_shutdown_signal().await;
        let _ = signalled_tx.send(true);
    });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => {
            return result.map_err(|err| AppError::unexpected(format!("server error: {err}")));
        }
        _ = signalled_rx.wait_for(|signalled| *signalled) => {}
    }

    info!("shutdown signal received; draining connections");
    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => result.map_err(|err| AppError::unexpected(format!("server error: {err}"))),
        Err(_) => {
            warn!(
                timeout_secs = settings.server.graceful_shutdown.as_secs(),
                "graceful shutdown timed out; closing remaining connections"
            );
            Ok(())
        }
    }
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
                return;
            }
            (Err(err), _) | (_, Err(err)) => {
                warn!(error = %err, "failed to register signal handlers; falling back to ctrl-c");
            }
        }
    }

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for ctrl-c; shutdown signal disabled");
        std::future::pending::<()>().await;
    }
}
