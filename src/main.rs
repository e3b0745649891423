use std::{future::IntoFuture, process, sync::Arc, time::Duration};

use noticeboard::{
    application::{
        composer::ComposerService,
        editor::EditorService,
        error::AppError,
        feed::FeedService,
        guard::RoleGuard,
        images::{ImageHost, ImageUploader},
        repos::{AdminConfigRepo, AnnouncementsRepo, AnnouncementsWriteRepo},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, BoardState},
        imghost::{DisabledImageHost, ImgbbClient},
        telemetry,
    },
};
use tokio::sync::oneshot;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
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
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        Some(config::Command::Migrate(_)) => run_migrate(&settings).await,
        Some(config::Command::Serve(_)) | None => run_serve(settings).await,
    }
}

async fn run_migrate(settings: &config::Settings) -> Result<(), AppError> {
    let repositories = PostgresRepositories::connect(&settings.database).await?;
    repositories.migrate().await?;
    info!(target = "noticeboard::migrate", "migrations applied");
    Ok(())
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = PostgresRepositories::connect(&settings.database).await?;
    repositories.migrate().await?;

    let state = build_board_state(Arc::new(repositories), &settings)?;
    serve_http(&settings.server, state).await
}

fn build_image_host(uploads: &config::UploadSettings) -> Result<Arc<dyn ImageHost>, AppError> {
    let Some(api_key) = uploads.api_key.as_deref() else {
        warn!(
            target = "noticeboard::startup",
            "no image host API key configured; image uploads will fail"
        );
        return Ok(Arc::new(DisabledImageHost));
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(InfraError::HttpClient)?;

    Ok(Arc::new(ImgbbClient::new(
        client,
        uploads.endpoint.clone(),
        api_key,
    )))
}

fn build_board_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> Result<BoardState, AppError> {
    let announcements_repo: Arc<dyn AnnouncementsRepo> = repositories.clone();
    let announcements_write_repo: Arc<dyn AnnouncementsWriteRepo> = repositories.clone();
    let admin_config_repo: Arc<dyn AdminConfigRepo> = repositories.clone();

    let uploader = ImageUploader::new(
        build_image_host(&settings.uploads)?,
        settings.uploads.partial_failure,
    );

    let feed = Arc::new(FeedService::new(
        announcements_repo.clone(),
        settings.board.page_size.get(),
        settings.board.timezone,
    ));
    let composer = Arc::new(ComposerService::new(
        announcements_write_repo.clone(),
        uploader.clone(),
    ));
    let editor = Arc::new(EditorService::new(
        announcements_repo,
        announcements_write_repo,
        uploader,
    ));

    Ok(BoardState {
        title: Arc::from(settings.board.title.as_str()),
        feed,
        composer,
        editor,
        guard: RoleGuard::new(admin_config_repo),
        auth: Arc::new(settings.auth.clone()),
        upload_limit_bytes: settings.uploads.max_request_bytes.get(),
        db: Some(repositories),
    })
}

async fn serve_http(server: &config::ServerSettings, state: BoardState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(server.addr)
        .await
        .map_err(|source| InfraError::Bind {
            addr: server.addr,
            source,
        })?;
    info!(target = "noticeboard::startup", addr = %server.addr, "listening");

    let (stopping_tx, stopping_rx) = oneshot::channel::<()>();
    let serve = axum::serve(listener, router.into_make_service()).with_graceful_shutdown(
        async move {
            shutdown_signal().await;
            let _ = stopping_tx.send(());
        },
    );
    let mut handle = tokio::spawn(serve.into_future());

    let grace = server.graceful_shutdown;
    let deadline = async move {
        if stopping_rx.await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        joined = &mut handle => joined?.map_err(AppError::Serve),
        _ = deadline => {
            warn!(
                target = "noticeboard::shutdown",
                grace_secs = grace.as_secs(),
                "connections still open after grace period; aborting"
            );
            handle.abort();
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "noticeboard::shutdown", error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!(target = "noticeboard::shutdown", "shutdown requested");
}
