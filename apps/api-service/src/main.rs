//! # NailBook API サーバー
//!
//! サロンの予約・問い合わせ・ニュースレター・お客様の声・ギャラリーの API を提供する。
//!
//! ## 役割
//!
//! - **データ永続化**: PostgreSQL への保存と参照
//! - **通知**: 保存後にメール通知をバックグラウンドで送信する。送信結果は
//!   レスポンスに影響しない
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | **Yes** | ポート番号 |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `RESEND_API_KEY` | No | HTTP メール API のキー（あれば SMTP より優先） |
//! | `EMAIL_HOST_USER` / `EMAIL_HOST_PASSWORD` | No | SMTP 認証情報 |
//! | `ADMIN_EMAIL` | No | 管理者通知の宛先 |
//! | `THUMBNAIL_MODE` | No | `disabled`（デフォルト）または `cdn` |
//! | `LOG_FORMAT` | No | `pretty`（デフォルト）または `json` |
//!
//! メールプロバイダが一つも設定されていない場合は警告を出し、
//! メールをログに出力するだけのコンソール送信で起動する。
//!
//! ## 起動方法
//!
//! ```bash
//! API_PORT=8000 DATABASE_URL=postgres://... cargo run -p nailbook-api-service
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use nailbook_api_service::{
    app::{AppDependencies, build_app},
    config::{AppConfig, ThumbnailMode},
    notification::{
        BackgroundNotificationScheduler,
        NotificationPipeline,
        NotificationRenderer,
        NotificationSources,
    },
    runner::BackgroundRunner,
};
use nailbook_domain::clock::SystemClock;
use nailbook_infra::{
    db,
    notification::{MailDispatcher, build_sender},
    repository::{
        PostgresBookingRepository,
        PostgresContactMessageRepository,
        PostgresGalleryImageRepository,
        PostgresNewsletterSubscriberRepository,
        PostgresServiceRepository,
        PostgresTestimonialRepository,
    },
    thumbnail::{CdnThumbnailHook, DisabledThumbnailHook, ThumbnailHook},
};
use nailbook_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

/// API サーバーのエントリーポイント
///
/// 1. 環境変数・トレーシングの初期化
/// 2. データベース接続とマイグレーション
/// 3. メールプロバイダの選択とバックグラウンドランナーの起動
/// 4. ルーターの構築とサーバー起動
/// 5. 終了シグナル受信後、残りの通知ジョブをドレイン
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(&TracingConfig::from_env("api-service"));
    let _tracing_guard = tracing::info_span!("app", service = "api-service").entered();

    let config = AppConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!("API サーバーを起動します: {}:{}", config.host, config.port);

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションの適用に失敗しました")?;
    tracing::info!("データベースに接続しました");

    // メールプロバイダ（起動時に一度だけ選択する）
    let provider = config.mail.select_provider();
    let dispatcher = MailDispatcher::new(build_sender(&config.mail));
    let from_address = config.mail.from_address();
    tracing::info!(
        provider = %provider,
        sender = dispatcher.provider_name(),
        from = %from_address,
        "メールプロバイダを選択しました"
    );
    if config.admin_email.is_none() {
        tracing::warn!("ADMIN_EMAIL が未設定のため、管理者向けの通知は送信されません");
    }

    let services = Arc::new(PostgresServiceRepository::new(pool.clone()));
    let bookings = Arc::new(PostgresBookingRepository::new(pool.clone()));
    let contacts = Arc::new(PostgresContactMessageRepository::new(pool.clone()));
    let subscribers = Arc::new(PostgresNewsletterSubscriberRepository::new(pool.clone()));
    let testimonials = Arc::new(PostgresTestimonialRepository::new(pool.clone()));
    let gallery = Arc::new(PostgresGalleryImageRepository::new(pool));

    let (runner, runner_handle) = BackgroundRunner::start(&config.runner);

    let pipeline = NotificationPipeline::new(
        NotificationRenderer::new().context("メールテンプレートの読み込みに失敗しました")?,
        dispatcher,
        from_address,
        NotificationSources {
            bookings:    bookings.clone(),
            services:    services.clone(),
            contacts:    contacts.clone(),
            subscribers: subscribers.clone(),
        },
    );
    let scheduler = Arc::new(BackgroundNotificationScheduler::new(
        runner.clone(),
        Arc::new(pipeline),
    ));

    let thumbnails: Arc<dyn ThumbnailHook> = match config.thumbnail_mode {
        ThumbnailMode::Cdn => Arc::new(CdnThumbnailHook),
        ThumbnailMode::Disabled => Arc::new(DisabledThumbnailHook),
    };
    tracing::info!(hook = thumbnails.name(), "サムネイル生成フックを設定しました");

    let app = build_app(AppDependencies {
        services,
        bookings,
        contacts,
        subscribers,
        testimonials,
        gallery,
        scheduler,
        thumbnails,
        runner,
        clock: Arc::new(SystemClock),
        admin_email: config.admin_email.clone(),
        transition_policy: config.transition_policy,
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("API サーバーが起動しました: {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("サーバーを停止しました。残りの通知ジョブを待機します");
    runner_handle.shutdown(config.runner.job_timeout).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "終了シグナルの待機に失敗しました");
    }
}
