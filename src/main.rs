use rusty_library_loans::{
    adapters::amqp::{self, AmqpTransport},
    adapters::postgres::{PostgresBookStore, PostgresLoanStore},
    adapters::redis::{self as redis_adapter, RedisTransport},
    api::{create_router, handlers::AppState},
    application::loan::{CommandDispatcher, ConcurrencyGuard, FulfillmentDependencies},
    application::messaging::{EventListener, LoanPublisher, TransportSelector},
    config::PipelineConfig,
    ports::MessageTransport,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rusty_library_loans=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PipelineConfig::from_env()?;
    tracing::info!(
        retry_policy = ?config.retry_policy,
        prefetch = config.amqp_prefetch,
        "Configuration loaded"
    );

    // Initialize database connection pool
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Fallback transport (optional)
    let redis = match config.redis_url.as_deref() {
        Some(url) => match RedisTransport::connect(url).await {
            Ok(transport) => Some(Arc::new(transport)),
            Err(e) => {
                tracing::warn!(error = %e, "Redis unavailable, running without fallback transport");
                None
            }
        },
        None => None,
    };
    let fallback = redis.clone().map(|r| r as Arc<dyn MessageTransport>);

    // Durable broker (chosen once per process)
    let (selector, broker) = TransportSelector::establish(
        config.rabbitmq_url.as_deref(),
        |url| async move { AmqpTransport::connect(&url).await },
        fallback,
    )
    .await;
    let selector = Arc::new(selector);
    tracing::info!(mode = selector.mode().as_str(), "Transport selected");

    // Create fulfillment dependencies
    let deps = FulfillmentDependencies {
        book_store: Arc::new(PostgresBookStore::new(pool.clone())),
        loan_store: Arc::new(PostgresLoanStore::new(pool.clone())),
        event_sink: Arc::new(LoanPublisher::new(selector.clone())),
        guard: Arc::new(ConcurrencyGuard::new()),
    };
    let dispatcher = CommandDispatcher::new(deps, config.retry_policy);
    let listener = EventListener::logging();

    // Start consumers on every available transport
    let mut broker_tasks = Vec::new();
    if let Some(broker) = &broker {
        broker_tasks.push(
            amqp::spawn_command_consumer(broker, dispatcher.clone(), config.amqp_prefetch).await?,
        );
        broker_tasks.push(amqp::spawn_event_consumer(broker, listener.clone()).await?);
    }
    let mut fallback_tasks = Vec::new();
    if let Some(redis) = &redis {
        fallback_tasks
            .push(redis_adapter::spawn_command_subscriber(redis, dispatcher.clone()).await?);
        fallback_tasks.push(redis_adapter::spawn_event_subscriber(redis, listener.clone()).await?);
    }
    if broker_tasks.is_empty() && fallback_tasks.is_empty() {
        tracing::warn!("No transport available, loan commands will not be consumed");
    }

    // Create router
    let app = create_router(Arc::new(AppState {
        selector: selector.clone(),
    }));

    let addr = format!("0.0.0.0:{}", config.port);
    let http = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start server
    axum::serve(http, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ブローカー接続を閉じるとコンシューマーのストリームが終わる
    if let Some(broker) = &broker {
        broker.close().await;
        for task in broker_tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Consumer task ended abnormally");
            }
        }
    }
    // Pub/Subの購読は切断まで終わらないので中断する
    for task in fallback_tasks {
        task.abort();
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
