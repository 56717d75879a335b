use std::sync::Arc;
use std::time::Duration;

use actix_multipart::form::MultipartFormConfig;
use actix_web::{App, HttpServer, web};
use clap::Parser;
use tracing::info;

use campaign_console::api::{self, campaign::CampaignService, validation};
use campaign_console::cli::{self, Cli, Command};
use campaign_console::config::Config;
use campaign_console::db;
use campaign_console::functions::HttpFunctionInvoker;
use campaign_console::logging;
use campaign_console::shutdown::ShutdownCoordinator;
use campaign_console::worker::{RetryPolicy, TriggerQueue, TriggerWorker};

const TRIGGER_BASE_DELAY: Duration = Duration::from_millis(500);

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cli = Cli::parse();

    // Roster checks need neither configuration nor a database
    if let Some(Command::CheckCsv { path }) = &cli.command {
        return match cli::check_csv(path) {
            Ok(summary) => {
                println!("{}", summary);
                Ok(())
            }
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        };
    }

    let config = Config::from_env().expect("Failed to load configuration");

    logging::init(&config.log_dir).expect("Failed to initialize logging");

    let pool = db::connection::get_connection(&config.database_url, config.max_db_connections)
        .await
        .expect("Failed to connect to database");
    info!("Database connection pool established");

    db::migrations::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    if let Some(Command::Migrate) = cli.command {
        pool.close().await;
        return Ok(());
    }

    info!("Starting campaign-console");
    info!("Configuration loaded successfully:");
    info!("  - Max payload size: {} bytes", config.max_payload_size);
    info!("  - Max database connections: {}", config.max_db_connections);
    info!("  - Functions endpoint: {}", config.functions.endpoint);
    info!("  - Max concurrent stage invocations: {}", config.max_concurrent_triggers);
    info!("  - Invocation attempts: {}", config.trigger_max_attempts);

    // watch channel so the worker observes shutdown alongside its queue
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let (trigger_queue, trigger_rx) = TriggerQueue::channel();

    let invoker = HttpFunctionInvoker::new(config.functions.clone())
        .expect("Failed to build function client");
    let trigger_worker = TriggerWorker::new(
        Arc::new(invoker),
        Arc::new(pool.clone()),
        RetryPolicy::new(config.trigger_max_attempts, TRIGGER_BASE_DELAY),
    );
    let max_concurrent = config.max_concurrent_triggers;
    let worker_handle = tokio::spawn(async move {
        trigger_worker.run(trigger_rx, max_concurrent, shutdown_rx).await;
    });

    let server_pool = pool.clone();
    let max_payload_size = config.max_payload_size;

    let server = HttpServer::new(move || {
        let campaign_service = web::Data::new(CampaignService::new(
            server_pool.clone(),
            trigger_queue.clone(),
        ));

        let payload_config = web::PayloadConfig::default().limit(max_payload_size);

        // Roster files are held in memory while they are ingested
        let multipart_config = MultipartFormConfig::default()
            .total_limit(max_payload_size)
            .memory_limit(max_payload_size)
            .error_handler(|err, _req| validation::multipart_error(err));

        App::new()
            .app_data(web::Data::new(server_pool.clone()))
            .app_data(campaign_service)
            .app_data(payload_config)
            .app_data(multipart_config)
            .app_data(validation::json_config())
            .app_data(validation::query_config())
            .configure(api::routes)
    });

    let bind = (config.bind_address.clone(), config.port);
    info!("Server starting on http://{}:{}", bind.0, bind.1);

    let server = server.bind(bind)?.run();
    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let coordinator = ShutdownCoordinator::new(
        server_handle,
        server_task,
        worker_handle,
        shutdown_tx,
        pool,
    );

    coordinator.wait_for_shutdown().await
}
