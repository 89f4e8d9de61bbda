// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use enrichrs::application::usecases::aggregate_result::AggregateResultUseCase;
use enrichrs::application::usecases::dispatch_enrichment::DispatchEnrichmentUseCase;
use enrichrs::application::usecases::query_task::TaskQueryUseCase;
use enrichrs::config::settings::{Backend, Settings};
use enrichrs::domain::repositories::task_repository::TaskRepository;
use enrichrs::domain::services::contact_filter::ConfidenceFilter;
use enrichrs::infrastructure::cache::redis_client::RedisClient;
use enrichrs::infrastructure::metrics;
use enrichrs::infrastructure::repositories::memory_task_repo_impl::MemoryTaskRepository;
use enrichrs::infrastructure::repositories::redis_task_repo_impl::RedisTaskRepository;
use enrichrs::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use enrichrs::presentation::routes::{self, AppServices};
use enrichrs::queue::memory_queue::MemoryQueue;
use enrichrs::queue::redis_queue::RedisQueue;
use enrichrs::queue::work_queue::{ResultQueue, WorkQueue};
use enrichrs::utils::retry_policy::RetryPolicy;
use enrichrs::utils::telemetry;
use enrichrs::workers::deadline_worker::DeadlineWorker;
use enrichrs::workers::manager::WorkerManager;
use enrichrs::workers::notifier::Notifier;
use enrichrs::workers::result_worker::ResultWorker;
use enrichrs::workers::retention_worker::RetentionWorker;
use tokio::net::TcpListener;
use tracing::info;

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize logging
    telemetry::init_telemetry();
    info!("Starting enrichrs...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    metrics::init_metrics(&settings.metrics);

    // 3. Redis client, only when a backend needs it
    let redis_client = if settings.store.backend == Backend::Redis
        || settings.queue.backend == Backend::Redis
    {
        let client = Arc::new(RedisClient::new(&settings.redis.url).await?);
        client.ping().await?;
        info!("Redis client initialized");
        Some(client)
    } else {
        None
    };

    // 4. Task store
    let retention = chrono::Duration::seconds(settings.task.retention_secs as i64);
    let task_repo: Arc<dyn TaskRepository> = match (&redis_client, settings.store.backend) {
        (Some(redis), Backend::Redis) => Arc::new(RedisTaskRepository::new(
            redis.clone(),
            settings.store.key_prefix.clone(),
            retention,
            settings.store.max_mutate_retries,
        )),
        _ => Arc::new(MemoryTaskRepository::new(retention)),
    };
    info!("Task store backend: {:?}", settings.store.backend);

    // 5. Queues
    let (work_queue, result_queue): (Arc<dyn WorkQueue>, Arc<dyn ResultQueue>) =
        match (&redis_client, settings.queue.backend) {
            (Some(redis), Backend::Redis) => (
                Arc::new(RedisQueue::new(redis.clone(), settings.queue.work_queue.clone())),
                Arc::new(RedisQueue::new(redis.clone(), settings.queue.result_queue.clone())),
            ),
            _ => (Arc::new(MemoryQueue::new()), Arc::new(MemoryQueue::new())),
        };
    info!("Queue backend: {:?}", settings.queue.backend);

    // 6. Use cases and notifier
    let webhook_service = Arc::new(WebhookServiceImpl::new(
        settings.webhook.secret.clone(),
        settings.webhook.timeout(),
    ));
    let notifier = Arc::new(Notifier::new(
        task_repo.clone(),
        webhook_service,
        RetryPolicy::from_settings(&settings.webhook),
        settings.webhook.lease(),
    ));

    let dispatch = Arc::new(DispatchEnrichmentUseCase::new(
        task_repo.clone(),
        work_queue,
        settings.task.deadline(),
        settings.webhook.default_url.clone(),
    ));
    let aggregate = Arc::new(AggregateResultUseCase::new(
        task_repo.clone(),
        ConfidenceFilter::new(settings.task.min_confidence_score),
        notifier.clone(),
    ));
    let query = Arc::new(TaskQueryUseCase::new(task_repo.clone()));

    // 7. Start Workers
    let mut worker_manager = WorkerManager::new();
    worker_manager.register(Arc::new(ResultWorker::new(
        result_queue,
        aggregate.clone(),
        std::time::Duration::from_secs(settings.queue.poll_timeout_secs),
        settings.queue.consumer_concurrency,
    )));
    worker_manager.register(Arc::new(DeadlineWorker::new(
        task_repo.clone(),
        notifier,
        settings.task.sweep_interval(),
        settings.task.sweep_batch_size,
    )));
    worker_manager.register(Arc::new(RetentionWorker::new(
        task_repo,
        settings.task.sweep_interval(),
    )));
    worker_manager.start_workers();

    // 8. Start HTTP server
    let app = routes::routes(AppServices {
        dispatch,
        aggregate,
        query,
    });

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            worker_manager.wait_for_shutdown().await;
        })
        .await?;

    Ok(())
}
