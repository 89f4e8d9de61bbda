// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Router};
use axum_test::TestServer;
use enrichrs::application::usecases::aggregate_result::AggregateResultUseCase;
use enrichrs::application::usecases::dispatch_enrichment::DispatchEnrichmentUseCase;
use enrichrs::application::usecases::query_task::TaskQueryUseCase;
use enrichrs::domain::models::task::Task;
use enrichrs::domain::repositories::task_repository::TaskRepository;
use enrichrs::domain::services::contact_filter::ConfidenceFilter;
use enrichrs::infrastructure::cache::redis_client::RedisClient;
use enrichrs::infrastructure::repositories::memory_task_repo_impl::MemoryTaskRepository;
use enrichrs::infrastructure::services::webhook_service_impl::WebhookServiceImpl;
use enrichrs::presentation::routes::{self, AppServices};
use enrichrs::queue::memory_queue::MemoryQueue;
use enrichrs::utils::retry_policy::RetryPolicy;
use enrichrs::workers::deadline_worker::DeadlineWorker;
use enrichrs::workers::notifier::Notifier;
use parking_lot::Mutex;
use serde_json::{json, Value};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};
use tokio::net::TcpListener;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test_secret";

/// 测试应用的可调参数
pub struct TestAppOptions {
    pub processing_window: chrono::Duration,
    pub default_webhook_url: Option<String>,
    pub secret: Option<String>,
    pub policy: RetryPolicy,
    pub min_confidence: u8,
}

impl Default for TestAppOptions {
    fn default() -> Self {
        Self {
            processing_window: chrono::Duration::hours(2),
            default_webhook_url: None,
            secret: Some(TEST_SECRET.to_string()),
            policy: fast_retry_policy(3),
            min_confidence: 50,
        }
    }
}

/// 全部基于内存后端装配的应用
#[allow(dead_code)]
pub struct TestApp {
    pub server: TestServer,
    pub router: Router,
    pub repository: Arc<MemoryTaskRepository>,
    pub work_queue: Arc<MemoryQueue>,
    pub result_queue: Arc<MemoryQueue>,
    pub aggregate: Arc<AggregateResultUseCase>,
    pub notifier: Arc<Notifier>,
    pub deadline_worker: DeadlineWorker,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with_options(TestAppOptions::default()).await
}

pub async fn create_test_app_with_options(options: TestAppOptions) -> TestApp {
    let repository = Arc::new(MemoryTaskRepository::new(chrono::Duration::hours(1)));
    let work_queue = Arc::new(MemoryQueue::new());
    let result_queue = Arc::new(MemoryQueue::new());

    let webhook = Arc::new(WebhookServiceImpl::new(
        options.secret,
        Duration::from_secs(5),
    ));
    let notifier = Arc::new(Notifier::new(
        repository.clone(),
        webhook,
        options.policy,
        chrono::Duration::seconds(30),
    ));

    let dispatch = Arc::new(DispatchEnrichmentUseCase::new(
        repository.clone(),
        work_queue.clone(),
        options.processing_window,
        options.default_webhook_url,
    ));
    let aggregate = Arc::new(AggregateResultUseCase::new(
        repository.clone(),
        ConfidenceFilter::new(options.min_confidence),
        notifier.clone(),
    ));
    let query = Arc::new(TaskQueryUseCase::new(repository.clone()));
    let deadline_worker = DeadlineWorker::new(
        repository.clone(),
        notifier.clone(),
        Duration::from_secs(1),
        100,
    );

    let app = routes::routes(AppServices {
        dispatch,
        aggregate: aggregate.clone(),
        query,
    });
    let server = TestServer::new(app.clone()).expect("Failed to create test server");

    TestApp {
        server,
        router: app,
        repository,
        work_queue,
        result_queue,
        aggregate,
        notifier,
        deadline_worker,
    }
}

/// 毫秒级退避、无抖动的重试策略
pub fn fast_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(10),
        max_backoff: Duration::from_millis(50),
        enable_jitter: false,
        ..RetryPolicy::default()
    }
}

/// 轮询任务直到满足条件，超时则 panic
pub async fn wait_for_task<F>(repository: &MemoryTaskRepository, task_id: Uuid, predicate: F) -> Task
where
    F: Fn(&Task) -> bool,
{
    for _ in 0..250 {
        let task = repository.find_by_id(task_id).await.unwrap();
        if predicate(&task) {
            return task;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Task {} never reached the expected state", task_id);
}

/// 构造一条扁平形式的 Worker 回调
pub fn worker_callback(task_id: Uuid, company_id: i64, scores: &[i64]) -> Value {
    let contacts: Vec<Value> = scores
        .iter()
        .enumerate()
        .map(|(i, score)| {
            json!({
                "firstName": format!("Contact{}", i),
                "lastName": "Doe",
                "email": format!("contact{}@example.com", i),
                "role": "CTO",
                "confidenceScore": score,
            })
        })
        .collect();

    json!({
        "taskId": task_id,
        "companyId": company_id,
        "contacts": contacts,
    })
}

/// Webhook 接收端收到的一次请求
#[derive(Debug, Clone)]
pub struct ReceivedWebhook {
    pub headers: HeaderMap,
    pub body: String,
}

impl ReceivedWebhook {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone)]
struct ReceiverState {
    status: StatusCode,
    received: Arc<Mutex<Vec<ReceivedWebhook>>>,
}

async fn record_webhook(
    State(state): State<ReceiverState>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    state.received.lock().push(ReceivedWebhook { headers, body });
    state.status
}

/// 启动一个记录所有请求的 Webhook 接收端
///
/// # 返回值
///
/// 接收地址和已收到的请求列表
pub async fn start_webhook_receiver(
    status: StatusCode,
) -> (String, Arc<Mutex<Vec<ReceivedWebhook>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/webhook", post(record_webhook))
        .with_state(ReceiverState {
            status,
            received: received.clone(),
        });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/webhook", addr), received)
}

/// 通过 HTTP 接口提交一个任务并返回任务ID
pub async fn enqueue(server: &TestServer, webhook_url: &str, companies: &[(i64, &str)]) -> Uuid {
    let form_data: Vec<Value> = companies
        .iter()
        .map(|(id, name)| json!({ "companyId": id, "companyName": name }))
        .collect();

    let response = server
        .post("/enqueue_enrichment")
        .json(&json!({ "formData": form_data, "webhookUrl": webhook_url }))
        .await;
    response.assert_status(StatusCode::ACCEPTED);

    let body: Value = response.json();
    body["taskId"].as_str().unwrap().parse().unwrap()
}

/// 启动 Redis 容器并返回已连通的客户端
///
/// 容器句柄须在测试期间保持存活。
pub async fn start_redis() -> (ContainerAsync<GenericImage>, Arc<RedisClient>) {
    let redis_node = GenericImage::new("redis", "7-alpine")
        .start()
        .await
        .expect("Failed to start Redis");
    let redis_port = redis_node
        .get_host_port_ipv4(6379)
        .await
        .expect("Failed to get Redis port");
    let redis_url = format!("redis://127.0.0.1:{}", redis_port);

    let client = Arc::new(RedisClient::new(&redis_url).await.expect("Invalid Redis URL"));
    for _ in 0..20 {
        if client.ping().await.is_ok() {
            return (redis_node, client);
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    panic!("Redis did not become ready at {}", redis_url);
}
