#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::Value;
use taskcache::application::repos::{CreateTaskParams, RepoError, TasksRepo, UpdateTaskParams};
use taskcache::application::tasks::TaskService;
use taskcache::cache::{CacheConfig, MemoryCache};
use taskcache::domain::entities::{TaskId, TaskRecord};
use taskcache::domain::tasks::TaskWindow;
use taskcache::infra::http::{ApiState, build_router};
use taskcache::infra::memory::MemoryTaskStore;
use tower::ServiceExt;

/// Memory store that counts reads, so tests can tell cache hits from store hits.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryTaskStore,
    reads: AtomicUsize,
}

impl CountingStore {
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Store contents for a window, bypassing the read counter.
    pub async fn list_tasks_direct(&self, window: TaskWindow) -> Vec<TaskRecord> {
        self.inner.list_tasks(window).await.expect("list tasks")
    }
}

#[async_trait]
impl TasksRepo for CountingStore {
    async fn create_task(&self, params: CreateTaskParams) -> Result<TaskRecord, RepoError> {
        self.inner.create_task(params).await
    }

    async fn find_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.find_task(id).await
    }

    async fn update_task(&self, params: UpdateTaskParams) -> Result<Option<TaskRecord>, RepoError> {
        self.inner.update_task(params).await
    }

    async fn update_task_completion(
        &self,
        id: TaskId,
        completed: bool,
    ) -> Result<Option<TaskRecord>, RepoError> {
        self.inner.update_task_completion(id, completed).await
    }

    async fn delete_task(&self, id: TaskId) -> Result<Option<TaskRecord>, RepoError> {
        self.inner.delete_task(id).await
    }

    async fn list_tasks(&self, window: TaskWindow) -> Result<Vec<TaskRecord>, RepoError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.list_tasks(window).await
    }

    async fn health_check(&self) -> Result<(), RepoError> {
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<CountingStore>,
    pub cache: Arc<MemoryCache>,
    pub service: TaskService,
}

pub fn test_app() -> TestApp {
    test_app_with(CacheConfig::default())
}

pub fn test_app_with(config: CacheConfig) -> TestApp {
    let store = Arc::new(CountingStore::default());
    let cache = Arc::new(MemoryCache::new());
    let service = TaskService::new(store.clone(), cache.clone(), &config);
    let router = build_router(ApiState::new(service.clone()));
    TestApp {
        router,
        store,
        cache,
        service,
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub body: Value,
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request should build");

    send_request(router, request).await
}

pub async fn send_request(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .expect("router should respond");

    let status = response.status();
    let request_id = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("collect body")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body should be JSON")
    };

    TestResponse {
        status,
        request_id,
        body,
    }
}
