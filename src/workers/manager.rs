// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::workers::worker::Worker;
use std::sync::Arc;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 工作管理器
///
/// 统一启动后台工作器，并在收到关闭信号时终止它们
#[derive(Default)]
pub struct WorkerManager {
    workers: Vec<Arc<dyn Worker>>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工作器
    pub fn register(&mut self, worker: Arc<dyn Worker>) {
        self.workers.push(worker);
    }

    /// 启动所有已注册的工作器
    pub fn start_workers(&mut self) {
        for worker in &self.workers {
            let worker = worker.clone();
            let handle = tokio::spawn(async move {
                if let Err(e) = worker.run().await {
                    error!("Worker {} stopped with error: {}", worker.name(), e);
                }
            });
            self.handles.push(handle);
        }
        info!("Started {} workers", self.handles.len());
    }

    /// 终止所有工作器
    pub fn shutdown(&mut self) {
        info!("Shutting down workers...");
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Workers shut down successfully");
    }

    /// 等待关闭信号并关闭工作进程
    pub async fn wait_for_shutdown(&mut self) {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(err) => error!("Unable to listen for shutdown signal: {}", err),
        }
        self.shutdown();
    }
}
