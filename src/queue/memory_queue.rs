// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use super::message::WorkMessage;
use super::work_queue::{QueueError, ResultQueue, WorkQueue};

/// 进程内队列
///
/// 用于单机部署与测试，工作消息和回调消息都以 JSON 文本保存
#[derive(Default)]
pub struct MemoryQueue {
    items: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条原始消息
    pub fn push_raw(&self, body: impl Into<String>) {
        self.items.lock().push_back(body.into());
        self.notify.notify_one();
    }

    /// 当前排队的消息数
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// 取出全部排队消息
    pub fn drain(&self) -> Vec<String> {
        self.items.lock().drain(..).collect()
    }

    /// 取出全部排队消息并解析为工作消息，无法解析的消息被丢弃
    pub fn drain_work(&self) -> Vec<WorkMessage> {
        self.drain()
            .iter()
            .filter_map(|body| serde_json::from_str(body).ok())
            .collect()
    }

    fn pop(&self) -> Option<String> {
        self.items.lock().pop_front()
    }
}

#[async_trait]
impl WorkQueue for MemoryQueue {
    async fn publish(&self, message: &WorkMessage) -> Result<(), QueueError> {
        let body = serde_json::to_string(message)?;
        self.push_raw(body);
        Ok(())
    }
}

#[async_trait]
impl ResultQueue for MemoryQueue {
    async fn receive(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        if let Some(body) = self.pop() {
            return Ok(Some(body));
        }
        // 等待通知或超时后再检查一次
        let _ = tokio::time::timeout(timeout, self.notify.notified()).await;
        Ok(self.pop())
    }
}
