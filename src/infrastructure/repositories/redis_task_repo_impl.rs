// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::models::task::Task;
use crate::domain::repositories::task_repository::{
    Mutated, RepositoryError, TaskMutation, TaskRepository,
};
use crate::infrastructure::cache::redis_client::RedisClient;

/// 创建脚本：键不存在时写入任务并登记截止时间
const CREATE_SCRIPT: &str = r#"
    if redis.call("EXISTS", KEYS[1]) == 1 then
        return 0
    end
    redis.call("SET", KEYS[1], ARGV[1], "EX", tonumber(ARGV[2]))
    redis.call("ZADD", KEYS[2], tonumber(ARGV[4]), ARGV[3])
    return 1
"#;

/// 比较并写入脚本
///
/// 返回 -1 表示任务不存在，0 表示版本冲突，1 表示写入成功
const COMPARE_AND_SET_SCRIPT: &str = r#"
    local current = redis.call("GET", KEYS[1])
    if not current then
        return -1
    end
    local decoded = cjson.decode(current)
    local version = tonumber(decoded["version"]) or 0
    if version ~= tonumber(ARGV[1]) then
        return 0
    end
    redis.call("SET", KEYS[1], ARGV[2], "EX", tonumber(ARGV[3]))
    if ARGV[4] == "1" then
        redis.call("ZREM", KEYS[2], ARGV[5])
    else
        redis.call("ZADD", KEYS[2], tonumber(ARGV[6]), ARGV[5])
    end
    return 1
"#;

/// Redis 任务仓库
///
/// 每个任务以 JSON 形式保存在 `{prefix}:task:{id}`，通过版本号做乐观并发控制，
/// 比较和写入在同一个 Lua 脚本中原子完成。未结清的任务同时登记在
/// `{prefix}:deadlines` 有序集合中（分数为截止时间戳），供截止扫描使用。
///
/// 键的 TTL：未结清时为截止时间之后再保留 `retention`，结清后从结清时刻起保留 `retention`。
pub struct RedisTaskRepository {
    redis: Arc<RedisClient>,
    key_prefix: String,
    retention: Duration,
    max_retries: u32,
}

impl RedisTaskRepository {
    /// 创建新的 Redis 任务仓库
    ///
    /// # 参数
    ///
    /// * `redis` - Redis客户端
    /// * `key_prefix` - 键前缀
    /// * `retention` - 保留时长
    /// * `max_retries` - 版本冲突时的最大重试次数
    pub fn new(
        redis: Arc<RedisClient>,
        key_prefix: impl Into<String>,
        retention: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            redis,
            key_prefix: key_prefix.into(),
            retention,
            max_retries: max_retries.max(1),
        }
    }

    fn task_key(&self, id: Uuid) -> String {
        format!("{}:task:{}", self.key_prefix, id)
    }

    fn deadlines_key(&self) -> String {
        format!("{}:deadlines", self.key_prefix)
    }

    fn ttl_seconds(&self, task: &Task, now: DateTime<Utc>) -> i64 {
        (task.retain_until(self.retention) - now).num_seconds().max(1)
    }

    async fn load(&self, id: Uuid) -> Result<Option<Task>, RepositoryError> {
        let raw = self
            .redis
            .get(&self.task_key(id))
            .await
            .map_err(backend)?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// 从截止索引中移除成员，失败只记录日志
    async fn forget_deadline(&self, member: &str) {
        if let Err(e) = self.redis.zrem(&self.deadlines_key(), member).await {
            warn!(member, "Failed to remove entry from deadline index: {}", e);
        }
    }
}

fn backend(err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Backend(err.to_string())
}

#[async_trait]
impl TaskRepository for RedisTaskRepository {
    async fn create(&self, task: &Task) -> Result<(), RepositoryError> {
        let json = serde_json::to_string(task)?;
        let ttl = self.ttl_seconds(task, Utc::now());
        let mut conn = self.redis.get_connection().await.map_err(backend)?;

        let created: i64 = redis::Script::new(CREATE_SCRIPT)
            .key(self.task_key(task.id))
            .key(self.deadlines_key())
            .arg(json)
            .arg(ttl)
            .arg(task.id.to_string())
            .arg(task.deadline_at.timestamp())
            .invoke_async(&mut conn)
            .await
            .map_err(backend)?;

        if created == 1 {
            Ok(())
        } else {
            Err(RepositoryError::AlreadyExists)
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Task, RepositoryError> {
        self.load(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn mutate(
        &self,
        id: Uuid,
        mutation: TaskMutation<'_>,
    ) -> Result<Mutated, RepositoryError> {
        for attempt in 1..=self.max_retries {
            let Some(current) = self.load(id).await? else {
                self.forget_deadline(&id.to_string()).await;
                return Err(RepositoryError::NotFound);
            };

            let mut working = current.clone();
            if !mutation(&mut working) {
                return Ok(Mutated {
                    task: current,
                    changed: false,
                });
            }
            working.version = current.version + 1;

            let json = serde_json::to_string(&working)?;
            let ttl = self.ttl_seconds(&working, Utc::now());
            let settled = if working.is_settled() { "1" } else { "0" };
            let mut conn = self.redis.get_connection().await.map_err(backend)?;

            let result: i64 = redis::Script::new(COMPARE_AND_SET_SCRIPT)
                .key(self.task_key(id))
                .key(self.deadlines_key())
                .arg(current.version)
                .arg(json)
                .arg(ttl)
                .arg(settled)
                .arg(id.to_string())
                .arg(working.deadline_at.timestamp())
                .invoke_async(&mut conn)
                .await
                .map_err(backend)?;

            match result {
                1 => {
                    return Ok(Mutated {
                        task: working,
                        changed: true,
                    })
                }
                -1 => {
                    self.forget_deadline(&id.to_string()).await;
                    return Err(RepositoryError::NotFound);
                }
                _ => {
                    debug!(task_id = %id, attempt, "Version conflict, retrying mutation");
                }
            }
        }

        warn!(task_id = %id, "Mutation retries exhausted");
        Err(RepositoryError::Conflict(id))
    }

    async fn find_overdue(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Uuid>, RepositoryError> {
        let members = self
            .redis
            .zrange_by_score(&self.deadlines_key(), now.timestamp(), limit)
            .await
            .map_err(backend)?;

        let mut ids = Vec::with_capacity(members.len());
        for member in members {
            match Uuid::parse_str(&member) {
                Ok(id) => ids.push(id),
                Err(_) => {
                    warn!("Dropping malformed deadline index entry: {}", member);
                    self.forget_deadline(&member).await;
                }
            }
        }
        Ok(ids)
    }

    async fn evict_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        // 任务键由 TTL 淘汰，这里只清理截止索引中对应键已过期的成员
        let cutoff = (now - self.retention).timestamp();
        let mut conn = self.redis.get_connection().await.map_err(backend)?;
        let removed: u64 = redis::cmd("ZREMRANGEBYSCORE")
            .arg(self.deadlines_key())
            .arg("-inf")
            .arg(cutoff)
            .query_async(&mut conn)
            .await
            .map_err(backend)?;
        Ok(removed)
    }
}
