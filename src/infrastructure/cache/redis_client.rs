// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use anyhow::Result;
use redis::AsyncCommands;

/// Redis客户端
///
/// 提供对Redis数据库的异步操作接口，每次操作获取一个多路复用连接
#[derive(Clone)]
pub struct RedisClient {
    /// Redis客户端
    client: redis::Client,
}

impl RedisClient {
    /// 创建新的Redis客户端实例
    ///
    /// # 参数
    ///
    /// * `redis_url` - Redis连接URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RedisClient)` - Redis客户端实例
    /// * `Err(anyhow::Error)` - URL 无法解析
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// 获取多路复用连接，供脚本调用使用
    pub async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    /// 检查连接是否可用
    pub async fn ping(&self) -> Result<()> {
        let mut con = self.get_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut con).await?;
        Ok(())
    }

    /// 获取指定键的值
    ///
    /// # 参数
    ///
    /// * `key` - 键
    ///
    /// # 返回值
    ///
    /// * `Ok(Option<String>)` - 键对应的值，如果不存在则返回None
    /// * `Err(anyhow::Error)` - 获取过程中出现的错误
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.get_connection().await?;
        let value: Option<String> = con.get(key).await?;
        Ok(value)
    }

    /// 追加到列表尾部
    ///
    /// # 返回值
    ///
    /// * `Ok(i64)` - 追加后的列表长度
    pub async fn rpush(&self, key: &str, value: &str) -> Result<i64> {
        let mut con = self.get_connection().await?;
        let len: i64 = redis::cmd("RPUSH")
            .arg(key)
            .arg(value)
            .query_async(&mut con)
            .await?;
        Ok(len)
    }

    /// 从列表头部弹出一个元素，列表为空时返回 None
    pub async fn lpop(&self, key: &str) -> Result<Option<String>> {
        let mut con = self.get_connection().await?;
        let value: Option<String> = redis::cmd("LPOP").arg(key).query_async(&mut con).await?;
        Ok(value)
    }

    /// 按分数升序获取不超过 `max_score` 的成员
    ///
    /// # 参数
    ///
    /// * `key` - 有序集合键
    /// * `max_score` - 分数上限（包含）
    /// * `limit` - 最多返回的成员数
    pub async fn zrange_by_score(
        &self,
        key: &str,
        max_score: i64,
        limit: usize,
    ) -> Result<Vec<String>> {
        let mut con = self.get_connection().await?;
        let members: Vec<String> = redis::cmd("ZRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(max_score)
            .arg("LIMIT")
            .arg(0)
            .arg(limit)
            .query_async(&mut con)
            .await?;
        Ok(members)
    }

    /// 从有序集合中移除成员
    pub async fn zrem(&self, key: &str, member: &str) -> Result<()> {
        let mut con = self.get_connection().await?;
        con.zrem::<_, _, ()>(key, member).await?;
        Ok(())
    }
}
