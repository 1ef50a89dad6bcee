//! 存储引擎相关 trait 定义

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::rds::connector::Connector;
use crate::rds::driver::Driver;

/// 关系型数据库连接池管理
pub trait ConnPoolManager: Send + Sync {
    fn set_max_open_conns(&self, n: u32);
    fn set_max_idle_conns(&self, n: u32);
    fn set_conn_max_lifetime(&self, d: Duration);
    fn set_conn_max_idle_time(&self, d: Duration);
}

/// 可供宿主系统使用的存储
///
/// 读写接口由外部存储引擎实现，这里只要求它能管理连接池
pub trait Storage: ConnPoolManager {
    /// 存储类型名称（用于日志）
    fn storage_type(&self) -> &'static str;
}

/// 存储引擎工厂，按后端类型（PostgreSQL 等）实现
#[async_trait]
pub trait StorageCreator<D: Driver>: Send + Sync {
    /// 单端点
    async fn create(
        &self,
        connector: Arc<Connector<D>>,
        pagination_key: &str,
    ) -> anyhow::Result<Arc<dyn Storage>>;

    /// 读写分离
    async fn create_read_write(
        &self,
        reader: Arc<Connector<D>>,
        writer: Arc<Connector<D>>,
        pagination_key: &str,
    ) -> anyhow::Result<Arc<dyn Storage>>;
}
