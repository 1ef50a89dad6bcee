//! RDS 存储提供者

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::StorageError;
use crate::model::config::{Config, ConnPoolConfig};
use crate::rds::connector::Connector;
use crate::rds::credentials::CredentialProvider;
use crate::rds::driver::Driver;
use crate::rds::token::TokenDeriver;

use super::traits::{ConnPoolManager, Storage, StorageCreator};

/// 按配置构建带 IAM 认证的存储
pub struct RdsStorageProvider<D: Driver> {
    driver: Arc<D>,
    credentials: Arc<dyn CredentialProvider>,
    deriver: Arc<dyn TokenDeriver>,
    creator: Arc<dyn StorageCreator<D>>,
    /// 每次 provide 派生一个子令牌，续期任务绑定在子令牌上
    shutdown: CancellationToken,
}

impl<D: Driver> RdsStorageProvider<D> {
    pub fn new(
        driver: Arc<D>,
        credentials: Arc<dyn CredentialProvider>,
        deriver: Arc<dyn TokenDeriver>,
        creator: Arc<dyn StorageCreator<D>>,
    ) -> Self {
        Self {
            driver,
            credentials,
            deriver,
            creator,
            shutdown: CancellationToken::new(),
        }
    }

    /// 续期任务使用的取消令牌
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// 停止所有续期任务；已有的 DSN 保持不变
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// 单端点存储
    pub async fn provide(
        &self,
        name: &str,
        payload: serde_json::Value,
    ) -> Result<Arc<dyn Storage>, StorageError> {
        let config = Config::resolve(payload)?;

        // 任何一步失败，guard 析构时停掉本次创建的续期任务
        let cancel = self.shutdown.child_token();
        let guard = cancel.clone().drop_guard();

        let connector = self.connector(&cancel, &config, "").await?;

        let storage = self
            .creator
            .create(connector, &config.pagination_key)
            .await
            .map_err(StorageError::StorageInit)?;
        set_conn_pool_params(storage.as_ref(), &config.conn_pool);
        guard.disarm();

        tracing::info!(
            backend = name,
            storage_type = storage.storage_type(),
            host = %config.host,
            "存储已初始化"
        );
        Ok(storage)
    }

    /// 读写分离存储；未配置 reader 时读库与写库连同一个 host
    pub async fn provide_read_write(
        &self,
        name: &str,
        payload: serde_json::Value,
    ) -> Result<Arc<dyn Storage>, StorageError> {
        let config = Config::resolve(payload)?;

        let cancel = self.shutdown.child_token();
        let guard = cancel.clone().drop_guard();

        let writer = self.connector(&cancel, &config, "").await?;
        let reader = self.connector(&cancel, &config, &config.reader).await?;

        let storage = self
            .creator
            .create_read_write(reader, writer, &config.pagination_key)
            .await
            .map_err(StorageError::StorageInit)?;
        set_conn_pool_params(storage.as_ref(), &config.conn_pool);
        guard.disarm();

        tracing::info!(
            backend = name,
            storage_type = storage.storage_type(),
            writer = %config.host,
            reader = %config.reader,
            "读写分离存储已初始化"
        );
        Ok(storage)
    }

    /// 有静态密码时不走 IAM
    async fn connector(
        &self,
        cancel: &CancellationToken,
        config: &Config,
        override_host: &str,
    ) -> Result<Arc<Connector<D>>, StorageError> {
        let credentials = config
            .uses_iam_auth()
            .then(|| Arc::clone(&self.credentials));

        let connector = Connector::new(
            cancel,
            config,
            Arc::clone(&self.driver),
            credentials,
            Arc::clone(&self.deriver),
            override_host,
        )
        .await?;
        Ok(connector)
    }
}

/// 设置连接池参数；0 也照常下发
pub fn set_conn_pool_params<M: ConnPoolManager + ?Sized>(mgr: &M, conf: &ConnPoolConfig) {
    mgr.set_max_open_conns(conf.max_open_conns);
    mgr.set_max_idle_conns(conf.max_idle_conns);
    mgr.set_conn_max_lifetime(Duration::from_secs(conf.conn_max_lifetime_in_seconds));
    mgr.set_conn_max_idle_time(Duration::from_secs(conf.conn_max_idle_time_in_seconds));
}
