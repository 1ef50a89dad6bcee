//! 带 IAM 认证的数据库连接器
//!
//! 连接器持有当前密码与拼装好的 DSN。IAM 模式下由后台任务定时刷新 token，
//! 前台 `open` 只读取 DSN 快照，两者通过同一把读写锁协调

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

use crate::error::ConnectorError;
use crate::model::config::{Config, IamAuthConfig};

use super::credentials::{CredentialBundle, CredentialProvider};
use super::driver::Driver;
use super::token::{TokenDeriver, TokenRequest};

/// IAM 申请的临时密码只有 15 分钟有效期，提前留出余量
pub const REFRESH_AUTH_TOKEN_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// 密码与 DSN 总是一起替换
#[derive(Debug, Clone)]
struct AuthState {
    password: String,
    dsn: String,
}

/// 数据库连接器
///
/// 每个逻辑端点（单库，或读写分离下的读库/写库）各一个实例
pub struct Connector<D: Driver> {
    host: String,
    port: i32,
    db_name: String,
    user: String,
    ssl_mode: String,
    ssl_root_cert: String,

    driver: Arc<D>,
    deriver: Arc<dyn TokenDeriver>,
    /// 读：建立新连接时；写：token 刷新时（只有续期任务会写）
    auth: RwLock<AuthState>,
}

impl<D: Driver> Connector<D> {
    /// 创建连接器
    ///
    /// 未提供 `credentials` 时使用配置中的静态密码；否则走 IAM 认证：
    /// 申请凭据、生成首个 token，并启动绑定在 `cancel` 上的续期任务。
    /// `override_host` 非空时替换配置中的 host（用于读库）
    pub async fn new(
        cancel: &CancellationToken,
        config: &Config,
        driver: Arc<D>,
        credentials: Option<Arc<dyn CredentialProvider>>,
        deriver: Arc<dyn TokenDeriver>,
        override_host: &str,
    ) -> Result<Arc<Self>, ConnectorError> {
        let connector = Arc::new(Self::from_config(config, driver, deriver, override_host));

        if let Some(provider) = credentials {
            tracing::info!(host = %connector.host, "Opt in IAM Authentication...");
            connector
                .setup_iam_auth(cancel, &config.iam_auth, provider.as_ref())
                .await?;
        }
        Ok(connector)
    }

    fn from_config(
        config: &Config,
        driver: Arc<D>,
        deriver: Arc<dyn TokenDeriver>,
        override_host: &str,
    ) -> Self {
        let host = if override_host.is_empty() {
            config.host.clone()
        } else {
            override_host.to_string()
        };

        let mut connector = Self {
            host,
            port: config.port,
            db_name: config.db_name.clone(),
            user: config.user.clone(),
            ssl_mode: config.ssl_mode.clone(),
            ssl_root_cert: config.ssl_root_cert.clone(),
            driver,
            deriver,
            auth: RwLock::new(AuthState {
                password: String::new(),
                dsn: String::new(),
            }),
        };
        let dsn = connector.assemble_dsn(&config.password);
        *connector.auth.get_mut() = AuthState {
            password: config.password.clone(),
            dsn,
        };
        connector
    }

    /// 用当前 DSN 打开一条新连接，不做重试
    pub async fn open(&self) -> anyhow::Result<D::Connection> {
        let dsn = self.dsn();
        self.driver.open(&dsn).await
    }

    /// 打开一条连接并执行一次往返，确认当前 DSN 可用
    pub async fn check(&self) -> anyhow::Result<()> {
        let mut conn = self.open().await?;
        self.driver.ping(&mut conn).await
    }

    /// 底层驱动
    pub fn driver(&self) -> &Arc<D> {
        &self.driver
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// 当前 DSN 快照
    pub fn dsn(&self) -> String {
        self.auth.read().dsn.clone()
    }

    async fn setup_iam_auth(
        self: &Arc<Self>,
        cancel: &CancellationToken,
        config: &IamAuthConfig,
        provider: &dyn CredentialProvider,
    ) -> Result<(), ConnectorError> {
        let creds = provider
            .create(config)
            .await
            .map_err(ConnectorError::CredentialCreation)?;
        self.refresh_auth_token(&creds, &config.region)
            .map_err(ConnectorError::TokenDerivation)?;

        self.spawn_renewal(
            creds,
            config.region.clone(),
            REFRESH_AUTH_TOKEN_INTERVAL,
            cancel.clone(),
        );
        Ok(())
    }

    /// 启动后台续期任务，任务只在 `cancel` 触发后退出
    ///
    /// `period` 必须大于 0
    pub fn spawn_renewal(
        self: &Arc<Self>,
        creds: CredentialBundle,
        region: String,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let connector = Arc::clone(self);
        tokio::spawn(async move {
            connector
                .renew_periodically(creds, region, period, cancel)
                .await;
        })
    }

    async fn renew_periodically(
        &self,
        creds: CredentialBundle,
        region: String,
        period: Duration,
        cancel: CancellationToken,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(host = %self.host, "auth token 续期任务已停止");
                    return;
                }
                _ = ticker.tick() => {
                    tracing::info!(host = %self.host, "try to refresh auth token");
                    match self.refresh_auth_token(&creds, &region) {
                        Ok(()) => tracing::debug!(host = %self.host, "auth token 已刷新"),
                        // 续期失败不致命，继续使用旧 DSN 等待下一轮
                        Err(e) => tracing::error!(
                            host = %self.host,
                            error = %e,
                            "failed to refresh auth token"
                        ),
                    }
                }
            }
        }
    }

    fn refresh_auth_token(&self, creds: &CredentialBundle, region: &str) -> anyhow::Result<()> {
        let token = self.deriver.derive(&TokenRequest {
            host: &self.host,
            port: self.port,
            region,
            user: &self.user,
            credentials: creds,
        })?;
        self.update_password(token);
        Ok(())
    }

    fn update_password(&self, password: String) {
        let dsn = self.assemble_dsn(&password);
        *self.auth.write() = AuthState { password, dsn };
    }

    fn assemble_dsn(&self, password: &str) -> String {
        let mut dsn = format!(
            "host={} port={} dbname={} user={} password={} sslmode={}",
            self.host, self.port, self.db_name, self.user, password, self.ssl_mode
        );
        if !self.ssl_root_cert.is_empty() {
            dsn = format!("{} sslrootcert={}", dsn, self.ssl_root_cert);
        }
        dsn
    }

    #[cfg(test)]
    fn password(&self) -> String {
        self.auth.read().password.clone()
    }
}
