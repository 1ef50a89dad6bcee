//! 单元测试共用的替身实现

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::model::config::{Config, CredentialProviderConfig, IamAuthConfig};

use super::credentials::{CredentialBundle, CredentialProvider};
use super::driver::Driver;
use super::token::{TokenDeriver, TokenRequest};

/// 记录每次打开时使用的 DSN，连接本身就是 DSN 字符串
#[derive(Default)]
pub(crate) struct FakeDriver {
    pub(crate) opened: Mutex<Vec<String>>,
    pub(crate) pinged: Mutex<Vec<String>>,
}

#[async_trait]
impl Driver for FakeDriver {
    type Connection = String;

    async fn open(&self, dsn: &str) -> anyhow::Result<String> {
        self.opened.lock().push(dsn.to_string());
        Ok(dsn.to_string())
    }

    async fn ping(&self, conn: &mut String) -> anyhow::Result<()> {
        self.pinged.lock().push(conn.clone());
        Ok(())
    }
}

/// 每次生成 `token-<n>`，并记录使用的 region
#[derive(Default)]
pub(crate) struct CountingDeriver {
    pub(crate) calls: AtomicUsize,
    pub(crate) regions: Mutex<Vec<String>>,
}

impl TokenDeriver for CountingDeriver {
    fn derive(&self, request: &TokenRequest<'_>) -> anyhow::Result<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.regions.lock().push(request.region.to_string());
        Ok(format!("token-{}", n))
    }
}

#[derive(Default)]
pub(crate) struct FailingDeriver {
    pub(crate) calls: AtomicUsize,
}

impl TokenDeriver for FailingDeriver {
    fn derive(&self, _request: &TokenRequest<'_>) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("token service unavailable")
    }
}

/// 返回固定凭据（或固定失败），并统计调用次数
pub(crate) struct CountingProvider {
    pub(crate) calls: AtomicUsize,
    bundle: Option<CredentialBundle>,
}

impl CountingProvider {
    pub(crate) fn new(bundle: CredentialBundle) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            bundle: Some(bundle),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            bundle: None,
        }
    }
}

#[async_trait]
impl CredentialProvider for CountingProvider {
    async fn create(&self, _config: &IamAuthConfig) -> anyhow::Result<CredentialBundle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bundle
            .clone()
            .ok_or_else(|| anyhow::anyhow!("identity service rejected the request"))
    }
}

/// 已补默认值的静态密码配置
pub(crate) fn static_config() -> Config {
    Config {
        host: "localhost".to_string(),
        port: 5432,
        db_name: "grafeas".to_string(),
        user: "grafeas_rw".to_string(),
        password: "pw".to_string(),
        ssl_mode: "disable".to_string(),
        ..Config::default()
    }
}

/// 已补默认值的 IAM 配置
pub(crate) fn iam_config() -> Config {
    Config {
        password: String::new(),
        iam_auth: IamAuthConfig {
            region: "us-west-2".to_string(),
            credentials_provider: CredentialProviderConfig {
                api_endpoint: "https://zts.athenz.company.com:4443/zts/v1".to_string(),
                athenz_domain: "grafeas".to_string(),
                iam_role: "some-role.grafeas".to_string(),
                external_id: String::new(),
                renew_threshold_in_seconds: 600,
            },
        },
        ..static_config()
    }
}
