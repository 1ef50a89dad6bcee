//! 临时 AWS 凭据及其提供者

use std::fmt;

use async_trait::async_trait;

use crate::model::config::IamAuthConfig;

/// 临时访问凭据（access key / secret / session token）
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialBundle {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl CredentialBundle {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: impl Into<String>,
    ) -> Self {
        let session_token: String = session_token.into();
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: (!session_token.is_empty()).then_some(session_token),
        }
    }

    /// 匿名凭据，无法用于签名
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// 缺 access key 或 secret 时无法签名
    pub fn is_anonymous(&self) -> bool {
        self.access_key_id.is_empty() || self.secret_access_key.is_empty()
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialBundle")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// 凭据提供者抽象
///
/// 根据 IAM 配置向身份服务申请一份临时凭据
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn create(&self, config: &IamAuthConfig) -> anyhow::Result<CredentialBundle>;
}

/// 固定凭据
pub struct StaticCredentialProvider {
    bundle: CredentialBundle,
}

impl StaticCredentialProvider {
    pub fn new(bundle: CredentialBundle) -> Self {
        Self { bundle }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn create(&self, _config: &IamAuthConfig) -> anyhow::Result<CredentialBundle> {
        Ok(self.bundle.clone())
    }
}

/// 从标准 AWS 环境变量读取凭据
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    pub const ACCESS_KEY_ID: &'static str = "AWS_ACCESS_KEY_ID";
    pub const SECRET_ACCESS_KEY: &'static str = "AWS_SECRET_ACCESS_KEY";
    pub const SESSION_TOKEN: &'static str = "AWS_SESSION_TOKEN";
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn create(&self, config: &IamAuthConfig) -> anyhow::Result<CredentialBundle> {
        let access_key_id = std::env::var(Self::ACCESS_KEY_ID)
            .map_err(|_| anyhow::anyhow!("环境变量 {} 未设置", Self::ACCESS_KEY_ID))?;
        let secret_access_key = std::env::var(Self::SECRET_ACCESS_KEY)
            .map_err(|_| anyhow::anyhow!("环境变量 {} 未设置", Self::SECRET_ACCESS_KEY))?;
        let session_token = std::env::var(Self::SESSION_TOKEN).unwrap_or_default();

        tracing::debug!(
            region = %config.region,
            role = %config.credentials_provider.iam_role,
            "已从环境变量加载 AWS 凭据"
        );
        Ok(CredentialBundle::new(
            access_key_id,
            secret_access_key,
            session_token,
        ))
    }
}
