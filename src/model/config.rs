//! RDS 存储配置
//!
//! 字段名与宿主系统的 storage 配置保持一致（JSON 键），
//! 缺省字段按零值处理，随后补默认值、再做校验

use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_PORT: i32 = 5432;
pub const DEFAULT_DB_NAME: &str = "grafeas";
pub const DEFAULT_SSL_MODE: &str = "verify-full";
pub const DEFAULT_RENEW_THRESHOLD_IN_SECONDS: i64 = 600;

/// PostgreSQL (RDS) 存储配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: i32,
    /// 数据库必须已存在，且 `user` 有权访问
    pub db_name: String,
    pub user: String,
    /// 为空时走 IAM 认证
    pub password: String,
    /// disable / allow / prefer / require / verify-ca / verify-full
    pub ssl_mode: String,
    pub ssl_root_cert: String,
    /// 分页 token 加密用的 key，原样交给存储引擎
    pub pagination_key: String,
    /// 读库地址；读写分离模式下使用，为空则读写都连 `host`
    pub reader: String,
    pub conn_pool: ConnPoolConfig,
    /// 仅在 `password` 为空时使用
    pub iam_auth: IamAuthConfig,
}

/// 连接池参数
///
/// 0 本身是合法取值，所以这里不补默认值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnPoolConfig {
    pub max_open_conns: u32,
    pub max_idle_conns: u32,
    pub conn_max_lifetime_in_seconds: u64,
    pub conn_max_idle_time_in_seconds: u64,
}

/// 获取临时数据库密码（token）所需的配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IamAuthConfig {
    /// 数据库所在的 AWS region
    pub region: String,
    pub credentials_provider: CredentialProviderConfig,
}

/// 向身份服务申请临时 AWS 凭据的配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialProviderConfig {
    pub api_endpoint: String,
    pub athenz_domain: String,
    /// 有数据库访问权限的 IAM role
    pub iam_role: String,
    pub external_id: String,
    /// 凭据过期前多少秒开始续期
    pub renew_threshold_in_seconds: i64,
}

impl Config {
    pub fn default_config_path() -> &'static str {
        "config.json"
    }

    /// 从通用配置载荷解析出 RDS 配置：转换 → 补默认值 → 校验
    pub fn resolve(payload: serde_json::Value) -> Result<Self, ConfigError> {
        let mut config: Config =
            serde_json::from_value(payload).map_err(ConfigError::Conversion)?;
        config.populate_default_values();
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件加载配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let payload: serde_json::Value =
            serde_json::from_str(&content).map_err(ConfigError::Conversion)?;
        Self::resolve(payload)
    }

    /// 是否需要走 IAM 认证
    pub fn uses_iam_auth(&self) -> bool {
        self.password.is_empty()
    }

    fn populate_default_values(&mut self) {
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        if self.db_name.is_empty() {
            self.db_name = DEFAULT_DB_NAME.to_string();
        }
        if self.ssl_mode.is_empty() {
            self.ssl_mode = DEFAULT_SSL_MODE.to_string();
        }
        self.iam_auth.populate_default_values();
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyField("Config.Host"));
        }
        if self.port <= 0 {
            return Err(ConfigError::InvalidField {
                field: "Config.Port",
                message: format!(
                    "\"Config.Port\" must be larger than zero, got {}",
                    self.port
                ),
            });
        }
        if self.port > i32::from(u16::MAX) {
            return Err(ConfigError::InvalidField {
                field: "Config.Port",
                message: format!(
                    "\"Config.Port\" must not exceed {}, got {}",
                    u16::MAX,
                    self.port
                ),
            });
        }
        if self.user.is_empty() {
            return Err(ConfigError::EmptyField("Config.User"));
        }
        if self.ssl_root_cert.is_empty()
            && (self.ssl_mode == "verify-ca" || self.ssl_mode == "verify-full")
        {
            return Err(ConfigError::InvalidField {
                field: "Config.SSLRootCert",
                message: format!(
                    "Config.SSLRootCert must not be empty because SSLMode is {}",
                    self.ssl_mode
                ),
            });
        }
        if !self.password.is_empty() {
            return Ok(());
        }
        // 密码为空，IAM 配置必须有效
        self.iam_auth.validate()
    }
}

impl IamAuthConfig {
    fn populate_default_values(&mut self) {
        self.credentials_provider.populate_default_values();
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.region.is_empty() {
            return Err(ConfigError::EmptyField("IAMAuthConfig.Region"));
        }
        self.credentials_provider.validate()
    }
}

impl CredentialProviderConfig {
    fn populate_default_values(&mut self) {
        if self.renew_threshold_in_seconds == 0 {
            self.renew_threshold_in_seconds = DEFAULT_RENEW_THRESHOLD_IN_SECONDS;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = parse_endpoint(&self.api_endpoint) {
            return Err(ConfigError::InvalidField {
                field: "CredentialProviderConfig.APIEndpoint",
                message: format!(
                    "\"CredentialProviderConfig.APIEndpoint\" should be a valid url, err: {}",
                    e
                ),
            });
        }
        if self.athenz_domain.is_empty() {
            return Err(ConfigError::EmptyField("CredentialProviderConfig.AthenzDomain"));
        }
        if self.iam_role.is_empty() {
            return Err(ConfigError::EmptyField("CredentialProviderConfig.IAMRole"));
        }
        if self.renew_threshold_in_seconds <= 0 {
            return Err(ConfigError::InvalidField {
                field: "CredentialProviderConfig.RenewThreshold",
                message: format!(
                    "\"CredentialProviderConfig.RenewThreshold\" must be greater than 0, got {}",
                    self.renew_threshold_in_seconds
                ),
            });
        }
        Ok(())
    }
}

/// 只做语法检查；相对引用按一个占位 base 解析
fn parse_endpoint(endpoint: &str) -> Result<Url, url::ParseError> {
    Url::parse("http://localhost/")?.join(endpoint)
}
