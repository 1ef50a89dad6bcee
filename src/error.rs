//! 错误类型定义
//!
//! 配置、连接器、存储三个阶段各自一套错误，消息格式与宿主系统保持一致

use thiserror::Error as ThisError;

/// 配置解析/校验错误
#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to convert the generic storage config to a rds config, err: {0}")]
    Conversion(#[source] serde_json::Error),

    #[error("failed to read config file {path}, err: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid field: \"{0}\" must not be empty")]
    EmptyField(&'static str),

    #[error("invalid field: {message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// 出错的字段名（转换/读取错误没有字段）
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ConfigError::EmptyField(field) | ConfigError::InvalidField { field, .. } => {
                Some(*field)
            }
            ConfigError::Conversion(_) | ConfigError::Io { .. } => None,
        }
    }
}

/// 连接器初始化错误
///
/// 只覆盖首次握手；定时续期失败只记日志，不会变成错误
#[derive(Debug, ThisError)]
pub enum ConnectorError {
    #[error("failed to set up IAM auth, err: failed to create AWS credentials, err: {0}")]
    CredentialCreation(#[source] anyhow::Error),

    #[error("failed to set up IAM auth, err: failed to refresh auth token, err: {0}")]
    TokenDerivation(#[source] anyhow::Error),
}

/// 存储初始化错误，按阶段区分
#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("failed to initialize config, err: {0}")]
    ConfigInit(#[from] ConfigError),

    #[error("failed to initialize connector, err: {0}")]
    ConnectorInit(#[from] ConnectorError),

    #[error("failed to initialize store, err: {0}")]
    StorageInit(#[source] anyhow::Error),
}
