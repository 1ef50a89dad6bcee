//! RDS 连接器
//!
//! - `connector`: DSN 拼装与 IAM token 定时续期
//! - `credentials` / `token`: 可替换的凭据提供者与 token 生成器
//! - `driver`: 底层数据库驱动抽象（`postgres` feature 提供 sqlx 实现）
//! - `storage`: 把连接器交给存储引擎并设置连接池

pub mod connector;
pub mod credentials;
pub mod driver;
pub mod storage;
pub mod token;

#[cfg(test)]
mod testing;

pub use connector::{Connector, REFRESH_AUTH_TOKEN_INTERVAL};
pub use credentials::{
    CredentialBundle, CredentialProvider, EnvCredentialProvider, StaticCredentialProvider,
};
pub use driver::Driver;
pub use storage::{ConnPoolManager, RdsStorageProvider, Storage, StorageCreator};
pub use token::{RdsTokenDeriver, TokenDeriver, TokenRequest};
