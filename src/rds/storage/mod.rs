//! 存储装配层
//!
//! 解析配置、构建连接器，再交给外部存储引擎并设置连接池参数：
//! - 单端点：`RdsStorageProvider::provide`
//! - 读写分离：`RdsStorageProvider::provide_read_write`

mod provider;
mod traits;

pub use provider::{RdsStorageProvider, set_conn_pool_params};
pub use traits::{ConnPoolManager, Storage, StorageCreator};
