//! 底层数据库驱动抽象
//!
//! 连接器只负责拼装 DSN，真正建立连接交给驱动

use async_trait::async_trait;

/// 底层驱动：用 DSN 打开一条连接
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    type Connection: Send;

    async fn open(&self, dsn: &str) -> anyhow::Result<Self::Connection>;

    /// 在已打开的连接上做一次最轻量的往返
    async fn ping(&self, conn: &mut Self::Connection) -> anyhow::Result<()>;
}

/// 拆分 `key=value` 形式的 DSN
///
/// 值中允许出现 `=`（IAM token 里就有），但不能含空白
pub fn dsn_pairs(dsn: &str) -> impl Iterator<Item = anyhow::Result<(&str, &str)>> + '_ {
    dsn.split_whitespace().map(|pair| {
        pair.split_once('=')
            .ok_or_else(|| anyhow::anyhow!("DSN 片段缺少 '=': {}", pair))
    })
}

/// 隐藏 DSN 中的密码，用于日志/输出
pub fn mask_password(dsn: &str) -> String {
    dsn.split_whitespace()
        .map(|pair| match pair.split_once('=') {
            Some(("password", _)) => "password=***".to_string(),
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(feature = "postgres")]
pub use postgres::PgDriver;

#[cfg(feature = "postgres")]
mod postgres {
    use async_trait::async_trait;
    use sqlx::Connection;
    use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};

    use super::{Driver, dsn_pairs};

    /// 基于 sqlx 的 PostgreSQL 驱动
    #[derive(Debug, Clone, Copy, Default)]
    pub struct PgDriver;

    impl PgDriver {
        /// 把 DSN 转成 sqlx 连接参数
        pub fn connect_options(dsn: &str) -> anyhow::Result<PgConnectOptions> {
            let mut options = PgConnectOptions::new();
            for pair in dsn_pairs(dsn) {
                let (key, value) = pair?;
                options = match key {
                    "host" => options.host(value),
                    "port" => options.port(value.parse()?),
                    "dbname" => options.database(value),
                    "user" => options.username(value),
                    "password" => options.password(value),
                    "sslmode" => options.ssl_mode(value.parse::<PgSslMode>()?),
                    "sslrootcert" => options.ssl_root_cert(value),
                    other => anyhow::bail!("不支持的 DSN 参数: {}", other),
                };
            }
            Ok(options)
        }
    }

    #[async_trait]
    impl Driver for PgDriver {
        type Connection = PgConnection;

        async fn open(&self, dsn: &str) -> anyhow::Result<PgConnection> {
            let options = Self::connect_options(dsn)?;
            let conn = PgConnection::connect_with(&options).await?;
            Ok(conn)
        }

        async fn ping(&self, conn: &mut PgConnection) -> anyhow::Result<()> {
            sqlx::query("SELECT 1").execute(&mut *conn).await?;
            Ok(())
        }
    }

}
