use std::sync::Arc;

use clap::Parser;
use grafeas_rds::model::arg::Args;
use grafeas_rds::model::config::Config;
use grafeas_rds::rds::driver::mask_password;
use grafeas_rds::rds::{
    Connector, CredentialProvider, Driver, EnvCredentialProvider, RdsTokenDeriver, TokenDeriver,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // 加载配置
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| Config::default_config_path().to_string());
    let config = Config::load(&config_path).unwrap_or_else(|e| {
        tracing::error!("加载配置失败: {}", e);
        std::process::exit(1);
    });

    #[cfg(feature = "postgres")]
    let driver = Arc::new(grafeas_rds::rds::driver::PgDriver);
    #[cfg(not(feature = "postgres"))]
    let driver = Arc::new(DryRunDriver);

    if let Err(e) = run(&args, &config, driver).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run<D: Driver>(args: &Args, config: &Config, driver: Arc<D>) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let credentials: Option<Arc<dyn CredentialProvider>> = if config.uses_iam_auth() {
        tracing::info!(region = %config.iam_auth.region, "使用 IAM 认证，凭据来自环境变量");
        Some(Arc::new(EnvCredentialProvider))
    } else {
        None
    };
    let deriver: Arc<dyn TokenDeriver> = Arc::new(RdsTokenDeriver);

    let mut connectors = vec![(
        "writer",
        Connector::new(
            &cancel,
            config,
            driver.clone(),
            credentials.clone(),
            deriver.clone(),
            "",
        )
        .await?,
    )];
    if args.read_write {
        let reader = Connector::new(
            &cancel,
            config,
            driver.clone(),
            credentials.clone(),
            deriver.clone(),
            &config.reader,
        )
        .await?;
        connectors.push(("reader", reader));
    }

    for (role, connector) in &connectors {
        tracing::info!(role, dsn = %mask_password(&connector.dsn()), "连接器已就绪");
    }

    if args.check {
        for (role, connector) in &connectors {
            connector.check().await?;
            tracing::info!(role, host = connector.host(), "连接检查通过");
        }
    }

    if args.watch && config.uses_iam_auth() {
        tracing::info!("token 将定时续期，按 Ctrl-C 退出");
        tokio::signal::ctrl_c().await?;
    }

    cancel.cancel();
    Ok(())
}

/// 未启用 postgres feature 时只拼装 DSN，不建立连接
#[cfg(not(feature = "postgres"))]
struct DryRunDriver;

#[cfg(not(feature = "postgres"))]
#[async_trait::async_trait]
impl Driver for DryRunDriver {
    type Connection = ();

    async fn open(&self, _dsn: &str) -> anyhow::Result<()> {
        anyhow::bail!("未启用 postgres feature，无法建立连接")
    }

    async fn ping(&self, _conn: &mut ()) -> anyhow::Result<()> {
        Ok(())
    }
}
