use clap::Parser;

/// RDS 连接器命令行参数
#[derive(Parser, Debug)]
#[command(name = "grafeas-rds", version, about = "Grafeas RDS connector with IAM auth")]
pub struct Args {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<String>,

    /// 读写分离模式，额外构建读库连接器
    #[arg(long)]
    pub read_write: bool,

    /// 用当前 DSN 建立一次真实连接（需要 postgres feature）
    #[arg(long)]
    pub check: bool,

    /// 持续续期 token，直到 Ctrl-C
    #[arg(long)]
    pub watch: bool,
}
