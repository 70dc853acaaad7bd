// apps/fv_cli/src/main.rs

//! ForestVTK 命令行界面
//!
//! 生成规则细分的砖块森林，在线程模拟的进程组上分区导出为 VTK XML。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// ForestVTK 森林导出工具
#[derive(Parser)]
#[command(name = "fv_cli")]
#[command(author = "ForestVTK Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Export partitioned quadtree/octree forests to VTK XML", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 导出规则森林
    Export(commands::export::ExportArgs),
    /// 显示或检查导出配置
    Config(commands::config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Export(args) => commands::export::execute(args),
        Commands::Config(args) => commands::config::execute(args),
    }
}
