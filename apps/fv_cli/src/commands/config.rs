// apps/fv_cli/src/commands/config.rs

//! 配置命令
//!
//! 打印默认导出配置，或加载并校验一个配置文件。

use anyhow::{Context, Result};
use clap::Args;
use fv_io::ExportConfig;
use std::path::PathBuf;
use tracing::info;

/// 配置参数
#[derive(Args)]
pub struct ConfigArgs {
    /// 待检查的配置文件
    #[arg(short, long)]
    pub check: Option<PathBuf>,

    /// 打印启用全部内置字段的配置
    #[arg(long)]
    pub full: bool,
}

/// 执行配置命令
pub fn execute(args: ConfigArgs) -> Result<()> {
    let config = match &args.check {
        Some(path) => {
            let config = ExportConfig::from_json_file(path)
                .with_context(|| format!("配置文件 {} 无效", path.display()))?;
            info!("配置文件 {} 有效", path.display());
            config
        }
        None if args.full => ExportConfig::full(),
        None => ExportConfig::default(),
    };

    let text = serde_json::to_string_pretty(&config).context("序列化配置失败")?;
    println!("{text}");
    Ok(())
}
