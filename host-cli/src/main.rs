//! vn-stage 无界面宿主入口
//!
//! ```bash
//! # 检查资源包
//! vn-stage-cli check --assets-root assets
//!
//! # 播放故事，段落结束时选择最后一个链接
//! vn-stage-cli run --story main --choice last
//! ```

use clap::{Parser, Subcommand};
use host_cli::{AppConfig, ChoiceStrategy, ConfigOverrides, SessionStatus};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "vn-stage-cli")]
#[command(about = "视觉小说舞台无界面宿主 - 加载资源包并驱动故事播放")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 配置文件（默认：config.json）
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// 资源目录（覆盖配置文件）
    #[arg(short, long, global = true)]
    assets_root: Option<PathBuf>,

    /// 日志级别（覆盖配置文件）
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 播放故事
    Run {
        /// 故事 ID
        #[arg(short, long)]
        story: Option<String>,

        /// 主循环间隔（毫秒）
        #[arg(long)]
        tick_ms: Option<u64>,

        /// 最大循环次数
        #[arg(long)]
        max_ticks: Option<u64>,

        /// 自动选择链接的策略
        #[arg(long, value_enum)]
        choice: Option<ChoiceStrategy>,

        /// 不模拟动画完成，所有批次都等待超时
        #[arg(long)]
        no_simulate: bool,
    },

    /// 检查资源包
    Check,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 配置加载失败时先用默认配置，日志初始化之后再报告
    let loaded = AppConfig::load(&cli.config);
    let mut config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => AppConfig::default(),
    };

    let mut overrides = ConfigOverrides {
        assets_root: cli.assets_root,
        log_level: cli.log_level,
        ..ConfigOverrides::default()
    };
    if let Commands::Run {
        story,
        tick_ms,
        max_ticks,
        choice,
        no_simulate,
    } = &cli.command
    {
        overrides.start_story = story.clone();
        overrides.tick_ms = *tick_ms;
        overrides.max_ticks = *max_ticks;
        overrides.choice_strategy = *choice;
        overrides.no_simulate = *no_simulate;
    }
    overrides.apply(&mut config);

    tracing_subscriber::fmt()
        .with_max_level(config.tracing_level())
        .with_target(false)
        .init();

    if let Err(e) = loaded {
        warn!(path = %cli.config.display(), error = %e, "配置文件加载失败，使用默认配置");
    }

    match cli.command {
        Commands::Check => {
            let summary = host_cli::check(&config)?;
            info!(
                assets = summary.assets,
                stories = ?summary.stories,
                "资源包检查通过"
            );
        }
        Commands::Run { .. } => {
            let report = host_cli::run(&config).await?;
            match report.status {
                SessionStatus::Ended { record } => {
                    info!(ticks = report.ticks, events = record.events.len(), "故事结束");
                }
                SessionStatus::Failed(message) => {
                    error!(ticks = report.ticks, %message, "故事播放失败");
                    anyhow::bail!(message);
                }
                SessionStatus::Stalled => {
                    warn!(ticks = report.ticks, "段落结束但没有可选择的链接");
                }
                SessionStatus::Running => {
                    warn!(ticks = report.ticks, "达到最大循环次数，停止播放");
                }
            }
        }
    }

    Ok(())
}
