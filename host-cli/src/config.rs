//! # Config 模块
//!
//! 宿主配置。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{Level, warn};
use vn_stage::{ConfigError, EngineConfig};

use crate::error::{HostError, HostResult};

/// 段落结束时自动选择链接的策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceStrategy {
    /// 选择第一个链接
    #[default]
    First,
    /// 选择最后一个链接
    Last,
}

impl ChoiceStrategy {
    pub fn pick<'a, T>(&self, options: &'a [T]) -> Option<&'a T> {
        match self {
            ChoiceStrategy::First => options.first(),
            ChoiceStrategy::Last => options.last(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 资源根目录
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 启动时播放的故事 ID
    #[serde(default = "default_start_story")]
    pub start_story: String,

    /// 主循环间隔（毫秒），同时作为每次推进的模拟时长
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// 最大循环次数
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// 自动选择链接的策略
    #[serde(default)]
    pub choice_strategy: ChoiceStrategy,

    /// 是否模拟 UI 报告动画完成
    ///
    /// 关闭后所有批次都只能通过超时结束。
    #[serde(default = "default_simulate_completion")]
    pub simulate_completion: bool,

    /// 日志级别（trace / debug / info / warn / error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 引擎配置
    #[serde(default)]
    pub engine: EngineConfig,
}

// 默认值函数

fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_start_story() -> String {
    "main".to_string()
}

fn default_tick_ms() -> u64 {
    16
}

fn default_max_ticks() -> u64 {
    10_000
}

fn default_simulate_completion() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            start_story: default_start_story(),
            tick_ms: default_tick_ms(),
            max_ticks: default_max_ticks(),
            choice_strategy: ChoiceStrategy::default(),
            simulate_completion: default_simulate_completion(),
            log_level: default_log_level(),
            engine: EngineConfig::default(),
        }
    }
}

impl AppConfig {
    /// 读取配置文件
    pub fn load(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| HostError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 读取配置文件，不存在或解析失败时使用默认配置
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "配置文件加载失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 每次推进的模拟时长
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// 日志级别，无法识别时回退到 INFO
    pub fn tracing_level(&self) -> Level {
        self.log_level.parse().unwrap_or(Level::INFO)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> HostResult<()> {
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "循环间隔必须大于 0"));
        }
        if self.max_ticks == 0 {
            return Err(invalid("max_ticks", "最大循环次数必须大于 0"));
        }
        if self.start_story.is_empty() {
            return Err(invalid("start_story", "故事 ID 不能为空"));
        }
        self.engine.validate()?;
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> HostError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub assets_root: Option<PathBuf>,
    pub start_story: Option<String>,
    pub tick_ms: Option<u64>,
    pub max_ticks: Option<u64>,
    pub choice_strategy: Option<ChoiceStrategy>,
    pub no_simulate: bool,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(assets_root) = self.assets_root {
            config.assets_root = assets_root;
        }
        if let Some(start_story) = self.start_story {
            config.start_story = start_story;
        }
        if let Some(tick_ms) = self.tick_ms {
            config.tick_ms = tick_ms;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        if let Some(strategy) = self.choice_strategy {
            config.choice_strategy = strategy;
        }
        if self.no_simulate {
            config.simulate_completion = false;
        }
        if let Some(log_level) = self.log_level {
            config.log_level = log_level;
        }
    }
}
