//! # Config 模块
//!
//! 引擎配置。所有字段都有默认值，宿主可以只在配置文件中覆盖需要的部分。

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 文本逐字显示时每个字符的时长（毫秒）
    #[serde(default = "default_text_char_duration_ms")]
    pub text_char_duration_ms: u64,

    /// 批次超时倍率：单个动画上限 = 倍率 × (延迟 + 时长)
    #[serde(default = "default_batch_timeout_multiplier")]
    pub batch_timeout_multiplier: u32,

    /// 无法从动画推算时使用的批次超时（毫秒）
    #[serde(default = "default_batch_timeout_ms")]
    pub default_batch_timeout_ms: u64,
}

fn default_text_char_duration_ms() -> u64 {
    25
}

fn default_batch_timeout_multiplier() -> u32 {
    2
}

fn default_batch_timeout_ms() -> u64 {
    10_000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            text_char_duration_ms: default_text_char_duration_ms(),
            batch_timeout_multiplier: default_batch_timeout_multiplier(),
            default_batch_timeout_ms: default_batch_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// 默认批次超时
    pub fn default_batch_timeout(&self) -> Duration {
        Duration::from_millis(self.default_batch_timeout_ms)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_timeout_multiplier == 0 {
            return Err(ConfigError::InvalidValue {
                field: "batch_timeout_multiplier".to_string(),
                message: "倍率必须大于 0".to_string(),
            });
        }

        if self.default_batch_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_batch_timeout_ms".to_string(),
                message: "默认超时必须大于 0".to_string(),
            });
        }

        Ok(())
    }
}
