//! # Timeout 模块
//!
//! 批次超时策略。
//!
//! 单个动画的上限 = 倍率 × (延迟 + 单次播放时长)，文本动画的播放时长按字符数计算。
//! 批次超时取所有成员上限的最大值；空批次或上限为零时使用默认超时。

use std::time::Duration;

use crate::asset::Animation;
use crate::config::EngineConfig;

/// 超时策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    multiplier: u32,
    default_timeout: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl TimeoutPolicy {
    pub fn new(multiplier: u32, default_timeout: Duration) -> Self {
        Self {
            multiplier,
            default_timeout,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.batch_timeout_multiplier, config.default_batch_timeout())
    }

    /// 单个动画的超时上限
    pub fn ceiling(&self, animation: &Animation) -> Duration {
        animation.expected_duration().saturating_mul(self.multiplier)
    }

    /// 整个批次的超时
    pub fn batch_timeout(&self, animations: &[Animation]) -> Duration {
        animations
            .iter()
            .map(|animation| self.ceiling(animation))
            .max()
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(self.default_timeout)
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{SpriteSheetAnimation, SpriteTransitionAnimation, TextAnimation};

    fn sheet(name: &str, duration_ms: u64, delay_ms: u64) -> Animation {
        Animation::SpriteSheet(SpriteSheetAnimation {
            base_name: "fx".to_string(),
            name: name.to_string(),
            duration_ms,
            delay_ms,
            repeat: false,
            frames: Vec::new(),
        })
    }

    #[test]
    fn test_ceiling_includes_delay() {
        let policy = TimeoutPolicy::default();
        assert_eq!(policy.ceiling(&sheet("a", 50, 0)), Duration::from_millis(100));
        assert_eq!(policy.ceiling(&sheet("b", 50, 25)), Duration::from_millis(150));
    }

    #[test]
    fn test_text_ceiling_counts_chars() {
        let policy = TimeoutPolicy::default();
        // 4 个字符（非 4 个字节）
        let text = Animation::Text(TextAnimation::new("Text", "t", "早上好！", 25));
        assert_eq!(policy.ceiling(&text), Duration::from_millis(200));
    }

    #[test]
    fn test_batch_timeout_is_max_ceiling() {
        let policy = TimeoutPolicy::default();
        let batch = vec![
            sheet("a", 50, 0),
            Animation::SpriteTransition(SpriteTransitionAnimation::new("alice", "smile", "alice", "alice_smile")),
        ];
        assert_eq!(policy.batch_timeout(&batch), Duration::from_millis(1000));
    }

    #[test]
    fn test_degenerate_batches_use_default() {
        let policy = TimeoutPolicy::new(3, Duration::from_secs(7));
        assert_eq!(policy.batch_timeout(&[]), Duration::from_secs(7));
        assert_eq!(policy.batch_timeout(&[sheet("zero", 0, 0)]), Duration::from_secs(7));
        assert_eq!(policy.batch_timeout(&[sheet("a", 10, 0)]), Duration::from_millis(30));
    }
}
