//! # Animation 模块
//!
//! 动画描述资源。引擎只负责调度与同步，不负责插值和绘制。
//!
//! 动画 ID 由 `base_name` 与 `name` 组合而成（`"{base_name}_{name}"`），
//! 因为同一个立绘可以关联多个动画。

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 组合动画 ID
pub fn animation_id(base_name: &str, name: &str) -> String {
    format!("{}_{}", base_name, name)
}

fn default_text_duration_ms() -> u64 {
    25
}

fn default_sprite_duration_ms() -> u64 {
    500
}

/// 文本逐字显示动画
///
/// `duration_ms` 是**每个字符**的时长，总时长随文本长度变化。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextAnimation {
    pub base_name: String,
    pub name: String,
    /// 要显示的文本
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_text_duration_ms")]
    pub duration_ms: u64,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub repeat: bool,
}

impl TextAnimation {
    pub fn new(
        base_name: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        char_duration_ms: u64,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            name: name.into(),
            content: content.into(),
            duration_ms: char_duration_ms,
            delay_ms: 0,
            repeat: false,
        }
    }

    /// 全部字符显示完所需时长（不含延迟）
    pub fn reveal_duration(&self) -> Duration {
        let chars = self.content.chars().count() as u64;
        Duration::from_millis(self.duration_ms.saturating_mul(chars))
    }
}

/// 精灵表中的一帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteAnimationFrame {
    pub sprite_name: String,
    pub frame_index: u32,
    pub duration_ms: u64,
}

/// 精灵表动画
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteSheetAnimation {
    pub base_name: String,
    pub name: String,
    #[serde(default = "default_sprite_duration_ms")]
    pub duration_ms: u64,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub repeat: bool,
    #[serde(default)]
    pub frames: Vec<SpriteAnimationFrame>,
}

/// 精灵过渡动画
///
/// 把 `from_sprite_id` 的视觉属性过渡到 `to_sprite_id`。
/// 播放完成后，存储中 `from_sprite_id` 的条目会被替换为目标立绘。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteTransitionAnimation {
    pub base_name: String,
    pub name: String,
    #[serde(default = "default_sprite_duration_ms")]
    pub duration_ms: u64,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub repeat: bool,
    pub from_sprite_id: String,
    pub to_sprite_id: String,
}

impl SpriteTransitionAnimation {
    pub fn new(
        base_name: impl Into<String>,
        name: impl Into<String>,
        from_sprite_id: impl Into<String>,
        to_sprite_id: impl Into<String>,
    ) -> Self {
        Self {
            base_name: base_name.into(),
            name: name.into(),
            duration_ms: default_sprite_duration_ms(),
            delay_ms: 0,
            repeat: false,
            from_sprite_id: from_sprite_id.into(),
            to_sprite_id: to_sprite_id.into(),
        }
    }
}

/// 动画描述
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Animation {
    Text(TextAnimation),
    SpriteSheet(SpriteSheetAnimation),
    SpriteTransition(SpriteTransitionAnimation),
}

impl Animation {
    /// 动画 ID
    pub fn id(&self) -> String {
        animation_id(self.base_name(), self.name())
    }

    pub fn base_name(&self) -> &str {
        match self {
            Animation::Text(a) => &a.base_name,
            Animation::SpriteSheet(a) => &a.base_name,
            Animation::SpriteTransition(a) => &a.base_name,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Animation::Text(a) => &a.name,
            Animation::SpriteSheet(a) => &a.name,
            Animation::SpriteTransition(a) => &a.name,
        }
    }

    pub fn delay(&self) -> Duration {
        let delay_ms = match self {
            Animation::Text(a) => a.delay_ms,
            Animation::SpriteSheet(a) => a.delay_ms,
            Animation::SpriteTransition(a) => a.delay_ms,
        };
        Duration::from_millis(delay_ms)
    }

    pub fn repeat(&self) -> bool {
        match self {
            Animation::Text(a) => a.repeat,
            Animation::SpriteSheet(a) => a.repeat,
            Animation::SpriteTransition(a) => a.repeat,
        }
    }

    /// 单次播放时长（文本动画按字符数计算，不含延迟）
    pub fn play_duration(&self) -> Duration {
        match self {
            Animation::Text(a) => a.reveal_duration(),
            Animation::SpriteSheet(a) => Duration::from_millis(a.duration_ms),
            Animation::SpriteTransition(a) => Duration::from_millis(a.duration_ms),
        }
    }

    /// 从提交到预期完成的时长（延迟 + 单次播放时长）
    pub fn expected_duration(&self) -> Duration {
        self.delay() + self.play_duration()
    }
}
