//! # State 模块
//!
//! 解析后的渲染状态，供 UI 直接消费。

use crate::asset::{CharacterSprite, EnvironmentSprite, Text};
use crate::story::PlaythroughRecord;

/// 解析后的场景
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneRenderState {
    pub background: Option<EnvironmentSprite>,
    pub foreground: Option<EnvironmentSprite>,
    pub characters: Vec<CharacterSprite>,
    /// 当前说话的角色
    pub active_character: Option<CharacterSprite>,
    /// 文本框（保持 ID 顺序）
    pub text_boxes: Vec<Text>,
}

/// 故事级渲染状态
///
/// ```text
/// Initializing ──► Loading ──► Rendering(scene)
///                     │             │
///                     └─────────────┴──► Error(message) / Ended(record)
/// ```
///
/// `Error` 与 `Ended` 会一直保持，直到调用 `reset`。
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StoryRenderState {
    #[default]
    Initializing,
    /// 已请求故事，等待第一个场景
    Loading,
    Rendering(SceneRenderState),
    Error(String),
    Ended(PlaythroughRecord),
}

impl StoryRenderState {
    /// 是否处于需要 `reset` 才能离开的状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, StoryRenderState::Error(_) | StoryRenderState::Ended(_))
    }

    pub fn scene(&self) -> Option<&SceneRenderState> {
        match self {
            StoryRenderState::Rendering(scene) => Some(scene),
            _ => None,
        }
    }
}
