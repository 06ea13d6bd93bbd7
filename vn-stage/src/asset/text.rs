//! # Text 模块
//!
//! 文本框资源。每个文本都派生出一个逐字显示的 [`TextAnimation`]。

use serde::{Deserialize, Serialize};

use super::{Animation, TextAnimation};
use crate::story::LinkEvent;

/// 文本动画的 base name
pub const TEXT_ANIMATION_BASE_NAME: &str = "Text";

/// 普通文本框
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    pub id: String,
    pub value: String,
}

impl TextBox {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }
}

/// 链接（选项）文本
///
/// ID 与链接事件的 ID 相同，显示文本为空时取空字符串。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkText {
    pub link: LinkEvent,
    /// 该链接是否已被玩家选择过
    #[serde(default)]
    pub was_chosen: bool,
}

impl LinkText {
    pub fn new(link: LinkEvent) -> Self {
        Self {
            link,
            was_chosen: false,
        }
    }

    pub fn chosen(link: LinkEvent) -> Self {
        Self {
            link,
            was_chosen: true,
        }
    }

    pub fn id(&self) -> &str {
        &self.link.id
    }

    pub fn value(&self) -> &str {
        self.link.link_text.as_deref().unwrap_or("")
    }
}

/// 文本
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Text {
    /// 旁白/信息文本
    Info(TextBox),
    /// 玩家文本
    Player(TextBox),
    /// 角色台词
    Character(TextBox),
    /// 链接（选项）
    Link(LinkText),
}

impl Text {
    pub fn id(&self) -> &str {
        match self {
            Text::Info(t) | Text::Player(t) | Text::Character(t) => &t.id,
            Text::Link(link) => link.id(),
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Text::Info(t) | Text::Player(t) | Text::Character(t) => &t.value,
            Text::Link(link) => link.value(),
        }
    }

    /// 派生的逐字显示动画
    pub fn animation(&self, char_duration_ms: u64) -> Animation {
        Animation::Text(TextAnimation::new(
            TEXT_ANIMATION_BASE_NAME,
            self.id(),
            self.value(),
            char_duration_ms,
        ))
    }
}
