//! # Story 模块
//!
//! 叙事事件模型与外部故事引擎的协作契约。
//!
//! 故事脚本的解析和段落图的遍历都由外部故事引擎完成，
//! 引擎只消费它产出的事件序列：
//!
//! ```text
//! StoryEngine::start_playing(content) -> StoryPlayback
//! StoryPlayback::play_passage(link?)
//! StoryPlayback::play_results()  ──► DataReady { passage_events, playthrough_record }
//!                                └─► Error { message }
//! ```

use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::asset::{LinkText, StoryContent, Text, TextBox};
use crate::error::StoryImportError;
use crate::observable::ObservableView;

/// 链接（选项）事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkEvent {
    pub id: String,
    /// 显示文本（可能为空）
    #[serde(default)]
    pub link_text: Option<String>,
    /// 目标段落名称
    pub target_passage_name: String,
}

impl LinkEvent {
    pub fn new(
        id: impl Into<String>,
        link_text: Option<&str>,
        target_passage_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            link_text: link_text.map(str::to_string),
            target_passage_name: target_passage_name.into(),
        }
    }
}

/// 通关记录：到目前为止播放过的事件（包括选择过的链接）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaythroughRecord {
    #[serde(default)]
    pub events: Vec<NarrativeEvent>,
}

impl PlaythroughRecord {
    pub fn new(events: Vec<NarrativeEvent>) -> Self {
        Self { events }
    }

    /// 播放历史中可显示为文本框的部分
    pub fn played_texts(&self) -> impl Iterator<Item = Text> + '_ {
        self.events.iter().filter_map(NarrativeEvent::to_text)
    }
}

/// 叙事事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrativeEvent {
    /// 旁白/信息文本
    InformationalText { id: String, value: String },

    /// 角色动作：台词 + 表情
    CharacterAction {
        id: String,
        character_name: String,
        expression: String,
        text: String,
    },

    /// 玩家文本
    PlayerText { id: String, value: String },

    /// 链接（选项）
    Link(LinkEvent),

    /// 音效
    Sound { id: String, name: String },

    /// 故事结束
    StoryEnded {
        id: String,
        #[serde(default)]
        playthrough_record: PlaythroughRecord,
    },

    /// 宿主自定义事件
    Custom {
        id: String,
        name: String,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

impl NarrativeEvent {
    pub fn id(&self) -> &str {
        match self {
            NarrativeEvent::InformationalText { id, .. }
            | NarrativeEvent::CharacterAction { id, .. }
            | NarrativeEvent::PlayerText { id, .. }
            | NarrativeEvent::Sound { id, .. }
            | NarrativeEvent::StoryEnded { id, .. }
            | NarrativeEvent::Custom { id, .. } => id,
            NarrativeEvent::Link(link) => &link.id,
        }
    }

    /// 转换为文本资源（不带文本的事件返回 `None`）
    pub fn to_text(&self) -> Option<Text> {
        match self {
            NarrativeEvent::InformationalText { id, value } => {
                Some(Text::Info(TextBox::new(id.as_str(), value.as_str())))
            }
            NarrativeEvent::CharacterAction { id, text, .. } => {
                Some(Text::Character(TextBox::new(id.as_str(), text.as_str())))
            }
            NarrativeEvent::PlayerText { id, value } => {
                Some(Text::Player(TextBox::new(id.as_str(), value.as_str())))
            }
            NarrativeEvent::Link(link) => Some(Text::Link(LinkText::new(link.clone()))),
            NarrativeEvent::Sound { .. }
            | NarrativeEvent::StoryEnded { .. }
            | NarrativeEvent::Custom { .. } => None,
        }
    }
}

/// 段落播放结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PassagePlayResult {
    /// 段落数据就绪
    DataReady {
        passage_events: Vec<NarrativeEvent>,
        playthrough_record: PlaythroughRecord,
    },
    /// 播放失败（例如目标段落不存在）
    Error { message: String },
}

/// 一次故事播放会话
pub trait StoryPlayback {
    /// 播放段落：`None` 表示起始段落，否则跳转到链接的目标段落
    fn play_passage(&self, link: Option<&LinkEvent>);

    /// 播放结果流
    fn play_results(&self) -> ObservableView<Option<PassagePlayResult>>;
}

/// 外部故事引擎
pub trait StoryEngine {
    /// 导入故事文档
    fn import_story(&self, json: &str) -> Result<StoryContent, StoryImportError>;

    /// 开始播放故事
    fn start_playing(&self, content: &StoryContent) -> Rc<dyn StoryPlayback>;
}
