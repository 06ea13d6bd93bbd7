//! # Ids 模块
//!
//! 场景 ID 状态：当前显示哪些资源，只记录 ID，不持有资源内容。

use serde::{Deserialize, Serialize};

use super::state::SceneRenderState;
use crate::asset::{AssetKind, CharacterSprite, EnvironmentSprite, Text};
use crate::store::AssetMap;

/// 场景 ID 状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneRenderStateIds {
    pub background_id: Option<String>,
    pub foreground_id: Option<String>,
    pub character_ids: Vec<String>,
    pub active_character_id: Option<String>,
    /// 文本框 ID（有序）
    pub text_box_ids: Vec<String>,
}

impl SceneRenderStateIds {
    pub fn with_background(mut self, id: impl Into<String>) -> Self {
        self.background_id = Some(id.into());
        self
    }

    pub fn with_foreground(mut self, id: impl Into<String>) -> Self {
        self.foreground_id = Some(id.into());
        self
    }

    pub fn with_characters(mut self, ids: Vec<String>) -> Self {
        self.character_ids = ids;
        self
    }

    pub fn with_active_character(mut self, id: impl Into<String>) -> Self {
        self.active_character_id = Some(id.into());
        self
    }

    pub fn with_text_boxes(mut self, ids: Vec<String>) -> Self {
        self.text_box_ids = ids;
        self
    }

    /// 用资源表解析场景
    pub fn resolve(&self, assets: &AssetMap) -> SceneRenderState {
        SceneRenderState {
            background: lookup::<EnvironmentSprite>(assets, self.background_id.as_deref()),
            foreground: lookup::<EnvironmentSprite>(assets, self.foreground_id.as_deref()),
            characters: lookup_all::<CharacterSprite>(assets, &self.character_ids),
            active_character: lookup::<CharacterSprite>(assets, self.active_character_id.as_deref()),
            text_boxes: lookup_all::<Text>(assets, &self.text_box_ids),
        }
    }
}

fn lookup<T: AssetKind>(assets: &AssetMap, id: Option<&str>) -> Option<T> {
    id.and_then(|id| assets.get(id))
        .and_then(T::from_asset)
        .cloned()
}

fn lookup_all<T: AssetKind>(assets: &AssetMap, ids: &[String]) -> Vec<T> {
    ids.iter()
        .filter_map(|id| assets.get(id).and_then(T::from_asset).cloned())
        .collect()
}
