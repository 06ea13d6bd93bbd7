//! # Story 模块
//!
//! 已导入的故事资源。故事内容对引擎不透明，由故事引擎负责解释。

use serde::{Deserialize, Serialize};

use crate::error::AssetError;
use crate::story::StoryEngine;

/// 故事内容
///
/// 故事引擎导入后的文档，引擎只负责保存并在播放时原样交还给故事引擎。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryContent(pub serde_json::Value);

impl StoryContent {
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }
}

/// 故事资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub content: StoryContent,
}

impl Story {
    /// 通过故事引擎导入故事文档
    ///
    /// 导入失败时返回带故事 ID 的 [`AssetError::StoryImport`]。
    pub fn import(
        id: impl Into<String>,
        json: &str,
        engine: &dyn StoryEngine,
    ) -> Result<Self, AssetError> {
        let id = id.into();
        match engine.import_story(json) {
            Ok(content) => Ok(Self { id, content }),
            Err(e) => Err(AssetError::StoryImport { id, reason: e.reason }),
        }
    }
}
