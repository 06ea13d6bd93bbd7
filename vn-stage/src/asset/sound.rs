//! # Sound 模块
//!
//! 声音资源引用，实际播放由 [`SoundEngine`](crate::sound::SoundEngine) 负责。

use serde::{Deserialize, Serialize};

/// 声音
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sound {
    /// 音效
    SoundEffect { id: String },
    /// 音乐
    Music { id: String },
}

impl Sound {
    pub fn id(&self) -> &str {
        match self {
            Sound::SoundEffect { id } | Sound::Music { id } => id,
        }
    }
}
