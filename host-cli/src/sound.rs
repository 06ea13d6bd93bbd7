//! # Sound 模块
//!
//! 只记录日志的声音引擎，用于无音频设备的环境。

use std::cell::RefCell;
use tracing::info;
use vn_stage::SoundEngine;

/// 日志声音引擎
#[derive(Debug, Default)]
pub struct LoggingSoundEngine {
    played: RefCell<Vec<String>>,
}

impl LoggingSoundEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已请求播放的音效名称
    pub fn played_effects(&self) -> Vec<String> {
        self.played.borrow().clone()
    }
}

impl SoundEngine for LoggingSoundEngine {
    fn play_sound_effect(&self, name: &str) {
        info!(name, "播放音效");
        self.played.borrow_mut().push(name.to_string());
    }

    fn play_music(&self, name: &str, looped: bool) {
        info!(name, looped, "播放音乐");
    }

    fn stop_music(&self) {
        info!("停止音乐");
    }
}
