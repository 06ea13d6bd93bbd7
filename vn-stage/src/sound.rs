//! # Sound 模块
//!
//! 外部声音引擎契约。引擎只负责在事件到达时发出播放请求。

/// 声音引擎
pub trait SoundEngine {
    /// 播放音效（即发即忘）
    fn play_sound_effect(&self, name: &str);

    /// 播放音乐
    fn play_music(&self, name: &str, looped: bool);

    /// 停止音乐
    fn stop_music(&self);
}
