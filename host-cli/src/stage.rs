//! # Stage 模块
//!
//! 模拟 UI 的动画播放：跟踪引擎发布的活动动画列表，
//! 按预期时长推进，到点后报告完成。循环动画永远不会自行结束。
//!
//! 进度按批次代数区分：新批次中的同名动画从零开始重新播放。

use std::time::Duration;
use tracing::trace;
use vn_stage::{Animation, BatchGeneration};

#[derive(Debug, Clone)]
struct PlayingAnimation {
    animation: Animation,
    elapsed: Duration,
    finished: bool,
}

/// 模拟舞台
#[derive(Debug, Default)]
pub struct SimulatedStage {
    generation: Option<BatchGeneration>,
    playing: Vec<PlayingAnimation>,
}

impl SimulatedStage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 与当前批次的活动动画列表同步
    ///
    /// 同一批次中已在播放的动画保留进度，新动画从零开始，不在列表中的动画被移除。
    /// 批次代数变化时丢弃全部进度。
    pub fn sync(&mut self, generation: Option<BatchGeneration>, active: &[Animation]) {
        if self.generation != generation {
            trace!(?generation, "批次切换，重置舞台");
            self.playing.clear();
            self.generation = generation;
        }
        let mut previous = std::mem::take(&mut self.playing);
        for animation in active {
            let id = animation.id();
            match previous.iter().position(|p| p.animation.id() == id) {
                Some(index) => self.playing.push(previous.swap_remove(index)),
                None => {
                    trace!(id = %id, "开始播放动画");
                    self.playing.push(PlayingAnimation {
                        animation: animation.clone(),
                        elapsed: Duration::ZERO,
                        finished: false,
                    });
                }
            }
        }
    }

    /// 推进时间，返回本次推进中播放完毕的动画
    pub fn tick(&mut self, dt: Duration) -> Vec<Animation> {
        let mut finished = Vec::new();
        for playing in &mut self.playing {
            if playing.finished || playing.animation.repeat() {
                continue;
            }
            playing.elapsed += dt;
            if playing.elapsed >= playing.animation.expected_duration() {
                playing.finished = true;
                finished.push(playing.animation.clone());
            }
        }
        finished
    }

    /// 正在播放（尚未完成）的动画数量
    pub fn playing_count(&self) -> usize {
        self.playing.iter().filter(|p| !p.finished).count()
    }
}
