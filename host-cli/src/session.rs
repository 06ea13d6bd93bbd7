//! # Session 模块
//!
//! 无界面会话：用 [`SimulatedStage`] 代替 UI，
//! 在固定步长的主循环里推进动画、报告完成、按策略自动选择链接。
//!
//! 每一步的顺序：
//!
//! 1. 舞台同步活动动画并推进，报告播放完毕的动画
//! 2. 引擎推进批次超时计时
//! 3. 段落结束且不忙时按策略选择链接
//! 4. 根据渲染状态判断会话是否结束

use anyhow::{Context, bail};
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, info, warn};
use vn_stage::{
    Asset, PlayerPhase, PlaythroughRecord, StageResult, StoryRenderState, VisualNovelEngine,
};

use crate::bundle::AssetBundle;
use crate::config::{AppConfig, ChoiceStrategy};
use crate::sound::LoggingSoundEngine;
use crate::stage::SimulatedStage;
use crate::story_engine::JsonStoryEngine;

/// 会话状态
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    /// 仍在播放
    Running,
    /// 故事结束
    Ended { record: PlaythroughRecord },
    /// 渲染状态进入 Error
    Failed(String),
    /// 段落已结束但没有可选择的链接
    Stalled,
}

impl SessionStatus {
    pub fn is_finished(&self) -> bool {
        !matches!(self, SessionStatus::Running)
    }
}

/// 无界面会话
pub struct Session {
    engine: VisualNovelEngine,
    stage: SimulatedStage,
    strategy: ChoiceStrategy,
    simulate_completion: bool,
}

impl Session {
    pub fn new(engine: VisualNovelEngine, config: &AppConfig) -> Self {
        Self {
            engine,
            stage: SimulatedStage::new(),
            strategy: config.choice_strategy,
            simulate_completion: config.simulate_completion,
        }
    }

    /// 开始播放故事
    pub fn start(&mut self, story_id: &str) -> StageResult<()> {
        info!(story_id, "会话开始");
        self.engine.play_story(story_id)
    }

    /// 推进一步
    pub fn step(&mut self, dt: Duration) -> anyhow::Result<SessionStatus> {
        if self.simulate_completion {
            self.stage.sync(
                self.engine.animations().current_generation(),
                &self.engine.active_animations().get(),
            );
            for animation in self.stage.tick(dt) {
                // 前一个完成通知可能已经结束了批次
                if self.engine.animations().is_pending(&animation.id()) {
                    self.engine.notify_animation_complete(&animation)?;
                }
            }
        }

        if self.engine.advance(dt)? {
            debug!("批次超时");
        }

        let player = self.engine.player();
        if player.phase() == PlayerPhase::PassageExhausted && !player.is_busy() {
            if let Some(status) = self.terminal_status() {
                return Ok(status);
            }
            let links = self.engine.available_links();
            let Some(choice) = self.strategy.pick(&links) else {
                warn!("段落结束但没有可选择的链接");
                return Ok(SessionStatus::Stalled);
            };
            info!(link = %choice.id(), text = %choice.value(), "自动选择链接");
            self.engine.choose_story_passage(&choice.link)?;
        }

        Ok(self.terminal_status().unwrap_or(SessionStatus::Running))
    }

    fn terminal_status(&self) -> Option<SessionStatus> {
        match self.engine.render_state().get() {
            StoryRenderState::Ended(record) => Some(SessionStatus::Ended { record }),
            StoryRenderState::Error(message) => Some(SessionStatus::Failed(message)),
            _ => None,
        }
    }

    pub fn engine(&self) -> &VisualNovelEngine {
        &self.engine
    }

    pub fn into_engine(self) -> VisualNovelEngine {
        self.engine
    }
}

/// 运行结果
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub status: SessionStatus,
    pub ticks: u64,
}

/// 资源包检查结果
#[derive(Debug, Clone, PartialEq)]
pub struct BundleSummary {
    pub assets: usize,
    pub stories: Vec<String>,
}

/// 装载资源包并创建引擎
fn prepare(config: &AppConfig, engine: VisualNovelEngine) -> anyhow::Result<VisualNovelEngine> {
    let bundle = AssetBundle::scan(&config.assets_root)
        .with_context(|| format!("扫描资源目录 {:?} 失败", config.assets_root))?;
    bundle.install(&engine).context("装载资源包失败")?;
    Ok(engine)
}

/// 以实时步长运行故事，直到结束或达到最大循环次数
pub async fn run(config: &AppConfig) -> anyhow::Result<RunReport> {
    config.validate()?;

    let engine = VisualNovelEngine::init(
        config.engine.clone(),
        Rc::new(JsonStoryEngine::new()),
        Some(Rc::new(LoggingSoundEngine::new())),
    )?;
    let engine = prepare(config, engine)?;

    let mut session = Session::new(engine, config);
    session.start(&config.start_story)?;

    let dt = config.tick_duration();
    let mut interval = tokio::time::interval(dt);
    let mut status = SessionStatus::Running;
    let mut ticks = 0;
    while ticks < config.max_ticks {
        interval.tick().await;
        ticks += 1;
        status = session.step(dt)?;
        if status.is_finished() {
            break;
        }
    }

    info!(ticks, ?status, "会话结束");
    session.into_engine().dispose();
    Ok(RunReport { status, ticks })
}

/// 检查资源包：所有资源清单可解析，所有故事可导入，起始故事存在
pub fn check(config: &AppConfig) -> anyhow::Result<BundleSummary> {
    config.validate()?;

    let engine = VisualNovelEngine::new(
        config.engine.clone(),
        Rc::new(JsonStoryEngine::new()),
        None,
    )?;
    let engine = prepare(config, engine)?;

    let mut stories: Vec<String> = engine
        .store()
        .snapshot()
        .values()
        .filter_map(|asset| match asset {
            Asset::Story(story) => Some(story.id.clone()),
            _ => None,
        })
        .collect();
    stories.sort();

    let summary = BundleSummary {
        assets: engine.store().len(),
        stories,
    };
    if !summary.stories.contains(&config.start_story) {
        bail!("起始故事 '{}' 不存在", config.start_story);
    }
    Ok(summary)
}
