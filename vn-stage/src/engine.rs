//! # Engine 模块
//!
//! 引擎门面：组装资源存储、动画协调器、渲染控制器和故事播放器，
//! 作为宿主唯一需要持有的对象。
//!
//! ```rust,ignore
//! let engine = VisualNovelEngine::new(EngineConfig::default(), story_engine, None)?;
//! engine.load_assets(assets)?;
//! engine.import_story("intro", &json)?;
//! engine.play_story("intro")?;
//!
//! // 宿主主循环
//! engine.advance(frame_time)?;
//! engine.notify_animation_complete(&animation)?;
//! ```
//!
//! 需要进程内单实例时使用 [`VisualNovelEngine::init`]，它持有全局实例守卫，
//! 直到 [`VisualNovelEngine::dispose`] 或实例被丢弃。

use std::rc::Rc;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::animation::{AnimationCoordinator, BatchGeneration};
use crate::asset::{Animation, Asset, LinkText, Story};
use crate::config::EngineConfig;
use crate::error::{AssetError, EngineError, StageResult};
use crate::observable::ObservableView;
use crate::player::StoryPlayer;
use crate::scene::{SceneRenderStateIds, StoryRenderController, StoryRenderState};
use crate::sound::SoundEngine;
use crate::store::AssetStore;
use crate::story::{LinkEvent, StoryEngine};

/// 全局实例槽位：是否已有受保护的实例存活
static INSTANCE_ACTIVE: Mutex<bool> = Mutex::new(false);

/// 全局实例守卫，丢弃时释放槽位
#[derive(Debug)]
struct InstanceGuard;

impl InstanceGuard {
    fn acquire() -> Result<Self, EngineError> {
        let mut active = INSTANCE_ACTIVE
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *active {
            return Err(EngineError::AlreadyInitialized);
        }
        *active = true;
        Ok(InstanceGuard)
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        *INSTANCE_ACTIVE
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = false;
        debug!("释放引擎实例守卫");
    }
}

/// 视觉小说引擎
pub struct VisualNovelEngine {
    config: EngineConfig,
    store: Rc<AssetStore>,
    animations: Rc<AnimationCoordinator>,
    controller: Rc<StoryRenderController>,
    player: Rc<StoryPlayer>,
    story_engine: Rc<dyn StoryEngine>,
    guard: Option<InstanceGuard>,
}

impl VisualNovelEngine {
    /// 创建引擎实例（不占用全局实例槽位）
    pub fn new(
        config: EngineConfig,
        story_engine: Rc<dyn StoryEngine>,
        sound_engine: Option<Rc<dyn SoundEngine>>,
    ) -> StageResult<Self> {
        config.validate()?;

        let store = Rc::new(AssetStore::new());
        let animations = Rc::new(AnimationCoordinator::new(&config));
        let controller = Rc::new(StoryRenderController::new(Rc::clone(&store)));
        let player = StoryPlayer::new(
            Rc::clone(&store),
            Rc::clone(&animations),
            Rc::clone(&controller),
            Rc::clone(&story_engine),
            sound_engine,
            config.clone(),
        );

        Ok(Self {
            config,
            store,
            animations,
            controller,
            player,
            story_engine,
            guard: None,
        })
    }

    /// 创建进程内唯一的引擎实例
    ///
    /// 已有受保护的实例存活时返回 [`EngineError::AlreadyInitialized`]。
    pub fn init(
        config: EngineConfig,
        story_engine: Rc<dyn StoryEngine>,
        sound_engine: Option<Rc<dyn SoundEngine>>,
    ) -> StageResult<Self> {
        let guard = InstanceGuard::acquire()?;
        let mut engine = Self::new(config, story_engine, sound_engine)?;
        engine.guard = Some(guard);
        info!("引擎实例已初始化");
        Ok(engine)
    }

    /// 重置所有状态并释放实例
    pub fn dispose(self) {
        self.player.reset();
        info!(guarded = self.guard.is_some(), "引擎实例已释放");
    }

    /// 是否持有全局实例守卫
    pub fn is_guarded(&self) -> bool {
        self.guard.is_some()
    }

    // ========== 资源 ==========

    /// 批量加载资源（同 ID 后写覆盖先写）
    ///
    /// 任何资源 ID 为空时返回 [`AssetError::EmptyId`]，且不写入任何资源。
    pub fn load_assets(&self, assets: Vec<Asset>) -> StageResult<()> {
        if assets.iter().any(|asset| asset.id().is_empty()) {
            warn!("拒绝加载 ID 为空的资源");
            return Err(AssetError::EmptyId.into());
        }
        info!(count = assets.len(), "加载资源");
        self.store.add_or_update_all(assets);
        Ok(())
    }

    /// 通过故事引擎导入故事并加入资源存储
    ///
    /// 导入失败时渲染状态进入 `Error`，并返回 [`AssetError::StoryImport`]。
    pub fn import_story(&self, id: &str, json: &str) -> StageResult<()> {
        if id.is_empty() {
            return Err(AssetError::EmptyId.into());
        }
        match Story::import(id, json, self.story_engine.as_ref()) {
            Ok(story) => {
                info!(id, "导入故事");
                self.store.add_or_update(story);
                Ok(())
            }
            Err(e) => {
                self.controller.set_error(e.to_string());
                Err(e.into())
            }
        }
    }

    // ========== 播放 ==========

    pub fn play_story(&self, story_id: &str) -> StageResult<()> {
        self.player.play_story(story_id)
    }

    pub fn choose_story_passage(&self, link: &LinkEvent) -> StageResult<()> {
        self.player.choose_story_passage(link)
    }

    pub fn load_scene(&self, ids: SceneRenderStateIds) {
        self.player.load_scene(ids);
    }

    /// 重置播放状态，资源存储保持不变
    pub fn reset(&self) {
        self.player.reset();
    }

    pub fn available_links(&self) -> Vec<LinkText> {
        self.player.available_links()
    }

    // ========== 动画 ==========

    /// 报告动画完成
    pub fn notify_animation_complete(&self, animation: &Animation) -> StageResult<()> {
        self.animations.notify_complete(animation)
    }

    /// 推进批次超时计时，返回当前批次是否因此超时
    pub fn advance(&self, elapsed: Duration) -> StageResult<bool> {
        self.animations.advance(elapsed)
    }

    /// 让指定批次超时（宿主自行计时的情况）
    pub fn expire_batch(&self, generation: BatchGeneration) -> StageResult<bool> {
        self.animations.expire(generation)
    }

    // ========== 可观察状态 ==========

    pub fn render_state(&self) -> ObservableView<StoryRenderState> {
        self.controller.render_state()
    }

    pub fn is_busy(&self) -> ObservableView<bool> {
        self.player.busy()
    }

    pub fn active_animations(&self) -> ObservableView<Vec<Animation>> {
        self.animations.active_animations()
    }

    pub fn store(&self) -> &Rc<AssetStore> {
        &self.store
    }

    pub fn animations(&self) -> &Rc<AnimationCoordinator> {
        &self.animations
    }

    pub fn player(&self) -> &Rc<StoryPlayer> {
        &self.player
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
