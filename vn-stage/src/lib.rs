//! # VN Stage
//!
//! 视觉小说的舞台层：把故事引擎产出的叙事事件变成可观察的场景状态。
//!
//! ## 架构概述
//!
//! `vn-stage` 是纯逻辑核心，不做任何 IO、解码或绘制。
//! 故事脚本由外部故事引擎解释，动画由 UI 播放，引擎只负责调度与同步：
//!
//! ```text
//! StoryEngine ──► PassagePlayResult ──► StoryPlayer ──► AssetStore / SceneRenderStateIds
//!                                           │                      │
//!                                           ▼                      ▼
//!                                  AnimationCoordinator    StoryRenderState ──► UI
//!                                           ▲
//!   UI ──── notify_animation_complete ──────┘
//!   Host ── advance(elapsed) ───────────────┘
//! ```
//!
//! ## 核心类型
//!
//! - [`VisualNovelEngine`]：宿主持有的门面
//! - [`Asset`]：立绘、文本、动画、声音、故事
//! - [`AnimationCoordinator`]：动画批次协调
//! - [`StoryRenderState`]：UI 消费的渲染状态
//!
//! ## 使用示例
//!
//! ```ignore
//! use vn_stage::{EngineConfig, VisualNovelEngine};
//!
//! let engine = VisualNovelEngine::new(EngineConfig::default(), story_engine, None)?;
//! engine.load_assets(assets)?;
//! engine.import_story("intro", &json)?;
//! engine.play_story("intro")?;
//!
//! engine.active_animations().subscribe(|animations| ui.play(animations));
//! engine.render_state().subscribe(|state| ui.render(state));
//!
//! // 主循环
//! loop {
//!     engine.advance(frame_time)?;
//!     for animation in ui.finished_animations() {
//!         engine.notify_animation_complete(&animation)?;
//!     }
//! }
//! ```
//!
//! ## 模块结构
//!
//! - [`asset`]：资源数据模型
//! - [`store`]：可观察资源存储
//! - [`animation`]：动画批次协调与超时策略
//! - [`scene`]：场景 ID、渲染状态与渲染控制器
//! - [`story`]：叙事事件与故事引擎契约
//! - [`player`]：故事播放器
//! - [`engine`]：引擎门面
//! - [`observable`]：发布/订阅值容器
//! - [`error`]：错误类型定义

pub mod animation;
pub mod asset;
pub mod config;
pub mod engine;
pub mod error;
pub mod observable;
pub mod player;
pub mod scene;
pub mod sound;
pub mod store;
pub mod story;

// 重导出核心类型
pub use animation::{AnimationCoordinator, BatchGeneration, BatchOutcome, TimeoutPolicy};
pub use asset::{
    Alignment, Animation, Asset, AssetKind, CharacterSprite, ContentFit, EnvironmentSprite,
    LinkText, OffsetPercent, PropSprite, Scale, Sound, SpriteAnimationFrame, SpriteSheetAnimation,
    SpriteTransform, SpriteTransitionAnimation, Sprite, Story, StoryContent, Text, TextAnimation,
    TextBox, animation_id,
};
pub use config::EngineConfig;
pub use engine::VisualNovelEngine;
pub use error::{
    AnimationError, AssetError, ConfigError, EngineError, StageError, StageResult, StoryError,
    StoryImportError,
};
pub use observable::{Observable, ObservableView, SubscriptionId};
pub use player::{PlayerPhase, STORY_NOT_FOUND, StoryPlayer};
pub use scene::{
    SceneRenderController, SceneRenderState, SceneRenderStateIds, StoryRenderController,
    StoryRenderState,
};
pub use sound::SoundEngine;
pub use store::{AssetMap, AssetStore};
pub use story::{
    LinkEvent, NarrativeEvent, PassagePlayResult, PlaythroughRecord, StoryEngine, StoryPlayback,
};
