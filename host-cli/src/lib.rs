//! # Host CLI
//!
//! vn-stage 的无界面宿主。
//!
//! ## 职责
//!
//! - 从资源目录读取资源清单和故事文档（[`bundle`]）
//! - 提供 JSON 段落表故事引擎（[`story_engine`]）
//! - 用模拟舞台代替 UI 播放动画（[`stage`]）
//! - 固定步长驱动引擎，自动选择链接直到故事结束（[`session`]）
//!
//! 用于在没有图形界面的环境下验证资源包和故事流程。

pub mod bundle;
pub mod config;
pub mod error;
pub mod session;
pub mod sound;
pub mod stage;
pub mod story_engine;

pub use bundle::{AssetBundle, StorySource};
pub use config::{AppConfig, ChoiceStrategy, ConfigOverrides};
pub use error::{HostError, HostResult};
pub use session::{BundleSummary, RunReport, Session, SessionStatus, check, run};
pub use sound::LoggingSoundEngine;
pub use stage::SimulatedStage;
pub use story_engine::{JsonStoryEngine, StoryDocument};
