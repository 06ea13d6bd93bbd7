//! # Scene 模块
//!
//! 场景渲染状态。
//!
//! ## 模块结构
//!
//! - [`ids`]：只包含资源 ID 的场景描述（轻量、可序列化）
//! - [`state`]：解析后的场景与故事级渲染状态
//! - [`controller`]：把 ID 与资源存储连接起来的渲染控制器
//!
//! ID 到资源的解析是纯函数：缺失或类型不符的 ID 解析为空，不会报错，
//! 所以资源的加载顺序不会影响渲染。

pub mod controller;
pub mod ids;
pub mod state;

pub use controller::{SceneRenderController, StoryRenderController};
pub use ids::SceneRenderStateIds;
pub use state::{SceneRenderState, StoryRenderState};
