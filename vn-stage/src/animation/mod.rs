//! # Animation 模块
//!
//! 动画批次协调：把一组动画作为一个批次提交，
//! 等待 UI 逐个报告完成（或超时）后，触发一次批次完成回调。
//!
//! ## 模块结构
//!
//! - [`coordinator`]：批次状态机
//! - [`timeout`]：批次超时策略
//!
//! 引擎本身不计时：宿主通过 [`AnimationCoordinator::advance`] 推进时间，
//! 或者用自己的定时器调用 [`AnimationCoordinator::expire`]。

pub mod coordinator;
pub mod timeout;

pub use coordinator::{AnimationCoordinator, BatchCompletionHandler, BatchGeneration, BatchOutcome};
pub use timeout::TimeoutPolicy;
