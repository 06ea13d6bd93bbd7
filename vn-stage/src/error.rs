//! # Error 模块
//!
//! 定义 vn-stage 中使用的错误类型。
//!
//! ## 错误分类
//!
//! - 调用方契约违规（重复 ID、未知的完成通知）：立即返回错误，属于编程错误
//! - 外部数据错误（故事不存在、段落不存在、导入失败）：由渲染状态 `Error` 呈现，
//!   只有导入失败会以 [`AssetError`] 的形式返回给调用方
//! - 超时：不是错误，批次以 `timed_out = true` 结束
//! - 回调错误：协调器先提交自身状态清理，再把错误原样向上传播

use thiserror::Error;

/// 动画批次错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// 同一批次中出现重复的动画 ID
    #[error("动画批次包含重复 ID: {ids:?}")]
    DuplicateIds { ids: Vec<String> },

    /// 完成通知的动画不属于当前批次（未知、已完成或没有活动批次）
    #[error("收到未知或已处理动画的完成通知: '{id}'")]
    UnknownAnimation { id: String },
}

/// 资源错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AssetError {
    /// 资源 ID 为空
    #[error("资源 ID 不能为空")]
    EmptyId,

    /// 故事导入失败
    #[error("故事 '{id}' 导入失败: {reason}")]
    StoryImport { id: String, reason: String },
}

/// 故事引擎导入失败
///
/// 由故事引擎在解析故事文档失败时返回，[`Story::import`](crate::asset::Story::import)
/// 会把它包装为带故事 ID 的 [`AssetError::StoryImport`]。
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{reason}")]
pub struct StoryImportError {
    pub reason: String,
}

impl StoryImportError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// 故事播放错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoryError {
    /// 当前没有正在播放的故事
    #[error("当前没有正在播放的故事")]
    NoActiveStory,
}

/// 引擎生命周期错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 已有受保护的引擎实例存活
    #[error("引擎实例已存在，请先调用 dispose")]
    AlreadyInitialized,
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 配置项取值无效
    #[error("配置项 '{field}' 无效: {message}")]
    InvalidValue { field: String, message: String },
}

/// vn-stage 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// 动画错误
    #[error("动画错误: {0}")]
    Animation(#[from] AnimationError),

    /// 资源错误
    #[error("资源错误: {0}")]
    Asset(#[from] AssetError),

    /// 故事错误
    #[error("故事错误: {0}")]
    Story(#[from] StoryError),

    /// 引擎错误
    #[error("引擎错误: {0}")]
    Engine(#[from] EngineError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// Result 类型别名
pub type StageResult<T> = Result<T, StageError>;
