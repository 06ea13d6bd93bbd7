//! # Error 模块
//!
//! 宿主层错误类型。

use std::path::PathBuf;
use thiserror::Error;
use vn_stage::{ConfigError, StageError};

/// 宿主错误
#[derive(Error, Debug)]
pub enum HostError {
    /// 资源目录不存在
    #[error("资源目录不存在: {0:?}")]
    AssetsRootNotFound(PathBuf),

    /// 文件读取失败
    #[error("读取文件失败 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 解析失败
    #[error("解析 JSON 失败 {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 目录遍历失败
    #[error("遍历资源目录失败: {0}")]
    Walk(#[from] walkdir::Error),

    /// 配置无效
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 引擎错误
    #[error(transparent)]
    Stage(#[from] StageError),
}

pub type HostResult<T> = Result<T, HostError>;
