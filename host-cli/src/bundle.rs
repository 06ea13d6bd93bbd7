//! # Bundle 模块
//!
//! 从资源目录收集资源清单和故事文档。
//!
//! ## 目录约定
//!
//! ```text
//! assets/
//! ├── characters.assets.json   # 资源清单：Asset 数组
//! ├── scenes/park.assets.json
//! └── main.story.json          # 故事文档，ID 为去掉后缀的文件名（main）
//! ```
//!
//! 其余文件被忽略。文件按名称排序遍历，同 ID 资源以后读到的为准。

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vn_stage::{Asset, StageResult, VisualNovelEngine};
use walkdir::WalkDir;

use crate::error::{HostError, HostResult};

/// 资源清单后缀
pub const ASSETS_SUFFIX: &str = ".assets.json";
/// 故事文档后缀
pub const STORY_SUFFIX: &str = ".story.json";

/// 待导入的故事文档
#[derive(Debug, Clone, PartialEq)]
pub struct StorySource {
    pub id: String,
    pub path: PathBuf,
    pub json: String,
}

/// 资源包
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetBundle {
    pub assets: Vec<Asset>,
    pub stories: Vec<StorySource>,
}

impl AssetBundle {
    /// 扫描资源目录
    pub fn scan(root: impl AsRef<Path>) -> HostResult<Self> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(HostError::AssetsRootNotFound(root.to_path_buf()));
        }

        let mut bundle = AssetBundle::default();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy();

            if file_name.ends_with(ASSETS_SUFFIX) {
                let assets: Vec<Asset> = serde_json::from_str(&read(path)?).map_err(|source| {
                    HostError::Json {
                        path: path.to_path_buf(),
                        source,
                    }
                })?;
                debug!(path = %path.display(), count = assets.len(), "读取资源清单");
                bundle.assets.extend(assets);
            } else if let Some(id) = file_name.strip_suffix(STORY_SUFFIX) {
                debug!(path = %path.display(), id, "读取故事文档");
                bundle.stories.push(StorySource {
                    id: id.to_string(),
                    path: path.to_path_buf(),
                    json: read(path)?,
                });
            }
        }

        info!(
            root = %root.display(),
            assets = bundle.assets.len(),
            stories = bundle.stories.len(),
            "资源目录扫描完成"
        );
        Ok(bundle)
    }

    /// 把资源和故事装入引擎
    pub fn install(&self, engine: &VisualNovelEngine) -> StageResult<()> {
        engine.load_assets(self.assets.clone())?;
        for story in &self.stories {
            engine.import_story(&story.id, &story.json)?;
        }
        Ok(())
    }

    pub fn story_ids(&self) -> Vec<&str> {
        self.stories.iter().map(|s| s.id.as_str()).collect()
    }
}

fn read(path: &Path) -> HostResult<String> {
    fs::read_to_string(path).map_err(|source| HostError::Io {
        path: path.to_path_buf(),
        source,
    })
}
