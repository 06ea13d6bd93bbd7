//! # Store 模块
//!
//! 可观察的资源存储：`资源 ID -> 资源`。
//!
//! - 同 ID 后写覆盖先写
//! - 每次写入发布一个新的不可变快照，订阅者拿到的快照不会再被修改
//! - 没有外部持有旧快照时原地写入（`Rc::make_mut`），否则写时复制
//! - 查询按类型进行，类型不匹配视为不存在

use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

use crate::asset::{Asset, AssetKind};
use crate::observable::{Observable, ObservableView};

/// 资源表快照
pub type AssetMap = HashMap<String, Asset>;

/// 资源存储
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: Observable<Rc<AssetMap>>,
}

impl AssetStore {
    /// 创建空存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加或替换资源（以资源自身的 ID 为键）
    pub fn add_or_update(&self, asset: impl Into<Asset>) {
        let asset = asset.into();
        let id = asset.id();
        self.add_or_update_as(id, asset);
    }

    /// 以指定 ID 为键添加或替换资源
    ///
    /// 键可以与资源自身的 ID 不同，例如精灵过渡完成后用目标立绘替换起始立绘的条目。
    pub fn add_or_update_as(&self, id: impl Into<String>, asset: impl Into<Asset>) {
        let id = id.into();
        let asset = asset.into();
        debug!(id = %id, kind = asset.kind(), "写入资源");
        self.assets.modify(|assets| {
            Rc::make_mut(assets).insert(id, asset);
        });
    }

    /// 批量添加或替换资源，只发布一次快照
    pub fn add_or_update_all(&self, assets: impl IntoIterator<Item = Asset>) {
        let assets: Vec<Asset> = assets.into_iter().collect();
        if assets.is_empty() {
            return;
        }
        debug!(count = assets.len(), "批量写入资源");
        self.assets.modify(|current| {
            let next = Rc::make_mut(current);
            for asset in assets {
                next.insert(asset.id(), asset);
            }
        });
    }

    /// 移除资源，返回是否存在
    pub fn remove(&self, id: &str) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.assets.modify(|assets| {
            Rc::make_mut(assets).remove(id);
        });
        true
    }

    /// 获取资源
    pub fn get(&self, id: &str) -> Option<Asset> {
        self.assets.with(|assets| assets.get(id).cloned())
    }

    /// 按类型获取资源
    pub fn get_as<T: AssetKind>(&self, id: &str) -> Option<T> {
        self.assets
            .with(|assets| assets.get(id).and_then(T::from_asset).cloned())
    }

    /// 按类型批量获取资源，缺失或类型不符的条目被跳过
    pub fn get_all_as<T: AssetKind>(&self, ids: &[String]) -> Vec<T> {
        self.assets.with(|assets| {
            ids.iter()
                .filter_map(|id| assets.get(id).and_then(T::from_asset).cloned())
                .collect()
        })
    }

    /// 是否包含资源
    pub fn contains(&self, id: &str) -> bool {
        self.assets.with(|assets| assets.contains_key(id))
    }

    /// 资源数量
    pub fn len(&self) -> usize {
        self.assets.with(|assets| assets.len())
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 当前快照
    pub fn snapshot(&self) -> Rc<AssetMap> {
        self.assets.get()
    }

    /// 资源表的只读可观察句柄
    pub fn assets(&self) -> ObservableView<Rc<AssetMap>> {
        self.assets.view()
    }
}
