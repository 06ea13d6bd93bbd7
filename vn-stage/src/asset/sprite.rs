//! # Sprite 模块
//!
//! 立绘资源：角色、环境（背景/前景）和道具。
//!
//! 图像只以逻辑路径引用，解码由宿主负责。

use serde::{Deserialize, Serialize};

use super::Animation;
use crate::store::AssetStore;

/// 偏移（相对画面尺寸的百分比）
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetPercent {
    pub x: f32,
    pub y: f32,
}

/// 缩放（独立于 [`ContentFit`] 生效）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Default for Scale {
    fn default() -> Self {
        Self { x: 1.0, y: 1.0 }
    }
}

/// 立绘变换
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteTransform {
    /// 偏移
    pub offset_percent: OffsetPercent,
    /// 缩放
    pub scale: Scale,
    /// 旋转角度（度）
    pub rotation: f32,
    /// 不透明度（0.0 - 1.0）
    pub opacity: f32,
}

impl Default for SpriteTransform {
    fn default() -> Self {
        Self {
            offset_percent: OffsetPercent::default(),
            scale: Scale::default(),
            rotation: 0.0,
            opacity: 1.0,
        }
    }
}

/// 图像填充模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFit {
    /// 等比缩放至完整显示
    #[default]
    Fit,
    /// 等比缩放至铺满，裁剪溢出部分
    Crop,
    /// 非等比拉伸铺满
    FillBounds,
    /// 等比缩放至宽度铺满
    FillWidth,
    /// 等比缩放至高度铺满
    FillHeight,
    /// 仅在超出时缩小
    Inside,
    /// 不缩放
    None,
}

/// 九宫格对齐方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    TopStart,
    TopCenter,
    TopEnd,
    CenterStart,
    Center,
    CenterEnd,
    BottomStart,
    #[default]
    BottomCenter,
    BottomEnd,
}

/// 角色立绘
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSprite {
    pub id: String,
    /// 图像逻辑路径
    pub image: String,
    #[serde(default)]
    pub transform: SpriteTransform,
    #[serde(default)]
    pub content_fit: ContentFit,
    /// 关联的动画 ID
    #[serde(default)]
    pub animation_ids: Vec<String>,
    /// 立绘在画面中的对齐方式
    #[serde(default)]
    pub alignment: Alignment,
}

impl CharacterSprite {
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
            transform: SpriteTransform::default(),
            content_fit: ContentFit::default(),
            animation_ids: Vec::new(),
            alignment: Alignment::default(),
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn with_animation_ids(mut self, ids: Vec<String>) -> Self {
        self.animation_ids = ids;
        self
    }
}

/// 环境立绘（背景/前景）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSprite {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub transform: SpriteTransform,
    #[serde(default)]
    pub content_fit: ContentFit,
    #[serde(default)]
    pub animation_ids: Vec<String>,
    /// 该环境包含的道具 ID
    #[serde(default)]
    pub prop_ids: Vec<String>,
}

impl EnvironmentSprite {
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
            transform: SpriteTransform::default(),
            content_fit: ContentFit::default(),
            animation_ids: Vec::new(),
            prop_ids: Vec::new(),
        }
    }

    pub fn with_prop_ids(mut self, ids: Vec<String>) -> Self {
        self.prop_ids = ids;
        self
    }

    /// 解析关联的道具，缺失或类型不符的条目被跳过
    pub fn resolve_props(&self, store: &AssetStore) -> Vec<PropSprite> {
        store.get_all_as::<PropSprite>(&self.prop_ids)
    }
}

/// 道具立绘
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropSprite {
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub transform: SpriteTransform,
    #[serde(default)]
    pub content_fit: ContentFit,
    #[serde(default)]
    pub animation_ids: Vec<String>,
}

impl PropSprite {
    pub fn new(id: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            image: image.into(),
            transform: SpriteTransform::default(),
            content_fit: ContentFit::default(),
            animation_ids: Vec::new(),
        }
    }
}

/// 立绘
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Sprite {
    Character(CharacterSprite),
    Environment(EnvironmentSprite),
    Prop(PropSprite),
}

impl Sprite {
    pub fn id(&self) -> &str {
        match self {
            Sprite::Character(s) => &s.id,
            Sprite::Environment(s) => &s.id,
            Sprite::Prop(s) => &s.id,
        }
    }

    pub fn image(&self) -> &str {
        match self {
            Sprite::Character(s) => &s.image,
            Sprite::Environment(s) => &s.image,
            Sprite::Prop(s) => &s.image,
        }
    }

    pub fn transform(&self) -> &SpriteTransform {
        match self {
            Sprite::Character(s) => &s.transform,
            Sprite::Environment(s) => &s.transform,
            Sprite::Prop(s) => &s.transform,
        }
    }

    pub fn content_fit(&self) -> ContentFit {
        match self {
            Sprite::Character(s) => s.content_fit,
            Sprite::Environment(s) => s.content_fit,
            Sprite::Prop(s) => s.content_fit,
        }
    }

    pub fn animation_ids(&self) -> &[String] {
        match self {
            Sprite::Character(s) => &s.animation_ids,
            Sprite::Environment(s) => &s.animation_ids,
            Sprite::Prop(s) => &s.animation_ids,
        }
    }

    /// 解析关联的动画，缺失或类型不符的条目被跳过
    pub fn resolve_animations(&self, store: &AssetStore) -> Vec<Animation> {
        store.get_all_as::<Animation>(self.animation_ids())
    }
}
