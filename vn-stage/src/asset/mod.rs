//! # Asset 模块
//!
//! 引擎中所有可寻址内容的数据模型。
//!
//! ## 设计原则
//!
//! - 每个资源都有唯一的字符串 ID
//! - 资源是不可变值：更新即替换，不会原地修改
//! - 使用封闭的枚举表达多态，匹配必须穷尽
//!
//! ## 资源种类
//!
//! - [`Sprite`]：角色 / 环境 / 道具立绘
//! - [`Text`]：信息 / 玩家 / 角色 / 链接文本
//! - [`Animation`]：文本 / 精灵表 / 精灵过渡动画
//! - [`Sound`]：音效 / 音乐
//! - [`Story`]：已导入的故事内容

pub mod animation;
pub mod sound;
pub mod sprite;
pub mod story;
pub mod text;

use serde::{Deserialize, Serialize};

pub use animation::{
    Animation, SpriteAnimationFrame, SpriteSheetAnimation, SpriteTransitionAnimation,
    TextAnimation, animation_id,
};
pub use sound::Sound;
pub use sprite::{
    Alignment, CharacterSprite, ContentFit, EnvironmentSprite, OffsetPercent, PropSprite, Scale,
    Sprite, SpriteTransform,
};
pub use story::{Story, StoryContent};
pub use text::{LinkText, Text, TextBox};

/// 资源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "asset", rename_all = "snake_case")]
pub enum Asset {
    /// 立绘
    Sprite(Sprite),
    /// 文本
    Text(Text),
    /// 动画描述
    Animation(Animation),
    /// 声音引用
    Sound(Sound),
    /// 故事（只能通过故事引擎导入，不从资源清单反序列化）
    #[serde(skip_deserializing)]
    Story(Story),
}

impl Asset {
    /// 资源 ID
    pub fn id(&self) -> String {
        match self {
            Asset::Sprite(sprite) => sprite.id().to_string(),
            Asset::Text(text) => text.id().to_string(),
            Asset::Animation(animation) => animation.id(),
            Asset::Sound(sound) => sound.id().to_string(),
            Asset::Story(story) => story.id.clone(),
        }
    }

    /// 资源种类名称（用于日志）
    pub fn kind(&self) -> &'static str {
        match self {
            Asset::Sprite(_) => "sprite",
            Asset::Text(_) => "text",
            Asset::Animation(_) => "animation",
            Asset::Sound(_) => "sound",
            Asset::Story(_) => "story",
        }
    }
}

impl From<Sprite> for Asset {
    fn from(sprite: Sprite) -> Self {
        Asset::Sprite(sprite)
    }
}

impl From<Text> for Asset {
    fn from(text: Text) -> Self {
        Asset::Text(text)
    }
}

impl From<Animation> for Asset {
    fn from(animation: Animation) -> Self {
        Asset::Animation(animation)
    }
}

impl From<Sound> for Asset {
    fn from(sound: Sound) -> Self {
        Asset::Sound(sound)
    }
}

impl From<Story> for Asset {
    fn from(story: Story) -> Self {
        Asset::Story(story)
    }
}

/// 可以从 [`Asset`] 中按类型取出的资源
///
/// 用于 [`AssetStore::get_as`](crate::store::AssetStore::get_as) 这样的按类型查询：
/// 类型不匹配时视为不存在。
pub trait AssetKind: Clone {
    /// 尝试把资源视为 `Self`
    fn from_asset(asset: &Asset) -> Option<&Self>;
}

impl AssetKind for Asset {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        Some(asset)
    }
}

impl AssetKind for Sprite {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Sprite(sprite) => Some(sprite),
            _ => None,
        }
    }
}

impl AssetKind for CharacterSprite {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Sprite(Sprite::Character(character)) => Some(character),
            _ => None,
        }
    }
}

impl AssetKind for EnvironmentSprite {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Sprite(Sprite::Environment(environment)) => Some(environment),
            _ => None,
        }
    }
}

impl AssetKind for PropSprite {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Sprite(Sprite::Prop(prop)) => Some(prop),
            _ => None,
        }
    }
}

impl AssetKind for Text {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl AssetKind for LinkText {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Text(Text::Link(link)) => Some(link),
            _ => None,
        }
    }
}

impl AssetKind for Animation {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Animation(animation) => Some(animation),
            _ => None,
        }
    }
}

impl AssetKind for Sound {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Sound(sound) => Some(sound),
            _ => None,
        }
    }
}

impl AssetKind for Story {
    fn from_asset(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Story(story) => Some(story),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_and_kind() {
        let asset: Asset = Sound::SoundEffect {
            id: "door".to_string(),
        }
        .into();
        assert_eq!(asset.id(), "door");
        assert_eq!(asset.kind(), "sound");

        let asset: Asset = Animation::Text(TextAnimation::new("Text", "line_1", "你好", 25)).into();
        assert_eq!(asset.id(), "Text_line_1");
    }

    #[test]
    fn test_asset_kind_lookup() {
        let asset: Asset = Sprite::Character(CharacterSprite::new("alice", "characters/alice.png")).into();
        assert!(CharacterSprite::from_asset(&asset).is_some());
        assert!(Sprite::from_asset(&asset).is_some());
        assert!(EnvironmentSprite::from_asset(&asset).is_none());
        assert!(Text::from_asset(&asset).is_none());
    }

    #[test]
    fn test_asset_manifest_deserialization() {
        let json = r#"[
            {"asset": "sprite", "type": "character", "id": "alice", "image": "characters/alice.png"},
            {"asset": "sound", "type": "music", "id": "theme"},
            {"asset": "animation", "type": "sprite_transition", "base_name": "alice", "name": "happy",
             "from_sprite_id": "alice", "to_sprite_id": "alice_happy"}
        ]"#;
        let assets: Vec<Asset> = serde_json::from_str(json).unwrap();
        assert_eq!(assets.len(), 3);
        assert_eq!(assets[2].id(), "alice_happy");
        assert!(matches!(
            &assets[2],
            Asset::Animation(Animation::SpriteTransition(t)) if t.duration_ms == 500
        ));
    }
}
