//! # Player 模块
//!
//! 故事播放器：按顺序消费故事引擎产出的段落事件，驱动场景与动画批次。
//!
//! ## 阶段
//!
//! ```text
//! Idle ──► Advancing ──► AwaitingAnimation ──► Advancing ... ──► PassageExhausted
//!              │                                                    │
//!              └──► Ended（StoryEnded）             选择链接 ◄───────┘
//! ```
//!
//! - 文本事件（旁白 / 玩家 / 角色）需要等待动画批次完成才会前进
//! - 链接、声音、自定义事件同步前进
//! - 段落结束时，累积的链接按出现顺序追加到文本框，等待玩家选择
//!
//! 所有回调都通过 `Weak` 引用播放器，播放器被丢弃后回调自动失效。

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, error, info, warn};

use crate::animation::{AnimationCoordinator, BatchOutcome};
use crate::asset::{
    Animation, Asset, CharacterSprite, LinkText, Sprite, Story, Text, TextBox, animation_id,
};
use crate::config::EngineConfig;
use crate::error::{StageResult, StoryError};
use crate::observable::{Observable, ObservableView, SubscriptionId};
use crate::scene::{SceneRenderStateIds, StoryRenderController};
use crate::sound::SoundEngine;
use crate::store::AssetStore;
use crate::story::{
    LinkEvent, NarrativeEvent, PassagePlayResult, PlaythroughRecord, StoryEngine, StoryPlayback,
};

/// 故事不存在时的错误信息
pub const STORY_NOT_FOUND: &str = "Story not found.";

/// 播放阶段
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerPhase {
    #[default]
    Idle,
    /// 正在同步处理事件
    Advancing,
    /// 等待动画批次完成
    AwaitingAnimation,
    /// 段落事件已处理完，等待选择链接
    PassageExhausted,
    /// 故事已结束
    Ended,
}

/// 角色动作附带的表情信息
struct CharacterCue {
    name: String,
    expression: String,
}

struct PlaybackSession {
    playback: Rc<dyn StoryPlayback>,
    results: ObservableView<Option<PassagePlayResult>>,
    subscription: SubscriptionId,
}

impl PlaybackSession {
    fn close(self) {
        self.results.unsubscribe(self.subscription);
    }
}

#[derive(Default)]
struct PassageState {
    /// 当前事件下标
    cursor: usize,
    events: Vec<NarrativeEvent>,
    /// 当前段落累积的链接
    links: Vec<LinkText>,
    session: Option<PlaybackSession>,
}

/// 故事播放器
pub struct StoryPlayer {
    store: Rc<AssetStore>,
    animations: Rc<AnimationCoordinator>,
    controller: Rc<StoryRenderController>,
    story_engine: Rc<dyn StoryEngine>,
    sound_engine: Option<Rc<dyn SoundEngine>>,
    config: EngineConfig,
    busy: Observable<bool>,
    phase: Observable<PlayerPhase>,
    state: RefCell<PassageState>,
    weak_self: Weak<StoryPlayer>,
}

impl StoryPlayer {
    pub fn new(
        store: Rc<AssetStore>,
        animations: Rc<AnimationCoordinator>,
        controller: Rc<StoryRenderController>,
        story_engine: Rc<dyn StoryEngine>,
        sound_engine: Option<Rc<dyn SoundEngine>>,
        config: EngineConfig,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| Self {
            store,
            animations,
            controller,
            story_engine,
            sound_engine,
            config,
            busy: Observable::new(false),
            phase: Observable::new(PlayerPhase::Idle),
            state: RefCell::new(PassageState::default()),
            weak_self: weak_self.clone(),
        })
    }

    // ========== 外部操作 ==========

    /// 播放已加载的故事
    ///
    /// 故事不存在时渲染状态进入 `Error("Story not found.")`；
    /// 渲染状态处于 `Error` / `Ended` 时需要先 `reset`。
    pub fn play_story(&self, story_id: &str) -> StageResult<()> {
        if self.controller.current().is_terminal() {
            warn!(story_id, "渲染状态未重置，忽略播放请求");
            return Ok(());
        }

        let Some(story) = self.store.get_as::<Story>(story_id) else {
            warn!(story_id, "故事不存在");
            self.controller.set_error(STORY_NOT_FOUND);
            return Ok(());
        };

        self.stop_playback();
        self.animations.clear_all();
        self.clear_passage();

        info!(story_id, "开始播放故事");
        self.controller.begin_loading();

        let playback = self.story_engine.start_playing(&story.content);
        let results = playback.play_results();
        let weak = self.weak_self.clone();
        let subscription = results.subscribe(move |result| {
            if let (Some(player), Some(result)) = (weak.upgrade(), result) {
                player.on_play_result(result.clone());
            }
        });
        self.state.borrow_mut().session = Some(PlaybackSession {
            playback: Rc::clone(&playback),
            results,
            subscription,
        });

        playback.play_passage(None);
        Ok(())
    }

    /// 选择链接，播放目标段落
    pub fn choose_story_passage(&self, link: &LinkEvent) -> StageResult<()> {
        let playback = self
            .state
            .borrow()
            .session
            .as_ref()
            .map(|session| Rc::clone(&session.playback));
        let Some(playback) = playback else {
            return Err(StoryError::NoActiveStory.into());
        };

        info!(link = %link.id, target = %link.target_passage_name, "选择链接");
        playback.play_passage(Some(link));
        Ok(())
    }

    /// 直接加载场景（清空正在播放的动画）
    pub fn load_scene(&self, ids: SceneRenderStateIds) {
        self.animations.clear_all();
        self.controller.set_scene(ids);
    }

    /// 重置播放状态（不清空资源存储）
    pub fn reset(&self) {
        debug!("重置故事播放器");
        self.animations.clear_all();
        self.stop_playback();
        self.clear_passage();
        self.busy.set(false);
        self.phase.set(PlayerPhase::Idle);
        self.controller.reset();
    }

    // ========== 查询 ==========

    /// 可供选择的链接（仅在段落结束后非空）
    pub fn available_links(&self) -> Vec<LinkText> {
        if self.phase.get() != PlayerPhase::PassageExhausted {
            return Vec::new();
        }
        self.state.borrow().links.clone()
    }

    pub fn phase(&self) -> PlayerPhase {
        self.phase.get()
    }

    pub fn phase_view(&self) -> ObservableView<PlayerPhase> {
        self.phase.view()
    }

    /// 是否有进行中的动画批次（此时应屏蔽玩家输入）
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    pub fn busy(&self) -> ObservableView<bool> {
        self.busy.view()
    }

    /// 是否有正在播放的故事
    pub fn has_active_story(&self) -> bool {
        self.state.borrow().session.is_some()
    }

    // ========== 段落处理 ==========

    fn on_play_result(&self, result: PassagePlayResult) {
        match result {
            PassagePlayResult::DataReady {
                passage_events,
                playthrough_record,
            } => {
                if let Err(e) = self.handle_passage(passage_events, playthrough_record) {
                    error!(error = %e, "处理段落数据失败");
                    self.controller.set_error(e.to_string());
                }
            }
            PassagePlayResult::Error { message } => {
                warn!(message = %message, "故事引擎返回错误");
                self.controller.set_error(message);
            }
        }
    }

    fn handle_passage(
        &self,
        events: Vec<NarrativeEvent>,
        record: PlaythroughRecord,
    ) -> StageResult<()> {
        debug!(
            events = events.len(),
            history = record.events.len(),
            "段落数据就绪"
        );

        // 用通关记录重建历史文本：没有文本的链接不显示，其余链接标记为已选择
        let history: Vec<Text> = record
            .played_texts()
            .filter_map(|text| match text {
                Text::Link(link) if link.link.link_text.is_none() => None,
                Text::Link(link) => Some(Text::Link(LinkText::chosen(link.link))),
                other => Some(other),
            })
            .collect();
        let char_ms = self.config.text_char_duration_ms;
        let history_animations: Vec<Asset> = history
            .iter()
            .map(|text| text.animation(char_ms).into())
            .collect();
        self.store
            .add_or_update_all(history.into_iter().map(Asset::from));
        self.store.add_or_update_all(history_animations);

        // 上一段落中没被选择的链接不再显示
        let previous_links: Vec<String> = self
            .state
            .borrow()
            .links
            .iter()
            .map(|link| link.id().to_string())
            .collect();
        let unchosen: Vec<String> = self
            .store
            .get_all_as::<LinkText>(&previous_links)
            .into_iter()
            .filter(|link| !link.was_chosen)
            .map(|link| link.id().to_string())
            .collect();
        self.controller.update_scene(|ids| {
            let mut next = ids.clone();
            next.text_box_ids.retain(|id| !unchosen.contains(id));
            next
        });

        {
            let mut state = self.state.borrow_mut();
            state.cursor = 0;
            state.events = events;
            state.links.clear();
        }
        self.process_next_event()
    }

    /// 从当前下标开始处理事件，直到需要等待动画、段落结束或故事结束
    fn process_next_event(&self) -> StageResult<()> {
        self.phase.set(PlayerPhase::Advancing);
        loop {
            let next = {
                let state = self.state.borrow();
                state.events.get(state.cursor).cloned()
            };
            let Some(event) = next else {
                self.finish_passage();
                return Ok(());
            };

            match event {
                NarrativeEvent::InformationalText { id, value } => {
                    return self.play_text(Text::Info(TextBox::new(id, value)), None);
                }
                NarrativeEvent::PlayerText { id, value } => {
                    return self.play_text(Text::Player(TextBox::new(id, value)), None);
                }
                NarrativeEvent::CharacterAction {
                    id,
                    character_name,
                    expression,
                    text,
                } => {
                    let cue = CharacterCue {
                        name: character_name,
                        expression,
                    };
                    return self.play_text(Text::Character(TextBox::new(id, text)), Some(cue));
                }
                NarrativeEvent::Link(link) => {
                    debug!(link = %link.id, "累积链接");
                    let link_text = LinkText::new(link);
                    self.store.add_or_update(Text::Link(link_text.clone()));
                    self.state.borrow_mut().links.push(link_text);
                }
                NarrativeEvent::Sound { id, name } => match &self.sound_engine {
                    Some(sound) => {
                        debug!(id = %id, name = %name, "播放音效");
                        sound.play_sound_effect(&name);
                    }
                    None => debug!(id = %id, name = %name, "未配置声音引擎，跳过音效"),
                },
                NarrativeEvent::StoryEnded {
                    playthrough_record, ..
                } => {
                    self.phase.set(PlayerPhase::Ended);
                    self.controller.set_story_ended(playthrough_record);
                    return Ok(());
                }
                NarrativeEvent::Custom { id, name, payload } => {
                    debug!(id = %id, name = %name, payload = %payload, "跳过自定义事件");
                }
            }
            self.state.borrow_mut().cursor += 1;
        }
    }

    fn play_text(&self, text: Text, cue: Option<CharacterCue>) -> StageResult<()> {
        self.busy.set(true);
        self.phase.set(PlayerPhase::AwaitingAnimation);

        let text_id = text.id().to_string();
        let mut batch = vec![text.animation(self.config.text_char_duration_ms)];
        self.store.add_or_update(text);

        let mut active_character = None;
        if let Some(cue) = &cue {
            active_character = self
                .store
                .get_as::<CharacterSprite>(&cue.name)
                .map(|sprite| sprite.id);
            if active_character.is_none() {
                warn!(character = %cue.name, "角色立绘不存在");
            }

            let expression_id = animation_id(&cue.name, &cue.expression);
            match self.store.get_as::<Animation>(&expression_id) {
                Some(animation) => batch.push(animation),
                None => warn!(id = %expression_id, "表情动画不存在"),
            }
        }

        self.controller.update_scene(|ids| {
            let mut next = ids.clone();
            next.text_box_ids.push(text_id.clone());
            if cue.is_some() {
                next.active_character_id = active_character.clone();
            }
            next
        });

        debug!(text = %text_id, animations = batch.len(), "显示文本");
        let weak = self.weak_self.clone();
        let submitted = self.animations.play_batch(batch, move |outcome| match weak.upgrade() {
            Some(player) => player.on_batch_complete(outcome),
            None => Ok(()),
        });
        if let Err(e) = submitted {
            // 批次被拒绝，不会有完成回调
            self.busy.set(false);
            self.phase.set(PlayerPhase::Idle);
            return Err(e);
        }
        Ok(())
    }

    fn on_batch_complete(&self, outcome: BatchOutcome) -> StageResult<()> {
        for animation in &outcome.completed {
            let Animation::SpriteTransition(transition) = animation else {
                continue;
            };
            match self.store.get_as::<Sprite>(&transition.to_sprite_id) {
                Some(sprite) => {
                    debug!(
                        from = %transition.from_sprite_id,
                        to = %transition.to_sprite_id,
                        "应用精灵过渡"
                    );
                    self.store
                        .add_or_update_as(transition.from_sprite_id.clone(), sprite);
                }
                None => warn!(id = %transition.to_sprite_id, "过渡目标立绘不存在"),
            }
        }

        self.busy.set(false);
        self.state.borrow_mut().cursor += 1;
        self.process_next_event()
    }

    fn finish_passage(&self) {
        let link_ids: Vec<String> = self
            .state
            .borrow()
            .links
            .iter()
            .map(|link| link.id().to_string())
            .collect();
        info!(links = link_ids.len(), "段落播放完毕");
        self.controller.update_scene(|ids| {
            let mut next = ids.clone();
            next.text_box_ids.extend(link_ids.iter().cloned());
            next
        });
        self.phase.set(PlayerPhase::PassageExhausted);
    }

    fn clear_passage(&self) {
        let mut state = self.state.borrow_mut();
        state.cursor = 0;
        state.events.clear();
        state.links.clear();
    }

    fn stop_playback(&self) {
        let session = self.state.borrow_mut().session.take();
        if let Some(session) = session {
            session.close();
        }
    }
}

impl Drop for StoryPlayer {
    fn drop(&mut self) {
        if let Some(session) = self.state.get_mut().session.take() {
            session.close();
        }
    }
}
