//! # 故事播放集成测试
//!
//! 测试 StoryEngine → StoryPlayer → AnimationCoordinator → StoryRenderState 的完整链路。
//! 使用脚本化的故事引擎，段落内容直接写在测试里。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use serde_json::json;
use vn_stage::{
    Animation, Asset, CharacterSprite, EngineConfig, LinkEvent, NarrativeEvent, Observable,
    ObservableView, PassagePlayResult, PlayerPhase, PlaythroughRecord, SoundEngine, Sprite,
    SpriteSheetAnimation, SpriteTransitionAnimation, StoryContent, StoryEngine,
    StoryImportError, StoryPlayback, StoryRenderState, Text, VisualNovelEngine,
};

/// 脚本化故事引擎：`{ "start": 名称, "passages": { 名称: [事件...] } }`
struct ScriptedEngine;

impl StoryEngine for ScriptedEngine {
    fn import_story(&self, json: &str) -> Result<StoryContent, StoryImportError> {
        serde_json::from_str(json)
            .map(StoryContent)
            .map_err(|e| StoryImportError::new(e.to_string()))
    }

    fn start_playing(&self, content: &StoryContent) -> Rc<dyn StoryPlayback> {
        let doc = content.as_json();
        let passages: HashMap<String, Vec<NarrativeEvent>> =
            serde_json::from_value(doc["passages"].clone()).unwrap();
        Rc::new(ScriptedPlayback {
            start: doc["start"].as_str().unwrap().to_string(),
            passages,
            history: RefCell::new(Vec::new()),
            results: Observable::new(None),
        })
    }
}

struct ScriptedPlayback {
    start: String,
    passages: HashMap<String, Vec<NarrativeEvent>>,
    history: RefCell<Vec<NarrativeEvent>>,
    results: Observable<Option<PassagePlayResult>>,
}

impl StoryPlayback for ScriptedPlayback {
    fn play_passage(&self, link: Option<&LinkEvent>) {
        let name = match link {
            Some(link) => {
                self.history
                    .borrow_mut()
                    .push(NarrativeEvent::Link(link.clone()));
                link.target_passage_name.clone()
            }
            None => self.start.clone(),
        };

        let result = match self.passages.get(&name) {
            Some(events) => {
                let mut played = self.history.borrow().clone();
                let record = PlaythroughRecord::new(played.clone());
                let events: Vec<NarrativeEvent> = events
                    .iter()
                    .map(|event| {
                        let event = match event {
                            NarrativeEvent::StoryEnded { id, .. } => NarrativeEvent::StoryEnded {
                                id: id.clone(),
                                playthrough_record: PlaythroughRecord::new(played.clone()),
                            },
                            other => other.clone(),
                        };
                        // 链接只有被选择后才进入记录
                        if !matches!(event, NarrativeEvent::Link(_)) {
                            played.push(event.clone());
                        }
                        event
                    })
                    .collect();
                *self.history.borrow_mut() = played;
                PassagePlayResult::DataReady {
                    passage_events: events,
                    playthrough_record: record,
                }
            }
            None => PassagePlayResult::Error {
                message: format!("Passage '{name}' not found."),
            },
        };
        self.results.set(Some(result));
    }

    fn play_results(&self) -> ObservableView<Option<PassagePlayResult>> {
        self.results.view()
    }
}

#[derive(Default)]
struct RecordingSound {
    effects: RefCell<Vec<String>>,
}

impl SoundEngine for RecordingSound {
    fn play_sound_effect(&self, name: &str) {
        self.effects.borrow_mut().push(name.to_string());
    }

    fn play_music(&self, _name: &str, _looped: bool) {}

    fn stop_music(&self) {}
}

fn info(id: &str, value: &str) -> serde_json::Value {
    json!({"type": "informational_text", "id": id, "value": value})
}

fn link(id: &str, text: Option<&str>, target: &str) -> serde_json::Value {
    json!({"type": "link", "id": id, "link_text": text, "target_passage_name": target})
}

fn engine_with_story(story: serde_json::Value) -> VisualNovelEngine {
    let engine =
        VisualNovelEngine::new(EngineConfig::default(), Rc::new(ScriptedEngine), None).unwrap();
    engine.import_story("main", &story.to_string()).unwrap();
    engine
}

fn active_ids(engine: &VisualNovelEngine) -> Vec<String> {
    engine
        .active_animations()
        .get()
        .iter()
        .map(Animation::id)
        .collect()
}

fn text_box_ids(engine: &VisualNovelEngine) -> Vec<String> {
    match engine.render_state().get() {
        StoryRenderState::Rendering(scene) => {
            scene.text_boxes.iter().map(|t| t.id().to_string()).collect()
        }
        other => panic!("expected rendering state, got {other:?}"),
    }
}

/// 完成当前批次的所有动画
fn complete_batch(engine: &VisualNovelEngine) {
    for animation in engine.active_animations().get() {
        engine.notify_animation_complete(&animation).unwrap();
    }
}

fn alice_assets() -> Vec<Asset> {
    vec![
        Sprite::Character(CharacterSprite::new("alice", "alice/neutral.png")).into(),
        Sprite::Character(CharacterSprite::new("alice_happy", "alice/happy.png")).into(),
        Animation::SpriteTransition(SpriteTransitionAnimation::new(
            "alice",
            "smile",
            "alice",
            "alice_happy",
        ))
        .into(),
    ]
}

fn character_story(expression: &str) -> serde_json::Value {
    json!({
        "start": "Intro",
        "passages": {
            "Intro": [
                {"type": "character_action", "id": "c1", "character_name": "alice",
                 "expression": expression, "text": "嗨"},
                info("t2", "她笑了。")
            ]
        }
    })
}

#[test]
fn test_text_events_wait_for_animations() {
    let engine = engine_with_story(json!({
        "start": "Intro",
        "passages": {"Intro": [info("t1", "夜晚。"), {"type": "player_text", "id": "t2", "value": "……"}]}
    }));
    let busy_changes = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&busy_changes);
    engine.is_busy().subscribe(move |busy| sink.borrow_mut().push(*busy));

    engine.play_story("main").unwrap();

    assert_eq!(active_ids(&engine), vec!["Text_t1"]);
    assert_eq!(text_box_ids(&engine), vec!["t1"]);
    assert_eq!(engine.player().phase(), PlayerPhase::AwaitingAnimation);
    assert!(engine.player().is_busy());

    complete_batch(&engine);
    assert_eq!(active_ids(&engine), vec!["Text_t2"]);
    assert_eq!(text_box_ids(&engine), vec!["t1", "t2"]);

    complete_batch(&engine);
    assert!(active_ids(&engine).is_empty());
    assert_eq!(engine.player().phase(), PlayerPhase::PassageExhausted);
    assert!(!engine.player().is_busy());
    // 第二个文本开始前 busy 先回到 false
    assert_eq!(*busy_changes.borrow(), vec![true, false, true, false]);
}

#[test]
fn test_character_expression_transition_replaces_sprite() {
    let engine = engine_with_story(character_story("smile"));
    engine.load_assets(alice_assets()).unwrap();
    engine.play_story("main").unwrap();

    assert_eq!(active_ids(&engine), vec!["Text_c1", "alice_smile"]);
    let scene = engine.render_state().get().scene().cloned().unwrap();
    assert_eq!(
        scene.active_character.map(|c| c.image),
        Some("alice/neutral.png".to_string())
    );

    complete_batch(&engine);

    let alice = engine.store().get_as::<CharacterSprite>("alice").unwrap();
    assert_eq!(alice.image, "alice/happy.png");
    let scene = engine.render_state().get().scene().cloned().unwrap();
    assert_eq!(
        scene.active_character.map(|c| c.image),
        Some("alice/happy.png".to_string())
    );
    assert_eq!(active_ids(&engine), vec!["Text_t2"]);
}

#[test]
fn test_missing_expression_plays_text_only() {
    let engine = engine_with_story(character_story("angry"));
    engine.load_assets(alice_assets()).unwrap();
    engine.play_story("main").unwrap();

    assert_eq!(active_ids(&engine), vec!["Text_c1"]);
}

#[test]
fn test_timeout_skips_unfinished_transition() {
    let engine = engine_with_story(character_story("smile"));
    engine.load_assets(alice_assets()).unwrap();
    engine.play_story("main").unwrap();

    let text = engine.active_animations().get()[0].clone();
    engine.notify_animation_complete(&text).unwrap();
    assert!(engine.player().is_busy());

    // 过渡动画 500ms，上限 1000ms
    assert!(!engine.advance(Duration::from_millis(900)).unwrap());
    assert!(engine.advance(Duration::from_millis(100)).unwrap());

    let alice = engine.store().get_as::<CharacterSprite>("alice").unwrap();
    assert_eq!(alice.image, "alice/neutral.png");
    assert_eq!(active_ids(&engine), vec!["Text_t2"]);

    // 超时后的批次仍然正常
    complete_batch(&engine);
    assert_eq!(engine.player().phase(), PlayerPhase::PassageExhausted);
}

#[test]
fn test_links_revealed_at_passage_end() {
    let sound = Rc::new(RecordingSound::default());
    let engine = VisualNovelEngine::new(
        EngineConfig::default(),
        Rc::new(ScriptedEngine),
        Some(Rc::clone(&sound) as Rc<dyn SoundEngine>),
    )
    .unwrap();
    let story = json!({
        "start": "Hall",
        "passages": {
            "Hall": [
                info("t1", "走廊尽头有两扇门。"),
                link("l1", Some("左边"), "Left"),
                {"type": "sound", "id": "s1", "name": "door_creak"},
                {"type": "custom", "id": "x1", "name": "shake", "payload": {"strength": 3}},
                link("l2", Some("右边"), "Right")
            ]
        }
    });
    engine.import_story("main", &story.to_string()).unwrap();
    engine.play_story("main").unwrap();

    // 链接在段落结束前不显示
    assert_eq!(text_box_ids(&engine), vec!["t1"]);
    assert!(engine.available_links().is_empty());

    complete_batch(&engine);

    assert_eq!(text_box_ids(&engine), vec!["t1", "l1", "l2"]);
    let links: Vec<String> = engine
        .available_links()
        .iter()
        .map(|l| l.id().to_string())
        .collect();
    assert_eq!(links, vec!["l1", "l2"]);
    assert_eq!(*sound.effects.borrow(), vec!["door_creak"]);
    assert!(!engine.player().is_busy());
}

#[test]
fn test_choosing_link_plays_next_passage() {
    let engine = engine_with_story(json!({
        "start": "Hall",
        "passages": {
            "Hall": [info("t1", "选一扇门。"), link("l1", Some("左边"), "Left"), link("l2", Some("右边"), "Right")],
            "Left": [info("t3", "左边是图书室。")]
        }
    }));
    engine.play_story("main").unwrap();
    complete_batch(&engine);

    let chosen = engine.available_links()[0].link.clone();
    engine.choose_story_passage(&chosen).unwrap();

    // 未选择的链接被移除，选择的链接保留并标记
    assert_eq!(text_box_ids(&engine), vec!["t1", "l1", "t3"]);
    match engine.store().get("l1") {
        Some(Asset::Text(Text::Link(link))) => assert!(link.was_chosen),
        other => panic!("unexpected asset: {other:?}"),
    }
    assert!(engine.store().contains("Text_t1"));
    assert_eq!(active_ids(&engine), vec!["Text_t3"]);
}

#[test]
fn test_missing_passage_enters_error_until_reset() {
    let engine = engine_with_story(json!({
        "start": "Hall",
        "passages": {"Hall": [link("l1", Some("出去"), "Nowhere")]}
    }));
    engine.play_story("main").unwrap();
    assert_eq!(text_box_ids(&engine), vec!["l1"]);

    let chosen = engine.available_links()[0].link.clone();
    engine.choose_story_passage(&chosen).unwrap();
    assert_eq!(
        engine.render_state().get(),
        StoryRenderState::Error("Passage 'Nowhere' not found.".to_string())
    );

    // Error 不会自动恢复
    engine.play_story("main").unwrap();
    assert!(matches!(engine.render_state().get(), StoryRenderState::Error(_)));

    engine.reset();
    assert_eq!(engine.render_state().get(), StoryRenderState::Initializing);
    engine.play_story("main").unwrap();
    assert_eq!(text_box_ids(&engine), vec!["l1"]);
}

#[test]
fn test_story_ended_publishes_record() {
    let engine = engine_with_story(json!({
        "start": "Only",
        "passages": {"Only": [info("t1", "完。"), {"type": "story_ended", "id": "end"}]}
    }));
    engine.play_story("main").unwrap();
    complete_batch(&engine);

    match engine.render_state().get() {
        StoryRenderState::Ended(record) => {
            let ids: Vec<&str> = record.events.iter().map(NarrativeEvent::id).collect();
            assert_eq!(ids, vec!["t1"]);
        }
        other => panic!("expected ended state, got {other:?}"),
    }
    assert_eq!(engine.player().phase(), PlayerPhase::Ended);
}

#[test]
fn test_missing_story_enters_error() {
    let engine =
        VisualNovelEngine::new(EngineConfig::default(), Rc::new(ScriptedEngine), None).unwrap();
    engine.play_story("ghost").unwrap();
    assert_eq!(
        engine.render_state().get(),
        StoryRenderState::Error("Story not found.".to_string())
    );
}

#[test]
fn test_reset_mid_batch_keeps_store() {
    let engine = engine_with_story(json!({
        "start": "Intro",
        "passages": {"Intro": [info("t1", "第一句。"), info("t2", "第二句。")]}
    }));
    engine.play_story("main").unwrap();
    let pending = engine.active_animations().get();
    assert_eq!(pending.len(), 1);

    engine.reset();

    assert!(active_ids(&engine).is_empty());
    assert!(!engine.player().is_busy());
    assert_eq!(engine.player().phase(), PlayerPhase::Idle);
    assert_eq!(engine.render_state().get(), StoryRenderState::Initializing);
    assert!(engine.store().contains("t1"));
    assert!(engine.store().contains("main"));
    // 旧批次的回调不会再触发
    assert!(engine.notify_animation_complete(&pending[0]).is_err());
    assert!(!engine.advance(Duration::from_secs(60)).unwrap());
    assert!(!engine.player().has_active_story());
}

#[test]
fn test_rejected_batch_clears_busy() {
    let engine = engine_with_story(json!({
        "start": "Intro",
        "passages": {"Intro": [
            {"type": "character_action", "id": "c1", "character_name": "Text",
             "expression": "c1", "text": "撞名"}
        ]}
    }));
    // 表情动画 ID 与文本动画 ID 相同（Text_c1）
    engine
        .load_assets(vec![
            Animation::SpriteSheet(SpriteSheetAnimation {
                base_name: "Text".to_string(),
                name: "c1".to_string(),
                duration_ms: 100,
                delay_ms: 0,
                repeat: false,
                frames: Vec::new(),
            })
            .into(),
        ])
        .unwrap();
    engine.play_story("main").unwrap();

    assert!(matches!(engine.render_state().get(), StoryRenderState::Error(_)));
    assert!(!engine.player().is_busy());
    assert_eq!(engine.player().phase(), PlayerPhase::Idle);
    assert!(active_ids(&engine).is_empty());
}
