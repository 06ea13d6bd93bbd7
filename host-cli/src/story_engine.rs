//! # Story Engine 模块
//!
//! 基于 JSON 段落表的故事引擎。
//!
//! ## 文档格式
//!
//! ```json
//! {
//!   "start": "Start",
//!   "passages": [
//!     { "name": "Start", "events": [
//!       { "type": "informational_text", "id": "s1", "value": "夜晚。" },
//!       { "type": "link", "id": "s2", "link_text": "出门", "target_passage_name": "Outside" }
//!     ]}
//!   ]
//! }
//! ```
//!
//! 段落中的事件原样交给播放器。链接只有被选择后才进入通关记录，
//! `story_ended` 事件携带到该事件为止的完整记录。

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::debug;
use vn_stage::{
    LinkEvent, NarrativeEvent, Observable, ObservableView, PassagePlayResult, PlaythroughRecord,
    StoryContent, StoryEngine, StoryImportError, StoryPlayback,
};

/// 段落
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub name: String,
    #[serde(default)]
    pub events: Vec<NarrativeEvent>,
}

/// 故事文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryDocument {
    pub start: String,
    pub passages: Vec<Passage>,
}

impl StoryDocument {
    pub fn parse(json: &str) -> Result<Self, StoryImportError> {
        let doc: StoryDocument =
            serde_json::from_str(json).map_err(|e| StoryImportError::new(e.to_string()))?;
        doc.validate()?;
        Ok(doc)
    }

    fn validate(&self) -> Result<(), StoryImportError> {
        let mut names = HashSet::new();
        for passage in &self.passages {
            if !names.insert(passage.name.as_str()) {
                return Err(StoryImportError::new(format!(
                    "duplicate passage '{}'",
                    passage.name
                )));
            }
        }
        if !names.contains(self.start.as_str()) {
            return Err(StoryImportError::new(format!(
                "start passage '{}' not found",
                self.start
            )));
        }
        Ok(())
    }
}

/// JSON 故事引擎
#[derive(Debug, Default)]
pub struct JsonStoryEngine;

impl JsonStoryEngine {
    pub fn new() -> Self {
        Self
    }
}

impl StoryEngine for JsonStoryEngine {
    fn import_story(&self, json: &str) -> Result<StoryContent, StoryImportError> {
        let doc = StoryDocument::parse(json)?;
        serde_json::to_value(doc)
            .map(StoryContent)
            .map_err(|e| StoryImportError::new(e.to_string()))
    }

    fn start_playing(&self, content: &StoryContent) -> Rc<dyn StoryPlayback> {
        let document = serde_json::from_value::<StoryDocument>(content.as_json().clone())
            .map_err(|e| format!("Invalid story content: {e}"));
        Rc::new(JsonPlayback::new(document))
    }
}

/// 一次播放会话
pub struct JsonPlayback {
    start: String,
    passages: Result<HashMap<String, Vec<NarrativeEvent>>, String>,
    history: RefCell<Vec<NarrativeEvent>>,
    results: Observable<Option<PassagePlayResult>>,
}

impl JsonPlayback {
    fn new(document: Result<StoryDocument, String>) -> Self {
        let (start, passages) = match document {
            Ok(doc) => (
                doc.start,
                Ok(doc
                    .passages
                    .into_iter()
                    .map(|p| (p.name, p.events))
                    .collect()),
            ),
            Err(message) => (String::new(), Err(message)),
        };
        Self {
            start,
            passages,
            history: RefCell::new(Vec::new()),
            results: Observable::new(None),
        }
    }

    /// 播放段落并把事件并入历史
    fn resolve(&self, name: &str) -> PassagePlayResult {
        let passages = match &self.passages {
            Ok(passages) => passages,
            Err(message) => {
                return PassagePlayResult::Error {
                    message: message.clone(),
                };
            }
        };
        let Some(events) = passages.get(name) else {
            return PassagePlayResult::Error {
                message: format!("Passage '{name}' not found."),
            };
        };

        let mut played = self.history.borrow().clone();
        let playthrough_record = PlaythroughRecord::new(played.clone());
        let mut passage_events = Vec::with_capacity(events.len());
        for event in events {
            let event = match event {
                NarrativeEvent::StoryEnded { id, .. } => NarrativeEvent::StoryEnded {
                    id: id.clone(),
                    playthrough_record: PlaythroughRecord::new(played.clone()),
                },
                other => other.clone(),
            };
            if !matches!(event, NarrativeEvent::Link(_)) {
                played.push(event.clone());
            }
            passage_events.push(event);
        }
        *self.history.borrow_mut() = played;

        PassagePlayResult::DataReady {
            passage_events,
            playthrough_record,
        }
    }
}

impl StoryPlayback for JsonPlayback {
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
        debug!(passage = %name, "播放段落");
        let result = self.resolve(&name);
        self.results.set(Some(result));
    }

    fn play_results(&self) -> ObservableView<Option<PassagePlayResult>> {
        self.results.view()
    }
}
