//! # Controller 模块
//!
//! 渲染控制器：维护请求的场景 ID，并随 ID 或资源存储的变化重新解析场景。
//!
//! - [`SceneRenderController`]：`ids + store -> SceneRenderState`
//! - [`StoryRenderController`]：在场景之上叠加故事级状态
//!   （初始化 / 加载 / 渲染 / 错误 / 结束）

use std::rc::Rc;
use tracing::{debug, info, warn};

use super::ids::SceneRenderStateIds;
use super::state::{SceneRenderState, StoryRenderState};
use crate::observable::{Observable, ObservableView, SubscriptionId};
use crate::store::AssetStore;
use crate::story::PlaythroughRecord;

/// 场景渲染控制器
pub struct SceneRenderController {
    store: Rc<AssetStore>,
    ids: Observable<SceneRenderStateIds>,
    scene: Rc<Observable<SceneRenderState>>,
    store_subscription: SubscriptionId,
}

impl SceneRenderController {
    pub fn new(store: Rc<AssetStore>) -> Self {
        let ids = Observable::new(SceneRenderStateIds::default());
        let scene = Rc::new(Observable::new(
            ids.with(|ids| ids.resolve(&store.snapshot())),
        ));

        let weak_scene = Rc::downgrade(&scene);
        let ids_view = ids.view();
        let store_subscription = store.assets().subscribe(move |assets| {
            if let Some(scene) = weak_scene.upgrade() {
                scene.set(ids_view.with(|ids| ids.resolve(assets)));
            }
        });

        Self {
            store,
            ids,
            scene,
            store_subscription,
        }
    }

    /// 设置场景 ID 并重新解析
    pub fn set_scene(&self, ids: SceneRenderStateIds) {
        self.ids.set(ids);
        self.refresh();
    }

    /// 基于当前 ID 计算新 ID 并设置
    pub fn update_scene(&self, f: impl FnOnce(&SceneRenderStateIds) -> SceneRenderStateIds) {
        let next = self.ids.with(f);
        self.set_scene(next);
    }

    /// 当前场景 ID
    pub fn ids(&self) -> SceneRenderStateIds {
        self.ids.get()
    }

    pub fn ids_view(&self) -> ObservableView<SceneRenderStateIds> {
        self.ids.view()
    }

    /// 当前解析后的场景
    pub fn current(&self) -> SceneRenderState {
        self.scene.get()
    }

    pub fn render_state(&self) -> ObservableView<SceneRenderState> {
        self.scene.view()
    }

    fn refresh(&self) {
        let assets = self.store.snapshot();
        self.scene.set(self.ids.with(|ids| ids.resolve(&assets)));
    }
}

impl Drop for SceneRenderController {
    fn drop(&mut self) {
        self.store.assets().unsubscribe(self.store_subscription);
    }
}

/// 故事渲染控制器
pub struct StoryRenderController {
    scene: SceneRenderController,
    state: Rc<Observable<StoryRenderState>>,
    scene_subscription: SubscriptionId,
}

impl StoryRenderController {
    pub fn new(store: Rc<AssetStore>) -> Self {
        let scene = SceneRenderController::new(store);
        let state = Rc::new(Observable::new(StoryRenderState::Initializing));

        // 渲染中时跟随场景的每次变化
        let weak_state = Rc::downgrade(&state);
        let scene_subscription = scene.render_state().subscribe(move |resolved| {
            if let Some(state) = weak_state.upgrade() {
                let rendering = state.with(|s| matches!(s, StoryRenderState::Rendering(_)));
                if rendering {
                    state.set(StoryRenderState::Rendering(resolved.clone()));
                }
            }
        });

        Self {
            scene,
            state,
            scene_subscription,
        }
    }

    /// 已请求故事，进入 `Loading`
    ///
    /// 处于 `Error` / `Ended` 时保持不变，返回 `false`。
    pub fn begin_loading(&self) -> bool {
        if self.is_terminal() {
            warn!("渲染状态需要 reset 才能重新加载");
            return false;
        }
        self.state.set(StoryRenderState::Loading);
        true
    }

    /// 设置场景 ID
    ///
    /// 除 `Error` / `Ended` 外都会进入 `Rendering`。
    pub fn set_scene(&self, ids: SceneRenderStateIds) {
        self.scene.set_scene(ids);
        self.publish_scene();
    }

    /// 基于当前 ID 计算新 ID 并设置
    pub fn update_scene(&self, f: impl FnOnce(&SceneRenderStateIds) -> SceneRenderStateIds) {
        self.scene.update_scene(f);
        self.publish_scene();
    }

    /// 进入 `Error`
    pub fn set_error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!(message = %message, "渲染进入错误状态");
        self.state.set(StoryRenderState::Error(message));
    }

    /// 进入 `Ended`
    pub fn set_story_ended(&self, record: PlaythroughRecord) {
        info!(events = record.events.len(), "故事结束");
        self.state.set(StoryRenderState::Ended(record));
    }

    /// 回到 `Initializing`，场景 ID 恢复默认
    pub fn reset(&self) {
        debug!("重置渲染状态");
        self.state.set(StoryRenderState::Initializing);
        self.scene.set_scene(SceneRenderStateIds::default());
    }

    /// 当前请求的场景 ID
    pub fn requested_ids(&self) -> SceneRenderStateIds {
        self.scene.ids()
    }

    pub fn requested_ids_view(&self) -> ObservableView<SceneRenderStateIds> {
        self.scene.ids_view()
    }

    pub fn render_state(&self) -> ObservableView<StoryRenderState> {
        self.state.view()
    }

    pub fn current(&self) -> StoryRenderState {
        self.state.get()
    }

    pub fn scene(&self) -> &SceneRenderController {
        &self.scene
    }

    fn is_terminal(&self) -> bool {
        self.state.with(StoryRenderState::is_terminal)
    }

    fn publish_scene(&self) {
        if self.is_terminal() {
            return;
        }
        self.state
            .set(StoryRenderState::Rendering(self.scene.current()));
    }
}

impl Drop for StoryRenderController {
    fn drop(&mut self) {
        self.scene.render_state().unsubscribe(self.scene_subscription);
    }
}
