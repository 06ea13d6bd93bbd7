//! # Coordinator 模块
//!
//! 动画批次协调器。
//!
//! ## 批次生命周期
//!
//! ```text
//! play_batch ──► 成员逐个 pending → 完成 ──► 全部完成 ──► on_complete(succeeded, false)
//!      │                                └──► 超时     ──► on_complete(已完成部分, true)
//!      └──► 再次 play_batch / clear_all：旧批次整体丢弃，回调永不触发
//! ```
//!
//! ## 不变量
//!
//! - 同一时刻最多一个活动批次，最多一个完成回调
//! - 回调最多触发一次
//! - 回调触发前协调器已经提交了自身的状态清理，回调可以重入提交新批次；
//!   回调返回的错误原样传播给调用方
//! - 每个非空批次有单调递增的 [`BatchGeneration`]，过期的超时通过代数识别并忽略

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::timeout::TimeoutPolicy;
use crate::asset::Animation;
use crate::config::EngineConfig;
use crate::error::{AnimationError, StageResult};
use crate::observable::{Observable, ObservableView};

/// 批次代数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BatchGeneration(u64);

impl BatchGeneration {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BatchGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 批次结束结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// 已完成的动画（按完成顺序）
    pub completed: Vec<Animation>,
    /// 批次是否因超时结束
    pub timed_out: bool,
}

impl BatchOutcome {
    /// 已完成动画的 ID
    pub fn completed_ids(&self) -> Vec<String> {
        self.completed.iter().map(Animation::id).collect()
    }
}

/// 批次完成回调
pub type BatchCompletionHandler = Box<dyn FnOnce(BatchOutcome) -> StageResult<()>>;

struct ActiveBatch {
    generation: BatchGeneration,
    pending: HashSet<String>,
    succeeded: Vec<Animation>,
    handler: BatchCompletionHandler,
    remaining: Duration,
}

/// 动画批次协调器
pub struct AnimationCoordinator {
    /// 正在播放的动画（保持提交顺序）
    active: Observable<Vec<Animation>>,
    batch: RefCell<Option<ActiveBatch>>,
    next_generation: Cell<u64>,
    policy: TimeoutPolicy,
}

impl Default for AnimationCoordinator {
    fn default() -> Self {
        Self::with_policy(TimeoutPolicy::default())
    }
}

impl fmt::Debug for AnimationCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationCoordinator")
            .field("active", &self.active.with(Vec::len))
            .field("pending", &self.pending_count())
            .field("generation", &self.current_generation())
            .finish()
    }
}

impl AnimationCoordinator {
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_policy(TimeoutPolicy::from_config(config))
    }

    pub fn with_policy(policy: TimeoutPolicy) -> Self {
        Self {
            active: Observable::new(Vec::new()),
            batch: RefCell::new(None),
            next_generation: Cell::new(1),
            policy,
        }
    }

    // ========== 批次控制 ==========

    /// 提交动画批次
    ///
    /// 替换当前批次（旧回调被丢弃，不会触发）。
    /// 空批次在返回前同步触发 `on_complete([], false)`，返回 `Ok(None)`；
    /// 非空批次返回它的代数。
    ///
    /// # 错误
    ///
    /// - 批次内 ID 重复：[`AnimationError::DuplicateIds`]，不修改任何状态
    /// - 空批次的回调返回的错误
    pub fn play_batch(
        &self,
        animations: Vec<Animation>,
        on_complete: impl FnOnce(BatchOutcome) -> StageResult<()> + 'static,
    ) -> StageResult<Option<BatchGeneration>> {
        let duplicates = duplicate_ids(&animations);
        if !duplicates.is_empty() {
            warn!(ids = ?duplicates, "拒绝包含重复 ID 的动画批次");
            return Err(AnimationError::DuplicateIds { ids: duplicates }.into());
        }

        if animations.is_empty() {
            let previous = self.batch.borrow_mut().take();
            log_discarded(previous.as_ref());
            drop(previous);
            self.active.set(Vec::new());
            debug!("空动画批次，立即完成");
            on_complete(BatchOutcome::default())?;
            return Ok(None);
        }

        let generation = BatchGeneration(self.next_generation.get());
        self.next_generation.set(generation.0 + 1);
        let timeout = self.policy.batch_timeout(&animations);
        let batch = ActiveBatch {
            generation,
            pending: animations.iter().map(Animation::id).collect(),
            succeeded: Vec::new(),
            handler: Box::new(on_complete),
            remaining: timeout,
        };

        let previous = self.batch.borrow_mut().replace(batch);
        log_discarded(previous.as_ref());
        drop(previous);

        info!(
            generation = generation.0,
            count = animations.len(),
            timeout_ms = timeout.as_millis() as u64,
            "提交动画批次"
        );
        self.active.set(animations);
        Ok(Some(generation))
    }

    /// 报告单个动画完成
    ///
    /// 最后一个成员完成时，先清理批次状态，再触发 `on_complete(succeeded, false)`。
    ///
    /// # 错误
    ///
    /// - 动画不在当前批次的待完成集合中（未知、重复通知或没有活动批次）：
    ///   [`AnimationError::UnknownAnimation`]，不修改任何状态
    /// - 回调返回的错误
    pub fn notify_complete(&self, animation: &Animation) -> StageResult<()> {
        let id = animation.id();
        let finished = {
            let mut slot = self.batch.borrow_mut();
            let Some(batch) = slot.as_mut() else {
                warn!(id = %id, "没有活动批次，忽略完成通知");
                return Err(AnimationError::UnknownAnimation { id }.into());
            };
            if !batch.pending.remove(&id) {
                warn!(id = %id, generation = batch.generation.0, "完成通知不属于当前批次");
                return Err(AnimationError::UnknownAnimation { id }.into());
            }
            batch.succeeded.push(animation.clone());
            debug!(id = %id, remaining = batch.pending.len(), "动画完成");
            if batch.pending.is_empty() {
                slot.take()
            } else {
                None
            }
        };

        self.active
            .update(|current| current.iter().filter(|a| a.id() != id).cloned().collect());

        if let Some(batch) = finished {
            info!(
                generation = batch.generation.0,
                count = batch.succeeded.len(),
                "动画批次完成"
            );
            (batch.handler)(BatchOutcome {
                completed: batch.succeeded,
                timed_out: false,
            })?;
        }
        Ok(())
    }

    /// 清空所有动画
    ///
    /// 丢弃当前批次和回调（不触发），取消超时。可以重复调用。
    pub fn clear_all(&self) {
        let previous = self.batch.borrow_mut().take();
        log_discarded(previous.as_ref());
        drop(previous);
        self.active.set(Vec::new());
    }

    // ========== 时间推进 ==========

    /// 推进当前批次的超时计时
    ///
    /// 返回批次是否因本次推进而超时结束。
    pub fn advance(&self, elapsed: Duration) -> StageResult<bool> {
        let expired = {
            let mut slot = self.batch.borrow_mut();
            match slot.as_mut() {
                Some(batch) => {
                    batch.remaining = batch.remaining.saturating_sub(elapsed);
                    batch.remaining.is_zero().then_some(batch.generation)
                }
                None => None,
            }
        };

        match expired {
            Some(generation) => self.expire(generation),
            None => Ok(false),
        }
    }

    /// 让指定代数的批次超时
    ///
    /// 代数已不是当前批次（已完成、已清空或已被替换）时什么也不做，返回 `Ok(false)`。
    /// 否则先清理状态，再触发 `on_complete(已完成部分, true)`。
    pub fn expire(&self, generation: BatchGeneration) -> StageResult<bool> {
        let expired = {
            let mut slot = self.batch.borrow_mut();
            let is_current = slot
                .as_ref()
                .is_some_and(|batch| batch.generation == generation);
            if is_current { slot.take() } else { None }
        };

        let Some(batch) = expired else {
            debug!(generation = generation.0, "忽略过期批次的超时");
            return Ok(false);
        };

        let mut pending: Vec<&String> = batch.pending.iter().collect();
        pending.sort();
        warn!(
            generation = generation.0,
            pending = ?pending,
            completed = batch.succeeded.len(),
            "动画批次超时"
        );

        self.active.set(Vec::new());
        (batch.handler)(BatchOutcome {
            completed: batch.succeeded,
            timed_out: true,
        })?;
        Ok(true)
    }

    // ========== 查询 ==========

    /// 正在播放的动画
    pub fn active_animations(&self) -> ObservableView<Vec<Animation>> {
        self.active.view()
    }

    /// 尚未完成的动画数量
    pub fn pending_count(&self) -> usize {
        self.batch
            .borrow()
            .as_ref()
            .map_or(0, |batch| batch.pending.len())
    }

    /// 动画是否在当前批次中等待完成
    pub fn is_pending(&self, id: &str) -> bool {
        self.batch
            .borrow()
            .as_ref()
            .is_some_and(|batch| batch.pending.contains(id))
    }

    /// 没有活动批次
    pub fn is_idle(&self) -> bool {
        self.batch.borrow().is_none()
    }

    pub fn current_generation(&self) -> Option<BatchGeneration> {
        self.batch.borrow().as_ref().map(|batch| batch.generation)
    }

    /// 当前批次剩余的超时时间
    pub fn remaining_timeout(&self) -> Option<Duration> {
        self.batch.borrow().as_ref().map(|batch| batch.remaining)
    }

    pub fn policy(&self) -> &TimeoutPolicy {
        &self.policy
    }
}

fn log_discarded(previous: Option<&ActiveBatch>) {
    if let Some(batch) = previous {
        debug!(
            generation = batch.generation.0,
            pending = batch.pending.len(),
            "丢弃未完成的动画批次"
        );
    }
}

/// 重复出现的 ID（按首次出现顺序，每个只列一次）
fn duplicate_ids(animations: &[Animation]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for id in animations.iter().map(Animation::id) {
        if !seen.insert(id.clone()) && !duplicates.contains(&id) {
            duplicates.push(id);
        }
    }
    duplicates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SpriteSheetAnimation;
    use crate::error::{StageError, StoryError};
    use std::rc::Rc;

    fn anim(name: &str) -> Animation {
        anim_with_duration(name, 50)
    }

    fn anim_with_duration(name: &str, duration_ms: u64) -> Animation {
        Animation::SpriteSheet(SpriteSheetAnimation {
            base_name: "Test".to_string(),
            name: name.to_string(),
            duration_ms,
            delay_ms: 0,
            repeat: false,
            frames: Vec::new(),
        })
    }

    type Calls = Rc<RefCell<Vec<(Vec<String>, bool)>>>;

    fn recorder() -> (Calls, impl FnOnce(BatchOutcome) -> StageResult<()> + 'static) {
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&calls);
        let handler = move |outcome: BatchOutcome| -> StageResult<()> {
            sink.borrow_mut()
                .push((outcome.completed_ids(), outcome.timed_out));
            Ok(())
        };
        (calls, handler)
    }

    fn active_ids(coordinator: &AnimationCoordinator) -> Vec<String> {
        coordinator
            .active_animations()
            .get()
            .iter()
            .map(Animation::id)
            .collect()
    }

    #[test]
    fn test_play_batch_sets_active_in_order() {
        let coordinator = AnimationCoordinator::default();
        let (_, handler) = recorder();
        let generation = coordinator
            .play_batch(vec![anim("B"), anim("A"), anim("C")], handler)
            .unwrap();

        assert!(generation.is_some());
        assert_eq!(active_ids(&coordinator), vec!["Test_B", "Test_A", "Test_C"]);
        assert_eq!(coordinator.pending_count(), 3);
        assert!(coordinator.is_pending("Test_A"));
        assert_eq!(coordinator.remaining_timeout(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_empty_batch_completes_synchronously() {
        let coordinator = AnimationCoordinator::default();
        let (calls, handler) = recorder();
        let generation = coordinator.play_batch(Vec::new(), handler).unwrap();

        assert_eq!(generation, None);
        assert_eq!(*calls.borrow(), vec![(Vec::<String>::new(), false)]);
        assert!(coordinator.is_idle());
        assert!(active_ids(&coordinator).is_empty());
    }

    #[test]
    fn test_all_members_complete_fires_once() {
        let coordinator = AnimationCoordinator::default();
        let (calls, handler) = recorder();
        let batch = vec![anim("First"), anim("Second"), anim("Third")];
        coordinator.play_batch(batch.clone(), handler).unwrap();

        for animation in &batch {
            assert!(calls.borrow().is_empty());
            coordinator.notify_complete(animation).unwrap();
        }

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        insta::assert_snapshot!(calls[0].0.join(", "), @"Test_First, Test_Second, Test_Third");
        assert!(!calls[0].1);
        assert!(active_ids(&coordinator).is_empty());
        assert!(coordinator.is_idle());
    }

    #[test]
    fn test_notify_removes_from_active_and_rejects_repeat() {
        let coordinator = AnimationCoordinator::default();
        let (calls, handler) = recorder();
        let a = anim("A");
        coordinator.play_batch(vec![a.clone(), anim("B")], handler).unwrap();

        coordinator.notify_complete(&a).unwrap();
        assert_eq!(active_ids(&coordinator), vec!["Test_B"]);

        let err = coordinator.notify_complete(&a).unwrap_err();
        assert_eq!(
            err,
            StageError::Animation(AnimationError::UnknownAnimation {
                id: "Test_A".to_string()
            })
        );
        // 状态不变
        assert_eq!(active_ids(&coordinator), vec!["Test_B"]);
        assert_eq!(coordinator.pending_count(), 1);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_notify_without_batch_is_rejected() {
        let coordinator = AnimationCoordinator::default();
        assert!(matches!(
            coordinator.notify_complete(&anim("Ghost")),
            Err(StageError::Animation(AnimationError::UnknownAnimation { .. }))
        ));
    }

    #[test]
    fn test_replacing_batch_drops_previous_handler() {
        let coordinator = AnimationCoordinator::default();
        let (first_calls, first) = recorder();
        let (second_calls, second) = recorder();

        coordinator.play_batch(vec![anim("A1"), anim("A2")], first).unwrap();
        coordinator.notify_complete(&anim("A1")).unwrap();
        coordinator.play_batch(vec![anim("B1"), anim("B2")], second).unwrap();
        assert_eq!(active_ids(&coordinator), vec!["Test_B1", "Test_B2"]);

        // 旧批次的成员不再被接受
        assert!(coordinator.notify_complete(&anim("A2")).is_err());

        coordinator.notify_complete(&anim("B1")).unwrap();
        assert_eq!(active_ids(&coordinator), vec!["Test_B2"]);
        coordinator.notify_complete(&anim("B2")).unwrap();

        assert!(first_calls.borrow().is_empty());
        assert_eq!(second_calls.borrow().len(), 1);
        assert_eq!(second_calls.borrow()[0].0, vec!["Test_B1", "Test_B2"]);
    }

    #[test]
    fn test_duplicate_ids_rejected_without_mutation() {
        let coordinator = AnimationCoordinator::default();
        let (calls, handler) = recorder();
        coordinator.play_batch(vec![anim("Keep")], handler).unwrap();
        let generation = coordinator.current_generation();

        let (_, rejected) = recorder();
        let err = coordinator
            .play_batch(vec![anim("X"), anim("X"), anim("Y")], rejected)
            .unwrap_err();
        assert_eq!(
            err,
            StageError::Animation(AnimationError::DuplicateIds {
                ids: vec!["Test_X".to_string()]
            })
        );

        assert_eq!(active_ids(&coordinator), vec!["Test_Keep"]);
        assert_eq!(coordinator.current_generation(), generation);
        coordinator.notify_complete(&anim("Keep")).unwrap();
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_clear_all_never_invokes_handler() {
        let coordinator = AnimationCoordinator::default();
        let (calls, handler) = recorder();
        let batch = vec![anim("A"), anim("B"), anim("C")];
        coordinator.play_batch(batch.clone(), handler).unwrap();
        coordinator.notify_complete(&batch[0]).unwrap();

        coordinator.clear_all();
        coordinator.clear_all();

        assert!(active_ids(&coordinator).is_empty());
        assert!(coordinator.is_idle());
        assert!(!coordinator.advance(Duration::from_secs(60)).unwrap());
        assert!(coordinator.notify_complete(&batch[1]).is_err());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn test_timeout_fires_once_then_recovers() {
        let coordinator = AnimationCoordinator::default();
        let (calls, handler) = recorder();
        coordinator.play_batch(vec![anim("Slow")], handler).unwrap();

        assert!(!coordinator.advance(Duration::from_millis(60)).unwrap());
        assert!(calls.borrow().is_empty());
        assert!(coordinator.advance(Duration::from_millis(60)).unwrap());
        assert!(!coordinator.advance(Duration::from_millis(500)).unwrap());

        assert_eq!(*calls.borrow(), vec![(Vec::<String>::new(), true)]);
        assert!(active_ids(&coordinator).is_empty());

        // 后续批次正常工作
        let (next_calls, next) = recorder();
        coordinator.play_batch(vec![anim("Next")], next).unwrap();
        assert_eq!(coordinator.remaining_timeout(), Some(Duration::from_millis(100)));
        coordinator.notify_complete(&anim("Next")).unwrap();
        assert_eq!(*next_calls.borrow(), vec![(vec!["Test_Next".to_string()], false)]);
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_timeout_reports_partial_success() {
        let coordinator = AnimationCoordinator::default();
        let (calls, handler) = recorder();
        coordinator
            .play_batch(vec![anim("Done"), anim_with_duration("Stuck", 200)], handler)
            .unwrap();
        coordinator.notify_complete(&anim("Done")).unwrap();
        coordinator.advance(Duration::from_millis(400)).unwrap();

        assert_eq!(*calls.borrow(), vec![(vec!["Test_Done".to_string()], true)]);
    }

    #[test]
    fn test_stale_generation_expire_is_noop() {
        let coordinator = AnimationCoordinator::default();
        let (first_calls, first) = recorder();
        let (second_calls, second) = recorder();

        let old = coordinator.play_batch(vec![anim("A")], first).unwrap().unwrap();
        let current = coordinator.play_batch(vec![anim("B")], second).unwrap().unwrap();
        assert!(current > old);

        assert!(!coordinator.expire(old).unwrap());
        assert_eq!(coordinator.pending_count(), 1);

        assert!(coordinator.expire(current).unwrap());
        assert!(!coordinator.expire(current).unwrap());
        assert!(first_calls.borrow().is_empty());
        assert_eq!(*second_calls.borrow(), vec![(Vec::<String>::new(), true)]);
    }

    #[test]
    fn test_handler_error_propagates_after_cleanup() {
        let coordinator = AnimationCoordinator::default();
        coordinator
            .play_batch(vec![anim("A")], |_| Err(StoryError::NoActiveStory.into()))
            .unwrap();

        let err = coordinator.notify_complete(&anim("A")).unwrap_err();
        assert_eq!(err, StageError::Story(StoryError::NoActiveStory));
        assert!(coordinator.is_idle());
        assert!(active_ids(&coordinator).is_empty());

        let (calls, handler) = recorder();
        coordinator.play_batch(vec![anim("B")], handler).unwrap();
        coordinator.notify_complete(&anim("B")).unwrap();
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn test_handler_can_submit_next_batch() {
        let coordinator = Rc::new(AnimationCoordinator::default());
        let (calls, second) = recorder();
        let inner = Rc::clone(&coordinator);
        coordinator
            .play_batch(vec![anim("A")], move |_| {
                inner.play_batch(vec![anim("B")], second).map(|_| ())
            })
            .unwrap();

        coordinator.notify_complete(&anim("A")).unwrap();
        assert_eq!(active_ids(&coordinator), vec!["Test_B"]);
        assert_eq!(coordinator.pending_count(), 1);

        coordinator.notify_complete(&anim("B")).unwrap();
        assert_eq!(calls.borrow().len(), 1);
    }
}
