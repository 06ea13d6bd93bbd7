//! # Observable 模块
//!
//! 单线程的发布/订阅值容器，用于向 UI 暴露可观察状态。
//!
//! ## 设计说明
//!
//! - [`Observable`] 由所属组件独占写入（单写者）
//! - [`ObservableView`] 是交给消费者的只读句柄，可以读取和订阅
//! - 值未变化时 `set` 不会通知订阅者；`modify` 原地修改并总是通知
//! - 订阅回调中写入新值时，嵌套通知把新值发给所有订阅者，外层通知随即停止，
//!   订阅者最后看到的总是当前值
//! - 通知时不持有任何内部借用，订阅回调可以重入读取、写入或（取消）订阅
//!
//! ```rust,ignore
//! let busy = Observable::new(false);
//! let view = busy.view();
//! view.subscribe(|value| println!("busy = {value}"));
//! busy.set(true);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// 订阅标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber<T> = Rc<dyn Fn(&T)>;

struct Shared<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<(SubscriptionId, Subscriber<T>)>>,
    next_id: Cell<u64>,
    /// 每次写入递增
    version: Cell<u64>,
}

impl<T: Clone + 'static> Shared<T> {
    fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers
            .borrow_mut()
            .push((id, Rc::new(callback) as Subscriber<T>));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.subscribers.borrow().iter().any(|(sid, _)| *sid == id)
    }

    fn bump(&self) {
        self.version.set(self.version.get() + 1);
    }

    fn notify(&self) {
        let version = self.version.get();
        let snapshot = self.value.borrow().clone();
        let subscribers: Vec<(SubscriptionId, Subscriber<T>)> = self
            .subscribers
            .borrow()
            .iter()
            .map(|(id, s)| (*id, Rc::clone(s)))
            .collect();

        for (id, subscriber) in subscribers {
            // 回调写入了新值，嵌套通知已经送达所有订阅者
            if self.version.get() != version {
                break;
            }
            // 前面的回调可能已经取消了这个订阅
            if self.is_subscribed(id) {
                subscriber(&snapshot);
            }
        }
    }
}

/// 可观察值（写端）
pub struct Observable<T> {
    shared: Rc<Shared<T>>,
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// 创建带初始值的可观察值
    pub fn new(value: T) -> Self {
        Self {
            shared: Rc::new(Shared {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                version: Cell::new(0),
            }),
        }
    }

    /// 获取当前值的拷贝
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// 以借用方式访问当前值
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.shared.value.borrow())
    }

    /// 设置新值，值发生变化时通知订阅者
    ///
    /// 返回值表示是否发生了变化。
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.shared.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        self.shared.bump();
        self.shared.notify();
        true
    }

    /// 原地修改当前值并通知订阅者（不做相等比较）
    pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = f(&mut *self.shared.value.borrow_mut());
        self.shared.bump();
        self.shared.notify();
        result
    }

    /// 基于当前值计算新值并设置
    pub fn update(&self, f: impl FnOnce(&T) -> T) -> bool {
        let next = f(&*self.shared.value.borrow());
        self.set(next)
    }

    /// 订阅值变化
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        self.shared.subscribe(callback)
    }

    /// 取消订阅
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.unsubscribe(id)
    }

    /// 创建只读句柄
    pub fn view(&self) -> ObservableView<T> {
        ObservableView {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.shared.value.borrow())
            .field("subscribers", &self.shared.subscribers.borrow().len())
            .finish()
    }
}

/// 可观察值的只读句柄
pub struct ObservableView<T> {
    shared: Rc<Shared<T>>,
}

impl<T: Clone + 'static> ObservableView<T> {
    /// 获取当前值的拷贝
    pub fn get(&self) -> T {
        self.shared.value.borrow().clone()
    }

    /// 以借用方式访问当前值
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&*self.shared.value.borrow())
    }

    /// 订阅值变化
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> SubscriptionId {
        self.shared.subscribe(callback)
    }

    /// 取消订阅
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.unsubscribe(id)
    }

    /// 当前订阅者数量
    pub fn subscriber_count(&self) -> usize {
        self.shared.subscribers.borrow().len()
    }
}

impl<T> Clone for ObservableView<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableView")
            .field(&*self.shared.value.borrow())
            .finish()
    }
}
