//! 定义了离散生命周期状态与携带状态的可观察容器 `StatefulValue`。
//! Defines the discrete lifecycle state and the state-carrying observable
//! container, `StatefulValue`.

use super::value::{Observer, ObservableValue, SubscriptionId};
use crate::error::Result;
use std::fmt;
use tracing::debug;

/// The discrete lifecycle state attached to a [`StatefulValue`].
/// 附加在 [`StatefulValue`] 上的离散生命周期状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// No state has been assigned yet.
    /// 尚未赋予任何状态。
    Uninitialized,
    /// The value has expired.
    /// 值已过期。
    Red,
    /// The value is stale but still usable.
    /// 值已陈旧但仍可用。
    Yellow,
    /// The value is fresh.
    /// 值是新鲜的。
    Green,
    /// An out-of-band condition set explicitly by the owner.
    /// 由所有者显式设置的带外状态。
    Blue,
}

/// The single optional state-change callback, invoked with the source,
/// the new state and the old state.
/// 单个可选的状态变更回调，参数为源容器、新状态与旧状态。
pub type StateObserver<T> = Box<dyn Fn(&StatefulValue<T>, State, State) + Send + Sync>;

/// An observable value with a discrete lifecycle state attached.
///
/// State transitions are always explicit at this layer: setting the carried
/// value does not change the state. The automatic coupling begins in
/// [`TimedStatefulValue`](super::timed::TimedStatefulValue).
///
/// 附加了离散生命周期状态的可观察值。在本层状态转换总是显式的：设置
/// 所携带的值不会改变状态。自动耦合从
/// [`TimedStatefulValue`](super::timed::TimedStatefulValue) 开始。
pub struct StatefulValue<T> {
    value: ObservableValue<T>,
    state: State,
    on_state_change: Option<StateObserver<T>>,
}

impl<T: fmt::Debug> StatefulValue<T> {
    /// Creates a stateful value starting in [`State::Uninitialized`].
    /// 创建一个初始状态为 [`State::Uninitialized`] 的携带状态的值。
    pub fn new(initial: impl Into<Option<T>>) -> Self {
        Self::from_observable(ObservableValue::new(initial), None)
    }

    /// Creates a stateful value starting in the supplied state.
    /// 创建一个以给定状态为初始状态的携带状态的值。
    pub fn with_state(initial: impl Into<Option<T>>, state: State) -> Self {
        Self::from_observable(ObservableValue::new(initial), Some(state))
    }

    /// Wraps an already configured observable (validator, formatter,
    /// observers) without re-validating its current value.
    /// 包装一个已配置好的可观察容器（验证器、格式化器、观察者），
    /// 不对其当前值重新验证。
    pub fn from_observable(value: ObservableValue<T>, state: Option<State>) -> Self {
        Self {
            value,
            state: state.unwrap_or(State::Uninitialized),
            on_state_change: None,
        }
    }

    /// Installs the state-change callback, replacing any previous one.
    /// 安装状态变更回调，替换之前的回调。
    pub fn set_on_state_change(&mut self, callback: StateObserver<T>) {
        self.on_state_change = Some(callback);
    }

    /// Returns the current state.
    /// 返回当前状态。
    pub fn state(&self) -> State {
        self.state
    }

    /// Stores the new state, then invokes the state-change callback (when
    /// installed) with `(self, new, old)`.
    /// 存储新状态，然后（若已安装）以 `(self, new, old)` 调用状态变更回调。
    pub fn set_state(&mut self, new_state: State) {
        let old_state = std::mem::replace(&mut self.state, new_state);
        debug!(value = %self.value, ?old_state, ?new_state, "state changed");

        let this: &Self = self;
        if let Some(callback) = &this.on_state_change {
            callback(this, new_state, old_state);
        }
    }

    /// Returns the current carried value. No side effects.
    /// 返回当前携带的值。无副作用。
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Sets the carried value. The state is left untouched at this layer.
    /// 设置携带的值。本层不触碰状态。
    pub fn set(&mut self, new_value: impl Into<Option<T>>) -> Result<()> {
        self.value.set(new_value)
    }

    /// Registers a value observer on the underlying container.
    /// 在底层容器上注册一个值观察者。
    pub fn subscribe(&mut self, observer: Observer<T>) -> SubscriptionId {
        self.value.subscribe(observer)
    }

    /// Removes a value observer registration.
    /// 移除一次值观察者注册。
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.value.unsubscribe(id)
    }

    /// Renders the carried value, see [`ObservableValue::format`].
    /// 渲染携带的值，见 [`ObservableValue::format`]。
    pub fn format(&self) -> String {
        self.value.format()
    }

    /// Borrows the underlying observable container.
    /// 借用底层的可观察容器。
    pub fn value(&self) -> &ObservableValue<T> {
        &self.value
    }

    /// Mutably borrows the underlying observable container.
    /// 可变借用底层的可观察容器。
    pub fn value_mut(&mut self) -> &mut ObservableValue<T> {
        &mut self.value
    }
}

impl<T: fmt::Debug> fmt::Debug for StatefulValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatefulValue")
            .field("value", &self.value)
            .field("state", &self.state)
            .field("has_state_callback", &self.on_state_change.is_some())
            .finish()
    }
}
