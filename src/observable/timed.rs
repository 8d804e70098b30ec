//! 定义了带自动衰减定时器的状态容器 `TimedStatefulValue`。
//! Defines the state container with automatic decay timers,
//! `TimedStatefulValue`.

use super::state::{State, StateObserver, StatefulValue};
use super::value::{Observer, SubscriptionId};
use crate::error::Result;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// A stateful value whose state decays forward on a timer while the value
/// is not refreshed: `Green` ages to `Yellow` after `green_to_yellow`, and
/// `Yellow` to `Red` after `yellow_to_red`, when those durations are
/// configured. Every successful value mutation forces the state back to
/// `Green` and restarts the decay clock.
///
/// This is a cloneable handle; clones share the same underlying value. A
/// fired timer re-enters `set_state` through the shared handle exactly as
/// an external caller would. Callbacks are dispatched with the internal
/// lock held and must not reentrantly mutate the same handle.
///
/// 一个状态随定时器向前衰减的携带状态的值：在配置了相应时长的情况下，
/// `Green` 在 `green_to_yellow` 之后老化为 `Yellow`，`Yellow` 在
/// `yellow_to_red` 之后老化为 `Red`。每次成功的值变更都会把状态强制回到
/// `Green` 并重启衰减时钟。
///
/// 这是一个可克隆的句柄；克隆共享同一个底层值。到期的定时器通过共享
/// 句柄重新进入 `set_state`，与外部调用者完全一样。回调在持有内部锁的
/// 情况下被分发，不得重入地变更同一个句柄。
pub struct TimedStatefulValue<T> {
    inner: Arc<Mutex<TimedInner<T>>>,
}

impl<T> Clone for TimedStatefulValue<T> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

struct TimedInner<T> {
    value: StatefulValue<T>,
    green_to_yellow: Option<Duration>,
    yellow_to_red: Option<Duration>,
    green_to_yellow_timer: Option<JoinHandle<()>>,
    yellow_to_red_timer: Option<JoinHandle<()>>,
    weak: Weak<Mutex<TimedInner<T>>>,
}

impl<T> Drop for TimedInner<T> {
    fn drop(&mut self) {
        self.cancel_timers();
    }
}

impl<T> TimedInner<T> {
    /// Aborting is a no-op when the timer already fired or was never armed.
    /// 若定时器已触发或从未布防，中止是一个空操作。
    fn cancel_timers(&mut self) {
        if let Some(timer) = self.green_to_yellow_timer.take() {
            timer.abort();
        }
        if let Some(timer) = self.yellow_to_red_timer.take() {
            timer.abort();
        }
    }
}

impl<T: fmt::Debug + Send + 'static> TimedInner<T> {
    /// Cancels pending timers, performs the base transition and
    /// notification, then arms at most one new timer based on the state
    /// just entered.
    /// 先取消未决定时器，再执行基础转换与通知，然后根据刚进入的状态
    /// 至多布防一个新的定时器。
    fn apply_state(&mut self, new_state: State) {
        self.cancel_timers();
        self.value.set_state(new_state);

        match new_state {
            State::Green => {
                if let Some(after) = self.green_to_yellow {
                    self.green_to_yellow_timer =
                        Some(spawn_decay(self.weak.clone(), after, State::Yellow));
                }
            }
            State::Yellow => {
                if let Some(after) = self.yellow_to_red {
                    self.yellow_to_red_timer =
                        Some(spawn_decay(self.weak.clone(), after, State::Red));
                }
            }
            // Red, Blue and Uninitialized never decay on their own; leaving
            // them takes an explicit set_state or a fresh set(value).
            // Red、Blue 与 Uninitialized 绝不自行衰减；离开它们需要显式的
            // set_state 或一次新的 set(value)。
            _ => {}
        }
    }
}

/// Schedules the one-shot decay transition. The task holds only a weak
/// handle, so an abandoned value never keeps itself alive through its own
/// timers.
/// 调度一次性的衰减转换。任务只持有弱句柄，因此被丢弃的值不会通过
/// 自己的定时器把自己保活。
fn spawn_decay<T: fmt::Debug + Send + 'static>(
    weak: Weak<Mutex<TimedInner<T>>>,
    after: Duration,
    next: State,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        if let Some(inner) = weak.upgrade() {
            lock(&inner).apply_state(next);
        }
    })
}

fn lock<T>(inner: &Mutex<TimedInner<T>>) -> MutexGuard<'_, TimedInner<T>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: fmt::Debug + Send + 'static> TimedStatefulValue<T> {
    /// Creates a timed value starting in [`State::Uninitialized`] with the
    /// given decay durations (`None` disables the respective transition).
    /// 创建一个初始状态为 [`State::Uninitialized`] 的定时值，并给定衰减
    /// 时长（`None` 表示禁用相应的转换）。
    pub fn new(
        initial: impl Into<Option<T>>,
        green_to_yellow: Option<Duration>,
        yellow_to_red: Option<Duration>,
    ) -> Self {
        Self::from_stateful(StatefulValue::new(initial), green_to_yellow, yellow_to_red)
    }

    /// Wraps an already configured stateful value (validator, formatter,
    /// callbacks) with decay timers.
    /// 为一个已配置好的携带状态的值（验证器、格式化器、回调）加上
    /// 衰减定时器。
    pub fn from_stateful(
        value: StatefulValue<T>,
        green_to_yellow: Option<Duration>,
        yellow_to_red: Option<Duration>,
    ) -> Self {
        if let Some(after) = green_to_yellow {
            debug!(?after, "green-to-yellow decay configured");
        }
        if let Some(after) = yellow_to_red {
            debug!(?after, "yellow-to-red decay configured");
        }
        let inner = Arc::new_cyclic(|weak| {
            Mutex::new(TimedInner {
                value,
                green_to_yellow,
                yellow_to_red,
                green_to_yellow_timer: None,
                yellow_to_red_timer: None,
                weak: weak.clone(),
            })
        });
        Self { inner }
    }

    /// Sets the carried value, then unconditionally forces the state to
    /// [`State::Green`], notifying state observers and (re)arming the decay
    /// chain. A validation failure leaves both the state and any pending
    /// timers untouched.
    /// 设置携带的值，然后无条件地把状态强制为 [`State::Green`]，通知状态
    /// 观察者并（重新）布防衰减链。验证失败时状态与未决定时器都保持不变。
    pub fn set(&self, new_value: impl Into<Option<T>>) -> Result<()> {
        let mut inner = lock(&self.inner);
        inner.value.set(new_value)?;
        inner.apply_state(State::Green);
        Ok(())
    }

    /// Performs an explicit state transition with the cancel-then-rearm
    /// discipline described on the type.
    /// 按本类型所述的"先取消、再布防"纪律执行一次显式状态转换。
    pub fn set_state(&self, new_state: State) {
        lock(&self.inner).apply_state(new_state);
    }

    /// Returns the current state.
    /// 返回当前状态。
    pub fn state(&self) -> State {
        lock(&self.inner).value.state()
    }

    /// Returns a clone of the current carried value.
    /// 返回当前携带值的克隆。
    pub fn get(&self) -> Option<T>
    where
        T: Clone,
    {
        lock(&self.inner).value.get().cloned()
    }

    /// Installs the state-change callback, replacing any previous one.
    /// 安装状态变更回调，替换之前的回调。
    pub fn set_on_state_change(&self, callback: StateObserver<T>) {
        lock(&self.inner).value.set_on_state_change(callback);
    }

    /// Registers a value observer on the underlying container.
    /// 在底层容器上注册一个值观察者。
    pub fn subscribe(&self, observer: Observer<T>) -> SubscriptionId {
        lock(&self.inner).value.subscribe(observer)
    }

    /// Removes a value observer registration.
    /// 移除一次值观察者注册。
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        lock(&self.inner).value.unsubscribe(id)
    }

    /// Renders the carried value, see
    /// [`ObservableValue::format`](super::value::ObservableValue::format).
    /// 渲染携带的值，见
    /// [`ObservableValue::format`](super::value::ObservableValue::format)。
    pub fn format(&self) -> String {
        lock(&self.inner).value.format()
    }

    /// The configured green-to-yellow decay duration.
    /// 配置的绿转黄衰减时长。
    pub fn green_to_yellow(&self) -> Option<Duration> {
        lock(&self.inner).green_to_yellow
    }

    /// Reconfigures the green-to-yellow decay duration. Takes effect the
    /// next time a timer is armed; an already pending timer keeps its
    /// original deadline.
    /// 重新配置绿转黄衰减时长。在下一次布防定时器时生效；已在未决中的
    /// 定时器保持其原有期限。
    pub fn set_green_to_yellow(&self, after: Option<Duration>) {
        debug!(?after, "green-to-yellow decay reconfigured");
        lock(&self.inner).green_to_yellow = after;
    }

    /// The configured yellow-to-red decay duration.
    /// 配置的黄转红衰减时长。
    pub fn yellow_to_red(&self) -> Option<Duration> {
        lock(&self.inner).yellow_to_red
    }

    /// Reconfigures the yellow-to-red decay duration. Takes effect the next
    /// time a timer is armed.
    /// 重新配置黄转红衰减时长。在下一次布防定时器时生效。
    pub fn set_yellow_to_red(&self, after: Option<Duration>) {
        debug!(?after, "yellow-to-red decay reconfigured");
        lock(&self.inner).yellow_to_red = after;
    }
}

impl<T: fmt::Debug> fmt::Debug for TimedStatefulValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("TimedStatefulValue")
            .field("value", &inner.value)
            .field("green_to_yellow", &inner.green_to_yellow)
            .field("yellow_to_red", &inner.yellow_to_red)
            .field("green_to_yellow_armed", &inner.green_to_yellow_timer.is_some())
            .field("yellow_to_red_armed", &inner.yellow_to_red_timer.is_some())
            .finish()
    }
}
