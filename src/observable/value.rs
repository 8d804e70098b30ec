//! 定义了基础的可观察容器 `ObservableValue`。
//! Defines the base observable container, `ObservableValue`.

use crate::error::{Error, Result};
use std::fmt;
use tracing::debug;

/// The marker returned by [`ObservableValue::format`] when a configured
/// formatter fails.
/// 当配置的格式化器失败时 [`ObservableValue::format`] 返回的占位标记。
pub const UNFORMATTABLE: &str = "<unformattable>";

/// An opaque handle identifying one observer registration.
///
/// Registrations are keyed by handle rather than by callable identity, so
/// registering the same closure twice is well-defined: it is simply two
/// registrations.
///
/// 标识一次观察者注册的不透明句柄。注册以句柄为键，而不是以可调用对象的
/// 身份为键，因此重复注册同一个闭包是良定义的：就是两次注册。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

/// An observer invoked after every successful mutation, with the source
/// container, the new value and the old value.
/// 每次成功变更后被调用的观察者，参数为源容器、新值与旧值。
pub type Observer<T> = Box<dyn Fn(&ObservableValue<T>, Option<&T>, Option<&T>) + Send + Sync>;

/// A pure predicate over the source container and a candidate value.
/// Rejection aborts the mutation before any state changes.
/// 针对源容器与候选值的纯谓词。拒绝会在任何状态变化之前中止变更。
pub type Validator<T> = Box<dyn Fn(&ObservableValue<T>, Option<&T>) -> bool + Send + Sync>;

/// A display transform. A `None` result is a formatting failure; the
/// container substitutes [`UNFORMATTABLE`] instead of propagating it.
/// 显示转换。返回 `None` 表示格式化失败；容器会替换为
/// [`UNFORMATTABLE`]，而不会向外传播。
pub type Formatter<T> = Box<dyn Fn(&ObservableValue<T>, Option<&T>) -> Option<String> + Send + Sync>;

/// A typed holder of a single value with validation and change
/// notification.
///
/// The value type is fixed at compile time by the generic parameter; the
/// explicit absent sentinel of the reference behavior survives as
/// `Option<T>`. Mutation goes through [`set`](Self::set) only: validation,
/// storage and observer dispatch form one synchronous unit.
///
/// 带验证与变更通知的单值类型化容器。值类型由泛型参数在编译期固定；
/// 参考行为中的显式"缺失"哨兵以 `Option<T>` 保留。变更只能通过
/// [`set`](Self::set) 进行：验证、存储与观察者分发构成一个同步单元。
pub struct ObservableValue<T> {
    value: Option<T>,
    validator: Option<Validator<T>>,
    formatter: Option<Formatter<T>>,
    observers: Vec<(SubscriptionId, Observer<T>)>,
    next_subscription: u64,
}

impl<T: fmt::Debug> ObservableValue<T> {
    /// Creates a container with no validator.
    /// 创建一个不带验证器的容器。
    pub fn new(initial: impl Into<Option<T>>) -> Self {
        Self {
            value: initial.into(),
            validator: None,
            formatter: None,
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Creates a container with a validator. The initial value must itself
    /// pass validation or construction fails.
    /// 创建一个带验证器的容器。初始值本身必须通过验证，否则构造失败。
    pub fn with_validator(initial: impl Into<Option<T>>, validator: Validator<T>) -> Result<Self> {
        let this = Self {
            value: initial.into(),
            validator: Some(validator),
            formatter: None,
            observers: Vec::new(),
            next_subscription: 0,
        };
        if let Some(validator) = &this.validator {
            if !validator(&this, this.value.as_ref()) {
                return Err(Error::Validation(describe(&this.value)));
            }
        }
        Ok(this)
    }

    /// Attaches a display transform, used only by [`format`](Self::format),
    /// never for storage.
    /// 附加一个显示转换，仅由 [`format`](Self::format) 使用，绝不用于存储。
    pub fn set_formatter(&mut self, formatter: Formatter<T>) {
        self.formatter = Some(formatter);
    }

    /// Returns the current value. No side effects.
    /// 返回当前值。无副作用。
    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Stores a new value, then synchronously invokes every registered
    /// observer with `(self, new, old)`.
    ///
    /// Fails with [`Error::Validation`] if the validator rejects the
    /// candidate; validation failures never mutate state. Observer panics
    /// are not caught by this layer.
    ///
    /// 存储新值，然后以 `(self, new, old)` 同步调用每个已注册的观察者。
    /// 若验证器拒绝候选值则以 [`Error::Validation`] 失败；验证失败绝不
    /// 改变状态。本层不捕获观察者的恐慌。
    pub fn set(&mut self, new_value: impl Into<Option<T>>) -> Result<()> {
        let new_value = new_value.into();
        if let Some(validator) = &self.validator {
            if !validator(self, new_value.as_ref()) {
                return Err(Error::Validation(describe(&new_value)));
            }
        }

        let old_value = std::mem::replace(&mut self.value, new_value);
        debug!(old = ?old_value, new = ?self.value, "observable value changed");

        let this: &Self = self;
        for (_, observer) in &this.observers {
            observer(this, this.value.as_ref(), old_value.as_ref());
        }
        Ok(())
    }

    /// Registers an observer and returns its subscription handle.
    /// 注册一个观察者并返回其订阅句柄。
    pub fn subscribe(&mut self, observer: Observer<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, observer));
        id
    }

    /// Removes a registration. Returns `false` when the handle is unknown.
    /// 移除一次注册。句柄未知时返回 `false`。
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(known, _)| *known != id);
        self.observers.len() != before
    }

    /// Renders the value through the formatter when one is attached,
    /// substituting [`UNFORMATTABLE`] on a formatting failure. Without a
    /// formatter, falls back to the `Debug` rendering (`"None"` when
    /// absent).
    /// 有格式化器时通过它渲染值，格式化失败则替换为 [`UNFORMATTABLE`]。
    /// 没有格式化器时回退到 `Debug` 渲染（缺失时为 `"None"`）。
    pub fn format(&self) -> String {
        if let Some(formatter) = &self.formatter {
            return formatter(self, self.value.as_ref())
                .unwrap_or_else(|| UNFORMATTABLE.to_string());
        }
        describe(&self.value)
    }
}

fn describe<T: fmt::Debug>(value: &Option<T>) -> String {
    match value {
        Some(value) => format!("{value:?}"),
        None => "None".to_string(),
    }
}

impl<T: fmt::Debug> fmt::Display for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl<T: fmt::Debug> fmt::Debug for ObservableValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableValue")
            .field("value", &self.value)
            .field("has_validator", &self.validator.is_some())
            .field("has_formatter", &self.formatter.is_some())
            .field("observer_count", &self.observers.len())
            .finish()
    }
}
