//! 可观察变量模块 - 带验证、格式化与变更通知的类型化容器
//! Observable variable module - typed containers with validation,
//! formatting and change notification
//!
//! 三层结构：`ObservableValue` 是基础容器；`StatefulValue` 附加一个离散
//! 生命周期状态；`TimedStatefulValue` 再附加两个可选的衰减定时器，在值
//! 新鲜时自动将状态向前老化。
//!
//! Three layers: `ObservableValue` is the base container; `StatefulValue`
//! attaches a discrete lifecycle state; `TimedStatefulValue` adds two
//! optional decay timers that automatically age the state forward while
//! the value is fresh.

pub mod state;
pub mod timed;
pub mod value;


pub use state::{State, StateObserver, StatefulValue};
pub use timed::TimedStatefulValue;
pub use value::{Formatter, ObservableValue, Observer, SubscriptionId, UNFORMATTABLE, Validator};
