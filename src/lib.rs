#![deny(clippy::expect_used, clippy::unwrap_used)]

//! 仪器控制面板的响应式模型核心。
//! The reactive model core of a terminal control panel for a lab instrument.
//!
//! 本库只包含模型层：带验证与变更通知的可观察变量、由定时器驱动的
//! 新鲜度状态变量，以及一个可取消的连接生命周期状态机。
//! 界面层（窗口布局、按键绑定、日志初始化、进程入口）是外部协作者，
//! 不属于本库。
//!
//! This library contains only the model layer: observable variables with
//! validation and change notification, a timer-driven freshness state
//! variable, and a cancellable connection lifecycle state machine. The
//! presentation layer (widget layout, key bindings, logging setup, process
//! entry point) is an external collaborator and is not part of this crate.

pub mod config;
pub mod connection;
pub mod error;
pub mod observable;
pub mod session;
