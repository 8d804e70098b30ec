//! 连接模块 - 针对已验证URL的可取消连接生命周期
//! Connection module - a cancellable connection lifecycle against a
//! validated URL
//!
//! `url` 提供规范化（严格与宽松两种策略），`lifecycle` 实现
//! 连接/断开/取消状态机。没有真实的网络I/O：参考行为把连接与断开
//! 建模为固定时长的模拟等待。
//!
//! `url` provides canonicalization (strict and lenient policies),
//! `lifecycle` implements the connect/disconnect/cancel state machine.
//! There is no real network I/O: the reference behavior models connect and
//! disconnect as fixed-duration simulated waits.

pub mod lifecycle;
pub mod url;

#[cfg(test)]
mod tests;

pub use lifecycle::{ConnectionLifecycle, ConnectionStatus, StatusObserver};
