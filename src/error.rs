//! 定义了库中所有可能的错误类型。
//! Defines all possible error types in the library.

use thiserror::Error;

/// The primary error type for the panel model core.
/// 面板模型核心的主要错误类型。
#[derive(Debug, Error)]
pub enum Error {
    /// A candidate value was rejected by an explicit validator. No mutation
    /// took place; the caller may retry with a different value.
    /// 候选值被显式验证器拒绝。状态未发生变化，调用者可以换一个值重试。
    #[error("validation failed for value \"{0}\"")]
    Validation(String),

    /// A raw URL could not be reduced to a canonical `scheme://host[/path]`
    /// form.
    /// 原始URL无法规约为规范的 `scheme://host[/path]` 形式。
    #[error("malformed url \"{0}\"")]
    InvalidUrl(String),

    /// A connection was requested before a server URL was set.
    /// 在设置服务器URL之前请求了连接。
    #[error("could not initiate connection: url is not set")]
    UrlNotSet,

    /// A connection attempt is already in flight; it must complete, be
    /// cancelled, or be torn down before another one is admitted.
    /// 已有一个连接尝试在进行中。必须等它完成、被取消或被断开后
    /// 才能接纳下一个。
    #[error("a connection attempt is already in flight")]
    ConnectInFlight,

    /// A disconnect is already in flight.
    /// 已有一个断开操作在进行中。
    #[error("a disconnect is already in flight")]
    DisconnectInFlight,
}

/// A specialized `Result` type for this library.
/// 本库专用的 `Result` 类型。
pub type Result<T> = std::result::Result<T, Error>;
