//! 定义了模型核心的可配置参数。
//! Defines configurable parameters for the model core.

use std::time::Duration;

/// A structure containing all configurable parameters of the model core.
///
/// 包含模型核心所有可配置参数的结构体。
#[derive(Debug, Clone)]
pub struct Config {
    /// The scheme assumed when a raw URL carries no `"://"` separator.
    /// 当原始URL不含 `"://"` 分隔符时采用的默认方案。
    pub default_scheme: String,

    /// The server URL a fresh session starts with.
    /// 新会话初始的服务器URL。
    pub default_server_url: String,

    /// Connection lifecycle parameters.
    /// 连接生命周期相关参数。
    pub connection: ConnectionConfig,
}

/// Connection lifecycle parameters.
///
/// 连接生命周期相关参数。
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long the simulated connect handshake suspends before the
    /// connection is reported established.
    /// 模拟连接握手在连接被报告为已建立之前挂起的时长。
    pub handshake_duration: Duration,

    /// The grace wait after cancelling a connect attempt that was still
    /// registered when a disconnect started.
    /// 断开开始时若仍有连接尝试在注册中，取消它之后的宽限等待时长。
    pub cancel_grace_period: Duration,

    /// How long the simulated link teardown suspends during a disconnect.
    /// 断开期间模拟链路拆除挂起的时长。
    pub teardown_duration: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_scheme: "https".to_string(),
            default_server_url: "localhost:5000".to_string(),
            connection: ConnectionConfig::default(),
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            handshake_duration: Duration::from_secs(5),
            cancel_grace_period: Duration::from_secs(2),
            teardown_duration: Duration::from_secs(1),
        }
    }
}
