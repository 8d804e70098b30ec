//! 会话模型装配：每个会话一个服务器URL变量与一个连接生命周期。
//! Session model assembly: one server URL variable and one connection
//! lifecycle per session.

use crate::config::Config;
use crate::connection::{ConnectionLifecycle, url};
use crate::error::Result;
use crate::observable::ObservableValue;
use tracing::debug;

/// The per-session model the presentation layer owns: a validated server
/// URL variable and the connection lifecycle sharing the same
/// configuration.
///
/// The URL variable uses the lenient canonicalization policy for
/// validation (a candidate is acceptable when
/// [`try_canonicalize`](url::try_canonicalize) succeeds); the strict
/// policy lives in [`ConnectionLifecycle::set_url`].
///
/// 界面层持有的会话级模型：一个经过验证的服务器URL变量，以及共享同一
/// 配置的连接生命周期。URL变量用宽松的规范化策略做验证（候选值在
/// [`try_canonicalize`](url::try_canonicalize) 成功时可接受）；严格策略
/// 位于 [`ConnectionLifecycle::set_url`]。
pub struct PanelSession {
    /// The server URL as entered; canonicalization happens when the value
    /// is handed to the connection.
    /// 按输入原样保存的服务器URL；交给连接对象时才做规范化。
    pub server_url: ObservableValue<String>,
    /// The connection lifecycle of this session.
    /// 本会话的连接生命周期。
    pub connection: ConnectionLifecycle,
}

impl PanelSession {
    /// Creates a session with default parameters.
    /// 以默认参数创建一个会话。
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Creates a session. Fails only when the configured default server
    /// URL does not pass its own validator.
    /// 创建一个会话。仅当配置的默认服务器URL通不过自身验证器时失败。
    pub fn with_config(config: Config) -> Result<Self> {
        let scheme = config.default_scheme.clone();
        let server_url = ObservableValue::with_validator(
            config.default_server_url.clone(),
            Box::new(move |_, candidate| {
                candidate.is_some_and(|raw| url::try_canonicalize(raw, &scheme).is_some())
            }),
        )?;
        let connection = ConnectionLifecycle::with_config(config);
        debug!(url = %server_url, "initialized panel session");
        Ok(Self { server_url, connection })
    }
}
