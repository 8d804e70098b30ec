//! 定义了连接生命周期状态机 `ConnectionLifecycle`。
//! Defines the connection lifecycle state machine, `ConnectionLifecycle`.

use super::url;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::observable::SubscriptionId;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::time;
use tracing::{debug, error, info};

/// The status of a connection.
/// 连接的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Error-only status; never entered by normal operation.
    /// 仅用于错误场景的状态；正常操作绝不会进入。
    Undefined,
    /// No link is up. Initial status, and the terminal status of each cycle.
    /// 没有链路。初始状态，也是每个周期的终止状态。
    Disconnected,
    /// The link is established.
    /// 链路已建立。
    Connected,
    /// A disconnect is in progress.
    /// 正在断开。
    Disconnecting,
    /// A connect attempt is in progress.
    /// 正在进行连接尝试。
    Connecting,
    /// Transient status published while a cancellation is resolved.
    /// 在取消被裁决期间发布的瞬态状态。
    Cancelling,
}

/// A status observer invoked with the new and the old status. The lifecycle
/// handle is cheaply cloneable; a callback that needs the source can
/// capture a clone instead.
/// 以新旧状态为参数调用的状态观察者。生命周期句柄可以廉价克隆；需要
/// 源对象的回调可以捕获一个克隆。
pub type StatusObserver = Box<dyn Fn(ConnectionStatus, ConnectionStatus) + Send + Sync>;

struct LifecycleInner {
    url: Option<String>,
    status: ConnectionStatus,
    /// In-flight connect handle; dropping the sender is the cancellation
    /// signal observed by the suspended connect.
    /// 在途连接句柄；丢弃发送端就是挂起的连接所观察到的取消信号。
    connect_op: Option<oneshot::Sender<()>>,
    /// In-flight disconnect handle, same convention.
    /// 在途断开句柄，约定相同。
    disconnect_op: Option<oneshot::Sender<()>>,
    status_observers: Vec<(SubscriptionId, StatusObserver)>,
    next_subscription: u64,
    config: Config,
}

impl LifecycleInner {
    /// Stores the new status and synchronously dispatches every observer.
    /// 存储新状态并同步分发给每个观察者。
    fn set_status(&mut self, new_status: ConnectionStatus) {
        let old_status = std::mem::replace(&mut self.status, new_status);
        debug!(?old_status, ?new_status, "connection status changed");
        for (_, observer) in &self.status_observers {
            observer(new_status, old_status);
        }
    }

    fn is_connected(&self) -> bool {
        matches!(
            self.status,
            ConnectionStatus::Connected | ConnectionStatus::Disconnecting
        )
    }
}

/// A state machine modelling a cancellable connect/disconnect lifecycle
/// against a canonicalized server URL.
///
/// At most one connect and one disconnect operation are in flight at any
/// time; a second concurrent request of the same kind is rejected rather
/// than queued. The simulated waits are taken from
/// [`ConnectionConfig`](crate::config::ConnectionConfig).
///
/// This is a cloneable handle; clones share the same underlying state.
/// Status observers are dispatched with the internal lock held and must not
/// reentrantly mutate the same handle. Destruction does not tear the link
/// down; a best-effort `disconnect` or `cancel` is the owning session's
/// responsibility.
///
/// 针对已规范化服务器URL的可取消连接/断开生命周期状态机。任意时刻至多
/// 有一个连接与一个断开操作在途；同类的第二个并发请求会被拒绝而不是
/// 排队。模拟等待时长取自
/// [`ConnectionConfig`](crate::config::ConnectionConfig)。
///
/// 这是一个可克隆的句柄；克隆共享同一份底层状态。状态观察者在持有
/// 内部锁的情况下被分发，不得重入地变更同一个句柄。析构不会拆除链路；
/// 尽力而为的 `disconnect` 或 `cancel` 是所属会话的责任。
pub struct ConnectionLifecycle {
    inner: Arc<Mutex<LifecycleInner>>,
}

impl Clone for ConnectionLifecycle {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl Default for ConnectionLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionLifecycle {
    /// Creates a disconnected lifecycle with no URL and default parameters.
    /// 创建一个未连接、无URL、使用默认参数的生命周期。
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a disconnected lifecycle with no URL.
    /// 创建一个未连接且无URL的生命周期。
    pub fn with_config(config: Config) -> Self {
        debug!("initialized connection lifecycle");
        Self {
            inner: Arc::new(Mutex::new(LifecycleInner {
                url: None,
                status: ConnectionStatus::Disconnected,
                connect_op: None,
                disconnect_op: None,
                status_observers: Vec::new(),
                next_subscription: 0,
                config,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Canonicalizes and stores the server URL. Uses the strict policy:
    /// malformed input fails with [`Error::InvalidUrl`] and the stored URL
    /// is left unchanged. Never touches the status.
    /// 规范化并存储服务器URL。采用严格策略：畸形输入以
    /// [`Error::InvalidUrl`] 失败且已存储的URL保持不变。绝不触碰状态。
    pub fn set_url(&self, raw: &str) -> Result<()> {
        let mut inner = self.lock();
        let canonical = url::canonicalize(raw, &inner.config.default_scheme)?;
        debug!(%canonical, "server url updated");
        inner.url = Some(canonical);
        Ok(())
    }

    /// Returns the canonical server URL, when one has been set.
    /// 返回已设置的规范服务器URL。
    pub fn url(&self) -> Option<String> {
        self.lock().url.clone()
    }

    /// Returns the current status.
    /// 返回当前状态。
    pub fn status(&self) -> ConnectionStatus {
        self.lock().status
    }

    /// Whether the link is up (including a disconnect in progress, during
    /// which the link has not actually been torn down yet).
    /// 链路是否在线（包括正在断开期间，此时链路实际上尚未被拆除）。
    pub fn connected(&self) -> bool {
        self.lock().is_connected()
    }

    /// Whether a connect attempt is in progress.
    /// 是否有连接尝试在进行中。
    pub fn connecting(&self) -> bool {
        self.lock().status == ConnectionStatus::Connecting
    }

    /// Registers a status observer and returns its subscription handle.
    /// 注册一个状态观察者并返回其订阅句柄。
    pub fn subscribe_status(&self, observer: StatusObserver) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId::from_raw(inner.next_subscription);
        inner.next_subscription += 1;
        inner.status_observers.push((id, observer));
        id
    }

    /// Removes a status observer registration. Returns `false` when the
    /// handle is unknown.
    /// 移除一次状态观察者注册。句柄未知时返回 `false`。
    pub fn unsubscribe_status(&self, id: SubscriptionId) -> bool {
        let mut inner = self.lock();
        let before = inner.status_observers.len();
        inner.status_observers.retain(|(known, _)| *known != id);
        inner.status_observers.len() != before
    }

    /// Starts a connect attempt and suspends on the simulated handshake.
    ///
    /// Precondition violations are reported synchronously: no URL fails
    /// with [`Error::UrlNotSet`] (reverting the status to `Disconnected`),
    /// an attempt already in flight fails with [`Error::ConnectInFlight`]
    /// (the status stays `Connecting`, owned by the first attempt).
    ///
    /// Asynchronous outcomes travel through the return value, never as an
    /// error: `Ok(true)` when the handshake completes and the status
    /// reaches `Connected`, `Ok(false)` when the attempt is cancelled while
    /// in flight and the status falls back to `Disconnected`.
    ///
    /// 启动一次连接尝试并挂起在模拟握手上。前置条件违例同步报告：无URL
    /// 以 [`Error::UrlNotSet`] 失败（状态回退为 `Disconnected`）；已有
    /// 尝试在途则以 [`Error::ConnectInFlight`] 失败（状态保持
    /// `Connecting`，归第一次尝试所有）。异步结果通过返回值传递，绝不
    /// 作为错误：握手完成且状态到达 `Connected` 时为 `Ok(true)`；在途
    /// 中被取消、状态落回 `Disconnected` 时为 `Ok(false)`。
    pub async fn connect(&self) -> Result<bool> {
        let (handshake, cancelled) = {
            let mut inner = self.lock();
            info!(url = ?inner.url, "connecting to server");
            inner.set_status(ConnectionStatus::Connecting);

            if inner.url.is_none() {
                inner.set_status(ConnectionStatus::Disconnected);
                error!("could not initiate connection: url is not set");
                return Err(Error::UrlNotSet);
            }
            if inner.connect_op.is_some() {
                error!("connection attempt already in flight");
                return Err(Error::ConnectInFlight);
            }

            let (cancel_tx, cancel_rx) = oneshot::channel();
            inner.connect_op = Some(cancel_tx);
            (inner.config.connection.handshake_duration, cancel_rx)
        };

        tokio::select! {
            _ = time::sleep(handshake) => {
                let mut inner = self.lock();
                info!("connection established");
                inner.connect_op = None;
                inner.set_status(ConnectionStatus::Connected);
                Ok(true)
            }
            _ = cancelled => {
                let mut inner = self.lock();
                info!("connection cancelled during the handshake");
                inner.connect_op = None;
                // cancel() usually resolved the status already; a lingering
                // connect cancelled by a disconnect lands here too.
                // 通常 cancel() 已经裁决了状态；被断开取消的滞留连接也会
                // 走到这里。
                if inner.status != ConnectionStatus::Disconnected {
                    inner.set_status(ConnectionStatus::Disconnected);
                }
                Ok(false)
            }
        }
    }

    /// Tears the link down after the simulated teardown wait.
    ///
    /// A no-op unless the link is up (`Connected` or `Disconnecting`);
    /// fails with [`Error::DisconnectInFlight`] when a disconnect is
    /// already registered. A connect attempt still registered when the
    /// disconnect is admitted is cancelled first, followed by a grace wait.
    /// A cancellation observed during either wait returns `Ok(())`
    /// immediately: the canceller has already restored `Connected` and
    /// cleared the handle.
    ///
    /// 在模拟拆除等待之后拆除链路。链路不在线（`Connected` 或
    /// `Disconnecting`）时是空操作；断开已注册时以
    /// [`Error::DisconnectInFlight`] 失败。断开被接纳时若仍有连接尝试在
    /// 注册中，先取消它并经过一段宽限等待。任一等待期间观察到取消信号
    /// 则立即返回 `Ok(())`：取消方已经把状态恢复为 `Connected` 并清除了
    /// 句柄。
    pub async fn disconnect(&self) -> Result<()> {
        let (grace, teardown, mut cancelled) = {
            let mut inner = self.lock();
            if !inner.is_connected() {
                return Ok(());
            }
            inner.set_status(ConnectionStatus::Disconnecting);

            if inner.disconnect_op.is_some() {
                error!("disconnect already in flight");
                return Err(Error::DisconnectInFlight);
            }
            info!(url = ?inner.url, "disconnecting from server");

            let (cancel_tx, cancel_rx) = oneshot::channel();
            inner.disconnect_op = Some(cancel_tx);
            let timing = &inner.config.connection;
            (timing.cancel_grace_period, timing.teardown_duration, cancel_rx)
        };

        // A lingering connect attempt is cancelled before the link itself
        // is torn down.
        // 在链路本身被拆除之前，先取消滞留的连接尝试。
        let lingering_connect = self.lock().connect_op.take().is_some();
        if lingering_connect {
            tokio::select! {
                _ = time::sleep(grace) => {}
                _ = &mut cancelled => return Ok(()),
            }
        }

        tokio::select! {
            _ = time::sleep(teardown) => {
                let mut inner = self.lock();
                info!("disconnected");
                inner.disconnect_op = None;
                inner.set_status(ConnectionStatus::Disconnected);
                Ok(())
            }
            _ = &mut cancelled => Ok(()),
        }
    }

    /// Synchronously cancels the in-flight operation, if any.
    ///
    /// Publishes the transient `Cancelling` status first. A cancelled
    /// connect resolves to `Disconnected`; a cancelled disconnect resolves
    /// to `Connected`, since the simulated link was never actually torn
    /// down. With nothing in flight the status falls back to its pre-cancel
    /// value instead of sticking in `Cancelling`.
    ///
    /// 同步取消在途操作（如有）。先发布瞬态的 `Cancelling` 状态。被取消
    /// 的连接裁决为 `Disconnected`；被取消的断开裁决为 `Connected`，因为
    /// 模拟链路实际上从未被拆除。没有在途操作时，状态回落到取消前的值，
    /// 而不是滞留在 `Cancelling`。
    pub fn cancel(&self) {
        let mut inner = self.lock();
        info!("cancelling connection requested");
        let prior = inner.status;
        inner.set_status(ConnectionStatus::Cancelling);

        if inner.connect_op.take().is_some() {
            inner.set_status(ConnectionStatus::Disconnected);
        } else if inner.disconnect_op.take().is_some() {
            inner.set_status(ConnectionStatus::Connected);
        } else {
            inner.set_status(prior);
        }
    }
}

impl fmt::Debug for ConnectionLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("ConnectionLifecycle")
            .field("url", &inner.url)
            .field("status", &inner.status)
            .field("connect_in_flight", &inner.connect_op.is_some())
            .field("disconnect_in_flight", &inner.disconnect_op.is_some())
            .field("observer_count", &inner.status_observers.len())
            .finish()
    }
}
