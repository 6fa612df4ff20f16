//! 协作取消原语：停止令牌、停止源与作用域化的回调登记。
//!
//! # 设计缘起（Why）
//! - 执行协议的取消是协作式的：外部请求停止，操作在安全点响应；
//!   长期挂起的操作（如定时器）还需要在停止请求到达时被主动回调，
//!   才能与“定时器触发”竞争并由取消仲裁决定唯一终态。
//! - “不可停止”必须是编译期事实：当接收方环境静态不含真实令牌时，
//!   所有取消机制（请求检查、回调槽位）都应被单态化消除，不留运行期分支。
//!
//! # 架构定位（Role）
//! - [`StopToken`] 是环境能力协议的一员，经 [`crate::env::Environment::stop_token`]
//!   获取；[`NeverStopToken`] 与 [`SharedStopToken`] 分别承载“静态不可停止”
//!   与“可能停止”两条单态化路径。
//!
//! # 关键逻辑（How）
//! - [`StopSource`] 内部为 `Arc<{原子标志位, 回调登记表}>`：
//!   - `request_stop` 以 CAS 决定唯一首次请求者，胜者在登记表锁外依次
//!     触发全部已登记回调；
//!   - `register` 在持锁检查标志位：若已请求，释放锁后立即触发回调，
//!     封死“先调度、后登记”窗口中的请求丢失。
//! - 登记以 RAII 守卫（[`StopRegistration`]）表达：守卫析构即反登记。
//!
//! # 契约说明（What）
//! - 标志位一旦置位对所有令牌全局可见；重复 `request_stop` 返回 `false`；
//! - 回调至多被触发一次，且可能与反登记并发：反登记不等待在途回调，
//!   完成唯一性由上层取消仲裁（如定时域 `cancel` 的布尔返回）保证。
//!
//! # 取舍与风险（Trade-offs）
//! - 回调以 `Box<dyn FnOnce>` 存放，登记发生堆分配；对于静态不可停止的
//!   路径该代价整体消失，这是“零成本缺省 + 按需付费”的折中；
//! - 触发在登记表锁外进行，回调内再次操作令牌或定时域不会形成锁环。

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
//
// 教案级说明：为了让 Loom 在模型检查阶段能够捕获原子操作的所有调度交错，
// 当启用 `--cfg loom` 时切换到它提供的原子类型；`Arc` 保持标准实现以维持
// 零额外约束，避免破坏 API 契约。
#[cfg(not(any(loom, flint_loom)))]
use core::sync::atomic::{AtomicBool, Ordering};
#[cfg(any(loom, flint_loom))]
use loom::sync::atomic::{AtomicBool, Ordering};

use spin::Mutex;

/// 停止令牌能力：环境可提供的协作取消句柄。
///
/// # 契约说明（What）
/// - [`StopToken::MAY_STOP`]：编译期事实——该令牌类型是否可能发出停止请求；
///   Sender 依据它推导环境相关的完成签名集；
/// - [`StopToken::stop_requested`]：查询是否已有停止请求；对
///   [`NeverStopToken`] 恒为 `false` 且可被常量折叠；
/// - [`StopToken::register`]：登记停止回调，返回 RAII 反登记守卫。
///   若登记时停止已被请求，回调被立即（同步）触发；
/// - 回调可能从请求停止方的执行上下文被调用，因此要求 `Send + 'static`。
pub trait StopToken: Clone + Send + Sync + 'static {
    /// 该令牌类型是否可能发出停止请求（编译期事实）。
    const MAY_STOP: bool;

    /// 反登记守卫类型：析构即撤销登记。
    type Registration: Send;

    /// 查询是否已有停止请求。
    fn stop_requested(&self) -> bool;

    /// 登记停止回调；守卫存活期间回调保持有效。
    fn register<F>(&self, callback: F) -> Self::Registration
    where
        F: FnOnce() + Send + 'static;
}

/// 静态不可停止的令牌：取消机制在此路径上整体编译消除。
///
/// # 设计意图（Why）
/// - 当调用方不提供取消能力时，协议不应为“可能的取消”支付任何代价；
///   本类型将这一事实上移到类型层，`register` 直接丢弃回调并返回零尺寸守卫。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeverStopToken;

/// [`NeverStopToken`] 的零尺寸反登记守卫。
#[derive(Debug, Default)]
pub struct NeverRegistration;

impl StopToken for NeverStopToken {
    const MAY_STOP: bool = false;

    type Registration = NeverRegistration;

    fn stop_requested(&self) -> bool {
        false
    }

    fn register<F>(&self, callback: F) -> NeverRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        drop(callback);
        NeverRegistration
    }
}

type StopCallback = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct CallbackRegistry {
    next_id: u64,
    entries: Vec<(u64, StopCallback)>,
}

struct StopState {
    requested: AtomicBool,
    callbacks: Mutex<CallbackRegistry>,
}

impl core::fmt::Debug for StopState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StopState")
            .field("requested", &self.requested)
            .finish_non_exhaustive()
    }
}

impl StopState {
    fn new() -> Self {
        Self {
            requested: AtomicBool::new(false),
            callbacks: Mutex::new(CallbackRegistry::default()),
        }
    }

    fn stop_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// 首次请求返回 `true`，并负责在锁外触发全部已登记回调。
    fn request_stop(&self) -> bool {
        let first = self
            .requested
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if !first {
            return false;
        }
        // 将登记表整体取出后再触发，回调内的任何再入都不会撞上本锁。
        let drained = {
            let mut registry = self.callbacks.lock();
            core::mem::take(&mut registry.entries)
        };
        for (_, callback) in drained {
            callback();
        }
        true
    }

    fn register(self: &Arc<Self>, callback: StopCallback) -> StopRegistration {
        {
            let mut registry = self.callbacks.lock();
            if !self.stop_requested() {
                let id = registry.next_id;
                registry.next_id += 1;
                registry.entries.push((id, callback));
                return StopRegistration {
                    state: Some(Arc::clone(self)),
                    id,
                };
            }
        }
        // 停止已被请求：登记窗口已关闭，立即同步触发以保证回调不丢失。
        callback();
        StopRegistration { state: None, id: 0 }
    }

    fn deregister(&self, id: u64) {
        let mut registry = self.callbacks.lock();
        registry.entries.retain(|(entry_id, _)| *entry_id != id);
    }
}

/// 停止源：停止请求的发起端，可派生任意多个共享同一状态的令牌。
///
/// # 契约说明（What）
/// - [`StopSource::request_stop`] 首次调用返回 `true` 并触发全部已登记回调；
///   后续调用返回 `false`，提示调用方避免重复执行兜底逻辑；
/// - [`StopSource::token`] 派生的 [`SharedStopToken`] 与源共享同一原子位，
///   克隆成本为一次引用计数操作。
pub struct StopSource {
    state: Arc<StopState>,
}

impl StopSource {
    /// 创建处于“未请求停止”状态的停止源。
    pub fn new() -> Self {
        Self {
            state: Arc::new(StopState::new()),
        }
    }

    /// 派生共享同一停止状态的令牌。
    pub fn token(&self) -> SharedStopToken {
        SharedStopToken {
            state: Arc::clone(&self.state),
        }
    }

    /// 查询当前是否已请求停止。
    pub fn stop_requested(&self) -> bool {
        self.state.stop_requested()
    }

    /// 请求停止；首次请求返回 `true` 并在锁外触发全部已登记回调。
    pub fn request_stop(&self) -> bool {
        self.state.request_stop()
    }
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for StopSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StopSource")
            .field("requested", &self.stop_requested())
            .finish()
    }
}

/// 可能停止的共享令牌：与 [`StopSource`] 共享同一停止状态。
#[derive(Clone)]
pub struct SharedStopToken {
    state: Arc<StopState>,
}

impl StopToken for SharedStopToken {
    const MAY_STOP: bool = true;

    type Registration = StopRegistration;

    fn stop_requested(&self) -> bool {
        self.state.stop_requested()
    }

    fn register<F>(&self, callback: F) -> StopRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        self.state.register(Box::new(callback))
    }
}

impl core::fmt::Debug for SharedStopToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SharedStopToken")
            .field("requested", &self.stop_requested())
            .finish()
    }
}

/// 作用域化的停止回调登记：析构即反登记。
///
/// # 契约说明（What）
/// - 守卫析构从登记表移除对应条目；若回调已被取出（停止已请求），
///   移除为空操作；
/// - 反登记不等待在途回调结束——完成唯一性由上层取消仲裁保证，
///   守卫只负责“不再持有悬垂登记”。
#[derive(Debug)]
#[must_use = "停止回调登记在守卫析构时即被撤销"]
pub struct StopRegistration {
    state: Option<Arc<StopState>>,
    id: u64,
}

impl Drop for StopRegistration {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            state.deregister(self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering as StdOrdering};

    #[test]
    fn request_stop_is_first_come_once() {
        let source = StopSource::new();
        assert!(!source.stop_requested());
        assert!(source.request_stop(), "首次请求必须返回 true");
        assert!(!source.request_stop(), "重复请求必须返回 false");
        assert!(source.token().stop_requested());
    }

    #[test]
    fn registered_callback_fires_on_request() {
        let source = StopSource::new();
        let hits = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&hits);
        let registration = source.token().register(move || {
            observed.fetch_add(1, StdOrdering::SeqCst);
        });
        source.request_stop();
        assert_eq!(hits.load(StdOrdering::SeqCst), 1);
        drop(registration);
        // 再次请求不会重复触发。
        source.request_stop();
        assert_eq!(hits.load(StdOrdering::SeqCst), 1);
    }

    #[test]
    fn late_registration_fires_immediately() {
        let source = StopSource::new();
        source.request_stop();
        let hits = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&hits);
        let _registration = source.token().register(move || {
            observed.fetch_add(1, StdOrdering::SeqCst);
        });
        assert_eq!(hits.load(StdOrdering::SeqCst), 1, "迟到登记应立即触发");
    }

    #[test]
    fn dropped_registration_does_not_fire() {
        let source = StopSource::new();
        let hits = Arc::new(AtomicU32::new(0));
        let observed = Arc::clone(&hits);
        let registration = source.token().register(move || {
            observed.fetch_add(1, StdOrdering::SeqCst);
        });
        drop(registration);
        source.request_stop();
        assert_eq!(hits.load(StdOrdering::SeqCst), 0, "反登记后的回调不得触发");
    }

    #[test]
    fn never_token_is_statically_unstoppable() {
        assert!(!NeverStopToken::MAY_STOP);
        let token = NeverStopToken;
        assert!(!token.stop_requested());
        let _registration = token.register(|| unreachable!("不可停止令牌不得触发回调"));
    }
}
