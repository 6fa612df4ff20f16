//! flint-core：结构化并发执行协议的契约层。
//!
//! # 设计定位（Why）
//! - 本 crate 规定“发送者 / 接收者 / 操作状态”三方协议的最小契约：
//!   完成信号的词汇表、环境能力的查询面、恰好一次完成与协作式取消
//!   的仲裁规则。组合子与运行时都建立在这层契约之上；
//! - 分发全部走静态类型：完成签名、停止能力都在编译期可见，
//!   不可停止的环境里整条取消路径被类型系统直接裁掉。
//!
//! # 模块地图（What）
//! - [`signal`] / [`observe`]：完成信号词汇表与协议事件探针；
//! - [`stop`] / [`env`]：停止令牌与环境能力查询；
//! - [`receiver`] / [`sender`]：协议三方的契约 trait 与 `start` 入口；
//! - [`just`] / [`result_of`]：即时完成与惰性求值的叶子 Sender；
//! - [`timer`]：定时后端抽象、手动推进后端与定时 Scheduler；
//! - [`test_stubs`]：记录型接收者与观测桩，测试共用。
//!
//! # 使用前提（How）
//! - 默认开启 `std`；关闭后以 `no_std + alloc` 形态工作；
//! - `loom-model` 特性配合 `--cfg loom` 启用并发模型检查。

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]

extern crate alloc;

pub mod env;
pub mod just;
pub mod observe;
pub mod receiver;
pub mod result_of;
pub mod sender;
pub mod signal;
pub mod stop;
pub mod test_stubs;
pub mod timer;

/// 常用导出的一站式入口。
pub mod prelude {
    pub use crate::env::{EmptyEnv, Environment, TokenEnv};
    pub use crate::just::{Just, JustError, JustStopped, just, just_error, just_stopped};
    pub use crate::observe::{ExecutionObserver, NoopObserver, ProtocolEvent};
    pub use crate::receiver::Receiver;
    pub use crate::result_of::{JustErrorResultOf, JustResultOf};
    pub use crate::sender::{MultishotSender, OperationState, Scheduler, Sender, start};
    pub use crate::signal::{SignalKind, SignatureSet};
    pub use crate::stop::{NeverStopToken, SharedStopToken, StopSource, StopToken};
    pub use crate::timer::{ManualTimerDomain, TimerDomain, TimerScheduler, TimerSender, TimerTask};
}
