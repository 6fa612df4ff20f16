//! 定时调度：后端抽象、手动推进的测试后端与定时 Scheduler。
//!
//! # 分层说明（What）
//! - [`domain`]：后端契约 [`TimerDomain`] / [`TimerTask`]，约定注册、
//!   触发与撤销之间的互斥规则；
//! - [`manual`]：[`ManualTimerDomain`]，以虚拟时间手动推进的确定性后端；
//! - [`scheduler`]：面向协议的 [`TimerScheduler`]，把延时完成与协作式
//!   取消接到任意后端之上。

pub mod domain;
pub mod manual;
pub mod scheduler;

pub use domain::{TimerDomain, TimerTask};
pub use manual::ManualTimerDomain;
pub use scheduler::{TimerOperation, TimerScheduler, TimerSender};
