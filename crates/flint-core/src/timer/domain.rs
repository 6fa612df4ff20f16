//! 定时后端契约：注册、触发与撤销的互斥规则。
//!
//! # 设计缘起（Why）
//! - [`TimerScheduler`](super::TimerScheduler) 不关心时间从哪里来：
//!   生产后端挂在硬件或系统时钟上，测试后端由调用方手动推进。
//!   两者共用同一份互斥契约，取消竞态的仲裁才能只写一次。
//!
//! # 契约说明（What）
//! - 每次 [`run_after`](TimerDomain::run_after) 注册一个待触发任务；
//!   同一次注册，`fire` 与“[`cancel`](TimerDomain::cancel) 返回 `true`”
//!   至多发生其一——这是整条取消路径恰好一次完成的根基；
//! - `cancel` 返回 `true` 当且仅当该任务仍在待触发队列中并已被移除，
//!   此时后端承诺不再调用它的 `fire`；返回 `false` 表示任务已触发或
//!   从未注册，调用方不得再走停止分支；
//! - 后端必须在自身队列锁之外调用 `fire`：任务触发时会继续驱动
//!   接收者，可能重入 `run_after` 或 `cancel`。

use alloc::sync::Arc;
use core::time::Duration;

/// 到期后由后端回调的定时任务。
///
/// 实现者自行保证 `fire` 幂等或由后端保证至多调用一次；本 crate 的
/// 后端均保证后者。
pub trait TimerTask: Send + Sync {
    fn fire(&self);
}

/// 定时后端。互斥规则见模块文档。
pub trait TimerDomain: Send + Sync + 'static {
    /// 注册 `task`，在当前时刻起 `delay` 之后触发。
    fn run_after(&self, task: Arc<dyn TimerTask>, delay: Duration);

    /// 尝试撤销仍未触发的 `task`。
    ///
    /// 返回 `true` 表示撤销成功且后端不再触发它；返回 `false` 表示
    /// 任务已触发（或正在触发）。以任务身份而非句柄匹配：同一个
    /// `Arc` 的克隆指向同一次注册。
    fn cancel(&self, task: &Arc<dyn TimerTask>) -> bool;
}
