//! 手动推进虚拟时间的确定性定时后端。
//!
//! # 设计缘起（Why）
//! - 定时语义的测试不应依赖真实时钟：虚拟时间把“等待”变成显式的
//!   [`advance`](ManualTimerDomain::advance) 调用，到期顺序、取消竞态
//!   都可以在单线程里精确复现。
//!
//! # 实现要点（How）
//! - 全部状态收在一把 [`spin::Mutex`] 之后；`advance` 先在锁内摘出
//!   到期条目并按（截止时刻，注册序号）排序，再在锁外逐个 `fire`，
//!   满足 [`TimerDomain`](super::TimerDomain) 的锁外触发契约；
//! - 任务身份用 `Arc` 数据指针（抹去 vtable 后的地址）匹配，
//!   [`cancel`](ManualTimerDomain::cancel) 与注册条目据此对账；
//! - `fire` 过程中重入注册的任务若仍在本次推进的目标时刻之内，
//!   会在同一次 `advance` 的后续轮次触发。

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::mem;
use core::time::Duration;

use super::domain::{TimerDomain, TimerTask};

/// 待触发条目。`order` 是全局注册序号，保证同刻到期的触发顺序
/// 与注册顺序一致。
struct ManualEntry {
    key: usize,
    task: Arc<dyn TimerTask>,
    deadline: Duration,
    order: u64,
}

struct ManualState {
    now: Duration,
    sequence: u64,
    entries: Vec<ManualEntry>,
    run_after_calls: u64,
    fired: u64,
}

/// 手动推进的定时后端，虚拟时间从 `Duration::ZERO` 起算。
pub struct ManualTimerDomain {
    state: spin::Mutex<ManualState>,
}

impl ManualTimerDomain {
    pub fn new() -> Self {
        ManualTimerDomain {
            state: spin::Mutex::new(ManualState {
                now: Duration::ZERO,
                sequence: 0,
                entries: Vec::new(),
                run_after_calls: 0,
                fired: 0,
            }),
        }
    }

    /// 当前虚拟时刻。
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// 仍在等待触发的条目数。
    pub fn pending(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// 历史注册总次数，用于断言“提前停止路径从不触碰后端”。
    pub fn run_after_calls(&self) -> u64 {
        self.state.lock().run_after_calls
    }

    /// 历史触发总次数。
    pub fn fired(&self) -> u64 {
        self.state.lock().fired
    }

    /// 把虚拟时间向前推进 `delta`，按序触发期间到期的全部任务。
    ///
    /// 触发发生在锁外；任务重入注册且截止不超过推进目标时，
    /// 在本次调用内继续触发。
    pub fn advance(&self, delta: Duration) {
        let target = {
            let mut state = self.state.lock();
            let target = state.now.saturating_add(delta);
            state.now = target;
            target
        };
        loop {
            let due = {
                let mut state = self.state.lock();
                let mut due = Vec::new();
                let mut waiting = Vec::new();
                for entry in mem::take(&mut state.entries) {
                    if entry.deadline <= target {
                        due.push(entry);
                    } else {
                        waiting.push(entry);
                    }
                }
                state.entries = waiting;
                due.sort_by_key(|entry| (entry.deadline, entry.order));
                state.fired += due.len() as u64;
                due
            };
            if due.is_empty() {
                break;
            }
            for entry in due {
                entry.task.fire();
            }
        }
    }
}

impl Default for ManualTimerDomain {
    fn default() -> Self {
        Self::new()
    }
}

/// 抹去 vtable 的数据指针地址，作为注册条目的身份键。
fn identity(task: &Arc<dyn TimerTask>) -> usize {
    Arc::as_ptr(task).cast::<()>() as usize
}

impl TimerDomain for ManualTimerDomain {
    fn run_after(&self, task: Arc<dyn TimerTask>, delay: Duration) {
        let mut state = self.state.lock();
        let key = identity(&task);
        let deadline = state.now.saturating_add(delay);
        let order = state.sequence;
        state.sequence += 1;
        state.run_after_calls += 1;
        state.entries.push(ManualEntry {
            key,
            task,
            deadline,
            order,
        });
    }

    fn cancel(&self, task: &Arc<dyn TimerTask>) -> bool {
        let key = identity(task);
        let mut state = self.state.lock();
        match state.entries.iter().position(|entry| entry.key == key) {
            Some(index) => {
                state.entries.swap_remove(index);
                true
            }
            None => false,
        }
    }
}
