//! 教案级测试桩：记录型接收者与观测探针。
//!
//! 单元测试与集成测试共用这组桩件；它们只做记录与断言，不引入
//! 任何时序假设。随 crate 一起发布，便于下游在自己的测试里驱动
//! 协议对象。

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::env::Environment;
use crate::observe::{ExecutionObserver, ProtocolEvent};
use crate::receiver::Receiver;

/// 一次协议完成的记录。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<V, E> {
    Value(V),
    Error(E),
    Stopped,
}

/// 跨线程共享的完成记录单元，核心断言是恰好一次。
pub struct OutcomeCell<V, E> {
    outcomes: Arc<spin::Mutex<Vec<Outcome<V, E>>>>,
}

impl<V, E> OutcomeCell<V, E> {
    pub fn new() -> Self {
        OutcomeCell {
            outcomes: Arc::new(spin::Mutex::new(Vec::new())),
        }
    }

    fn push(&self, outcome: Outcome<V, E>) {
        self.outcomes.lock().push(outcome);
    }

    /// 已记录的完成次数。
    pub fn count(&self) -> usize {
        self.outcomes.lock().len()
    }

    /// 断言恰好一次完成并返回它。
    ///
    /// # Panics
    /// 完成次数不是 1 时 panic，仅用于测试。
    pub fn take_exactly_one(&self) -> Outcome<V, E> {
        let mut outcomes = self.outcomes.lock();
        assert_eq!(outcomes.len(), 1, "operation must complete exactly once");
        outcomes.remove(0)
    }

    /// 尚未完成时返回 `None`，否则返回首个记录的克隆。
    pub fn peek(&self) -> Option<Outcome<V, E>>
    where
        V: Clone,
        E: Clone,
    {
        self.outcomes.lock().first().cloned()
    }
}

impl<V, E> Default for OutcomeCell<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> Clone for OutcomeCell<V, E> {
    fn clone(&self) -> Self {
        OutcomeCell {
            outcomes: self.outcomes.clone(),
        }
    }
}

/// 把三条完成通道写入 [`OutcomeCell`] 的记录型接收者。
pub struct RecordingReceiver<V, E, Env> {
    cell: OutcomeCell<V, E>,
    env: Env,
}

impl<V, E, Env> RecordingReceiver<V, E, Env>
where
    Env: Environment,
{
    pub fn new(cell: OutcomeCell<V, E>, env: Env) -> Self {
        RecordingReceiver { cell, env }
    }
}

impl<V, E, Env> Receiver for RecordingReceiver<V, E, Env>
where
    Env: Environment,
{
    type Value = V;
    type Error = E;
    type Env = Env;

    fn env(&self) -> &Env {
        &self.env
    }

    fn set_value(self, value: V) {
        self.cell.push(Outcome::Value(value));
    }

    fn set_error(self, error: E) {
        self.cell.push(Outcome::Error(error));
    }

    fn set_stopped(self) {
        self.cell.push(Outcome::Stopped);
    }
}

/// 按序记录协议事件的观测探针。
#[derive(Clone)]
pub struct RecordingObserver {
    events: Arc<spin::Mutex<Vec<(ProtocolEvent, &'static str)>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        RecordingObserver {
            events: Arc::new(spin::Mutex::new(Vec::new())),
        }
    }

    /// 到目前为止的事件序列快照。
    pub fn events(&self) -> Vec<(ProtocolEvent, &'static str)> {
        self.events.lock().clone()
    }
}

impl Default for RecordingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_event(&self, event: ProtocolEvent, operation: &'static str) {
        self.events.lock().push((event, operation));
    }
}
