//! 执行观测外观：在协议点发出纯旁路的调试信号。
//!
//! # 设计缘起（Why）
//! - 调试与一致性验证需要观察“操作经过了哪些协议点”（启动、各终态交付），
//!   但观测绝不能反向影响完成语义；因此以被动观察者接口建模，
//!   由接收方环境注入，缺省实现为零尺寸空操作。
//! - 与核心其余部分一致，本模块不绑定任何日志后端：在 `no_std + alloc`
//!   轨道上自带外观接口，宿主可将其桥接到自己的观测体系。
//!
//! # 契约说明（What）
//! - [`ProtocolEvent`]：协议点的枚举（启动与三种终态）；
//! - [`ExecutionObserver::on_event`]：在协议点被调用，携带事件种类与
//!   操作的静态名称；实现必须无副作用于完成交付，且不得 panic；
//! - [`NoopObserver`]：缺省零开销实现，观测缺席是编译期事实。
//!
//! # 风险提示（Trade-offs）
//! - 接口刻意不传递负载本身：负载可能不可克隆或代价高昂，观测点只报告
//!   “发生了什么”，不报告“值是什么”。

use crate::signal::SignalKind;

/// 协议点事件：操作生命周期中观测探针可见的全部时刻。
///
/// # 契约说明（What）
/// - `Start` 在 `start()` 进入时发出；三个 `Set*` 事件在对应终态交付前发出；
/// - 每个被连接的操作恰好观测到一次 `Start` 与一次终态事件。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProtocolEvent {
    /// 操作开始执行。
    Start,
    /// 即将交付 `value` 终态。
    SetValue,
    /// 即将交付 `error` 终态。
    SetError,
    /// 即将交付 `stopped` 终态。
    SetStopped,
}

impl ProtocolEvent {
    /// 由终态信号种类得到对应的协议点事件。
    pub const fn of(kind: SignalKind) -> Self {
        match kind {
            SignalKind::Value => ProtocolEvent::SetValue,
            SignalKind::Error => ProtocolEvent::SetError,
            SignalKind::Stopped => ProtocolEvent::SetStopped,
        }
    }

    /// 返回事件的稳定文本名，与原始协议的信号名保持一致。
    pub const fn name(self) -> &'static str {
        match self {
            ProtocolEvent::Start => "start",
            ProtocolEvent::SetValue => "set_value",
            ProtocolEvent::SetError => "set_error",
            ProtocolEvent::SetStopped => "set_stopped",
        }
    }
}

/// 执行观测者：协议点的被动访客。
///
/// # 设计意图（Why）
/// - 以环境能力的形式注入（参见 [`crate::env::Environment::observer`]），
///   使观测配置随接收方传播而无需全局状态；
/// - 缺省 [`NoopObserver`] 保证未启用观测时完全零开销。
///
/// # 契约说明（What）
/// - **前置条件**：`operation` 为操作类别的静态名称（如 `"time_scheduler"`）；
/// - **后置条件**：调用不得改变完成交付的时机、次序或内容，也不得 panic；
/// - 观测者可能从定时器触发或停止回调等非注册上下文被调用，实现需自行
///   保证内部状态的线程安全。
pub trait ExecutionObserver {
    /// 在协议点被调用，报告事件种类与操作名称。
    fn on_event(&self, event: ProtocolEvent, operation: &'static str);
}

/// 空观测者：所有协议点均为空操作。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {
    fn on_event(&self, _event: ProtocolEvent, _operation: &'static str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_match_protocol_points() {
        assert_eq!(ProtocolEvent::Start.name(), "start");
        assert_eq!(ProtocolEvent::of(SignalKind::Stopped), ProtocolEvent::SetStopped);
        assert_eq!(ProtocolEvent::of(SignalKind::Value).name(), "set_value");
    }
}
