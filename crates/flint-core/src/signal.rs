//! 完成信号契约：定义终态信号的封闭集合与“完成签名集”。
//!
//! # 设计缘起（Why）
//! - 执行协议要求每个被连接的操作恰好交付一次终态：值、错误或停止。
//!   三种终态构成封闭集合，既作为运行期的诊断名称来源，也作为编译期
//!   推导“某 Sender 在某环境下可能交付哪些终态”的枚举基底。
//! - 将“签名集”落为 `const` 可构造的值类型，使 Sender 能在关联函数中
//!   按接收方环境静态推导自身的完成形状，测试与上层组合器则可直接断言。
//!
//! # 契约说明（What）
//! - [`SignalKind`]：封闭的三元信号种类，携带稳定文本名；
//! - [`SignatureSet`]：信号种类的小集合，声明集必须覆盖实际可交付集。
//!   负载的具体类型由 [`crate::sender::Sender::Value`] /
//!   [`crate::sender::Sender::Error`] 关联类型承载，此处只需三个比特位。
//!
//! # 取舍提示（Trade-offs）
//! - 不引入类型级签名列表：Rust 的关联类型已经表达了负载形状，值级集合
//!   换来更低的接入门槛与可在 `const` 上下文中使用的推导能力。

/// 终态信号的封闭集合。
///
/// # 契约说明（What）
/// - `Value`/`Error` 携带负载，`Stopped` 不携带；
/// - [`SignalKind::name`] 返回协议点的稳定文本名，供观测探针与日志使用；
/// - 集合封闭：本枚举不会增加新变体，调用方可以穷尽匹配。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    /// 正常完成，负载为 Sender 声明的值类型。
    Value,
    /// 错误完成，负载为 Sender 声明的错误类型。
    Error,
    /// 协作取消完成，无负载。
    Stopped,
}

impl SignalKind {
    /// 返回协议点的稳定文本名（`set_value`/`set_error`/`set_stopped`）。
    pub const fn name(self) -> &'static str {
        match self {
            SignalKind::Value => "set_value",
            SignalKind::Error => "set_error",
            SignalKind::Stopped => "set_stopped",
        }
    }
}

/// 完成签名集：描述 Sender 在给定环境下可能交付的终态种类集合。
///
/// # 设计意图（Why）
/// - 原始协议中的“完成签名”可依赖接收方环境（是否可被取消），因此签名
///   推导必须是环境参数化的编译期事实；本类型作为推导结果的载体，
///   以 `const fn` 构造器支持在常量上下文中拼装。
///
/// # 契约说明（What）
/// - **不变量**：Sender 声明的集合必须是它实际可交付集合的超集；
/// - `EMPTY` 起步，通过 `with_*` 逐项并入；`allows` 查询某终态是否被声明；
/// - 实现 `Eq`，测试可直接断言推导结果。
///
/// # 使用示例（How）
/// ```
/// use flint_core::signal::{SignalKind, SignatureSet};
///
/// const SIGS: SignatureSet = SignatureSet::EMPTY.with_value().with_stopped();
/// assert!(SIGS.allows(SignalKind::Value));
/// assert!(!SIGS.allows(SignalKind::Error));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SignatureSet {
    value: bool,
    error: bool,
    stopped: bool,
}

impl SignatureSet {
    /// 空集合：尚未声明任何终态。
    pub const EMPTY: Self = Self {
        value: false,
        error: false,
        stopped: false,
    };

    /// 并入 `value` 终态。
    pub const fn with_value(self) -> Self {
        Self {
            value: true,
            ..self
        }
    }

    /// 并入 `error` 终态。
    pub const fn with_error(self) -> Self {
        Self {
            error: true,
            ..self
        }
    }

    /// 并入 `stopped` 终态。
    pub const fn with_stopped(self) -> Self {
        Self {
            stopped: true,
            ..self
        }
    }

    /// 查询某终态种类是否在声明集内。
    pub const fn allows(self, kind: SignalKind) -> bool {
        match kind {
            SignalKind::Value => self.value,
            SignalKind::Error => self.error,
            SignalKind::Stopped => self.stopped,
        }
    }

    /// 判断 `self` 是否覆盖 `other` 声明的全部终态，用于校验“声明为超集”不变量。
    pub const fn covers(self, other: Self) -> bool {
        (self.value || !other.value)
            && (self.error || !other.error)
            && (self.stopped || !other.stopped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_set_builders_compose() {
        const SIGS: SignatureSet = SignatureSet::EMPTY.with_value().with_stopped();
        assert!(SIGS.allows(SignalKind::Value));
        assert!(SIGS.allows(SignalKind::Stopped));
        assert!(!SIGS.allows(SignalKind::Error));
    }

    #[test]
    fn covers_is_superset_check() {
        let declared = SignatureSet::EMPTY.with_value().with_stopped();
        let delivered = SignatureSet::EMPTY.with_value();
        assert!(declared.covers(delivered));
        assert!(!delivered.covers(declared));
    }

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(SignalKind::Value.name(), "set_value");
        assert_eq!(SignalKind::Error.name(), "set_error");
        assert_eq!(SignalKind::Stopped.name(), "set_stopped");
    }
}
