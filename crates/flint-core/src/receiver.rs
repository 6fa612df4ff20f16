//! 接收方契约：终态的唯一消费者。
//!
//! # 设计缘起（Why）
//! - 执行协议的核心不变量是“恰好一次完成”：每个被连接的操作最终调用
//!   接收方三个终态方法中的恰好一个，且恰好一次。Rust 的所有权系统
//!   直接承载这一不变量——终态方法按值消费接收方，完成之后接收方
//!   在类型层面已不复存在，双重完成无法通过编译。
//! - Sender 与接收方的兼容性（负载形状匹配）以关联类型相等约束表达，
//!   连接不兼容的一对在 `connect` 处编译失败，对应“协议违例在
//!   构造期拒绝”的要求。
//!
//! # 契约说明（What）
//! - [`Receiver::Value`] / [`Receiver::Error`]：可接受的值/错误负载类型；
//!   多元负载以元组表达，无负载以 `()` 表达；
//! - [`Receiver::Env`]：随身环境，操作经 [`Receiver::env`] 查询能力；
//! - 三个终态方法消费 `self`，由框架保证恰好调用一次。
//!
//! # 风险提示（Trade-offs）
//! - 终态可能从与 `start()` 不同的执行上下文交付（定时器触发、停止回调），
//!   因此凡参与异步完成的接收方都要求 `Send + 'static`（约束施加在
//!   [`crate::sender::Sender::connect`] 上，而非本 Trait）。

use crate::env::Environment;

/// 终态的唯一消费者：恰好一次地接收值、错误或停止信号。
///
/// # 实现指引（How）
/// - 典型实现持有一个延续（如记录单元、唤醒句柄或父操作的入口），
///   在终态方法中消费它；
/// - [`Receiver::env`] 在操作存续期间可被多次调用，必须稳定返回同一环境。
pub trait Receiver: Sized {
    /// `value` 终态的负载类型（多元负载为元组，无负载为 `()`）。
    type Value;
    /// `error` 终态的负载类型。
    type Error;
    /// 随身环境类型。
    type Env: Environment;

    /// 访问接收方环境。
    fn env(&self) -> &Self::Env;

    /// 交付 `value` 终态并消费接收方。
    fn set_value(self, value: Self::Value);

    /// 交付 `error` 终态并消费接收方。
    fn set_error(self, error: Self::Error);

    /// 交付 `stopped` 终态并消费接收方。
    fn set_stopped(self);
}
