//! Sender 与操作状态契约：延迟工作的描述、连接与启动。
//!
//! # 设计缘起（Why）
//! - Sender 是“尚未启动的工作”的值级描述：它只携带构造操作所需的参数，
//!   连接（`connect`）到接收方才产生持有全部资源的操作状态，
//!   `start()` 才真正触发执行。三段式分离使组合全部发生在编译期，
//!   无需堆分配或虚分派。
//! - 完成签名可依赖接收方环境（是否可被取消），因此签名推导是以环境
//!   类型参数化的关联函数，而非固定常量。
//!
//! # 契约说明（What）
//! - [`Sender::connect`]：消费 Sender（单发形态）；可重复连接的 Sender
//!   另行实现 [`MultishotSender::connect_ref`]；
//! - [`OperationState::start`]：至多调用一次；实现对二次调用宽容
//!   （内部 `Option` 槽位已空则静默返回），但契约是单次启动；
//! - [`Sender::COMPLETES_SYNCHRONOUSLY`]：声明“总在 `start()` 的动态
//!   范围内同步完成”，调用方可据此假定无悬挂；
//! - [`Sender::completions`]：给定环境类型下的完成签名集声明，
//!   必须覆盖实际可交付集。
//!
//! # 并发与约束（Trade-offs）
//! - `connect` 对接收方要求 `Send + 'static`：终态可能从定时器触发或
//!   停止回调等其他执行上下文交付。同步完成的 Sender 并不需要这一能力，
//!   但统一约束换来协议层面单一的连接界面；
//! - 操作状态由调用方独占持有；本协议的外部回调只引用操作内部的共享
//!   插槽（`Arc`），因此操作状态自身无需地址稳定性约束。

use crate::env::Environment;
use crate::receiver::Receiver;
use crate::signal::SignatureSet;

/// 操作状态：连接产物，持有执行所需的全部资源。
///
/// # 契约说明（What）
/// - **前置条件**：`start` 至多调用一次；
/// - **后置条件**：调用后操作要么已同步交付终态，要么已向外部域登记
///   异步完成；终态交付前调用方不得析构依赖的共享资源。
pub trait OperationState {
    /// 启动操作；同步完成或登记异步完成。
    fn start(&mut self);
}

/// 启动操作状态的自由函数形态，便于泛型代码统一书写。
pub fn start<O>(operation: &mut O)
where
    O: OperationState,
{
    operation.start();
}

/// Sender：未启动工作的值级描述。
///
/// # 实现指引（How）
/// - `Value`/`Error` 声明负载形状，与接收方的关联类型在 `connect`
///   处以相等约束对齐——不兼容的连接无法通过编译；
/// - `completions::<E>()` 按环境推导签名集：例如定时器 Sender 仅在
///   环境令牌可能停止时声明 `stopped`；
/// - 单发 Sender 只实现本 Trait；可多发的 Sender 追加实现
///   [`MultishotSender`]。
pub trait Sender: Sized {
    /// `value` 终态的负载类型。
    type Value;
    /// `error` 终态的负载类型。
    type Error;

    /// 是否总在 `start()` 的动态范围内同步完成。
    const COMPLETES_SYNCHRONOUSLY: bool = false;

    /// 连接产物类型。
    type Operation<R>: OperationState
    where
        R: Receiver<Value = Self::Value, Error = Self::Error> + Send + 'static;

    /// 给定环境类型下声明的完成签名集（实际可交付集的超集）。
    fn completions<E>() -> SignatureSet
    where
        E: Environment;

    /// 消费 Sender，连接接收方并返回操作状态（单发形态）。
    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Value = Self::Value, Error = Self::Error> + Send + 'static;
}

/// 可多发的 Sender：可被重复连接到相互独立的接收方。
///
/// # 契约说明（What）
/// - `connect_ref` 不消费 Sender，各次连接互不共享可变状态；
/// - 实现条件通常是捕获状态可克隆（对应原始协议“可拷贝则可多发”）。
pub trait MultishotSender: Sender {
    /// 以共享引用连接接收方，Sender 可继续复用。
    fn connect_ref<R>(&self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Value = Self::Value, Error = Self::Error> + Send + 'static;
}

/// 调度器：产出完成于特定执行语境的 Sender 的工厂。
///
/// # 契约说明（What）
/// - `schedule()` 返回的 Sender 每次连接均独立；
/// - 调度器是普通可比较的描述符（`Clone + PartialEq`），下游组合可据
///   相等性判断“完成语境相同”而无需重新推导。
pub trait Scheduler: Clone + PartialEq {
    /// 该调度器产出的 Sender 类型。
    type Sender: Sender;

    /// 产出一个新的 Sender。
    fn schedule(&self) -> Self::Sender;
}
