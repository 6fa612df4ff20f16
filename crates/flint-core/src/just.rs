//! 即时完成的 Sender 工厂：`just` / `just_error` / `just_stopped`。
//!
//! # 设计缘起（Why）
//! - 组合执行图需要“叶子”：携带现成负载、启动即同步完成的 Sender。
//!   三种终态各有一个工厂，负载在构造时捕获、在 `start()` 时原样交付，
//!   不经任何解释或包装。
//!
//! # 契约说明（What）
//! - 三者均声明恰好一个完成签名，且 `COMPLETES_SYNCHRONOUSLY = true`；
//! - 负载可克隆时 Sender 可多发（`connect_ref` 克隆负载），
//!   否则仅可单发（`connect` 消费负载）；
//! - 观测探针依次看到 `start` 与对应终态事件。

use core::convert::Infallible;

use crate::env::Environment;
use crate::observe::{ExecutionObserver, ProtocolEvent};
use crate::receiver::Receiver;
use crate::sender::{MultishotSender, OperationState, Sender};
use crate::signal::SignatureSet;

/// 构造启动即交付 `value(values)` 的 Sender。
///
/// # 使用说明（How）
/// - 多元负载以元组传入：`just((1, "x"))` 交付 `value((1, "x"))`；
/// - 无负载场景传入 `()`。
pub fn just<V>(values: V) -> Just<V> {
    Just { values }
}

/// 构造启动即交付 `error(error)` 的 Sender。
pub fn just_error<E>(error: E) -> JustError<E> {
    JustError { error }
}

/// 构造启动即交付 `stopped` 的 Sender。
pub fn just_stopped() -> JustStopped {
    JustStopped
}

/// `value` 终态的即时 Sender，见 [`just`]。
#[derive(Clone, Copy, Debug)]
pub struct Just<V> {
    values: V,
}

impl<V> Sender for Just<V> {
    type Value = V;
    type Error = Infallible;

    const COMPLETES_SYNCHRONOUSLY: bool = true;

    type Operation<R>
        = JustOperation<V, R>
    where
        R: Receiver<Value = V, Error = Infallible> + Send + 'static;

    fn completions<E>() -> SignatureSet
    where
        E: Environment,
    {
        SignatureSet::EMPTY.with_value()
    }

    fn connect<R>(self, receiver: R) -> JustOperation<V, R>
    where
        R: Receiver<Value = V, Error = Infallible> + Send + 'static,
    {
        JustOperation {
            values: Some(self.values),
            receiver: Some(receiver),
        }
    }
}

impl<V> MultishotSender for Just<V>
where
    V: Clone,
{
    fn connect_ref<R>(&self, receiver: R) -> JustOperation<V, R>
    where
        R: Receiver<Value = V, Error = Infallible> + Send + 'static,
    {
        JustOperation {
            values: Some(self.values.clone()),
            receiver: Some(receiver),
        }
    }
}

/// [`Just`] 的操作状态：启动即同步交付 `value`。
#[derive(Debug)]
pub struct JustOperation<V, R> {
    values: Option<V>,
    receiver: Option<R>,
}

impl<V, R> OperationState for JustOperation<V, R>
where
    R: Receiver<Value = V>,
{
    fn start(&mut self) {
        let (Some(values), Some(receiver)) = (self.values.take(), self.receiver.take()) else {
            return;
        };
        receiver.env().observer().on_event(ProtocolEvent::Start, "just");
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::SetValue, "just");
        receiver.set_value(values);
    }
}

/// `error` 终态的即时 Sender，见 [`just_error`]。
#[derive(Clone, Copy, Debug)]
pub struct JustError<E> {
    error: E,
}

impl<E> Sender for JustError<E> {
    type Value = Infallible;
    type Error = E;

    const COMPLETES_SYNCHRONOUSLY: bool = true;

    type Operation<R>
        = JustErrorOperation<E, R>
    where
        R: Receiver<Value = Infallible, Error = E> + Send + 'static;

    fn completions<Env>() -> SignatureSet
    where
        Env: Environment,
    {
        SignatureSet::EMPTY.with_error()
    }

    fn connect<R>(self, receiver: R) -> JustErrorOperation<E, R>
    where
        R: Receiver<Value = Infallible, Error = E> + Send + 'static,
    {
        JustErrorOperation {
            error: Some(self.error),
            receiver: Some(receiver),
        }
    }
}

impl<E> MultishotSender for JustError<E>
where
    E: Clone,
{
    fn connect_ref<R>(&self, receiver: R) -> JustErrorOperation<E, R>
    where
        R: Receiver<Value = Infallible, Error = E> + Send + 'static,
    {
        JustErrorOperation {
            error: Some(self.error.clone()),
            receiver: Some(receiver),
        }
    }
}

/// [`JustError`] 的操作状态：启动即同步交付 `error`。
#[derive(Debug)]
pub struct JustErrorOperation<E, R> {
    error: Option<E>,
    receiver: Option<R>,
}

impl<E, R> OperationState for JustErrorOperation<E, R>
where
    R: Receiver<Error = E>,
{
    fn start(&mut self) {
        let (Some(error), Some(receiver)) = (self.error.take(), self.receiver.take()) else {
            return;
        };
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::Start, "just_error");
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::SetError, "just_error");
        receiver.set_error(error);
    }
}

/// `stopped` 终态的即时 Sender，见 [`just_stopped`]。
#[derive(Clone, Copy, Debug, Default)]
pub struct JustStopped;

impl Sender for JustStopped {
    type Value = Infallible;
    type Error = Infallible;

    const COMPLETES_SYNCHRONOUSLY: bool = true;

    type Operation<R>
        = JustStoppedOperation<R>
    where
        R: Receiver<Value = Infallible, Error = Infallible> + Send + 'static;

    fn completions<E>() -> SignatureSet
    where
        E: Environment,
    {
        SignatureSet::EMPTY.with_stopped()
    }

    fn connect<R>(self, receiver: R) -> JustStoppedOperation<R>
    where
        R: Receiver<Value = Infallible, Error = Infallible> + Send + 'static,
    {
        JustStoppedOperation {
            receiver: Some(receiver),
        }
    }
}

impl MultishotSender for JustStopped {
    fn connect_ref<R>(&self, receiver: R) -> JustStoppedOperation<R>
    where
        R: Receiver<Value = Infallible, Error = Infallible> + Send + 'static,
    {
        JustStoppedOperation {
            receiver: Some(receiver),
        }
    }
}

/// [`JustStopped`] 的操作状态：启动即同步交付 `stopped`。
#[derive(Debug)]
pub struct JustStoppedOperation<R> {
    receiver: Option<R>,
}

impl<R> OperationState for JustStoppedOperation<R>
where
    R: Receiver,
{
    fn start(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::Start, "just_stopped");
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::SetStopped, "just_stopped");
        receiver.set_stopped();
    }
}
