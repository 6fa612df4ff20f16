//! 惰性求值的即时 Sender：`just_result_of!` / `just_error_result_of!`。
//!
//! # 设计缘起（Why）
//! - [`just`](crate::just::just) 在构造期捕获现成负载；本模块把捕获推迟到
//!   `start()`：每个步骤是一个 `FnOnce` 闭包，启动时恰好各调用一次——
//!   副作用步骤先按书写顺序执行，取值步骤随后按书写顺序执行。
//! - 返回 `()` 的闭包是“副作用步骤”，只执行、不贡献负载；返回其他类型的
//!   闭包是“取值步骤”，其返回值按顺序汇入完成负载。两类步骤的区分发生在
//!   宏展开的类型检查期，运行期没有任何分支或判别标记。
//!
//! # 实现要点（How）
//! - 编译期二分靠自动引用优先级：[`EffectStepKind`] 只对
//!   `StepProbe<F: FnOnce()>` 实现、接收者为 `&Self`；[`ValueStepKind`] 对
//!   `&StepProbe<F>` 实现、接收者为 `Self`。对 `(&probe).flint_step_kind()`
//!   做方法解析时，前者在不加引用的探测步即可命中，因而在闭包返回 `()`
//!   时稳定胜出；其余闭包落入后者。两个 Kind 各自携带 `into_slot`，
//!   把探针定型为对应的槽位类型。
//! - 负载的有序收集用 [`Fragment`] 的嵌套链：副作用步骤贡献 [`Nothing`]
//!   （链上透明），取值步骤贡献 [`Item<T>`]（链上追加一节），最终由
//!   [`Flatten`] 把嵌套链压平成裸值或元组。
//!
//! # 契约说明（What）
//! - 两个宏都产出 `COMPLETES_SYNCHRONOUSLY = true`、恰好一个完成签名的
//!   Sender；闭包在 `connect` 之前绝不执行；
//! - 零个取值步骤 → 负载为 `()`；一个 → 裸值；多个 → 元组（最多 8 个）；
//! - 所有槽位可克隆时 Sender 可多发。

use core::convert::Infallible;

use crate::env::Environment;
use crate::observe::{ExecutionObserver, ProtocolEvent};
use crate::receiver::Receiver;
use crate::sender::{MultishotSender, OperationState, Sender};
use crate::signal::SignatureSet;

// ---------------------------------------------------------------------------
// 编译期步骤分类
// ---------------------------------------------------------------------------

/// 宏展开时包裹单个步骤闭包的探针，仅用于方法解析期的分类。
#[derive(Clone, Debug)]
pub struct StepProbe<F> {
    f: F,
}

impl<F> StepProbe<F> {
    pub fn new(f: F) -> Self {
        StepProbe { f }
    }
}

/// 副作用步骤的分类标记，由 [`EffectStepKind::flint_step_kind`] 产出。
#[derive(Clone, Copy, Debug)]
pub struct EffectKind;

/// 取值步骤的分类标记，由 [`ValueStepKind::flint_step_kind`] 产出。
#[derive(Clone, Copy, Debug)]
pub struct ValueKind;

/// 针对返回 `()` 的闭包的分类入口。
///
/// 接收者写作 `&self` 且 `Self = StepProbe<F>`，使其在方法解析的首个
/// 探测步命中，优先于 [`ValueStepKind`]。
pub trait EffectStepKind {
    #[inline]
    fn flint_step_kind(&self) -> EffectKind {
        EffectKind
    }
}

impl<F> EffectStepKind for StepProbe<F> where F: FnOnce() {}

/// 针对其余闭包的分类兜底。
///
/// `Self = &StepProbe<F>` 使其只能在追加一层引用的探测步命中，排序
/// 晚于 [`EffectStepKind`]。
pub trait ValueStepKind {
    #[inline]
    fn flint_step_kind(&self) -> ValueKind {
        ValueKind
    }
}

impl<F> ValueStepKind for &StepProbe<F> {}

impl EffectKind {
    /// 把探针定型为副作用槽位。
    #[inline]
    pub fn into_slot<F>(self, probe: StepProbe<F>) -> EffectSlot<F>
    where
        F: FnOnce(),
    {
        EffectSlot { f: Some(probe.f) }
    }
}

impl ValueKind {
    /// 把探针定型为取值槽位。
    #[inline]
    pub fn into_slot<F, T>(self, probe: StepProbe<F>) -> ValueSlot<F>
    where
        F: FnOnce() -> T,
    {
        ValueSlot { f: probe.f }
    }
}

// ---------------------------------------------------------------------------
// 负载片段与压平
// ---------------------------------------------------------------------------

/// 单个步骤对完成负载的贡献：[`Nothing`] 或 [`Item<T>`]。
pub trait Fragment {
    /// 把本片段接到尾链 `Tail` 之前得到的链类型。
    type Chain<Tail>;

    fn chain<Tail>(self, tail: Tail) -> Self::Chain<Tail>;
}

/// 副作用步骤的空贡献，在链上完全透明。
#[derive(Clone, Copy, Debug, Default)]
pub struct Nothing;

impl Fragment for Nothing {
    type Chain<Tail> = Tail;

    #[inline]
    fn chain<Tail>(self, tail: Tail) -> Tail {
        tail
    }
}

/// 取值步骤贡献的一节负载。
#[derive(Clone, Copy, Debug)]
pub struct Item<T>(pub T);

impl<T> Fragment for Item<T> {
    type Chain<Tail> = (T, Tail);

    #[inline]
    fn chain<Tail>(self, tail: Tail) -> (T, Tail) {
        (self.0, tail)
    }
}

/// 把 `(A, (B, ... ()))` 形状的嵌套链压平为交付给接收者的负载。
///
/// 零节 → `()`；一节 → 裸值 `A`；二至八节 → 对应元组。
pub trait Flatten {
    type Flat;

    fn flatten(self) -> Self::Flat;
}

impl Flatten for () {
    type Flat = ();

    #[inline]
    fn flatten(self) {}
}

impl<A> Flatten for (A, ()) {
    type Flat = A;

    #[inline]
    fn flatten(self) -> A {
        self.0
    }
}

macro_rules! nest_ty {
    () => { () };
    ($head:ident $(, $rest:ident)*) => { ($head, nest_ty!($($rest),*)) };
}

macro_rules! nest_pat {
    () => { () };
    ($head:ident $(, $rest:ident)*) => { ($head, nest_pat!($($rest),*)) };
}

macro_rules! impl_flatten {
    ($($T:ident),+) => {
        impl<$($T),+> Flatten for nest_ty!($($T),+) {
            type Flat = ($($T,)+);

            #[inline]
            #[allow(non_snake_case)]
            fn flatten(self) -> Self::Flat {
                let nest_pat!($($T),+) = self;
                ($($T,)+)
            }
        }
    };
}

impl_flatten!(A, B);
impl_flatten!(A, B, C);
impl_flatten!(A, B, C, D);
impl_flatten!(A, B, C, D, E);
impl_flatten!(A, B, C, D, E, F);
impl_flatten!(A, B, C, D, E, F, G);
impl_flatten!(A, B, C, D, E, F, G, H);

// ---------------------------------------------------------------------------
// 槽位与槽位列表
// ---------------------------------------------------------------------------

/// 已分类的单个步骤：先跑副作用阶段，再按顺序收取负载阶段。
///
/// 执行顺序是两段式的：所有副作用步骤先按书写顺序执行完毕，随后
/// 取值步骤再按书写顺序执行并组装负载。同类步骤之间的相对顺序
/// 始终保持书写顺序。
pub trait StepSlot {
    type Produced: Fragment;

    fn effect_phase(&mut self);

    fn value_phase(self) -> Self::Produced;
}

/// 返回 `()` 的闭包定型成的槽位。
#[derive(Clone, Debug)]
pub struct EffectSlot<F> {
    f: Option<F>,
}

impl<F> StepSlot for EffectSlot<F>
where
    F: FnOnce(),
{
    type Produced = Nothing;

    #[inline]
    fn effect_phase(&mut self) {
        if let Some(f) = self.f.take() {
            f();
        }
    }

    #[inline]
    fn value_phase(self) -> Nothing {
        Nothing
    }
}

/// 返回非 `()` 的闭包定型成的槽位。
#[derive(Clone, Debug)]
pub struct ValueSlot<F> {
    f: F,
}

impl<F, T> StepSlot for ValueSlot<F>
where
    F: FnOnce() -> T,
{
    type Produced = Item<T>;

    #[inline]
    fn effect_phase(&mut self) {}

    #[inline]
    fn value_phase(self) -> Item<T> {
        Item((self.f)())
    }
}

/// 一整组已分类槽位，`execute` 按协议顺序跑完所有步骤并产出负载。
pub trait SlotList {
    type Results;

    fn execute(self) -> Self::Results;
}

impl SlotList for () {
    type Results = ();

    #[inline]
    fn execute(self) {}
}

macro_rules! chain_ty {
    () => { () };
    ($head:ident $(, $rest:ident)*) => {
        <<$head as StepSlot>::Produced as Fragment>::Chain<chain_ty!($($rest),*)>
    };
}

macro_rules! chain_val {
    () => { () };
    ($head:ident $(, $rest:ident)*) => {
        Fragment::chain(StepSlot::value_phase($head), chain_val!($($rest),*))
    };
}

macro_rules! impl_slot_list {
    ($($S:ident),+) => {
        impl<$($S),+> SlotList for ($($S,)+)
        where
            $($S: StepSlot,)+
            chain_ty!($($S),+): Flatten,
        {
            type Results = <chain_ty!($($S),+) as Flatten>::Flat;

            #[allow(non_snake_case)]
            fn execute(self) -> Self::Results {
                let ($(mut $S,)+) = self;
                $(StepSlot::effect_phase(&mut $S);)+
                Flatten::flatten(chain_val!($($S),+))
            }
        }
    };
}

impl_slot_list!(S1);
impl_slot_list!(S1, S2);
impl_slot_list!(S1, S2, S3);
impl_slot_list!(S1, S2, S3, S4);
impl_slot_list!(S1, S2, S3, S4, S5);
impl_slot_list!(S1, S2, S3, S4, S5, S6);
impl_slot_list!(S1, S2, S3, S4, S5, S6, S7);
impl_slot_list!(S1, S2, S3, S4, S5, S6, S7, S8);

// ---------------------------------------------------------------------------
// Sender 与宏
// ---------------------------------------------------------------------------

/// 启动时执行各步骤并以 `value` 终态交付负载的 Sender。
///
/// 由 [`just_result_of!`] 构造，见模块文档。
#[derive(Clone, Debug)]
pub struct JustResultOf<S> {
    slots: S,
}

impl<S> JustResultOf<S> {
    /// 宏展开的装配入口，槽位由分类标记的 `into_slot` 产出。
    pub fn from_slots(slots: S) -> Self {
        JustResultOf { slots }
    }
}

impl<S> Sender for JustResultOf<S>
where
    S: SlotList,
{
    type Value = S::Results;
    type Error = Infallible;

    const COMPLETES_SYNCHRONOUSLY: bool = true;

    type Operation<R>
        = ResultOfOperation<S, R>
    where
        R: Receiver<Value = S::Results, Error = Infallible> + Send + 'static;

    fn completions<E>() -> SignatureSet
    where
        E: Environment,
    {
        SignatureSet::EMPTY.with_value()
    }

    fn connect<R>(self, receiver: R) -> ResultOfOperation<S, R>
    where
        R: Receiver<Value = S::Results, Error = Infallible> + Send + 'static,
    {
        ResultOfOperation {
            slots: Some(self.slots),
            receiver: Some(receiver),
        }
    }
}

impl<S> MultishotSender for JustResultOf<S>
where
    S: SlotList + Clone,
{
    fn connect_ref<R>(&self, receiver: R) -> ResultOfOperation<S, R>
    where
        R: Receiver<Value = S::Results, Error = Infallible> + Send + 'static,
    {
        ResultOfOperation {
            slots: Some(self.slots.clone()),
            receiver: Some(receiver),
        }
    }
}

/// [`JustResultOf`] 的操作状态：`start()` 内完成执行与交付。
#[derive(Debug)]
pub struct ResultOfOperation<S, R> {
    slots: Option<S>,
    receiver: Option<R>,
}

impl<S, R> OperationState for ResultOfOperation<S, R>
where
    S: SlotList,
    R: Receiver<Value = S::Results>,
{
    fn start(&mut self) {
        let (Some(slots), Some(receiver)) = (self.slots.take(), self.receiver.take()) else {
            return;
        };
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::Start, "just_result_of");
        let results = slots.execute();
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::SetValue, "just_result_of");
        receiver.set_value(results);
    }
}

/// 启动时执行各步骤并以 `error` 终态交付负载的 Sender。
///
/// 由 [`just_error_result_of!`] 构造。
#[derive(Clone, Debug)]
pub struct JustErrorResultOf<S> {
    slots: S,
}

impl<S> JustErrorResultOf<S> {
    pub fn from_slots(slots: S) -> Self {
        JustErrorResultOf { slots }
    }
}

impl<S> Sender for JustErrorResultOf<S>
where
    S: SlotList,
{
    type Value = Infallible;
    type Error = S::Results;

    const COMPLETES_SYNCHRONOUSLY: bool = true;

    type Operation<R>
        = ErrorResultOfOperation<S, R>
    where
        R: Receiver<Value = Infallible, Error = S::Results> + Send + 'static;

    fn completions<E>() -> SignatureSet
    where
        E: Environment,
    {
        SignatureSet::EMPTY.with_error()
    }

    fn connect<R>(self, receiver: R) -> ErrorResultOfOperation<S, R>
    where
        R: Receiver<Value = Infallible, Error = S::Results> + Send + 'static,
    {
        ErrorResultOfOperation {
            slots: Some(self.slots),
            receiver: Some(receiver),
        }
    }
}

impl<S> MultishotSender for JustErrorResultOf<S>
where
    S: SlotList + Clone,
{
    fn connect_ref<R>(&self, receiver: R) -> ErrorResultOfOperation<S, R>
    where
        R: Receiver<Value = Infallible, Error = S::Results> + Send + 'static,
    {
        ErrorResultOfOperation {
            slots: Some(self.slots.clone()),
            receiver: Some(receiver),
        }
    }
}

/// [`JustErrorResultOf`] 的操作状态。
#[derive(Debug)]
pub struct ErrorResultOfOperation<S, R> {
    slots: Option<S>,
    receiver: Option<R>,
}

impl<S, R> OperationState for ErrorResultOfOperation<S, R>
where
    S: SlotList,
    R: Receiver<Error = S::Results>,
{
    fn start(&mut self) {
        let (Some(slots), Some(receiver)) = (self.slots.take(), self.receiver.take()) else {
            return;
        };
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::Start, "just_error_result_of");
        let results = slots.execute();
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::SetError, "just_error_result_of");
        receiver.set_error(results);
    }
}

/// 构造惰性求值、以 `value` 终态完成的 Sender。
///
/// ```
/// use flint_core::just_result_of;
///
/// let sender = just_result_of![
///     || 40_u32,
///     || (),          // 副作用步骤，不贡献负载
///     || "ok",
/// ];
/// # let _ = sender;
/// ```
#[macro_export]
macro_rules! just_result_of {
    ($($f:expr),* $(,)?) => {
        $crate::result_of::JustResultOf::from_slots((
            $(
                {
                    use $crate::result_of::{EffectStepKind as _, ValueStepKind as _};
                    let __probe = $crate::result_of::StepProbe::new($f);
                    (&__probe).flint_step_kind().into_slot(__probe)
                },
            )*
        ))
    };
}

/// 构造惰性求值、以 `error` 终态完成的 Sender，步骤分类规则同
/// [`just_result_of!`]。
#[macro_export]
macro_rules! just_error_result_of {
    ($($f:expr),* $(,)?) => {
        $crate::result_of::JustErrorResultOf::from_slots((
            $(
                {
                    use $crate::result_of::{EffectStepKind as _, ValueStepKind as _};
                    let __probe = $crate::result_of::StepProbe::new($f);
                    (&__probe).flint_step_kind().into_slot(__probe)
                },
            )*
        ))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    fn classify<S: SlotList>(slots: S) -> S::Results {
        slots.execute()
    }

    #[test]
    fn unit_closure_becomes_effect_slot() {
        let trace = RefCell::new(Vec::new());
        let probe = StepProbe::new(|| trace.borrow_mut().push("effect"));
        let mut slot = {
            use super::{EffectStepKind as _, ValueStepKind as _};
            (&probe).flint_step_kind().into_slot(probe)
        };
        slot.effect_phase();
        let _: Nothing = slot.value_phase();
        assert_eq!(trace.into_inner(), ["effect"]);
    }

    #[test]
    fn value_closure_becomes_value_slot() {
        let probe = StepProbe::new(|| 7_u32);
        let slot = {
            use super::{EffectStepKind as _, ValueStepKind as _};
            (&probe).flint_step_kind().into_slot(probe)
        };
        let Item(v) = slot.value_phase();
        assert_eq!(v, 7);
    }

    #[test]
    fn effect_steps_run_before_value_steps() {
        let trace = RefCell::new(Vec::new());
        let slots = (
            ValueSlot {
                f: || {
                    trace.borrow_mut().push(1);
                    "a"
                },
            },
            EffectSlot {
                f: Some(|| trace.borrow_mut().push(2)),
            },
            ValueSlot {
                f: || {
                    trace.borrow_mut().push(3);
                    9_u8
                },
            },
        );
        // 副作用步骤先于全部取值步骤执行。
        let (a, b) = classify(slots);
        assert_eq!((a, b), ("a", 9));
        assert_eq!(trace.into_inner(), [2, 1, 3]);
    }

    #[test]
    fn flatten_arities() {
        assert_eq!(().flatten(), ());
        assert_eq!((5_u8, ()).flatten(), 5);
        assert_eq!(("x", (2_u16, ())).flatten(), ("x", 2));
        assert_eq!((1_u8, (2_u8, (3_u8, ()))).flatten(), (1, 2, 3));
    }

    #[test]
    fn effect_only_list_yields_unit() {
        let count = RefCell::new(0_u32);
        let slots = (
            EffectSlot {
                f: Some(|| *count.borrow_mut() += 1),
            },
            EffectSlot {
                f: Some(|| *count.borrow_mut() += 1),
            },
        );
        let _: () = classify(slots);
        assert_eq!(count.into_inner(), 2);
    }

    #[test]
    fn single_value_is_delivered_bare() {
        let slots = (ValueSlot { f: || 42_u64 },);
        assert_eq!(classify(slots), 42);
    }
}
