//! 定时 Scheduler：延时 `value(())` 完成与协作式取消。
//!
//! # 设计缘起（Why）
//! - 这是协议里第一个异步完成的 Sender：`start()` 返回后，完成由
//!   定时后端在到期或取消时驱动。取消请求与到期触发可能并发到达，
//!   仲裁必须保证恰好一次完成。
//!
//! # 实现要点（How）
//! - 仲裁权在后端的 [`cancel`](super::TimerDomain::cancel)：停止回调
//!   先调 `cancel`，仅在返回 `true`（成功摘下待触发条目）时走
//!   `set_stopped`；返回 `false` 说明 `fire` 已经或正在交付 `value`，
//!   回调静默退出。接收者本体放在一把 `spin::Mutex<Option<R>>` 里，
//!   两条路径都以 `take()` 取走，败者拿到 `None`；
//! - 环境的停止能力在编译期可见：`Token::MAY_STOP == false` 时完全
//!   跳过令牌注册，完成签名也收窄为仅 `value`；
//! - 环境在启动时已经请求停止的，直接 `set_stopped`，绝不触碰后端。
//!
//! # 契约说明（What）
//! - [`TimerScheduler`] 可克隆、可比较：指向同一后端实例且延时相同
//!   的两个调度器相等；
//! - [`TimerSender`] 的完成签名为 `value(())`，外加（仅当环境可停止）
//!   `stopped`；它可多发，每次 `connect` 各自独立注册。

use alloc::sync::Arc;
use core::convert::Infallible;
use core::time::Duration;

use crate::env::Environment;
use crate::observe::{ExecutionObserver, ProtocolEvent};
use crate::receiver::Receiver;
use crate::sender::{MultishotSender, OperationState, Scheduler, Sender};
use crate::signal::SignatureSet;
use crate::stop::StopToken;

use super::domain::{TimerDomain, TimerTask};

const OPERATION_NAME: &str = "time_scheduler";

/// 绑定后端与固定延时的调度器。
pub struct TimerScheduler<D> {
    domain: Arc<D>,
    delay: Duration,
}

impl<D> TimerScheduler<D> {
    pub fn new(domain: Arc<D>, delay: Duration) -> Self {
        TimerScheduler { domain, delay }
    }

    /// 本调度器产出的 Sender 的到期延时。
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl<D> Clone for TimerScheduler<D> {
    fn clone(&self) -> Self {
        TimerScheduler {
            domain: self.domain.clone(),
            delay: self.delay,
        }
    }
}

impl<D> core::fmt::Debug for TimerScheduler<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerScheduler")
            .field("domain", &Arc::as_ptr(&self.domain))
            .field("delay", &self.delay)
            .finish()
    }
}

impl<D> PartialEq for TimerScheduler<D> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.domain, &other.domain) && self.delay == other.delay
    }
}

impl<D> Eq for TimerScheduler<D> {}

impl<D> Scheduler for TimerScheduler<D>
where
    D: TimerDomain,
{
    type Sender = TimerSender<D>;

    fn schedule(&self) -> TimerSender<D> {
        TimerSender {
            domain: self.domain.clone(),
            delay: self.delay,
        }
    }
}

/// 到期后以 `value(())` 完成的定时 Sender。
pub struct TimerSender<D> {
    domain: Arc<D>,
    delay: Duration,
}

impl<D> core::fmt::Debug for TimerSender<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimerSender")
            .field("domain", &Arc::as_ptr(&self.domain))
            .field("delay", &self.delay)
            .finish()
    }
}

impl<D> TimerSender<D> {
    /// 本次延时完成的等待时长。
    pub fn expiration(&self) -> Duration {
        self.delay
    }

    /// 完成发生所在的调度器，即产出本 Sender 的那一个。
    pub fn completion_scheduler(&self) -> TimerScheduler<D> {
        TimerScheduler {
            domain: self.domain.clone(),
            delay: self.delay,
        }
    }
}

impl<D> Clone for TimerSender<D> {
    fn clone(&self) -> Self {
        TimerSender {
            domain: self.domain.clone(),
            delay: self.delay,
        }
    }
}

impl<D> Sender for TimerSender<D>
where
    D: TimerDomain,
{
    type Value = ();
    type Error = Infallible;

    type Operation<R>
        = TimerOperation<D, R>
    where
        R: Receiver<Value = (), Error = Infallible> + Send + 'static;

    fn completions<E>() -> SignatureSet
    where
        E: Environment,
    {
        let set = SignatureSet::EMPTY.with_value();
        if <E::Token as StopToken>::MAY_STOP {
            set.with_stopped()
        } else {
            set
        }
    }

    fn connect<R>(self, receiver: R) -> TimerOperation<D, R>
    where
        R: Receiver<Value = (), Error = Infallible> + Send + 'static,
    {
        TimerOperation {
            domain: self.domain,
            delay: self.delay,
            receiver: Some(receiver),
            registration: None,
        }
    }
}

impl<D> MultishotSender for TimerSender<D>
where
    D: TimerDomain,
{
    fn connect_ref<R>(&self, receiver: R) -> TimerOperation<D, R>
    where
        R: Receiver<Value = (), Error = Infallible> + Send + 'static,
    {
        self.clone().connect(receiver)
    }
}

/// 接收者的占位槽：到期触发与取消回调都从这里 `take()`，
/// 恰好一次完成由“谁拿到 `Some` 谁交付”保证。
struct TimerShared<R> {
    slot: spin::Mutex<Option<R>>,
}

impl<R> TimerShared<R>
where
    R: Receiver<Value = ()>,
{
    fn complete_stopped(&self) {
        let receiver = self.slot.lock().take();
        if let Some(receiver) = receiver {
            receiver
                .env()
                .observer()
                .on_event(ProtocolEvent::SetStopped, OPERATION_NAME);
            receiver.set_stopped();
        }
    }
}

impl<R> TimerTask for TimerShared<R>
where
    R: Receiver<Value = ()> + Send + 'static,
{
    fn fire(&self) {
        let receiver = self.slot.lock().take();
        if let Some(receiver) = receiver {
            receiver
                .env()
                .observer()
                .on_event(ProtocolEvent::SetValue, OPERATION_NAME);
            receiver.set_value(());
        }
    }
}

/// [`TimerSender`] 的操作状态。
///
/// 持有停止回调的注册凭据：操作状态存活期间回调保持挂载，
/// 析构时自动注销。
pub struct TimerOperation<D, R>
where
    R: Receiver,
{
    domain: Arc<D>,
    delay: Duration,
    receiver: Option<R>,
    registration: Option<<<R::Env as Environment>::Token as StopToken>::Registration>,
}

impl<D, R> OperationState for TimerOperation<D, R>
where
    D: TimerDomain,
    R: Receiver<Value = ()> + Send + 'static,
{
    fn start(&mut self) {
        let Some(receiver) = self.receiver.take() else {
            return;
        };
        receiver
            .env()
            .observer()
            .on_event(ProtocolEvent::Start, OPERATION_NAME);

        let token = receiver.env().stop_token();
        if <<R::Env as Environment>::Token as StopToken>::MAY_STOP && token.stop_requested() {
            // 提前停止：不触碰后端，同步交付 stopped。
            receiver
                .env()
                .observer()
                .on_event(ProtocolEvent::SetStopped, OPERATION_NAME);
            receiver.set_stopped();
            return;
        }

        let shared = Arc::new(TimerShared {
            slot: spin::Mutex::new(Some(receiver)),
        });
        let task: Arc<dyn TimerTask> = shared.clone();
        self.domain.run_after(task.clone(), self.delay);

        if <<R::Env as Environment>::Token as StopToken>::MAY_STOP {
            // 注册晚于 run_after：令牌在此窗口内被触发时，注册方会
            // 立即执行回调，cancel 仍能对已入队的条目做出仲裁。
            let domain = self.domain.clone();
            self.registration = Some(token.register(move || {
                if domain.cancel(&task) {
                    shared.complete_stopped();
                }
            }));
        }
    }
}
