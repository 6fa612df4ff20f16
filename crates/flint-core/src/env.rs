//! 环境与能力查询协议：接收方随身携带的只读上下文。
//!
//! # 设计缘起（Why）
//! - 操作在执行期需要询问接收方“你具备哪些能力”：是否可被停止、
//!   是否注入了观测探针。原始协议以结构化鸭子类型的 query 表达这些能力；
//!   在 Rust 中改为显式的能力 Trait 与关联类型——能力缺席是类型层事实，
//!   而非运行期分支（对应重设计要求）。
//! - 环境是只读上下文：被操作在 `start()` 与取消处理期间借用，
//!   生命周期由接收方保障，协议自身从不改写它。
//!
//! # 契约说明（What）
//! - [`Environment::Token`]：停止令牌能力；[`crate::stop::NeverStopToken`]
//!   表示静态不可停止，Sender 据此推导完成签名集并消除取消机制；
//! - [`Environment::Observer`]：观测能力；[`crate::observe::NoopObserver`]
//!   表示观测缺席；
//! - [`EmptyEnv`] 是缺省环境（不可停止、无观测）；[`TokenEnv`] 在其上
//!   叠加真实令牌与可选观测者。
//!
//! # 取舍提示（Trade-offs）
//! - 本模块不提供“运行期可选”的能力容器：`Option<能力>` 会把静态事实
//!   退化为动态分支，违背零成本缺省的目标。需要混合配置的调用方
//!   应为各配置各自挑选环境类型。

use crate::observe::{ExecutionObserver, NoopObserver};
use crate::stop::{NeverStopToken, StopToken};

/// 接收方环境：以关联类型表达的能力查询协议。
///
/// # 契约说明（What）
/// - **前置条件**：环境生命周期覆盖其所属操作从 `start()` 到终态交付的
///   全过程（接收方持有环境，而接收方在终态交付时才被消费）；
/// - **后置条件**：`stop_token` 返回与环境共享停止状态的令牌克隆；
///   `observer` 返回观测探针的只读引用；
/// - 两种能力的“缺席”分别由 [`NeverStopToken`] 与 [`NoopObserver`] 表达。
pub trait Environment {
    /// 停止令牌能力类型。
    type Token: StopToken;
    /// 观测探针能力类型。
    type Observer: ExecutionObserver;

    /// 获取停止令牌（克隆语义，与环境共享同一停止状态）。
    fn stop_token(&self) -> Self::Token;

    /// 访问观测探针。
    fn observer(&self) -> &Self::Observer;
}

/// 缺省环境：静态不可停止、无观测。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmptyEnv;

static NOOP_OBSERVER: NoopObserver = NoopObserver;

impl Environment for EmptyEnv {
    type Token = NeverStopToken;
    type Observer = NoopObserver;

    fn stop_token(&self) -> NeverStopToken {
        NeverStopToken
    }

    fn observer(&self) -> &NoopObserver {
        &NOOP_OBSERVER
    }
}

/// 携带停止令牌与观测探针的环境。
///
/// # 使用指引（How）
/// - `TokenEnv::new(token)`：仅注入停止能力，观测保持缺省空实现；
/// - `TokenEnv::with_observer(token, observer)`：同时注入观测探针；
/// - 令牌类型即决定可停止性：`TokenEnv<NeverStopToken, O>` 仍是
///   静态不可停止的，仅用于单独注入观测者。
#[derive(Clone, Debug)]
pub struct TokenEnv<T, O = NoopObserver>
where
    T: StopToken,
    O: ExecutionObserver,
{
    token: T,
    observer: O,
}

impl<T> TokenEnv<T>
where
    T: StopToken,
{
    /// 以停止令牌构造环境，观测保持缺省空实现。
    pub fn new(token: T) -> Self {
        Self {
            token,
            observer: NoopObserver,
        }
    }
}

impl<T, O> TokenEnv<T, O>
where
    T: StopToken,
    O: ExecutionObserver,
{
    /// 同时注入停止令牌与观测探针。
    pub fn with_observer(token: T, observer: O) -> Self {
        Self { token, observer }
    }
}

impl<T, O> Environment for TokenEnv<T, O>
where
    T: StopToken,
    O: ExecutionObserver,
{
    type Token = T;
    type Observer = O;

    fn stop_token(&self) -> T {
        self.token.clone()
    }

    fn observer(&self) -> &O {
        &self.observer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stop::StopSource;

    #[test]
    fn empty_env_is_statically_unstoppable() {
        let env = EmptyEnv;
        assert!(!<EmptyEnv as Environment>::Token::MAY_STOP);
        assert!(!env.stop_token().stop_requested());
    }

    #[test]
    fn token_env_shares_stop_state() {
        let source = StopSource::new();
        let env = TokenEnv::new(source.token());
        assert!(!env.stop_token().stop_requested());
        source.request_stop();
        assert!(env.stop_token().stop_requested());
    }
}
