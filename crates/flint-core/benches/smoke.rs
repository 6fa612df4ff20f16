//! 热路径冒烟基准：即时完成与定时到期的端到端开销。

use core::convert::Infallible;
use core::time::Duration;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use flint_core::just_result_of;
use flint_core::prelude::*;
use flint_core::test_stubs::{OutcomeCell, RecordingReceiver};

fn bench_just(c: &mut Criterion) {
    c.bench_function("just/connect_start", |b| {
        b.iter(|| {
            let cell = OutcomeCell::<u32, Infallible>::new();
            let mut op =
                just(black_box(7_u32)).connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
            start(&mut op);
            cell.count()
        })
    });
}

fn bench_result_of(c: &mut Criterion) {
    c.bench_function("just_result_of/three_steps", |b| {
        b.iter(|| {
            let cell = OutcomeCell::<(u32, u64), Infallible>::new();
            let sender = just_result_of![|| black_box(1_u32), || (), || black_box(2_u64)];
            let mut op = sender.connect(RecordingReceiver::new(cell.clone(), EmptyEnv));
            start(&mut op);
            cell.count()
        })
    });
}

fn bench_timer(c: &mut Criterion) {
    c.bench_function("timer/schedule_advance", |b| {
        b.iter(|| {
            let domain = Arc::new(ManualTimerDomain::new());
            let source = StopSource::new();
            let cell = OutcomeCell::<(), Infallible>::new();
            let scheduler = TimerScheduler::new(domain.clone(), Duration::from_millis(1));
            let mut op = scheduler.schedule().connect(RecordingReceiver::new(
                cell.clone(),
                TokenEnv::new(source.token()),
            ));
            start(&mut op);
            domain.advance(Duration::from_millis(1));
            cell.count()
        })
    });
}

criterion_group!(benches, bench_just, bench_result_of, bench_timer);
criterion_main!(benches);
