use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;
use taskmaster::{
    Config, ConfigError, ConfigSource, ExitContext, MasterHandle, MasterSpec, ReactiveCell,
    Request, Response, RestartPolicy, StdioMode, TaskConfig,
};

// ============================================================================
// Fixtures
// ============================================================================

struct StaticSource(Config);

#[async_trait]
impl ConfigSource for StaticSource {
    async fn load(&self) -> Result<Config, ConfigError> {
        Ok(self.0.clone())
    }
}

fn idle_fleet(tasks: usize, instances: usize) -> Config {
    let tasks = (0..tasks)
        .map(|i| {
            TaskConfig::new(format!("task-{i}"), "sleep")
                .with_args(["30"])
                .with_instances(instances)
                .with_start_at_launch(false)
                .with_stdio(StdioMode::Ignore)
        })
        .collect();
    Config::new(tasks, std::env::temp_dir())
}

// ============================================================================
// Benchmark Functions
// ============================================================================

fn bench_cell_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("cell_update");

    for subscribers in [0, 1, 4, 16].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(subscribers),
            subscribers,
            |b, &count| {
                let cell = ReactiveCell::new(0u64);
                for _ in 0..count {
                    cell.subscribe(|old, new| {
                        black_box((old, new));
                        Ok(())
                    });
                }
                b.iter(|| cell.update(|v| v + 1));
            },
        );
    }

    group.finish();
}

fn bench_retry_decision(c: &mut Criterion) {
    let context = ExitContext {
        policy: RestartPolicy::UnlessStopped,
        max_attempts: 5,
        attempts: 2,
        stopped_early: false,
        user_stopped: false,
        exit_code: 1,
        expected_exit_code: 0,
    };
    c.bench_function("retry_decision", |b| {
        b.iter(|| black_box(context).should_retry())
    });
}

fn bench_request_parsing(c: &mut Criterion) {
    c.bench_function("request_parsing", |b| {
        b.iter(|| black_box("restart 12 3").parse::<Request>())
    });
}

fn bench_status_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("status_round_trip");

    for (tasks, instances) in [(1, 1), (4, 4), (16, 4)].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{tasks}x{instances}")),
            &(*tasks, *instances),
            |b, &(tasks, instances)| {
                let runtime = tokio::runtime::Runtime::new().unwrap();
                let (handle, responses) = runtime.block_on(async {
                    let source = Arc::new(StaticSource(idle_fleet(tasks, instances)));
                    MasterHandle::start(MasterSpec::new(source)).await.unwrap()
                });
                let responses = Arc::new(tokio::sync::Mutex::new(responses));

                b.to_async(&runtime).iter(|| {
                    let handle = handle.clone();
                    let responses = Arc::clone(&responses);
                    async move {
                        handle.send(Request::Status).unwrap();
                        let mut responses = responses.lock().await;
                        match responses.recv().await {
                            Some(Response::Status(status)) => black_box(status),
                            other => panic!("unexpected response {other:?}"),
                        };
                    }
                });

                let _ = handle.shutdown();
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cell_update,
    bench_retry_decision,
    bench_request_parsing,
    bench_status_round_trip
);

criterion_main!(benches);
