use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;
use ticketry::{
  Action, DuplicatePolicy, Instance, Matcher, Responder, ResponderRegistry, Source, TicketryError, Trigger, Worker,
  WorkerContext, WorkerControl,
};
use tokio::runtime::Runtime; // To run async code within Criterion

// --- Common Benchmark Instance, Params and Error ---
#[derive(Clone, Debug, Default)]
struct BenchInstance {
  counter: u64,
}

#[derive(Clone, Debug, Default)]
struct BenchParams {
  iterations: u64,
}

#[derive(Clone, Debug)]
struct BenchTrigger(String);

impl Trigger for BenchTrigger {
  fn trigger_id(&self) -> &str {
    &self.0
  }
}

// Using TicketryError directly for benchmark simplicity.
type BenchError = TicketryError;

// --- Helper: CPU-bound worker ---
fn counting_worker<P>(id: String, priority: i32, iterations: u64) -> Worker<BenchInstance, P, BenchError>
where
  P: Send + Sync + 'static,
{
  Worker::new(id, priority, move |ctx: WorkerContext<BenchInstance, P>| async move {
    let mut instance = ctx.instance.write();
    for _ in 0..iterations {
      instance.counter = instance.counter.wrapping_add(1);
    }
    Ok::<_, BenchError>(WorkerControl::Continue)
  })
}

// --- Benchmark Functions ---

fn bench_worker_set_execution(c: &mut Criterion) {
  let mut group = c.benchmark_group("WorkerSetExecution");
  let rt = Runtime::new().unwrap();

  for num_workers in [1usize, 5, 20].iter() {
    for frozen in [false, true] {
      let action = Action::<BenchInstance, BenchParams, BenchError>::new("bench");
      for i in 0..*num_workers {
        // spread priorities so sorting has real work to do when unfrozen
        let priority = ((i * 7) % 11) as i32 - 5;
        action
          .workers()
          .add(counting_worker(format!("worker_{}", i), priority, 10))
          .unwrap();
      }
      if frozen {
        action.freeze();
      }
      let action = Arc::new(action);

      group.throughput(Throughput::Elements(*num_workers as u64));
      group.bench_with_input(
        BenchmarkId::new(if frozen { "frozen" } else { "unfrozen" }, num_workers),
        num_workers,
        |b, _| {
          b.to_async(&rt).iter_batched(
            || Instance::new(BenchInstance::default()),
            |instance| {
              let action = action.clone();
              async move {
                action
                  .workers()
                  .execute(instance, Arc::new(BenchParams { iterations: 10 }), Source::from("bench"))
                  .await
                  .unwrap()
              }
            },
            criterion::BatchSize::SmallInput,
          );
        },
      );
    }
  }
  group.finish();
}

fn bench_instance_access(c: &mut Criterion) {
  let mut group = c.benchmark_group("InstanceAccess");
  let instance = Instance::new(BenchInstance::default());

  group.bench_function("read", |b| b.iter(|| instance.read().counter));
  group.bench_function("write", |b| b.iter(|| instance.write().counter += 1));
  group.finish();
}

fn bench_responder_dispatch(c: &mut Criterion) {
  let mut group = c.benchmark_group("ResponderDispatch");
  let rt = Runtime::new().unwrap();

  for num_responders in [1usize, 10, 50].iter() {
    let registry = Arc::new(ResponderRegistry::<BenchTrigger, BenchInstance, BenchError>::new(
      "button",
      DuplicatePolicy::Reject,
    ));
    for i in 0..*num_responders {
      let matcher = Matcher::pattern(&format!("^od:button-{}_", i)).unwrap();
      let responder = Responder::new(format!("button-{}", i), matcher, |_trigger: &BenchTrigger| {
        BenchInstance::default()
      });
      responder.workers().add(counting_worker("respond".to_string(), 0, 1)).unwrap();
      registry.add(responder).unwrap();
    }
    registry.freeze_all();

    // worst case: the last registered responder matches
    let trigger_id = format!("od:button-{}_ticket-message", num_responders - 1);
    group.bench_with_input(
      BenchmarkId::new("last_match", num_responders),
      num_responders,
      |b, _| {
        b.to_async(&rt).iter(|| {
          let registry = registry.clone();
          let trigger = BenchTrigger(trigger_id.clone());
          async move { registry.dispatch("button", trigger).await.unwrap() }
        });
      },
    );
  }
  group.finish();
}

criterion_group!(
  benches,
  bench_worker_set_execution,
  bench_instance_access,
  bench_responder_dispatch
);
criterion_main!(benches);
