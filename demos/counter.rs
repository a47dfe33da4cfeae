//! Counter
//!
//! This example demonstrates wiring a synchronous and an asynchronous
//! callback source to a shared counter state.
//!
//! Key concepts:
//! - State types with explicit patch semantics via the state_struct! macro
//! - Synchronous callbacks answering from locally projected state
//! - Asynchronous callbacks awaiting the full transition pipeline
//!
//! Run with: cargo run --example counter

use conflux::builder::OrchestratorBuilder;
use conflux::core::State;
use conflux::effects::{StateFn, StateTask};
use conflux::orchestrator::{
    AsyncCallback, AsyncRegistration, EffectTrigger, RootView, SyncCallback, SyncRegistration,
};
use conflux::state_struct;
use std::cell::RefCell;
use std::rc::Rc;

state_struct! {
    pub struct Counter {
        count: i64,
    }
    patch: CounterPatch
}

struct ConsoleView;

impl RootView<Counter, ()> for ConsoleView {
    fn render(&mut self, state: &Counter, _effects: EffectTrigger<Counter, ()>) {
        println!("rendered: count = {}", state.count);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tokio::task::LocalSet::new()
        .run_until(async {
            println!("=== Counter Example ===\n");

            // The "event sources": slots the orchestrator wires callbacks into.
            let bump: Rc<RefCell<Option<SyncCallback<(i64,), i64>>>> =
                Rc::new(RefCell::new(None));
            let read: Rc<RefCell<Option<AsyncCallback<(), i64>>>> = Rc::new(RefCell::new(None));

            let bump_registration = SyncRegistration::<Counter, (), (i64,), i64>::new({
                let bump = Rc::clone(&bump);
                move |callback| {
                    *bump.borrow_mut() = Some(callback);
                }
            })
            .with_transition(|args: &(i64,)| {
                let step = args.0;
                StateFn::modify(move |state: Counter| {
                    state.apply(&CounterPatch::default().count(state.count + step))
                })
                .map(|_| None)
            })
            .with_return(|snapshot, _args| snapshot.get().count);

            let read_registration = AsyncRegistration::<Counter, (), (), i64>::new({
                let read = Rc::clone(&read);
                move |callback| {
                    *read.borrow_mut() = Some(callback);
                }
            })
            .with_return(|snapshot| async move { snapshot.get().count });

            let mut orchestrator = OrchestratorBuilder::<Counter, ()>::new()
                .view(ConsoleView)
                .initial(Counter { count: 0 })
                .structural_equality()
                .sync_registration(bump_registration)
                .async_registration(read_registration)
                .on_mount(
                    StateTask::modify(|state: Counter| {
                        state.apply(&CounterPatch::default().count(1))
                    })
                    .map(|_| None),
                )
                .build()
                .expect("orchestrator should build");

            orchestrator.mount().await.expect("mount should succeed");

            for step in [2, 3] {
                let answered = bump.borrow().as_ref().expect("wired")((step,));
                println!("bump({step}) answered {answered:?}");
                tokio::task::yield_now().await;
            }

            let pending = read.borrow().as_ref().expect("wired")(());
            let count = pending.await.expect("orchestrator alive");
            println!("read() resolved {count:?}");

            println!("\n=== Example Complete ===");
        })
        .await;
}
