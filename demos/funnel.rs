//! Side-effect funnel
//!
//! This example demonstrates the single side-effect handler: every
//! parameter-bearing transition is routed through it, and its result is
//! folded into the candidate state before the equality gate runs.
//!
//! Run with: cargo run --example funnel

use conflux::builder::OrchestratorBuilder;
use conflux::core::Snapshot;
use conflux::effects::StateTask;
use conflux::orchestrator::{AsyncCallback, AsyncRegistration, EffectTrigger, RootView};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;

struct ConsoleView;

impl RootView<Value, i64> for ConsoleView {
    fn render(&mut self, state: &Value, _effects: EffectTrigger<Value, i64>) {
        println!("rendered: {state}");
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tokio::task::LocalSet::new()
        .run_until(async {
            println!("=== Side-Effect Funnel Example ===\n");

            let submit: Rc<RefCell<Option<AsyncCallback<(i64,), Value>>>> =
                Rc::new(RefCell::new(None));

            // The transition itself only raises the parameter; the state
            // change comes entirely from the handler's patch.
            let submit_registration = AsyncRegistration::<Value, i64, (i64,), Value>::new({
                let submit = Rc::clone(&submit);
                move |callback| {
                    *submit.borrow_mut() = Some(callback);
                }
            })
            .with_transition(|args: (i64,)| StateTask::of(Some(args.0)))
            .with_return(|snapshot: Snapshot<Value>| async move { snapshot.get() });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(ConsoleView)
                .initial(json!({ "total": 0 }))
                .structural_equality()
                .side_effect_handler(|snapshot: Snapshot<Value>, amount: i64| async move {
                    // Pretend this talks to a backend.
                    let total = snapshot.get()["total"].as_i64().unwrap_or(0);
                    Ok::<Value, Infallible>(json!({ "total": total + amount }))
                })
                .async_registration(submit_registration)
                .build()
                .expect("orchestrator should build");

            orchestrator.mount().await.expect("mount should succeed");

            for amount in [10, 32] {
                let pending = submit.borrow().as_ref().expect("wired")((amount,));
                let settled = pending.await.expect("orchestrator alive");
                println!("submit({amount}) settled at {settled:?}");
            }

            println!("\nfinal state: {}", orchestrator.state());
            println!("commits: {}", orchestrator.trace().len());
            println!("\n=== Example Complete ===");
        })
        .await;
}
