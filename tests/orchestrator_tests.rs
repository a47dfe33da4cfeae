//! Integration tests for the orchestration pipeline.
//!
//! These tests drive the full transition → funnel → gate → notify path
//! through registered callbacks, exactly as an external event source would.
//! Background work is spawned on the current thread, so every test runs
//! inside a `LocalSet`.

use conflux::builder::OrchestratorBuilder;
use conflux::core::{Snapshot, State, StateEq};
use conflux::effects::{StateFn, StateTask};
use conflux::orchestrator::{
    AsyncCallback, AsyncRegistration, EffectTrigger, OrchestratorError, RootView, SyncCallback,
    SyncRegistration,
};
use futures::future::LocalBoxFuture;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::LocalSet;

/// View that records every state it is asked to render.
struct RecordingView {
    seen: Rc<RefCell<Vec<Value>>>,
}

impl<P> RootView<Value, P> for RecordingView {
    fn render(&mut self, state: &Value, _effects: EffectTrigger<Value, P>) {
        self.seen.borrow_mut().push(state.clone());
    }
}

fn recording_view() -> (RecordingView, Rc<RefCell<Vec<Value>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    (
        RecordingView {
            seen: Rc::clone(&seen),
        },
        seen,
    )
}

type AsyncSlot<Args, Ret> = Rc<RefCell<Option<AsyncCallback<Args, Ret>>>>;

/// Registration whose wiring seam stashes the callback for the test to fire.
fn capture_async<Args: 'static, Ret: 'static>(
) -> (AsyncRegistration<Value, i64, Args, Ret>, AsyncSlot<Args, Ret>) {
    let slot: AsyncSlot<Args, Ret> = Rc::new(RefCell::new(None));
    let registration = AsyncRegistration::new({
        let slot = Rc::clone(&slot);
        move |callback| {
            *slot.borrow_mut() = Some(callback);
        }
    });
    (registration, slot)
}

fn invoke<Args: 'static, Ret: 'static>(
    slot: &AsyncSlot<Args, Ret>,
    args: Args,
) -> LocalBoxFuture<'static, Result<Option<Ret>, OrchestratorError>> {
    let guard = slot.borrow();
    let callback = guard.as_ref().expect("callback wired at mount");
    callback(args)
}

/// Let spawned transition work run to completion.
async fn settle_background() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn registration_without_transition_never_changes_state() {
    LocalSet::new()
        .run_until(async {
            let (view, seen) = recording_view();
            let (registration, slot) = capture_async::<(), Value>();
            let registration =
                registration.with_return(|snapshot: Snapshot<Value>| async move { snapshot.get() });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            for _ in 0..5 {
                let reported = invoke(&slot, ()).await.unwrap();
                assert_eq!(reported, Some(json!({ "count": 0 })));
            }

            assert_eq!(orchestrator.state(), json!({ "count": 0 }));
            // Initial render only; a no-op pass-through never notifies.
            assert_eq!(seen.borrow().len(), 1);
        })
        .await;
}

#[tokio::test]
async fn equal_candidate_yields_a_single_notification() {
    LocalSet::new()
        .run_until(async {
            let (view, seen) = recording_view();
            let (registration, slot) = capture_async::<(i64,), Value>();
            let registration = registration.with_transition(|args: (i64,)| {
                StateTask::modify(move |state: Value| state.apply(&json!({ "count": args.0 })))
                    .map(|_| None)
            });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            invoke(&slot, (5,)).await.unwrap();
            invoke(&slot, (5,)).await.unwrap();

            assert_eq!(orchestrator.state(), json!({ "count": 5 }));
            // Initial render plus exactly one visible update.
            assert_eq!(*seen.borrow(), vec![json!({ "count": 0 }), json!({ "count": 5 })]);
            assert_eq!(orchestrator.trace().len(), 1);
        })
        .await;
}

#[tokio::test]
async fn absent_parameter_skips_the_funnel() {
    LocalSet::new()
        .run_until(async {
            let (view, _seen) = recording_view();
            let calls = Rc::new(RefCell::new(0u32));
            let handler_calls = Rc::clone(&calls);

            let (registration, slot) = capture_async::<(), Value>();
            let registration = registration.with_transition(|_args| {
                StateTask::modify(|state: Value| state.apply(&json!({ "count": 1 })))
                    .map(|_| None)
            });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .side_effect_handler(move |_snapshot: Snapshot<Value>, _param: i64| {
                    let handler_calls = Rc::clone(&handler_calls);
                    async move {
                        *handler_calls.borrow_mut() += 1;
                        Ok::<Value, std::convert::Infallible>(json!({}))
                    }
                })
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            invoke(&slot, ()).await.unwrap();

            assert_eq!(orchestrator.state(), json!({ "count": 1 }));
            assert_eq!(*calls.borrow(), 0);
        })
        .await;
}

#[tokio::test]
async fn present_parameter_routes_through_the_funnel() {
    LocalSet::new()
        .run_until(async {
            let (view, _seen) = recording_view();
            let calls = Rc::new(RefCell::new(0u32));
            let handler_calls = Rc::clone(&calls);

            let (registration, slot) = capture_async::<(), Value>();
            let registration =
                registration.with_transition(|_args| StateTask::of(Some(3)));

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .side_effect_handler(move |_snapshot: Snapshot<Value>, param: i64| {
                    let handler_calls = Rc::clone(&handler_calls);
                    async move {
                        *handler_calls.borrow_mut() += 1;
                        Ok::<Value, std::convert::Infallible>(json!({ "count": param * 2 }))
                    }
                })
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            invoke(&slot, ()).await.unwrap();

            assert_eq!(orchestrator.state(), json!({ "count": 6 }));
            assert_eq!(*calls.borrow(), 1);
        })
        .await;
}

#[tokio::test]
async fn handler_receives_the_pre_transition_merged_state() {
    LocalSet::new()
        .run_until(async {
            let (view, _seen) = recording_view();
            let observed = Rc::new(RefCell::new(None));
            let handler_observed = Rc::clone(&observed);

            let (registration, slot) = capture_async::<(), Value>();
            let registration = registration.with_transition(|_args| {
                StateTask::modify(|state: Value| state.apply(&json!({ "count": 9 })))
                    .map(|_| Some(1))
            });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0, "label": "a" }))
                .structural_equality()
                .side_effect_handler(move |snapshot: Snapshot<Value>, _param: i64| {
                    let handler_observed = Rc::clone(&handler_observed);
                    async move {
                        *handler_observed.borrow_mut() = Some(snapshot.get());
                        Ok::<Value, std::convert::Infallible>(json!({}))
                    }
                })
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            invoke(&slot, ()).await.unwrap();

            assert_eq!(
                observed.borrow().clone(),
                Some(json!({ "count": 9, "label": "a" }))
            );
        })
        .await;
}

#[tokio::test]
async fn mount_commit_is_visible_before_any_callback_commit() {
    LocalSet::new()
        .run_until(async {
            let (view, seen) = recording_view();
            let (registration, slot) = capture_async::<(), Value>();
            let registration = registration.with_transition(|_args| {
                StateTask::modify(|state: Value| state.apply(&json!({ "count": 1 })))
                    .map(|_| None)
            });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .async_registration(registration)
                .on_mount(
                    StateTask::modify(|state: Value| state.apply(&json!({ "booted": true })))
                        .map(|_| None),
                )
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            invoke(&slot, ()).await.unwrap();

            let trace = orchestrator.trace();
            assert_eq!(trace.len(), 2);
            assert_eq!(trace.records()[0].to, json!({ "count": 0, "booted": true }));
            assert_eq!(
                trace.records()[1].to,
                json!({ "count": 1, "booted": true })
            );
            assert_eq!(seen.borrow()[0], json!({ "count": 0 }));
            assert_eq!(seen.borrow()[1], json!({ "count": 0, "booted": true }));
        })
        .await;
}

#[tokio::test]
async fn racing_transitions_commit_in_completion_order() {
    LocalSet::new()
        .run_until(async {
            let (view, _seen) = recording_view();

            let (registration_a, slot_a) = capture_async::<(), Value>();
            let (tx_a, rx_a) = tokio::sync::oneshot::channel::<()>();
            let rx_a = Rc::new(RefCell::new(Some(rx_a)));
            let registration_a = registration_a.with_transition(move |_args| {
                let rx = Rc::clone(&rx_a);
                StateTask::from_fn(move |snapshot: Snapshot<Value>| {
                    let rx = rx.borrow_mut().take().expect("transition A fires once");
                    async move {
                        rx.await.expect("gate A dropped");
                        ((), snapshot)
                    }
                })
                .and_then(|_| {
                    StateTask::modify(|state: Value| state.apply(&json!({ "a": 1 })))
                })
                .map(|_| None)
            });

            let (registration_b, slot_b) = capture_async::<(), Value>();
            let (tx_b, rx_b) = tokio::sync::oneshot::channel::<()>();
            let rx_b = Rc::new(RefCell::new(Some(rx_b)));
            let registration_b = registration_b.with_transition(move |_args| {
                let rx = Rc::clone(&rx_b);
                StateTask::from_fn(move |snapshot: Snapshot<Value>| {
                    let rx = rx.borrow_mut().take().expect("transition B fires once");
                    async move {
                        rx.await.expect("gate B dropped");
                        ((), snapshot)
                    }
                })
                .and_then(|_| {
                    StateTask::modify(|state: Value| state.apply(&json!({ "b": 2 })))
                })
                .map(|_| None)
            });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({}))
                .structural_equality()
                .async_registration(registration_a)
                .async_registration(registration_b)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            // A starts first, B second; both block on their gates.
            let pending_a = tokio::task::spawn_local(invoke(&slot_a, ()));
            let pending_b = tokio::task::spawn_local(invoke(&slot_b, ()));
            tokio::task::yield_now().await;

            // B resolves first, A second.
            tx_b.send(()).expect("transition B waiting");
            pending_b.await.unwrap().unwrap();
            tx_a.send(()).expect("transition A waiting");
            pending_a.await.unwrap().unwrap();

            // Both fields land; the canonical state reflects commit order.
            assert_eq!(orchestrator.state(), json!({ "a": 1, "b": 2 }));
            let trace = orchestrator.trace();
            assert_eq!(trace.records()[0].to, json!({ "b": 2 }));
            assert_eq!(trace.records()[1].to, json!({ "a": 1, "b": 2 }));
        })
        .await;
}

#[tokio::test]
async fn handler_failure_aborts_the_commit() {
    #[derive(Debug, thiserror::Error)]
    #[error("backend unavailable")]
    struct BackendDown;

    LocalSet::new()
        .run_until(async {
            let (view, seen) = recording_view();
            let (registration, slot) = capture_async::<(), Value>();
            let registration = registration.with_transition(|_args| {
                StateTask::modify(|state: Value| state.apply(&json!({ "count": 9 })))
                    .map(|_| Some(1))
            });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .side_effect_handler(|_snapshot: Snapshot<Value>, _param: i64| async move {
                    Err::<Value, BackendDown>(BackendDown)
                })
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            let error = invoke(&slot, ()).await.unwrap_err();

            assert!(matches!(error, OrchestratorError::HandlerFailed(_)));
            // No partial merge: the canonical state is exactly as before.
            assert_eq!(orchestrator.state(), json!({ "count": 0 }));
            assert_eq!(seen.borrow().len(), 1);
        })
        .await;
}

#[tokio::test]
async fn sync_callback_answers_from_locally_projected_state() {
    LocalSet::new()
        .run_until(async {
            let (view, _seen) = recording_view();
            let slot: Rc<RefCell<Option<SyncCallback<(i64,), i64>>>> =
                Rc::new(RefCell::new(None));

            let registration = SyncRegistration::<Value, i64, (i64,), i64>::new({
                let slot = Rc::clone(&slot);
                move |callback| {
                    *slot.borrow_mut() = Some(callback);
                }
            })
            .with_transition(|args: &(i64,)| {
                let n = args.0;
                StateFn::modify(move |state: Value| state.apply(&json!({ "count": n })))
                    .map(move |_| Some(n))
            })
            .with_return(|snapshot, _args| snapshot.get()["count"].as_i64().unwrap_or(-1));

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .side_effect_handler(|_snapshot: Snapshot<Value>, param: i64| async move {
                    Ok::<Value, std::convert::Infallible>(json!({ "doubled": param * 2 }))
                })
                .sync_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            let returned = slot.borrow().as_ref().expect("callback wired")((7,));

            // The synchronous answer reflects the candidate, not the funnel.
            assert_eq!(returned, Some(7));
            assert_eq!(orchestrator.state(), json!({ "count": 0 }));

            settle_background().await;
            assert_eq!(orchestrator.state(), json!({ "count": 7, "doubled": 14 }));
        })
        .await;
}

#[tokio::test]
async fn sync_pass_through_reports_the_current_state() {
    LocalSet::new()
        .run_until(async {
            let (view, _seen) = recording_view();
            let slot: Rc<RefCell<Option<SyncCallback<(), Value>>>> = Rc::new(RefCell::new(None));

            let registration = SyncRegistration::<Value, i64, (), Value>::new({
                let slot = Rc::clone(&slot);
                move |callback| {
                    *slot.borrow_mut() = Some(callback);
                }
            })
            .with_return(|snapshot, _args| snapshot.get());

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 4 }))
                .structural_equality()
                .sync_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            let reported = slot.borrow().as_ref().expect("callback wired")(());
            assert_eq!(reported, Some(json!({ "count": 4 })));
            assert_eq!(orchestrator.state(), json!({ "count": 4 }));
        })
        .await;
}

#[tokio::test]
async fn effect_trigger_routes_through_funnel_and_gate() {
    LocalSet::new()
        .run_until(async {
            let (view, seen) = recording_view();

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .structural_equality()
                .side_effect_handler(|_snapshot: Snapshot<Value>, param: i64| async move {
                    Ok::<Value, std::convert::Infallible>(json!({ "count": param * 2 }))
                })
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            let effects = orchestrator.effects();

            // Patch only: no parameter, so the handler stays silent.
            effects.trigger(Some(json!({ "label": "on" })), None);
            settle_background().await;
            assert_eq!(orchestrator.state(), json!({ "count": 0, "label": "on" }));

            // Parameter only: the handler's patch is folded in.
            effects.trigger(None, Some(5));
            settle_background().await;
            assert_eq!(orchestrator.state(), json!({ "count": 10, "label": "on" }));

            // A no-difference trigger is gated.
            let renders = seen.borrow().len();
            effects.trigger(Some(json!({})), None);
            settle_background().await;
            assert_eq!(seen.borrow().len(), renders);
        })
        .await;
}

#[tokio::test]
async fn dropped_orchestrator_rejects_async_callbacks() {
    LocalSet::new()
        .run_until(async {
            let (view, _seen) = recording_view();
            let (registration, slot) = capture_async::<(), Value>();
            let registration =
                registration.with_return(|snapshot: Snapshot<Value>| async move { snapshot.get() });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({}))
                .structural_equality()
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();
            drop(orchestrator);

            let error = invoke(&slot, ()).await.unwrap_err();
            assert!(matches!(error, OrchestratorError::Dropped));
        })
        .await;
}

#[tokio::test]
async fn custom_equality_decides_visibility() {
    LocalSet::new()
        .run_until(async {
            let (view, seen) = recording_view();
            let (registration, slot) = capture_async::<(), Value>();
            let registration = registration.with_transition(|_args| {
                StateTask::modify(|state: Value| state.apply(&json!({ "noise": "xyz" })))
                    .map(|_| None)
            });

            let mut orchestrator = OrchestratorBuilder::<Value, i64>::new()
                .view(view)
                .initial(json!({ "count": 0 }))
                .equality(StateEq::new(|a: &Value, b: &Value| a["count"] == b["count"]))
                .async_registration(registration)
                .build()
                .unwrap();
            orchestrator.mount().await.unwrap();

            invoke(&slot, ()).await.unwrap();

            // The candidate differs structurally but not under the predicate.
            assert_eq!(orchestrator.state(), json!({ "count": 0 }));
            assert_eq!(seen.borrow().len(), 1);
        })
        .await;
}
