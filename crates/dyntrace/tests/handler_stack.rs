//! Tests for the per-thread handler and caught-error stacks.
//!
//! Covers push/pop balance across nested handler bodies (including bodies that
//! raise), per-thread isolation, interrupt clearing on unwind, and the
//! empty-stack behavior of `current()`.

use std::thread;

use dyntrace::{
    AbortReason, DiagError, DiagEvent, ErrorClass, ErrorRef, InternalFault, RecordingTracer, ThreadDiagnosticContext,
};
use pretty_assertions::assert_eq;

/// Runs `depth` nested handler bodies; the innermost one raises a new error.
fn nested_handlers(ctx: &mut ThreadDiagnosticContext, depth: usize) -> Result<(), ErrorRef> {
    if depth == 0 {
        return Err(ErrorRef::new(ErrorClass::Script, Some("raised inside handler".to_owned())));
    }
    let error = ErrorRef::new(ErrorClass::Script, None);
    ctx.with_handler(error, |ctx| {
        assert_eq!(ctx.handlers().depth(), ctx.active_errors().len());
        nested_handlers(ctx, depth - 1)
    })
    .expect("handler stack is balanced")
}

// =============================================================================
// 1. Balance
// =============================================================================

#[test]
fn nested_handlers_leave_stack_empty() {
    let mut ctx = ThreadDiagnosticContext::new();
    let raised = nested_handlers(&mut ctx, 5);
    assert!(raised.is_err(), "innermost handler body raised");
    assert!(ctx.handlers().is_empty());
}

#[test]
fn push_pop_events_are_strictly_nested() {
    let mut ctx = ThreadDiagnosticContext::with_tracer(RecordingTracer::new());
    let outer = ErrorRef::new(ErrorClass::Host, None);
    let inner = ErrorRef::new(ErrorClass::Script, None);

    let result = ctx.with_handler(outer.clone(), |ctx| {
        let popped = ctx.with_handler(inner.clone(), |ctx| ctx.active_errors().to_vec());
        popped.map(|active| active.len())
    });

    assert_eq!(result, Ok(Ok(2)));
    assert_eq!(
        ctx.tracer().events(),
        &[
            DiagEvent::HandlerPush { depth: 1 },
            DiagEvent::HandlerPush { depth: 2 },
            DiagEvent::HandlerPop { depth: 1 },
            DiagEvent::HandlerPop { depth: 0 },
        ]
    );
}

#[test]
fn each_thread_has_its_own_stack() {
    let handles: Vec<_> = (1..=4)
        .map(|depth| {
            thread::spawn(move || {
                let mut ctx = ThreadDiagnosticContext::new();
                let error = ErrorRef::new(ErrorClass::Script, None);
                ctx.push(error.clone());
                let _ = nested_handlers(&mut ctx, depth);
                let depth_before_pop = ctx.handlers().depth();
                let popped = ctx.pop().expect("one handler still active");
                assert_eq!(popped, error);
                (depth_before_pop, ctx.handlers().is_empty())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (1, true));
    }
}

#[test]
fn pop_without_push_is_internal_fault() {
    let mut ctx = ThreadDiagnosticContext::with_tracer(RecordingTracer::new());
    assert_eq!(
        ctx.pop().unwrap_err(),
        DiagError::Internal(InternalFault::HandlerStackUnderflow)
    );
    assert_eq!(
        ctx.tracer().events(),
        &[DiagEvent::Fault(InternalFault::HandlerStackUnderflow)]
    );
}

// =============================================================================
// 2. Cooperative cancellation
// =============================================================================

#[test]
fn popping_interrupt_clears_pending_flag() {
    let mut ctx = ThreadDiagnosticContext::with_tracer(RecordingTracer::new());
    let remote = ctx.interrupt_handle();
    thread::spawn(move || remote.request()).join().unwrap();
    assert!(ctx.interrupt_pending());

    let abort = ErrorRef::new(ErrorClass::Abort(AbortReason::Interrupt), None);
    ctx.push(abort.clone());
    assert!(ctx.interrupt_pending(), "flag stays set while the handler runs");
    assert_eq!(ctx.pop().unwrap(), abort);

    assert!(!ctx.interrupt_pending());
    assert!(ctx.tracer().events().contains(&DiagEvent::InterruptCleared));
}

#[test]
fn popping_other_errors_leaves_flag_untouched() {
    for class in [
        ErrorClass::Script,
        ErrorClass::Host,
        ErrorClass::Abort(AbortReason::Shutdown),
    ] {
        let mut ctx = ThreadDiagnosticContext::new();
        ctx.interrupt_handle().request();
        ctx.push(ErrorRef::new(class, None));
        ctx.pop().unwrap();
        assert!(ctx.interrupt_pending(), "{class} must not clear the interrupt");
    }
}

#[test]
fn interrupt_without_pending_flag_is_harmless() {
    let mut ctx = ThreadDiagnosticContext::with_tracer(RecordingTracer::new());
    ctx.with_handler(ErrorRef::new(ErrorClass::Abort(AbortReason::Interrupt), None), |_| ())
        .unwrap();
    assert!(!ctx.interrupt_pending());
    assert!(!ctx.tracer().events().contains(&DiagEvent::InterruptCleared));
}

// =============================================================================
// 3. Current error
// =============================================================================

#[test]
fn current_on_fresh_thread_is_no_active_error() {
    let ctx = ThreadDiagnosticContext::new();
    assert_eq!(ctx.current().unwrap_err(), DiagError::NoActiveError);
}

#[test]
fn current_tracks_most_recently_caught() {
    let mut ctx = ThreadDiagnosticContext::new();
    let first = ErrorRef::new(ErrorClass::Script, None);
    let second = ErrorRef::new(ErrorClass::Host, None);

    ctx.record_caught(first.clone());
    ctx.push(first.clone());
    ctx.record_caught(second.clone());
    assert_eq!(ctx.current().unwrap(), second);

    // the handling stack is independent of the caught stack
    assert_eq!(ctx.pop().unwrap(), first);
    assert_eq!(ctx.current().unwrap(), second);

    assert_eq!(ctx.release_caught().unwrap(), second);
    assert_eq!(ctx.current().unwrap(), first);
    ctx.release_caught().unwrap();
    assert_eq!(ctx.current().unwrap_err(), DiagError::NoActiveError);
    assert_eq!(
        ctx.release_caught().unwrap_err(),
        DiagError::Internal(InternalFault::CaughtStackUnderflow)
    );
}
