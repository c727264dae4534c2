use std::sync::mpsc::channel;
use std::thread;
use std::time::Duration;

use rdbgr_core::{
    parse_step_args, BreakpointSpec, DebugControl, DebugSettings, EventKind, NullEvaluator,
    StepRequest, StopReason, ThreadId, TraceEvent, UnwindSignal,
};

mod common;
use common::{event, frame};

const STOP_WAIT: Duration = Duration::from_millis(500);

fn run_events(
    control: &DebugControl,
    events: Vec<TraceEvent>,
) -> thread::JoinHandle<Result<(), UnwindSignal>> {
    let control = control.clone();
    thread::spawn(move || {
        for event in &events {
            control.dispatch(event, &mut NullEvaluator)?;
        }
        Ok(())
    })
}

fn settings() -> DebugSettings {
    DebugSettings {
        different_line: false,
    }
}

/// Stop at a line breakpoint first, so a step request can be installed from
/// a suspended state the way the command loop would.
fn control_with_breakpoint(file: &str, line: u32) -> DebugControl {
    let control = DebugControl::new(ThreadId(1));
    control.with_breakpoints(|manager| {
        manager
            .add_breakpoint(BreakpointSpec::line(file, line))
            .map(|bp| bp.id)
    })
    .unwrap();
    control
}

#[test]
fn bare_step_enters_the_callee() {
    let control = control_with_breakpoint("main.rs", 5);
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    let handle = run_events(&control, common::call_program());
    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Breakpoint(1));

    let request = parse_step_args("s", &[], &settings()).unwrap();
    let at = frame(1, "main", "main.rs", 5, 0, 1);
    control.install_step(ThreadId(1), request, Some(&at));

    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Step);
    assert_eq!(stop.function, "add");
    assert_eq!((stop.file.as_str(), stop.line), ("lib.rs", 1));

    control.continue_run();
    assert_eq!(handle.join().unwrap(), Ok(()));
}

#[test]
fn step_count_skips_qualifying_events() {
    let control = control_with_breakpoint("main.rs", 5);
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    let handle = run_events(&control, common::call_program());
    let _ = stop_rx.recv_timeout(STOP_WAIT).unwrap();

    // Stop on the second qualifying event after the breakpoint.
    let request = parse_step_args("step", &["2"], &settings()).unwrap();
    control.install_step(ThreadId(1), request, None);

    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Step);
    assert_eq!((stop.file.as_str(), stop.line), ("lib.rs", 2));

    control.continue_run();
    assert_eq!(handle.join().unwrap(), Ok(()));
}

#[test]
fn step_until_call_skips_line_events() {
    let control = control_with_breakpoint("main.rs", 5);
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    let handle = run_events(&control, common::call_program());
    let _ = stop_rx.recv_timeout(STOP_WAIT).unwrap();

    let request = parse_step_args("step>", &[], &settings()).unwrap();
    control.install_step(ThreadId(1), request, None);

    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Step);
    assert_eq!(stop.function, "add");

    control.continue_run();
    assert_eq!(handle.join().unwrap(), Ok(()));
}

#[test]
fn next_steps_over_the_call() {
    let control = control_with_breakpoint("main.rs", 5);
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    let handle = run_events(&control, common::call_program());
    let _ = stop_rx.recv_timeout(STOP_WAIT).unwrap();

    let at = frame(1, "main", "main.rs", 5, 0, 1);
    let request = StepRequest::next(
        &at,
        &DebugSettings {
            different_line: true,
        },
    );
    control.install_step(ThreadId(1), request, Some(&at));

    // Everything inside `add` is deeper than the issuing frame.
    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Step);
    assert_eq!((stop.file.as_str(), stop.line), ("main.rs", 6));

    control.continue_run();
    assert_eq!(handle.join().unwrap(), Ok(()));
}

#[test]
fn finish_stops_when_the_frame_returns() {
    let control = control_with_breakpoint("lib.rs", 2);
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    let handle = run_events(&control, common::call_program());
    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Breakpoint(1));
    assert_eq!(stop.function, "add");

    let at = frame(1, "add", "lib.rs", 2, 1, 2);
    control.install_step(ThreadId(1), StepRequest::finish(&at), Some(&at));

    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Finish);
    assert_eq!(stop.function, "main");

    control.continue_run();
    assert_eq!(handle.join().unwrap(), Ok(()));
}

#[test]
fn step_request_is_scoped_to_its_thread() {
    let control = DebugControl::new(ThreadId(1));
    control.register_thread(ThreadId(2));
    control.with_breakpoints(|manager| {
        manager
            .add_breakpoint(BreakpointSpec::line("a.rs", 5))
            .map(|bp| bp.id)
    })
    .unwrap();
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    let interleaved = vec![
        event(EventKind::Line, 1, "main", "a.rs", 5, 0, 1),
        // Events on the other thread arrive first after the resume.
        event(EventKind::Line, 2, "worker", "w.rs", 9, 0, 7),
        event(EventKind::Line, 2, "worker", "w.rs", 10, 0, 7),
        event(EventKind::Line, 1, "main", "a.rs", 6, 0, 1),
    ];
    let handle = run_events(&control, interleaved);
    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Breakpoint(1));

    let request = parse_step_args("s", &[], &settings()).unwrap();
    control.install_step(ThreadId(1), request, None);

    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Step);
    assert_eq!(stop.thread, ThreadId(1));
    assert_eq!((stop.file.as_str(), stop.line), ("a.rs", 6));

    control.continue_run();
    assert_eq!(handle.join().unwrap(), Ok(()));
}

#[test]
fn breakpoint_stop_cancels_an_installed_step() {
    let control = DebugControl::new(ThreadId(1));
    control.with_breakpoints(|manager| {
        manager
            .add_breakpoint(BreakpointSpec::function("add"))
            .map(|bp| bp.id)
    })
    .unwrap();
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    // A large step count would otherwise swallow every later event.
    let request = parse_step_args("step", &["100"], &settings()).unwrap();
    control.install_step(ThreadId(1), request, None);

    let handle = run_events(&control, common::call_program());
    let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
    assert_eq!(stop.reason, StopReason::Breakpoint(1));
    assert_eq!(stop.function, "add");

    control.continue_run();
    assert_eq!(handle.join().unwrap(), Ok(()));
    // The step request did not survive the breakpoint stop.
    assert_eq!(control.drain_stops().len(), 1);
}

#[test]
fn entry_breakpoint_under_recursion_stops_per_activation() {
    let control = DebugControl::new(ThreadId(1));
    control.with_breakpoints(|manager| {
        manager
            .add_breakpoint(BreakpointSpec::function("fact"))
            .map(|bp| bp.id)
    })
    .unwrap();
    let (stop_tx, stop_rx) = channel();
    control.set_stop_sender(stop_tx);

    // fact(2) -> fact(1), one fresh activation per call.
    let recursion = vec![
        event(EventKind::Call, 1, "fact", "fact.rs", 1, 0, 10),
        event(EventKind::Line, 1, "fact", "fact.rs", 2, 0, 10),
        event(EventKind::Call, 1, "fact", "fact.rs", 1, 1, 11),
        event(EventKind::Line, 1, "fact", "fact.rs", 2, 1, 11),
        event(EventKind::Return, 1, "fact", "fact.rs", 3, 1, 11),
        event(EventKind::Return, 1, "fact", "fact.rs", 3, 0, 10),
    ];
    let handle = run_events(&control, recursion);

    for expected_activation in ["outer", "inner"] {
        let stop = stop_rx.recv_timeout(STOP_WAIT).unwrap();
        assert_eq!(
            stop.reason,
            StopReason::Breakpoint(1),
            "missing stop for {expected_activation} call"
        );
        control.continue_run();
    }
    assert_eq!(handle.join().unwrap(), Ok(()));
    // Two stops total: once per activation, never twice within one.
    assert_eq!(control.drain_stops().len(), 2);
}
