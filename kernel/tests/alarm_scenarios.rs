//! Tests d'intégration de l'alarme
//!
//! Every scenario boots a kernel and lets the simulated clock run, so the
//! wakeups come from real timer interrupts rather than direct handler calls.

use std::sync::Arc;

use alarm_kernel::scheduler::{SimThread, MAIN_THREAD};
use alarm_kernel::{
    kernel_init, AlarmConfig, AlarmService, InterruptControl, Kernel, Platform, SimMachine,
    ThreadHandle, ThreadId, ThreadState, ThreadSystem, TimerHandler,
};
use static_assertions::assert_impl_all;

assert_impl_all!(SimThread: Send, Sync, Clone);
assert_impl_all!(SimMachine: Send, Sync, Platform);
assert_impl_all!(AlarmService<Arc<SimMachine>>: Send, Sync, TimerHandler);
assert_impl_all!(AlarmConfig: Copy, Default);

fn boot(interval: u64) -> Kernel {
    kernel_init(AlarmConfig::new().with_timer_interval(interval)).unwrap()
}

/// Yield until `id` owns the CPU
fn run(kernel: &Kernel, id: ThreadId) {
    for _ in 0..64 {
        if kernel.current_thread_id() == id {
            return;
        }
        kernel.machine().scheduler().yield_current();
    }
    panic!("thread {} never got the CPU", id);
}

#[test]
fn test_two_buckets_fifo() {
    let kernel = boot(10);
    let a = kernel.spawn("a").id();
    let b = kernel.spawn("b").id();
    let c = kernel.spawn("c").id();

    run(&kernel, a);
    kernel.wait_until(10);
    run(&kernel, b);
    kernel.wait_until(10);
    run(&kernel, c);
    kernel.wait_until(20);
    assert_eq!(kernel.alarm().pending_threads(), 3);

    assert_eq!(kernel.advance(10), 1);
    assert_eq!(kernel.machine().wake_log(), vec![a, b]);
    assert_eq!(kernel.machine().thread_state(c), Some(ThreadState::Blocked));
    assert_eq!(kernel.alarm().next_deadline(), Some(20));

    assert_eq!(kernel.advance(10), 1);
    assert_eq!(kernel.machine().wake_log(), vec![a, b, c]);
    assert_eq!(kernel.alarm().pending_threads(), 0);

    let stats = kernel.stats();
    assert_eq!(stats.sleeps, 3);
    assert_eq!(stats.wakeups, 3);
    assert_eq!(stats.buckets_drained, 2);
    kernel.shutdown();
}

#[test]
fn test_wakeup_rounded_up_to_timer_period() {
    let kernel = boot(50);
    kernel.advance(30);
    kernel.wait_until(25);
    assert_eq!(kernel.alarm().sleeping_until(MAIN_THREAD), Some(55));

    // 50 is early, 100 is the first interrupt past the deadline
    kernel.machine().run_until(99);
    assert_eq!(kernel.machine().thread_state(MAIN_THREAD), Some(ThreadState::Blocked));
    kernel.machine().run_until(100);
    assert_eq!(kernel.current_thread_id(), MAIN_THREAD);
    assert_eq!(kernel.machine().thread_state(MAIN_THREAD), Some(ThreadState::Running));
    kernel.shutdown();
}

#[test]
fn test_zero_delay_wakes_on_next_interrupt() {
    let kernel = boot(10);
    kernel.advance(3);
    kernel.wait_until(0);
    assert!(kernel.alarm().is_sleeping(MAIN_THREAD));

    assert_eq!(kernel.advance(7), 1);
    assert!(!kernel.alarm().is_sleeping(MAIN_THREAD));
    assert_eq!(kernel.current_thread_id(), MAIN_THREAD);
    kernel.shutdown();
}

#[test]
fn test_masked_interrupt_delays_wakeup() {
    let kernel = boot(10);
    let a = kernel.spawn("a").id();
    run(&kernel, a);
    kernel.wait_until(5);

    let saved = kernel.machine().disable();
    assert_eq!(kernel.advance(12), 0);
    assert_eq!(kernel.machine().thread_state(a), Some(ThreadState::Blocked));
    kernel.machine().restore(saved);

    // The pending interrupt lands on the first unmasked tick
    assert_eq!(kernel.advance(1), 1);
    assert_eq!(kernel.machine().wake_log(), vec![a]);
    assert_eq!(kernel.machine().timer().stats().deferred, 3);
    kernel.shutdown();
}

#[test]
fn test_terminated_sleeper_is_skipped() {
    let kernel = boot(10);
    let a = kernel.spawn("a").id();
    let b = kernel.spawn("b").id();
    run(&kernel, a);
    kernel.wait_until(10);
    run(&kernel, b);
    kernel.wait_until(10);
    kernel.machine().terminate(a);

    kernel.advance(10);
    assert_eq!(kernel.machine().wake_log(), vec![b]);
    assert_eq!(kernel.stats().skipped, 1);
    assert_eq!(kernel.machine().thread_state(a), Some(ThreadState::Terminated));
    kernel.shutdown();
}

#[test]
fn test_many_sleepers_all_wake() {
    let kernel = boot(7);
    let ids: Vec<ThreadId> = (0..20).map(|_| kernel.spawn("worker").id()).collect();
    for (i, &id) in ids.iter().enumerate() {
        run(&kernel, id);
        kernel.wait_until((i as i64 * 13) % 50);
    }
    assert_eq!(kernel.alarm().pending_threads(), ids.len());
    kernel.alarm().check_invariants().unwrap();

    kernel.advance(60);
    assert_eq!(kernel.alarm().pending_threads(), 0);
    let mut woken = kernel.machine().wake_log();
    woken.sort_unstable();
    assert_eq!(woken, ids);
    assert!(kernel.machine().interrupts().are_enabled());
    kernel.shutdown();
}

#[test]
fn test_boot_is_logged() {
    let kernel = boot(10);
    let history = alarm_kernel::logger::recent();
    assert!(history.iter().any(|line| line.contains("[BOOT] Timer armed")));
    kernel.shutdown();
}
