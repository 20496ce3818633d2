//! Real-time setup helpers and absolute-deadline timing.
//!
//! No-ops unless the `rt` feature is enabled, so the send-loop can be
//! developed and tested on a non-realtime workstation kernel.

use crate::error::RtError;

/// Lock all current and future memory pages.
#[cfg(feature = "rt")]
fn rt_mlockall() -> Result<(), RtError> {
    use nix::sys::mman::{mlockall, MlockallFlags};
    mlockall(MlockallFlags::MCL_CURRENT | MlockallFlags::MCL_FUTURE)
        .map_err(|e| RtError::Setup(format!("mlockall failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_mlockall() -> Result<(), RtError> {
    Ok(())
}

/// Touch a chunk of stack to prefault its pages before entering the loop.
fn prefault_stack() {
    let mut buf = [0u8; 256 * 1024];
    for byte in buf.iter_mut() {
        unsafe { core::ptr::write_volatile(byte, 0xFF) };
    }
    core::hint::black_box(&buf);
}

#[cfg(feature = "rt")]
fn rt_set_affinity(cpu: usize) -> Result<(), RtError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    cpuset
        .set(cpu)
        .map_err(|e| RtError::Setup(format!("CpuSet::set({cpu}) failed: {e}")))?;
    sched_setaffinity(Pid::from_raw(0), &cpuset)
        .map_err(|e| RtError::Setup(format!("sched_setaffinity failed: {e}")))
}

#[cfg(not(feature = "rt"))]
fn rt_set_affinity(_cpu: usize) -> Result<(), RtError> {
    Ok(())
}

#[cfg(feature = "rt")]
fn rt_set_scheduler(priority: i32) -> Result<(), RtError> {
    let param = libc::sched_param { sched_priority: priority };
    let ret = unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) };
    if ret != 0 {
        let err = std::io::Error::last_os_error();
        return Err(RtError::Setup(format!(
            "sched_setscheduler(SCHED_FIFO, {priority}) failed: {err}"
        )));
    }
    Ok(())
}

#[cfg(not(feature = "rt"))]
fn rt_set_scheduler(_priority: i32) -> Result<(), RtError> {
    Ok(())
}

/// Full RT setup sequence for the send-loop thread: lock memory, prefault
/// the stack, pin to a CPU core and request `SCHED_FIFO`. All steps are
/// no-ops without the `rt` feature.
pub fn rt_setup(cpu_core: usize, rt_priority: i32) -> Result<(), RtError> {
    rt_mlockall()?;
    prefault_stack();
    rt_set_affinity(cpu_core)?;
    rt_set_scheduler(rt_priority)?;
    Ok(())
}

/// Absolute-deadline sleep on `CLOCK_MONOTONIC`, advancing `deadline` by
/// `period_ns` and blocking until it. Falls back to relative
/// `std::thread::sleep` without the `rt` feature, which is adequate for
/// development but accumulates drift under scheduling jitter.
#[cfg(feature = "rt")]
pub fn sleep_until_next_tick(deadline: &mut nix::sys::time::TimeSpec, period_ns: i64) {
    use nix::time::{clock_nanosleep, ClockId, ClockNanosleepFlags};

    *deadline = timespec_add_ns(*deadline, period_ns);
    let _ = clock_nanosleep(ClockId::CLOCK_MONOTONIC, ClockNanosleepFlags::TIMER_ABSTIME, deadline);
}

#[cfg(not(feature = "rt"))]
pub fn sleep_until_next_tick(deadline: &mut std::time::Instant, period_ns: i64) {
    *deadline += std::time::Duration::from_nanos(period_ns as u64);
    let now = std::time::Instant::now();
    if *deadline > now {
        std::thread::sleep(*deadline - now);
    }
}

#[cfg(feature = "rt")]
pub fn monotonic_now() -> nix::sys::time::TimeSpec {
    nix::time::clock_gettime(nix::time::ClockId::CLOCK_MONOTONIC)
        .expect("CLOCK_MONOTONIC must be available")
}

#[cfg(not(feature = "rt"))]
pub fn monotonic_now() -> std::time::Instant {
    std::time::Instant::now()
}

#[cfg(feature = "rt")]
fn timespec_add_ns(ts: nix::sys::time::TimeSpec, ns: i64) -> nix::sys::time::TimeSpec {
    use nix::sys::time::TimeSpec;
    let mut secs = ts.tv_sec();
    let mut nanos = ts.tv_nsec() + ns;
    while nanos >= 1_000_000_000 {
        secs += 1;
        nanos -= 1_000_000_000;
    }
    while nanos < 0 {
        secs -= 1;
        nanos += 1_000_000_000;
    }
    TimeSpec::new(secs, nanos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rt_setup_is_noop_without_rt_feature() {
        #[cfg(not(feature = "rt"))]
        {
            assert!(rt_setup(0, 80).is_ok());
        }
    }
}
