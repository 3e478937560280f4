//! Instrumented demo workload for trying out the statscope viewer.
//!
//! Run under the viewer:
//!
//! ```bash
//! cargo build --example busywork
//! statscope target/debug/examples/busywork
//! ```
//!
//! The workload loops forever, mixing cheap and expensive calls plus a
//! recursive one, so the live report has something to show at every refresh.

use std::time::Duration;

fn main() {
    statscope_runtime::init();
    loop {
        tick();
    }
}

fn tick() {
    statscope_runtime::profile_span!("tick");
    parse_input();
    for _ in 0..3 {
        transform();
    }
    fibonacci(18);
    idle_wait();
}

fn parse_input() {
    statscope_runtime::profile_span!("parse_input");
    let text: String = (0..200).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
    std::hint::black_box(text.split('m').count());
}

fn transform() {
    statscope_runtime::profile_span!("transform");
    let mut acc: u64 = 0x9e37;
    for i in 0..60_000u64 {
        acc = acc.wrapping_mul(31).wrapping_add(i);
    }
    std::hint::black_box(acc);
}

fn fibonacci(n: u64) -> u64 {
    statscope_runtime::profile_span!("fibonacci");
    if n < 2 {
        n
    } else {
        fibonacci(n - 1) + fibonacci(n - 2)
    }
}

fn idle_wait() {
    statscope_runtime::profile_span!("idle_wait");
    std::thread::sleep(Duration::from_millis(50));
}
