//! Fuzz target for log sinks under injected failures
//!
//! Random append/all/clear sequences against `ChaoticLog<MemoryLog>`,
//! checked against a plain `Vec` model.
//!
//! # Invariants
//!
//! - Failed operations leave the stored lines untouched
//! - Successful appends land at the end, in order
//! - `all` never returns lines that were not successfully appended

#![no_main]

use arbitrary::Arbitrary;
use chorus_server::{ChaoticLog, LogSink, MemoryLog};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Clone, Arbitrary)]
struct Scenario {
    seed: u64,
    /// 0-9 maps to 0%-90%
    failure_rate_tenth: u8,
    ops: Vec<Op>,
}

#[derive(Debug, Clone, Arbitrary)]
enum Op {
    Append(String),
    All,
    Clear,
}

fuzz_target!(|scenario: Scenario| {
    let rate = f64::from(scenario.failure_rate_tenth % 10) / 10.0;
    let log = ChaoticLog::with_seed(MemoryLog::new(), rate, scenario.seed);
    let mut model: Vec<String> = Vec::new();

    for op in scenario.ops.into_iter().take(256) {
        match op {
            Op::Append(line) => {
                if log.append(&line).is_ok() {
                    model.push(line);
                }
            },
            Op::All => {
                if let Ok(lines) = log.all() {
                    assert_eq!(lines, model);
                }
            },
            Op::Clear => {
                if log.clear().is_ok() {
                    model.clear();
                }
            },
        }

        assert_eq!(log.inner().all().expect("memory log never fails"), model);
    }
});
