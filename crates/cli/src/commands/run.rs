use anyhow::bail;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use ember_kernel::verify::check_invariants;
use ember_kernel::{KernelError, PowerFault};
use ember_persistence::MappedStore;
use serde::Serialize;
use std::path::Path;

use crate::demo;

/// Consecutive power failures without a completed step before giving up.
const MAX_STALLED_FAILURES: u64 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub steps: usize,
    pub power_failures: u64,
    pub counter: u32,
    pub checks: u32,
    pub next_task: u32,
}

pub fn run(nvm: &Path, steps: usize, fail_every: Option<u64>) -> anyhow::Result<RunSummary> {
    if fail_every == Some(0) {
        bail!("--fail-every must be at least 1");
    }

    let mut store = PowerFault::new(MappedStore::open(nvm)?);
    if let Some(k) = fail_every {
        store.fail_after(k);
    }
    let mut rt = demo::runtime(store)?;

    let mut completed = 0usize;
    let mut failures = 0u64;
    let mut stalled = 0u64;
    let mut baseline: Option<u32> = None;
    let mut booted = false;

    while completed < steps || !booted {
        let outcome = if booted {
            rt.step().map(|_| ())
        } else {
            rt.boot().map(|_| ())
        };

        match outcome {
            Ok(()) => {
                booted = true;
                // A handoff whose commit landed counts even if power was lost
                // before `step` returned; the settled state says what happened.
                let now = demo::handoffs(&rt);
                let start = *baseline.get_or_insert(now);
                let done = now.wrapping_sub(start) as usize;
                if done > completed {
                    completed = done;
                    stalled = 0;
                }
            }
            Err(KernelError::PowerLoss) => {
                failures += 1;
                stalled += 1;
                if stalled > MAX_STALLED_FAILURES {
                    bail!(
                        "no forward progress: {} power failures in a row without a completed step",
                        stalled
                    );
                }
                tracing::info!(failures, completed, "power lost, rebooting");

                let mut store = rt.into_store();
                store.reboot();
                if let Some(k) = fail_every {
                    store.fail_after(k);
                }
                rt = demo::runtime(store)?;
                booted = false;
            }
            Err(e) => return Err(e.into()),
        }
    }

    check_invariants(rt.store(), rt.layout())?;

    let summary = RunSummary {
        steps: completed,
        power_failures: failures,
        counter: demo::committed(&rt, demo::COUNTER),
        checks: demo::committed(&rt, demo::CHECKS),
        next_task: rt.current_task().0,
    };
    print_summary(&summary);
    Ok(summary)
}

fn print_summary(summary: &RunSummary) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Metric", "Value"]);

    table.add_row(vec!["Steps completed".to_string(), summary.steps.to_string()]);
    table.add_row(vec!["Power failures".to_string(), summary.power_failures.to_string()]);
    table.add_row(vec!["Counter".to_string(), summary.counter.to_string()]);
    table.add_row(vec!["Audits".to_string(), summary.checks.to_string()]);
    table.add_row(vec!["Next task".to_string(), summary.next_task.to_string()]);

    println!("{}", table);
}
