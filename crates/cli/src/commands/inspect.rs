use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use ember_kernel::context::ContextRecord;
use ember_kernel::layout::Layout;
use ember_kernel::verify::{report, StateReport};
use ember_persistence::MappedStore;
use serde::Serialize;
use std::path::Path;

use crate::demo;

#[derive(Debug, Clone, Serialize)]
pub struct ContextView {
    pub task: u32,
    pub need_commit: bool,
    pub state: &'static str,
}

/// Serializable form of the kernel's state report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    pub initialized: bool,
    pub index: u32,
    pub new_index: u32,
    pub need_commit: bool,
    pub commit_state: &'static str,
    pub curctx: u32,
    pub curtsk: u32,
    pub contexts: Vec<ContextView>,
    pub dirty_len: u32,
    pub dirty_overflow: bool,
    pub active_digest: String,
    pub working_digest: String,
    pub first_difference: Option<u32>,
}

impl From<&ContextRecord> for ContextView {
    fn from(record: &ContextRecord) -> Self {
        Self {
            task: record.task.0,
            need_commit: record.need_commit,
            state: record.state.as_str(),
        }
    }
}

impl From<StateReport> for ReportView {
    fn from(r: StateReport) -> Self {
        Self {
            initialized: r.initialized,
            index: r.index,
            new_index: r.new_index,
            need_commit: r.need_commit,
            commit_state: r.commit_state.as_str(),
            curctx: r.curctx.to_word(),
            curtsk: r.curtsk.0,
            contexts: r.contexts.iter().map(ContextView::from).collect(),
            dirty_len: r.dirty_len,
            dirty_overflow: r.dirty_overflow,
            active_digest: hex(&r.active_digest),
            working_digest: hex(&r.working_digest),
            first_difference: r.first_difference,
        }
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn load(nvm: &Path) -> anyhow::Result<ReportView> {
    let store = MappedStore::open(nvm)?;
    let layout = Layout::from_config(&demo::config())?;
    layout.check_fits(ember_kernel::DurableStore::capacity_words(&store))?;
    Ok(report(&store, &layout).into())
}

pub fn run(nvm: &Path, json: bool) -> anyhow::Result<()> {
    let view = load(nvm)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!("\nEmber State Report");
    println!("------------------");

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Field", "Value"]);

    let yes_no = |b: bool| (if b { "yes" } else { "no" }).to_string();

    table.add_row(vec!["Initialized".to_string(), yes_no(view.initialized)]);
    table.add_row(vec!["Active index".to_string(), view.index.to_string()]);
    table.add_row(vec!["New index".to_string(), view.new_index.to_string()]);
    table.add_row(vec!["Need commit".to_string(), yes_no(view.need_commit)]);
    table.add_row(vec!["Commit state".to_string(), view.commit_state.to_string()]);
    table.add_row(vec!["Current context".to_string(), view.curctx.to_string()]);
    table.add_row(vec!["Current task".to_string(), view.curtsk.to_string()]);
    for (i, ctx) in view.contexts.iter().enumerate() {
        table.add_row(vec![
            format!("Context {}", i),
            format!(
                "task {}, {}, need_commit {}",
                ctx.task,
                ctx.state,
                yes_no(ctx.need_commit)
            ),
        ]);
    }
    table.add_row(vec![
        "Dirty list".to_string(),
        if view.dirty_overflow {
            format!("{} entries (overflowed)", view.dirty_len)
        } else {
            format!("{} entries", view.dirty_len)
        },
    ]);
    table.add_row(vec!["Active digest".to_string(), view.active_digest.clone()]);
    table.add_row(vec!["Working digest".to_string(), view.working_digest.clone()]);
    table.add_row(vec![
        "Buffers".to_string(),
        match view.first_difference {
            None => "identical".to_string(),
            Some(offset) => format!("differ from word {}", offset),
        },
    ]);

    println!("{}", table);
    Ok(())
}
