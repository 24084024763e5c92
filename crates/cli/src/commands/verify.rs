use ember_kernel::layout::Layout;
use ember_kernel::verify::{check_invariants, region_digest};
use ember_kernel::StateManager;
use ember_persistence::MappedStore;
use std::path::Path;

use crate::demo;

pub fn run(nvm: &Path) -> anyhow::Result<()> {
    let store = MappedStore::open(nvm)?;
    let layout = Layout::from_config(&demo::config())?;
    layout.check_fits(ember_kernel::DurableStore::capacity_words(&store))?;

    match check_invariants(&store, &layout) {
        Ok(()) => {
            let manager = StateManager::new(layout);
            let digest = region_digest(&store, manager.active_region(&store));
            println!("\n✅ VERIFIED\n");
            println!("Active buffer: {}", manager.index(&store));
            print!("Digest:        ");
            for b in &digest[..8] {
                print!("{:02x}", b);
            }
            println!("\n");
            Ok(())
        }
        Err(e) => {
            println!("\n❌ INCONSISTENT\n");
            println!("Reason: {}", e);
            tracing::warn!(error = %e, path = %nvm.display(), "invariant check failed");
            Err(e.into())
        }
    }
}
