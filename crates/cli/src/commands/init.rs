use anyhow::bail;
use ember_kernel::{BootKind, PowerFault};
use ember_persistence::MappedStore;
use std::path::Path;

use crate::demo;

pub fn run(nvm: &Path, force: bool) -> anyhow::Result<()> {
    if nvm.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", nvm.display());
    }

    let words = demo::nvm_words()?;
    let store = MappedStore::create(nvm, words)?;
    let mut rt = demo::runtime(PowerFault::new(store))?;

    match rt.initialize()? {
        BootKind::Cold => tracing::info!(path = %nvm.display(), words, "cold-initialized NVM"),
        BootKind::Warm => tracing::warn!(path = %nvm.display(), "NVM was already initialized"),
    }

    println!("Initialized {} ({} words, {} bytes)", nvm.display(), words, words * 4);
    Ok(())
}
