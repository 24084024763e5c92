use anyhow::bail;
use ember_kernel::DurableStore;
use ember_persistence::{load_image, restore_into, MappedStore};
use std::path::Path;

pub fn run(image: &Path, nvm: &Path) -> anyhow::Result<()> {
    let words = load_image(image)?;

    let mut store = if nvm.exists() {
        let store = MappedStore::open(nvm)?;
        if store.capacity_words() != words.len() {
            bail!(
                "image holds {} words but {} holds {}",
                words.len(),
                nvm.display(),
                store.capacity_words()
            );
        }
        store
    } else {
        MappedStore::create(nvm, words.len())?
    };

    restore_into(&mut store, &words)?;

    tracing::info!(image = %image.display(), nvm = %nvm.display(), "restored NVM image");
    println!("Restored {} words into {}", words.len(), nvm.display());
    Ok(())
}
