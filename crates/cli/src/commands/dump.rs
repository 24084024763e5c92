use ember_persistence::{save_image, MappedStore};
use std::path::Path;

pub fn run(nvm: &Path, image: &Path) -> anyhow::Result<()> {
    let store = MappedStore::open(nvm)?;
    let header = save_image(image, &store.to_words())?;

    tracing::info!(image = %image.display(), words = header.word_count, "saved NVM image");
    println!(
        "Saved {} words to {} (crc64 {:016x})",
        header.word_count,
        image.display(),
        header.checksum
    );
    Ok(())
}
