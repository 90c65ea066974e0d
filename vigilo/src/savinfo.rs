use std::{fs::File, io::BufReader, path::Path};

use anyhow::Context;
use tracing::info;
use vigilo_core::binary::Deserializer;
use vigilo_package::compression::LzoDecompressor;
use vigilo_save::SaveGame;

pub fn save_info(filename: &Path) -> anyhow::Result<()> {
    info!(?filename, "Opening save game");
    let reader = BufReader::new(File::open(filename)?);
    let mut deserializer = Deserializer::new(reader)?;

    let save = SaveGame::read_to_end(&mut deserializer, &LzoDecompressor)
        .context("cannot read save game")?;
    println!("{save:#?}");

    Ok(())
}
