//! `ocrflow init`

use colored::Colorize;
use color_eyre::Result;
use of_core::init::{generate_ocrflow_structure, InitOptions};
use std::path::PathBuf;

pub async fn run(target_dir: PathBuf, force: bool, minimal: bool) -> Result<()> {
    let written = generate_ocrflow_structure(InitOptions {
        target_dir: target_dir.clone(),
        force,
        minimal,
    })
    .await?;

    println!(
        "{} .ocrflow in {}",
        "Initialized".green().bold(),
        target_dir.display()
    );
    for file in written {
        println!("  {file}");
    }
    println!(
        "\nSet {} and {} (or edit .ocrflow/config.toml), then point the agents at your endpoints.",
        of_core::config::loader::ENV_OCR_APP_ID.cyan(),
        of_core::config::loader::ENV_OCR_APP_KEY.cyan()
    );
    Ok(())
}
