//! `ocrflow agents`

use crate::project;
use colored::Colorize;
use color_eyre::Result;
use std::path::Path;

pub async fn run(dir: &Path) -> Result<()> {
    let config = project::load(dir).await?;

    if config.agents.is_empty() {
        println!("No agents configured. Run `ocrflow init` to create samples.");
        return Ok(());
    }

    for agent in &config.agents {
        let roles = config.role_of(&agent.id);
        let roles = if roles.is_empty() {
            "unused".dimmed().to_string()
        } else {
            roles.join(", ").cyan().to_string()
        };
        println!("{}  {}  [{}]", agent.id.bold(), agent.name, roles);
        println!("    {}", agent.url.dimmed());
        if !agent.description.is_empty() {
            if let Some(first_line) = agent.description.lines().find(|l| !l.trim().is_empty()) {
                println!("    {}", first_line.trim());
            }
        }
    }
    Ok(())
}
