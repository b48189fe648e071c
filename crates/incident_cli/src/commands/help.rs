//! Help-commands command - Print the chat command table.

use anyhow::Result;
use incident_core::{CommandTable, IncidentConfig};

pub fn execute(config: &IncidentConfig) -> Result<()> {
    let table = CommandTable::standard(config);
    println!("{}", table.help());
    Ok(())
}
