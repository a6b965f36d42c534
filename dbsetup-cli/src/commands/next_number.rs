//! Next-number command - version prefix for a hand-named migration
//!
//! Computed from the keys recorded in the database, not from the
//! registry's own numbering.

use anyhow::Result;

use super::get_context;

pub fn run(database: Option<&str>) -> Result<()> {
    let mut ctx = get_context(database)?;
    println!("{}", ctx.next_number()?);
    Ok(())
}
