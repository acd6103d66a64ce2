//! Check command implementation.
//!
//! Compiles a query against a schema without reading any records.

use std::path::Path;

use owo_colors::OwoColorize;
use recfilter::record::json::JsonRecord;
use recfilter::FilterCompiler;

use super::config::load_config;
use super::{CommandContext, Result};
use crate::schema::load_schema;

/// Executes the check command.
pub fn execute(ctx: &CommandContext, schema: &Path, query: &str) -> Result<()> {
    let record_type = load_schema(schema)?;
    let compiler =
        FilterCompiler::<JsonRecord>::with_record_type(record_type).with_config(load_config()?);
    let filter = compiler.try_compile(query)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "query": query,
            "record_type": compiler.record_type().name(),
            "condition": filter.to_string(),
            "unrestricted": filter.is_unrestricted(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        let header = format!("Valid query for {}", compiler.record_type().name());
        if ctx.use_colors {
            println!("{}", header.green().bold());
        } else {
            println!("{}", header);
        }
        if filter.is_unrestricted() {
            println!("(matches every record)");
        } else {
            println!("{filter}");
        }
    }

    Ok(())
}
