//! Filter command implementation.
//!
//! Reads a JSON document, keeps the records matching a query, then orders
//! and pages them before printing the result as a JSON array. With `--json`
//! the array is wrapped in an envelope carrying the match counts.

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use owo_colors::OwoColorize;
use recfilter::record::json::JsonRecord;
use recfilter::{FilterCompiler, QueryExt, SortOrder};
use serde_json::Value as Json;
use tracing::debug;

use super::config::load_config;
use super::{CommandContext, Result};
use crate::schema::load_schema;

/// Options for the filter command.
#[derive(Debug)]
pub struct FilterOptions {
    /// Schema file describing the records.
    pub schema: PathBuf,
    /// Query text; blank matches every record.
    pub query: String,
    /// Dotted member paths to order by.
    pub order_by: Vec<String>,
    /// Reverse the ordering.
    pub descending: bool,
    /// Page number, starting at 1.
    pub page: Option<usize>,
    /// Records per page. No paging when absent.
    pub page_size: Option<usize>,
    /// Input document; stdin when absent.
    pub input: Option<PathBuf>,
}

/// Executes the filter command.
pub fn execute(ctx: &CommandContext, opts: &FilterOptions) -> Result<()> {
    let record_type = Arc::new(load_schema(&opts.schema)?);
    let config = Arc::new(load_config()?);
    let compiler = FilterCompiler::<JsonRecord>::with_record_type(Arc::clone(&record_type))
        .with_config(config.as_ref().clone());

    // Compile everything before touching the input.
    let filter = compiler.try_compile(&opts.query)?;
    let order = build_order(&compiler, opts)?;

    let document = read_document(opts.input.as_deref())?;
    let records = JsonRecord::from_document_with_config(document, record_type, config);
    let total = records.len();

    let matched: Vec<&JsonRecord> = records.iter().filter_by(&filter).collect();
    let matched_count = matched.len();
    debug!(total, matched = matched_count, "filtered records");

    let ordered: Vec<&JsonRecord> = match &order {
        Some(order) => matched.into_iter().order_with(order).collect(),
        None => matched,
    };

    let page: Vec<&Json> = match opts.page_size {
        Some(page_size) => ordered
            .into_iter()
            .page_by(opts.page.unwrap_or(1), page_size)
            .map(JsonRecord::json)
            .collect(),
        None => ordered.into_iter().map(JsonRecord::json).collect(),
    };

    let mut stdout = io::stdout().lock();
    if ctx.json_output {
        let output = serde_json::json!({
            "query": opts.query,
            "total": total,
            "matched": matched_count,
            "returned": page.len(),
            "records": page,
        });
        serde_json::to_writer_pretty(&mut stdout, &output)?;
    } else {
        serde_json::to_writer_pretty(&mut stdout, &page)?;
    }
    writeln!(stdout)?;

    if !ctx.json_output && !ctx.quiet {
        let summary = format!("{matched_count} of {total} records matched");
        if ctx.use_colors {
            eprintln!("{}", summary.dimmed());
        } else {
            eprintln!("{summary}");
        }
    }
    Ok(())
}

fn build_order(
    compiler: &FilterCompiler<JsonRecord>,
    opts: &FilterOptions,
) -> Result<Option<SortOrder<JsonRecord>>> {
    if opts.order_by.is_empty() {
        return Ok(None);
    }
    let order = if opts.descending {
        compiler.order_by_descending(&opts.order_by)?
    } else {
        compiler.order_by(&opts.order_by)?
    };
    Ok(Some(order))
}

/// Reads the input document from a file, or from stdin when no path is given.
fn read_document(input: Option<&Path>) -> Result<Json> {
    let document: Json = match input {
        Some(path) => {
            debug!(path = %path.display(), "reading input");
            serde_json::from_reader(BufReader::new(File::open(path)?))?
        }
        None => {
            debug!("reading input from stdin");
            serde_json::from_reader(io::stdin().lock())?
        }
    };
    Ok(document)
}
