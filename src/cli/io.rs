//! JSON output for the CLI
//!
//! One JSON object per command, written to the given writer (stdout in
//! production), followed by a newline.

use std::io::Write;

use serde::Serialize;
use serde_json::json;

use super::errors::CliResult;

/// Write a success envelope: `{"status":"ok","data":...}`
pub fn write_response<W: Write, T: Serialize>(out: &mut W, data: &T) -> CliResult<()> {
    let response = json!({
        "status": "ok",
        "data": data
    });
    write_line(out, &response)
}

/// Write an error envelope: `{"status":"error","code":...,"message":...}`
pub fn write_error<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = json!({
        "status": "error",
        "code": code,
        "message": message
    });
    write_line(out, &response)
}

fn write_line<W: Write>(out: &mut W, value: &serde_json::Value) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
