use crate::trace::write_trace;
use anyhow::{Context, Result};
use q3de_common::MatchDecision;
use q3de_core::MismatchDump;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Renders decisions as `e0 - e1, e2 - BOUNDARY`.
pub fn format_decisions(decisions: &[MatchDecision]) -> String {
    decisions
        .iter()
        .map(MatchDecision::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn write_dump<W: Write>(out: &mut W, dump: &MismatchDump) -> Result<()> {
    writeln!(out, "# mismatch in trial {}", dump.trial)?;
    write_trace(out, &dump.events)?;
    writeln!(out, "# streaming: {}", format_decisions(&dump.streaming))?;
    writeln!(out, "# batch: {}", format_decisions(&dump.batch))?;
    Ok(())
}

/// Writes every dump to `dir/trial_<n>.trace` and returns the paths written.
pub fn save_dumps<P: AsRef<Path>>(dir: P, dumps: &[MismatchDump]) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create dump directory {}", dir.display()))?;

    let mut written = Vec::with_capacity(dumps.len());
    for dump in dumps {
        let path = dir.join(format!("trial_{}.trace", dump.trial));
        let file =
            File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        write_dump(&mut out, dump)?;
        out.flush()?;
        written.push(path);
    }
    Ok(written)
}
