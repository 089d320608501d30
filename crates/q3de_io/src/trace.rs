use anyhow::{Context, Result, anyhow};
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map_res, opt, recognize};
use nom::sequence::{pair, preceded, terminated, tuple};
use nom::{Finish, IResult};
use q3de_common::{DetectionEvent, Position};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

fn signed(input: &str) -> IResult<&str, i32> {
    map_res(recognize(pair(opt(char('-')), digit1)), |s: &str| s.parse::<i32>())(input)
}

fn unsigned(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |s: &str| s.parse::<u32>())(input)
}

/// `<x> <y> <z> <d_b>` with arbitrary blanks between and around the fields.
fn record(input: &str) -> IResult<&str, (i32, i32, i32, u32)> {
    all_consuming(terminated(
        tuple((
            preceded(space0, signed),
            preceded(space1, signed),
            preceded(space1, signed),
            preceded(space1, unsigned),
        )),
        space0,
    ))(input)
}

/// Parses a trace held in memory.
///
/// Blank lines and lines starting with `#` are skipped. The n-th record
/// becomes event `n`.
pub fn parse_trace(text: &str) -> Result<Vec<DetectionEvent>> {
    let mut events = Vec::new();

    for (lineno, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (_, (x, y, z, d_b)) = record(trimmed)
            .finish()
            .map_err(|e| anyhow!("line {}: malformed event record: {:?}", lineno + 1, e.code))?;
        let id = u32::try_from(events.len()).context("too many events in trace")?;
        events.push(DetectionEvent::new(id, Position::new(x, y, z), d_b));
    }

    Ok(events)
}

/// Loads a trace file.
pub fn load_trace<P: AsRef<Path>>(path: P) -> Result<Vec<DetectionEvent>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read trace {}", path.display()))?;
    parse_trace(&text).with_context(|| format!("Failed to parse trace {}", path.display()))
}

/// Writes `events` as trace records, in the order given.
pub fn write_trace<W: Write>(out: &mut W, events: &[DetectionEvent]) -> Result<()> {
    for e in events {
        let p = e.position;
        writeln!(out, "{} {} {} {}", p.x, p.y, p.z, e.distance_to_boundary)?;
    }
    Ok(())
}

/// Writes a trace file, preceded by an optional comment header.
pub fn save_trace<P: AsRef<Path>>(path: P, header: &str, events: &[DetectionEvent]) -> Result<()> {
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for line in header.lines() {
        writeln!(out, "# {}", line)?;
    }
    write_trace(&mut out, events)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_negative_coordinates_and_padding() {
        assert_eq!(record("  -1 2\t3 4 "), Ok(("", (-1, 2, 3, 4))));
        assert!(record("1 2 3").is_err());
        assert!(record("1 2 3 -4").is_err());
        assert!(record("1 2 3 4 5").is_err());
    }
}
