//! I/O utilities for detection event traces.
//!
//! Provides reading and writing of the line-oriented event trace format
//! consumed by the replay driver, and of mismatch dumps produced by the
//! validation harness. Dumps are themselves valid traces, so a failing trial
//! can be replayed directly from its dump.

/// Mismatch dump writer.
///
/// Emits the events of a failing trial as a trace, followed by both decision
/// lists as comment lines.
pub mod dump;

/// Parser and writer for event trace files.
///
/// One event per line as `<x> <y> <z> <distance_to_boundary>`, with `#`
/// starting a comment line. Event ids are assigned in file order.
pub mod trace;
