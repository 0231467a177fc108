//! One-shot tree rendering to a text stream.

use crate::tree::Entry;
use crossterm::style::Stylize;
use std::io::{self, Write};

/// Configuration for the rendering pipeline.
pub struct RenderConfig {
    /// Whether to emit ANSI color styling.
    pub use_color: bool,
}

/// Width of the right-aligned type column.
const TYPE_COLUMN: usize = 20;

/// Sanitize control characters to avoid terminal control-sequence injection.
/// Object names are supplied by the kernel but ultimately chosen by other
/// processes, so they are untrusted for display purposes.
fn sanitize_terminal_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let code = c as u32;
                if code <= 0xFF {
                    out.push_str(&format!("\\x{:02X}", code));
                } else {
                    out.push_str(&format!("\\u{{{:X}}}", code));
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Write the tree as depth-indented, type-prefixed lines.
///
/// Each line is `{type:>20}  {indent}{name}`, with symbolic links followed
/// by an arrow to their target, or `(unknown)` when resolution failed.
pub fn render_tree<W: Write>(writer: &mut W, root: &Entry, config: &RenderConfig) -> io::Result<()> {
    render_entry(writer, root, 0, config)
}

fn render_entry<W: Write>(
    writer: &mut W,
    entry: &Entry,
    depth: usize,
    config: &RenderConfig,
) -> io::Result<()> {
    let type_name = sanitize_terminal_text(&entry.type_name);
    let name = sanitize_terminal_text(&entry.name);

    let mut indent = String::new();
    for _ in 1..depth {
        indent.push_str("|  ");
    }
    if depth > 0 {
        indent.push_str("+- ");
    }

    write!(writer, "{:>width$}  {}", type_name, indent, width = TYPE_COLUMN)?;

    if config.use_color && entry.is_directory() {
        write!(writer, "{}", name.as_str().blue().bold())?;
    } else if config.use_color && entry.is_symlink() {
        write!(writer, "{}", name.as_str().cyan())?;
    } else {
        write!(writer, "{}", name)?;
    }

    if entry.is_symlink() {
        match &entry.symlink_target {
            Some(target) => write!(writer, " -> {}", sanitize_terminal_text(target))?,
            None => write!(writer, " -> (unknown)")?,
        }
    }
    writeln!(writer)?;

    for child in &entry.children {
        render_entry(writer, child, depth + 1, config)?;
    }
    Ok(())
}
