/*
 * writer.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Serialization of a setting tree back to text.
//!
//! The output parses back to an equivalent tree: same kinds, names, order,
//! values and integer formats. Layout follows the document options:
//!
//! ```text
//! name = "demo";
//! window :
//! {
//!   size = [ 640, 480 ];
//!   flags = 0x1F;
//! };
//! ```

use crate::error::Result;
use crate::options::Options;
use crate::tree::{NodeId, Payload, Tree};
use crate::value::{Format, Kind, Value};
use std::fmt::Write;

/// Layout settings taken from the document.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Layout {
    pub options: Options,
    /// Spaces per nesting level; 0 indents with tabs
    pub tab_width: u8,
    pub float_precision: u8,
}

pub(crate) fn write_tree(tree: &Tree, layout: Layout) -> Result<String> {
    let mut writer = Writer {
        tree,
        layout,
        out: String::new(),
    };
    writer.write_setting(tree.root(), 0)?;
    tracing::debug!(bytes = writer.out.len(), "wrote document");
    Ok(writer.out)
}

struct Writer<'t> {
    tree: &'t Tree,
    layout: Layout,
    out: String,
}

impl Writer<'_> {
    fn indent(&mut self, depth: usize) {
        let levels = depth.saturating_sub(1);
        match self.layout.tab_width {
            0 => self.out.extend(std::iter::repeat_n('\t', levels)),
            width => self
                .out
                .extend(std::iter::repeat_n(' ', levels * usize::from(width))),
        }
    }

    fn write_setting(&mut self, id: NodeId, depth: usize) -> Result<()> {
        let setting = self.tree.get(id)?;

        if depth > 1 {
            self.indent(depth);
        }
        if let Some(name) = setting.name() {
            let assign = self
                .layout
                .options
                .assignment_char(setting.kind() == Kind::Group);
            let _ = write!(self.out, "{} {} ", name, assign);
        }

        self.write_value(id, depth)?;

        if depth > 0 {
            if self.layout.options.contains(Options::SEMICOLON_SEPARATORS) {
                self.out.push(';');
            }
            self.out.push('\n');
        }
        Ok(())
    }

    fn write_value(&mut self, id: NodeId, depth: usize) -> Result<()> {
        let setting = self.tree.get(id)?;
        match &setting.payload {
            Payload::Scalar(value) => {
                self.write_scalar(value, setting.format());
            }
            Payload::Elements(elements) => {
                let (open, close) = if setting.kind() == Kind::Array {
                    ('[', ']')
                } else {
                    ('(', ')')
                };
                self.out.push(open);
                self.out.push(' ');
                for (i, element) in elements.iter().enumerate() {
                    self.write_value(*element, depth + 1)?;
                    if i + 1 < elements.len() {
                        self.out.push(',');
                    }
                    self.out.push(' ');
                }
                self.out.push(close);
            }
            Payload::Group(members) => {
                if depth > 0 {
                    if self
                        .layout
                        .options
                        .contains(Options::OPEN_BRACE_ON_SEPARATE_LINE)
                    {
                        self.out.push('\n');
                        if depth > 1 {
                            self.indent(depth);
                        }
                    }
                    self.out.push_str("{\n");
                }
                for member in members.values() {
                    self.write_setting(*member, depth + 1)?;
                }
                if depth > 1 {
                    self.indent(depth);
                }
                if depth > 0 {
                    self.out.push('}');
                }
            }
        }
        Ok(())
    }

    fn write_scalar(&mut self, value: &Value, format: Format) {
        match value {
            Value::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Value::Int(v) => {
                let _ = match format {
                    Format::Decimal => write!(self.out, "{}", v),
                    Format::Hex => write!(self.out, "0x{:X}", *v as u32),
                    Format::Octal => write!(self.out, "0{:o}", *v as u32),
                    Format::Binary => write!(self.out, "0b{:b}", *v as u32),
                };
            }
            Value::Int64(v) => {
                let _ = match format {
                    Format::Decimal => write!(self.out, "{}L", v),
                    Format::Hex => write!(self.out, "0x{:X}L", *v as u64),
                    Format::Octal => write!(self.out, "0{:o}L", *v as u64),
                    Format::Binary => write!(self.out, "0b{:b}L", *v as u64),
                };
            }
            Value::Float(v) => {
                let text = format_float(
                    *v,
                    usize::from(self.layout.float_precision),
                    self.layout
                        .options
                        .contains(Options::ALLOW_SCIENTIFIC_NOTATION),
                );
                self.out.push_str(&text);
            }
            Value::String(s) => write_quoted(&mut self.out, s),
        }
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            c if u32::from(c) < 0x20 => {
                let _ = write!(out, "\\x{:02X}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Render a float with `precision` digits.
///
/// Fixed notation uses `precision` digits after the point. With `scientific`
/// the shortest of fixed and exponent form is chosen by magnitude, with
/// `precision` significant digits, the way C's `%g` does. Trailing zeros
/// after the point are dropped, but a fixed-notation result always keeps one
/// digit after it so it parses as a float again.
///
/// The text is rounded, so reading it back only reproduces `value` exactly
/// with `scientific` and a precision of 17. Fixed notation drops anything
/// past `precision` decimal places, which can round small values to zero.
pub(crate) fn format_float(value: f64, precision: usize, scientific: bool) -> String {
    let mut text = if scientific {
        format_general(value, precision)
    } else {
        format!("{:.*}", precision, value)
    };

    if text.contains('e') {
        return text;
    }
    match text.find('.') {
        None => text.push_str(".0"),
        Some(dot) => {
            let keep = text.trim_end_matches('0').len().max(dot + 2);
            text.truncate(keep);
        }
    }
    text
}

fn format_general(value: f64, precision: usize) -> String {
    let precision = precision.max(1);
    let exp_form = format!("{:.*e}", precision - 1, value);
    let Some((mantissa, exponent)) = exp_form.split_once('e') else {
        return exp_form;
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= precision as i32 {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        strip_fraction_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn strip_fraction_zeros(text: &str) -> &str {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.')
    } else {
        text
    }
}
