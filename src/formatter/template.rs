//! Positional placeholder substitution for pre-stringified arguments.
//!
//! Supports both brace-style (`{}`, `{0}`) and printf-style (`%s`, `%d`, ...)
//! placeholders so call sites ported from either convention keep working.
//! Arguments are only ever rendered through `Display`.

use std::fmt::{Display, Write};

const PRINTF_CONVERSIONS: &[char] = &['s', 'd', 'i', 'u', 'f', 'x', 'c'];

/// Substitute `args` into `template`.
///
/// `{}` and the printf conversions consume the next argument in order,
/// `{N}` selects argument `N` explicitly, and `{{`, `}}`, `%%` produce
/// literal characters. A placeholder without a matching argument is copied
/// through unchanged; surplus arguments are ignored.
pub fn render_template(template: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(template.len() + args.len() * 8);
    let mut next_arg = 0usize;
    let mut chars = template.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match ch {
            '{' if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                out.push('{');
            }
            '}' if matches!(chars.peek(), Some((_, '}'))) => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let Some(close) = template[idx..].find('}') else {
                    out.push_str(&template[idx..]);
                    break;
                };
                let inner = &template[idx + 1..idx + close];
                let slot = if inner.is_empty() {
                    let slot = next_arg;
                    next_arg += 1;
                    Some(slot)
                } else {
                    inner.parse::<usize>().ok()
                };
                match slot.and_then(|slot| args.get(slot)) {
                    Some(arg) => {
                        let _ = write!(out, "{arg}");
                    }
                    None => out.push_str(&template[idx..=idx + close]),
                }
                while chars.peek().is_some_and(|(pos, _)| *pos <= idx + close) {
                    chars.next();
                }
            }
            '%' => match chars.peek().copied() {
                Some((_, '%')) => {
                    chars.next();
                    out.push('%');
                }
                Some((_, conv)) if PRINTF_CONVERSIONS.contains(&conv) => {
                    chars.next();
                    match args.get(next_arg) {
                        Some(arg) => {
                            let _ = write!(out, "{arg}");
                        }
                        None => {
                            out.push('%');
                            out.push(conv);
                        }
                    }
                    next_arg += 1;
                }
                _ => out.push('%'),
            },
            other => out.push(other),
        }
    }
    out
}
