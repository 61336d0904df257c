//! Key-value text format for the credentials settings section
//!
//! ```text
//! [credentials]
//! credential_0_username=admin
//! credential_0_password=pw
//! credential_0_description=cam1
//! count=1
//! ```
//!
//! Values are written verbatim. When any value holds a backslash, newline or
//! carriage return, the section starts with `escaping=1` and those characters
//! are escaped so a value can never break the line structure. Sections
//! without the marker are read verbatim, which keeps older files intact.

use std::fmt::{self, Write};

use tracing::warn;

use crate::entry::{CredentialEntry, CredentialField};

/// Settings section name owned by the credential store
pub const CATEGORY: &str = "credentials";

/// Key recording the number of entries written
pub const COUNT_KEY: &str = "count";

/// Marker key announcing escaped values
pub const ESCAPING_KEY: &str = "escaping";

/// Prefix of per-entry keys
const KEY_PREFIX: &str = "credential_";

/// Highest number of entries accepted from persisted data
pub const MAX_ENTRIES: usize = 4096;

/// A parsed `credential_<index>_<field>` key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryKey {
    pub index: usize,
    pub field: CredentialField,
}

/// Classification of a property key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKey {
    /// `credential_<index>_<field>`
    Entry(EntryKey),
    /// `count`
    Count,
    /// `escaping`
    Escaping,
}

impl PropertyKey {
    /// Parse a key, returning `None` for anything this section does not own
    pub fn parse(key: &str) -> Option<Self> {
        if key == COUNT_KEY {
            return Some(Self::Count);
        }
        if key == ESCAPING_KEY {
            return Some(Self::Escaping);
        }

        let rest = key.strip_prefix(KEY_PREFIX)?;
        let (index, field) = rest.split_once('_')?;

        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index: usize = index.parse().ok()?;
        if index >= MAX_ENTRIES {
            warn!("Ignoring credential key with index {} (limit {})", index, MAX_ENTRIES);
            return None;
        }

        let field = CredentialField::parse(field)?;
        Some(Self::Entry(EntryKey { index, field }))
    }
}

/// Build the key for one field of the entry at `index`
pub fn entry_key(index: usize, field: CredentialField) -> String {
    format!("{}{}_{}", KEY_PREFIX, index, field)
}

/// Escape a value for a single `key=value` line
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

/// Whether any value needs escaping to fit on one line
pub fn needs_escaping(entries: &[CredentialEntry]) -> bool {
    entries.iter().any(|entry| {
        CredentialField::ALL
            .iter()
            .any(|field| entry.field(*field).contains(|c| matches!(c, '\\' | '\n' | '\r')))
    })
}

/// Reverse [`escape_value`]. Unknown escape sequences are kept literally.
pub fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('\\') => {
                out.push('\\');
                chars.next();
            }
            Some('n') => {
                out.push('\n');
                chars.next();
            }
            Some('r') => {
                out.push('\r');
                chars.next();
            }
            _ => out.push('\\'),
        }
    }

    out
}

/// Header line, plus the escaping marker when `entries` need it
fn section_header(entries: &[CredentialEntry]) -> String {
    if needs_escaping(entries) {
        format!("[{}]\n{}=1\n", CATEGORY, ESCAPING_KEY)
    } else {
        format!("[{}]\n", CATEGORY)
    }
}

/// Render the three lines for the entry at `index`. Escaping is the
/// identity for values without special characters.
fn entry_block(index: usize, entry: &CredentialEntry) -> String {
    let mut block = String::new();
    for field in CredentialField::ALL {
        // Writing to a String cannot fail
        let _ = writeln!(
            block,
            "{}={}",
            entry_key(index, field),
            escape_value(entry.field(field))
        );
    }
    block
}

/// Stream the whole section into `out`
pub fn write_section<W: Write>(out: &mut W, entries: &[CredentialEntry]) -> fmt::Result {
    out.write_str(&section_header(entries))?;

    for (index, entry) in entries.iter().enumerate() {
        out.write_str(&entry_block(index, entry))?;
    }

    writeln!(out, "{}={}", COUNT_KEY, entries.len())
}

/// Render the section into at most `max_bytes` bytes.
///
/// Stops before the first entry whose lines would not fit together with the
/// trailing count line; `count` reports only the entries written. The header
/// and count line are always emitted, so the output never shrinks below
/// [`min_bounded_len`] even when `max_bytes` is smaller. Returns the text and
/// the number of entries it holds.
pub fn render_bounded(entries: &[CredentialEntry], max_bytes: usize) -> (String, usize) {
    let mut out = section_header(entries);

    let mut count = 0;
    for (index, entry) in entries.iter().enumerate() {
        let block = entry_block(index, entry);
        let count_line = COUNT_KEY.len() + 2 + digits(index + 1);
        if out.len() + block.len() + count_line > max_bytes {
            warn!(
                "Credential section truncated at {} of {} entries ({} byte limit)",
                count,
                entries.len(),
                max_bytes
            );
            break;
        }
        out.push_str(&block);
        count += 1;
    }

    let _ = writeln!(out, "{}={}", COUNT_KEY, count);
    (out, count)
}

/// Size of a bounded rendering that holds no entries
pub fn min_bounded_len(entries: &[CredentialEntry]) -> usize {
    section_header(entries).len() + COUNT_KEY.len() + 3
}

fn digits(mut n: usize) -> usize {
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}
