/*!
 * Domain Names
 * Canonical, case-folded DNS names with presentation-format escaping
 */

use super::errors::{ValueError, ValueResult};
use crate::core::limits::{MAX_DOMAIN_LABELS, MAX_DOMAIN_LABEL_LEN, MAX_DOMAIN_WIRE_LEN};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Canonical domain name
///
/// The text form is lower case, has no trailing dot and escapes `.`, `\`
/// and non-printable bytes inside labels. Two names are equal iff their
/// canonical texts are equal. The root domain has no labels and an empty text.
#[derive(Debug, Clone, Default)]
pub struct Domain {
    text: String,
    // Byte offset of each label in `text`, leftmost label first
    starts: Vec<usize>,
}

impl Domain {
    /// The root domain
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a domain in presentation format
    pub fn parse(input: &str) -> ValueResult<Self> {
        if input.is_empty() || input == "." {
            return Ok(Self::root());
        }

        let labels = split_labels(input)?;
        if labels.len() > MAX_DOMAIN_LABELS {
            return Err(ValueError::TooManyLabels {
                domain: input.to_string(),
                count: labels.len(),
            });
        }

        let mut wire_len = 1;
        for label in &labels {
            if label.len() > MAX_DOMAIN_LABEL_LEN {
                return Err(ValueError::LabelTooLong {
                    domain: input.to_string(),
                    length: label.len(),
                });
            }
            wire_len += label.len() + 1;
        }
        if wire_len > MAX_DOMAIN_WIRE_LEN {
            return Err(ValueError::NameTooLong {
                domain: input.to_string(),
                length: wire_len,
            });
        }

        let mut text = String::with_capacity(input.len());
        let mut starts = Vec::with_capacity(labels.len());
        for label in &labels {
            if !text.is_empty() {
                text.push('.');
            }
            starts.push(text.len());
            escape_label(label, &mut text);
        }

        Ok(Self { text, starts })
    }

    /// Canonical text (empty for the root)
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_root(&self) -> bool {
        self.starts.is_empty()
    }

    pub fn label_count(&self) -> usize {
        self.starts.len()
    }

    /// Escaped labels, leftmost first
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.starts.iter().enumerate().map(move |(i, &start)| {
            let end = self
                .starts
                .get(i + 1)
                .map(|next| next - 1)
                .unwrap_or(self.text.len());
            &self.text[start..end]
        })
    }

    /// Canonical texts of this name and each parent, ending with the root ("")
    pub fn suffixes(&self) -> impl Iterator<Item = &str> + '_ {
        self.starts
            .iter()
            .map(move |&start| &self.text[start..])
            .chain(std::iter::once(""))
    }

    /// True if `self` equals `other` or is a subdomain of it
    pub fn is_within(&self, other: &Domain) -> bool {
        self.suffixes().any(|suffix| suffix == other.text)
    }
}

impl PartialEq for Domain {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Domain {}

impl Hash for Domain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            f.write_str(".")
        } else {
            f.write_str(&self.text)
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::parse(s)
    }
}

/// Split presentation text into raw, case-folded label bytes
fn split_labels(input: &str) -> ValueResult<Vec<Vec<u8>>> {
    let bytes = input.as_bytes();
    let mut labels = Vec::new();
    let mut label = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                let (byte, consumed) = unescape(&bytes[i + 1..])
                    .ok_or_else(|| ValueError::InvalidEscape(input.to_string()))?;
                label.push(byte.to_ascii_lowercase());
                i += 1 + consumed;
            }
            b'.' => {
                if label.is_empty() {
                    return Err(ValueError::EmptyLabel(input.to_string()));
                }
                labels.push(std::mem::take(&mut label));
                i += 1;
            }
            byte => {
                label.push(byte.to_ascii_lowercase());
                i += 1;
            }
        }
    }

    // A trailing dot leaves an empty final label, which is fine
    if !label.is_empty() {
        labels.push(label);
    }
    Ok(labels)
}

/// Decode one escape after the backslash; returns the byte and bytes consumed
fn unescape(rest: &[u8]) -> Option<(u8, usize)> {
    let first = *rest.first()?;
    if !first.is_ascii_digit() {
        return Some((first, 1));
    }

    let digits = rest.get(..3)?;
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let value = digits
        .iter()
        .fold(0u32, |acc, d| acc * 10 + u32::from(d - b'0'));
    u8::try_from(value).ok().map(|byte| (byte, 3))
}

fn escape_label(label: &[u8], out: &mut String) {
    for &byte in label {
        match byte {
            b'.' | b'\\' => {
                out.push('\\');
                out.push(byte as char);
            }
            0x21..=0x7e => out.push(byte as char),
            _ => out.push_str(&format!("\\{byte:03}")),
        }
    }
}
