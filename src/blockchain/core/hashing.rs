//! Canonical block encoding and hashing.
//!
//! A block is hashed as SHA-256 over a JSON rendering with a frozen layout:
//!
//! - object keys in sorted order (`index, previous_hash, proof, timestamp,
//!   transactions`, and `amount, recipient, sender` inside transactions),
//! - `", "` between members and `": "` between a key and its value,
//! - non-ASCII and DEL characters escaped as lowercase `\uXXXX`,
//! - floats in shortest round-trip form, positional for decimal exponents
//!   in `-4..16` and `1e+16`-style scientific notation otherwise.
//!
//! This is byte-for-byte the sorted-key JSON dump used by reference nodes,
//! so digests agree across implementations. Every proof in a chain depends
//! on these bytes: any change here must bump [`CANONICAL_ENCODING_VERSION`].

use super::chain::{Block, Timestamp};
use crate::transaction::{Amount, Transaction};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use sha2::{Digest, Sha256};
use std::io::{self, Write};

pub const CANONICAL_ENCODING_VERSION: u32 = 1;

// Field declaration order is the encoding order.
#[derive(Serialize)]
struct CanonicalBlock<'a> {
    index: u64,
    previous_hash: &'a str,
    proof: u64,
    timestamp: &'a Timestamp,
    transactions: Vec<CanonicalTransaction<'a>>,
}

#[derive(Serialize)]
struct CanonicalTransaction<'a> {
    amount: &'a Amount,
    recipient: &'a str,
    sender: &'a str,
}

impl<'a> From<&'a Transaction> for CanonicalTransaction<'a> {
    fn from(tx: &'a Transaction) -> Self {
        CanonicalTransaction {
            amount: &tx.amount,
            recipient: &tx.recipient,
            sender: &tx.sender,
        }
    }
}

impl<'a> From<&'a Block> for CanonicalBlock<'a> {
    fn from(block: &'a Block) -> Self {
        CanonicalBlock {
            index: block.index,
            previous_hash: &block.previous_hash,
            proof: block.proof,
            timestamp: &block.timestamp,
            transactions: block.transactions.iter().map(CanonicalTransaction::from).collect(),
        }
    }
}

/// `serde_json` formatter producing the canonical separators, string escapes
/// and float notation.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '\u{7f}' {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(format_float(value).as_bytes())
    }
}

/// Shortest round-trip rendering of a finite float in the canonical notation.
fn format_float(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "-1.7000000005e9".
    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let decimal_point = exponent + 1;

    let body = if !(-3..=16).contains(&decimal_point) {
        let (lead, rest) = digits.split_at(1);
        let fraction = if rest.is_empty() { String::new() } else { format!(".{}", rest) };
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        format!("{}{}e{}{:02}", lead, fraction, exp_sign, exponent.abs())
    } else if decimal_point <= 0 {
        format!("0.{}{}", "0".repeat(decimal_point.unsigned_abs() as usize), digits)
    } else {
        let point = decimal_point as usize;
        if point >= digits.len() {
            format!("{}{}.0", digits, "0".repeat(point - digits.len()))
        } else {
            format!("{}.{}", &digits[..point], &digits[point..])
        }
    };

    format!("{}{}", sign, body)
}

/// The canonical byte encoding of `block`.
pub fn canonical_encoding(block: &Block) -> Vec<u8> {
    let mut out = Vec::with_capacity(128 + block.transactions.len() * 96);
    let mut serializer = Serializer::with_formatter(&mut out, CanonicalFormatter);
    // Plain structs of strings and finite numbers written into a Vec: this cannot fail.
    let _ = CanonicalBlock::from(block).serialize(&mut serializer);
    out
}

/// Lowercase hex SHA-256 digest of the block's canonical encoding.
pub fn hash_block(block: &Block) -> String {
    hex::encode(Sha256::digest(canonical_encoding(block)))
}
