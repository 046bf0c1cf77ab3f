//! Human-readable order identifiers.
//!
//! Format: `<PREFIX>-<TIME36>-<RAND4>` where `TIME36` is the Unix time in
//! milliseconds in uppercase base 36 and `RAND4` is four random uppercase
//! base-36 characters. Uniqueness is probabilistic; the store's unique
//! constraint on `order_id` is what actually enforces it.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::types::OrderId;

/// Prefix used when none is configured.
pub const DEFAULT_PREFIX: &str = "ART";

/// Length of the random suffix.
pub const SUFFIX_LEN: usize = 4;

const ALPHABET: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate an order id for "now".
#[must_use]
pub fn generate_order_id(prefix: &str) -> OrderId {
    generate_order_id_at(prefix, Utc::now(), &mut rand::rng())
}

/// Generate an order id for a given instant and random source.
#[must_use]
#[allow(clippy::indexing_slicing)] // index drawn from 0..ALPHABET.len()
pub fn generate_order_id_at<R: Rng + ?Sized>(
    prefix: &str,
    at: DateTime<Utc>,
    rng: &mut R,
) -> OrderId {
    let millis = u64::try_from(at.timestamp_millis()).unwrap_or(0);
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
        .collect();

    OrderId::new(format!("{prefix}-{}-{suffix}", to_base36(millis)))
}

/// Uppercase base-36 encoding.
fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_owned();
    }
    let mut digits = Vec::new();
    while value > 0 {
        // value % 36 < 36, so the index is always in bounds
        #[allow(clippy::cast_possible_truncation, clippy::indexing_slicing)]
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Check that `id` has the shape produced by [`generate_order_id`] for `prefix`.
#[must_use]
pub fn is_well_formed(id: &str, prefix: &str) -> bool {
    let Some(rest) = id
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
    else {
        return false;
    };
    let Some((time, suffix)) = rest.split_once('-') else {
        return false;
    };
    let is_base36 = |s: &str| s.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase());
    !time.is_empty() && is_base36(time) && suffix.len() == SUFFIX_LEN && is_base36(suffix)
}
