//! Human-readable order codes: `ORD{YYYYMMDD}-{id:08}-{XXXX}`.

use chrono::NaiveDate;
use rand::Rng;

const SUFFIX_LEN: usize = 4;
const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate an order code for `order_id` placed on `date`
pub fn generate(date: NaiveDate, order_id: i64) -> String {
    generate_with(&mut rand::thread_rng(), date, order_id)
}

pub fn generate_with<R: Rng + ?Sized>(rng: &mut R, date: NaiveDate, order_id: i64) -> String {
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();

    format!("ORD{}-{:08}-{}", date.format("%Y%m%d"), order_id, suffix)
}

/// Cheap shape check used before hitting the database with a lookup
pub fn looks_like_order_code(code: &str) -> bool {
    let mut parts = code.split('-');
    let (Some(head), Some(id), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    head.len() == 11
        && head.starts_with("ORD")
        && head[3..].chars().all(|c| c.is_ascii_digit())
        && id.len() >= 8
        && id.chars().all(|c| c.is_ascii_digit())
        && suffix.len() == SUFFIX_LEN
        && suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}
