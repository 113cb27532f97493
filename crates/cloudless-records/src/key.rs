use crate::RecordError;

/// Number of decimal digits in a record key.
pub const KEY_WIDTH: usize = 8;

/// Number of distinct keys representable with [`KEY_WIDTH`] digits.
pub const MAX_RECORDS: usize = 100_000_000;

/// Zero-padded key for the record at `index`, e.g. `00000042`.
///
/// Keys sort lexicographically in the same order as their indices.
pub fn record_key(index: usize) -> Result<String, RecordError> {
    if index >= MAX_RECORDS {
        return Err(RecordError::KeyOverflow(index));
    }
    Ok(format!("{index:0width$}", width = KEY_WIDTH))
}
