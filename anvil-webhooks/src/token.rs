//! Webhook token comparison

/// Constant-time byte comparison to prevent timing attacks.
///
/// Inputs of different length compare unequal immediately; for equal
/// lengths every byte is visited regardless of where a mismatch occurs.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Header names Anvil deliveries may carry the token in
pub mod headers {
    /// Token header
    pub const TOKEN: &str = "X-Anvil-Token";
}
