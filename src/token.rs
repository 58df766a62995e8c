//! Random URL-safe tokens.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::Error;

/// Returns `length` bytes from the operating system RNG, base64-encoded with
/// the URL-safe alphabet (padded).
///
/// ```rust
/// let token = chainmux::token::generate(32).unwrap();
/// assert_eq!(token.len(), 44);
/// ```
pub fn generate(length: usize) -> Result<String, Error> {
    let mut buf = vec![0u8; length];
    OsRng.try_fill_bytes(&mut buf)?;
    Ok(URL_SAFE.encode(buf))
}
