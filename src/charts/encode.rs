use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encode raw PNG bytes for embedding in a JSON payload or a `data:` URL.
pub fn to_base64(png: &[u8]) -> String {
    STANDARD.encode(png)
}
