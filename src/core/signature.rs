//! HMAC-SHA1 signing of JSON-encoded params.

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

fn keyed(secret: &str) -> HmacSha1 {
    HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size")
}

/// Lowercase hex HMAC-SHA1 of `params_json`, keyed with `secret`.
pub fn sign(params_json: &str, secret: &str) -> String {
    let mut mac = keyed(secret);
    mac.update(params_json.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Checks `signature` against `params_json` in constant time.
pub fn verify(params_json: &str, secret: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature) else {
        return false;
    };

    let mut mac = keyed(secret);
    mac.update(params_json.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
