//! Utility functions for identifier minting and content hashing

use bech32::Bech32m;
use uuid7::uuid7;

// mint a fresh identifier then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// Content address for a serialized payload, used to key pending
/// proposed-change blobs in the store.
pub fn content_hash(payload: &[u8]) -> String {
    sha256::digest(payload)
}
