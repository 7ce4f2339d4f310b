/// Base58check address rendering shared by script classification.
///
/// Pure hashing/encoding helpers only; no I/O. The chain parser calls these
/// with the version byte appropriate to the script template it has already
/// matched (P2PKH, P2SH, or one side of a cold-stake pair).
use sha2::{Sha256, Digest};
use ripemd160::{Ripemd160, Digest as RipemdDigest};

pub fn sha256d(data: &[u8]) -> Vec<u8> {
    let first = Sha256::digest(data);
    Sha256::digest(&first).to_vec()
}

pub fn hash160(data: &[u8]) -> Vec<u8> {
    let sha = Sha256::digest(data);
    Ripemd160::digest(&sha).to_vec()
}

/// Base58check-encode a 20-byte hash with the given version byte.
pub fn hash_to_address(hash: &[u8], version: u8) -> String {
    let mut extended = vec![version];
    extended.extend_from_slice(hash);
    let checksum = sha256d(&extended);
    extended.extend_from_slice(&checksum[0..4]);
    bs58::encode(extended).into_string()
}

/// Decode a base58check address back to `(version, hash)`. Used to
/// normalize a human address into the descriptor the index keys on.
pub fn address_to_hash(address: &str) -> Option<(u8, Vec<u8>)> {
    let decoded = bs58::decode(address).into_vec().ok()?;
    if decoded.len() < 5 {
        return None;
    }
    let (payload, checksum) = decoded.split_at(decoded.len() - 4);
    if sha256d(payload)[0..4] != *checksum {
        return None;
    }
    let version = payload[0];
    let hash = payload[1..].to_vec();
    Some((version, hash))
}

pub fn compress_pubkey(pub_key_bytes: &[u8]) -> Option<Vec<u8>> {
    match pub_key_bytes.len() {
        65 if pub_key_bytes[0] == 0x04 => {
            let x = &pub_key_bytes[1..33];
            let y = &pub_key_bytes[33..65];
            let parity = if y[31] % 2 == 0 { 0x02 } else { 0x03 };
            let mut compressed = vec![parity];
            compressed.extend_from_slice(x);
            Some(compressed)
        }
        33 if pub_key_bytes[0] == 0x02 || pub_key_bytes[0] == 0x03 => Some(pub_key_bytes.to_vec()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_round_trips_through_base58check() {
        let hash = [0x11u8; 20];
        let addr = hash_to_address(&hash, 30);
        let (version, decoded_hash) = address_to_hash(&addr).expect("valid address");
        assert_eq!(version, 30);
        assert_eq!(decoded_hash, hash.to_vec());
    }

    #[test]
    fn corrupted_checksum_is_rejected() {
        let hash = [0x22u8; 20];
        let mut addr = hash_to_address(&hash, 30).into_bytes();
        // Flip the last encoded character to corrupt the checksum.
        let last = addr.len() - 1;
        addr[last] = if addr[last] == b'1' { b'2' } else { b'1' };
        let addr = String::from_utf8(addr).unwrap();
        assert!(address_to_hash(&addr).is_none());
    }

    #[test]
    fn compress_pubkey_handles_even_and_odd_parity() {
        let mut uncompressed = vec![0x04u8];
        uncompressed.extend_from_slice(&[0xAA; 32]);
        uncompressed.extend_from_slice(&[0x00; 32]); // even last byte -> 0x02 parity
        let compressed = compress_pubkey(&uncompressed).unwrap();
        assert_eq!(compressed[0], 0x02);
        assert_eq!(compressed.len(), 33);
    }
}
