//! A bounded subset of RFC 4880 (OpenPGP) packet parsing: just enough to
//! recover `{public-key algorithm, hash algorithm, signer key id}` from a
//! V3 or V4 signature packet. This crate does not verify OpenPGP
//! signatures — that is [`crate::verify::SignatureVerifier`],
//! caller-supplied, per the Non-goal boundary ("fetching keys, managing
//! the keyring" in §1).

use crate::error::{ReadError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PubKeyAlgo {
    Rsa,
    Dsa,
    Other(u8),
}

impl PubKeyAlgo {
    fn from_id(id: u8) -> PubKeyAlgo {
        match id {
            1 | 2 | 3 => PubKeyAlgo::Rsa,
            17 => PubKeyAlgo::Dsa,
            other => PubKeyAlgo::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PgpSigInfo {
    pub pubkey_algo: PubKeyAlgo,
    pub hash_algo_id: u8,
    pub signer_keyid: [u8; 8],
}

/// Strip the packet header (old or new format) and return the packet
/// tag plus its body.
fn strip_packet_header(bytes: &[u8]) -> Result<(u8, &[u8])> {
    let &first = bytes
        .first()
        .ok_or(ReadError::BadHeaderEntry(0, "empty pgp packet"))?;
    if first & 0x80 == 0 {
        return Err(ReadError::BadHeaderEntry(0, "not an OpenPGP packet"));
    }
    let new_format = first & 0x40 != 0;
    if new_format {
        let tag = first & 0x3f;
        let rest = &bytes[1..];
        let (len, body_start) = read_new_format_len(rest)?;
        let body = rest
            .get(body_start..body_start + len)
            .ok_or(ReadError::BadHeaderEntry(0, "truncated pgp packet"))?;
        Ok((tag, body))
    } else {
        let tag = (first >> 2) & 0x0f;
        let len_type = first & 0x03;
        let rest = &bytes[1..];
        let (len, header_len) = match len_type {
            0 => (*rest.first().ok_or(ReadError::BadHeaderEntry(0, "short len"))? as usize, 1),
            1 => {
                let b = rest
                    .get(0..2)
                    .ok_or(ReadError::BadHeaderEntry(0, "short len"))?;
                (u16::from_be_bytes([b[0], b[1]]) as usize, 2)
            }
            2 => {
                let b = rest
                    .get(0..4)
                    .ok_or(ReadError::BadHeaderEntry(0, "short len"))?;
                (u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize, 4)
            }
            _ => (rest.len(), 0), // indeterminate length: take the rest
        };
        let body = rest
            .get(header_len..header_len + len)
            .ok_or(ReadError::BadHeaderEntry(0, "truncated pgp packet"))?;
        Ok((tag, body))
    }
}

fn read_new_format_len(bytes: &[u8]) -> Result<(usize, usize)> {
    let &first = bytes
        .first()
        .ok_or(ReadError::BadHeaderEntry(0, "short len"))?;
    if first < 192 {
        Ok((first as usize, 1))
    } else if first < 224 {
        let second = *bytes
            .get(1)
            .ok_or(ReadError::BadHeaderEntry(0, "short len"))?;
        Ok((((first as usize - 192) << 8) + second as usize + 192, 2))
    } else if first == 255 {
        let b = bytes
            .get(1..5)
            .ok_or(ReadError::BadHeaderEntry(0, "short len"))?;
        Ok((u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize, 5))
    } else {
        // partial body lengths: not used by RPM signature packets.
        Err(ReadError::BadHeaderEntry(0, "partial-length pgp packet"))
    }
}

const SIGNATURE_PACKET_TAG: u8 = 2;
const ISSUER_SUBPACKET: u8 = 16;
const ISSUER_FINGERPRINT_SUBPACKET: u8 = 33;

fn scan_subpackets_for_issuer(mut data: &[u8]) -> Option<[u8; 8]> {
    while !data.is_empty() {
        let (len, header_len) = read_new_format_len(data).ok()?;
        let total = header_len + len;
        if total == 0 || total > data.len() {
            return None;
        }
        let body = &data[header_len..total];
        if let Some((&sub_type_byte, rest)) = body.split_first() {
            let sub_type = sub_type_byte & 0x7f;
            if sub_type == ISSUER_SUBPACKET && rest.len() >= 8 {
                let mut id = [0u8; 8];
                id.copy_from_slice(&rest[..8]);
                return Some(id);
            }
            if sub_type == ISSUER_FINGERPRINT_SUBPACKET && rest.len() >= 8 {
                let mut id = [0u8; 8];
                id.copy_from_slice(&rest[rest.len() - 8..]);
                return Some(id);
            }
        }
        data = &data[total..];
    }
    None
}

/// Parse a raw signature-tag payload (a one-packet OpenPGP blob) into
/// `{pubkey_algo, hash_algo, signer_keyid}`.
pub fn parse_signature_packet(raw: &[u8]) -> Result<PgpSigInfo> {
    let (tag, body) = strip_packet_header(raw)?;
    if tag != SIGNATURE_PACKET_TAG {
        return Err(ReadError::BadHeaderEntry(0, "not a signature packet"));
    }
    let &version = body
        .first()
        .ok_or(ReadError::BadHeaderEntry(0, "empty signature packet"))?;
    match version {
        3 => {
            // version(1) hashlen(1) sig_type(1) creation_time(4) keyid(8)
            // pubkey_algo(1) hash_algo(1) left16(2) ...
            let b = body
                .get(0..17)
                .ok_or(ReadError::BadHeaderEntry(0, "truncated v3 signature"))?;
            let mut keyid = [0u8; 8];
            keyid.copy_from_slice(&b[7..15]);
            Ok(PgpSigInfo {
                pubkey_algo: PubKeyAlgo::from_id(b[15]),
                hash_algo_id: b[16],
                signer_keyid: keyid,
            })
        }
        4 | 5 => {
            // version(1) sig_type(1) pubkey_algo(1) hash_algo(1)
            // hashed_len(2) hashed[..] unhashed_len(2) unhashed[..] ...
            let b = body
                .get(0..6)
                .ok_or(ReadError::BadHeaderEntry(0, "truncated v4 signature"))?;
            let pubkey_algo = PubKeyAlgo::from_id(b[2]);
            let hash_algo_id = b[3];
            let hashed_len = u16::from_be_bytes([b[4], b[5]]) as usize;
            let after_hashed = 6 + hashed_len;
            let hashed = body
                .get(6..after_hashed)
                .ok_or(ReadError::BadHeaderEntry(0, "truncated hashed subpackets"))?;
            let unhashed_len_bytes = body
                .get(after_hashed..after_hashed + 2)
                .ok_or(ReadError::BadHeaderEntry(0, "truncated unhashed length"))?;
            let unhashed_len =
                u16::from_be_bytes([unhashed_len_bytes[0], unhashed_len_bytes[1]]) as usize;
            let unhashed_start = after_hashed + 2;
            let unhashed = body
                .get(unhashed_start..unhashed_start + unhashed_len)
                .ok_or(ReadError::BadHeaderEntry(0, "truncated unhashed subpackets"))?;

            let signer_keyid = scan_subpackets_for_issuer(hashed)
                .or_else(|| scan_subpackets_for_issuer(unhashed))
                .unwrap_or([0u8; 8]);

            Ok(PgpSigInfo {
                pubkey_algo,
                hash_algo_id,
                signer_keyid,
            })
        }
        _ => Err(ReadError::BadHeaderEntry(
            0,
            "unsupported signature packet version",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn v4_signature_packet(pubkey_algo: u8, hash_algo: u8, keyid: [u8; 8]) -> Vec<u8> {
        let mut hashed_subpkt = vec![9u8]; // length byte (1 type + 8 data)
        hashed_subpkt.push(ISSUER_SUBPACKET);
        hashed_subpkt.extend_from_slice(&keyid);

        let mut body = vec![4u8, 0x00, pubkey_algo, hash_algo];
        body.extend_from_slice(&(hashed_subpkt.len() as u16).to_be_bytes());
        body.extend_from_slice(&hashed_subpkt);
        body.extend_from_slice(&0u16.to_be_bytes()); // empty unhashed area
        body.extend_from_slice(&[0u8, 0u8]); // left16
        body.extend_from_slice(&[0u8, 1u8, 0xAB]); // a minimal fake MPI

        let mut packet = vec![0x80 | (SIGNATURE_PACKET_TAG << 2)]; // old format, 1-byte length
        packet.push(body.len() as u8);
        packet.extend_from_slice(&body);
        packet
    }

    #[test]
    fn parses_v4_rsa_signature_with_issuer() {
        let keyid = [1, 2, 3, 4, 5, 6, 7, 8];
        let packet = v4_signature_packet(1, 8, keyid);
        let info = parse_signature_packet(&packet).unwrap();
        assert_eq!(PubKeyAlgo::Rsa, info.pubkey_algo);
        assert_eq!(8, info.hash_algo_id);
        assert_eq!(keyid, info.signer_keyid);
    }

    #[test]
    fn parses_v4_dsa_signature() {
        let packet = v4_signature_packet(17, 2, [0xAA; 8]);
        let info = parse_signature_packet(&packet).unwrap();
        assert_eq!(PubKeyAlgo::Dsa, info.pubkey_algo);
    }

    #[test]
    fn rejects_non_signature_packet() {
        // tag 6 (public key), old format, 1-byte length, empty body.
        let packet = vec![0x80 | (6 << 2), 0];
        let err = parse_signature_packet(&packet).unwrap_err();
        assert!(matches!(err, ReadError::BadHeaderEntry(0, "not a signature packet")));
    }
}
