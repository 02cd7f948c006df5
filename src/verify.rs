//! The collaborator interfaces named in §6 as out of scope: the
//! keyring, the raw verification primitive, and the signature-payload
//! parser. This crate defines the seams; an embedding application
//! supplies [`Keyring`] and [`SignatureVerifier`] (key management and
//! trust policy are explicit non-goals, §1). [`SignatureParser`] gets a
//! default, concrete implementation ([`crate::pgp`]) because parsing an
//! OpenPGP packet header is mechanical, not policy.

use crate::digest::HashAlgo;
use crate::entry::EntryType;
use crate::error::{ReadError, Result, Verdict};
use crate::pgp::{self, PubKeyAlgo};
use crate::tags;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigKind {
    Digest,
    Signature,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgo {
    Rsa,
    Dsa,
}

/// Parsed signature/digest tag payload, per §3.
#[derive(Debug, Clone)]
pub struct SigInfo {
    pub kind: SigKind,
    pub hash_algo: HashAlgo,
    pub key_algo: Option<KeyAlgo>,
    pub signer_keyid: Option<[u8; 8]>,
    pub blob: Vec<u8>,
}

/// An opaque handle to whatever key-material store the embedding
/// application manages. The core never inspects it.
pub trait Keyring {}

/// `verify_signature(keyring, td, params, digestCtx) -> verdict`, §6.
pub trait SignatureVerifier {
    fn verify(&self, keyring: &dyn Keyring, sig: &SigInfo, digest: &[u8]) -> Verdict;
}

/// `siginfo_parse(td, context-label)`, §6.
pub trait SignatureParser {
    fn parse(&self, tag: u32, ty: EntryType, raw: &[u8]) -> Result<SigInfo>;
}

/// The default parser: digest tags are read directly (hex `String` or
/// raw `Bin`); signature tags are OpenPGP packets parsed via
/// [`crate::pgp`].
#[derive(Debug, Default)]
pub struct DefaultSignatureParser;

impl SignatureParser for DefaultSignatureParser {
    fn parse(&self, tag: u32, ty: EntryType, raw: &[u8]) -> Result<SigInfo> {
        match tag {
            tags::SIG_SHA1 | tags::RPMTAG_SHA1HEADER => {
                if ty != EntryType::String {
                    return Err(ReadError::BadHeaderEntry(0, "SHA1 tag must be a string"));
                }
                Ok(SigInfo {
                    kind: SigKind::Digest,
                    hash_algo: HashAlgo::Sha1,
                    key_algo: None,
                    signer_keyid: None,
                    blob: raw.to_vec(),
                })
            }
            tags::SIG_MD5 => {
                if ty != EntryType::Bin {
                    return Err(ReadError::BadHeaderEntry(0, "MD5 tag must be binary"));
                }
                Ok(SigInfo {
                    kind: SigKind::Digest,
                    hash_algo: HashAlgo::Md5,
                    key_algo: None,
                    signer_keyid: None,
                    blob: raw.to_vec(),
                })
            }
            tags::SIG_RSA
            | tags::RPMTAG_RSAHEADER
            | tags::SIG_DSA
            | tags::RPMTAG_DSAHEADER
            | tags::SIG_GPG
            | tags::SIG_PGP => {
                if ty != EntryType::Bin {
                    return Err(ReadError::BadHeaderEntry(0, "signature tag must be binary"));
                }
                let parsed = pgp::parse_signature_packet(raw)?;
                let hash_algo = HashAlgo::from_pgp_id(parsed.hash_algo_id)
                    .ok_or(ReadError::BadHeaderEntry(0, "unsupported hash algorithm id"))?;
                let key_algo = match parsed.pubkey_algo {
                    PubKeyAlgo::Rsa => Some(KeyAlgo::Rsa),
                    PubKeyAlgo::Dsa => Some(KeyAlgo::Dsa),
                    PubKeyAlgo::Other(_) => None,
                };
                Ok(SigInfo {
                    kind: SigKind::Signature,
                    hash_algo,
                    key_algo,
                    signer_keyid: Some(parsed.signer_keyid),
                    blob: raw.to_vec(),
                })
            }
            _ => Err(ReadError::BadHeaderEntry(0, "unsupported signature/digest tag")),
        }
    }
}
