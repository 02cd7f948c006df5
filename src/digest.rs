//! The digest primitive named as an external collaborator in §6
//! (`digest_{init,update,final}`). This crate does not implement hash
//! algorithms itself; it wires the three algorithms RPM headers
//! actually use to `md-5`/`sha1`/`sha2`.

use md5::Digest as _;
use sha1::Digest as _;
use sha2::Digest as _;

/// The hash algorithms a `SigInfo.hash_algo` can name. Numeric values
/// match the real RPM/OpenPGP hash-algorithm id space (grounded by
/// `other_examples/…wolfpack__src-rpm-entry.rs`'s `HashAlgorithm` enum);
/// this crate only wires up the three it can actually compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgo {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgo {
    pub fn from_pgp_id(id: u8) -> Option<HashAlgo> {
        match id {
            1 => Some(HashAlgo::Md5),
            2 => Some(HashAlgo::Sha1),
            8 => Some(HashAlgo::Sha256),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HashAlgo::Md5 => "md5",
            HashAlgo::Sha1 => "sha1",
            HashAlgo::Sha256 => "sha256",
        }
    }
}

/// `digest_{init,update,final}` as a single owned object: `init`
/// corresponds to construction, repeated `update`, and `finalize`
/// consumes it.
pub trait DigestEngine {
    fn update(&mut self, bytes: &[u8]);
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

struct Md5Engine(md5::Md5);
struct Sha1Engine(sha1::Sha1);
struct Sha256Engine(sha2::Sha256);

impl DigestEngine for Md5Engine {
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

impl DigestEngine for Sha1Engine {
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

impl DigestEngine for Sha256Engine {
    fn update(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

pub fn init(algo: HashAlgo) -> Box<dyn DigestEngine> {
    match algo {
        HashAlgo::Md5 => Box::new(Md5Engine(md5::Md5::new())),
        HashAlgo::Sha1 => Box::new(Sha1Engine(sha1::Sha1::new())),
        HashAlgo::Sha256 => Box::new(Sha256Engine(sha2::Sha256::new())),
    }
}

/// Run the canonical `Init -> Update* -> Final` sequence over a single
/// byte slice. A convenience wrapper; §4.4/§4.5 call `init`/`update`
/// directly across several non-contiguous slices.
pub fn digest_all(algo: HashAlgo, bytes: &[u8]) -> Vec<u8> {
    let mut ctx = init(algo);
    ctx.update(bytes);
    ctx.finalize()
}
