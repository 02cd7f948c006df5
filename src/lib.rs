//! Package reader core: parses a binary package file's lead, signature
//! header, and metadata header, selects and verifies the strongest
//! available digest/signature, and upgrades legacy header encodings.
//!
//! Key management, trust policy, and payload interpretation are out of
//! scope — see [`verify::Keyring`]/[`verify::SignatureVerifier`] for the
//! seams an embedding application supplies.

pub mod digest;
pub mod entry;
pub mod error;
pub mod errormapper;
pub mod header;
pub mod header_blob;
pub mod keystash;
pub mod lead;
pub mod pgp;
pub mod reader;
pub mod region;
pub mod sig;
pub mod sigheader;
pub mod structure;
pub mod tags;
pub mod verify;

pub use error::{ReadError, Result, Verdict};
pub use header::Header;
pub use keystash::KeyIdStash;
pub use lead::{DefaultLeadReader, LeadOutcome, LeadReader, LeadType};
pub use reader::{PackageReader, ReadOutcome};
pub use sig::SigPolicy;
pub use verify::{DefaultSignatureParser, Keyring, SigInfo, SignatureParser, SignatureVerifier};
