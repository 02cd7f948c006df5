use std::fmt;

/// Every fatal and non-fatal outcome the reader can produce for a single
/// header blob, per the error kinds named in the design's §7.
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("hdr size({expected}): BAD, read returned {actual}")]
    ShortRead { expected: usize, actual: usize },

    #[error("hdr magic: BAD")]
    BadMagic,

    #[error("hdr tags: BAD, no. of tags({0}) out of range")]
    BadHeaderTags(u32),

    #[error("hdr data: BAD, no. of bytes({0}) out of range")]
    BadHeaderData(u32),

    #[error("blob size BAD: expected {expected}, got {actual}")]
    BadBlobSize { expected: usize, actual: usize },

    #[error("region: no immutable region tag present")]
    RegionMissing,

    #[error("region tag has wrong type or count")]
    BadRegionTag,

    #[error("region trailer offset out of range")]
    BadRegionOffset,

    #[error("region trailer tag/type/count mismatch")]
    BadRegionTrailer,

    #[error("region size invalid (ril/rdl out of range)")]
    BadRegionSize,

    #[error("region il/dl does not match trailer-derived ril/rdl")]
    RegionSizeMismatch,

    #[error("hdr entry BAD at index {0}: {1}")]
    BadHeaderEntry(usize, &'static str),

    #[error("verification failed: {algo} over tag {tag}")]
    VerificationFail { algo: &'static str, tag: u32 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The overall disposition of one `read_package` call. Distinct from
/// [`ReadError`]: a `Verdict` can carry `NoKey`/`NotTrusted`/`NotFound`
/// without the call itself having failed — the header is still returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ok,
    NotTrusted,
    NoKey,
    NotFound,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Ok => "OK",
            Verdict::NotTrusted => "NOTTRUSTED",
            Verdict::NoKey => "NOKEY",
            Verdict::NotFound => "NOTFOUND",
            Verdict::Fail => "FAIL",
        };
        f.write_str(s)
    }
}

pub type Result<T> = std::result::Result<T, ReadError>;
