//! §4.7 ErrorMapper: turns a [`Verdict`] into log output, using the
//! [`KeyIdStash`] to suppress repeated `NoKey`/`NotTrusted` warnings per
//! signer key id. Two named targets so an embedding application can
//! filter signature outcomes separately from structural diagnostics.

use crate::error::Verdict;
use crate::keystash::KeyIdStash;

const TARGET_VERIFY: &str = "rpmhdr::verify";
const TARGET_HEADER: &str = "rpmhdr::header";

/// Log the outcome of one `read_package` call at the level the verdict
/// calls for. Does not change the verdict itself — the disposition
/// (success/failure) was already decided by the reader.
pub fn log_verdict(verdict: Verdict, keyid: u32, message: Option<&str>, stash: &KeyIdStash) {
    match verdict {
        Verdict::Ok => {
            log::debug!(target: TARGET_VERIFY, "header sanity check: OK");
        }
        Verdict::NotTrusted | Verdict::NoKey => {
            if stash.observe(keyid) {
                log::debug!(target: TARGET_VERIFY, "{verdict} for key {keyid:08x} (already reported)");
            } else {
                log::warn!(target: TARGET_VERIFY, "{verdict} for key {keyid:08x}");
            }
        }
        Verdict::NotFound => {
            if let Some(msg) = message {
                log::warn!(target: TARGET_HEADER, "{msg}");
            }
        }
        Verdict::Fail => {
            log::error!(target: TARGET_VERIFY, "{}", message.unwrap_or("verification failed"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warns_once_then_debugs_for_repeated_key() {
        let stash = KeyIdStash::new();
        // Can't easily assert on the `log` crate's output without a test
        // logger installed; exercise both branches for panics only.
        log_verdict(Verdict::NoKey, 0xAABBCCDD, None, &stash);
        log_verdict(Verdict::NoKey, 0xAABBCCDD, None, &stash);
    }
}
