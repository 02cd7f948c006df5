//! §6/C8 LeadReader: the fixed 96-byte lead record. Named as an
//! external collaborator in §1 ("out of scope"); this crate ships the
//! mechanical default because parsing a fixed record is plumbing, not
//! policy — the policy decisions (what a `Source` lead implies for
//! retrofit) stay in the orchestrator (§4.5 step 6).

use std::io::Read;

use crate::error::Result;

const LEAD_SIZE: usize = 96;
const LEAD_MAGIC: [u8; 4] = [0xed, 0xab, 0xee, 0xdb];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadType {
    Binary,
    Source,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadOutcome {
    Found(LeadType),
    /// "Not found": the file is probably a text manifest, not a
    /// package. Not an error (§7 `NotAPackage`).
    NotFound,
}

/// `lead_read(fd) -> (leadType, err?)`, §6.
pub trait LeadReader {
    fn read(&self, reader: &mut dyn Read) -> Result<LeadOutcome>;
}

#[derive(Debug, Default)]
pub struct DefaultLeadReader;

impl LeadReader for DefaultLeadReader {
    fn read(&self, reader: &mut dyn Read) -> Result<LeadOutcome> {
        let mut buf = [0u8; LEAD_SIZE];
        let mut total = 0usize;
        loop {
            let n = reader.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
            if total == LEAD_SIZE {
                break;
            }
        }
        if total != LEAD_SIZE {
            // Too short to be a lead at all: treat as "not a package"
            // rather than a hard failure, matching the source's
            // tolerance for non-package input on this first read.
            return Ok(LeadOutcome::NotFound);
        }
        if buf[0..4] != LEAD_MAGIC {
            return Ok(LeadOutcome::NotFound);
        }
        let type_field = u16::from_be_bytes([buf[6], buf[7]]);
        match type_field {
            0 => Ok(LeadOutcome::Found(LeadType::Binary)),
            1 => Ok(LeadOutcome::Found(LeadType::Source)),
            _ => Ok(LeadOutcome::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lead_bytes(type_field: u16) -> Vec<u8> {
        let mut buf = vec![0u8; LEAD_SIZE];
        buf[0..4].copy_from_slice(&LEAD_MAGIC);
        buf[4] = 3; // major
        buf[5] = 0; // minor
        buf[6..8].copy_from_slice(&type_field.to_be_bytes());
        buf
    }

    #[test]
    fn reads_binary_lead() {
        let mut cursor = std::io::Cursor::new(lead_bytes(0));
        let outcome = DefaultLeadReader.read(&mut cursor).unwrap();
        assert_eq!(LeadOutcome::Found(LeadType::Binary), outcome);
    }

    #[test]
    fn reads_source_lead() {
        let mut cursor = std::io::Cursor::new(lead_bytes(1));
        let outcome = DefaultLeadReader.read(&mut cursor).unwrap();
        assert_eq!(LeadOutcome::Found(LeadType::Source), outcome);
    }

    #[test]
    fn text_manifest_is_not_found_not_an_error() {
        let mut cursor = std::io::Cursor::new(b"Name: foo\nVersion: 1\n".to_vec());
        let outcome = DefaultLeadReader.read(&mut cursor).unwrap();
        assert_eq!(LeadOutcome::NotFound, outcome);
    }
}
