//! Container reader
//!
//! Walks the segment catalogue of an immutable database image: magic and
//! version gates, an optional MD5 digest check over the body, then one typed
//! segment after another until the digest offset is reached. The walk either
//! produces a complete [`DB`] or fails; partially-loaded databases are never
//! exposed.

use std::collections::HashMap;
use std::io::Read;

use bytes::Bytes;
use md5::{Digest, Md5};
use tracing::debug;

use crate::db::DB;
use crate::error::{CoralError, Result};
use crate::segment::{FilterableIndex, Payload, SortableIndex};

use super::tape::{be_u32_at, Tape};

/// First four bytes of every container
pub const FORMAT_MAGIC: [u8; 4] = [0x40, 0xC7, 0x0D, 0xB1];
/// The only supported format version
pub const FORMAT_VERSION: u32 = 5;
/// MD5 digest length trailing the body
pub const DIGEST_SIZE: usize = 16;

pub(crate) const SEGMENT_PAYLOAD_FULL: u32 = 1;
pub(crate) const SEGMENT_PAYLOAD_EMPTY: u32 = 2;
pub(crate) const SEGMENT_FILTER_FIXED: u32 = 1000;
pub(crate) const SEGMENT_FILTER_VAR: u32 = 2000;
pub(crate) const SEGMENT_SORTABLE_FIXED: u32 = 3000;
pub(crate) const SEGMENT_SORTABLE_VAR: u32 = 4000;
pub(crate) const SEGMENT_FULL_FIXED: u32 = 5000;
pub(crate) const SEGMENT_FULL_VAR: u32 = 6000;

/// Read a database image without verifying its digest
pub fn read_db<R: Read>(mut reader: R) -> Result<DB> {
    let mut image = Vec::new();
    reader.read_to_end(&mut image)?;
    decode(Bytes::from(image), false)
}

/// Read a database image, failing with `CorruptedData` on digest mismatch
pub fn read_verify_db<R: Read>(mut reader: R) -> Result<DB> {
    let mut image = Vec::new();
    reader.read_to_end(&mut image)?;
    decode(Bytes::from(image), true)
}

pub(crate) fn decode(image: Bytes, verify: bool) -> Result<DB> {
    if image.len() < FORMAT_MAGIC.len() {
        return Err(CoralError::ShortData);
    }
    if image[..4] != FORMAT_MAGIC {
        return Err(CoralError::WrongMagic);
    }
    if image.len() < 8 {
        return Err(CoralError::ShortData);
    }
    let version = be_u32_at(&image, 4);
    if version != FORMAT_VERSION {
        return Err(CoralError::UnsupportedVersion(version));
    }
    if image.len() < 8 + DIGEST_SIZE {
        return Err(CoralError::ShortData);
    }

    let body = image.slice(8..image.len() - DIGEST_SIZE);
    if verify {
        let mut hasher = Md5::new();
        hasher.update(&body);
        let digest = hasher.finalize();
        if digest.as_slice() != &image[image.len() - DIGEST_SIZE..] {
            return Err(CoralError::corrupted("body digest mismatch"));
        }
    }

    let mut filters: HashMap<String, FilterableIndex> = HashMap::new();
    let mut sorters: HashMap<String, SortableIndex> = HashMap::new();
    let mut payload: Option<Payload> = None;

    let mut tape = Tape::new(body);
    while !tape.is_empty() {
        let size = tape.read_u64()? as usize;
        let segment_type = tape.read_u32()?;
        let body = tape.take(size)?;
        debug!(segment_type, size, "read segment");

        match segment_type {
            SEGMENT_PAYLOAD_FULL | SEGMENT_PAYLOAD_EMPTY => {
                if payload.is_some() {
                    return Err(CoralError::corrupted("duplicate payload segment"));
                }
                payload = Some(if segment_type == SEGMENT_PAYLOAD_FULL {
                    Payload::parse_full(body)?
                } else {
                    Payload::parse_empty(body)?
                });
            }
            SEGMENT_FILTER_FIXED | SEGMENT_FILTER_VAR => {
                let index = FilterableIndex::parse(body, segment_type == SEGMENT_FILTER_FIXED)?;
                insert_filter(&mut filters, index)?;
            }
            SEGMENT_SORTABLE_FIXED | SEGMENT_SORTABLE_VAR => {
                let index = SortableIndex::parse(body, segment_type == SEGMENT_SORTABLE_FIXED)?;
                insert_sorter(&mut sorters, index)?;
            }
            SEGMENT_FULL_FIXED | SEGMENT_FULL_VAR => {
                // A full index serves both roles over one dictionary.
                let index = SortableIndex::parse(body, segment_type == SEGMENT_FULL_FIXED)?;
                insert_filter(&mut filters, index.to_filterable())?;
                insert_sorter(&mut sorters, index)?;
            }
            other => {
                return Err(CoralError::corrupted(format!(
                    "unknown segment type {other}"
                )));
            }
        }
    }

    let payload = payload.ok_or(CoralError::NoPayload)?;
    let doc_count = payload.len();
    for index in filters.values() {
        index.validate(doc_count)?;
    }
    for index in sorters.values() {
        index.validate(doc_count)?;
    }
    debug!(
        documents = doc_count,
        filters = filters.len(),
        sorters = sorters.len(),
        "database loaded"
    );

    Ok(DB::assemble(filters, sorters, payload))
}

fn insert_filter(
    filters: &mut HashMap<String, FilterableIndex>,
    index: FilterableIndex,
) -> Result<()> {
    let name = index.name().to_owned();
    if filters.insert(name.clone(), index).is_some() {
        return Err(CoralError::corrupted(format!(
            "duplicate filterable index {name:?}"
        )));
    }
    Ok(())
}

fn insert_sorter(
    sorters: &mut HashMap<String, SortableIndex>,
    index: SortableIndex,
) -> Result<()> {
    let name = index.name().to_owned();
    if sorters.insert(name.clone(), index).is_some() {
        return Err(CoralError::corrupted(format!(
            "duplicate sortable index {name:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_magic() {
        let image = vec![0u8; 32];
        assert!(matches!(
            read_db(image.as_slice()),
            Err(CoralError::WrongMagic)
        ));
    }

    #[test]
    fn test_unsupported_version() {
        let mut image = FORMAT_MAGIC.to_vec();
        image.extend_from_slice(&6u32.to_be_bytes());
        image.extend_from_slice(&[0u8; DIGEST_SIZE]);
        assert!(matches!(
            read_db(image.as_slice()),
            Err(CoralError::UnsupportedVersion(6))
        ));
    }

    #[test]
    fn test_truncated_header() {
        assert!(matches!(
            read_db([0x40u8, 0xC7].as_slice()),
            Err(CoralError::ShortData)
        ));

        let mut image = FORMAT_MAGIC.to_vec();
        image.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        // No room for the digest.
        assert!(matches!(
            read_db(image.as_slice()),
            Err(CoralError::ShortData)
        ));
    }

    #[test]
    fn test_missing_payload() {
        let mut image = FORMAT_MAGIC.to_vec();
        image.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        let body: [u8; 0] = [];
        let mut hasher = Md5::new();
        hasher.update(body);
        image.extend_from_slice(hasher.finalize().as_slice());
        assert!(matches!(
            read_verify_db(image.as_slice()),
            Err(CoralError::NoPayload)
        ));
    }

    #[test]
    fn test_unknown_segment_type() {
        let mut body = Vec::new();
        body.extend_from_slice(&0u64.to_be_bytes());
        body.extend_from_slice(&777u32.to_be_bytes());

        let mut image = FORMAT_MAGIC.to_vec();
        image.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        image.extend_from_slice(&body);
        image.extend_from_slice(&[0u8; DIGEST_SIZE]);
        assert!(matches!(
            read_db(image.as_slice()),
            Err(CoralError::CorruptedData(_))
        ));
    }

    #[test]
    fn test_segment_size_overruns_body() {
        let mut body = Vec::new();
        body.extend_from_slice(&1_000_000u64.to_be_bytes());
        body.extend_from_slice(&SEGMENT_PAYLOAD_EMPTY.to_be_bytes());

        let mut image = FORMAT_MAGIC.to_vec();
        image.extend_from_slice(&FORMAT_VERSION.to_be_bytes());
        image.extend_from_slice(&body);
        image.extend_from_slice(&[0u8; DIGEST_SIZE]);
        assert!(matches!(
            read_db(image.as_slice()),
            Err(CoralError::ShortData)
        ));
    }
}
