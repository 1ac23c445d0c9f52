//! Build side of the container format
//!
//! Collects documents with their indexed field values, collates per-field
//! postings, and serializes the immutable image the reader consumes: framed
//! segments between the version header and the trailing MD5 digest.
//!
//! Dictionaries come out fixed-length when every value of a field shares one
//! length, variable-length otherwise. Multimaps are dense by default; fields
//! expected to be very sparse can opt into the list form.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use md5::{Digest, Md5};

use crate::bitset::DenseBitSet;
use crate::error::{CoralError, Result};
use crate::segment::{MULTIMAP_BITSET, MULTIMAP_LIST};

use super::reader::{
    FORMAT_MAGIC, FORMAT_VERSION, SEGMENT_FILTER_FIXED, SEGMENT_FILTER_VAR, SEGMENT_FULL_FIXED,
    SEGMENT_FULL_VAR, SEGMENT_PAYLOAD_EMPTY, SEGMENT_PAYLOAD_FULL, SEGMENT_SORTABLE_FIXED,
    SEGMENT_SORTABLE_VAR,
};

type Postings = BTreeMap<Vec<u8>, Vec<u32>>;

/// One document under construction
#[derive(Clone, Debug, Default)]
pub struct DocumentBuilder {
    filterable: Vec<(String, Vec<u8>)>,
    sortable: Vec<(String, Vec<u8>)>,
    full: Vec<(String, Vec<u8>)>,
    payload: Option<Vec<u8>>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filterable value; a field may carry several per document
    pub fn filterable(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.filterable.push((name.into(), value.into()));
        self
    }

    /// Add a sortable value; exactly one per document and field
    pub fn sortable(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.sortable.push((name.into(), value.into()));
        self
    }

    /// Add a value indexed for both filtering and sorting
    pub fn full(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.full.push((name.into(), value.into()));
        self
    }

    /// Set the document's raw payload bytes
    pub fn payload(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.payload = Some(data.into());
        self
    }
}

/// Collects documents and serializes the container image
#[derive(Debug, Default)]
pub struct DatabaseBuilder {
    documents: Vec<DocumentBuilder>,
    list_multimap_fields: BTreeSet<String>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document; its id is the current document count
    pub fn document(&mut self, doc: DocumentBuilder) -> &mut Self {
        self.documents.push(doc);
        self
    }

    /// Emit `field`'s multimap in the sparse list form instead of the dense
    /// bit-set form
    pub fn with_list_multimap(&mut self, field: impl Into<String>) -> &mut Self {
        self.list_multimap_fields.insert(field.into());
        self
    }

    /// Serialize the container into a byte vector
    pub fn build(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write_to(&mut out)?;
        Ok(out)
    }

    /// Serialize the container into `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        let doc_count = self.documents.len();
        if u32::try_from(doc_count).is_err() {
            return Err(CoralError::user(format!(
                "{doc_count} documents exceed the container's u32 id space"
            )));
        }

        let mut filterable: BTreeMap<String, Postings> = BTreeMap::new();
        let mut sortable: BTreeMap<String, Postings> = BTreeMap::new();
        let mut full: BTreeMap<String, Postings> = BTreeMap::new();
        for (id, doc) in self.documents.iter().enumerate() {
            collate(&mut filterable, &doc.filterable, id as u32);
            collate(&mut sortable, &doc.sortable, id as u32);
            collate(&mut full, &doc.full, id as u32);
        }
        for name in full.keys() {
            if filterable.contains_key(name) || sortable.contains_key(name) {
                return Err(CoralError::user(format!(
                    "field {name:?} is declared both full and filterable/sortable"
                )));
            }
        }

        let mut body = Vec::new();
        for (name, postings) in &filterable {
            self.write_index_segment(
                &mut body,
                name,
                postings,
                None,
                doc_count,
                SEGMENT_FILTER_FIXED,
                SEGMENT_FILTER_VAR,
            )?;
        }
        for (name, postings) in &sortable {
            let doc_map = doc_value_map(name, postings, doc_count)?;
            self.write_index_segment(
                &mut body,
                name,
                postings,
                Some(&doc_map),
                doc_count,
                SEGMENT_SORTABLE_FIXED,
                SEGMENT_SORTABLE_VAR,
            )?;
        }
        for (name, postings) in &full {
            let doc_map = doc_value_map(name, postings, doc_count)?;
            self.write_index_segment(
                &mut body,
                name,
                postings,
                Some(&doc_map),
                doc_count,
                SEGMENT_FULL_FIXED,
                SEGMENT_FULL_VAR,
            )?;
        }
        self.write_payload_segment(&mut body);

        writer.write_all(&FORMAT_MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_be_bytes())?;
        writer.write_all(&body)?;
        let mut hasher = Md5::new();
        hasher.update(&body);
        writer.write_all(hasher.finalize().as_slice())?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_index_segment(
        &self,
        out: &mut Vec<u8>,
        name: &str,
        postings: &Postings,
        doc_map: Option<&[u32]>,
        doc_count: usize,
        fixed_type: u32,
        var_type: u32,
    ) -> Result<()> {
        let (dictionary, fixed) = encode_dictionary(postings);
        let multimap = if self.list_multimap_fields.contains(name) {
            encode_list_multimap(postings)
        } else {
            encode_dense_multimap(postings, doc_count)
        };

        let mut segment = Vec::new();
        put_u32(&mut segment, name.len() as u32);
        segment.extend_from_slice(name.as_bytes());
        put_u64(&mut segment, dictionary.len() as u64);
        segment.extend_from_slice(&dictionary);
        put_u64(&mut segment, multimap.len() as u64);
        segment.extend_from_slice(&multimap);
        if let Some(doc_map) = doc_map {
            put_u32(&mut segment, doc_map.len() as u32);
            for &value in doc_map {
                put_u32(&mut segment, value);
            }
        }

        let segment_type = if fixed { fixed_type } else { var_type };
        frame_segment(out, segment_type, &segment);
        Ok(())
    }

    fn write_payload_segment(&self, out: &mut Vec<u8>) {
        if self.documents.iter().all(|doc| doc.payload.is_none()) {
            let mut segment = Vec::new();
            put_u32(&mut segment, self.documents.len() as u32);
            frame_segment(out, SEGMENT_PAYLOAD_EMPTY, &segment);
            return;
        }

        let mut chunk = Vec::new();
        put_u32(&mut chunk, self.documents.len() as u32);
        let mut offset = 0u64;
        put_u64(&mut chunk, offset);
        for doc in &self.documents {
            offset += doc.payload.as_ref().map(Vec::len).unwrap_or(0) as u64;
            put_u64(&mut chunk, offset);
        }
        for doc in &self.documents {
            if let Some(payload) = &doc.payload {
                chunk.extend_from_slice(payload);
            }
        }

        let mut segment = Vec::new();
        put_u64(&mut segment, chunk.len() as u64);
        segment.extend_from_slice(&chunk);
        frame_segment(out, SEGMENT_PAYLOAD_FULL, &segment);
    }
}

fn collate(fields: &mut BTreeMap<String, Postings>, values: &[(String, Vec<u8>)], id: u32) {
    for (name, value) in values {
        let docs = fields
            .entry(name.clone())
            .or_default()
            .entry(value.clone())
            .or_default();
        if docs.last() != Some(&id) {
            docs.push(id);
        }
    }
}

fn doc_value_map(name: &str, postings: &Postings, doc_count: usize) -> Result<Vec<u32>> {
    let mut map = vec![None; doc_count];
    for (key, (_value, docs)) in postings.iter().enumerate() {
        for &doc in docs {
            if map[doc as usize].is_some() {
                return Err(CoralError::user(format!(
                    "document {doc} carries multiple values for sortable field {name:?}"
                )));
            }
            map[doc as usize] = Some(key as u32);
        }
    }
    map.into_iter()
        .enumerate()
        .map(|(doc, key)| {
            key.ok_or_else(|| {
                CoralError::user(format!(
                    "document {doc} carries no value for sortable field {name:?}"
                ))
            })
        })
        .collect()
}

fn encode_dictionary(postings: &Postings) -> (Vec<u8>, bool) {
    let first_len = postings.keys().next().map(Vec::len).unwrap_or(0);
    let fixed = first_len > 0 && postings.keys().all(|value| value.len() == first_len);

    let mut out = Vec::new();
    put_u32(&mut out, postings.len() as u32);
    if fixed {
        put_u32(&mut out, first_len as u32);
        for value in postings.keys() {
            out.extend_from_slice(value);
        }
    } else {
        let mut offset = 0u64;
        put_u64(&mut out, offset);
        for value in postings.keys() {
            offset += value.len() as u64;
            put_u64(&mut out, offset);
        }
        for value in postings.keys() {
            out.extend_from_slice(value);
        }
    }
    (out, fixed)
}

fn encode_dense_multimap(postings: &Postings, doc_count: usize) -> Vec<u8> {
    let words_per_key = DenseBitSet::words_for(doc_count);
    let mut out = Vec::new();
    put_u32(&mut out, MULTIMAP_BITSET);
    put_u32(&mut out, postings.len() as u32);
    put_u32(&mut out, words_per_key as u32);
    for docs in postings.values() {
        let mut words = vec![0u64; words_per_key];
        for &doc in docs {
            words[doc as usize / 64] |= 1u64 << (doc % 64);
        }
        for word in words {
            out.extend_from_slice(&word.to_be_bytes());
        }
    }
    out
}

fn encode_list_multimap(postings: &Postings) -> Vec<u8> {
    let mut out = Vec::new();
    put_u32(&mut out, MULTIMAP_LIST);
    put_u32(&mut out, postings.len() as u32);
    let mut offset = 0u64;
    put_u64(&mut out, offset);
    for docs in postings.values() {
        offset += docs.len() as u64;
        put_u64(&mut out, offset);
    }
    for docs in postings.values() {
        for &doc in docs {
            put_u32(&mut out, doc);
        }
    }
    out
}

fn frame_segment(out: &mut Vec<u8>, segment_type: u32, body: &[u8]) {
    put_u64(out, body.len() as u64);
    put_u32(out, segment_type);
    out.extend_from_slice(body);
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn put_u64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}
