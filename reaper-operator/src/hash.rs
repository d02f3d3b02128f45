//! Content fingerprints for drift detection.
//!
//! The fingerprint is a SHA-256 over the canonical JSON of an object. The
//! canonical form drops server-owned metadata, status and the fingerprint
//! annotation itself, and sorts environment lists so their order does not
//! matter. Maps are already ordered.

use kube::Resource;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

pub const HASH_ANNOTATION: &str = "reaper.cassandra-reaper.io/resource-hash";

/// Metadata fields that are part of an object's content.
const CONTENT_METADATA: &[&str] = &["name", "namespace", "labels", "annotations"];

/// Compute the fingerprint of `obj`.
pub fn fingerprint<K: Serialize>(obj: &K) -> Result<String, serde_json::Error> {
    let mut value = serde_json::to_value(obj)?;
    canonicalize(&mut value);
    let bytes = serde_json::to_vec(&value)?;
    Ok(format!("{:x}", Sha256::digest(&bytes)))
}

/// Compute the fingerprint and store it as an annotation on `obj`.
pub fn add_hash_annotation<K>(obj: &mut K) -> Result<String, serde_json::Error>
where
    K: Resource + Serialize,
{
    let hash = fingerprint(obj)?;
    obj.meta_mut()
        .annotations
        .get_or_insert_with(Default::default)
        .insert(HASH_ANNOTATION.to_string(), hash.clone());
    Ok(hash)
}

/// Stored fingerprint of `obj`, if any.
pub fn stored_hash<K: Resource>(obj: &K) -> Option<&str> {
    obj.meta()
        .annotations
        .as_ref()
        .and_then(|a| a.get(HASH_ANNOTATION))
        .map(String::as_str)
}

/// True when both objects carry the same stored fingerprint.
pub fn same_hash<K: Resource>(desired: &K, actual: &K) -> bool {
    match (stored_hash(desired), stored_hash(actual)) {
        (Some(d), Some(a)) => d == a,
        _ => false,
    }
}

fn canonicalize(value: &mut Value) {
    if let Value::Object(obj) = value {
        obj.remove("status");
        if let Some(Value::Object(meta)) = obj.get_mut("metadata") {
            meta.retain(|k, _| CONTENT_METADATA.contains(&k.as_str()));
            if let Some(Value::Object(annotations)) = meta.get_mut("annotations") {
                annotations.remove(HASH_ANNOTATION);
                if annotations.is_empty() {
                    meta.remove("annotations");
                }
            }
        }
    }
    sort_unordered(value);
}

fn sort_unordered(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                sort_unordered(child);
                if key == "env" {
                    if let Value::Array(items) = child {
                        items.sort_by_cached_key(|item| item.to_string());
                    }
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_unordered),
        _ => {}
    }
}
