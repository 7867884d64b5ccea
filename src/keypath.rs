//! Dotted key paths over nested dictionaries.
//!
//! `{"{Exif}": {"ISOSpeedRatings": [100]}}` indexes as
//! `["{Exif}", "{Exif}.ISOSpeedRatings"]`: depth-first, each parent before its
//! children, siblings in key order.

use crate::accessor::values_equal;
use crate::value::{Dictionary, Value};

/// Separator between path components.
pub const SEPARATOR: char = '.';

/// Every key path reachable in `dict`.
pub fn all_key_paths(dict: &Dictionary) -> Vec<String> {
    let mut paths = Vec::new();
    collect(dict, None, &mut paths);
    paths
}

fn collect(dict: &Dictionary, prefix: Option<&str>, out: &mut Vec<String>) {
    for (key, value) in dict {
        let path = match prefix {
            Some(p) => format!("{p}{SEPARATOR}{key}"),
            None => key.clone(),
        };
        out.push(path.clone());
        if let Value::Dictionary(sub) = value {
            collect(sub, Some(&path), out);
        }
    }
}

/// Resolve a dotted path to the value it names.
pub fn lookup<'a>(dict: &'a Dictionary, path: &str) -> Option<&'a Value> {
    let mut parts = path.split(SEPARATOR);
    let mut value = dict.get(parts.next()?)?;
    for part in parts {
        value = value.as_dictionary()?.get(part)?;
    }
    Some(value)
}

/// Store (or, with `None`, remove) the value at a dotted path.
///
/// Intermediate dictionaries are created as needed when storing. Returns
/// `false` when an intermediate component exists but is not a dictionary.
pub fn set_at_path(dict: &mut Dictionary, path: &str, value: Option<Value>) -> bool {
    match path.split_once(SEPARATOR) {
        None => {
            match value {
                Some(v) => {
                    dict.insert(path.to_string(), v);
                }
                None => {
                    dict.remove(path);
                }
            }
            true
        }
        Some((head, rest)) => {
            if value.is_none() && !dict.contains_key(head) {
                return true;
            }
            let entry = dict
                .entry(head.to_string())
                .or_insert_with(|| Value::Dictionary(Dictionary::new()));
            match entry.as_dictionary_mut() {
                Some(sub) => set_at_path(sub, rest, value),
                None => false,
            }
        }
    }
}

/// Paths whose values differ between `original` and `current`.
///
/// Includes paths present on only one side. A changed dictionary is reported
/// along with the changed paths beneath it.
pub fn changed_key_paths(original: &Dictionary, current: &Dictionary) -> Vec<String> {
    let mut paths: Vec<String> = all_key_paths(original);
    for path in all_key_paths(current) {
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    paths
        .into_iter()
        .filter(|p| !values_equal(lookup(original, p), lookup(current, p)))
        .collect()
}
