//! IPTC-IIM records and Photoshop image resource blocks.
//!
//! In JPEG files IPTC lives in an APP13 segment: a `Photoshop 3.0` header
//! followed by `8BIM` resource blocks, one of which (0x0404) carries the
//! IIM datasets. PSD files store the same resource blocks in their image
//! resources section.

use crate::value::{Dictionary, Value};

pub(super) const APP13_HEADER: &[u8] = b"Photoshop 3.0\0";
const RESOURCE_SIGNATURE: &[u8] = b"8BIM";

pub(super) const RESOURCE_IPTC: u16 = 0x0404;
pub(super) const RESOURCE_RESOLUTION: u16 = 0x03ED;
pub(super) const RESOURCE_EXIF: u16 = 0x0422;

const TAG_MARKER: u8 = 0x1C;
const APPLICATION_RECORD: u8 = 2;
const RECORD_VERSION: u8 = 0;

/// Application record datasets: number, dictionary key, repeatable.
const DATASETS: &[(u8, &str, bool)] = &[
    (5, "ObjectName", false),
    (10, "Urgency", false),
    (15, "Category", false),
    (25, "Keywords", true),
    (40, "SpecialInstructions", false),
    (55, "DateCreated", false),
    (60, "TimeCreated", false),
    (80, "Byline", true),
    (85, "BylineTitle", false),
    (90, "City", false),
    (92, "SubLocation", false),
    (95, "Province/State", false),
    (100, "Country/PrimaryLocationCode", false),
    (101, "Country/PrimaryLocationName", false),
    (105, "Headline", false),
    (110, "Credit", false),
    (115, "Source", false),
    (116, "CopyrightNotice", false),
    (120, "Caption/Abstract", false),
    (122, "Writer/Editor", false),
];

/// One `8BIM` image resource block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Resource {
    pub id: u16,
    /// Pascal name, length byte included.
    pub name: Vec<u8>,
    pub data: Vec<u8>,
}

/// Parse consecutive `8BIM` blocks, stopping at the first malformed one.
pub(super) fn parse_resources(data: &[u8]) -> Vec<Resource> {
    let mut resources = Vec::new();
    let mut pos = 0;
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != RESOURCE_SIGNATURE {
            break;
        }
        let id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        // pascal string padded to even length, length byte included
        let pascal_len = data[pos + 6] as usize;
        let pascal_padded = if (pascal_len + 1) % 2 == 0 {
            pascal_len + 1
        } else {
            pascal_len + 2
        };
        let name_end = pos + 6 + pascal_padded;
        if name_end + 4 > data.len() {
            break;
        }
        let data_len = u32::from_be_bytes([
            data[name_end],
            data[name_end + 1],
            data[name_end + 2],
            data[name_end + 3],
        ]) as usize;
        let data_start = name_end + 4;
        let Some(data_end) = data_start.checked_add(data_len).filter(|e| *e <= data.len()) else {
            break;
        };
        resources.push(Resource {
            id,
            name: data[pos + 6..name_end].to_vec(),
            data: data[data_start..data_end].to_vec(),
        });
        pos = data_end + data_len % 2;
    }
    resources
}

pub(super) fn write_resources(resources: &[Resource]) -> Vec<u8> {
    let mut out = Vec::new();
    for resource in resources {
        out.extend_from_slice(RESOURCE_SIGNATURE);
        out.extend_from_slice(&resource.id.to_be_bytes());
        if resource.name.is_empty() {
            out.extend_from_slice(&[0x00, 0x00]);
        } else {
            out.extend_from_slice(&resource.name);
        }
        out.extend_from_slice(&(resource.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&resource.data);
        if resource.data.len() % 2 != 0 {
            out.push(0x00);
        }
    }
    out
}

/// Resource blocks of an APP13 segment's contents.
pub(super) fn parse_app13(contents: &[u8]) -> Option<Vec<Resource>> {
    contents
        .strip_prefix(APP13_HEADER)
        .map(parse_resources)
}

pub(super) fn build_app13(resources: &[Resource]) -> Vec<u8> {
    let mut out = APP13_HEADER.to_vec();
    out.extend_from_slice(&write_resources(resources));
    out
}

/// A raw IIM dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Record {
    record: u8,
    dataset: u8,
    data: Vec<u8>,
}

fn parse_records(data: &[u8]) -> Vec<Record> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos + 5 <= data.len() && data[pos] == TAG_MARKER {
        let len = u16::from_be_bytes([data[pos + 3], data[pos + 4]]);
        // extended-length datasets are not used by the application record
        if len & 0x8000 != 0 {
            break;
        }
        let start = pos + 5;
        let end = start + len as usize;
        if end > data.len() {
            break;
        }
        records.push(Record {
            record: data[pos + 1],
            dataset: data[pos + 2],
            data: data[start..end].to_vec(),
        });
        pos = end;
    }
    records
}

fn push_record(out: &mut Vec<u8>, record: u8, dataset: u8, data: &[u8]) {
    let len = data.len().min(0x7FFF);
    out.extend_from_slice(&[TAG_MARKER, record, dataset]);
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(&data[..len]);
}

fn dataset_key(dataset: u8) -> Option<(&'static str, bool)> {
    DATASETS
        .iter()
        .find(|(number, _, _)| *number == dataset)
        .map(|(_, key, repeatable)| (*key, *repeatable))
}

/// Decode the application record into an `{IPTC}` dictionary.
pub(super) fn decode_iim(data: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    for record in parse_records(data) {
        if record.record != APPLICATION_RECORD {
            continue;
        }
        let Some((key, repeatable)) = dataset_key(record.dataset) else {
            continue;
        };
        let text = String::from_utf8_lossy(&record.data)
            .trim_end_matches('\0')
            .to_string();
        if repeatable {
            let entry = dict
                .entry(key.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(items) = entry {
                items.push(Value::String(text));
            }
        } else {
            dict.insert(key.to_string(), Value::String(text));
        }
    }
    dict
}

/// Encode an `{IPTC}` dictionary as IIM datasets.
///
/// The dictionary is authoritative for the datasets in the table. Datasets
/// outside it, and records other than the application record, are copied
/// from `existing`.
pub(super) fn encode_iim(iptc: &Dictionary, existing: Option<&[u8]>) -> Vec<u8> {
    let mut out = Vec::new();
    push_record(&mut out, APPLICATION_RECORD, RECORD_VERSION, &[0x00, 0x04]);

    for record in existing.map(parse_records).unwrap_or_default() {
        let known = record.record == APPLICATION_RECORD
            && (record.dataset == RECORD_VERSION || dataset_key(record.dataset).is_some());
        if !known {
            push_record(&mut out, record.record, record.dataset, &record.data);
        }
    }

    for (dataset, key, _) in DATASETS {
        match iptc.get(*key) {
            Some(Value::Array(items)) => {
                for item in items {
                    if let Some(text) = item.as_str() {
                        push_record(&mut out, APPLICATION_RECORD, *dataset, text.as_bytes());
                    }
                }
            }
            Some(Value::String(text)) => {
                push_record(&mut out, APPLICATION_RECORD, *dataset, text.as_bytes());
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                log::warn!("IPTC {key}: cannot store a {} value", other.type_name());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_iptc() -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert(
            "Keywords".into(),
            Value::Array(vec![Value::String("sunset".into()), Value::String("pier".into())]),
        );
        dict.insert("Caption/Abstract".into(), Value::String("Evening light".into()));
        dict.insert("City".into(), Value::String("Brighton".into()));
        dict
    }

    #[test]
    fn iim_round_trip() {
        let encoded = encode_iim(&sample_iptc(), None);
        assert_eq!(decode_iim(&encoded), sample_iptc());
    }

    #[test]
    fn unknown_datasets_survive_rewrite() {
        let mut existing = Vec::new();
        push_record(&mut existing, APPLICATION_RECORD, 0, &[0, 4]);
        push_record(&mut existing, APPLICATION_RECORD, 200, b"custom");
        push_record(&mut existing, APPLICATION_RECORD, 90, b"Old City");

        let encoded = encode_iim(&sample_iptc(), Some(&existing));
        let records = parse_records(&encoded);
        assert!(records.iter().any(|r| r.dataset == 200 && r.data == b"custom"));
        assert!(!records.iter().any(|r| r.data == b"Old City"));
        assert_eq!(records.iter().filter(|r| r.dataset == 0).count(), 1);
    }

    #[test]
    fn resources_round_trip_with_odd_lengths() {
        let resources = vec![
            Resource {
                id: RESOURCE_IPTC,
                name: vec![0, 0],
                data: vec![1, 2, 3],
            },
            Resource {
                id: 0x040C,
                name: vec![3, b'a', b'b', b'c'],
                data: vec![9; 4],
            },
        ];
        let bytes = write_resources(&resources);
        assert_eq!(bytes.len() % 2, 0);
        assert_eq!(parse_resources(&bytes), resources);
    }

    #[test]
    fn app13_requires_header() {
        let block = build_app13(&[Resource {
            id: RESOURCE_IPTC,
            name: vec![0, 0],
            data: encode_iim(&sample_iptc(), None),
        }]);
        assert_eq!(parse_app13(&block).map(|r| r.len()), Some(1));
        assert_eq!(parse_app13(b"not photoshop"), None);
    }

    #[test]
    fn truncated_data_is_tolerated() {
        let encoded = encode_iim(&sample_iptc(), None);
        let decoded = decode_iim(&encoded[..encoded.len() - 3]);
        assert!(decoded.contains_key("Keywords"));
        assert!(parse_resources(b"8BIM\x04").is_empty());
    }
}
