//! The metadata tree node.
//!
//! A [`MetadataNode`] owns two snapshots of one property dictionary: the
//! `original` as read, which never changes, and the `current` copy that every
//! write goes to. Namespaced sub-dictionaries are materialized as independent
//! child nodes through the [namespace registry](crate::namespace); a child
//! only affects its parent once it is written back with
//! [`MetadataNode::set_child`].

use crate::accessor::{self, FromValue, IntoValue};
use crate::keypath;
use crate::namespace::{self, ChildNode, Namespace};
use crate::value::{Dictionary, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataNode {
    original: Dictionary,
    current: Dictionary,
}

impl MetadataNode {
    pub fn new(dictionary: Dictionary) -> Self {
        Self {
            current: dictionary.clone(),
            original: dictionary,
        }
    }

    /// The dictionary as it was read.
    pub fn original(&self) -> &Dictionary {
        &self.original
    }

    /// The dictionary including every write made so far.
    pub fn current(&self) -> &Dictionary {
        &self.current
    }

    /// The dictionary to hand to a codec: `current`, plus a `Null` for each
    /// top-level key that was read but has since been removed. A codec treats
    /// an omitted key as unchanged, so the removal has to be spelled out.
    pub fn into_update(self) -> Dictionary {
        let mut update = self.current;
        for key in self.original.into_keys() {
            update.entry(key).or_insert(Value::Null);
        }
        update
    }

    /// Typed read of `key`; `None` when missing or not coercible to `T`.
    pub fn value<T: FromValue>(&self, key: &str) -> Option<T> {
        accessor::get(&self.current, key)
    }

    /// Typed write of `key`; `None` removes it.
    pub fn set_value<T: IntoValue>(&mut self, key: &str, value: Option<T>) {
        accessor::set(&mut self.current, key, value);
    }

    pub fn raw_value(&self, key: &str) -> Option<&Value> {
        self.current.get(key)
    }

    /// Value at a dotted key path such as `{Exif}.ISOSpeedRatings`.
    pub fn value_at_path(&self, path: &str) -> Option<&Value> {
        keypath::lookup(&self.current, path)
    }

    /// Write (or remove) the value at a dotted key path.
    ///
    /// Returns `false` if the path runs through a value that is not a
    /// dictionary.
    pub fn set_value_at_path(&mut self, path: &str, value: Option<Value>) -> bool {
        keypath::set_at_path(&mut self.current, path, value)
    }

    /// Build the registered child view for `key`.
    ///
    /// `None` if the key is missing, not a dictionary, or not a registered
    /// namespace. Every call returns an independent copy.
    pub fn child(&self, key: &str) -> Option<ChildNode> {
        let namespace = namespace::lookup(key)?;
        let dict = self.current.get(key)?.as_dictionary()?;
        Some(namespace.construct(MetadataNode::new(dict.clone())))
    }

    /// Write a child's `current` dictionary back under `key`, or remove `key`.
    pub fn set_child(&mut self, key: &str, child: Option<ChildNode>) {
        match child {
            Some(child) => {
                self.current
                    .insert(key.to_string(), Value::Dictionary(child.into_node().current));
            }
            None => {
                self.current.remove(key);
            }
        }
    }

    /// Typed form of [`child`](Self::child) for a statically known namespace.
    pub fn typed_child<T: NamespaceView>(&self) -> Option<T> {
        let dict = self.current.get(T::NAMESPACE.key())?.as_dictionary()?;
        Some(T::from_node(MetadataNode::new(dict.clone())))
    }

    /// Typed form of [`set_child`](Self::set_child).
    pub fn set_typed_child<T: NamespaceView>(&mut self, child: Option<T>) {
        let key = T::NAMESPACE.key();
        match child {
            Some(child) => {
                self.current
                    .insert(key.to_string(), Value::Dictionary(child.into_node().current));
            }
            None => {
                self.current.remove(key);
            }
        }
    }

    /// Registered namespaces present as dictionaries in `current`.
    pub fn namespaces(&self) -> Vec<Namespace> {
        Namespace::ALL
            .iter()
            .copied()
            .filter(|ns| {
                self.current
                    .get(ns.key())
                    .is_some_and(|v| v.as_dictionary().is_some())
            })
            .collect()
    }

    pub fn key_paths(&self) -> Vec<String> {
        keypath::all_key_paths(&self.current)
    }

    /// Key paths whose value differs between `original` and `current`.
    pub fn changed_key_paths(&self) -> Vec<String> {
        keypath::changed_key_paths(&self.original, &self.current)
    }

    pub fn has_changes(&self) -> bool {
        !accessor::values_equal(
            Some(&Value::Dictionary(self.original.clone())),
            Some(&Value::Dictionary(self.current.clone())),
        )
    }
}

/// A typed view over one [`MetadataNode`].
///
/// Implemented by the root [`Metadata`](crate::metadata::Metadata) and by
/// every namespace view; the typed field accessors are layered on top.
pub trait MetadataView {
    fn from_node(node: MetadataNode) -> Self
    where
        Self: Sized;

    fn node(&self) -> &MetadataNode;

    fn node_mut(&mut self) -> &mut MetadataNode;

    fn into_node(self) -> MetadataNode
    where
        Self: Sized;

    /// Wrap a freshly read dictionary.
    fn from_dictionary(dictionary: Dictionary) -> Self
    where
        Self: Sized,
    {
        Self::from_node(MetadataNode::new(dictionary))
    }
}

/// A view registered for exactly one namespace key.
pub trait NamespaceView: MetadataView + Sized {
    const NAMESPACE: Namespace;
}

/// Define getter (and optional setter) methods that read and write one key
/// of the view's `current` dictionary.
macro_rules! accessors {
    () => {};
    (
        $(#[$doc:meta])*
        get $name:ident: $ty:ty = $key:literal;
        $($rest:tt)*
    ) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<$ty> {
            $crate::node::MetadataView::node(self).value($key)
        }
        $crate::node::accessors!($($rest)*);
    };
    (
        $(#[$doc:meta])*
        get $name:ident, set $setter:ident: $ty:ty = $key:literal;
        $($rest:tt)*
    ) => {
        $(#[$doc])*
        pub fn $name(&self) -> Option<$ty> {
            $crate::node::MetadataView::node(self).value($key)
        }
        pub fn $setter(&mut self, value: Option<$ty>) {
            $crate::node::MetadataView::node_mut(self).set_value($key, value)
        }
        $crate::node::accessors!($($rest)*);
    };
}

/// Declare a namespace view struct and its [`MetadataView`] impl.
macro_rules! namespace_view {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            node: $crate::node::MetadataNode,
        }

        impl $crate::node::MetadataView for $name {
            fn from_node(node: $crate::node::MetadataNode) -> Self {
                Self { node }
            }

            fn node(&self) -> &$crate::node::MetadataNode {
                &self.node
            }

            fn node_mut(&mut self) -> &mut $crate::node::MetadataNode {
                &mut self.node
            }

            fn into_node(self) -> $crate::node::MetadataNode {
                self.node
            }
        }
    };
}

pub(crate) use accessors;
pub(crate) use namespace_view;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MetadataExif, MetadataGps};

    fn sample() -> Dictionary {
        let mut exif = Dictionary::new();
        exif.insert(
            "ISOSpeedRatings".into(),
            Value::Array(vec![Value::Integer(100)]),
        );
        let mut gps = Dictionary::new();
        gps.insert("Latitude".into(), Value::Float(48.8584));
        gps.insert("LatitudeRef".into(), Value::String("N".into()));
        let mut root = Dictionary::new();
        root.insert("{Exif}".into(), Value::Dictionary(exif));
        root.insert("{GPS}".into(), Value::Dictionary(gps));
        root.insert("{Unknown}".into(), Value::Dictionary(Dictionary::new()));
        root.insert("Orientation".into(), Value::Integer(1));
        root
    }

    #[test]
    fn update_marks_removed_keys_null() {
        let mut node = MetadataNode::new(sample());
        node.set_value::<i64>("Orientation", None);
        node.set_value("PixelWidth", Some(640i64));
        let update = node.into_update();
        assert_eq!(update.get("Orientation"), Some(&Value::Null));
        assert_eq!(update.get("PixelWidth"), Some(&Value::Integer(640)));
        assert!(matches!(update.get("{Exif}"), Some(Value::Dictionary(_))));
    }

    #[test]
    fn unmutated_node_matches_original() {
        let node = MetadataNode::new(sample());
        assert_eq!(node.current(), node.original());
        assert_eq!(node.key_paths(), keypath::all_key_paths(node.original()));
        assert!(!node.has_changes());
        assert!(node.changed_key_paths().is_empty());
    }

    #[test]
    fn writes_target_current_only() {
        let mut node = MetadataNode::new(sample());
        node.set_value("Orientation", Some(6i64));
        assert_eq!(node.value::<i64>("Orientation"), Some(6));
        assert_eq!(node.original()["Orientation"], Value::Integer(1));
        assert!(node.has_changes());
        assert_eq!(node.changed_key_paths(), vec!["Orientation"]);
    }

    #[test]
    fn absent_value_round_trip() {
        let mut node = MetadataNode::new(sample());
        assert_eq!(node.value::<i64>("Missing"), None);
        node.set_value::<i64>("Orientation", None);
        assert_eq!(node.value::<i64>("Orientation"), None);
        assert!(node.raw_value("Orientation").is_none());
    }

    #[test]
    fn child_mutation_is_isolated_until_set_back() {
        let mut node = MetadataNode::new(sample());
        let mut exif = node.child("{Exif}").unwrap();
        exif.node_mut().set_value("ISOSpeedRatings", Some(vec![200i64]));

        // parent unchanged
        assert_eq!(
            node.value_at_path("{Exif}.ISOSpeedRatings"),
            Some(&Value::Array(vec![Value::Integer(100)]))
        );

        // a second copy does not see the first one's edits
        let other = node.child("{Exif}").unwrap();
        assert_eq!(
            other.node().value::<Vec<i64>>("ISOSpeedRatings"),
            Some(vec![100])
        );

        node.set_child("{Exif}", Some(exif));
        assert_eq!(
            node.value_at_path("{Exif}.ISOSpeedRatings"),
            Some(&Value::Array(vec![Value::Integer(200)]))
        );
        // previously built copy is unaffected by the write-back
        assert_eq!(
            other.node().value::<Vec<i64>>("ISOSpeedRatings"),
            Some(vec![100])
        );
    }

    #[test]
    fn set_child_none_removes_namespace() {
        let mut node = MetadataNode::new(sample());
        node.set_child("{GPS}", None);
        assert!(node.child("{GPS}").is_none());
        assert!(node.raw_value("{GPS}").is_none());
    }

    #[test]
    fn every_registered_namespace_yields_a_child() {
        let mut root = Dictionary::new();
        for ns in Namespace::ALL {
            root.insert(ns.key().to_string(), Value::Dictionary(Dictionary::new()));
        }
        let node = MetadataNode::new(root);
        for ns in Namespace::ALL {
            let child = node.child(ns.key()).unwrap();
            assert_eq!(child.namespace(), ns);
        }
        assert_eq!(node.namespaces().len(), Namespace::ALL.len());
    }

    #[test]
    fn unregistered_or_non_dictionary_keys_yield_no_child() {
        let node = MetadataNode::new(sample());
        assert!(node.child("{Unknown}").is_none());
        assert!(node.child("Orientation").is_none());
        assert!(node.child("{TIFF}").is_none());
        // still reachable through the generic path
        assert!(node.value::<Dictionary>("{Unknown}").is_some());
    }

    #[test]
    fn registered_key_holding_scalar_yields_no_child() {
        let mut root = Dictionary::new();
        root.insert("{Exif}".into(), Value::Integer(3));
        let node = MetadataNode::new(root);
        assert!(node.child("{Exif}").is_none());
        assert!(node.typed_child::<MetadataExif>().is_none());
    }

    #[test]
    fn typed_child_round_trip() {
        let mut node = MetadataNode::new(sample());
        let mut gps: MetadataGps = node.typed_child().unwrap();
        assert_eq!(gps.latitude(), Some(48.8584));
        gps.set_latitude(Some(10.0));
        node.set_typed_child(Some(gps));
        assert_eq!(node.value_at_path("{GPS}.Latitude"), Some(&Value::Float(10.0)));
        node.set_typed_child::<MetadataGps>(None);
        assert!(node.raw_value("{GPS}").is_none());
    }

    #[test]
    fn path_access_reaches_nested_fields() {
        let mut node = MetadataNode::new(sample());
        assert!(node.set_value_at_path("{GPS}.LatitudeRef", Some(Value::String("S".into()))));
        assert_eq!(
            node.value_at_path("{GPS}.LatitudeRef"),
            Some(&Value::String("S".into()))
        );
        assert!(!node.set_value_at_path("Orientation.Nested", Some(Value::Integer(1))));
    }
}
