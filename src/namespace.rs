//! Namespace registry: which typed view interprets which namespace key.
//!
//! The set is closed. Each known key maps to exactly one view; unknown keys
//! yield no child and stay reachable only through the generic accessors of
//! the parent node.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::metadata::{
    Metadata8Bim, MetadataCiff, MetadataDng, MetadataExif, MetadataExifAux, MetadataGif,
    MetadataGps, MetadataIptc, MetadataJfif, MetadataMakerApple, MetadataMakerCanon,
    MetadataMakerFuji, MetadataMakerMinolta, MetadataMakerNikon, MetadataMakerOlympus,
    MetadataMakerPentax, MetadataPng, MetadataRaw, MetadataTiff,
};
use crate::node::{MetadataNode, MetadataView, NamespaceView};

macro_rules! registry {
    ($($(#[$doc:meta])* $variant:ident => $key:literal, $view:ident;)+) => {
        /// A known metadata namespace.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Namespace {
            $($(#[$doc])* $variant),+
        }

        impl Namespace {
            pub const ALL: [Namespace; 19] = [$(Namespace::$variant),+];

            /// Key of this namespace's sub-dictionary in the root dictionary.
            pub fn key(&self) -> &'static str {
                match self {
                    $(Namespace::$variant => $key),+
                }
            }

            /// Build the view registered for this namespace around `node`.
            pub fn construct(self, node: MetadataNode) -> ChildNode {
                match self {
                    $(Namespace::$variant => ChildNode::$variant($view::from_node(node))),+
                }
            }
        }

        /// A child node, tagged by the namespace it was built for.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ChildNode {
            $($variant($view)),+
        }

        impl ChildNode {
            pub fn namespace(&self) -> Namespace {
                match self {
                    $(ChildNode::$variant(_) => Namespace::$variant),+
                }
            }

            pub fn node(&self) -> &MetadataNode {
                match self {
                    $(ChildNode::$variant(view) => view.node()),+
                }
            }

            pub fn node_mut(&mut self) -> &mut MetadataNode {
                match self {
                    $(ChildNode::$variant(view) => view.node_mut()),+
                }
            }

            pub fn into_node(self) -> MetadataNode {
                match self {
                    $(ChildNode::$variant(view) => view.into_node()),+
                }
            }
        }

        $(
            impl NamespaceView for $view {
                const NAMESPACE: Namespace = Namespace::$variant;
            }

            impl From<$view> for ChildNode {
                fn from(view: $view) -> Self {
                    ChildNode::$variant(view)
                }
            }
        )+
    };
}

registry! {
    Tiff => "{TIFF}", MetadataTiff;
    Exif => "{Exif}", MetadataExif;
    ExifAux => "{ExifAux}", MetadataExifAux;
    Gif => "{GIF}", MetadataGif;
    Jfif => "{JFIF}", MetadataJfif;
    Png => "{PNG}", MetadataPng;
    Iptc => "{IPTC}", MetadataIptc;
    Gps => "{GPS}", MetadataGps;
    Raw => "{Raw}", MetadataRaw;
    Ciff => "{CIFF}", MetadataCiff;
    MakerApple => "{MakerApple}", MetadataMakerApple;
    MakerCanon => "{MakerCanon}", MetadataMakerCanon;
    MakerNikon => "{MakerNikon}", MetadataMakerNikon;
    MakerMinolta => "{MakerMinolta}", MetadataMakerMinolta;
    MakerFuji => "{MakerFuji}", MetadataMakerFuji;
    MakerOlympus => "{MakerOlympus}", MetadataMakerOlympus;
    MakerPentax => "{MakerPentax}", MetadataMakerPentax;
    /// Photoshop image resources.
    Photoshop => "{8BIM}", Metadata8Bim;
    Dng => "{DNG}", MetadataDng;
}

static REGISTRY: LazyLock<HashMap<&'static str, Namespace>> =
    LazyLock::new(|| Namespace::ALL.iter().map(|ns| (ns.key(), *ns)).collect());

/// The namespace registered for `key`, if any.
pub fn lookup(key: &str) -> Option<Namespace> {
    REGISTRY.get(key).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Dictionary;

    #[test]
    fn registry_has_one_entry_per_namespace() {
        assert_eq!(Namespace::ALL.len(), 19);
        assert_eq!(REGISTRY.len(), Namespace::ALL.len());
    }

    #[test]
    fn lookup_round_trips_every_key() {
        for ns in Namespace::ALL {
            assert_eq!(lookup(ns.key()), Some(ns));
        }
    }

    #[test]
    fn lookup_unknown_key() {
        assert_eq!(lookup("{XMP}"), None);
        assert_eq!(lookup("Exif"), None);
        assert_eq!(lookup("{exif}"), None);
    }

    #[test]
    fn construct_tags_with_namespace() {
        let child = Namespace::Photoshop.construct(MetadataNode::new(Dictionary::new()));
        assert_eq!(child.namespace(), Namespace::Photoshop);
        assert!(matches!(child, ChildNode::Photoshop(_)));
    }

    #[test]
    fn typed_views_know_their_namespace() {
        assert_eq!(MetadataGps::NAMESPACE.key(), "{GPS}");
        assert_eq!(Metadata8Bim::NAMESPACE.key(), "{8BIM}");
    }
}
