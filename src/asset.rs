//! Photo-library asset access.
//!
//! A library hands back the original image data for an asset id, or
//! nothing. No client ships with the crate; applications implement
//! [`AssetLibrary`] over their platform library.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options forwarded to the library with each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRequestOptions {
    /// Allow the library to download assets that are not stored locally.
    pub network_access_allowed: bool,
}

impl Default for AssetRequestOptions {
    fn default() -> Self {
        Self {
            network_access_allowed: true,
        }
    }
}

#[async_trait]
pub trait AssetLibrary: Send + Sync {
    /// Image data of the asset, or `None` when the library has none.
    ///
    /// Called exactly once per metadata read; implementations decide on
    /// their own timeouts.
    async fn request_image_data(
        &self,
        asset_id: &str,
        options: &AssetRequestOptions,
    ) -> Option<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MetadataError;
    use crate::metadata::testing::{FakeCodec, FAKE_IMAGE};
    use crate::metadata::{Metadata, Orientation};
    use crate::value::{Dictionary, Value};
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryLibrary {
        assets: HashMap<String, Vec<u8>>,
        requests: Mutex<Vec<(String, AssetRequestOptions)>>,
    }

    #[async_trait]
    impl AssetLibrary for InMemoryLibrary {
        async fn request_image_data(
            &self,
            asset_id: &str,
            options: &AssetRequestOptions,
        ) -> Option<Vec<u8>> {
            self.requests
                .lock()
                .unwrap()
                .push((asset_id.to_string(), *options));
            self.assets.get(asset_id).cloned()
        }
    }

    fn codec() -> FakeCodec {
        let mut dict = Dictionary::new();
        dict.insert("Orientation".into(), Value::Integer(3));
        FakeCodec::with(dict)
    }

    #[tokio::test]
    async fn reads_asset_data() {
        let mut library = InMemoryLibrary::default();
        library.assets.insert("IMG_0001".into(), FAKE_IMAGE.to_vec());
        let options = AssetRequestOptions::default();

        let meta = Metadata::from_asset(&library, &codec(), "IMG_0001", &options)
            .await
            .unwrap();
        assert_eq!(meta.orientation(), Some(Orientation::Down));

        let requests = library.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0], ("IMG_0001".to_string(), options));
    }

    #[tokio::test]
    async fn missing_asset_data() {
        let library = InMemoryLibrary::default();
        let result = Metadata::from_asset(
            &library,
            &codec(),
            "nope",
            &AssetRequestOptions::default(),
        )
        .await;
        assert_eq!(result, Err(MetadataError::PhotoMissingData));
    }

    #[tokio::test]
    async fn empty_asset_data() {
        let mut library = InMemoryLibrary::default();
        library.assets.insert("empty".into(), Vec::new());
        let result = Metadata::from_asset(
            &library,
            &codec(),
            "empty",
            &AssetRequestOptions::default(),
        )
        .await;
        assert_eq!(result, Err(MetadataError::EmptyInput));
    }

    #[tokio::test]
    async fn works_through_a_trait_object() {
        let mut library = InMemoryLibrary::default();
        library.assets.insert("a".into(), FAKE_IMAGE.to_vec());
        let library: Box<dyn AssetLibrary> = Box::new(library);
        let options = AssetRequestOptions {
            network_access_allowed: false,
        };
        let meta = Metadata::from_asset(library.as_ref(), &codec(), "a", &options).await;
        assert!(meta.is_ok());
    }
}
