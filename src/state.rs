use std::sync::Arc;

use tracing::info;

use crate::auth::AuthRegistry;
use crate::config::{Config, StorageSettings};
use crate::error::AppError;
use crate::store::{Bucket, ObjectStore, S3Store};

/// One bucket gateway per resource namespace, sharing a single store client.
pub struct Stores {
    pub places: Bucket,
    pub trips: Bucket,
}

impl Stores {
    pub fn open(settings: &StorageSettings) -> Self {
        let store: Arc<dyn ObjectStore> = Arc::new(S3Store::open(settings));
        Self::with_store(store, &settings.places_prefix, &settings.trips_prefix)
    }

    pub fn with_store(
        store: Arc<dyn ObjectStore>,
        places_prefix: &str,
        trips_prefix: &str,
    ) -> Self {
        Self {
            places: Bucket::new(store.clone(), places_prefix),
            trips: Bucket::new(store, trips_prefix),
        }
    }
}

pub struct AppState {
    pub config: Config,
    stores: Result<Stores, Vec<&'static str>>,
    pub auth: Arc<AuthRegistry>,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        // A misconfigured store does not stop the server; affected handlers
        // answer 500 naming the missing settings.
        let stores = match &config.storage {
            Ok(settings) => {
                info!(bucket = %settings.bucket, region = %settings.region, "object store ready");
                Ok(Stores::open(settings))
            }
            Err(missing) => Err(missing.clone()),
        };

        Arc::new(Self {
            config,
            stores,
            auth: AuthRegistry::new(),
        })
    }

    /// Constructor for tests and alternate backends.
    pub fn with_stores(config: Config, stores: Result<Stores, Vec<&'static str>>) -> Arc<Self> {
        Arc::new(Self {
            config,
            stores,
            auth: AuthRegistry::new(),
        })
    }

    pub fn places(&self) -> Result<&Bucket, AppError> {
        Ok(&self.stores()?.places)
    }

    pub fn trips(&self) -> Result<&Bucket, AppError> {
        Ok(&self.stores()?.trips)
    }

    fn stores(&self) -> Result<&Stores, AppError> {
        self.stores
            .as_ref()
            .map_err(|missing| AppError::Config(missing.clone()))
    }
}
