use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

use crate::auth::MockCredentials;
use crate::store::normalize_prefix;

pub struct Config {
    pub port: u16,
    /// `Err` carries the names of the missing required settings; every
    /// storage-backed handler reports them in its 500 response.
    pub storage: Result<StorageSettings, Vec<&'static str>>,
    pub credentials: MockCredentials,
}

pub struct StorageSettings {
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// S3-compatible endpoint override (MinIO etc.); AWS when unset.
    pub endpoint: Option<String>,
    pub places_prefix: String,
    pub trips_prefix: String,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("SERVER_PORT", "8080"),
            storage: load_storage(),
            credentials: MockCredentials {
                email: try_load("ADMIN_EMAIL", "admin@patrimoniu.tl"),
                password: try_load("ADMIN_PASSWORD", "loron-furak"),
            },
        }
    }
}

fn load_storage() -> Result<StorageSettings, Vec<&'static str>> {
    let mut missing = Vec::new();

    let region = require("S3_REGION", &mut missing);
    let bucket = require("S3_BUCKET", &mut missing);
    let access_key_id = require("S3_ACCESS_KEY_ID", &mut missing);
    let secret_access_key = require_secret("S3_SECRET_ACCESS_KEY", &mut missing);

    match (region, bucket, access_key_id, secret_access_key) {
        (Some(region), Some(bucket), Some(access_key_id), Some(secret_access_key)) => {
            Ok(StorageSettings {
                region,
                bucket,
                access_key_id,
                secret_access_key,
                endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
                places_prefix: normalize_prefix(&try_load::<String>("PLACES_PREFIX", "places")),
                trips_prefix: normalize_prefix(&try_load::<String>("TRIPS_PREFIX", "trips")),
            })
        }
        _ => {
            warn!(
                "Object storage not configured, missing: {}",
                missing.join(", ")
            );
            Err(missing)
        }
    }
}

fn require(key: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    match env::var(key).ok().filter(|v| !v.is_empty()) {
        Some(value) => Some(value),
        None => {
            missing.push(key);
            None
        }
    }
}

/// Secrets may come from the environment or a `/run/secrets/<NAME>` file.
fn require_secret(key: &'static str, missing: &mut Vec<&'static str>) -> Option<String> {
    if let Ok(value) = env::var(key) {
        if !value.is_empty() {
            return Some(value);
        }
    }

    let secret = read_to_string(format!("/run/secrets/{key}"))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    if secret.is_none() {
        missing.push(key);
    }
    secret
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
