// SPDX-License-Identifier: MPL-2.0

#![allow(dead_code)]

pub const APP_ID: &str = "io.github.chronomap.ChronoMap";
pub const APP_NAME: &str = "ChronoMap";

#[cfg(feature = "devel")]
pub const IS_DEVEL: bool = true;
#[cfg(not(feature = "devel"))]
pub const IS_DEVEL: bool = false;

/// Storage bucket holding uploaded memory photos.
pub const MEDIA_BUCKET: &str = "memories";

/// Initial map view before any memories are loaded.
pub const DEFAULT_CENTER: (f64, f64) = (20.0, 0.0);
pub const DEFAULT_ZOOM: f64 = 2.0;

/// Zoom used when jumping to a freshly posted memory.
pub const PIN_JUMP_ZOOM: f64 = 8.0;

/// Timeline slider bounds.
pub const YEAR_MIN: i32 = 2000;
pub const YEAR_MAX: i32 = 2030;

const ENV_BACKEND_URL: &str = "CHRONOMAP_BACKEND_URL";
const ENV_BACKEND_KEY: &str = "CHRONOMAP_BACKEND_KEY";

/// Backend endpoint, e.g. `https://xyz.supabase.co`. External configuration;
/// the client refuses to start without it.
pub fn backend_url() -> Option<String> {
    std::env::var(ENV_BACKEND_URL).ok().filter(|v| !v.is_empty())
}

/// Anon API key for the backend.
pub fn backend_key() -> Option<String> {
    std::env::var(ENV_BACKEND_KEY).ok().filter(|v| !v.is_empty())
}
