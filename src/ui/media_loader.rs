// SPDX-License-Identifier: MPL-2.0

//! Async photo loading for memory cards.
//!
//! Three tiers: decoded memory LRU -> per-user sqlite blob cache -> network.
//! Concurrent requests for the same URL share one fetch, and downloads are
//! bounded by a semaphore so a feed full of photos doesn't stampede.

use crate::cache::{CacheDb, MediaCache};
use crate::runtime;
use gtk4::gdk;
use gtk4::glib;
use gtk4::prelude::Cast;
use image::GenericImageView;
use image::imageops::FilterType;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Concurrent photo downloads.
const MAX_CONCURRENT_DOWNLOADS: usize = 8;

/// Decoded photos kept in memory.
const DECODED_CACHE_CAPACITY: usize = 64;

/// Card photos get downscaled to this bound before display.
const MAX_PHOTO_SIZE: u32 = 640;

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .connect_timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("failed to create HTTP client")
});

static DOWNLOAD_SEMAPHORE: Lazy<Arc<Semaphore>> =
    Lazy::new(|| Arc::new(Semaphore::new(MAX_CONCURRENT_DOWNLOADS)));

static MEDIA_CACHE: Lazy<MediaCache> = Lazy::new(MediaCache::new);

/// Decoded pixels ready for texture creation.
#[derive(Clone)]
struct DecodedPhoto {
    rgba: Arc<Vec<u8>>,
    width: u32,
    height: u32,
}

struct DecodedLru {
    map: HashMap<String, DecodedPhoto>,
    order: Vec<String>,
}

impl DecodedLru {
    fn get(&mut self, key: &str) -> Option<DecodedPhoto> {
        let photo = self.map.get(key).cloned()?;
        self.order.retain(|k| k != key);
        self.order.push(key.to_string());
        Some(photo)
    }

    fn insert(&mut self, key: String, value: DecodedPhoto) {
        while self.map.len() >= DECODED_CACHE_CAPACITY && !self.order.is_empty() {
            let oldest = self.order.remove(0);
            self.map.remove(&oldest);
        }
        self.map.insert(key.clone(), value);
        self.order.retain(|k| k != &key);
        self.order.push(key);
    }
}

static DECODED_CACHE: Lazy<Mutex<DecodedLru>> = Lazy::new(|| {
    Mutex::new(DecodedLru {
        map: HashMap::new(),
        order: Vec::new(),
    })
});

/// In-flight requests: URL -> reply channels of every waiting widget.
static PENDING_REQUESTS: Lazy<Mutex<HashMap<String, Vec<std::sync::mpsc::Sender<DecodedPhoto>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Set once the user's cache database is open, after sign-in.
static CACHE_DB: RwLock<Option<Arc<CacheDb>>> = RwLock::new(None);

pub fn init(cache_db: Arc<CacheDb>) {
    let mut db = CACHE_DB.write().unwrap();
    *db = Some(cache_db);
}

/// Drop the per-user cache handle on sign-out.
pub fn reset() {
    let mut db = CACHE_DB.write().unwrap();
    *db = None;
}

/// Load a memory photo into a Picture, asynchronously if it isn't decoded yet.
pub fn load_photo(picture: gtk4::Picture, url: String) {
    {
        let mut decoded_cache = DECODED_CACHE.lock().unwrap();
        if let Some(decoded) = decoded_cache.get(&url) {
            apply_decoded(&picture, &decoded);
            return;
        }
    }

    let (tx, rx) = std::sync::mpsc::channel();

    // Piggyback on an in-flight fetch for the same URL when there is one.
    {
        let mut pending = PENDING_REQUESTS.lock().unwrap();
        if let Some(senders) = pending.get_mut(&url) {
            senders.push(tx);
            poll_for_photo(picture, rx);
            return;
        }
        pending.insert(url.clone(), vec![tx]);
    }

    poll_for_photo(picture, rx);

    let url_clone = url.clone();
    runtime::spawn(async move {
        fetch_and_decode(url_clone).await;
    });
}

fn poll_for_photo(picture: gtk4::Picture, rx: std::sync::mpsc::Receiver<DecodedPhoto>) {
    glib::timeout_add_local(std::time::Duration::from_millis(16), move || {
        match rx.try_recv() {
            Ok(decoded) => {
                apply_decoded(&picture, &decoded);
                glib::ControlFlow::Break
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
            Err(std::sync::mpsc::TryRecvError::Disconnected) => glib::ControlFlow::Break,
        }
    });
}

async fn fetch_and_decode(url: String) {
    let _permit: OwnedSemaphorePermit = match DOWNLOAD_SEMAPHORE.clone().acquire_owned().await {
        Ok(p) => p,
        Err(_) => {
            drop_pending(&url);
            return;
        }
    };

    // Disk lookup runs blocking, off the async workers.
    let url_for_disk = url.clone();
    let cached_bytes = tokio::task::spawn_blocking(move || {
        let db = CACHE_DB.read().unwrap().clone()?;
        MEDIA_CACHE.get(&db, &url_for_disk).map(|m| m.data)
    })
    .await
    .ok()
    .flatten();

    let bytes = match cached_bytes {
        Some(bytes) => bytes,
        None => {
            let fetched = match HTTP_CLIENT.get(&url).send().await {
                Ok(response) => match response.bytes().await {
                    Ok(b) => b.to_vec(),
                    Err(_) => {
                        drop_pending(&url);
                        return;
                    }
                },
                Err(_) => {
                    drop_pending(&url);
                    return;
                }
            };

            let url_for_store = url.clone();
            let data_for_store = fetched.clone();
            tokio::task::spawn_blocking(move || {
                if let Some(db) = CACHE_DB.read().unwrap().clone() {
                    let _ = MEDIA_CACHE.store(&db, &url_for_store, data_for_store, None);
                }
            });

            fetched
        }
    };

    let url_for_cache = url.clone();
    let decoded = tokio::task::spawn_blocking(move || {
        let decoded = decode_photo(&bytes)?;
        DECODED_CACHE
            .lock()
            .unwrap()
            .insert(url_for_cache, decoded.clone());
        Some(decoded)
    })
    .await;

    let decoded = match decoded {
        Ok(Some(d)) => d,
        _ => {
            drop_pending(&url);
            return;
        }
    };

    let senders = {
        let mut pending = PENDING_REQUESTS.lock().unwrap();
        pending.remove(&url).unwrap_or_default()
    };
    for sender in senders {
        let _ = sender.send(decoded.clone());
    }
}

/// Decode to RGBA, downscaling anything larger than the card bound.
fn decode_photo(bytes: &[u8]) -> Option<DecodedPhoto> {
    let img = image::load_from_memory(bytes).ok()?;
    let (width, height) = img.dimensions();

    let img = if width > MAX_PHOTO_SIZE || height > MAX_PHOTO_SIZE {
        let scale = MAX_PHOTO_SIZE as f32 / width.max(height) as f32;
        let new_width = (width as f32 * scale) as u32;
        let new_height = (height as f32 * scale) as u32;
        image::DynamicImage::ImageRgba8(image::imageops::resize(
            &img.to_rgba8(),
            new_width,
            new_height,
            FilterType::Triangle,
        ))
    } else {
        img
    };

    let (width, height) = img.dimensions();
    Some(DecodedPhoto {
        rgba: Arc::new(img.into_rgba8().into_raw()),
        width,
        height,
    })
}

fn drop_pending(url: &str) {
    let mut pending = PENDING_REQUESTS.lock().unwrap();
    pending.remove(url);
}

fn apply_decoded(picture: &gtk4::Picture, decoded: &DecodedPhoto) {
    let bytes = glib::Bytes::from(decoded.rgba.as_slice());
    let texture = gdk::MemoryTexture::new(
        decoded.width as i32,
        decoded.height as i32,
        gdk::MemoryFormat::R8g8b8a8,
        &bytes,
        decoded.width as usize * 4,
    );
    picture.set_paintable(Some(texture.upcast_ref::<gdk::Texture>()));
}

/// Trim the disk cache; run once after the cache database opens.
pub fn cleanup_cache() {
    if let Some(db) = CACHE_DB.read().unwrap().clone()
        && let Err(e) = MEDIA_CACHE.cleanup(&db)
    {
        eprintln!("Media cache cleanup failed: {e}");
    }
}
