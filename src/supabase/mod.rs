// SPDX-License-Identifier: MPL-2.0

mod client;
mod types;

pub use client::{ChronoClient, ClientError, media_object_key};
pub use types::{FeedMode, Memory, NewMemory, Profile, Session, UNKNOWN_AUTHOR, year_of};
