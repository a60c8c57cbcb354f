// SPDX-License-Identifier: MPL-2.0

mod auth_dialog;
mod composer_dialog;
mod map_view;
pub mod media_loader;
mod memory_card;
mod window;

pub use auth_dialog::{AuthDialog, AuthMode};
pub use composer_dialog::{ComposerDialog, MemoryDraft};
pub use map_view::MemoryMapView;
pub use memory_card::MemoryCard;
pub use window::ChronoMapWindow;
