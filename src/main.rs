// SPDX-License-Identifier: MPL-2.0

mod app;
mod cache;
mod config;
mod geo;
mod map;
mod runtime;
mod state;
mod supabase;
mod ui;

use gtk4::prelude::*;

fn main() {
    let app = app::ChronoMapApplication::new();
    app.run();
}
