// SPDX-License-Identifier: MPL-2.0

use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use gtk4::{gio, glib};
use libadwaita as adw;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use crate::cache::CacheDb;
use crate::config;
use crate::geo::{self, GeoPlace};
use crate::map;
use crate::state::{AppSettings, SessionManager, ViewState};
use crate::supabase::{
    ChronoClient, FeedMode, Memory, NewMemory, Profile, Session, media_object_key,
};
use crate::ui::media_loader;
use crate::ui::{AuthDialog, AuthMode, ChronoMapWindow, ComposerDialog, MemoryCard, MemoryDraft};

mod imp {
    use super::*;
    use libadwaita::subclass::prelude::*;

    #[derive(Default)]
    pub struct ChronoMapApplication {
        pub client: RefCell<Option<Arc<ChronoClient>>>,
        pub window: RefCell<Option<ChronoMapWindow>>,
        pub composer: RefCell<Option<ComposerDialog>>,
        /// All view state, owned here and nowhere else.
        pub view_state: RefCell<ViewState>,
        pub settings: RefCell<AppSettings>,
        /// Monotonic fetch counter; completions from an older fetch are
        /// discarded instead of overwriting newer state.
        pub fetch_generation: Cell<u64>,
        /// Memories with a like request on the wire, so a double click can't
        /// insert twice before the first response lands.
        pub like_in_flight: RefCell<HashSet<i64>>,
        pub saving: Cell<bool>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ChronoMapApplication {
        const NAME: &'static str = "ChronoMapApplication";
        type Type = super::ChronoMapApplication;
        type ParentType = adw::Application;
    }

    impl ObjectImpl for ChronoMapApplication {
        fn constructed(&self) {
            self.parent_constructed();

            match ChronoClient::from_env() {
                Ok(client) => {
                    self.client.replace(Some(Arc::new(client)));
                }
                Err(e) => {
                    eprintln!("Backend not configured: {e}");
                }
            }

            let settings = AppSettings::load();
            self.view_state
                .replace(ViewState::new(settings.feed_mode(), settings.view_year()));
            self.settings.replace(settings);
        }
    }

    impl ApplicationImpl for ChronoMapApplication {
        fn startup(&self) {
            self.parent_startup();

            let display = gtk4::gdk::Display::default().expect("Could not get default display");
            let css_provider = gtk4::CssProvider::new();
            css_provider.load_from_data(include_str!("ui/style.css"));
            gtk4::style_context_add_provider_for_display(
                &display,
                &css_provider,
                gtk4::STYLE_PROVIDER_PRIORITY_APPLICATION,
            );
        }

        fn activate(&self) {
            let app = self.obj();

            let window = ChronoMapWindow::new(app.upcast_ref::<adw::Application>());
            self.window.replace(Some(window.clone()));

            let app_clone = app.clone();
            window.set_feed_mode_callback(move |mode| {
                app_clone.switch_feed_mode(mode);
            });

            let app_clone = app.clone();
            window.set_year_callback(move |year| {
                app_clone.set_view_year(year);
            });

            let app_clone = app.clone();
            window.set_pin_callback(move || {
                app_clone.enter_pin_mode();
            });

            let app_clone = app.clone();
            window.set_sign_in_callback(move || {
                app_clone.show_auth_dialog();
            });

            let app_clone = app.clone();
            window.set_sign_out_callback(move || {
                app_clone.sign_out();
            });

            let map_view = window.map_view();

            let app_clone = app.clone();
            map_view.set_clicked_callback(move |lat, lng| {
                app_clone.map_clicked(lat, lng);
            });

            let app_clone = app.clone();
            map_view.set_card_factory(move |memory_id| app_clone.build_memory_card(memory_id));

            {
                let state = self.view_state.borrow();
                window.set_feed_mode(state.feed_mode);
                window.set_view_year(state.view_year);
            }
            window.set_signed_in(false);
            window.present();

            if self.client.borrow().is_none() {
                window.show_alert(
                    "ChronoMap is not configured",
                    "Set CHRONOMAP_BACKEND_URL and CHRONOMAP_BACKEND_KEY, then restart.",
                );
                return;
            }

            app.try_restore_session();
        }
    }

    impl GtkApplicationImpl for ChronoMapApplication {}
    impl AdwApplicationImpl for ChronoMapApplication {}
}

glib::wrapper! {
    pub struct ChronoMapApplication(ObjectSubclass<imp::ChronoMapApplication>)
        @extends adw::Application, gtk4::Application, gio::Application,
        @implements gio::ActionGroup, gio::ActionMap;
}

impl ChronoMapApplication {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("application-id", config::APP_ID)
            .property("flags", gio::ApplicationFlags::FLAGS_NONE)
            .build()
    }

    fn client(&self) -> Option<Arc<ChronoClient>> {
        self.imp().client.borrow().clone()
    }

    fn window(&self) -> Option<ChronoMapWindow> {
        self.imp().window.borrow().clone()
    }

    fn identity(&self) -> Option<String> {
        self.client()?.session().map(|s| s.user_id)
    }

    // --- session lifecycle ---

    fn try_restore_session(&self) {
        let Some(client) = self.client() else { return };
        let (tx, rx) = std::sync::mpsc::channel::<Result<Session, String>>();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async {
                let stored = SessionManager::load().await.map_err(|e| e.to_string())?;
                let session = client
                    .resume(&stored.refresh_token)
                    .await
                    .map_err(|e| e.to_string())?;
                // The refresh grant rotates the token pair.
                if let Err(e) = SessionManager::store(&session).await {
                    eprintln!("Failed to persist refreshed session: {e}");
                }
                Ok(session)
            });
            let _ = tx.send(result);
        });

        let app = self.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(Ok(session)) => {
                    app.on_signed_in(&session);
                    glib::ControlFlow::Break
                }
                Ok(Err(_)) | Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    app.show_auth_dialog();
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
            }
        });
    }

    fn on_signed_in(&self, session: &Session) {
        if let Some(window) = self.window() {
            window.set_signed_in(true);
        }

        match CacheDb::open(&session.user_id) {
            Ok(db) => {
                media_loader::init(Arc::new(db));
                thread::spawn(media_loader::cleanup_cache);
            }
            Err(e) => eprintln!("Media cache unavailable: {e}"),
        }

        self.fetch_memories();
    }

    fn show_auth_dialog(&self) {
        let Some(window) = self.window() else { return };
        let dialog = AuthDialog::new(&window);

        let app = self.clone();
        let dialog_weak = dialog.downgrade();

        dialog.connect_submit(move |dlg| match dlg.mode() {
            AuthMode::SignIn => app.sign_in(dlg, &dialog_weak),
            AuthMode::SignUp => app.sign_up(dlg, &dialog_weak),
        });

        dialog.present();
    }

    fn sign_in(&self, dialog: &AuthDialog, dialog_weak: &glib::WeakRef<AuthDialog>) {
        let Some(client) = self.client() else { return };
        let email = dialog.email();
        let password = dialog.password();
        if email.is_empty() || password.is_empty() {
            return;
        }

        dialog.set_loading(true);
        dialog.hide_message();

        let (tx, rx) = std::sync::mpsc::channel::<Result<Session, String>>();
        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async {
                let session = client
                    .sign_in(&email, &password)
                    .await
                    .map_err(|e| e.to_string())?;
                if let Err(e) = SessionManager::store(&session).await {
                    eprintln!("Failed to persist session: {e}");
                }
                Ok(session)
            });
            let _ = tx.send(result);
        });

        let app = self.clone();
        let dialog_weak = dialog_weak.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(Ok(session)) => {
                    if let Some(dialog) = dialog_weak.upgrade() {
                        dialog.close();
                    }
                    app.on_signed_in(&session);
                    glib::ControlFlow::Break
                }
                Ok(Err(e)) => {
                    if let Some(dialog) = dialog_weak.upgrade() {
                        dialog.set_loading(false);
                        dialog.show_error(&e);
                    }
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    if let Some(dialog) = dialog_weak.upgrade() {
                        dialog.set_loading(false);
                        dialog.show_error("Sign in failed: connection lost");
                    }
                    glib::ControlFlow::Break
                }
            }
        });
    }

    fn sign_up(&self, dialog: &AuthDialog, dialog_weak: &glib::WeakRef<AuthDialog>) {
        let Some(client) = self.client() else { return };
        let email = dialog.email();
        let password = dialog.password();
        let username = dialog.username();
        let is_private = dialog.is_private();

        if username.is_empty() {
            dialog.show_error("Pick a username first.");
            return;
        }
        if email.is_empty() || password.is_empty() {
            return;
        }

        dialog.set_loading(true);
        dialog.hide_message();

        // Ok(None): account + profile created. Ok(Some(warning)): account
        // created but the profile insert failed.
        let (tx, rx) = std::sync::mpsc::channel::<Result<Option<String>, String>>();
        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async {
                let user = client
                    .sign_up(&email, &password)
                    .await
                    .map_err(|e| e.to_string())?;

                let profile = Profile {
                    id: user.id,
                    username,
                    is_private,
                };
                match client.create_profile(&profile).await {
                    Ok(()) => Ok(None),
                    Err(e) => Ok(Some(format!(
                        "Account created, but profile setup failed: {e}"
                    ))),
                }
            });
            let _ = tx.send(result);
        });

        let dialog_weak = dialog_weak.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(result) => {
                    if let Some(dialog) = dialog_weak.upgrade() {
                        dialog.set_loading(false);
                        match result {
                            Ok(None) => {
                                dialog.set_mode(AuthMode::SignIn);
                                dialog.show_notice("Account created! You can now log in.");
                            }
                            Ok(Some(warning)) => {
                                dialog.show_error(&warning);
                            }
                            Err(e) => {
                                dialog.show_error(&e);
                            }
                        }
                    }
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    if let Some(dialog) = dialog_weak.upgrade() {
                        dialog.set_loading(false);
                        dialog.show_error("Sign up failed: connection lost");
                    }
                    glib::ControlFlow::Break
                }
            }
        });
    }

    fn sign_out(&self) {
        let Some(client) = self.client() else { return };
        let (tx, rx) = std::sync::mpsc::channel::<Result<(), String>>();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async {
                if let Err(e) = SessionManager::clear().await {
                    eprintln!("Failed to clear stored session: {e}");
                }
                client.sign_out().await.map_err(|e| e.to_string())
            });
            let _ = tx.send(result);
        });

        let app = self.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(result) => {
                    if let Err(e) = result {
                        eprintln!("Sign out: {e}");
                    }
                    app.on_signed_out();
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    app.on_signed_out();
                    glib::ControlFlow::Break
                }
            }
        });
    }

    fn on_signed_out(&self) {
        if let Some(composer) = self.imp().composer.take() {
            composer.close();
        }
        self.imp().view_state.borrow_mut().clear();
        media_loader::reset();

        if let Some(window) = self.window() {
            let map_view = window.map_view();
            map_view.reset();
            window.set_pin_mode(false);
            window.set_feed_mode(FeedMode::Mine);
            window.set_view_year(config::YEAR_MAX);
            window.set_signed_in(false);
        }

        self.show_auth_dialog();
    }

    // --- feed ---

    fn fetch_memories(&self) {
        let Some(client) = self.client() else { return };

        let generation = self.imp().fetch_generation.get() + 1;
        self.imp().fetch_generation.set(generation);

        let feed_mode = self.imp().view_state.borrow().feed_mode;
        let (tx, rx) = std::sync::mpsc::channel::<Result<Vec<Memory>, String>>();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async { client.fetch_memories(feed_mode).await });
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        let app = self.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(result) => {
                    // A newer fetch was issued while this one was in flight.
                    if app.imp().fetch_generation.get() != generation {
                        return glib::ControlFlow::Break;
                    }
                    match result {
                        Ok(memories) => {
                            app.imp().view_state.borrow_mut().replace_memories(memories);
                            app.sync_map();
                        }
                        Err(e) => {
                            // Read failures leave the previous list untouched.
                            if let Some(window) = app.window() {
                                window.show_alert("Couldn't load memories", &e);
                            }
                        }
                    }
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => glib::ControlFlow::Break,
            }
        });
    }

    /// Reconcile the map with the current view state.
    fn sync_map(&self) {
        let Some(window) = self.window() else { return };
        let identity = self.identity().unwrap_or_default();
        let map_view = window.map_view();

        let state = self.imp().view_state.borrow();
        let desired = map::desired_markers(state.memories(), state.view_year, &identity);
        let diff = map::plan(&map_view.marker_specs(), &desired);
        let line = map::polyline(state.memories(), state.view_year, state.feed_mode);
        drop(state);

        map_view.apply_markers(&diff);
        map_view.set_polyline(&line);
    }

    fn switch_feed_mode(&self, mode: FeedMode) {
        {
            let mut state = self.imp().view_state.borrow_mut();
            if state.feed_mode == mode {
                return;
            }
            state.feed_mode = mode;
        }

        {
            let mut settings = self.imp().settings.borrow_mut();
            settings.set_feed_mode(mode);
            if let Err(e) = settings.save() {
                eprintln!("Failed to save settings: {e}");
            }
        }

        self.fetch_memories();
    }

    fn set_view_year(&self, year: i32) {
        self.imp().view_state.borrow_mut().view_year = year;

        {
            let mut settings = self.imp().settings.borrow_mut();
            settings.view_year = year;
            if let Err(e) = settings.save() {
                eprintln!("Failed to save settings: {e}");
            }
        }

        self.sync_map();
    }

    fn build_memory_card(&self, memory_id: i64) -> Option<gtk4::Widget> {
        let memory = self.imp().view_state.borrow().memory(memory_id)?.clone();

        let card = MemoryCard::new();
        card.bind(&memory);

        let app = self.clone();
        card.connect_like(move |id, card_weak| {
            app.like(id, card_weak);
        });

        Some(card.upcast())
    }

    // --- like ---

    fn like(&self, memory_id: i64, card_weak: glib::WeakRef<MemoryCard>) {
        let Some(client) = self.client() else { return };

        // One like per memory per user; repeat clicks are no-ops.
        if self.imp().view_state.borrow().viewer_liked(memory_id) {
            return;
        }
        if !self.imp().like_in_flight.borrow_mut().insert(memory_id) {
            return;
        }

        let (tx, rx) = std::sync::mpsc::channel::<Result<(), String>>();
        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async { client.insert_like(memory_id).await });
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        let app = self.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(result) => {
                    app.imp().like_in_flight.borrow_mut().remove(&memory_id);
                    match result {
                        Ok(()) => {
                            let count = {
                                let mut state = app.imp().view_state.borrow_mut();
                                if state.apply_like(memory_id) {
                                    state.memory(memory_id).map(|m| m.like_count)
                                } else {
                                    None
                                }
                            };
                            if let (Some(count), Some(card)) = (count, card_weak.upgrade()) {
                                card.set_like_state(count, true);
                            }
                        }
                        Err(e) => {
                            // Not surfaced to the user; the count stays put.
                            eprintln!("Like failed: {e}");
                        }
                    }
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    app.imp().like_in_flight.borrow_mut().remove(&memory_id);
                    glib::ControlFlow::Break
                }
            }
        });
    }

    // --- pin mode & composer ---

    fn enter_pin_mode(&self) {
        if self.imp().composer.borrow().is_some() {
            return;
        }
        let Some(window) = self.window() else { return };
        if self.identity().is_none() {
            self.show_auth_dialog();
            return;
        }

        self.imp().view_state.borrow_mut().enter_pin_mode();
        window.set_pin_mode(true);

        let composer = ComposerDialog::new(&window);

        let app = self.clone();
        composer.connect_post(move |draft| {
            app.save_memory(draft);
        });

        let app = self.clone();
        composer.connect_search(move |query| {
            app.search_address(query);
        });

        let app = self.clone();
        composer.connect_place_selected(move |place| {
            app.place_selected(place);
        });

        let app = self.clone();
        composer.connect_cancel(move || {
            app.exit_pin_mode();
        });

        self.imp().composer.replace(Some(composer.clone()));
        composer.present();
    }

    fn exit_pin_mode(&self) {
        self.imp().composer.replace(None);
        self.imp().view_state.borrow_mut().exit_pin_mode();

        if let Some(window) = self.window() {
            window.map_view().clear_pending_marker();
            window.set_pin_mode(false);
        }
    }

    fn map_clicked(&self, lat: f64, lng: f64) {
        if !self.imp().view_state.borrow().pin_mode {
            return;
        }

        self.imp()
            .view_state
            .borrow_mut()
            .set_pending_location(lat, lng);

        if let Some(window) = self.window() {
            window.map_view().set_pending_marker(lat, lng);
        }
        if let Some(composer) = self.imp().composer.borrow().as_ref() {
            composer.set_location_status(true);
        }
    }

    fn place_selected(&self, place: GeoPlace) {
        if !self.imp().view_state.borrow().pin_mode {
            return;
        }

        self.imp()
            .view_state
            .borrow_mut()
            .set_pending_location(place.lat, place.lng);

        if let Some(window) = self.window() {
            let map_view = window.map_view();
            map_view.set_pending_marker(place.lat, place.lng);
            map_view.fly_to(place.lat, place.lng, config::PIN_JUMP_ZOOM);
        }
        if let Some(composer) = self.imp().composer.borrow().as_ref() {
            composer.set_location_status(true);
        }
    }

    fn search_address(&self, query: String) {
        let (tx, rx) = std::sync::mpsc::channel::<Result<Vec<GeoPlace>, String>>();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async { geo::search(&query).await });
            let _ = tx.send(result.map_err(|e| e.to_string()));
        });

        let app = self.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(result) => {
                    if let Some(composer) = app.imp().composer.borrow().as_ref() {
                        match result {
                            Ok(places) => composer.set_search_results(places),
                            Err(e) => composer.show_error(&format!("Search failed: {e}")),
                        }
                    }
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => glib::ControlFlow::Break,
            }
        });
    }

    // --- composer submit ---

    fn save_memory(&self, draft: MemoryDraft) {
        let Some(client) = self.client() else { return };
        let Some(composer) = self.imp().composer.borrow().clone() else {
            return;
        };

        // Fail fast without a location; nothing goes on the wire.
        let Some((lat, lng)) = self.imp().view_state.borrow().pending_location else {
            composer.show_error("Click the map to set a location first.");
            return;
        };

        if self.imp().saving.get() {
            return;
        }
        self.imp().saving.set(true);
        composer.hide_error();
        composer.set_loading(true);

        let (tx, rx) = std::sync::mpsc::channel::<Result<Memory, String>>();
        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let result = rt.block_on(async {
                let mut media_url = None;
                let mut media_key = None;

                // Upload first; an upload failure aborts before any insert.
                if let Some(path) = &draft.photo {
                    let bytes =
                        std::fs::read(path).map_err(|e| format!("Couldn't read photo: {e}"))?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "photo.bin".to_string());
                    let key = media_object_key(&file_name, chrono::Utc::now().timestamp_millis());
                    let url = client
                        .upload_media(&key, bytes, mime_for_path(path))
                        .await
                        .map_err(|e| format!("Upload error: {e}"))?;
                    media_url = Some(url);
                    media_key = Some(key);
                }

                let new_memory = NewMemory {
                    title: draft.title,
                    description: draft.description,
                    date: draft.date,
                    lat,
                    lng,
                    media_url,
                };

                match client.insert_memory(&new_memory).await {
                    Ok(memory) => Ok(memory),
                    Err(e) => {
                        // Compensate: don't leave an orphaned object behind.
                        if let Some(key) = media_key
                            && let Err(cleanup) = client.remove_media(&key).await
                        {
                            eprintln!("Orphaned upload {key} not cleaned up: {cleanup}");
                        }
                        Err(format!("Couldn't save memory: {e}"))
                    }
                }
            });
            let _ = tx.send(result);
        });

        let app = self.clone();
        glib::timeout_add_local(std::time::Duration::from_millis(50), move || {
            match rx.try_recv() {
                Ok(Ok(memory)) => {
                    app.imp().saving.set(false);
                    app.imp().view_state.borrow_mut().view_year = memory.year;

                    {
                        let mut settings = app.imp().settings.borrow_mut();
                        settings.view_year = memory.year;
                        if let Err(e) = settings.save() {
                            eprintln!("Failed to save settings: {e}");
                        }
                    }

                    if let Some(composer) = app.imp().composer.borrow().clone() {
                        composer.set_loading(false);
                        composer.close();
                    }
                    app.exit_pin_mode();

                    if let Some(window) = app.window() {
                        window.set_view_year(memory.year);
                        window
                            .map_view()
                            .fly_to(memory.lat, memory.lng, config::PIN_JUMP_ZOOM);
                    }

                    app.fetch_memories();
                    glib::ControlFlow::Break
                }
                Ok(Err(e)) => {
                    app.imp().saving.set(false);
                    if let Some(composer) = app.imp().composer.borrow().as_ref() {
                        composer.set_loading(false);
                        composer.show_error(&e);
                    }
                    glib::ControlFlow::Break
                }
                Err(std::sync::mpsc::TryRecvError::Empty) => glib::ControlFlow::Continue,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    app.imp().saving.set(false);
                    if let Some(composer) = app.imp().composer.borrow().as_ref() {
                        composer.set_loading(false);
                    }
                    glib::ControlFlow::Break
                }
            }
        });
    }
}

impl Default for ChronoMapApplication {
    fn default() -> Self {
        Self::new()
    }
}

/// Content type for an attached photo, keyed off its extension.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::mime_for_path;
    use std::path::Path;

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a/b/pic.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("pic.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("pic")), "application/octet-stream");
    }
}
