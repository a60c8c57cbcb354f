// SPDX-License-Identifier: MPL-2.0

use crate::geo::GeoPlace;
use crate::supabase::year_of;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use libadwaita as adw;
use std::path::PathBuf;

/// Everything the composer collects; the pending location lives in ViewState.
#[derive(Debug, Clone)]
pub struct MemoryDraft {
    pub title: String,
    pub date: String,
    pub description: Option<String>,
    pub photo: Option<PathBuf>,
}

mod imp {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct ComposerDialog {
        pub location_label: RefCell<Option<gtk4::Label>>,
        pub search_entry: RefCell<Option<gtk4::Entry>>,
        pub search_results: RefCell<Option<gtk4::ListBox>>,
        pub places: RefCell<Vec<GeoPlace>>,
        pub title_entry: RefCell<Option<gtk4::Entry>>,
        pub date_entry: RefCell<Option<gtk4::Entry>>,
        pub description_view: RefCell<Option<gtk4::TextView>>,
        pub photo_label: RefCell<Option<gtk4::Label>>,
        pub photo_path: RefCell<Option<PathBuf>>,
        pub file_chooser: RefCell<Option<gtk4::FileChooserNative>>,
        pub post_button: RefCell<Option<gtk4::Button>>,
        pub error_label: RefCell<Option<gtk4::Label>>,
        pub post_callback: RefCell<Option<Box<dyn Fn(MemoryDraft) + 'static>>>,
        pub search_callback: RefCell<Option<Box<dyn Fn(String) + 'static>>>,
        pub place_callback: RefCell<Option<Box<dyn Fn(GeoPlace) + 'static>>>,
        pub cancel_callback: RefCell<Option<Box<dyn Fn() + 'static>>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ComposerDialog {
        const NAME: &'static str = "ChronoMapComposerDialog";
        type Type = super::ComposerDialog;
        type ParentType = gtk4::Window;
    }

    impl ObjectImpl for ComposerDialog {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }
    }

    impl WidgetImpl for ComposerDialog {}
    impl WindowImpl for ComposerDialog {}
}

glib::wrapper! {
    pub struct ComposerDialog(ObjectSubclass<imp::ComposerDialog>)
        @extends gtk4::Window, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget,
                    gtk4::Native, gtk4::Root, gtk4::ShortcutManager;
}

impl ComposerDialog {
    /// Deliberately non-modal: the user needs the map underneath to click a
    /// location while this window is up.
    pub fn new(parent: &impl IsA<gtk4::Window>) -> Self {
        glib::Object::builder()
            .property("title", "Pin Memory")
            .property("modal", false)
            .property("transient-for", parent)
            .property("default-width", 420)
            .property("default-height", 520)
            .property("resizable", true)
            .build()
    }

    fn setup_ui(&self) {
        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);

        let header = adw::HeaderBar::new();
        header.set_show_start_title_buttons(false);
        header.set_show_end_title_buttons(false);

        let cancel_btn = gtk4::Button::with_label("Cancel");
        cancel_btn.connect_clicked(glib::clone!(
            #[weak(rename_to = dialog)]
            self,
            move |_| {
                // close-request fires the cancel callback
                dialog.close();
            }
        ));
        header.pack_start(&cancel_btn);

        let post_btn = gtk4::Button::with_label("Post");
        post_btn.add_css_class("suggested-action");
        header.pack_end(&post_btn);

        content.append(&header);

        let form_box = gtk4::Box::new(gtk4::Orientation::Vertical, 10);
        form_box.set_margin_start(16);
        form_box.set_margin_end(16);
        form_box.set_margin_top(12);
        form_box.set_margin_bottom(16);
        form_box.set_vexpand(true);

        let location_label = gtk4::Label::new(Some("Click the map to set a location"));
        location_label.set_halign(gtk4::Align::Start);
        location_label.add_css_class("dim-label");
        form_box.append(&location_label);

        // Address search as an alternative to clicking the map.
        let search_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
        let search_entry = gtk4::Entry::new();
        search_entry.set_placeholder_text(Some("Search for a place…"));
        search_entry.set_hexpand(true);
        search_row.append(&search_entry);
        let search_btn = gtk4::Button::from_icon_name("system-search-symbolic");
        search_row.append(&search_btn);
        form_box.append(&search_row);

        let search_results = gtk4::ListBox::new();
        search_results.add_css_class("boxed-list");
        search_results.set_visible(false);
        form_box.append(&search_results);

        let dialog_weak = self.downgrade();
        search_btn.connect_clicked(move |_| {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.emit_search();
            }
        });
        let dialog_weak = self.downgrade();
        search_entry.connect_activate(move |_| {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.emit_search();
            }
        });

        let dialog_weak = self.downgrade();
        search_results.connect_row_activated(move |_, row| {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.emit_place_selected(row.index());
            }
        });

        let title_entry = gtk4::Entry::new();
        title_entry.set_placeholder_text(Some("Title"));
        form_box.append(&title_entry);

        let date_entry = gtk4::Entry::new();
        date_entry.set_placeholder_text(Some("YYYY-MM-DD"));
        form_box.append(&date_entry);

        let description_view = gtk4::TextView::new();
        description_view.set_wrap_mode(gtk4::WrapMode::WordChar);
        description_view.set_left_margin(8);
        description_view.set_right_margin(8);
        description_view.set_top_margin(8);
        description_view.set_bottom_margin(8);

        let scrolled = gtk4::ScrolledWindow::new();
        scrolled.set_vexpand(true);
        scrolled.set_min_content_height(100);
        scrolled.set_child(Some(&description_view));
        form_box.append(&scrolled);

        // Optional photo attachment.
        let photo_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
        let photo_btn = gtk4::Button::with_label("Attach Photo…");
        photo_row.append(&photo_btn);
        let photo_label = gtk4::Label::new(Some("No photo"));
        photo_label.add_css_class("dim-label");
        photo_label.set_ellipsize(gtk4::pango::EllipsizeMode::Middle);
        photo_row.append(&photo_label);
        form_box.append(&photo_row);

        let dialog_weak = self.downgrade();
        photo_btn.connect_clicked(move |_| {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.choose_photo();
            }
        });

        let error_label = gtk4::Label::new(None);
        error_label.set_halign(gtk4::Align::Start);
        error_label.add_css_class("error");
        error_label.set_wrap(true);
        error_label.set_visible(false);
        form_box.append(&error_label);

        content.append(&form_box);
        self.set_child(Some(&content));

        let imp = self.imp();
        imp.location_label.replace(Some(location_label));
        imp.search_entry.replace(Some(search_entry));
        imp.search_results.replace(Some(search_results));
        imp.title_entry.replace(Some(title_entry));
        imp.date_entry.replace(Some(date_entry));
        imp.description_view.replace(Some(description_view));
        imp.photo_label.replace(Some(photo_label));
        imp.post_button.replace(Some(post_btn));
        imp.error_label.replace(Some(error_label));

        let dialog_weak = self.downgrade();
        if let Some(btn) = self.imp().post_button.borrow().as_ref() {
            btn.connect_clicked(move |_| {
                if let Some(dialog) = dialog_weak.upgrade() {
                    dialog.emit_post();
                }
            });
        }

        let dialog_weak = self.downgrade();
        self.connect_close_request(move |_| {
            if let Some(dialog) = dialog_weak.upgrade() {
                dialog.emit_cancel();
            }
            glib::Propagation::Proceed
        });
    }

    #[allow(deprecated)] // FileDialog needs a newer GTK than we target
    fn choose_photo(&self) {
        let filter = gtk4::FileFilter::new();
        filter.add_mime_type("image/*");
        filter.set_name(Some("Images"));

        let chooser = gtk4::FileChooserNative::new(
            Some("Choose a photo"),
            Some(self),
            gtk4::FileChooserAction::Open,
            Some("Open"),
            Some("Cancel"),
        );
        chooser.add_filter(&filter);

        let dialog_weak = self.downgrade();
        chooser.connect_response(move |chooser, response| {
            if response == gtk4::ResponseType::Accept
                && let Some(dialog) = dialog_weak.upgrade()
                && let Some(path) = chooser.file().and_then(|f| f.path())
            {
                if let Some(label) = dialog.imp().photo_label.borrow().as_ref() {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "photo".to_string());
                    label.set_text(&name);
                }
                dialog.imp().photo_path.replace(Some(path));
            }
        });
        chooser.show();

        // Native dialogs die when dropped; keep the handle until the next one.
        self.imp().file_chooser.replace(Some(chooser));
    }

    fn emit_post(&self) {
        let imp = self.imp();

        let title = imp
            .title_entry
            .borrow()
            .as_ref()
            .map(|e| e.text().trim().to_string())
            .unwrap_or_default();
        let date = imp
            .date_entry
            .borrow()
            .as_ref()
            .map(|e| e.text().trim().to_string())
            .unwrap_or_default();
        let description = imp
            .description_view
            .borrow()
            .as_ref()
            .map(|tv| {
                let buffer = tv.buffer();
                buffer
                    .text(&buffer.start_iter(), &buffer.end_iter(), false)
                    .trim()
                    .to_string()
            })
            .filter(|text| !text.is_empty());

        if title.is_empty() {
            self.show_error("Give this memory a title.");
            return;
        }
        if year_of(&date).is_none() {
            self.show_error("Enter the date as YYYY-MM-DD.");
            return;
        }

        let draft = MemoryDraft {
            title,
            date,
            description,
            photo: imp.photo_path.borrow().clone(),
        };

        if let Some(cb) = imp.post_callback.borrow().as_ref() {
            cb(draft);
        }
    }

    fn emit_search(&self) {
        let query = self
            .imp()
            .search_entry
            .borrow()
            .as_ref()
            .map(|e| e.text().trim().to_string())
            .unwrap_or_default();
        if query.is_empty() {
            return;
        }
        if let Some(cb) = self.imp().search_callback.borrow().as_ref() {
            cb(query);
        }
    }

    fn emit_place_selected(&self, index: i32) {
        let place = self.imp().places.borrow().get(index as usize).cloned();
        if let Some(place) = place {
            if let Some(results) = self.imp().search_results.borrow().as_ref() {
                results.set_visible(false);
            }
            if let Some(cb) = self.imp().place_callback.borrow().as_ref() {
                cb(place);
            }
        }
    }

    fn emit_cancel(&self) {
        if let Some(cb) = self.imp().cancel_callback.borrow().as_ref() {
            cb();
        }
    }

    pub fn set_search_results(&self, places: Vec<GeoPlace>) {
        let imp = self.imp();
        if let Some(results) = imp.search_results.borrow().as_ref() {
            while let Some(row) = results.first_child() {
                results.remove(&row);
            }
            for place in &places {
                let label = gtk4::Label::new(Some(&place.label));
                label.set_halign(gtk4::Align::Start);
                label.set_ellipsize(gtk4::pango::EllipsizeMode::End);
                label.set_margin_top(6);
                label.set_margin_bottom(6);
                label.set_margin_start(6);
                label.set_margin_end(6);
                results.append(&label);
            }
            results.set_visible(!places.is_empty());
        }
        imp.places.replace(places);
    }

    pub fn set_location_status(&self, set: bool) {
        if let Some(label) = self.imp().location_label.borrow().as_ref() {
            if set {
                label.set_text("Location set");
                label.remove_css_class("dim-label");
                label.add_css_class("success");
            } else {
                label.set_text("Click the map to set a location");
                label.remove_css_class("success");
                label.add_css_class("dim-label");
            }
        }
    }

    pub fn set_loading(&self, loading: bool) {
        if let Some(btn) = self.imp().post_button.borrow().as_ref() {
            btn.set_sensitive(!loading);
            btn.set_label(if loading { "Uploading…" } else { "Post" });
        }
    }

    pub fn show_error(&self, message: &str) {
        if let Some(label) = self.imp().error_label.borrow().as_ref() {
            label.set_text(message);
            label.set_visible(true);
        }
    }

    pub fn hide_error(&self) {
        if let Some(label) = self.imp().error_label.borrow().as_ref() {
            label.set_visible(false);
        }
    }

    pub fn connect_post<F: Fn(MemoryDraft) + 'static>(&self, callback: F) {
        self.imp().post_callback.replace(Some(Box::new(callback)));
    }

    pub fn connect_search<F: Fn(String) + 'static>(&self, callback: F) {
        self.imp().search_callback.replace(Some(Box::new(callback)));
    }

    pub fn connect_place_selected<F: Fn(GeoPlace) + 'static>(&self, callback: F) {
        self.imp().place_callback.replace(Some(Box::new(callback)));
    }

    pub fn connect_cancel<F: Fn() + 'static>(&self, callback: F) {
        self.imp().cancel_callback.replace(Some(Box::new(callback)));
    }
}

impl Default for ComposerDialog {
    fn default() -> Self {
        panic!("ComposerDialog requires a parent window")
    }
}
