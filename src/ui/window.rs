// SPDX-License-Identifier: MPL-2.0
#![allow(clippy::type_complexity)]

use crate::config;
use crate::supabase::FeedMode;
use crate::ui::MemoryMapView;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use libadwaita as adw;
use libadwaita::prelude::*;
use libadwaita::subclass::prelude::*;

mod imp {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    pub struct ChronoMapWindow {
        pub map_view: RefCell<Option<MemoryMapView>>,
        pub control_panel: RefCell<Option<gtk4::Box>>,
        pub mine_toggle: RefCell<Option<gtk4::ToggleButton>>,
        pub explore_toggle: RefCell<Option<gtk4::ToggleButton>>,
        pub year_label: RefCell<Option<gtk4::Label>>,
        pub year_slider: RefCell<Option<gtk4::Scale>>,
        pub pin_button: RefCell<Option<gtk4::Button>>,
        pub sign_in_button: RefCell<Option<gtk4::Button>>,
        pub sign_out_button: RefCell<Option<gtk4::Button>>,
        /// Set while the controller pushes state into the widgets, so the
        /// change handlers don't echo it back.
        pub updating: Cell<bool>,
        pub feed_mode_callback: RefCell<Option<Box<dyn Fn(FeedMode) + 'static>>>,
        pub year_callback: RefCell<Option<Box<dyn Fn(i32) + 'static>>>,
        pub pin_callback: RefCell<Option<Box<dyn Fn() + 'static>>>,
        pub sign_in_callback: RefCell<Option<Box<dyn Fn() + 'static>>>,
        pub sign_out_callback: RefCell<Option<Box<dyn Fn() + 'static>>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for ChronoMapWindow {
        const NAME: &'static str = "ChronoMapWindow";
        type Type = super::ChronoMapWindow;
        type ParentType = adw::ApplicationWindow;
    }

    impl ObjectImpl for ChronoMapWindow {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }
    }

    impl WidgetImpl for ChronoMapWindow {}
    impl WindowImpl for ChronoMapWindow {}
    impl ApplicationWindowImpl for ChronoMapWindow {}
    impl AdwApplicationWindowImpl for ChronoMapWindow {}
}

glib::wrapper! {
    pub struct ChronoMapWindow(ObjectSubclass<imp::ChronoMapWindow>)
        @extends adw::ApplicationWindow, gtk4::ApplicationWindow, gtk4::Window, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget,
                    gtk4::Native, gtk4::Root, gtk4::ShortcutManager,
                    gtk4::gio::ActionGroup, gtk4::gio::ActionMap;
}

impl ChronoMapWindow {
    pub fn new(app: &adw::Application) -> Self {
        glib::Object::builder()
            .property("application", app)
            .property("title", config::APP_NAME)
            .property("default-width", 1100)
            .property("default-height", 760)
            .build()
    }

    fn setup_ui(&self) {
        let header = adw::HeaderBar::new();
        header.set_title_widget(Some(&adw::WindowTitle::new(config::APP_NAME, "")));

        let pin_button = gtk4::Button::with_label("Pin a Memory");
        pin_button.add_css_class("suggested-action");
        pin_button.connect_clicked(glib::clone!(
            #[weak(rename_to = window)]
            self,
            move |_| {
                if let Some(cb) = window.imp().pin_callback.borrow().as_ref() {
                    cb();
                }
            }
        ));
        header.pack_start(&pin_button);

        let sign_in_button = gtk4::Button::with_label("Sign In");
        sign_in_button.add_css_class("suggested-action");
        sign_in_button.set_visible(false);
        sign_in_button.connect_clicked(glib::clone!(
            #[weak(rename_to = window)]
            self,
            move |_| {
                if let Some(cb) = window.imp().sign_in_callback.borrow().as_ref() {
                    cb();
                }
            }
        ));
        header.pack_start(&sign_in_button);

        let sign_out_button = gtk4::Button::from_icon_name("system-log-out-symbolic");
        sign_out_button.set_tooltip_text(Some("Sign out"));
        sign_out_button.connect_clicked(glib::clone!(
            #[weak(rename_to = window)]
            self,
            move |_| {
                if let Some(cb) = window.imp().sign_out_callback.borrow().as_ref() {
                    cb();
                }
            }
        ));
        header.pack_end(&sign_out_button);

        // Map with the control panel floating over it.
        let map_view = MemoryMapView::new();

        let control_panel = gtk4::Box::new(gtk4::Orientation::Vertical, 8);
        control_panel.add_css_class("control-panel");
        control_panel.set_halign(gtk4::Align::Start);
        control_panel.set_valign(gtk4::Align::Start);
        control_panel.set_margin_start(12);
        control_panel.set_margin_top(12);

        let feed_row = gtk4::Box::new(gtk4::Orientation::Horizontal, 0);
        feed_row.add_css_class("linked");
        let mine_toggle = gtk4::ToggleButton::with_label("My Map");
        mine_toggle.set_active(true);
        let explore_toggle = gtk4::ToggleButton::with_label("Explore");
        explore_toggle.set_group(Some(&mine_toggle));
        feed_row.append(&mine_toggle);
        feed_row.append(&explore_toggle);
        control_panel.append(&feed_row);

        mine_toggle.connect_toggled(glib::clone!(
            #[weak(rename_to = window)]
            self,
            move |toggle| {
                if toggle.is_active() {
                    window.emit_feed_mode(FeedMode::Mine);
                }
            }
        ));
        explore_toggle.connect_toggled(glib::clone!(
            #[weak(rename_to = window)]
            self,
            move |toggle| {
                if toggle.is_active() {
                    window.emit_feed_mode(FeedMode::Explore);
                }
            }
        ));

        let year_label = gtk4::Label::new(Some(&format!("Timeline: {}", config::YEAR_MAX)));
        year_label.set_halign(gtk4::Align::Start);
        year_label.add_css_class("dim-label");
        control_panel.append(&year_label);

        let year_slider = gtk4::Scale::with_range(
            gtk4::Orientation::Horizontal,
            config::YEAR_MIN as f64,
            config::YEAR_MAX as f64,
            1.0,
        );
        year_slider.set_value(config::YEAR_MAX as f64);
        year_slider.set_width_request(220);
        year_slider.connect_value_changed(glib::clone!(
            #[weak(rename_to = window)]
            self,
            move |slider| {
                let year = slider.value().round() as i32;
                window.update_year_label(year);
                if window.imp().updating.get() {
                    return;
                }
                if let Some(cb) = window.imp().year_callback.borrow().as_ref() {
                    cb(year);
                }
            }
        ));
        control_panel.append(&year_slider);

        let overlay = gtk4::Overlay::new();
        overlay.set_child(Some(&map_view));
        overlay.add_overlay(&control_panel);

        let toolbar_view = adw::ToolbarView::new();
        toolbar_view.add_top_bar(&header);
        toolbar_view.set_content(Some(&overlay));
        self.set_content(Some(&toolbar_view));

        let imp = self.imp();
        imp.map_view.replace(Some(map_view));
        imp.control_panel.replace(Some(control_panel));
        imp.mine_toggle.replace(Some(mine_toggle));
        imp.explore_toggle.replace(Some(explore_toggle));
        imp.year_label.replace(Some(year_label));
        imp.year_slider.replace(Some(year_slider));
        imp.pin_button.replace(Some(pin_button));
        imp.sign_in_button.replace(Some(sign_in_button));
        imp.sign_out_button.replace(Some(sign_out_button));
    }

    fn emit_feed_mode(&self, mode: FeedMode) {
        if self.imp().updating.get() {
            return;
        }
        if let Some(cb) = self.imp().feed_mode_callback.borrow().as_ref() {
            cb(mode);
        }
    }

    fn update_year_label(&self, year: i32) {
        if let Some(label) = self.imp().year_label.borrow().as_ref() {
            label.set_text(&format!("Timeline: {year}"));
        }
    }

    pub fn map_view(&self) -> MemoryMapView {
        self.imp()
            .map_view
            .borrow()
            .clone()
            .expect("window not set up")
    }

    /// Push the controller's feed mode into the toggle pair without echoing.
    pub fn set_feed_mode(&self, mode: FeedMode) {
        let imp = self.imp();
        imp.updating.set(true);
        if let (Some(mine), Some(explore)) = (
            imp.mine_toggle.borrow().as_ref(),
            imp.explore_toggle.borrow().as_ref(),
        ) {
            mine.set_active(mode.is_mine());
            explore.set_active(!mode.is_mine());
        }
        imp.updating.set(false);
    }

    pub fn set_view_year(&self, year: i32) {
        let imp = self.imp();
        imp.updating.set(true);
        if let Some(slider) = imp.year_slider.borrow().as_ref() {
            slider.set_value(year as f64);
        }
        self.update_year_label(year);
        imp.updating.set(false);
    }

    /// Pin mode hides the floating controls and swaps the map cursor, the
    /// composer takes over instead.
    pub fn set_pin_mode(&self, pinning: bool) {
        if let Some(panel) = self.imp().control_panel.borrow().as_ref() {
            panel.set_visible(!pinning);
        }
        if let Some(btn) = self.imp().pin_button.borrow().as_ref() {
            btn.set_sensitive(!pinning);
        }
        self.map_view().set_pin_cursor(pinning);
    }

    /// Switch the chrome between signed-in and signed-out states.
    pub fn set_signed_in(&self, signed_in: bool) {
        let imp = self.imp();
        if let Some(btn) = imp.pin_button.borrow().as_ref() {
            btn.set_visible(signed_in);
        }
        if let Some(btn) = imp.sign_out_button.borrow().as_ref() {
            btn.set_visible(signed_in);
        }
        if let Some(btn) = imp.sign_in_button.borrow().as_ref() {
            btn.set_visible(!signed_in);
        }
        if let Some(panel) = imp.control_panel.borrow().as_ref() {
            panel.set_visible(signed_in);
        }
    }

    /// Blocking notification for store failures.
    pub fn show_alert(&self, heading: &str, body: &str) {
        let dialog = adw::AlertDialog::new(Some(heading), Some(body));
        dialog.add_response("ok", "OK");
        dialog.set_default_response(Some("ok"));
        dialog.present(Some(self));
    }

    pub fn set_feed_mode_callback<F: Fn(FeedMode) + 'static>(&self, callback: F) {
        self.imp()
            .feed_mode_callback
            .replace(Some(Box::new(callback)));
    }

    pub fn set_year_callback<F: Fn(i32) + 'static>(&self, callback: F) {
        self.imp().year_callback.replace(Some(Box::new(callback)));
    }

    pub fn set_pin_callback<F: Fn() + 'static>(&self, callback: F) {
        self.imp().pin_callback.replace(Some(Box::new(callback)));
    }

    pub fn set_sign_in_callback<F: Fn() + 'static>(&self, callback: F) {
        self.imp().sign_in_callback.replace(Some(Box::new(callback)));
    }

    pub fn set_sign_out_callback<F: Fn() + 'static>(&self, callback: F) {
        self.imp().sign_out_callback.replace(Some(Box::new(callback)));
    }
}
