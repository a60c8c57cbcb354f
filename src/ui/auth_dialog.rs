// SPDX-License-Identifier: MPL-2.0

use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use libadwaita as adw;

/// Which flow the dialog is collecting input for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

mod imp {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    pub struct AuthDialog {
        pub mode: Cell<AuthMode>,
        pub subtitle: RefCell<Option<gtk4::Label>>,
        pub email_entry: RefCell<Option<gtk4::Entry>>,
        pub password_entry: RefCell<Option<gtk4::PasswordEntry>>,
        pub username_row: RefCell<Option<gtk4::Box>>,
        pub username_entry: RefCell<Option<gtk4::Entry>>,
        pub privacy_row: RefCell<Option<gtk4::Box>>,
        pub privacy_check: RefCell<Option<gtk4::CheckButton>>,
        pub privacy_hint: RefCell<Option<gtk4::Label>>,
        pub submit_button: RefCell<Option<gtk4::Button>>,
        pub mode_link: RefCell<Option<gtk4::Button>>,
        pub spinner: RefCell<Option<gtk4::Spinner>>,
        pub message_label: RefCell<Option<gtk4::Label>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for AuthDialog {
        const NAME: &'static str = "ChronoMapAuthDialog";
        type Type = super::AuthDialog;
        type ParentType = gtk4::Window;
    }

    impl ObjectImpl for AuthDialog {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }
    }

    impl WidgetImpl for AuthDialog {}
    impl WindowImpl for AuthDialog {}
}

glib::wrapper! {
    pub struct AuthDialog(ObjectSubclass<imp::AuthDialog>)
        @extends gtk4::Window, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget,
                    gtk4::Native, gtk4::Root, gtk4::ShortcutManager;
}

impl AuthDialog {
    pub fn new(parent: &impl IsA<gtk4::Window>) -> Self {
        glib::Object::builder()
            .property("title", "Welcome to ChronoMap")
            .property("modal", true)
            .property("transient-for", parent)
            .property("default-width", 400)
            .property("default-height", 420)
            .property("resizable", false)
            .build()
    }

    fn setup_ui(&self) {
        let content = gtk4::Box::new(gtk4::Orientation::Vertical, 0);

        let header = adw::HeaderBar::new();
        header.set_show_start_title_buttons(false);
        header.set_show_end_title_buttons(true);
        content.append(&header);

        let form_box = gtk4::Box::new(gtk4::Orientation::Vertical, 16);
        form_box.set_margin_start(24);
        form_box.set_margin_end(24);
        form_box.set_margin_top(16);
        form_box.set_margin_bottom(24);

        let subtitle = gtk4::Label::new(Some("Welcome Back"));
        subtitle.set_halign(gtk4::Align::Start);
        subtitle.add_css_class("title-2");
        form_box.append(&subtitle);

        // Username, sign-up only
        let username_row = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
        let username_label = gtk4::Label::new(Some("Username"));
        username_label.set_halign(gtk4::Align::Start);
        username_label.add_css_class("dim-label");
        username_row.append(&username_label);
        let username_entry = gtk4::Entry::new();
        username_entry.set_placeholder_text(Some("yourname"));
        username_row.append(&username_entry);
        username_row.set_visible(false);
        form_box.append(&username_row);

        let email_row = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
        let email_label = gtk4::Label::new(Some("Email"));
        email_label.set_halign(gtk4::Align::Start);
        email_label.add_css_class("dim-label");
        email_row.append(&email_label);
        let email_entry = gtk4::Entry::new();
        email_entry.set_placeholder_text(Some("you@example.com"));
        email_entry.set_input_purpose(gtk4::InputPurpose::Email);
        email_row.append(&email_entry);
        form_box.append(&email_row);

        let password_row = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
        let password_label = gtk4::Label::new(Some("Password"));
        password_label.set_halign(gtk4::Align::Start);
        password_label.add_css_class("dim-label");
        password_row.append(&password_label);
        let password_entry = gtk4::PasswordEntry::new();
        password_entry.set_show_peek_icon(true);
        password_row.append(&password_entry);
        form_box.append(&password_row);

        // Private-account toggle, sign-up only
        let privacy_row = gtk4::Box::new(gtk4::Orientation::Vertical, 4);
        let privacy_check = gtk4::CheckButton::with_label("Private account");
        privacy_row.append(&privacy_check);
        let privacy_hint = gtk4::Label::new(Some("Your map is visible to the world."));
        privacy_hint.set_halign(gtk4::Align::Start);
        privacy_hint.add_css_class("dim-label");
        privacy_hint.add_css_class("caption");
        privacy_row.append(&privacy_hint);
        privacy_row.set_visible(false);
        form_box.append(&privacy_row);

        let hint = privacy_hint.clone();
        privacy_check.connect_toggled(move |check| {
            hint.set_text(if check.is_active() {
                "Only you can see your map."
            } else {
                "Your map is visible to the world."
            });
        });

        // Errors and the post-sign-up notice share one label.
        let message_label = gtk4::Label::new(None);
        message_label.set_halign(gtk4::Align::Start);
        message_label.set_wrap(true);
        message_label.set_visible(false);
        form_box.append(&message_label);

        let button_box = gtk4::Box::new(gtk4::Orientation::Horizontal, 8);
        button_box.set_halign(gtk4::Align::End);
        button_box.set_margin_top(8);

        let spinner = gtk4::Spinner::new();
        spinner.set_visible(false);
        button_box.append(&spinner);

        let submit_button = gtk4::Button::with_label("Log In");
        submit_button.add_css_class("suggested-action");
        submit_button.set_sensitive(false);
        button_box.append(&submit_button);

        form_box.append(&button_box);

        let mode_link = gtk4::Button::with_label("New here? Create Account");
        mode_link.add_css_class("flat");
        mode_link.connect_clicked(glib::clone!(
            #[weak(rename_to = dialog)]
            self,
            move |_| {
                let next = match dialog.mode() {
                    AuthMode::SignIn => AuthMode::SignUp,
                    AuthMode::SignUp => AuthMode::SignIn,
                };
                dialog.set_mode(next);
            }
        ));
        form_box.append(&mode_link);

        content.append(&form_box);

        // Submit only with both credentials present.
        let submit_weak = submit_button.downgrade();
        let email_weak = email_entry.downgrade();
        let password_weak = password_entry.downgrade();
        let update_sensitivity = move || {
            if let (Some(btn), Some(email), Some(password)) = (
                submit_weak.upgrade(),
                email_weak.upgrade(),
                password_weak.upgrade(),
            ) {
                btn.set_sensitive(!email.text().is_empty() && !password.text().is_empty());
            }
        };
        let update = update_sensitivity.clone();
        email_entry.connect_changed(move |_| update());
        let update = update_sensitivity;
        password_entry.connect_changed(move |_| update());

        let imp = self.imp();
        imp.subtitle.replace(Some(subtitle));
        imp.email_entry.replace(Some(email_entry));
        imp.password_entry.replace(Some(password_entry));
        imp.username_row.replace(Some(username_row));
        imp.username_entry.replace(Some(username_entry));
        imp.privacy_row.replace(Some(privacy_row));
        imp.privacy_check.replace(Some(privacy_check));
        imp.privacy_hint.replace(Some(privacy_hint));
        imp.submit_button.replace(Some(submit_button));
        imp.mode_link.replace(Some(mode_link));
        imp.spinner.replace(Some(spinner));
        imp.message_label.replace(Some(message_label));

        self.set_child(Some(&content));
    }

    pub fn mode(&self) -> AuthMode {
        self.imp().mode.get()
    }

    pub fn set_mode(&self, mode: AuthMode) {
        let imp = self.imp();
        imp.mode.set(mode);
        self.hide_message();

        let sign_up = mode == AuthMode::SignUp;
        if let Some(label) = imp.subtitle.borrow().as_ref() {
            label.set_text(if sign_up { "Join the Network" } else { "Welcome Back" });
        }
        if let Some(row) = imp.username_row.borrow().as_ref() {
            row.set_visible(sign_up);
        }
        if let Some(row) = imp.privacy_row.borrow().as_ref() {
            row.set_visible(sign_up);
        }
        if let Some(btn) = imp.submit_button.borrow().as_ref() {
            btn.set_label(if sign_up { "Create Account" } else { "Log In" });
        }
        if let Some(link) = imp.mode_link.borrow().as_ref() {
            link.set_label(if sign_up {
                "Have an account? Log In"
            } else {
                "New here? Create Account"
            });
        }
    }

    pub fn email(&self) -> String {
        self.imp()
            .email_entry
            .borrow()
            .as_ref()
            .map(|e| e.text().trim().to_string())
            .unwrap_or_default()
    }

    pub fn password(&self) -> String {
        self.imp()
            .password_entry
            .borrow()
            .as_ref()
            .map(|e| e.text().to_string())
            .unwrap_or_default()
    }

    pub fn username(&self) -> String {
        self.imp()
            .username_entry
            .borrow()
            .as_ref()
            .map(|e| e.text().trim().to_string())
            .unwrap_or_default()
    }

    pub fn is_private(&self) -> bool {
        self.imp()
            .privacy_check
            .borrow()
            .as_ref()
            .map(|c| c.is_active())
            .unwrap_or(false)
    }

    pub fn show_error(&self, message: &str) {
        if let Some(label) = self.imp().message_label.borrow().as_ref() {
            label.remove_css_class("success");
            label.add_css_class("error");
            label.set_text(message);
            label.set_visible(true);
        }
    }

    pub fn show_notice(&self, message: &str) {
        if let Some(label) = self.imp().message_label.borrow().as_ref() {
            label.remove_css_class("error");
            label.add_css_class("success");
            label.set_text(message);
            label.set_visible(true);
        }
    }

    pub fn hide_message(&self) {
        if let Some(label) = self.imp().message_label.borrow().as_ref() {
            label.set_visible(false);
        }
    }

    pub fn set_loading(&self, loading: bool) {
        let imp = self.imp();

        if let Some(spinner) = imp.spinner.borrow().as_ref() {
            spinner.set_visible(loading);
            if loading {
                spinner.start();
            } else {
                spinner.stop();
            }
        }

        for entry in [&imp.email_entry, &imp.username_entry] {
            if let Some(e) = entry.borrow().as_ref() {
                e.set_sensitive(!loading);
            }
        }
        if let Some(e) = imp.password_entry.borrow().as_ref() {
            e.set_sensitive(!loading);
        }
        if let Some(btn) = imp.submit_button.borrow().as_ref() {
            btn.set_sensitive(!loading);
        }
        if let Some(link) = imp.mode_link.borrow().as_ref() {
            link.set_sensitive(!loading);
        }
    }

    pub fn connect_submit<F: Fn(&Self) + 'static>(&self, f: F) {
        if let Some(button) = self.imp().submit_button.borrow().as_ref() {
            let dialog = self.clone();
            button.connect_clicked(move |_| {
                f(&dialog);
            });
        }
    }
}

impl Default for AuthDialog {
    fn default() -> Self {
        panic!("AuthDialog requires a parent window")
    }
}
