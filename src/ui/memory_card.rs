// SPDX-License-Identifier: MPL-2.0

use crate::supabase::Memory;
use crate::ui::media_loader;
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use unicode_segmentation::UnicodeSegmentation;

/// Descriptions longer than this get cut at a grapheme boundary.
const MAX_DESCRIPTION_GRAPHEMES: usize = 280;

mod imp {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct MemoryCard {
        pub memory_id: RefCell<Option<i64>>,
        pub photo: RefCell<Option<gtk4::Picture>>,
        pub author_label: RefCell<Option<gtk4::Label>>,
        pub title_label: RefCell<Option<gtk4::Label>>,
        pub date_label: RefCell<Option<gtk4::Label>>,
        pub description_label: RefCell<Option<gtk4::Label>>,
        pub like_btn: RefCell<Option<gtk4::Button>>,
        pub like_count_label: RefCell<Option<gtk4::Label>>,
        pub open_photo_btn: RefCell<Option<gtk4::Button>>,
        pub liked: RefCell<bool>,
        pub like_callback: RefCell<Option<Box<dyn Fn(i64, glib::WeakRef<super::MemoryCard>) + 'static>>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for MemoryCard {
        const NAME: &'static str = "ChronoMapMemoryCard";
        type Type = super::MemoryCard;
        type ParentType = gtk4::Box;
    }

    impl ObjectImpl for MemoryCard {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }
    }

    impl WidgetImpl for MemoryCard {}
    impl BoxImpl for MemoryCard {}
}

glib::wrapper! {
    pub struct MemoryCard(ObjectSubclass<imp::MemoryCard>)
        @extends gtk4::Box, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget,
                    gtk4::Orientable;
}

impl MemoryCard {
    pub fn new() -> Self {
        glib::Object::builder()
            .property("orientation", gtk4::Orientation::Vertical)
            .property("spacing", 6)
            .build()
    }

    fn setup_ui(&self) {
        self.add_css_class("memory-card");
        self.set_width_request(260);
        self.set_margin_start(8);
        self.set_margin_end(8);
        self.set_margin_top(8);
        self.set_margin_bottom(8);

        // Photo on top, hidden until a memory with media binds.
        let photo = gtk4::Picture::new();
        photo.set_can_shrink(true);
        photo.set_height_request(140);
        photo.add_css_class("memory-photo");
        photo.set_visible(false);
        self.append(&photo);

        let author_label = gtk4::Label::new(None);
        author_label.set_halign(gtk4::Align::Start);
        author_label.add_css_class("dim-label");
        author_label.add_css_class("caption");
        self.append(&author_label);

        let title_label = gtk4::Label::new(None);
        title_label.set_halign(gtk4::Align::Start);
        title_label.add_css_class("heading");
        title_label.set_wrap(true);
        self.append(&title_label);

        let date_label = gtk4::Label::new(None);
        date_label.set_halign(gtk4::Align::Start);
        date_label.add_css_class("dim-label");
        date_label.add_css_class("caption");
        self.append(&date_label);

        let description_label = gtk4::Label::new(None);
        description_label.set_halign(gtk4::Align::Start);
        description_label.set_wrap(true);
        description_label.set_visible(false);
        self.append(&description_label);

        // Action row: like control + open-photo shortcut.
        let actions = gtk4::Box::new(gtk4::Orientation::Horizontal, 6);
        actions.set_margin_top(4);

        let like_btn = gtk4::Button::new();
        like_btn.add_css_class("flat");
        like_btn.add_css_class("like-button");
        let like_content = gtk4::Box::new(gtk4::Orientation::Horizontal, 4);
        let heart = gtk4::Image::from_icon_name("emblem-favorite-symbolic");
        heart.set_pixel_size(14);
        like_content.append(&heart);
        let like_count_label = gtk4::Label::new(Some("0"));
        like_content.append(&like_count_label);
        like_btn.set_child(Some(&like_content));
        actions.append(&like_btn);

        let open_photo_btn = gtk4::Button::from_icon_name("image-x-generic-symbolic");
        open_photo_btn.add_css_class("flat");
        open_photo_btn.set_tooltip_text(Some("Open photo"));
        open_photo_btn.set_visible(false);
        actions.append(&open_photo_btn);

        self.append(&actions);

        let card = self.clone();
        like_btn.connect_clicked(move |_| {
            let imp = card.imp();
            if *imp.liked.borrow() {
                return;
            }
            let Some(memory_id) = *imp.memory_id.borrow() else {
                return;
            };
            if let Some(cb) = imp.like_callback.borrow().as_ref() {
                cb(memory_id, card.downgrade());
            }
        });

        let imp = self.imp();
        imp.photo.replace(Some(photo));
        imp.author_label.replace(Some(author_label));
        imp.title_label.replace(Some(title_label));
        imp.date_label.replace(Some(date_label));
        imp.description_label.replace(Some(description_label));
        imp.like_btn.replace(Some(like_btn));
        imp.like_count_label.replace(Some(like_count_label));
        imp.open_photo_btn.replace(Some(open_photo_btn));
    }

    pub fn bind(&self, memory: &Memory) {
        let imp = self.imp();
        imp.memory_id.replace(Some(memory.id));

        if let Some(label) = imp.author_label.borrow().as_ref() {
            label.set_text(&format!("@{}", memory.username));
        }
        if let Some(label) = imp.title_label.borrow().as_ref() {
            label.set_text(&memory.title);
        }
        if let Some(label) = imp.date_label.borrow().as_ref() {
            label.set_text(&memory.date);
        }
        if let Some(label) = imp.description_label.borrow().as_ref() {
            match memory.description.as_deref() {
                Some(text) => {
                    label.set_text(&truncate_graphemes(text, MAX_DESCRIPTION_GRAPHEMES));
                    label.set_visible(true);
                }
                None => label.set_visible(false),
            }
        }

        if let Some(photo) = imp.photo.borrow().as_ref() {
            match memory.media_url.clone() {
                Some(url) => {
                    photo.set_visible(true);
                    media_loader::load_photo(photo.clone(), url);
                }
                None => photo.set_visible(false),
            }
        }

        if let Some(btn) = imp.open_photo_btn.borrow().as_ref() {
            btn.set_visible(memory.media_url.is_some());
            if let Some(url) = memory.media_url.clone() {
                btn.connect_clicked(move |_| {
                    if let Err(e) = open::that(&url) {
                        eprintln!("Failed to open photo: {e}");
                    }
                });
            }
        }

        self.set_like_state(memory.like_count, memory.viewer_liked);
    }

    /// Reflect the like count and whether the viewer already liked it; a
    /// liked card's control goes inert.
    pub fn set_like_state(&self, count: u32, liked: bool) {
        let imp = self.imp();
        imp.liked.replace(liked);
        if let Some(label) = imp.like_count_label.borrow().as_ref() {
            label.set_text(&count.to_string());
        }
        if let Some(btn) = imp.like_btn.borrow().as_ref() {
            if liked {
                btn.add_css_class("liked");
            } else {
                btn.remove_css_class("liked");
            }
        }
    }

    pub fn connect_like<F: Fn(i64, glib::WeakRef<Self>) + 'static>(&self, f: F) {
        self.imp().like_callback.replace(Some(Box::new(f)));
    }
}

impl Default for MemoryCard {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut at a grapheme boundary so multi-byte text never splits mid-cluster.
fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_graphemes;

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(truncate_graphemes("a trip", 280), "a trip");
    }

    #[test]
    fn test_long_text_is_cut_with_ellipsis() {
        let text = "x".repeat(300);
        let cut = truncate_graphemes(&text, 280);
        assert_eq!(cut.chars().count(), 281);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_cluster_boundaries_are_respected() {
        // Family emoji is one grapheme built from several code points.
        let text = "👨‍👩‍👧‍👦ab";
        assert_eq!(truncate_graphemes(text, 1), "👨‍👩‍👧‍👦…");
    }
}
