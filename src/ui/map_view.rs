// SPDX-License-Identifier: MPL-2.0

//! The map surface: a libshumate widget owning the marker and polyline
//! layers. All mutation goes through `MarkerDiff`s planned by `map::sync`;
//! this widget never decides what should be on screen.

use crate::config;
use crate::map::{MarkerDiff, MarkerSpec};
use gtk4::glib;
use gtk4::prelude::*;
use gtk4::subclass::prelude::*;
use libshumate as shumate;
use libshumate::prelude::*;
use std::collections::HashMap;

mod imp {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct MemoryMapView {
        pub simple_map: RefCell<Option<shumate::SimpleMap>>,
        pub marker_layer: RefCell<Option<shumate::MarkerLayer>>,
        pub path_layer: RefCell<Option<shumate::PathLayer>>,
        /// Materialized markers keyed by memory id, spec alongside the widget
        /// so reconciliation can diff against what is actually on screen.
        pub markers: RefCell<HashMap<i64, (MarkerSpec, shumate::Marker)>>,
        /// The translucent pin-mode marker. Held by handle; never looked up
        /// by any visual property.
        pub pending_marker: RefCell<Option<shumate::Marker>>,
        pub clicked_callback: RefCell<Option<Box<dyn Fn(f64, f64) + 'static>>>,
        pub card_factory: RefCell<Option<Box<dyn Fn(i64) -> Option<gtk4::Widget> + 'static>>>,
    }

    #[glib::object_subclass]
    impl ObjectSubclass for MemoryMapView {
        const NAME: &'static str = "ChronoMapMemoryMapView";
        type Type = super::MemoryMapView;
        type ParentType = gtk4::Box;
    }

    impl ObjectImpl for MemoryMapView {
        fn constructed(&self) {
            self.parent_constructed();
            self.obj().setup_ui();
        }
    }

    impl WidgetImpl for MemoryMapView {}
    impl BoxImpl for MemoryMapView {}
}

glib::wrapper! {
    pub struct MemoryMapView(ObjectSubclass<imp::MemoryMapView>)
        @extends gtk4::Box, gtk4::Widget,
        @implements gtk4::Accessible, gtk4::Buildable, gtk4::ConstraintTarget,
                    gtk4::Orientable;
}

impl MemoryMapView {
    pub fn new() -> Self {
        glib::Object::builder().build()
    }

    fn setup_ui(&self) {
        let simple_map = shumate::SimpleMap::new();
        simple_map.set_hexpand(true);
        simple_map.set_vexpand(true);

        let registry = shumate::MapSourceRegistry::with_defaults();
        if let Some(source) = registry.by_id(shumate::MAP_SOURCE_OSM_MAPNIK) {
            simple_map.set_map_source(Some(&source));
        }

        let map = simple_map.map().expect("simple map exposes a map");
        let viewport = map.viewport().expect("map exposes a viewport");

        let marker_layer = shumate::MarkerLayer::new(&viewport);
        simple_map.add_overlay_layer(&marker_layer);

        let path_layer = shumate::PathLayer::new(&viewport);
        path_layer.set_stroke_width(4.0);
        simple_map.add_overlay_layer(&path_layer);

        map.center_on(config::DEFAULT_CENTER.0, config::DEFAULT_CENTER.1);
        viewport.set_zoom_level(config::DEFAULT_ZOOM);
        map.set_go_to_duration(1500);

        // Click coordinates bridge to the controller for pin-mode capture.
        let gesture = gtk4::GestureClick::new();
        let view = self.clone();
        let map_for_click = map.clone();
        let viewport_for_click = viewport.clone();
        gesture.connect_released(move |_, _, x, y| {
            let (lat, lng) = viewport_for_click.widget_coords_to_location(&map_for_click, x, y);
            if let Some(cb) = view.imp().clicked_callback.borrow().as_ref() {
                cb(lat, lng);
            }
        });
        map.add_controller(gesture);

        self.append(&simple_map);

        let imp = self.imp();
        imp.simple_map.replace(Some(simple_map));
        imp.marker_layer.replace(Some(marker_layer));
        imp.path_layer.replace(Some(path_layer));
    }

    pub fn set_clicked_callback<F: Fn(f64, f64) + 'static>(&self, f: F) {
        self.imp().clicked_callback.replace(Some(Box::new(f)));
    }

    /// Supplies the detail card for a marker when it gets activated.
    pub fn set_card_factory<F: Fn(i64) -> Option<gtk4::Widget> + 'static>(&self, f: F) {
        self.imp().card_factory.replace(Some(Box::new(f)));
    }

    /// The marker set currently on screen, for diff planning.
    pub fn marker_specs(&self) -> HashMap<i64, MarkerSpec> {
        self.imp()
            .markers
            .borrow()
            .iter()
            .map(|(id, (spec, _))| (*id, *spec))
            .collect()
    }

    /// Apply a planned reconciliation to the marker layer.
    pub fn apply_markers(&self, diff: &MarkerDiff) {
        let imp = self.imp();

        for id in &diff.remove {
            if let Some((_, marker)) = imp.markers.borrow_mut().remove(id)
                && let Some(layer) = imp.marker_layer.borrow().as_ref()
            {
                layer.remove_marker(&marker);
            }
        }

        for spec in &diff.update {
            if let Some((current, marker)) = imp.markers.borrow_mut().get_mut(&spec.memory_id) {
                *current = *spec;
                marker.set_location(spec.lat, spec.lng);
                if let Some(button) = marker.child().and_then(|w| w.downcast::<gtk4::Button>().ok())
                {
                    apply_ownership_class(&button, spec.own);
                }
            }
        }

        for spec in &diff.add {
            let marker = self.build_marker(spec);
            if let Some(layer) = imp.marker_layer.borrow().as_ref() {
                layer.add_marker(&marker);
            }
            imp.markers.borrow_mut().insert(spec.memory_id, (*spec, marker));
        }
    }

    fn build_marker(&self, spec: &MarkerSpec) -> shumate::Marker {
        let dot = gtk4::Button::new();
        dot.add_css_class("memory-marker");
        apply_ownership_class(&dot, spec.own);
        dot.set_cursor_from_name(Some("pointer"));

        let view = self.clone();
        let memory_id = spec.memory_id;
        dot.connect_clicked(move |button| {
            view.show_card_popover(button, memory_id);
        });

        let marker = shumate::Marker::new();
        marker.set_child(Some(&dot));
        marker.set_location(spec.lat, spec.lng);
        marker
    }

    fn show_card_popover(&self, parent: &gtk4::Button, memory_id: i64) {
        let card = match self.imp().card_factory.borrow().as_ref() {
            Some(factory) => factory(memory_id),
            None => None,
        };
        let Some(card) = card else {
            return;
        };

        let popover = gtk4::Popover::new();
        popover.set_child(Some(&card));
        popover.add_css_class("memory-card-popover");
        popover.set_parent(parent);
        popover.connect_closed(|popover| {
            let popover = popover.clone();
            glib::idle_add_local_once(move || popover.unparent());
        });
        popover.popup();
    }

    /// Redraw the connective thread through the given coordinates.
    pub fn set_polyline(&self, points: &[(f64, f64)]) {
        let imp = self.imp();
        if let Some(layer) = imp.path_layer.borrow().as_ref() {
            layer.remove_all();
            for (lat, lng) in points {
                let node = shumate::Coordinate::new_full(*lat, *lng);
                layer.add_node(&node);
            }
        }
    }

    /// Place (or move) the translucent pending-location marker.
    pub fn set_pending_marker(&self, lat: f64, lng: f64) {
        self.clear_pending_marker();

        let dot = gtk4::Button::new();
        dot.add_css_class("memory-marker");
        dot.add_css_class("pending");

        let marker = shumate::Marker::new();
        marker.set_child(Some(&dot));
        marker.set_location(lat, lng);

        let imp = self.imp();
        if let Some(layer) = imp.marker_layer.borrow().as_ref() {
            layer.add_marker(&marker);
        }
        imp.pending_marker.replace(Some(marker));
    }

    pub fn clear_pending_marker(&self) {
        let imp = self.imp();
        if let Some(marker) = imp.pending_marker.borrow_mut().take()
            && let Some(layer) = imp.marker_layer.borrow().as_ref()
        {
            layer.remove_marker(&marker);
        }
    }

    /// Animated recenter, used after posting a memory.
    pub fn fly_to(&self, lat: f64, lng: f64, zoom: f64) {
        if let Some(simple_map) = self.imp().simple_map.borrow().as_ref()
            && let Some(map) = simple_map.map()
        {
            map.go_to_full(lat, lng, zoom);
        }
    }

    /// Crosshair while pin mode waits for a click.
    pub fn set_pin_cursor(&self, pinning: bool) {
        if let Some(simple_map) = self.imp().simple_map.borrow().as_ref() {
            let name = if pinning { "crosshair" } else { "grab" };
            simple_map.set_cursor_from_name(Some(name));
        }
    }

    /// Drop every marker and the polyline, e.g. on sign-out.
    pub fn reset(&self) {
        let imp = self.imp();
        if let Some(layer) = imp.marker_layer.borrow().as_ref() {
            layer.remove_all();
        }
        imp.markers.borrow_mut().clear();
        imp.pending_marker.replace(None);
        self.set_polyline(&[]);
    }
}

impl Default for MemoryMapView {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_ownership_class(button: &gtk4::Button, own: bool) {
    if own {
        button.add_css_class("own");
        button.remove_css_class("shared");
    } else {
        button.add_css_class("shared");
        button.remove_css_class("own");
    }
}
