// SPDX-License-Identifier: GPL-3.0-only

//! Popup/overlay coordinator
//!
//! A single active slot plus a back-navigation slot. Every popup change in
//! the session goes through these four operations, so two overlays can never
//! be visible at once.

/// Overlay panels that can be shown over the preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopupKind {
    ModeMenu,
    FilterPicker,
    Settings,
    ProSettings,
    TimerPicker,
    AspectRatioPicker,
    BeautyPicker,
}

impl PopupKind {
    pub const ALL: [PopupKind; 7] = [
        PopupKind::ModeMenu,
        PopupKind::FilterPicker,
        PopupKind::Settings,
        PopupKind::ProSettings,
        PopupKind::TimerPicker,
        PopupKind::AspectRatioPicker,
        PopupKind::BeautyPicker,
    ];
}

/// Active and previous popup; `None` means nothing shown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupState {
    active: Option<PopupKind>,
    previous: Option<PopupKind>,
}

impl PopupState {
    pub fn active(&self) -> Option<PopupKind> {
        self.active
    }

    pub fn previous(&self) -> Option<PopupKind> {
        self.previous
    }

    pub fn is_visible(&self, kind: PopupKind) -> bool {
        self.active == Some(kind)
    }

    pub fn show(&mut self, kind: PopupKind) {
        self.previous = self.active;
        self.active = Some(kind);
    }

    pub fn hide(&mut self) {
        self.previous = self.active;
        self.active = None;
    }

    pub fn toggle(&mut self, kind: PopupKind) {
        if self.active == Some(kind) {
            self.hide();
        } else {
            self.show(kind);
        }
    }

    /// Return to the previous popup (or to none), then forget it
    pub fn back(&mut self) {
        self.active = self.previous;
        self.previous = None;
    }
}
