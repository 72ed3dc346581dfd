// SPDX-License-Identifier: GPL-3.0-only

//! Popup operations
//!
//! Thin wrappers that route every overlay change through the session store.

use crate::app::SessionOrchestrator;
use crate::app::popup::PopupKind;

impl SessionOrchestrator {
    pub fn show_popup(&self, kind: PopupKind) {
        self.inner.store.update(|state| state.popups.show(kind));
    }

    pub fn hide_popup(&self) {
        self.inner.store.update(|state| state.popups.hide());
    }

    pub fn toggle_popup(&self, kind: PopupKind) {
        self.inner.store.update(|state| state.popups.toggle(kind));
    }

    pub fn popup_back(&self) {
        self.inner.store.update(|state| state.popups.back());
    }

    pub fn toggle_mode_menu(&self) {
        self.toggle_popup(PopupKind::ModeMenu);
    }
}
