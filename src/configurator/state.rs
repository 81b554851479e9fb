//! Session state shared by all configurator flows.
//!
//! [`ApplicationState`] holds what the user chose and is only mutated through its
//! three actions. [`Session`] bundles it with the status the cabinet flow derives
//! while loading, so the shell can show it. The flow runner hands `&mut Session`
//! to every hook; there is no global.

use crate::configurator::catalog::{self, MaterialRecord};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApplicationState {
    selected_material: &'static MaterialRecord,
    door_open: bool,
    material_panel_open: bool,
}

impl ApplicationState {
    pub fn new() -> Self {
        Self {
            selected_material: catalog::default_material(),
            door_open: false,
            material_panel_open: false,
        }
    }

    pub fn selected_material(&self) -> &'static MaterialRecord {
        self.selected_material
    }

    pub fn door_open(&self) -> bool {
        self.door_open
    }

    pub fn material_panel_open(&self) -> bool {
        self.material_panel_open
    }

    /// Selects the catalog entry with `id`. Unknown ids leave the state untouched.
    ///
    /// Returns whether the selection changed.
    pub fn select_material(&mut self, id: &str) -> bool {
        match catalog::lookup(id) {
            Ok(record) if record != self.selected_material => {
                log::info!("Selected material {}", record.id);
                self.selected_material = record;
                true
            }
            Ok(_) => false,
            Err(e) => {
                log::debug!("Ignoring selection: {}", e);
                false
            }
        }
    }

    pub fn toggle_door(&mut self) -> bool {
        self.door_open = !self.door_open;
        self.door_open
    }

    pub fn toggle_material_panel(&mut self) -> bool {
        self.material_panel_open = !self.material_panel_open;
        self.material_panel_open
    }
}

impl Default for ApplicationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Where the cabinet model is in its lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneStatus {
    Loading,
    /// `animated` is false when no door part was classified; the door toggle then has no visible effect.
    Ready { animated: bool },
    Failed(String),
}

#[derive(Debug)]
pub struct Session {
    pub app: ApplicationState,
    pub scene: SceneStatus,
    /// Last texture load failure, cleared by the next successful bind.
    pub texture_error: Option<String>,
}

impl Session {
    pub fn is_failed(&self) -> bool {
        matches!(self.scene, SceneStatus::Failed(_))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            app: ApplicationState::new(),
            scene: SceneStatus::Loading,
            texture_error: None,
        }
    }
}
