use serde::{Deserialize, Serialize};

use crate::normals::EditOptions;
use crate::transfer::Retargeting;

pub const SETTINGS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub version: u32,
    pub edit: EditOptions,
    pub retargeting: Retargeting,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            edit: EditOptions::default(),
            retargeting: Retargeting::default(),
        }
    }
}

impl EditorSettings {
    pub fn migrate_to_latest(&mut self) {
        if self.version < SETTINGS_VERSION {
            self.version = SETTINGS_VERSION;
        }
    }
}
