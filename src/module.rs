//! Module identification
//!
//! The firmware version string starts with the model name, e.g.
//! `RN2483 1.0.1 Dec 15 2015 09:38:09`. Characters 2 to 6 hold the numeric
//! model code that selects the command variant.

/// Attached radio module
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModuleVariant {
    /// Not resolved, or not a supported module
    #[default]
    Unknown,
    /// RN2483, 868 MHz band
    Rn2483,
    /// RN2903, 915 MHz band
    Rn2903,
}

impl ModuleVariant {
    /// Classify a `sys get ver` reply
    pub fn from_version(version: &str) -> Self {
        match model_code(version) {
            Some(2483) => ModuleVariant::Rn2483,
            Some(2903) => ModuleVariant::Rn2903,
            _ => ModuleVariant::Unknown,
        }
    }

    /// MAC reset command for this band
    pub fn reset_command(&self) -> Option<&'static str> {
        match self {
            ModuleVariant::Rn2483 => Some("mac reset 868"),
            ModuleVariant::Rn2903 => Some("mac reset"),
            ModuleVariant::Unknown => None,
        }
    }

    /// Output power index used for uplinks
    pub fn power_index(&self) -> u8 {
        match self {
            ModuleVariant::Rn2903 => 5,
            _ => 1,
        }
    }

    /// Whether the RX2 window must be set explicitly before joining
    pub fn needs_rx2_setup(&self) -> bool {
        matches!(self, ModuleVariant::Rn2483)
    }
}

/// Leading decimal digits of the fixed-offset model field
fn model_code(version: &str) -> Option<u16> {
    let field = version.get(2..6)?;
    let end = field
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(field.len());
    field[..end].parse().ok()
}
