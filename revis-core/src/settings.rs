use crate::RevisError;
use dispatch::DispatchOptions;
use figure::{RenderOptions, Rgba};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SCALE_FACTOR: u32 = 2;
pub const MAX_SCALE_FACTOR: u32 = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RevisSettings {
    pub figure: FigureSettings,
    pub render: RenderSettings,
    pub dispatch: DispatchSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureSettings {
    pub width: u32,
    pub height: u32,
    pub disable_output: bool,
}

impl Default for FigureSettings {
    fn default() -> Self {
        Self {
            width: figure::DEFAULT_WIDTH,
            height: figure::DEFAULT_HEIGHT,
            disable_output: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub scale_factor: u32,
    /// `#rrggbb`, or `#rrggbbff`; snapshots are opaque so other alphas are
    /// rejected.
    pub background: String,
    pub show_axes: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            background: "#ffffff".to_string(),
            show_axes: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DispatchSettings {
    /// 0 waits forever.
    pub timeout_ms: u64,
}

impl RevisSettings {
    pub fn render_options(&self) -> Result<RenderOptions, RevisError> {
        let background: Rgba = self
            .render
            .background
            .parse()
            .map_err(|err: figure::ParseColorError| RevisError::InvalidSettings(err.to_string()))?;
        if background.a < 1.0 {
            return Err(RevisError::InvalidSettings(format!(
                "render.background {} must be opaque",
                self.render.background
            )));
        }
        Ok(RenderOptions {
            scale_factor: self.render.scale_factor.clamp(1, MAX_SCALE_FACTOR),
            background,
            show_axes: self.render.show_axes,
        })
    }

    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions::with_timeout_ms(self.dispatch.timeout_ms)
    }
}

pub fn normalize_settings(mut settings: RevisSettings) -> Result<RevisSettings, RevisError> {
    settings.figure.width = settings.figure.width.max(1);
    settings.figure.height = settings.figure.height.max(1);
    settings.render.scale_factor = settings.render.scale_factor.clamp(1, MAX_SCALE_FACTOR);
    settings.render_options()?;
    Ok(settings)
}

pub fn load_settings(path: &Path) -> Result<RevisSettings, RevisError> {
    let data = std::fs::read_to_string(path)?;
    let settings: RevisSettings = toml::from_str(&data)?;
    normalize_settings(settings)
}

pub fn save_settings(path: &Path, settings: &RevisSettings) -> Result<(), RevisError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let data = toml::to_string_pretty(settings)?;
    std::fs::write(path, data)?;
    Ok(())
}

static SETTINGS: RwLock<Option<RevisSettings>> = parking_lot::const_rwlock(None);

/// Process-wide settings, defaults until [`install_settings`] is called.
pub fn settings() -> RevisSettings {
    SETTINGS.read().clone().unwrap_or_default()
}

pub fn install_settings(settings: RevisSettings) {
    *SETTINGS.write() = Some(settings);
}

pub fn reset_settings() {
    *SETTINGS.write() = None;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_clamps_scale_and_size() {
        let mut settings = RevisSettings::default();
        settings.render.scale_factor = 0;
        settings.figure.width = 0;
        let settings = normalize_settings(settings).unwrap();
        assert_eq!(settings.render.scale_factor, 1);
        assert_eq!(settings.figure.width, 1);
    }

    #[test]
    fn normalize_rejects_bad_background() {
        let mut settings = RevisSettings::default();
        settings.render.background = "white".to_string();
        assert!(matches!(
            normalize_settings(settings),
            Err(RevisError::InvalidSettings(_))
        ));
    }

    #[test]
    fn translucent_background_is_rejected() {
        let mut settings = RevisSettings::default();
        settings.render.background = "#00000000".to_string();
        assert!(matches!(
            settings.render_options(),
            Err(RevisError::InvalidSettings(msg)) if msg.contains("opaque")
        ));
        settings.render.background = "#102030ff".to_string();
        let options = settings.render_options().unwrap();
        assert_eq!(options.background, Rgba::from_rgb8(0x10, 0x20, 0x30));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let settings: RevisSettings = toml::from_str("[render]\nscale_factor = 3\n").unwrap();
        assert_eq!(settings.render.scale_factor, 3);
        assert_eq!(settings.render.background, "#ffffff");
        assert_eq!(settings.figure, FigureSettings::default());
        assert_eq!(settings.dispatch_options().timeout, None);
    }
}
