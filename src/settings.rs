use crate::geometry::Size;
use crate::layout::{
    AnchorOffset, AnchorQuadrant, DEFAULT_ANCHOR_MARGIN, DEFAULT_ANCHOR_OFFSET, DEFAULT_CORNER_RADIUS,
};
use crate::render::Color;
use crate::shadow::ShadowSettings;
use crate::surface::BackStyle;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "balloon_settings.json";

/// Persisted balloon defaults. Missing fields fall back to [`Default`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalloonSettings {
    pub size: Size,
    pub corner_radius: i32,
    pub anchor_margin: i32,
    pub anchor_quadrant: AnchorQuadrant,
    /// Starting side used by `Auto`. Must not be `auto` itself.
    pub anchor_quadrant_base: AnchorQuadrant,
    pub anchor_offset: AnchorOffset,
    pub anchor_offset_base: i32,
    /// Auto-hide delay in milliseconds, `0` keeps the balloon up.
    pub timeout_ms: u64,
    pub allow_obscure: bool,
    pub move_with_target: bool,
    pub close_box: bool,
    pub back_color: Color,
    pub back_style: BackStyle,
    pub border_color: Color,
    pub border_width: u32,
    pub shadow: ShadowSettings,
    /// When enabled the logger is initialised at debug level.
    pub debug_logging: bool,
}

impl Default for BalloonSettings {
    fn default() -> Self {
        Self {
            size: Size::new(300, 300),
            corner_radius: DEFAULT_CORNER_RADIUS,
            anchor_margin: DEFAULT_ANCHOR_MARGIN,
            anchor_quadrant: AnchorQuadrant::Auto,
            anchor_quadrant_base: AnchorQuadrant::Top,
            anchor_offset: AnchorOffset::Auto,
            anchor_offset_base: DEFAULT_ANCHOR_OFFSET,
            timeout_ms: 0,
            allow_obscure: true,
            move_with_target: true,
            close_box: true,
            back_color: Color::INFO,
            back_style: BackStyle::Solid,
            border_color: Color::BLACK,
            border_width: 1,
            shadow: ShadowSettings::default(),
            debug_logging: false,
        }
    }
}

impl BalloonSettings {
    /// Replaces values a balloon would reject. Returns `true` if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let defaults = Self::default();
        let mut changed = false;
        if self.size.is_empty() {
            tracing::warn!(size = ?self.size, "balloon size has no area; using default");
            self.size = defaults.size;
            changed = true;
        }
        if self.corner_radius < 1 {
            tracing::warn!(radius = self.corner_radius, "corner radius must be positive; clamping to 1");
            self.corner_radius = 1;
            changed = true;
        }
        if self.anchor_margin < 0 {
            tracing::warn!(margin = self.anchor_margin, "anchor margin is negative; clamping to 0");
            self.anchor_margin = 0;
            changed = true;
        }
        if self.anchor_quadrant_base == AnchorQuadrant::Auto {
            tracing::warn!("anchor quadrant base cannot be auto; using top");
            self.anchor_quadrant_base = defaults.anchor_quadrant_base;
            changed = true;
        }
        if let AnchorOffset::Fixed(offset) = self.anchor_offset {
            if offset < 0 {
                tracing::warn!(offset, "anchor offset is negative; using auto");
                self.anchor_offset = AnchorOffset::Auto;
                changed = true;
            }
        }
        if self.anchor_offset_base < 0 {
            tracing::warn!(offset = self.anchor_offset_base, "anchor offset base is negative; using default");
            self.anchor_offset_base = defaults.anchor_offset_base;
            changed = true;
        }
        if self.border_width == 0 {
            self.border_width = 1;
            changed = true;
        }
        if self.shadow.margin < 0 {
            tracing::warn!(margin = self.shadow.margin, "shadow margin is negative; clamping to 0");
            self.shadow.margin = 0;
            changed = true;
        }
        changed
    }
}

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(SETTINGS_FILE_NAME))
}

/// Loads settings from `path`. A missing or empty file yields the defaults.
pub fn load(path: &Path) -> Result<BalloonSettings> {
    if !path.exists() {
        return Ok(BalloonSettings::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("read balloon settings file {}", path.display()))?;

    if content.trim().is_empty() {
        return Ok(BalloonSettings::default());
    }

    let mut loaded: BalloonSettings = serde_json::from_str(&content)
        .with_context(|| format!("deserialize balloon settings file {}", path.display()))?;
    loaded.sanitize();
    Ok(loaded)
}

pub fn save(path: &Path, settings: &BalloonSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create balloon settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json = serde_json::to_string_pretty(&sanitized).context("serialize balloon settings")?;
    std::fs::write(path, json)
        .with_context(|| format!("write balloon settings file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_path_is_resolved_next_to_executable() {
        let exe = Path::new("/tmp/myapp/bin/balloon_demo");
        let path = settings_path_from_exe_path(exe).expect("path");
        assert_eq!(path, Path::new("/tmp/myapp/bin").join(SETTINGS_FILE_NAME));
    }

    #[test]
    fn load_returns_defaults_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let loaded = load(&dir.path().join(SETTINGS_FILE_NAME)).expect("load");
        assert_eq!(loaded, BalloonSettings::default());
    }

    #[test]
    fn empty_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, "  \n").expect("write");
        assert_eq!(load(&path).expect("load"), BalloonSettings::default());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{ "anchor_quadrant": "left", "timeout_ms": 2500 }"#).expect("write");
        let loaded = load(&path).expect("load");
        assert_eq!(loaded.anchor_quadrant, AnchorQuadrant::Left);
        assert_eq!(loaded.timeout_ms, 2500);
        assert_eq!(loaded.corner_radius, DEFAULT_CORNER_RADIUS);
        assert!(loaded.shadow.enabled);
    }

    #[test]
    fn sanitize_clamps_rejected_values() {
        let mut settings = BalloonSettings {
            corner_radius: 0,
            anchor_margin: -3,
            anchor_quadrant_base: AnchorQuadrant::Auto,
            anchor_offset: AnchorOffset::Fixed(-1),
            ..BalloonSettings::default()
        };
        assert!(settings.sanitize());
        assert_eq!(settings.corner_radius, 1);
        assert_eq!(settings.anchor_margin, 0);
        assert_eq!(settings.anchor_quadrant_base, AnchorQuadrant::Top);
        assert_eq!(settings.anchor_offset, AnchorOffset::Auto);
        assert!(!BalloonSettings::default().sanitize());
    }
}
