// Persistent configuration: video standard, window scale, headless run length.
// Stored as JSON in <config_dir>/rasterscroll/config.json

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::c64::VideoStandard;

pub const DEFAULT_SCALE: f32 = 2.0;
pub const MIN_SCALE: f32 = 1.0;
pub const MAX_SCALE: f32 = 6.0;

/// Eight frames per character: 50 characters on PAL.
pub const DEFAULT_HEADLESS_FRAMES: u32 = 400;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Machine to emulate ("pal" or "ntsc").
    pub video_standard: VideoStandard,
    /// Screen pixels per C64 pixel.
    pub scale: f32,
    /// Frames to run with `--headless` when `--frames` is not given.
    pub headless_frames: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video_standard: VideoStandard::Pal,
            scale: DEFAULT_SCALE,
            headless_frames: DEFAULT_HEADLESS_FRAMES,
        }
    }
}

impl Config {
    /// Path to the config file.
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|d| d.join("config.json"))
    }

    /// Load config from disk, or return defaults if not found / invalid.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Some(p) if p.exists() => p,
            _ => return Self::default(),
        };

        match Self::read_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("[rasterscroll] {e}, using defaults");
                Self::default()
            }
        }
    }

    /// Save config to disk.
    pub fn save(&self) {
        let Some(path) = Self::config_path() else {
            return;
        };
        match self.write_to(&path) {
            Ok(()) => log::info!("[rasterscroll] Config saved to {}", path.display()),
            Err(e) => log::error!("[rasterscroll] {e}"),
        }
    }

    pub fn read_from(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;
        Self::parse_json(&content)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Cannot create {}: {e}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| format!("{e}"))?;
        std::fs::write(path, json + "\n")
            .map_err(|e| format!("Cannot save config to {}: {e}", path.display()))
    }

    /// Parse config from a JSON string.  Unknown fields are ignored,
    /// missing fields get defaults, out-of-range values are clamped.
    pub fn parse_json(s: &str) -> Result<Self, String> {
        let mut config: Self =
            serde_json::from_str(s).map_err(|e| format!("Invalid config: {e}"))?;
        config.scale = if config.scale.is_finite() {
            config.scale.clamp(MIN_SCALE, MAX_SCALE)
        } else {
            DEFAULT_SCALE
        };
        Ok(config)
    }

    /// Apply command-line overrides: `--pal`, `--ntsc`, `--scale N`,
    /// `--frames N`.  Other arguments are left for the caller.
    pub fn apply_args(&mut self, args: &[String]) -> Result<(), String> {
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--pal" => self.video_standard = VideoStandard::Pal,
                "--ntsc" => self.video_standard = VideoStandard::Ntsc,
                "--scale" => {
                    let value = iter.next().ok_or("--scale needs a value")?;
                    let scale: f32 = value
                        .parse()
                        .map_err(|_| format!("Invalid --scale value: {value}"))?;
                    if !scale.is_finite() {
                        return Err(format!("Invalid --scale value: {value}"));
                    }
                    self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
                }
                "--frames" => {
                    let value = iter.next().ok_or("--frames needs a value")?;
                    self.headless_frames = value
                        .parse()
                        .map_err(|_| format!("Invalid --frames value: {value}"))?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Get the application config directory.
fn config_dir() -> Option<PathBuf> {
    // macOS:   ~/Library/Application Support/rasterscroll/
    // Linux:   ~/.config/rasterscroll/
    // Windows: %APPDATA%/rasterscroll/

    #[cfg(target_os = "macos")]
    {
        let home = std::env::var("HOME").ok()?;
        Some(
            PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("rasterscroll"),
        )
    }

    #[cfg(target_os = "windows")]
    {
        let appdata = std::env::var("APPDATA").ok()?;
        Some(PathBuf::from(appdata).join("rasterscroll"))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".config").join("rasterscroll"))
    }
}
