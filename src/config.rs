//! Application configuration
//!
//! Supports multiple profiles (debug, release) with different settings. Every
//! field has a default so a missing or partial profile file still loads.

use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use glam::{Mat4, Quat, UVec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::camera::{DEFAULT_FAR, DEFAULT_NEAR, Fov};
use crate::hmd::{Hand, RuntimeKind};
use crate::render::MirrorMode;

/// Mirror window configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub fullscreen: bool,
    pub resizable: bool,
    /// Title bar and borders
    pub decorated: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "VR GUI".to_string(),
            width: 800.0,
            height: 600.0,
            fullscreen: false,
            resizable: true,
            decorated: true,
        }
    }
}

/// GPU backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendChoice {
    All,
    Gl,
    Vulkan,
    Metal,
    Dx12,
}

impl BackendChoice {
    pub fn to_backends(self) -> wgpu::Backends {
        match self {
            BackendChoice::All => wgpu::Backends::all(),
            BackendChoice::Gl => wgpu::Backends::GL,
            BackendChoice::Vulkan => wgpu::Backends::VULKAN,
            BackendChoice::Metal => wgpu::Backends::METAL,
            BackendChoice::Dx12 => wgpu::Backends::DX12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub backend: BackendChoice,
    pub vsync: bool,
    pub high_performance: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            backend: BackendChoice::All,
            vsync: true,
            high_performance: true,
        }
    }
}

impl GraphicsConfig {
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }

    pub fn power_preference(&self) -> wgpu::PowerPreference {
        if self.high_performance {
            wgpu::PowerPreference::HighPerformance
        } else {
            wgpu::PowerPreference::LowPower
        }
    }
}

/// Head-mounted display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HmdConfig {
    pub runtime: RuntimeKind,
    /// Hand whose controller drives the panel
    pub hand: Hand,
    /// Interpupillary distance in metres (simulated runtime)
    pub ipd: f32,
    /// Per-eye render target size (simulated runtime)
    pub eye_resolution: [u32; 2],
    /// Full horizontal and vertical field of view in degrees (simulated runtime)
    pub fov_degrees: [f32; 2],
    /// Standing eye height in metres (simulated runtime)
    pub head_height: f32,
    pub near: f32,
    pub far: f32,
    /// Images per eye in the stereo swapchain
    pub swapchain_length: u32,
    pub mirror: MirrorMode,
}

impl Default for HmdConfig {
    fn default() -> Self {
        Self {
            runtime: RuntimeKind::Simulated,
            hand: Hand::Right,
            ipd: 0.063,
            eye_resolution: [1200, 1080],
            fov_degrees: [100.0, 90.0],
            head_height: 1.6,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            swapchain_length: 3,
            mirror: MirrorMode::SideBySide,
        }
    }
}

impl HmdConfig {
    pub fn fov(&self) -> Fov {
        Fov::symmetric(self.fov_degrees[0], self.fov_degrees[1])
    }

    pub fn eye_resolution(&self) -> UVec2 {
        UVec2::new(self.eye_resolution[0].max(1), self.eye_resolution[1].max(1))
    }
}

/// GUI panel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Virtual canvas size in pixels
    pub canvas_size: [u32; 2],
    /// Canvas pixels per world unit
    pub pixels_per_unit: f32,
    pub thumbstick_deadzone: f32,
    /// Controller ray length in metres
    pub max_raycast_distance: f32,
    /// Panel centre in world space
    pub position: [f32; 3],
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub line_color: [f32; 3],
    /// Canvas clear colour, linear RGBA
    pub background: [f32; 4],
    pub floor_grid: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            canvas_size: [1600, 600],
            pixels_per_unit: 1000.0,
            thumbstick_deadzone: 0.3,
            max_raycast_distance: 30.0,
            position: [0.0, 1.4, -2.5],
            yaw_degrees: 0.0,
            pitch_degrees: 0.0,
            line_color: [1.0, 0.0, 0.0],
            background: [0.2, 0.2, 0.2, 1.0],
            floor_grid: true,
        }
    }
}

impl PanelConfig {
    pub fn canvas_size(&self) -> UVec2 {
        UVec2::new(self.canvas_size[0].max(1), self.canvas_size[1].max(1))
    }

    /// Panel placement without the canvas scale
    pub fn model(&self) -> Mat4 {
        let rotation = Quat::from_rotation_y(self.yaw_degrees.to_radians())
            * Quat::from_rotation_x(self.pitch_degrees.to_radians());
        Mat4::from_rotation_translation(rotation, Vec3::from(self.position))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives; `RUST_LOG` wins when set
    pub filter: String,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,wgpu_core=warn,wgpu_hal=warn,naga=warn".to_string(),
            ansi: true,
            with_target: false,
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The active profile (debug, release, etc.)
    pub profile: String,
    pub window: WindowConfig,
    pub graphics: GraphicsConfig,
    pub hmd: HmdConfig,
    pub panel: PanelConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration based on the specified profile
    ///
    /// Sources, later ones winning:
    /// 1. config/{profile}.toml
    /// 2. Environment variables with prefix APP_ (e.g., APP_PANEL__PIXELS_PER_UNIT=800)
    ///
    /// Config files are searched for next to the executable, then in ./config.
    pub fn load(profile: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match Self::find_config_dir() {
            Some(dir) => {
                let profile_path = dir.join(profile);
                builder.add_source(File::from(profile_path.as_path()).required(false))
            }
            None => builder.add_source(File::with_name(&format!("config/{profile}")).required(false)),
        };

        // Use __ as separator for nested fields (e.g., APP_WINDOW__WIDTH)
        builder = builder.add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.set_override("profile", profile)?.build()?;
        config.try_deserialize()
    }

    fn find_config_dir() -> Option<PathBuf> {
        if let Ok(exe_path) = std::env::current_exe()
            && let Some(exe_dir) = exe_path.parent()
        {
            let config_dir = exe_dir.join("config");
            if config_dir.exists() {
                return Some(config_dir);
            }
        }

        let cwd_config = PathBuf::from("config");
        cwd_config.exists().then_some(cwd_config)
    }

    /// Profile from APP_PROFILE, defaulting to the build type
    pub fn default_profile() -> String {
        std::env::var("APP_PROFILE").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                "debug".to_string()
            } else {
                "release".to_string()
            }
        })
    }

    pub fn load_from_env() -> Result<Self, ConfigError> {
        Self::load(&Self::default_profile())
    }

    /// Built-in defaults tagged with `profile`
    pub fn defaults_for(profile: &str) -> Self {
        Self {
            profile: profile.to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(source: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(source, FileFormat::Toml))
            .build()
            .and_then(Config::try_deserialize)
            .expect("valid config")
    }

    #[test]
    fn panel_defaults_match_reference_values() {
        let panel = PanelConfig::default();
        assert_eq!(panel.canvas_size(), UVec2::new(1600, 600));
        assert_eq!(panel.pixels_per_unit, 1000.0);
        assert_eq!(panel.thumbstick_deadzone, 0.3);
        assert_eq!(panel.max_raycast_distance, 30.0);
        assert_eq!(panel.line_color, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn partial_profile_keeps_defaults_for_missing_fields() {
        let config = from_toml(
            r#"
            [panel]
            pixels_per_unit = 800.0

            [hmd]
            runtime = "simulated"
            mirror = "left"
            "#,
        );

        assert_eq!(config.panel.pixels_per_unit, 800.0);
        assert_eq!(config.panel.canvas_size, [1600, 600]);
        assert_eq!(config.hmd.mirror, MirrorMode::Left);
        assert_eq!(config.hmd.hand, Hand::Right);
        assert_eq!(config.window.width, 800.0);
    }

    #[test]
    fn backend_names_parse() {
        let config = from_toml("[graphics]\nbackend = \"gl\"\nvsync = false\n");
        assert_eq!(config.graphics.backend, BackendChoice::Gl);
        assert_eq!(config.graphics.backend.to_backends(), wgpu::Backends::GL);
        assert_eq!(config.graphics.present_mode(), wgpu::PresentMode::AutoNoVsync);
    }

    #[test]
    fn panel_model_places_centre_at_position() {
        let panel = PanelConfig {
            position: [1.0, 2.0, -3.0],
            yaw_degrees: 45.0,
            ..PanelConfig::default()
        };
        let centre = panel.model().transform_point3(Vec3::ZERO);
        assert!((centre - Vec3::new(1.0, 2.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn zero_canvas_size_is_clamped() {
        let panel = PanelConfig {
            canvas_size: [0, 0],
            ..PanelConfig::default()
        };
        assert_eq!(panel.canvas_size(), UVec2::ONE);
    }

    #[test]
    fn missing_profile_falls_back_to_defaults() {
        let config = AppConfig::load("no-such-profile").expect("missing files are optional");
        assert_eq!(config.profile, "no-such-profile");
        assert_eq!(config.hmd.swapchain_length, 3);
    }
}
