use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading or validating a viewer configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Perspective camera placement and frustum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    pub target: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [5.0, 5.0, 5.0],
            target: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CubeConfig {
    pub size: f32,
    /// Height of the cube's center above the ground.
    pub elevation: f32,
    /// Radians added to the X and Y rotation every frame.
    pub spin_per_frame: [f32; 2],
}

impl Default for CubeConfig {
    fn default() -> Self {
        Self {
            size: 1.0,
            elevation: 0.5,
            spin_per_frame: [0.01, 0.01],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    pub size: f32,
    /// Packed `0xRRGGBB`.
    pub color: u32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            color: 0xffffff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub size: f32,
    pub divisions: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            size: 10.0,
            divisions: 10,
        }
    }
}

/// Everything the viewer sets up once at start.
///
/// Every field has a default, so a YAML file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Packed `0xRRGGBB` clear color.
    pub background: u32,
    pub antialias: bool,
    pub transparent: bool,
    pub camera: CameraConfig,
    pub cube: CubeConfig,
    pub ground: GroundConfig,
    pub grid: GridConfig,
    pub axes_size: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            background: 0x1a1a1a,
            antialias: true,
            transparent: true,
            camera: CameraConfig::default(),
            cube: CubeConfig::default(),
            ground: GroundConfig::default(),
            grid: GridConfig::default(),
            axes_size: 2.0,
        }
    }
}

impl ViewerConfig {
    /// Read and validate a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded viewer config");
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cam = &self.camera;
        if !(cam.fov > 0.0 && cam.fov < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov must be in (0, 180), got {}",
                cam.fov
            )));
        }
        if !(cam.near > 0.0 && cam.near < cam.far) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        if cam.position == cam.target {
            return Err(ConfigError::Invalid(
                "camera.position and camera.target coincide".into(),
            ));
        }
        let view_dir = (Vec3::from(cam.target) - Vec3::from(cam.position)).normalize();
        if view_dir.cross(Vec3::Y).length_squared() < 1e-6 {
            return Err(ConfigError::Invalid(
                "camera must not look straight up or down".into(),
            ));
        }
        if self.cube.size <= 0.0
            || self.ground.size <= 0.0
            || self.grid.size <= 0.0
            || self.axes_size <= 0.0
        {
            return Err(ConfigError::Invalid("sizes must be positive".into()));
        }
        if !self.cube.spin_per_frame.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid(
                "cube.spin_per_frame must be finite".into(),
            ));
        }
        if self.grid.divisions == 0 {
            return Err(ConfigError::Invalid("grid.divisions must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_looking_straight_down_is_rejected() {
        let mut config = ViewerConfig::default();
        config.camera.position = [0.0, 5.0, 0.0];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.camera.position = [0.0, -3.0, 0.0];
        assert!(config.validate().is_err());
        config.camera.position = [0.1, 5.0, 0.0];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn non_positive_axes_and_non_finite_spin_are_rejected() {
        let mut config = ViewerConfig::default();
        config.axes_size = 0.0;
        assert!(config.validate().is_err());

        let mut config = ViewerConfig::default();
        config.cube.spin_per_frame = [f32::NAN, 0.01];
        assert!(config.validate().is_err());
        config.cube.spin_per_frame = [0.01, f32::INFINITY];
        assert!(config.validate().is_err());
    }

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.background, 0x1a1a1a);
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.cube.spin_per_frame, [0.01, 0.01]);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = ViewerConfig::from_yaml_str("camera:\n  fov: 60.0\naxes_size: 3.0\n").unwrap();
        assert_eq!(config.camera.fov, 60.0);
        assert_eq!(config.camera.far, 1000.0);
        assert_eq!(config.axes_size, 3.0);
        assert_eq!(config.grid, GridConfig::default());
    }

    #[test]
    fn yaml_round_trip_preserves_config() {
        let mut config = ViewerConfig::default();
        config.cube.elevation = 2.0;
        config.ground.color = 0x336699;
        let text = config.to_yaml().unwrap();
        assert_eq!(ViewerConfig::from_yaml_str(&text).unwrap(), config);
    }

    #[test]
    fn rejects_inverted_clip_planes() {
        let err = ViewerConfig::from_yaml_str("camera:\n  near: 10.0\n  far: 1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_grid_divisions() {
        let mut config = ViewerConfig::default();
        config.grid.divisions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_yaml() {
        let err = ViewerConfig::from_yaml_str("camera: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = ViewerConfig::load("/nonexistent/cubescene.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
