//! Configuration for surface extraction and post-processing
use serde::{Deserialize, Serialize};

/// How vertex normals are produced after a subdivision pass
#[derive(
    Copy,
    Clone,
    Debug,
    Default,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
pub enum NormalMode {
    /// Normals are blended with the same stencil as positions, then
    /// renormalized
    #[default]
    Accumulate,

    /// Normals are rebuilt from scratch as area-weighted face normals
    Recalculate,
}

/// Settings for isosurface extraction
///
/// These are read at the start of every triangulation, so they may be changed
/// between frames.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Field value at which the surface is extracted
    ///
    /// Samples below this value are considered inside.
    pub iso_value: f32,

    /// Blend value, carried for the caller and unused during meshing
    pub blend_value: f32,

    /// Number of subdivision passes applied after triangulation
    pub loop_subdivs: usize,

    /// Width of the surface smoothing filter (0 disables it)
    pub smooth_surface: f32,

    /// Width of the normal smoothing filter (0 disables it)
    pub smooth_normals: f32,

    /// Normal handling during subdivision
    pub normal_mode: NormalMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            iso_value: 0.5,
            blend_value: 0.5,
            loop_subdivs: 0,
            smooth_surface: 0.0,
            smooth_normals: 0.0,
            normal_mode: NormalMode::Accumulate,
        }
    }
}

impl Settings {
    /// Largest smoothing strength accepted by [`Settings::sanitized`]
    pub const MAX_SMOOTHING: f32 = 50.0;

    /// Returns a copy with out-of-range smoothing strengths reset to `1.0`
    ///
    /// Strengths that are negative, above [`Settings::MAX_SMOOTHING`], or not
    /// finite are replaced.
    pub fn sanitized(self) -> Self {
        let fix = |v: f32| {
            if v.is_finite() && (0.0..=Self::MAX_SMOOTHING).contains(&v) {
                v
            } else {
                1.0
            }
        };
        Self {
            smooth_surface: fix(self.smooth_surface),
            smooth_normals: fix(self.smooth_normals),
            ..self
        }
    }

    /// Returns a copy with both smoothing widths scaled by `feature_size`
    ///
    /// Smoothing strengths are usually given relative to the grid, so callers
    /// pass something on the order of a cell size here.
    pub fn scaled(self, feature_size: f32) -> Self {
        Self {
            smooth_surface: self.smooth_surface * feature_size,
            smooth_normals: self.smooth_normals * feature_size,
            ..self
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn sanitize_resets_bad_values() {
        let s = Settings {
            smooth_surface: -2.0,
            smooth_normals: 75.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.smooth_surface, 1.0);
        assert_eq!(s.smooth_normals, 1.0);

        let s = Settings {
            smooth_surface: f32::NAN,
            smooth_normals: 0.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(s.smooth_surface, 1.0);
        assert_eq!(s.smooth_normals, 0.0);
    }

    #[test]
    fn sanitize_keeps_valid_values() {
        let s = Settings {
            smooth_surface: 2.5,
            smooth_normals: 50.0,
            loop_subdivs: 2,
            ..Default::default()
        };
        assert_eq!(s.sanitized(), s);
    }

    #[test]
    fn scaling() {
        let s = Settings {
            smooth_surface: 2.0,
            smooth_normals: 4.0,
            ..Default::default()
        }
        .scaled(0.25);
        assert_eq!(s.smooth_surface, 0.5);
        assert_eq!(s.smooth_normals, 1.0);
        assert_eq!(s.iso_value, Settings::default().iso_value);
    }

    #[test]
    fn normal_mode_names() {
        let names: Vec<&'static str> =
            NormalMode::iter().map(|m| m.into()).collect();
        assert_eq!(names, ["Accumulate", "Recalculate"]);
    }

    #[test]
    fn serde_round_trip() {
        let s = Settings {
            loop_subdivs: 1,
            smooth_surface: 1.5,
            normal_mode: NormalMode::Recalculate,
            ..Default::default()
        };
        let text = serde_json::to_string(&s).unwrap();
        let out: Settings = serde_json::from_str(&text).unwrap();
        assert_eq!(out, s);
    }
}
