//! Where the EGL and GL libraries live on the current platform.
//!
//! The tables are picked once at startup and handed to the loader, so
//! nothing below this module needs to know which OS it runs on.

use std::env;

use crate::attributes::GlAttributes;

/// Overrides the GL/GLES library the loader opens first.
pub const GL_DRIVER_ENV: &str = "EGL_ADAPT_GL_DRIVER";
/// Overrides the EGL library.
pub const EGL_DRIVER_ENV: &str = "EGL_ADAPT_EGL_DRIVER";
/// Index of the EGL device used for off-screen displays.
pub const DEVICE_ENV: &str = "EGL_ADAPT_DEVICE";
/// When set to a truthy value, window surfaces may be composited with alpha.
pub const ALLOW_TRANSPARENCY_ENV: &str = "EGL_ADAPT_ALLOW_TRANSPARENCY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformProfile {
    pub egl: Vec<String>,
    pub gles2: Vec<String>,
    pub gles1: Vec<String>,
    pub gl: Vec<String>,
    pub gl_override: Option<String>,
    pub egl_override: Option<String>,
    pub device: Option<usize>,
    pub allow_transparency: bool,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|name| name.to_string()).collect()
}

impl PlatformProfile {
    /// Library tables for the compile target, without any overrides.
    pub fn for_target() -> Self {
        let (egl, gles2, gles1, gl): (&[&str], &[&str], &[&str], &[&str]) =
            if cfg!(target_os = "android") {
                (
                    &["libEGL.so"],
                    &["libGLESv2.so"],
                    &["libGLESv1_CM.so", "libGLES_CM.so"],
                    &[],
                )
            } else if cfg!(windows) {
                (
                    &["libEGL.dll"],
                    &["libGLESv2.dll"],
                    &["libGLESv1_CM.dll", "libGLES_CM.dll"],
                    &[],
                )
            } else if cfg!(target_os = "macos") {
                (
                    &["libEGL.dylib"],
                    &["libGLESv2.dylib"],
                    &["libGLESv1_CM.dylib", "libGLES_CM.dylib"],
                    &[],
                )
            } else if cfg!(target_os = "openbsd") {
                (
                    &["libEGL.so"],
                    &["libGLESv2.so"],
                    &["libGLESv1_CM.so", "libGLES_CM.so"],
                    &["libGL.so"],
                )
            } else {
                (
                    &["libEGL.so.1", "libEGL.so"],
                    &["libGLESv2.so.2", "libGLESv2.so"],
                    &["libGLESv1_CM.so.1", "libGLES_CM.so.1"],
                    &["libGL.so.1", "libOpenGL.so.0"],
                )
            };

        Self {
            egl: names(egl),
            gles2: names(gles2),
            gles1: names(gles1),
            gl: names(gl),
            gl_override: None,
            egl_override: None,
            device: None,
            allow_transparency: false,
        }
    }

    /// Target tables plus overrides from the process environment.
    pub fn detect() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Target tables plus overrides from `lookup`.
    pub fn from_env_with(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key| lookup(key).filter(|value: &String| !value.is_empty());

        let mut profile = Self::for_target();
        profile.gl_override = non_empty(GL_DRIVER_ENV);
        profile.egl_override = non_empty(EGL_DRIVER_ENV);
        profile.device = non_empty(DEVICE_ENV).and_then(|value| value.trim().parse().ok());
        profile.allow_transparency = non_empty(ALLOW_TRANSPARENCY_ENV)
            .map(|value| matches!(value.as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        profile
    }

    /// GL/GLES libraries to try, in order, for the requested context.
    pub fn gl_library_candidates(&self, attrs: &GlAttributes) -> Vec<String> {
        let mut candidates: Vec<String> = self.gl_override.iter().cloned().collect();

        if attrs.is_es() {
            if attrs.major_version > 1 {
                candidates.extend(self.gles2.iter().cloned());
            } else {
                candidates.extend(self.gles1.iter().cloned());
                candidates.extend(self.gles2.iter().cloned());
            }
        } else {
            candidates.extend(self.gl.iter().cloned());
        }

        candidates
    }

    /// EGL libraries to try, in order. An explicit path comes first.
    pub fn egl_library_candidates(&self, explicit: Option<&str>) -> Vec<String> {
        explicit
            .map(str::to_string)
            .into_iter()
            .chain(self.egl_override.iter().cloned())
            .chain(self.egl.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::attributes::ContextProfile;

    fn profile_with(vars: &[(&str, &str)]) -> PlatformProfile {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        PlatformProfile::from_env_with(|key| vars.get(key).cloned())
    }

    #[test]
    fn no_overrides_by_default() {
        let profile = profile_with(&[]);
        assert_eq!(profile.gl_override, None);
        assert_eq!(profile.egl_override, None);
        assert_eq!(profile.device, None);
        assert!(!profile.allow_transparency);
        assert!(!profile.egl.is_empty());
    }

    #[test]
    fn overrides_come_first() {
        let profile = profile_with(&[
            (GL_DRIVER_ENV, "/opt/gl/libGLESv2.so"),
            (EGL_DRIVER_ENV, "/opt/gl/libEGL.so"),
        ]);

        let gl = profile.gl_library_candidates(&GlAttributes::default());
        assert_eq!(gl[0], "/opt/gl/libGLESv2.so");
        assert_eq!(&gl[1..], profile.gles2.as_slice());

        let egl = profile.egl_library_candidates(None);
        assert_eq!(egl[0], "/opt/gl/libEGL.so");
        assert_eq!(&egl[1..], profile.egl.as_slice());

        let egl = profile.egl_library_candidates(Some("./libEGL.so"));
        assert_eq!(egl[0], "./libEGL.so");
        assert_eq!(egl[1], "/opt/gl/libEGL.so");
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let profile = profile_with(&[(GL_DRIVER_ENV, ""), (DEVICE_ENV, "")]);
        assert_eq!(profile.gl_override, None);
        assert_eq!(profile.device, None);
    }

    #[test]
    fn device_and_transparency_hints() {
        let profile = profile_with(&[(DEVICE_ENV, " 2 "), (ALLOW_TRANSPARENCY_ENV, "1")]);
        assert_eq!(profile.device, Some(2));
        assert!(profile.allow_transparency);

        let profile = profile_with(&[(DEVICE_ENV, "gpu0"), (ALLOW_TRANSPARENCY_ENV, "0")]);
        assert_eq!(profile.device, None);
        assert!(!profile.allow_transparency);
    }

    #[test]
    fn library_order_follows_the_profile() {
        let profile = PlatformProfile {
            egl: names(&["egl"]),
            gles2: names(&["es2", "es2-alt"]),
            gles1: names(&["es1", "es1-pvr"]),
            gl: names(&["gl", "gl-alt"]),
            ..PlatformProfile::for_target()
        };

        let es1 = GlAttributes {
            major_version: 1,
            ..Default::default()
        };
        assert_eq!(
            profile.gl_library_candidates(&es1),
            ["es1", "es1-pvr", "es2", "es2-alt"]
        );

        let es3 = GlAttributes {
            major_version: 3,
            ..Default::default()
        };
        assert_eq!(profile.gl_library_candidates(&es3), ["es2", "es2-alt"]);

        let desktop = GlAttributes {
            profile: ContextProfile::Core,
            ..Default::default()
        };
        assert_eq!(profile.gl_library_candidates(&desktop), ["gl", "gl-alt"]);
    }
}
