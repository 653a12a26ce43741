use std::ffi::c_void;

use khronos_egl as egl;
use libloading::Library;
use log::{debug, info};

use crate::attributes::GlAttributes;
use crate::egl::info::EglVersion;
use crate::error::{Error, Result};
use crate::platform::PlatformProfile;

pub type Egl = egl::DynamicInstance<egl::EGL1_4>;

/// The EGL entry points plus the GL/GLES library they drive.
pub struct Libraries {
    // Field order matters: EGL is released before the GL library.
    pub egl: Egl,
    pub gl: Library,
    pub egl_path: String,
    pub gl_path: String,
}

fn open_first(candidates: &[String]) -> Option<(Library, String)> {
    for path in candidates {
        match unsafe { Library::new(path) } {
            Ok(lib) => return Some((lib, path.clone())),
            Err(err) => debug!("could not open {path}: {err}"),
        }
    }
    None
}

impl Libraries {
    /// Opens the GL library first, then an EGL library that exports the
    /// complete EGL 1.4 core.
    pub fn load(
        profile: &PlatformProfile,
        attrs: &GlAttributes,
        egl_path: Option<&str>,
    ) -> Result<Self> {
        let (gl, gl_path) = open_first(&profile.gl_library_candidates(attrs)).ok_or_else(|| {
            Error::LibraryLoad("Could not initialize OpenGL / GLES library".to_string())
        })?;

        let (egl, egl_path) = profile
            .egl_library_candidates(egl_path)
            .into_iter()
            .find_map(
                |path| match unsafe { Egl::load_required_from_filename(&path) } {
                    Ok(egl) => Some((egl, path)),
                    Err(err) => {
                        debug!("could not load EGL from {path}: {err}");
                        None
                    }
                },
            )
            .ok_or_else(|| Error::LibraryLoad("Could not load EGL library".to_string()))?;

        info!("Loaded EGL from {egl_path} and GL from {gl_path}");

        Ok(Self {
            egl,
            gl,
            egl_path,
            gl_path,
        })
    }

    /// Resolves a GL or EGL entry point.
    ///
    /// EGL 1.5 can hand out core symbols through `eglGetProcAddress`, so it
    /// is asked first there; older versions only know about extensions and
    /// are asked last, after the GL library itself.
    pub fn get_proc_address(&self, name: &str, version: EglVersion) -> Option<*const c_void> {
        let modern = version.at_least(EglVersion::V1_5);

        if modern {
            if let Some(addr) = self.egl_proc(name) {
                return Some(addr);
            }
        }

        if let Some(addr) = self.gl_symbol(name) {
            return Some(addr);
        }

        if !modern {
            return self.egl_proc(name);
        }

        None
    }

    fn egl_proc(&self, name: &str) -> Option<*const c_void> {
        self.egl
            .get_proc_address(name)
            .map(|addr| addr as *const c_void)
    }

    fn gl_symbol(&self, name: &str) -> Option<*const c_void> {
        let lookup = |symbol: &str| -> Option<*const c_void> {
            let addr = unsafe { self.gl.get::<*const c_void>(symbol.as_bytes()) }
                .map(|sym| *sym)
                .ok()?;
            (!addr.is_null()).then_some(addr)
        };

        // Some toolchains export with a leading underscore.
        lookup(name).or_else(|| lookup(&format!("_{name}")))
    }
}
