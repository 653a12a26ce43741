use khronos_egl as egl;
use log::debug;

use crate::attributes::GlAttributes;
use crate::egl::info::Extensions;
use crate::egl::session::Session;
use crate::error::{Error, Result};

// EGL_EXT_present_opaque
const PRESENT_OPAQUE_EXT: egl::Int = 0x31DF;

/// Display extensions and hints that shape a window surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceSupport {
    pub gl_colorspace: bool,
    pub present_opaque: bool,
    pub allow_transparency: bool,
}

impl SurfaceSupport {
    pub fn of(extensions: &Extensions, allow_transparency: bool) -> Self {
        Self {
            gl_colorspace: extensions.has("EGL_KHR_gl_colorspace"),
            present_opaque: extensions.has("EGL_EXT_present_opaque"),
            allow_transparency,
        }
    }
}

/// `NONE`-terminated attribute list for `eglCreateWindowSurface`.
pub fn window_surface_attributes(
    attrs: &GlAttributes,
    support: SurfaceSupport,
) -> Result<Vec<egl::Int>> {
    let mut list = Vec::with_capacity(5);

    if attrs.framebuffer_srgb {
        if !support.gl_colorspace {
            return Err(Error::Unsupported(
                "EGL implementation does not support sRGB system framebuffers",
            ));
        }
        list.extend([egl::GL_COLORSPACE, egl::GL_COLORSPACE_SRGB]);
    }

    if support.present_opaque {
        let opaque = if support.allow_transparency {
            egl::FALSE
        } else {
            egl::TRUE
        };
        list.extend([PRESENT_OPAQUE_EXT, opaque as egl::Int]);
    }

    list.push(egl::NONE);
    Ok(list)
}

impl Session {
    /// Selects a configuration for `attrs` and creates a window surface
    /// with it.
    ///
    /// # Safety
    ///
    /// `native_window` must be a live window of the native display this
    /// session was opened on.
    pub unsafe fn create_window_surface(
        &mut self,
        attrs: &GlAttributes,
        native_window: egl::NativeWindowType,
    ) -> Result<egl::Surface> {
        let config = self.choose_config(attrs)?;
        let list = window_surface_attributes(
            attrs,
            SurfaceSupport::of(self.extensions(), self.allow_transparency),
        )?;

        self.egl()
            .create_window_surface(self.display, config, native_window, Some(&list))
            .map_err(|err| {
                Error::egl("unable to create an EGL window surface", "eglCreateWindowSurface", err)
            })
    }

    /// Selects a configuration for `attrs` and creates a pbuffer of the
    /// given size.
    pub fn create_offscreen_surface(
        &mut self,
        attrs: &GlAttributes,
        width: egl::Int,
        height: egl::Int,
    ) -> Result<egl::Surface> {
        let config = self.choose_config(attrs)?;
        let list = [egl::WIDTH, width, egl::HEIGHT, height, egl::NONE];

        self.egl()
            .create_pbuffer_surface(self.display, config, &list)
            .map_err(|err| {
                Error::egl(
                    "unable to create an EGL offscreen surface",
                    "eglCreatePbufferSurface",
                    err,
                )
            })
    }

    pub fn destroy_surface(&self, surface: egl::Surface) {
        if let Err(err) = self.egl().destroy_surface(self.display, surface) {
            debug!("eglDestroySurface failed: {err}");
        }
    }

    pub fn swap_buffers(&self, surface: egl::Surface) -> Result<()> {
        self.egl()
            .swap_buffers(self.display, surface)
            .map_err(|err| {
                Error::egl(
                    "unable to show color buffer in an OS-native window",
                    "eglSwapBuffers",
                    err,
                )
            })
    }

    /// Applies to the context that is current on this thread.
    pub fn set_swap_interval(&mut self, interval: egl::Int) -> Result<()> {
        if interval < 0 {
            return Err(Error::Unsupported("Late swap tearing currently unsupported"));
        }

        self.egl()
            .swap_interval(self.display, interval)
            .map_err(|err| {
                Error::egl("Unable to set the EGL swap interval", "eglSwapInterval", err)
            })?;
        self.swap_interval = interval;
        Ok(())
    }

    /// The last interval that was applied successfully.
    pub fn swap_interval(&self) -> egl::Int {
        self.swap_interval
    }
}
