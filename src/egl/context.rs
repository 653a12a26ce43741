use std::ffi::{c_void, CStr};

use khronos_egl as egl;
use log::{debug, info};

use crate::attributes::GlAttributes;
use crate::egl::info::{EglVersion, Extensions};
use crate::egl::session::Session;
use crate::error::{Error, Result};

// EGL_KHR_create_context
const CONTEXT_FLAGS_KHR: egl::Int = 0x30FC;
// EGL_KHR_create_context_no_error
const CONTEXT_OPENGL_NO_ERROR_KHR: egl::Int = 0x31B3;

/// What the driver accepts in a context attribute list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextSupport {
    /// EGL 1.5 or `EGL_KHR_create_context`.
    pub create_context: bool,
    /// `EGL_KHR_create_context_no_error`.
    pub no_error: bool,
}

impl ContextSupport {
    pub fn of(version: EglVersion, extensions: &Extensions) -> Self {
        Self {
            create_context: version.at_least(EglVersion::V1_5)
                || extensions.has("EGL_KHR_create_context"),
            no_error: extensions.has("EGL_KHR_create_context_no_error"),
        }
    }
}

/// Builds the `NONE`-terminated `eglCreateContext` attribute list.
///
/// Plain ES and old desktop requests go through the EGL 1.4 path, which
/// knows nothing but the ES client version. Anything else needs
/// `EGL_KHR_create_context`.
pub fn context_attributes(attrs: &GlAttributes, support: ContextSupport) -> Result<Vec<egl::Int>> {
    let es = attrs.is_es();
    let mask = attrs.profile.mask();
    let flags = attrs.flags.bits();

    let mut list = Vec::with_capacity(11);

    let legacy = (attrs.major_version < 3 || (attrs.minor_version == 0 && es))
        && flags == 0
        && (mask == 0 || es);

    if legacy {
        if es {
            list.extend([egl::CONTEXT_CLIENT_VERSION, attrs.major_version.max(1)]);
        }
    } else if support.create_context {
        list.extend([
            egl::CONTEXT_MAJOR_VERSION,
            attrs.major_version,
            egl::CONTEXT_MINOR_VERSION,
            attrs.minor_version,
        ]);
        if mask != 0 && !es {
            list.extend([egl::CONTEXT_OPENGL_PROFILE_MASK, mask]);
        }
        if flags != 0 {
            list.extend([CONTEXT_FLAGS_KHR, flags]);
        }
    } else {
        return Err(Error::Unsupported(
            "Could not create EGL context (context attributes are not supported)",
        ));
    }

    if attrs.no_error && support.no_error {
        list.extend([CONTEXT_OPENGL_NO_ERROR_KHR, 1]);
    }

    list.push(egl::NONE);
    Ok(list)
}

/// The two GL questions that decide whether a context may go current
/// without a surface.
pub trait GlQuery {
    fn has_extension(&self, name: &str) -> bool;
    fn major_version(&self) -> Option<i32>;
}

/// Surfaceless make-current needs it on both sides: EGL 1.5 or
/// `EGL_KHR_surfaceless_context`, and a client API that accepts it.
pub fn surfaceless_allowed(
    version: EglVersion,
    extensions: &Extensions,
    es: bool,
    gl: &impl GlQuery,
) -> bool {
    if !version.at_least(EglVersion::V1_5) && !extensions.has("EGL_KHR_surfaceless_context") {
        return false;
    }

    if es {
        gl.has_extension("GL_OES_surfaceless_context")
    } else {
        gl.major_version().is_some_and(|major| major >= 3)
    }
}

/// The surface and context `make_current` binds, `None` to release.
fn binding<S, C>(
    surface: Option<S>,
    context: Option<C>,
    allow_no_surface: bool,
) -> Option<(Option<S>, C)> {
    let context = context?;
    (surface.is_some() || allow_no_surface).then_some((surface, context))
}

/// Queries through the `gl` crate on the current context.
struct CurrentGl;

impl GlQuery for CurrentGl {
    fn has_extension(&self, name: &str) -> bool {
        if !gl::GetString::is_loaded() {
            return false;
        }
        let list = unsafe { gl::GetString(gl::EXTENSIONS) };
        if list.is_null() {
            return false;
        }
        let list = unsafe { CStr::from_ptr(list.cast()) };
        Extensions::parse(&list.to_string_lossy()).has(name)
    }

    fn major_version(&self) -> Option<i32> {
        if !gl::GetIntegerv::is_loaded() {
            return None;
        }
        let mut major = 0;
        unsafe { gl::GetIntegerv(gl::MAJOR_VERSION, &mut major) };
        Some(major)
    }
}

impl Session {
    /// Creates a context for the selected configuration and makes it
    /// current on `surface`.
    pub fn create_context(
        &mut self,
        attrs: &GlAttributes,
        surface: Option<egl::Surface>,
    ) -> Result<egl::Context> {
        let config = self.config().ok_or(Error::Unsupported(
            "Could not create EGL context (no config selected)",
        ))?;

        let share = if attrs.share_with_current_context {
            self.egl().get_current_context()
        } else {
            None
        };

        let support = ContextSupport::of(self.version(), self.extensions());
        let list = context_attributes(attrs, support)?;

        self.api = attrs.profile.api();
        self.egl()
            .bind_api(self.api)
            .map_err(|err| Error::egl("Could not bind the client API", "eglBindAPI", err))?;

        let context = self
            .egl()
            .create_context(self.display, config, share, &list)
            .map_err(|err| Error::egl("Could not create EGL context", "eglCreateContext", err))?;

        self.swap_interval = 0;

        if let Err(err) = self.make_current(surface, Some(context)) {
            self.delete_context(context);
            return Err(err);
        }

        gl::load_with(|name| {
            self.get_proc_address(name)
                .unwrap_or(std::ptr::null::<c_void>())
        });

        self.allow_no_surface =
            surfaceless_allowed(self.version(), self.extensions(), attrs.is_es(), &CurrentGl);
        debug!(
            "surfaceless make-current {}",
            if self.allow_no_surface { "allowed" } else { "not allowed" }
        );

        info!(
            "Created {} {}.{} context",
            if attrs.is_es() { "OpenGL ES" } else { "OpenGL" },
            attrs.major_version,
            attrs.minor_version
        );
        Ok(context)
    }

    /// Makes `context` current on `surface`. Without a context, or without
    /// a surface when the context cannot run surfaceless, the current
    /// context is released instead; a failed release is only logged.
    pub fn make_current(
        &self,
        surface: Option<egl::Surface>,
        context: Option<egl::Context>,
    ) -> Result<()> {
        // The bound API is per thread, so it may have changed since creation.
        let bound = self.egl().bind_api(self.api);

        let Some((surface, context)) = binding(surface, context, self.allow_no_surface) else {
            let released = self.egl().make_current(self.display, None, None, None);
            if let Err(err) = bound.and(released) {
                debug!("releasing the current context failed: {err}");
            }
            return Ok(());
        };

        bound.map_err(|err| Error::egl("Could not bind the client API", "eglBindAPI", err))?;
        self.egl()
            .make_current(self.display, surface, surface, Some(context))
            .map_err(|err| {
                Error::egl("Unable to make EGL context current", "eglMakeCurrent", err)
            })
    }

    pub fn delete_context(&self, context: egl::Context) {
        if let Err(err) = self.egl().destroy_context(self.display, context) {
            debug!("eglDestroyContext failed: {err}");
        }
    }

    /// Whether a context may be made current without a surface.
    pub fn allows_no_surface(&self) -> bool {
        self.allow_no_surface
    }
}
