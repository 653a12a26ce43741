use khronos_egl as egl;
use serde::{Deserialize, Serialize};

/// Which flavour of GL a context is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextProfile {
    /// Desktop GL without an explicit profile mask
    Any,
    /// Desktop GL, core profile
    Core,
    /// Desktop GL, compatibility profile
    Compatibility,
    /// OpenGL ES
    #[default]
    Es,
}

impl ContextProfile {
    /// Value for `EGL_CONTEXT_OPENGL_PROFILE_MASK`, zero when no mask applies.
    pub fn mask(self) -> egl::Int {
        match self {
            ContextProfile::Core => egl::CONTEXT_OPENGL_CORE_PROFILE_BIT,
            ContextProfile::Compatibility => egl::CONTEXT_OPENGL_COMPATIBILITY_PROFILE_BIT,
            ContextProfile::Any | ContextProfile::Es => 0,
        }
    }

    pub fn is_es(self) -> bool {
        self == ContextProfile::Es
    }

    /// Client API that has to be bound before talking to contexts of this profile.
    pub fn api(self) -> egl::Enum {
        if self.is_es() {
            egl::OPENGL_ES_API
        } else {
            egl::OPENGL_API
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextFlags {
    pub debug: bool,
    pub forward_compatible: bool,
    pub robust_access: bool,
}

impl ContextFlags {
    // EGL_CONTEXT_OPENGL_*_BIT_KHR
    const DEBUG_BIT: egl::Int = 0x0001;
    const FORWARD_COMPATIBLE_BIT: egl::Int = 0x0002;
    const ROBUST_ACCESS_BIT: egl::Int = 0x0004;

    pub fn bits(self) -> egl::Int {
        let mut bits = 0;
        if self.debug {
            bits |= Self::DEBUG_BIT;
        }
        if self.forward_compatible {
            bits |= Self::FORWARD_COMPATIBLE_BIT;
        }
        if self.robust_access {
            bits |= Self::ROBUST_ACCESS_BIT;
        }
        bits
    }

    pub fn is_empty(self) -> bool {
        self.bits() == 0
    }
}

/// Framebuffer and context request.
///
/// Integer fields carry EGL values. For the optional attributes a value of
/// zero means "not requested"; `EGL_DONT_CARE` is passed through to the
/// driver as is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlAttributes {
    pub red_size: egl::Int,
    pub green_size: egl::Int,
    pub blue_size: egl::Int,
    pub alpha_size: egl::Int,
    pub buffer_size: egl::Int,
    pub depth_size: egl::Int,
    pub stencil_size: egl::Int,
    pub multisample_buffers: egl::Int,
    pub multisample_samples: egl::Int,
    pub float_buffers: bool,

    pub profile: ContextProfile,
    pub major_version: egl::Int,
    pub minor_version: egl::Int,
    pub flags: ContextFlags,
    pub no_error: bool,
    pub share_with_current_context: bool,
    pub framebuffer_srgb: bool,
}

impl Default for GlAttributes {
    /// A deliberately small format: callers that never touch the channel
    /// sizes end up here, which is what the true-color preference is for.
    fn default() -> Self {
        Self {
            red_size: 3,
            green_size: 3,
            blue_size: 2,
            alpha_size: 0,
            buffer_size: 0,
            depth_size: 16,
            stencil_size: 0,
            multisample_buffers: 0,
            multisample_samples: 0,
            float_buffers: false,
            profile: ContextProfile::Es,
            major_version: 2,
            minor_version: 0,
            flags: ContextFlags::default(),
            no_error: false,
            share_with_current_context: false,
            framebuffer_srgb: false,
        }
    }
}

impl GlAttributes {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Sum of the requested red, green and blue sizes, saturating.
    pub fn color_bits(&self) -> egl::Int {
        self.red_size
            .saturating_add(self.green_size)
            .saturating_add(self.blue_size)
    }

    pub fn is_es(&self) -> bool {
        self.profile.is_es()
    }
}
