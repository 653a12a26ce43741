use std::fmt;

use khronos_egl as egl;
use serde::Serialize;

use crate::egl::select::ConfigSource;

const ATTRIBUTES: &[(&str, egl::Int)] = &[
    ("EGL_BUFFER_SIZE", egl::BUFFER_SIZE),
    ("EGL_RED_SIZE", egl::RED_SIZE),
    ("EGL_GREEN_SIZE", egl::GREEN_SIZE),
    ("EGL_BLUE_SIZE", egl::BLUE_SIZE),
    ("EGL_ALPHA_SIZE", egl::ALPHA_SIZE),
    ("EGL_DEPTH_SIZE", egl::DEPTH_SIZE),
    ("EGL_STENCIL_SIZE", egl::STENCIL_SIZE),
    ("EGL_CONFIG_CAVEAT", egl::CONFIG_CAVEAT),
    ("EGL_CONFIG_ID", egl::CONFIG_ID),
    ("EGL_LEVEL", egl::LEVEL),
    ("EGL_MAX_PBUFFER_WIDTH", egl::MAX_PBUFFER_WIDTH),
    ("EGL_MAX_PBUFFER_HEIGHT", egl::MAX_PBUFFER_HEIGHT),
    ("EGL_MAX_PBUFFER_PIXELS", egl::MAX_PBUFFER_PIXELS),
    ("EGL_NATIVE_RENDERABLE", egl::NATIVE_RENDERABLE),
    ("EGL_NATIVE_VISUAL_ID", egl::NATIVE_VISUAL_ID),
    ("EGL_NATIVE_VISUAL_TYPE", egl::NATIVE_VISUAL_TYPE),
    ("EGL_SAMPLES", egl::SAMPLES),
    ("EGL_SAMPLE_BUFFERS", egl::SAMPLE_BUFFERS),
    ("EGL_SURFACE_TYPE", egl::SURFACE_TYPE),
    ("EGL_TRANSPARENT_TYPE", egl::TRANSPARENT_TYPE),
    ("EGL_TRANSPARENT_RED_VALUE", egl::TRANSPARENT_RED_VALUE),
    ("EGL_TRANSPARENT_GREEN_VALUE", egl::TRANSPARENT_GREEN_VALUE),
    ("EGL_TRANSPARENT_BLUE_VALUE", egl::TRANSPARENT_BLUE_VALUE),
    ("EGL_BIND_TO_TEXTURE_RGB", egl::BIND_TO_TEXTURE_RGB),
    ("EGL_BIND_TO_TEXTURE_RGBA", egl::BIND_TO_TEXTURE_RGBA),
    ("EGL_MIN_SWAP_INTERVAL", egl::MIN_SWAP_INTERVAL),
    ("EGL_MAX_SWAP_INTERVAL", egl::MAX_SWAP_INTERVAL),
    ("EGL_LUMINANCE_SIZE", egl::LUMINANCE_SIZE),
    ("EGL_ALPHA_MASK_SIZE", egl::ALPHA_MASK_SIZE),
    ("EGL_COLOR_BUFFER_TYPE", egl::COLOR_BUFFER_TYPE),
    ("EGL_RENDERABLE_TYPE", egl::RENDERABLE_TYPE),
    ("EGL_CONFORMANT", egl::CONFORMANT),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigAttribute {
    pub name: &'static str,
    pub value: egl::Int,
}

/// Every attribute of one configuration the driver would report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfigDump {
    pub attributes: Vec<ConfigAttribute>,
}

impl ConfigDump {
    pub fn get(&self, name: &str) -> Option<egl::Int> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value)
    }

    /// One-line overview, e.g. `#12 r8 g8 b8 a8 d24 s0`.
    pub fn summary(&self) -> String {
        let size = |name| self.get(name).unwrap_or(0);
        let mut line = format!(
            "#{} r{} g{} b{} a{} d{} s{}",
            size("EGL_CONFIG_ID"),
            size("EGL_RED_SIZE"),
            size("EGL_GREEN_SIZE"),
            size("EGL_BLUE_SIZE"),
            size("EGL_ALPHA_SIZE"),
            size("EGL_DEPTH_SIZE"),
            size("EGL_STENCIL_SIZE"),
        );
        if size("EGL_SAMPLES") > 0 {
            line.push_str(&format!(" msaa{}", size("EGL_SAMPLES")));
        }
        if let Some(caveat) = self.get("EGL_CONFIG_CAVEAT") {
            match caveat {
                egl::SLOW_CONFIG => line.push_str(" slow"),
                egl::NON_CONFORMANT_CONFIG => line.push_str(" non-conformant"),
                _ => {}
            }
        }
        line
    }
}

impl fmt::Display for ConfigDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attribute) in self.attributes.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}={}", attribute.name, attribute.value)?;
        }
        Ok(())
    }
}

/// Reads the full attribute list of `config`. Attributes the driver
/// rejects are left out.
pub fn dump_config<S: ConfigSource>(source: &S, config: S::Config) -> ConfigDump {
    let attributes = ATTRIBUTES
        .iter()
        .filter_map(|&(name, key)| {
            source
                .attrib(config, key)
                .ok()
                .map(|value| ConfigAttribute { name, value })
        })
        .collect();
    ConfigDump { attributes }
}
