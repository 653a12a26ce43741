use std::ffi::c_void;

use khronos_egl as egl;
use log::{debug, info, log_enabled, Level};

use crate::attributes::GlAttributes;
use crate::egl::dump::{dump_config, ConfigDump};
use crate::egl::info::{EglVersion, Extensions};
use crate::egl::loader::{Egl, Libraries};
use crate::egl::select::{self, ConfigSource, ConfigTarget, SelectionPolicy};
use crate::error::{Error, Result};
use crate::platform::PlatformProfile;

// EGL_EXT_platform_device
const PLATFORM_DEVICE_EXT: egl::Enum = 0x313F;
const MAX_DEVICES: usize = 16;

type QueryDevicesExt =
    unsafe extern "system" fn(egl::Int, *mut *mut c_void, *mut egl::Int) -> egl::Boolean;
type GetPlatformDisplayExt =
    unsafe extern "system" fn(egl::Enum, *mut c_void, *const egl::Int) -> *mut c_void;

/// `eglChooseConfig` and `eglGetConfigAttrib` on one display.
pub struct DisplayConfigs<'a> {
    egl: &'a Egl,
    display: egl::Display,
}

impl ConfigSource for DisplayConfigs<'_> {
    type Config = egl::Config;

    fn choose(
        &self,
        attribs: &[egl::Int],
        max: usize,
    ) -> std::result::Result<Vec<egl::Config>, egl::Error> {
        let mut configs = Vec::with_capacity(max);
        self.egl.choose_config(self.display, attribs, &mut configs)?;
        Ok(configs)
    }

    fn attrib(
        &self,
        config: egl::Config,
        attribute: egl::Int,
    ) -> std::result::Result<egl::Int, egl::Error> {
        self.egl.get_config_attrib(self.display, config, attribute)
    }
}

/// Loaded libraries plus one initialized display, and the state that
/// contexts and surfaces created on it share.
pub struct Session {
    libs: Libraries,
    pub(super) display: egl::Display,
    version: EglVersion,
    client_extensions: Extensions,
    pub(super) extensions: Extensions,
    /// Client API bound before every make-current.
    pub(super) api: egl::Enum,
    offscreen: bool,
    surface_type: egl::Int,
    required_visual_id: Option<egl::Int>,
    config: Option<egl::Config>,
    pub(super) swap_interval: egl::Int,
    pub(super) allow_no_surface: bool,
    pub(super) allow_transparency: bool,
    policy: SelectionPolicy,
}

fn query_extensions(egl: &Egl, display: Option<egl::Display>) -> Extensions {
    egl.query_string(display, egl::EXTENSIONS)
        .map(|list| Extensions::parse(&list.to_string_lossy()))
        .unwrap_or_default()
}

/// Resolves an extension entry point into the function type `F`.
fn extension_fn<F: Copy>(
    egl: &Egl,
    function: &'static str,
    extension: &'static str,
) -> Result<F> {
    let addr = egl
        .get_proc_address(function)
        .ok_or(Error::MissingExtension {
            function,
            extension,
        })?;
    Ok(unsafe { std::mem::transmute_copy::<extern "system" fn(), F>(&addr) })
}

/// Asks each way of getting a display in turn. A step that is missing or
/// comes back empty hands over to the next one.
fn first_display<D>(
    core: Option<impl FnOnce() -> Option<D>>,
    extension: Option<impl FnOnce() -> Option<D>>,
    legacy: impl FnOnce() -> Option<D>,
) -> Option<D> {
    core.and_then(|step| step())
        .or_else(|| extension.and_then(|step| step()))
        .or_else(legacy)
}

fn platform_display(
    egl: &Egl,
    client_extensions: &Extensions,
    platform: egl::Enum,
    native_display: egl::NativeDisplayType,
) -> Option<egl::Display> {
    let core = egl.upcast::<egl::EGL1_5>().map(|egl1_5| {
        move || {
            let attribs = [egl::ATTRIB_NONE];
            match unsafe { egl1_5.get_platform_display(platform, native_display, &attribs) } {
                Ok(display) => Some(display),
                Err(err) => {
                    debug!("eglGetPlatformDisplay({platform:#x}) failed: {err}");
                    None
                }
            }
        }
    });

    let extension = client_extensions
        .has("EGL_EXT_platform_base")
        .then(|| {
            extension_fn::<GetPlatformDisplayExt>(
                egl,
                "eglGetPlatformDisplayEXT",
                "EGL_EXT_platform_base",
            )
        })
        .and_then(|resolved| match resolved {
            Ok(get_platform_display) => Some(get_platform_display),
            Err(err) => {
                debug!("{err}");
                None
            }
        })
        .map(|get_platform_display| {
            move || {
                let attribs = [egl::NONE];
                let ptr =
                    unsafe { get_platform_display(platform, native_display, attribs.as_ptr()) };
                (!ptr.is_null()).then(|| unsafe { egl::Display::from_ptr(ptr) })
            }
        });

    first_display(core, extension, || unsafe { egl.get_display(native_display) })
}

impl Session {
    /// Loads the libraries and opens a display on a native display
    /// connection. With `platform`, the display is requested through
    /// `eglGetPlatformDisplay` when the driver offers it.
    pub fn load(
        profile: &PlatformProfile,
        attrs: &GlAttributes,
        egl_path: Option<&str>,
        native_display: egl::NativeDisplayType,
        platform: Option<egl::Enum>,
    ) -> Result<Self> {
        let libs = Libraries::load(profile, attrs, egl_path)?;
        let client_extensions = query_extensions(&libs.egl, None);

        let display = match platform {
            Some(platform) => {
                platform_display(&libs.egl, &client_extensions, platform, native_display)
            }
            None => unsafe { libs.egl.get_display(native_display) },
        }
        .ok_or(Error::NoDisplay)?;

        let initialized = libs.egl.initialize(display).map_err(Error::Initialize)?;

        Ok(Self::from_display(
            libs,
            display,
            initialized,
            client_extensions,
            attrs,
            profile,
            false,
        ))
    }

    /// Loads the libraries and opens a display on an EGL device, without
    /// any window system.
    ///
    /// Some listed devices may not be usable (restricted GPUs in containers,
    /// for instance); without an explicit index the first device that
    /// initializes is taken.
    pub fn load_offscreen(
        profile: &PlatformProfile,
        attrs: &GlAttributes,
        device: Option<usize>,
    ) -> Result<Self> {
        let libs = Libraries::load(profile, attrs, None)?;
        let client_extensions = query_extensions(&libs.egl, None);

        let query_devices: QueryDevicesExt =
            extension_fn(&libs.egl, "eglQueryDevicesEXT", "EXT_device_enumeration")?;
        let get_platform_display: GetPlatformDisplayExt =
            extension_fn(&libs.egl, "eglGetPlatformDisplayEXT", "EXT_platform_base")?;

        let mut devices = [std::ptr::null_mut(); MAX_DEVICES];
        let mut count: egl::Int = 0;
        if unsafe { query_devices(MAX_DEVICES as egl::Int, devices.as_mut_ptr(), &mut count) }
            != egl::TRUE
        {
            return Err(Error::egl_raw(
                "Could not enumerate EGL devices",
                "eglQueryDevicesEXT",
                libs.egl.get_error().map_or(egl::SUCCESS, |err| err.native()),
            ));
        }
        let devices = &devices[..(count.max(0) as usize).min(MAX_DEVICES)];
        debug!("{} EGL device(s) found", devices.len());

        let device_display = |device: *mut c_void| {
            let ptr =
                unsafe { get_platform_display(PLATFORM_DEVICE_EXT, device, std::ptr::null()) };
            (!ptr.is_null()).then(|| unsafe { egl::Display::from_ptr(ptr) })
        };

        let (display, initialized) = match device.or(profile.device) {
            Some(index) => {
                let device = *devices.get(index).ok_or(Error::InvalidDevice {
                    index,
                    available: devices.len(),
                })?;
                let display = device_display(device).ok_or(Error::NoDisplay)?;
                let initialized = libs.egl.initialize(display).map_err(Error::Initialize)?;
                (display, initialized)
            }
            None => devices
                .iter()
                .enumerate()
                .find_map(|(index, &device)| {
                    let display = device_display(device)?;
                    match libs.egl.initialize(display) {
                        Ok(initialized) => {
                            info!("Using EGL device {index}");
                            Some((display, initialized))
                        }
                        Err(err) => {
                            debug!("EGL device {index} did not initialize: {err}");
                            let _ = libs.egl.terminate(display);
                            None
                        }
                    }
                })
                .ok_or(Error::NoDevice)?,
        };

        Ok(Self::from_display(
            libs,
            display,
            initialized,
            client_extensions,
            attrs,
            profile,
            true,
        ))
    }

    fn from_display(
        libs: Libraries,
        display: egl::Display,
        (major, minor): (egl::Int, egl::Int),
        client_extensions: Extensions,
        attrs: &GlAttributes,
        profile: &PlatformProfile,
        offscreen: bool,
    ) -> Self {
        // The version string is authoritative; some 1.4 drivers report odd
        // numbers through eglInitialize.
        let version = libs
            .egl
            .query_string(Some(display), egl::VERSION)
            .ok()
            .and_then(|version| EglVersion::parse(&version.to_string_lossy()))
            .unwrap_or(EglVersion::new(major, minor));
        let extensions = query_extensions(&libs.egl, Some(display));

        info!(
            "EGL {version} initialized{}",
            if offscreen { " (offscreen)" } else { "" }
        );
        debug!("EGL display extensions: {:?}", extensions.iter().collect::<Vec<_>>());

        Self {
            libs,
            display,
            version,
            client_extensions,
            extensions,
            api: attrs.profile.api(),
            offscreen,
            surface_type: 0,
            required_visual_id: None,
            config: None,
            swap_interval: 0,
            allow_no_surface: false,
            allow_transparency: profile.allow_transparency,
            policy: SelectionPolicy::default(),
        }
    }

    pub fn egl(&self) -> &Egl {
        &self.libs.egl
    }

    pub fn display(&self) -> egl::Display {
        self.display
    }

    pub fn version(&self) -> EglVersion {
        self.version
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn client_extensions(&self) -> &Extensions {
        &self.client_extensions
    }

    /// Path of the EGL library that was loaded.
    pub fn driver_path(&self) -> &str {
        &self.libs.egl_path
    }

    pub fn gl_library_path(&self) -> &str {
        &self.libs.gl_path
    }

    pub fn is_offscreen(&self) -> bool {
        self.offscreen
    }

    /// The configuration picked by the last successful selection.
    pub fn config(&self) -> Option<egl::Config> {
        self.config
    }

    /// Native visual the window system wants; `None` or 0 clears it.
    pub fn set_required_visual_id(&mut self, visual_id: Option<egl::Int>) {
        self.required_visual_id = visual_id.filter(|&id| id != 0);
    }

    /// Extra `EGL_SURFACE_TYPE` bits every configuration must support.
    pub fn set_surface_type(&mut self, surface_type: egl::Int) {
        self.surface_type = surface_type;
    }

    pub fn set_selection_policy(&mut self, policy: SelectionPolicy) {
        self.policy = policy;
    }

    /// Whether the driver takes `EGL_KHR_create_context` attributes.
    pub fn has_create_context(&self) -> bool {
        self.version.at_least(EglVersion::V1_5) || self.extensions.has("EGL_KHR_create_context")
    }

    pub fn get_proc_address(&self, name: &str) -> Option<*const c_void> {
        self.libs.get_proc_address(name, self.version)
    }

    pub(super) fn configs(&self) -> DisplayConfigs<'_> {
        DisplayConfigs {
            egl: &self.libs.egl,
            display: self.display,
        }
    }

    /// Selects the closest configuration for `attrs` and records it.
    pub fn choose_config(&mut self, attrs: &GlAttributes) -> Result<egl::Config> {
        self.api = attrs.profile.api();
        self.egl()
            .bind_api(self.api)
            .map_err(|err| Error::egl("Could not bind the client API", "eglBindAPI", err))?;

        let target = ConfigTarget {
            offscreen: self.offscreen,
            surface_type: self.surface_type,
            es3_renderable: self.has_create_context(),
        };

        let config = select::choose_config(
            &self.configs(),
            attrs,
            &target,
            self.required_visual_id,
            self.policy,
        )?;

        if log_enabled!(Level::Debug) {
            debug!("Selected EGL config: {}", self.dump_config(config));
        }

        self.config = Some(config);
        Ok(config)
    }

    /// Every configuration the display offers.
    pub fn all_configs(&self) -> Result<Vec<egl::Config>> {
        let count = self
            .egl()
            .get_config_count(self.display)
            .map_err(|err| Error::egl("Could not count EGL configs", "eglGetConfigs", err))?;
        let mut configs = Vec::with_capacity(count);
        self.egl()
            .get_configs(self.display, &mut configs)
            .map_err(|err| Error::egl("Could not list EGL configs", "eglGetConfigs", err))?;
        Ok(configs)
    }

    pub fn dump_config(&self, config: egl::Config) -> ConfigDump {
        dump_config(&self.configs(), config)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.libs.egl.make_current(self.display, None, None, None);
        let _ = self.libs.egl.terminate(self.display);
    }
}
