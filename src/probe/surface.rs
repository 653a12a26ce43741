use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use egl_adapt::egl::Session;
use egl_adapt::GlAttributes;
use khronos_egl as egl;
use wayland_client::{
    protocol::{wl_compositor, wl_surface},
    Connection, Dispatch, Proxy, QueueHandle,
};
use wayland_egl::WlEglSurface;
use wayland_protocols_wlr::layer_shell::v1::client::{
    zwlr_layer_shell_v1::{self, ZwlrLayerShellV1},
    zwlr_layer_surface_v1::{self, ZwlrLayerSurfaceV1},
};

use super::connection::ProbeState;

/// Configure state shared with the layer surface dispatcher.
#[derive(Default)]
pub struct LayerState {
    configured: AtomicBool,
    closed: AtomicBool,
    width: AtomicU32,
    height: AtomicU32,
}

impl LayerState {
    fn size(&self) -> (u32, u32) {
        (
            self.width.load(Ordering::Acquire),
            self.height.load(Ordering::Acquire),
        )
    }
}

/// A layer-shell surface with an EGL window surface on top of it.
pub struct ProbeSurface {
    wl_surface: wl_surface::WlSurface,
    layer_surface: ZwlrLayerSurfaceV1,
    egl_window: Option<WlEglSurface>,
    state: Arc<LayerState>,
    width: u32,
    height: u32,
}

impl ProbeSurface {
    pub fn new(
        compositor: &wl_compositor::WlCompositor,
        layer_shell: &ZwlrLayerShellV1,
        qh: &QueueHandle<ProbeState>,
        width: u32,
        height: u32,
    ) -> Self {
        let state = Arc::new(LayerState::default());
        state.width.store(width, Ordering::Release);
        state.height.store(height, Ordering::Release);

        let wl_surface = compositor.create_surface(qh, ());
        let layer_surface = layer_shell.get_layer_surface(
            &wl_surface,
            None,
            zwlr_layer_shell_v1::Layer::Overlay,
            "egl-adapt".to_string(),
            qh,
            state.clone(),
        );
        layer_surface.set_size(width, height);
        layer_surface
            .set_keyboard_interactivity(zwlr_layer_surface_v1::KeyboardInteractivity::None);
        wl_surface.commit();

        Self {
            wl_surface,
            layer_surface,
            egl_window: None,
            state,
            width,
            height,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.state.configured.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Creates the EGL window surface at the configured size. The returned
    /// surface has to be destroyed before this one is dropped.
    pub fn attach(&mut self, session: &mut Session, attrs: &GlAttributes) -> Result<egl::Surface> {
        (self.width, self.height) = self.state.size();

        let egl_window =
            WlEglSurface::new(self.wl_surface.id(), self.width as i32, self.height as i32)
                .context("Failed to create WlEglSurface")?;

        let surface = unsafe {
            session.create_window_surface(attrs, egl_window.ptr() as egl::NativeWindowType)
        }
        .context("Failed to create EGL window surface")?;

        self.egl_window = Some(egl_window);
        Ok(surface)
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn resize_if_needed(&mut self) -> bool {
        let pending = self.state.size();
        if pending == (self.width, self.height) {
            return false;
        }
        (self.width, self.height) = pending;
        if let Some(egl_window) = &self.egl_window {
            egl_window.resize(self.width as i32, self.height as i32, 0, 0);
        }
        true
    }
}

impl Dispatch<ZwlrLayerSurfaceV1, Arc<LayerState>> for ProbeState {
    fn event(
        _state: &mut Self,
        surface: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        data: &Arc<LayerState>,
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure {
                serial,
                width,
                height,
            } => {
                surface.ack_configure(serial);
                if width > 0 && height > 0 {
                    data.width.store(width, Ordering::Release);
                    data.height.store(height, Ordering::Release);
                }
                data.configured.store(true, Ordering::Release);
            }
            zwlr_layer_surface_v1::Event::Closed => {
                data.closed.store(true, Ordering::Release);
            }
            _ => {}
        }
    }
}

impl Dispatch<wl_surface::WlSurface, ()> for ProbeState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_surface::WlSurface,
        _event: wl_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Drop for ProbeSurface {
    fn drop(&mut self) {
        self.egl_window.take();
        self.layer_surface.destroy();
        self.wl_surface.destroy();
    }
}
