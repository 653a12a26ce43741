use anyhow::{Context, Result};
use wayland_client::{
    protocol::{wl_compositor, wl_registry},
    Connection, Dispatch, EventQueue, QueueHandle,
};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1;

/// Globals the probe binds.
#[derive(Default)]
pub struct ProbeState {
    pub compositor: Option<wl_compositor::WlCompositor>,
    pub layer_shell: Option<zwlr_layer_shell_v1::ZwlrLayerShellV1>,
}

pub struct WaylandConnection {
    pub connection: Connection,
    pub state: ProbeState,
    pub queue: EventQueue<ProbeState>,
}

impl WaylandConnection {
    pub fn connect() -> Result<Self> {
        let connection =
            Connection::connect_to_env().context("Failed to connect to Wayland display")?;

        let mut state = ProbeState::default();
        let mut queue = connection.new_event_queue();
        let qh = queue.handle();

        connection.display().get_registry(&qh, ());
        queue.roundtrip(&mut state)?;

        Ok(Self {
            connection,
            state,
            queue,
        })
    }

    pub fn roundtrip(&mut self) -> Result<()> {
        self.queue.roundtrip(&mut self.state)?;
        Ok(())
    }

    pub fn dispatch(&mut self) -> Result<()> {
        self.queue.dispatch_pending(&mut self.state)?;
        self.queue.flush()?;
        Ok(())
    }

    pub fn queue_handle(&self) -> QueueHandle<ProbeState> {
        self.queue.handle()
    }

    /// `wl_display` pointer for `eglGetDisplay`.
    pub fn display_ptr(&self) -> *mut std::ffi::c_void {
        self.connection.backend().display_ptr() as *mut std::ffi::c_void
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for ProbeState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        if let wl_registry::Event::Global {
            name,
            interface,
            version,
        } = event
        {
            match interface.as_str() {
                "wl_compositor" => {
                    state.compositor = Some(registry.bind(name, version.min(5), qh, ()));
                }
                "zwlr_layer_shell_v1" => {
                    state.layer_shell = Some(registry.bind(name, version.min(4), qh, ()));
                }
                _ => {}
            }
        }
    }
}

impl Dispatch<wl_compositor::WlCompositor, ()> for ProbeState {
    fn event(
        _state: &mut Self,
        _proxy: &wl_compositor::WlCompositor,
        _event: wl_compositor::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<zwlr_layer_shell_v1::ZwlrLayerShellV1, ()> for ProbeState {
    fn event(
        _state: &mut Self,
        _proxy: &zwlr_layer_shell_v1::ZwlrLayerShellV1,
        _event: zwlr_layer_shell_v1::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
    }
}
