mod probe;

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use egl_adapt::egl::{ConfigDump, SelectionPolicy, Session};
use egl_adapt::{GlAttributes, PlatformProfile};
use khronos_egl as egl;
use log::{info, warn};

use probe::{ProbeSurface, WaylandConnection};

// EGL_KHR_platform_wayland
const PLATFORM_WAYLAND_KHR: egl::Enum = 0x31D8;

#[derive(Parser)]
#[command(name = "egl-adapt")]
#[command(about = "Inspect EGL drivers and the framebuffer configurations they offer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List every configuration the display offers
    Configs {
        #[command(flatten)]
        display: DisplayArgs,

        /// Print JSON instead of one line per configuration
        #[arg(long)]
        json: bool,
    },
    /// Run configuration selection for a request and print the result
    Select {
        #[command(flatten)]
        display: DisplayArgs,

        #[command(flatten)]
        request: RequestArgs,

        /// Native visual id the configuration should carry (decimal or 0x hex)
        #[arg(long, value_parser = parse_int)]
        visual_id: Option<egl::Int>,

        /// Take the tightest color match even for small requests
        #[arg(long)]
        exact_color: bool,

        /// Print the full attribute list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Present cleared frames to a Wayland layer-shell surface
    Present {
        #[command(flatten)]
        request: RequestArgs,

        /// Stop after this many frames (runs until Ctrl+C when omitted)
        #[arg(long)]
        frames: Option<u64>,

        /// Swap interval to request
        #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
        interval: egl::Int,

        #[arg(long, default_value_t = 640)]
        width: u32,

        #[arg(long, default_value_t = 480)]
        height: u32,
    },
}

#[derive(Args)]
struct DisplayArgs {
    /// Use an EGL device display instead of the default display
    #[arg(long)]
    offscreen: bool,

    /// EGL device index for --offscreen
    #[arg(long, requires = "offscreen")]
    device: Option<usize>,

    /// Path of the EGL library to load
    #[arg(long)]
    egl_library: Option<String>,
}

#[derive(Args)]
struct RequestArgs {
    /// JSON file with the attributes to request
    #[arg(long)]
    request: Option<PathBuf>,

    #[arg(long)]
    red: Option<egl::Int>,
    #[arg(long)]
    green: Option<egl::Int>,
    #[arg(long)]
    blue: Option<egl::Int>,
    #[arg(long)]
    alpha: Option<egl::Int>,
    #[arg(long)]
    depth: Option<egl::Int>,
    #[arg(long)]
    stencil: Option<egl::Int>,
    #[arg(long)]
    samples: Option<egl::Int>,
}

impl RequestArgs {
    fn attributes(&self) -> Result<GlAttributes> {
        let mut attrs = match &self.request {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                GlAttributes::from_json(&json)
                    .with_context(|| format!("Failed to parse {}", path.display()))?
            }
            None => GlAttributes::default(),
        };

        let overrides = [
            (self.red, &mut attrs.red_size),
            (self.green, &mut attrs.green_size),
            (self.blue, &mut attrs.blue_size),
            (self.alpha, &mut attrs.alpha_size),
            (self.depth, &mut attrs.depth_size),
            (self.stencil, &mut attrs.stencil_size),
        ];
        for (value, field) in overrides {
            if let Some(value) = value {
                *field = value;
            }
        }
        if let Some(samples) = self.samples {
            attrs.multisample_buffers = (samples > 0) as egl::Int;
            attrs.multisample_samples = samples;
        }

        Ok(attrs)
    }
}

fn parse_int(value: &str) -> Result<egl::Int, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16),
        None => value.parse::<i64>(),
    };
    parsed
        .map_err(|err| err.to_string())
        .and_then(|value| egl::Int::try_from(value).map_err(|err| err.to_string()))
}

fn open_session(
    profile: &PlatformProfile,
    display: &DisplayArgs,
    attrs: &GlAttributes,
) -> Result<Session> {
    let session = if display.offscreen {
        Session::load_offscreen(profile, attrs, display.device)
            .context("Failed to open an offscreen EGL display")?
    } else {
        Session::load(
            profile,
            attrs,
            display.egl_library.as_deref(),
            egl::DEFAULT_DISPLAY,
            None,
        )
        .context("Failed to open the default EGL display")?
    };

    info!(
        "EGL {} from {} ({} display extensions)",
        session.version(),
        session.driver_path(),
        session.extensions().iter().count()
    );
    Ok(session)
}

fn list_configs(profile: &PlatformProfile, display: &DisplayArgs, json: bool) -> Result<()> {
    let session = open_session(profile, display, &GlAttributes::default())?;
    let dumps: Vec<ConfigDump> = session
        .all_configs()?
        .into_iter()
        .map(|config| session.dump_config(config))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&dumps)?);
    } else {
        println!("{} configs:", dumps.len());
        for dump in &dumps {
            println!("  {}", dump.summary());
        }
    }
    Ok(())
}

fn select_config(
    profile: &PlatformProfile,
    display: &DisplayArgs,
    attrs: &GlAttributes,
    visual_id: Option<egl::Int>,
    exact_color: bool,
    json: bool,
) -> Result<()> {
    let mut session = open_session(profile, display, attrs)?;
    session.set_required_visual_id(visual_id);
    session.set_selection_policy(SelectionPolicy {
        favor_truecolor: !exact_color,
    });

    let config = session.choose_config(attrs)?;
    let dump = session.dump_config(config);

    if json {
        println!("{}", serde_json::to_string_pretty(&dump)?);
    } else {
        println!("{}", dump.summary());
    }
    Ok(())
}

fn present(
    profile: &PlatformProfile,
    attrs: &GlAttributes,
    frames: Option<u64>,
    interval: egl::Int,
    (width, height): (u32, u32),
) -> Result<()> {
    let mut conn = WaylandConnection::connect()?;

    let mut session = Session::load(
        profile,
        attrs,
        None,
        conn.display_ptr(),
        Some(PLATFORM_WAYLAND_KHR),
    )
    .context("Failed to open the Wayland EGL display")?;
    session.set_surface_type(egl::WINDOW_BIT);

    let mut surface = {
        let compositor = conn
            .state
            .compositor
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("wl_compositor not available"))?;
        let layer_shell = conn
            .state
            .layer_shell
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("zwlr_layer_shell_v1 not available"))?;
        ProbeSurface::new(compositor, layer_shell, &conn.queue_handle(), width, height)
    };

    while !surface.is_configured() {
        if surface.is_closed() {
            bail!("Layer surface was closed before it was configured");
        }
        conn.roundtrip()?;
    }

    let egl_surface = surface.attach(&mut session, attrs)?;
    let context = match session.create_context(attrs, Some(egl_surface)) {
        Ok(context) => context,
        Err(err) => {
            session.destroy_surface(egl_surface);
            return Err(err).context("Failed to create the EGL context");
        }
    };

    if let Err(err) = session.set_swap_interval(interval) {
        warn!("{err}");
    }

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")?;

    info!(
        "Presenting at {}x{}, swap interval {}",
        surface.size().0,
        surface.size().1,
        session.swap_interval()
    );

    let result = render_loop(&mut conn, &mut surface, &session, egl_surface, frames, &running);

    let _ = session.make_current(None, None);
    session.delete_context(context);
    session.destroy_surface(egl_surface);
    drop(surface);
    let _ = conn.roundtrip();

    let presented = result?;
    info!("Presented {presented} frames");
    Ok(())
}

fn render_loop(
    conn: &mut WaylandConnection,
    surface: &mut ProbeSurface,
    session: &Session,
    egl_surface: egl::Surface,
    frames: Option<u64>,
    running: &AtomicBool,
) -> Result<u64> {
    let mut presented = 0u64;

    while running.load(Ordering::SeqCst) && !surface.is_closed() {
        if frames.is_some_and(|frames| presented >= frames) {
            break;
        }

        surface.resize_if_needed();
        let (width, height) = surface.size();

        let shade = (presented % 120) as f32 / 120.0;
        unsafe {
            gl::Viewport(0, 0, width as i32, height as i32);
            gl::ClearColor(0.1, shade, 0.3, 1.0);
            gl::Clear(gl::COLOR_BUFFER_BIT);
        }
        session.swap_buffers(egl_surface)?;
        presented += 1;

        conn.dispatch()?;
    }

    Ok(presented)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let profile = PlatformProfile::detect();

    match cli.command {
        Command::Configs { display, json } => list_configs(&profile, &display, json),
        Command::Select {
            display,
            request,
            visual_id,
            exact_color,
            json,
        } => select_config(
            &profile,
            &display,
            &request.attributes()?,
            visual_id,
            exact_color,
            json,
        ),
        Command::Present {
            request,
            frames,
            interval,
            width,
            height,
        } => present(&profile, &request.attributes()?, frames, interval, (width, height)),
    }
}
