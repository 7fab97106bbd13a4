#![warn(missing_docs)]
//! # photomosaic binary
//!
//! Command-line front-end for the photomosaic client workflow.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use env_logger::{Builder, Env};
use log::{error, info, warn};
use photomosaic_app::{
    AppConfig, AppError, DispatchRuntime, WorkflowController, acquire_pool, app_version,
    capture_handoff, save_artifact,
};
use photomosaic_capture::{CameraDevice, StillFrameCamera, SyntheticCamera, acquire_from_file};
use photomosaic_request::request_fingerprint;
use photomosaic_transport::GenerationClient;
use photomosaic_ui::{CaptureView, WorkflowState};

#[derive(Parser)]
#[command(name = "photomosaic")]
#[command(about = "Build photomosaics from an input photo and a pool of tile images")]
struct Cli {
    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit an input photo and a tile pool to the generation service
    Generate(GenerateArgs),
    /// Take a still with the camera and save it as captured_image.jpg
    Capture(CaptureArgs),
    /// Show version information
    Version,
}

#[derive(Args)]
struct CameraArgs {
    /// Use this image file as the camera's current frame
    #[arg(long, value_name = "FILE", conflicts_with = "synthetic_camera")]
    camera_frame: Option<PathBuf>,

    /// Use a generated test pattern as the camera
    #[arg(long)]
    synthetic_camera: bool,

    /// Simulate a camera that has not produced a frame yet
    #[arg(long, requires = "synthetic_camera")]
    not_ready: bool,
}

impl CameraArgs {
    fn device(&self) -> Result<Option<Box<dyn CameraDevice>>, AppError> {
        if let Some(frame) = &self.camera_frame {
            return Ok(Some(Box::new(StillFrameCamera::open(frame)?)));
        }
        if self.synthetic_camera {
            let camera = if self.not_ready {
                SyntheticCamera::not_ready()
            } else {
                SyntheticCamera::new()
            };
            return Ok(Some(Box::new(camera)));
        }
        Ok(None)
    }
}

#[derive(Args)]
struct GenerateArgs {
    /// Input photo to turn into a mosaic
    #[arg(long, value_name = "FILE", conflicts_with_all = ["camera_frame", "synthetic_camera"])]
    input: Option<PathBuf>,

    #[command(flatten)]
    camera: CameraArgs,

    /// Pool images or directories of pool images
    #[arg(long, value_name = "PATH", num_args = 1..)]
    pool: Vec<PathBuf>,

    /// Tile edge length in pixels
    #[arg(long, value_name = "N")]
    stride: Option<String>,

    /// Width of the generated mosaic in pixels
    #[arg(long, value_name = "N")]
    output_width: Option<String>,

    /// Base URL of the generation service [env: PHOTOMOSAIC_SERVICE_URL]
    #[arg(long, value_name = "URL")]
    service_url: Option<String>,

    /// Directory the mosaic is downloaded into [env: PHOTOMOSAIC_OUT_DIR]
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Print the request manifest instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[derive(Args)]
struct CaptureArgs {
    #[command(flatten)]
    camera: CameraArgs,

    /// Directory the still is saved into [env: PHOTOMOSAIC_OUT_DIR]
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,
}

fn init_logging(verbosity: &Verbosity<InfoLevel>) {
    let use_env = !verbosity.is_present() && std::env::var_os("RUST_LOG").is_some();
    let mut logger = if use_env {
        Builder::from_env(Env::default())
    } else {
        let mut builder = Builder::new();
        builder.filter_level(verbosity.log_level_filter());
        builder
    };
    logger.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.verbosity);

    let result = match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Capture(args) => run_capture(args),
        Command::Version => {
            println!("photomosaic {}", app_version());
            Ok(ExitCode::SUCCESS)
        }
    };

    match result {
        Ok(code) => code,
        Err(failure) => {
            error!("{failure}");
            ExitCode::FAILURE
        }
    }
}

fn print_view(controller: &WorkflowController) {
    for line in controller.view().render_lines() {
        println!("{line}");
    }
}

fn run_generate(args: GenerateArgs) -> Result<ExitCode, AppError> {
    let config = AppConfig::from_env().with_overrides(args.service_url, args.out_dir);
    config.validate()?;

    let mut controller = match args.camera.device()? {
        Some(device) => match capture_handoff(device.as_ref())? {
            Some(handoff) => WorkflowController::with_handoff(handoff),
            None => {
                warn!("camera has no usable frame yet; nothing to submit");
                return Ok(ExitCode::FAILURE);
            }
        },
        None => WorkflowController::new(),
    };
    if let Some(path) = &args.input {
        controller.select_input(acquire_from_file(path)?);
    }
    if !args.pool.is_empty() {
        controller.set_pool(acquire_pool(&args.pool)?);
    }
    if let Some(stride) = args.stride {
        controller.set_stride_text(stride);
    }
    if let Some(output_width) = args.output_width {
        controller.set_output_width_text(output_width);
    }

    if args.dry_run {
        let request = controller.preview_request()?;
        let manifest = request.to_payload().manifest();
        println!("{}", manifest.to_json_pretty()?);
        println!("fingerprint: {}", request_fingerprint(&request));
        return Ok(ExitCode::SUCCESS);
    }

    let client = GenerationClient::http(&config.service_url)?;
    info!("sending requests to {}", client.endpoint());
    let mut runtime = DispatchRuntime::new(controller, client);

    match runtime.submit() {
        Ok(_) => print_view(runtime.controller()),
        Err(AppError::Validation(_)) => {
            print_view(runtime.controller());
            return Ok(ExitCode::FAILURE);
        }
        Err(failure) => return Err(failure),
    }

    runtime.wait();
    println!();
    print_view(runtime.controller());

    if runtime.controller().state() != WorkflowState::Success {
        return Ok(ExitCode::FAILURE);
    }
    let saved = runtime.controller().download(&config.out_dir)?;
    println!("Saved {}", saved.display());
    Ok(ExitCode::SUCCESS)
}

fn run_capture(args: CaptureArgs) -> Result<ExitCode, AppError> {
    let config = AppConfig::from_env().with_overrides(None, args.out_dir);
    let Some(device) = args.camera.device()? else {
        return Err(AppError::Usage(
            "choose a camera with --camera-frame or --synthetic-camera".to_string(),
        ));
    };
    info!("camera: {}", device.describe().name);

    match capture_handoff(device.as_ref())? {
        Some(handoff) => {
            let saved = save_artifact(handoff.artifact(), &config.out_dir)?;
            println!("Saved {}", saved.display());
            Ok(ExitCode::SUCCESS)
        }
        None => {
            let view = CaptureView::new(false);
            println!("No usable frame yet; still previewing.");
            println!("Actions: {}", view.actions.join(", "));
            Ok(ExitCode::FAILURE)
        }
    }
}
