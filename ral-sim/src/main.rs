//! Drive the display layer against the simulated pixel-buffer controller
//! and print what ends up on screen.

mod logger;
mod preview;
mod scene;

use std::process::ExitCode;

use clap::Parser;
use ral::device::{SimConfig, SimPlatform};
use ral::{
    BufferSelect, DisplayConfig, DisplaySurface, Resolution, SpriteBounds, SwapWait, VgaDisplay,
};

#[derive(Parser)]
struct Args {
    /// Width reported by the controller's resolution register
    #[arg(long, default_value_t = ral::config::DEFAULT_SCREEN_WIDTH)]
    width: u16,

    /// Height reported by the controller's resolution register
    #[arg(long, default_value_t = ral::config::DEFAULT_SCREEN_HEIGHT)]
    height: u16,

    /// Frames to draw and present
    #[arg(short, long, default_value_t = 8)]
    frames: u32,

    /// Status polls each swap stays in progress
    #[arg(short, long, default_value_t = 2)]
    latency: u32,

    /// Give up on a swap after this many polls instead of spinning forever
    #[arg(long)]
    spin_limit: Option<u32>,

    /// Stop sprite blits at the right and bottom screen edges
    #[arg(long)]
    clamp_sprites: bool,

    /// Simulate a controller that cannot be opened
    #[arg(long)]
    fail_open: bool,

    /// Preview width in characters (0 disables the preview)
    #[arg(short, long, default_value_t = 80)]
    preview: u16,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn sim_config(&self) -> SimConfig {
        let sim = SimConfig::for_resolution(Resolution::new(self.width, self.height))
            .with_swap_latency(self.latency);
        if self.fail_open {
            sim.with_failing_open()
        } else {
            sim
        }
    }

    fn display_config(&self) -> DisplayConfig {
        let swap_wait = match self.spin_limit {
            Some(n) => SwapWait::Spins(n),
            None => SwapWait::Forever,
        };
        let sprite_bounds = if self.clamp_sprites {
            SpriteBounds::ClampToSurface
        } else {
            SpriteBounds::Sprite
        };
        DisplayConfig::new()
            .with_swap_wait(swap_wait)
            .with_sprite_bounds(sprite_bounds)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    logger::init_logger(logger::level_for(args.verbose));

    let mut display = VgaDisplay::with_config(
        SimPlatform::new(args.sim_config()),
        args.display_config(),
    );

    if let Err(e) = display.init() {
        eprintln!("display init failed: {}", e);
        return ExitCode::FAILURE;
    }
    println!(
        "Display ready: {}x{} ({:x?})",
        display.width(),
        display.height(),
        display.buffers()
    );

    let sprite = match scene::ball() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("bad sprite: {}", e);
            return ExitCode::FAILURE;
        }
    };

    for frame in 0..args.frames {
        let surface: &mut dyn DisplaySurface = &mut display;
        let result = scene::draw_frame(surface, frame, &sprite).and_then(|_| surface.clear());
        if let Err(e) = result {
            eprintln!("frame {}: {}", frame, e);
            return ExitCode::FAILURE;
        }
    }

    println!("Frames presented: {}", display.frames_presented());
    if let Some(sim) = display.device() {
        println!(
            "Swaps requested: {}, status polls: {}, clipped writes: {}, dropped writes: {}",
            sim.swaps_requested(),
            sim.status_polls(),
            sim.clipped_writes(),
            sim.dropped_writes()
        );
        if args.preview > 0 {
            print!("{}", preview::render(sim, BufferSelect::Front, args.preview));
        }
    }

    ExitCode::SUCCESS
}
