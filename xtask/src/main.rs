use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use shadefall::gpu::GpuTier;
use shadefall::noise::{self, NoiseOptions, NoiseTexture};
use shadefall::theme::{presets, SectionFallback, ThemeConfig};

#[derive(Parser)]
#[command(name = "xtask", about = "Developer tasks for shadefall")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write the theme document JSON schema.
    Schema {
        /// Output file. Printed to stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Render the noise field to a binary PPM for inspection.
    Noise {
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        #[arg(long, default_value_t = 0)]
        seed: u32,
        #[arg(long, default_value_t = 4)]
        octaves: u32,
        #[arg(long, default_value_t = 4.0)]
        scale: f64,
        #[arg(long, default_value_t = 0.5)]
        persistence: f64,
        /// Output `.ppm` file.
        #[arg(long)]
        out: PathBuf,
    },
    /// Decode a theme and summarize what it would mount.
    CheckTheme {
        /// Theme file (`.json` or `.toml`).
        path: PathBuf,
    },
    /// Export a built-in theme.
    Preset {
        /// Preset name. Lists the presets when omitted.
        name: Option<String>,
        /// Output file (`.json` or `.toml`). Printed as JSON when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Schema { out } => schema(out.as_deref()),
        Command::Noise {
            width,
            height,
            seed,
            octaves,
            scale,
            persistence,
            out,
        } => {
            let options = NoiseOptions {
                width,
                height,
                scale,
                octaves,
                persistence,
                seed,
            };
            write_ppm(&noise::generate(&options), &out)
        }
        Command::CheckTheme { path } => check_theme(&path),
        Command::Preset { name, out } => preset(name.as_deref(), out.as_deref()),
    }
}

fn schema(out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&ThemeConfig::json_schema())?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("schema written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn write_ppm(texture: &NoiseTexture, out: &Path) -> Result<()> {
    if texture.data.is_empty() {
        bail!("noise texture is empty; width and height must be non-zero");
    }
    let mut file = std::io::BufWriter::new(
        std::fs::File::create(out)
            .with_context(|| format!("creating {}", out.display()))?,
    );
    write!(file, "P6\n{} {}\n255\n", texture.width, texture.height)?;
    for pixel in texture.data.chunks_exact(4) {
        file.write_all(&pixel[..3])?;
    }
    file.flush()?;
    log::info!(
        "{}x{} noise written to {}",
        texture.width,
        texture.height,
        out.display()
    );
    Ok(())
}

fn check_theme(path: &Path) -> Result<()> {
    let theme = ThemeConfig::load(path)
        .with_context(|| format!("loading {}", path.display()))?;
    println!("{} v{}", theme.name, theme.version);
    if !theme.description.is_empty() {
        println!("  {}", theme.description);
    }
    println!(
        "  budget: {} shaders, mobile {:?}",
        theme.performance.max_shader_instances,
        theme.performance.mobile_strategy
    );
    for tier in [GpuTier::High, GpuTier::Medium, GpuTier::Low, GpuTier::None] {
        println!(
            "    {tier:?}: {} desktop / {} mobile",
            theme.performance.effective_max_instances(tier, false),
            theme.performance.effective_max_instances(tier, true)
        );
    }
    for (name, section) in &theme.sections {
        let fallback = match &section.fallback {
            SectionFallback::Css { value } => value.as_str(),
            SectionFallback::None => "-",
        };
        println!(
            "  [{name}] {:?} priority {:?} ({}) fallback {fallback}",
            section.shader(),
            section.priority,
            section.registry_priority()
        );
    }
    Ok(())
}

fn preset(name: Option<&str>, out: Option<&Path>) -> Result<()> {
    let Some(name) = name else {
        for name in presets::names() {
            println!("{name}");
        }
        return Ok(());
    };
    let Some(theme) = presets::builtin(name) else {
        bail!("unknown preset {name:?}");
    };
    match out {
        Some(path) => theme
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{}", theme.to_json_string()?),
    }
    Ok(())
}
