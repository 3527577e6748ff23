use std::path::PathBuf;
use std::thread;

use clap::{Parser, ValueEnum};
use image::ImageFormat;

use crate::stickerops::background::EstimatorParams;
use crate::stickerops::segment::SegmenterParams;

/// Processing mode, selected by the positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Full pipeline: margin expansion, segmentation, border, crop.
    #[value(name = "0")]
    Full,
    /// Margin expansion only.
    #[value(name = "1")]
    Margins,
    /// Do nothing.
    #[value(name = "2")]
    Noop,
}

#[derive(Parser, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Processing mode: 0 - full process, 1 - add margins only, 2 - no-op
    #[arg(value_enum)]
    pub mode: Mode,

    /// Directory walked recursively for source images
    #[arg(short, long, default_value = "input")]
    pub input_dir: PathBuf,

    /// Output directory for margin-only results (prefixed `exp-`)
    #[arg(long, default_value = "margins")]
    pub margins_dir: PathBuf,

    /// Output directory for fully processed results (prefixed `done-`)
    #[arg(short, long, default_value = "processed")]
    pub output_dir: PathBuf,

    /// Output format for processed images; must support transparency
    #[arg(short, long, default_value = "png", value_parser = check_format)]
    pub format: String,

    /// Maximum per-channel color distance for the background flood fill
    #[arg(short, long, default_value_t = 150)]
    pub threshold: u8,

    #[arg(
        short, long, default_value_t = thread::available_parallelism().map_or(1, |n| n.get())
    )]
    pub num_threads: usize,
}

impl Config {
    pub fn estimator_params(&self) -> EstimatorParams {
        EstimatorParams::default()
    }

    pub fn segmenter_params(&self) -> SegmenterParams {
        SegmenterParams {
            threshold: self.threshold,
            ..Default::default()
        }
    }
}

fn check_format(s: &str) -> Result<String, String> {
    let supported: Vec<_> = ImageFormat::all()
        .filter(|f| f.writing_enabled())
        .flat_map(|f| f.extensions_str())
        .map(|s| format!("`{}`", s))
        .collect();
    let supported_message = format!("Supported formats: {}", supported.join(", "));

    let format = ImageFormat::from_extension(s)
        .ok_or(format!("{} is not supported. {}", s, supported_message))?;
    if !format.writing_enabled() {
        return Err(format!("{} is not supported. {}", s, supported_message));
    }

    Ok(s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_format() {
        assert!(check_format("png").is_ok());
        assert!(check_format("webp").is_ok());
        assert!(check_format("xyz").is_err());
    }

    #[test]
    fn test_mode_parsing() {
        let config = Config::try_parse_from(["sticker-seg-rs", "0"]).unwrap();
        assert_eq!(config.mode, Mode::Full);
        assert_eq!(config.threshold, 150);
        assert_eq!(config.format, "png");

        let config = Config::try_parse_from(["sticker-seg-rs", "2"]).unwrap();
        assert_eq!(config.mode, Mode::Noop);

        assert!(Config::try_parse_from(["sticker-seg-rs"]).is_err());
        assert!(Config::try_parse_from(["sticker-seg-rs", "7"]).is_err());
    }
}
