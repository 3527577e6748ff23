use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use walkdir::WalkDir;

use crate::config::{Config, Mode};
use crate::errors::{Result, StickerError};
use crate::stickerops::background::expand_margins;
use crate::stickerops::segment::full_process;

/// Side-effecting collaborator around the pure pipeline: directory setup,
/// file collection, decode, dispatch by mode, and persistence.
pub struct Processor {
    config: Config,
}

impl Processor {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Creates the input and output directories if they do not exist yet.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config.input_dir,
            &self.config.margins_dir,
            &self.config.output_dir,
        ] {
            fs::create_dir_all(dir).map_err(|e| StickerError::Io {
                path: dir.clone(),
                operation: "create directory".to_string(),
                source: Box::new(e),
            })?;
        }
        Ok(())
    }

    /// Recursively collects every file under the input directory whose
    /// extension maps to a known image format.
    pub fn collect_image_files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.config.input_dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.path().is_file() && ImageFormat::from_path(e.path()).is_ok())
            .map(|e| e.into_path())
            .collect()
    }

    /// Processes a single file according to the configured mode. Failures
    /// are returned to the caller; they never abort other files.
    pub fn process_file(&self, path: &Path) -> Result<()> {
        match self.config.mode {
            Mode::Full => self.run_full(path),
            Mode::Margins => self.run_margins(path),
            Mode::Noop => Ok(()),
        }
    }

    fn run_full(&self, path: &Path) -> Result<()> {
        let image = open_image(path)?;
        let result = full_process(
            &image,
            &self.config.estimator_params(),
            &self.config.segmenter_params(),
        )?;

        let stem = file_name_part(path, true)?;
        let output_file = self
            .config
            .output_dir
            .join(format!("done-{stem}.{}", self.config.format));
        result.save(&output_file).map_err(|e| StickerError::Io {
            path: output_file,
            operation: "save processed image".to_string(),
            source: Box::new(e),
        })
    }

    fn run_margins(&self, path: &Path) -> Result<()> {
        let image = open_image(path)?;
        let (expanded, _background) = expand_margins(&image, &self.config.estimator_params())?;

        let filename = file_name_part(path, false)?;
        let output_file = self.config.margins_dir.join(format!("exp-{filename}"));
        expanded.save(&output_file).map_err(|e| StickerError::Io {
            path: output_file,
            operation: "save expanded image".to_string(),
            source: Box::new(e),
        })
    }
}

fn open_image(path: &Path) -> Result<DynamicImage> {
    image::open(path).map_err(|e| match e {
        image::ImageError::IoError(io) => StickerError::Io {
            path: path.to_path_buf(),
            operation: "read image".to_string(),
            source: Box::new(io),
        },
        other => StickerError::InvalidImage {
            reason: format!("failed to decode {}: {other}", path.display()),
        },
    })
}

fn file_name_part(path: &Path, strip_extension: bool) -> Result<&str> {
    let part = if strip_extension {
        path.file_stem()
    } else {
        path.file_name()
    };
    part.and_then(|s| s.to_str())
        .ok_or_else(|| StickerError::InvalidImage {
            reason: format!("path has no usable file name: {}", path.display()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_part() {
        let path = Path::new("input/sub/photo.jpg");
        assert_eq!(file_name_part(path, true).unwrap(), "photo");
        assert_eq!(file_name_part(path, false).unwrap(), "photo.jpg");
    }
}
