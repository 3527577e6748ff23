use anyhow::Result;
use clap::{CommandFactory, Parser};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::{prelude::*, ThreadPoolBuilder};

use sticker_seg_rs::{Config, Mode, Processor};

fn main() -> Result<()> {
    // A missing or invalid mode prints usage and exits cleanly instead of
    // failing.
    let config = match Config::try_parse() {
        Ok(config) => config,
        Err(err) => {
            err.print()?;
            std::process::exit(0);
        }
    };

    if config.mode == Mode::Noop {
        Config::command().print_help()?;
        return Ok(());
    }

    let processor = Processor::new(&config);
    processor.ensure_directories()?;

    ThreadPoolBuilder::new()
        .num_threads(config.num_threads)
        .build_global()?;

    let image_paths = processor.collect_image_files();
    if image_paths.is_empty() {
        println!("No images found in {}", config.input_dir.display());
        return Ok(());
    }

    let progress_bar = ProgressBar::new(image_paths.len() as u64);
    progress_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec} {eta})",
        )?
        .progress_chars("#>-"),
    );

    // A failure in one image must never abort the batch: report it and
    // keep going.
    let failures: usize = image_paths
        .par_iter()
        .progress_with(progress_bar.clone())
        .map(|path| match processor.process_file(path) {
            Ok(()) => 0,
            Err(err) => {
                progress_bar.suspend(|| eprintln!("{}: {err}", path.display()));
                1
            }
        })
        .sum();

    progress_bar.finish();

    if failures > 0 {
        eprintln!("{failures} of {} images failed", image_paths.len());
    }

    Ok(())
}
