//! CLI output formatting.
//!
//! Single operations print only the written path, so the CLI composes with
//! shell pipelines:
//!
//! ```text
//! processed/resized_20251015_142301_9f3a0c1e.jpg
//! ```
//!
//! Batch runs print one line per input, then a summary:
//!
//! ```text
//! ok   photos/a.jpg → processed/enhanced_4k_20251015_142301_9f3a0c1e.jpg
//! FAIL photos/b.jpg: enhance_resolution failed: failed to decode photos/b.jpg: ...
//! Processed 2 images: 1 written, 1 failed
//! ```
//!
//! Menus (from `dispatch` with a menu callback) render as the prompt and one
//! line per keyboard row:
//!
//! ```text
//! Choose resize option:
//!     [8K (7680x4320)] resize_8k    [4K (3840x2160)] resize_4k
//! ```
//!
//! # Architecture
//!
//! Each shape has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::cleanup::CleanupReport;
use crate::dispatch::Menu;
use crate::imaging::{ImageInfo, ImageProcessingError};
use std::path::{Path, PathBuf};

/// One batch input and what became of it.
pub type BatchItem = (PathBuf, Result<PathBuf, ImageProcessingError>);

fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

pub fn format_written(path: &Path) -> Vec<String> {
    vec![path.display().to_string()]
}

pub fn print_written(path: &Path) {
    print_lines(format_written(path));
}

/// Human-readable image description.
pub fn format_info(source: &Path, info: &ImageInfo) -> Vec<String> {
    vec![
        source.display().to_string(),
        format!(
            "{}Format: {}",
            indent(1),
            info.format.as_deref().unwrap_or("unknown")
        ),
        format!("{}Color: {}", indent(1), info.color),
        format!("{}Size: {}x{}", indent(1), info.width, info.height),
        format!("{}Aspect ratio: {:.2}", indent(1), info.aspect_ratio),
    ]
}

pub fn print_info(source: &Path, info: &ImageInfo) {
    print_lines(format_info(source, info));
}

pub fn format_cleanup(dir: &Path, report: &CleanupReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Cleaned {}: removed {}, kept {}",
        dir.display(),
        report.removed,
        report.kept
    )];
    if report.failed > 0 {
        lines.push(format!(
            "{}{} entries could not be removed (see log)",
            indent(1),
            report.failed
        ));
    }
    lines
}

pub fn print_cleanup(dir: &Path, report: &CleanupReport) {
    print_lines(format_cleanup(dir, report));
}

pub fn format_menu(menu: Menu) -> Vec<String> {
    let mut lines = vec![menu.title().to_string()];
    for row in menu.buttons() {
        let cells: Vec<String> = row
            .iter()
            .map(|(label, callback)| format!("[{label}] {callback}"))
            .collect();
        lines.push(format!("{}{}", indent(1), cells.join("    ")));
    }
    lines
}

pub fn print_menu(menu: Menu) {
    print_lines(format_menu(menu));
}

pub fn format_batch(items: &[BatchItem]) -> Vec<String> {
    let mut lines = Vec::with_capacity(items.len() + 1);
    let mut failed = 0;
    for (source, result) in items {
        match result {
            Ok(output) => lines.push(format!(
                "ok   {} → {}",
                source.display(),
                output.display()
            )),
            Err(e) => {
                failed += 1;
                lines.push(format!("FAIL {}: {}", source.display(), e));
            }
        }
    }
    let noun = if items.len() == 1 { "image" } else { "images" };
    lines.push(format!(
        "Processed {} {}: {} written, {} failed",
        items.len(),
        noun,
        items.len() - failed,
        failed
    ));
    lines
}

pub fn print_batch(items: &[BatchItem]) {
    print_lines(format_batch(items));
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}
