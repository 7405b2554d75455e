// output.rs

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{MapError, MapResult};
use crate::pdf::encode_pdf;
use crate::render::rasterize;

pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Characters that never make it into an output file name.
const UNSAFE_FILENAME_CHARS: &str = " @!#$%^&*()[]{}_+=<>,.?/\\|";

/// Full-canvas background rectangle as emitted by the SVG backend.
static BACKGROUND_RECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"[ \t]*<rect x="0" y="0" [^>]*/>\r?\n?"#).expect("valid regex")
});

static CLIP_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#" clip(?:-path|-rule)?="[^"]*""#).expect("valid regex"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Png,
    Pdf,
    Svg,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Svg => "svg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// The written map file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    pub path: PathBuf,
    pub format: ExportFormat,
}

pub fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_FILENAME_CHARS.contains(c) { '-' } else { c })
        .collect()
}

/// Data file name without directories or extension.
pub fn data_base_name(data_file: &Path) -> String {
    data_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `<output_dir>/<sanitized name>.<extension>`, named after the data file
/// unless a file name is configured.
pub fn output_path(
    output_dir: &Path,
    data_file: &Path,
    filename: Option<&str>,
    format: ExportFormat,
) -> PathBuf {
    let stem = match filename {
        Some(name) => sanitize_file_stem(name),
        None => sanitize_file_stem(&data_base_name(data_file)),
    };
    output_dir.join(format!("{stem}.{}", format.extension()))
}

/// Removes the background rectangle and clip attributes.
pub fn clean_svg_markup(markup: &str) -> String {
    let without_background = BACKGROUND_RECT.replace_all(markup, "");
    CLIP_ATTRIBUTE.replace_all(&without_background, "").into_owned()
}

/// Rewrites an SVG file in place with `clean_svg_markup`.
pub fn clean_svg_file(path: &Path) -> MapResult<()> {
    info!(path = %path.display(), "Cleaning SVG");
    let markup = fs::read_to_string(path)?;
    fs::write(path, clean_svg_markup(&markup))?;
    Ok(())
}

/// Writes the rendered figure in `format`, creating the output directory.
pub fn write_artifact(markup: &str, path: &Path, format: ExportFormat) -> MapResult<OutputArtifact> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    info!(path = %path.display(), format = %format, "Saving map");

    match format {
        ExportFormat::Svg => {
            fs::write(path, markup)?;
            clean_svg_file(path)?;
        }
        ExportFormat::Png => {
            rasterize(markup)?.save_png(path).map_err(MapError::render)?;
        }
        ExportFormat::Pdf => {
            let document = encode_pdf(&rasterize(markup)?)?;
            fs::write(path, document)?;
        }
    }
    debug!(bytes = fs::metadata(path)?.len(), "Map written");

    Ok(OutputArtifact {
        path: path.to_path_buf(),
        format,
    })
}

fn launcher(path: &Path) -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg(path);
        command
    } else if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", ""]).arg(path);
        command
    } else {
        let mut command = Command::new("xdg-open");
        command.arg(path);
        command
    }
}

/// Hands the file to the platform's default viewer.
pub fn open_with_default(path: &Path) -> MapResult<()> {
    info!(path = %path.display(), "Opening file with default program");
    let status = launcher(path).status()?;
    if status.success() {
        Ok(())
    } else {
        Err(MapError::Io(std::io::Error::other(format!(
            "default program exited with {status}"
        ))))
    }
}
