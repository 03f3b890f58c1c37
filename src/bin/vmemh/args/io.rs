use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;
use vmemh::{Image, WordFormat};

use super::error::CliError;

pub(super) fn load_image(path: &Path) -> Result<Image, CliError> {
    let image = Image::load(path)?;
    info!(
        "{}: {} segment(s), {} byte(s)",
        path.display(),
        image.segments().len(),
        image.total_bytes()
    );
    Ok(image)
}

/// Write memory image text to `path`, or stdout when no path is given.
pub(super) fn write_image_text(
    image: &Image,
    path: Option<&Path>,
    format: &WordFormat,
) -> Result<(), CliError> {
    match path {
        Some(path) => {
            let mut out = BufWriter::new(File::create(path)?);
            image.write_to(&mut out, format)?;
        }
        None => {
            let stdout = std::io::stdout();
            image.write_to(&mut stdout.lock(), format)?;
        }
    }
    Ok(())
}

pub(super) fn write_binary(data: &[u8], path: Option<&Path>) -> Result<(), CliError> {
    match path {
        Some(path) => std::fs::write(path, data)?,
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            out.write_all(data)?;
            out.flush()?;
        }
    }
    Ok(())
}
