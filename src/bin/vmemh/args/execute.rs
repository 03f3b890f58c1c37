use std::path::Path;

use tracing::{debug, warn};
use vmemh::{Endpoint, Image, MemoryBackdoor, SparseMemory, WordFormat, write_image};

use super::error::CliError;
use super::ini::Settings;
use super::io::{load_image, write_binary, write_image_text};
use super::types::{Args, Command};

const DEFAULT_FILL: u8 = 0xFF;

impl Args {
    pub fn execute(&self) -> Result<(), CliError> {
        let settings = match self.config {
            Some(ref path) => Settings::load(path)?,
            None => Settings::default(),
        };

        match &self.command {
            Command::Show { input, format } => show(input, &settings.word_format(format)?),
            Command::Info { input } => info(input),
            Command::Convert {
                input,
                output,
                format,
            } => {
                let image = load_image(input)?;
                write_image_text(&image, output.as_deref(), &settings.word_format(format)?)
            }
            Command::Import {
                input,
                offset,
                output,
                format,
            } => {
                let data = std::fs::read(input)?;
                debug!("importing {} byte(s) at {offset:#010x}", data.len());
                let image = Image::from_bytes(data, *offset)?;
                write_image_text(&image, output.as_deref(), &settings.word_format(format)?)
            }
            Command::Export {
                input,
                output,
                fill,
            } => {
                let fill = fill.or(settings.fill).unwrap_or(DEFAULT_FILL);
                let image = load_image(input)?;
                reject_overlap(&image)?;
                let data = flatten(&image, fill)?;
                write_binary(&data, output.as_deref())
            }
            Command::Endpoint { descriptor } => {
                let endpoint = match descriptor {
                    Some(descriptor) => descriptor.parse::<Endpoint>()?,
                    None => settings.backdoor.unwrap_or_default(),
                };
                println!("{endpoint} ({})", endpoint.socket_addr());
                Ok(())
            }
        }
    }
}

fn show(input: &Path, format: &WordFormat) -> Result<(), CliError> {
    let image = load_image(input)?;
    if *format == WordFormat::default() {
        image.dump()?;
        return Ok(());
    }
    for line in image.to_text(format)? {
        println!("{line}");
    }
    Ok(())
}

fn info(input: &Path) -> Result<(), CliError> {
    let image = load_image(input)?;
    for (idx, segment) in image.segments().iter().enumerate() {
        println!(
            "{idx:>4}  {:08x}..{:08x}  {} byte(s)",
            segment.base_address(),
            segment.end_address(),
            segment.size()
        );
    }
    println!(
        "{} segment(s), {} byte(s)",
        image.segments().len(),
        image.total_bytes()
    );
    if let Some((first, second)) = image.find_overlap() {
        warn!("segments {first} and {second} overlap; the later segment wins");
        println!("overlap: segments {first} and {second}");
    }
    Ok(())
}

/// Overlapping segments would be silently merged by `flatten`. Word-stepped
/// output from `import` reloads as one overlapping segment per line.
fn reject_overlap(image: &Image) -> Result<(), CliError> {
    match image.find_overlap() {
        Some((first, second)) => Err(CliError::Other(format!(
            "segments {first} and {second} overlap; export needs byte-addressed \
             segments (write them with --step byte)"
        ))),
        None => Ok(()),
    }
}

/// Replay the image into memory and read back one contiguous block.
fn flatten(image: &Image, fill: u8) -> Result<Vec<u8>, CliError> {
    let (Some(start), Some(end)) = (image.min_address(), image.max_end_address()) else {
        return Ok(Vec::new());
    };
    let len = usize::try_from(end - start as u64)
        .map_err(|_| CliError::Other(format!("image span {start:#x}..{end:#x} is too large")))?;

    let mut memory = SparseMemory::new(fill);
    write_image(&mut memory, image)?;
    debug!(
        "flattening {} written byte(s) into {len} byte(s)",
        memory.len()
    );
    Ok(memory.read_block8(start, len)?)
}
