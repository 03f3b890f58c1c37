use std::path::Path;

use tracing::{debug, warn};
use vmemh::{AddressStep, Endpoint, WordFormat};

use super::error::CliError;
use super::types::{FormatArgs, parse_hex_u8};

/// Defaults read from a parameter file.
///
/// ```ini
/// ; vmemh.ini
/// [output]
/// width = 4
/// step = word
/// fill = FF
/// backdoor = localhost:5557
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(super) struct Settings {
    pub width: Option<usize>,
    pub step: Option<AddressStep>,
    pub fill: Option<u8>,
    pub backdoor: Option<Endpoint>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path)?;
        let settings = Self::parse(&content, &path.display().to_string())?;
        debug!("settings from {}: {settings:?}", path.display());
        Ok(settings)
    }

    fn parse(content: &str, origin: &str) -> Result<Self, CliError> {
        let mut settings = Settings::default();

        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"');

            let invalid = |message: String| CliError::Config {
                path: origin.to_string(),
                line: idx + 1,
                message,
            };
            match key.as_str() {
                "width" => {
                    let width = value
                        .parse()
                        .map_err(|e| invalid(format!("width {value:?}: {e}")))?;
                    settings.width = Some(width);
                }
                "step" => settings.step = Some(value.parse().map_err(invalid)?),
                "fill" => settings.fill = Some(parse_hex_u8(value).map_err(invalid)?),
                "backdoor" => {
                    let endpoint = value
                        .parse()
                        .map_err(|e| invalid(format!("backdoor: {e}")))?;
                    settings.backdoor = Some(endpoint);
                }
                other => warn!("{origin}:{}: ignoring unknown key {other:?}", idx + 1),
            }
        }

        Ok(settings)
    }

    /// Flags win over the parameter file, which wins over the defaults.
    pub fn word_format(&self, args: &FormatArgs) -> Result<WordFormat, CliError> {
        let defaults = WordFormat::default();
        let width = args.width.or(self.width).unwrap_or(defaults.width);
        if width == 0 {
            return Err(vmemh::FormatError::InvalidWordWidth.into());
        }
        Ok(WordFormat {
            width,
            step: args.step.or(self.step).unwrap_or(defaults.step),
        })
    }
}
