use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use vmemh::AddressStep;

#[derive(Debug, Parser)]
#[command(name = "vmemh")]
#[command(author, version, about = "Inspect and convert Verilog $readmemh memory images")]
#[command(propagate_version = true)]
pub struct Args {
    /// Parameter file with default settings (width, step, fill, backdoor)
    #[arg(long, global = true, env = "VMEMH_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct FormatArgs {
    /// Bytes per output word
    #[arg(short, long, env = "VMEMH_WIDTH")]
    pub width: Option<usize>,

    /// Address increment per output line: word or byte
    #[arg(long, env = "VMEMH_STEP")]
    pub step: Option<AddressStep>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a memory image
    Show {
        input: PathBuf,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// List the segments of a memory image
    Info { input: PathBuf },

    /// Re-encode a memory image
    Convert {
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Wrap a raw binary file as a memory image
    ///
    /// With the default `--step word` the address advances by one per line,
    /// so the output is word-addressed and `export` rejects it. Use
    /// `--step byte` for output that exports back to the same bytes.
    Import {
        input: PathBuf,

        /// Base address of the data (hex)
        #[arg(long, default_value = "0", value_parser = parse_hex_u32)]
        offset: u32,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        format: FormatArgs,
    },

    /// Flatten a memory image to raw binary, filling gaps
    ///
    /// Fails if any segments overlap.
    Export {
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gap fill byte (hex)
        #[arg(long, value_parser = parse_hex_u8)]
        fill: Option<u8>,
    },

    /// Check a memory backdoor endpoint (<host>:<port>)
    Endpoint {
        #[arg(env = "VMEMH_BACKDOOR")]
        descriptor: Option<String>,
    },
}

fn strip_hex_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

pub(super) fn parse_hex_u32(s: &str) -> Result<u32, String> {
    u32::from_str_radix(strip_hex_prefix(s), 16)
        .map_err(|e| format!("invalid hex value {s:?}: {e}"))
}

pub(super) fn parse_hex_u8(s: &str) -> Result<u8, String> {
    u8::from_str_radix(strip_hex_prefix(s), 16)
        .map_err(|e| format!("invalid hex byte {s:?}: {e}"))
}
