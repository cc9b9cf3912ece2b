//! SGN command line front end.

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use sgn::host::decode_hex_field;
use sgn::{ArchAdapter, Encoder, EncoderConfig, X64Adapter, SEED_MODULUS};

#[derive(Parser, Debug)]
#[command(name = "sgn", version, about = "Polymorphic binary encoder")]
struct Args {
    /// Target architecture in bits (32 or 64).
    #[arg(short, long, default_value_t = 64)]
    arch: u32,

    /// Number of encoding passes.
    #[arg(short = 'c', long = "enc", default_value_t = 1)]
    count: u32,

    /// Maximum bytes of garbage instructions.
    #[arg(short = 'm', long = "max", default_value_t = 50)]
    max_obfuscation: usize,

    /// Do not obfuscate the decoder stub with a cipher schema.
    #[arg(long)]
    plain_decoder: bool,

    /// Retry until every output byte is printable ASCII.
    #[arg(long)]
    ascii: bool,

    /// Wrap the output with register save/restore framing.
    #[arg(long)]
    safe: bool,

    /// Bytes the output must not contain, as hex (e.g. "\x00\x0a\x0d").
    #[arg(long = "bad-chars", default_value = "")]
    bad_chars: String,

    /// Read the raw payload from a file instead of the positional hex text.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Write the raw encoded bytes to a file instead of hex on stdout.
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Payload as hex text (ignored when --input is given).
    payload_hex: Option<String>,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let payload = match (&args.input, &args.payload_hex) {
        (Some(path), _) => fs::read(path)?,
        (None, Some(hex_text)) => decode_hex_field(hex_text)?,
        (None, None) => return Err("no payload: pass hex text or --input FILE".into()),
    };

    let mut adapter = X64Adapter::new();
    let mut config = EncoderConfig::new(args.arch);
    config.pass_count = args.count;
    config.obfuscation_budget = args.max_obfuscation;
    config.plain_decoder = args.plain_decoder;
    config.ascii_only = args.ascii;
    config.preserve_registers = args.safe;
    config.seed = adapter.random_byte() % SEED_MODULUS;
    if !args.bad_chars.is_empty() {
        config.forbidden = decode_hex_field(&args.bad_chars)?;
    }

    let encoded = Encoder::new(adapter).encode(&config, &payload)?;
    log::info!(
        "Final size: {} bytes ({} attempt(s), seed {:#04x})",
        encoded.bytes.len(),
        encoded.attempts,
        encoded.seed
    );

    match &args.out {
        Some(path) => fs::write(path, &encoded.bytes)?,
        None => println!("{}", hex::encode(&encoded.bytes)),
    }
    Ok(())
}
