// Command-line front end for the codec.
//
// Subcommands mirror the extraction tooling's workflow: `encode` a raw
// buffer into the wire format, `decode` a compressed entry back out, and
// `info` to dump hunk structure without producing output.

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::io::{decode_file, encode_file, scan_file};

/// Hunk-framed LZ77 asset codec.
#[derive(Parser, Debug)]
#[command(
    name = "hunklz",
    version,
    about = "Hunk-framed LZ77 asset codec",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress a raw file into the hunk wire format.
    Encode(EncodeArgs),
    /// Decompress a hunk stream back to raw bytes.
    Decode(DecodeArgs),
    /// Print the hunk structure of a compressed file.
    Info(InfoArgs),
}

#[derive(Args, Debug)]
struct EncodeArgs {
    /// Raw input file.
    input: PathBuf,
    /// Compressed output file.
    output: PathBuf,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Compressed input file.
    input: PathBuf,
    /// Raw output file.
    output: PathBuf,
    /// Number of compressed bytes to consume (defaults to the file size).
    #[arg(long)]
    compressed_len: Option<u64>,
}

#[derive(Args, Debug)]
struct InfoArgs {
    /// Compressed input file.
    input: PathBuf,
}

/// Entry point for the `hunklz` binary.
pub fn run() {
    let cli = Cli::parse();

    let default_filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let opts = cli_opts(&cli);
    let result = match cli.command {
        Cmd::Encode(args) => cmd_encode(&opts, args),
        Cmd::Decode(args) => cmd_decode(&opts, args),
        Cmd::Info(args) => cmd_info(args),
    };

    if let Err(msg) = result {
        eprintln!("hunklz: {msg}");
        process::exit(1);
    }
}

struct Opts {
    force: bool,
    quiet: bool,
}

fn cli_opts(cli: &Cli) -> Opts {
    Opts {
        force: cli.force,
        quiet: cli.quiet,
    }
}

fn check_overwrite(path: &Path, force: bool) -> Result<(), String> {
    if !force && path.exists() {
        return Err(format!(
            "output file '{}' exists (use --force to overwrite)",
            path.display()
        ));
    }
    Ok(())
}

fn cmd_encode(opts: &Opts, args: EncodeArgs) -> Result<(), String> {
    check_overwrite(&args.output, opts.force)?;
    let stats = encode_file(&args.input, &args.output).map_err(|e| e.to_string())?;
    if !opts.quiet {
        eprintln!(
            "encoded {} -> {} bytes ({} hunks, {:.1}% of input)",
            stats.raw_size,
            stats.compressed_size,
            stats.hunks,
            if stats.raw_size > 0 {
                stats.compressed_size as f64 / stats.raw_size as f64 * 100.0
            } else {
                0.0
            }
        );
    }
    Ok(())
}

fn cmd_decode(opts: &Opts, args: DecodeArgs) -> Result<(), String> {
    check_overwrite(&args.output, opts.force)?;
    let stats =
        decode_file(&args.input, &args.output, args.compressed_len).map_err(|e| e.to_string())?;
    if !opts.quiet {
        eprintln!(
            "decoded {} -> {} bytes ({} hunks)",
            stats.compressed_size, stats.raw_size, stats.hunks
        );
    }
    Ok(())
}

fn cmd_info(args: InfoArgs) -> Result<(), String> {
    let infos = scan_file(&args.input).map_err(|e| e.to_string())?;
    let mut total_decoded: u64 = 0;
    for (i, info) in infos.iter().enumerate() {
        println!(
            "hunk {i}: offset {}, payload {} bytes, {} subhunks, decodes to {} bytes",
            info.offset, info.payload_len, info.subhunks, info.decoded_len
        );
        total_decoded += info.decoded_len;
    }
    println!("{} hunks, {} decoded bytes total", infos.len(), total_decoded);
    Ok(())
}
