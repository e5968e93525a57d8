//! ingot-keys: Show the compacted code of every key, in submission order
//!
//! Usage:
//!   ingot-keys state race origin sex
//!
//!   # One key per line from a file (or stdin with --file -)
//!   ingot-keys --file keys.txt --sha256

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ingot::{KeyCompactor, KeyHasher, Md5Hasher, Sha256Hasher};
use std::fs::File;
use std::io::{stdin, stdout, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "ingot-keys")]
#[command(about = "Assign shortest unique digest-prefix codes to field names", long_about = None)]
struct Args {
    /// Keys to compact, in order
    #[arg(value_name = "KEY")]
    keys: Vec<String>,

    /// Read additional keys from this file, one per line ("-" for stdin)
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Digest keys with SHA-256 instead of MD5
    #[arg(long)]
    sha256: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut keys = args.keys;
    if let Some(path) = &args.file {
        keys.extend(read_keys(path)?);
    }
    if keys.is_empty() {
        bail!("No keys given; pass keys as arguments or use --file");
    }

    let pairs = if args.sha256 {
        compact(Sha256Hasher, &keys)?
    } else {
        compact(Md5Hasher, &keys)?
    };

    let mut out = BufWriter::new(stdout().lock());
    for (key, code) in pairs {
        writeln!(out, "{key}\t{code}")?;
    }
    out.flush()?;
    Ok(())
}

fn compact<H: KeyHasher>(hasher: H, keys: &[String]) -> Result<Vec<(String, String)>> {
    let mut compactor = KeyCompactor::with_hasher(hasher);
    let pairs = compactor.compact_all(keys).context("Key compaction failed")?;
    Ok(pairs)
}

fn read_keys(path: &Path) -> Result<Vec<String>> {
    let reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
        Box::new(BufReader::new(stdin()))
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        ))
    };

    let mut keys = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let key = line.trim();
        if !key.is_empty() {
            keys.push(key.to_string());
        }
    }
    Ok(keys)
}
