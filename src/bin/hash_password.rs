//! Create Argon2id entries for the Heartcheck credentials file.
//!
//! # Usage
//!
//! ```bash
//! # Password read from the first line of stdin
//! echo 's3cret' | cargo run --bin hash_password -- admin
//!
//! # Merge into an existing credentials file
//! cargo run --bin hash_password -- admin --file credentials.json < pw.txt
//! ```
//!
//! # Security
//!
//! - Passing the password with `--password` leaves it in shell history;
//!   prefer stdin
//! - Plaintext buffers are zeroized after hashing

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use zeroize::Zeroizing;

use heartcheck::adapters::hash_password;

#[derive(Debug, Parser)]
#[command(
    name = "hash_password",
    version,
    about = "Hash a password for the Heartcheck credentials file"
)]
struct Cli {
    /// Login name the hash belongs to
    username: String,

    /// Password (read from stdin when omitted)
    #[arg(long)]
    password: Option<String>,

    /// Credentials file to add or replace the entry in
    #[arg(long, short = 'f')]
    file: Option<PathBuf>,
}

fn read_password() -> Result<Zeroizing<String>> {
    eprint!("Password: ");
    io::stderr().flush()?;

    let mut line = Zeroizing::new(String::new());
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    let trimmed = Zeroizing::new(line.trim_end_matches(['\r', '\n']).to_string());
    Ok(trimmed)
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    let username = cli.username.trim().to_string();
    if username.is_empty() {
        bail!("username must not be empty");
    }

    let password = match cli.password.take() {
        Some(p) => Zeroizing::new(p),
        None => read_password()?,
    };
    if password.is_empty() {
        bail!("password must not be empty");
    }

    let phc = hash_password(&password)?;

    match cli.file {
        Some(path) => {
            let mut entries: BTreeMap<String, String> = match fs::read_to_string(&path) {
                Ok(raw) => serde_json::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?,
                Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
                Err(e) => {
                    return Err(e).with_context(|| format!("reading {}", path.display()));
                }
            };
            let replaced = entries.insert(username.clone(), phc).is_some();
            let json = serde_json::to_string_pretty(&entries)?;
            fs::write(&path, json + "\n")
                .with_context(|| format!("writing {}", path.display()))?;
            let verb = if replaced { "Updated" } else { "Added" };
            println!("{verb} {username} in {}", path.display());
        }
        None => println!("{phc}"),
    }

    Ok(())
}
