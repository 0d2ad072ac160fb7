// Copyright © 2025 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for vault creation, signing and verification.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! CLI entry point for the storage vault host tool.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use env_logger::Env;
use log::LevelFilter;
use std::path::PathBuf;
use vault_tool::{
    create_vault, file_digest, load_public_key, load_signing_key, sign_vault, verify_vault,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Storage vault authoring tool")]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Hash every file under a root and write vault.plist.
    Create(RootArgs),
    /// Sign vault.plist with an Ed25519 or RSA key and write vault.sig.
    Sign(SignArgs),
    /// Open the vault and check every listed file.
    Verify(VerifyArgs),
    /// Print the SHA-256 of a file.
    Digest(DigestArgs),
}

#[derive(Debug, Parser)]
struct RootArgs {
    /// Storage root directory.
    #[arg(long)]
    root: PathBuf,
}

#[derive(Debug, Parser)]
struct SignArgs {
    /// Storage root directory containing vault.plist.
    #[arg(long)]
    root: PathBuf,
    /// Signing key: hex Ed25519 seed or PEM RSA private key.
    #[arg(long)]
    signing_key: PathBuf,
}

#[derive(Debug, Parser)]
struct VerifyArgs {
    /// Storage root directory.
    #[arg(long)]
    root: PathBuf,
    /// Public key (hex Ed25519 or PEM RSA); enables signature checks.
    #[arg(long)]
    public_key: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct DigestArgs {
    /// File to hash.
    file: PathBuf,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Command::Create(args) => {
            let manifest = create_vault(&args.root)?;
            println!(
                "vault-tool: wrote {} files={}",
                args.root.join(storage_vault::VAULT_PATH).display(),
                manifest.files.len()
            );
        }
        Command::Sign(args) => {
            let key = load_signing_key(&args.signing_key)?;
            let signature = sign_vault(&args.root, &key)?;
            println!(
                "vault-tool: wrote {} algorithm={} bytes={}",
                args.root.join(storage_vault::VAULT_SIGNATURE_PATH).display(),
                key.algorithm(),
                signature.len()
            );
        }
        Command::Verify(args) => {
            let key = args
                .public_key
                .as_deref()
                .map(load_public_key)
                .transpose()?;
            let report = verify_vault(&args.root, key.as_ref())?;
            for (name, err) in &report.failures {
                eprintln!("vault-tool: {name}: {err}");
            }
            if !report.is_clean() {
                bail!(
                    "{} of {} vaulted files failed",
                    report.failures.len(),
                    report.checked
                );
            }
            println!("vault-tool: verified files={}", report.checked);
        }
        Command::Digest(args) => {
            let digest = file_digest(&args.file)?;
            println!("{}  {}", hex::encode(digest), args.file.display());
        }
    }
    Ok(())
}
