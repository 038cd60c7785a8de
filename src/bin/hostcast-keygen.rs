//! Publisher key management utility for hostcast.
//!
//! Usage:
//!   hostcast-keygen generate [output-dir]   Generate a publisher key
//!   hostcast-keygen address --key <file>    Show the address of a key

// This is a standalone CLI tool that exits on any error, so expect/unwrap is acceptable
#![allow(clippy::unwrap_used, clippy::expect_used)]

use clap::{Parser, Subcommand};
use hostcast::advert::PublisherKey;
use std::fs;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "hostcast-keygen")]
#[command(about = "Publisher key management for hostcast")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new publisher signing key
    Generate {
        /// Output directory for the key file
        #[arg(default_value = ".")]
        output_dir: PathBuf,
    },
    /// Show the ledger address of an existing key
    Address {
        /// Path to the hex-encoded key file
        #[arg(short, long)]
        key: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output_dir } => generate(&output_dir),
        Commands::Address { key } => show_address(&key),
    }
}

fn generate(output_dir: &PathBuf) {
    fs::create_dir_all(output_dir).expect("Failed to create output directory");

    let key = PublisherKey::generate();

    let key_path = output_dir.join("publisher-key.secret");
    fs::write(&key_path, key.secret_hex()).expect("Failed to write key file");

    println!("Publisher key saved to: {}", key_path.display());
    println!("  WARNING: Keep this file secure! Advertisements are published under it.");
    println!("\nPublisher address: {}", key.address());
    println!("\nConfigure the service with:");
    println!("  [publisher]");
    println!("  signing_key_path = \"{}\"", key_path.display());
}

fn show_address(key_path: &PathBuf) {
    let content = fs::read_to_string(key_path).expect("Failed to read key file");
    match PublisherKey::from_hex(content.trim()) {
        Ok(key) => println!("{}", key.address()),
        Err(e) => {
            eprintln!("Invalid key file: {e}");
            process::exit(1);
        }
    }
}
