//! CLI Module
//!
//! Command-line interface for Degrader.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Degrader - reproducible audio degradations
#[derive(Parser, Debug)]
#[command(name = "degrader-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Degrade one file
    #[command(name = "apply")]
    Apply {
        /// Input WAV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output WAV file
        #[arg(short, long)]
        output: PathBuf,

        /// Output bit depth (16, 24 or 32 float); defaults to the input's
        #[arg(long, value_parser = parse_bit_depth)]
        bit_depth: Option<u16>,

        /// Write the applied degradations as JSON to this file
        #[arg(long)]
        history: Option<PathBuf>,

        /// Path of the lame executable used by mp3 (overrides DEGRADER_LAME_PATH)
        #[arg(long)]
        lame_path: Option<PathBuf>,

        /// Degradations to apply in order, as name,value1//value2
        #[arg(required = true, num_args = 1..)]
        degradations: Vec<String>,
    },

    /// Degrade every WAV file under a directory
    #[command(name = "batch")]
    Batch {
        /// Directory searched recursively for WAV files
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory receiving the degraded files, same relative layout
        #[arg(long)]
        output_dir: PathBuf,

        /// Number of worker threads (default: available cores)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Output bit depth (16, 24 or 32 float); defaults to each input's
        #[arg(long, value_parser = parse_bit_depth)]
        bit_depth: Option<u16>,

        /// Path of the lame executable used by mp3 (overrides DEGRADER_LAME_PATH)
        #[arg(long)]
        lame_path: Option<PathBuf>,

        /// Degradations to apply in order, as name,value1//value2
        #[arg(required = true, num_args = 1..)]
        degradations: Vec<String>,
    },

    /// Show every available degradation and its parameters
    #[command(name = "list")]
    List,
}

fn parse_bit_depth(value: &str) -> Result<u16, String> {
    match value.parse::<u16>() {
        Ok(depth @ (16 | 24 | 32)) => Ok(depth),
        _ => Err(format!("bit depth must be 16, 24 or 32, got '{}'", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "degrader-cli",
            "apply",
            "-i",
            "in.wav",
            "-o",
            "out.wav",
            "--bit-depth",
            "24",
            "gain,-6",
            "mp3,16k",
        ])
        .unwrap();

        match cli.command {
            Commands::Apply {
                input,
                bit_depth,
                degradations,
                ..
            } => {
                assert_eq!(input, PathBuf::from("in.wav"));
                assert_eq!(bit_depth, Some(24));
                assert_eq!(degradations, vec!["gain,-6", "mp3,16k"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_apply_needs_a_degradation() {
        let result = Cli::try_parse_from(["degrader-cli", "apply", "-i", "a.wav", "-o", "b.wav"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_odd_bit_depth() {
        let result = Cli::try_parse_from([
            "degrader-cli",
            "batch",
            "--input-dir",
            "in",
            "--output-dir",
            "out",
            "--bit-depth",
            "20",
            "gain,-6",
        ]);
        assert!(result.is_err());
    }
}
