// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Argument surface (spec.md §6 "CLI surface").

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "nomad", version, about = "Autonomous board-driven task orchestrator")]
pub struct Cli {
    /// One-shot refinement pass: process the `To Refine` bucket once, then exit.
    #[arg(long)]
    pub refine: bool,

    /// One-shot prepare pass: process one `Prepare Tasks` ticket, then exit.
    #[arg(long)]
    pub prepare: bool,

    /// One-shot queued run: process the `Queued to run` bucket once, then exit.
    #[arg(long)]
    pub queued: bool,

    /// One-shot multi-status pass: one full dispatcher cycle, then exit.
    #[arg(long)]
    pub multi: bool,

    /// Print the recognized environment variables and exit.
    #[arg(long = "config-help")]
    pub config_help: bool,

    /// Write a `nomad.toml` with default non-secret tuning knobs and exit.
    #[arg(long = "config-create")]
    pub config_create: bool,

    /// Load and validate configuration, print it (secrets masked), and exit.
    #[arg(long = "config-status")]
    pub config_status: bool,

    /// Load configuration and probe the board connection, then exit.
    #[arg(long = "health-check")]
    pub health_check: bool,

    /// Change to this directory before doing anything.
    #[arg(long = "working-dir", value_name = "PATH")]
    pub working_dir: Option<PathBuf>,
}

impl Cli {
    /// At most one of the modal flags may be set; `None` means "no args" (continuous polling).
    pub fn mode(&self) -> Result<Mode, &'static str> {
        let picked = [self.refine, self.prepare, self.queued, self.multi]
            .iter()
            .filter(|&&flag| flag)
            .count();
        if picked > 1 {
            return Err("only one of --refine, --prepare, --queued, --multi may be given");
        }
        Ok(if self.refine {
            Mode::Refine
        } else if self.prepare {
            Mode::Prepare
        } else if self.queued {
            Mode::Queued
        } else if self.multi {
            Mode::Multi
        } else {
            Mode::Continuous
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Continuous,
    Refine,
    Prepare,
    Queued,
    Multi,
}
