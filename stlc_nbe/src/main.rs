use std::{path::PathBuf, process::ExitCode};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use codespan_reporting::{
    diagnostic::{Diagnostic, Label},
    files::SimpleFile,
    term::{
        self,
        termcolor::{ColorChoice, StandardStream},
    },
};
use log::info;

// Normalizes every definition and expression in a program of the simply
// typed lambda calculus, with naturals, atoms, pairs and lists.

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// The program to normalize.
    path: PathBuf,

    /// When to use colors in error messages.
    #[arg(long, value_enum, default_value_t = Color::Auto)]
    color: Color,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Color {
    Auto,
    Always,
    Never,
}

impl From<Color> for ColorChoice {
    fn from(color: Color) -> Self {
        match color {
            Color::Auto => ColorChoice::Auto,
            Color::Always => ColorChoice::Always,
            Color::Never => ColorChoice::Never,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();

    let cli = Cli::parse();
    let code = std::fs::read_to_string(&cli.path)
        .with_context(|| format!("could not read {}", cli.path.display()))?;
    info!("normalizing {}", cli.path.display());

    match stlc_nbe::run(&code) {
        Ok(outputs) => {
            for output in outputs {
                println!("{output}");
            }

            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            let mut writer = StandardStream::stderr(cli.color.into());
            let config = term::Config::default();

            let file = SimpleFile::new(cli.path.display().to_string(), &code);
            let location = e.location();
            let diagnostic = Diagnostic::error()
                .with_message(e.to_string())
                .with_labels(vec![Label::primary((), location.start..location.end)]);

            term::emit(&mut writer, &config, &file, &diagnostic)?;

            Ok(ExitCode::FAILURE)
        }
    }
}
