use std::path::PathBuf;

use clap::{
    crate_authors, crate_description, crate_name, crate_version, value_parser, Arg, ArgAction,
    ArgMatches, Command,
};
use colored::Colorize;
use kamae::{
    generator::{validate_project_name, GeneratorError},
    AssetStrategy, Settings,
};

// The CLI layer should only parse inputs and forward them to library code.
fn main() -> miette::Result<()> {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("project")
                .short('p')
                .long("project")
                .help("Project name, created under <CARGO_HOME>/src")
                .value_parser(parse_project_name)
                .required(true),
        )
        .arg(
            Arg::new("assets")
                .long("assets")
                .help("Read templates from this directory")
                .value_parser(value_parser!(PathBuf))
                .conflicts_with("standalone"),
        )
        .arg(
            Arg::new("standalone")
                .long("standalone")
                .help("Read templates from ./assets without consulting Cargo.toml")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("dry-run")
                .long("dry-run")
                .help("Print the layout that would be created and exit")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_logger(matches.get_flag("verbose"));

    let project = matches
        .get_one::<String>("project")
        .ok_or_else(|| miette::miette!("missing required --project argument"))?;

    let settings = Settings::from_env()?.with_assets(asset_strategy(&matches));

    if matches.get_flag("dry-run") {
        kamae::preview(project, settings)?;
        return Ok(());
    }

    let destination = kamae::generate(project, settings)?;

    println!(
        "Project with name {} created successfully on {}",
        project.bold(),
        destination.display()
    );

    Ok(())
}

/// Rejects names the generator would refuse, so they surface as usage errors.
fn parse_project_name(value: &str) -> Result<String, GeneratorError> {
    validate_project_name(value)?;
    Ok(value.to_string())
}

fn asset_strategy(args: &ArgMatches) -> AssetStrategy {
    if let Some(directory) = args.get_one::<PathBuf>("assets") {
        AssetStrategy::Explicit(directory.clone())
    } else if args.get_flag("standalone") {
        AssetStrategy::WorkingDir
    } else {
        AssetStrategy::Manifest
    }
}

fn init_logger(is_verbose: bool) {
    let default_filter = if is_verbose { "debug" } else { "warn" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}
