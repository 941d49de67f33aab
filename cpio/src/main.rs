use std::path::PathBuf;

use cpio_format::Encoding;
use structopt::clap::AppSettings::*;
use structopt::StructOpt;

mod commands;
mod error;
mod util;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(name = "c", visible_alias = "create", about = "Create a new archive")]
    Create {
        #[structopt(
            short = "H",
            long = "format",
            default_value = "odc",
            help = "Header format: odc, newc, crc, bin, bin-le or bin-be"
        )]
        format: Encoding,

        #[structopt(short, long, help = "Recursively handle provided paths")]
        recursive: bool,

        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive, or - for stdout"
        )]
        path: PathBuf,

        #[structopt(
            name = "files",
            parse(from_os_str),
            help = "Files and directories to add to the archive"
        )]
        selected_files: Vec<PathBuf>,
    },

    #[structopt(name = "l", visible_alias = "list", about = "List files of an archive")]
    List {
        #[structopt(long, help = "Print one JSON object per entry")]
        json: bool,

        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive, or - for stdin"
        )]
        path: PathBuf,

        #[structopt(
            name = "files",
            parse(from_os_str),
            help = "Only list these files/directories"
        )]
        selected_files: Vec<PathBuf>,
    },

    #[structopt(
        name = "x",
        visible_alias = "extract",
        about = "Extract files from an archive"
    )]
    Extract {
        #[structopt(
            short = "C",
            long = "directory",
            parse(from_os_str),
            default_value = ".",
            help = "Directory to extract into"
        )]
        output: PathBuf,

        #[structopt(
            name = "archive",
            parse(from_os_str),
            help = "Path to the archive, or - for stdin"
        )]
        path: PathBuf,

        #[structopt(
            name = "files",
            parse(from_os_str),
            help = "Only extract these files/directories"
        )]
        selected_files: Vec<PathBuf>,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "cpio",
    about = "Create, list and extract cpio archives.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands],
    usage = "cpio (c|l|x) [FLAGS|OPTIONS] <archive> [files]..."
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

fn main() -> anyhow::Result<()> {
    let opts = CliOpts::from_iter(wild::args_os());

    let level = if opts.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match opts.cmd {
        Commands::Create {
            format,
            recursive,
            path,
            selected_files,
        } => commands::create(&path, &selected_files, format, recursive, opts.verbose)?,
        Commands::List {
            json,
            path,
            selected_files,
        } => commands::list(&path, &selected_files, json)?,
        Commands::Extract {
            output,
            path,
            selected_files,
        } => commands::extract(&path, &selected_files, &output, opts.verbose)?,
    }

    Ok(())
}
