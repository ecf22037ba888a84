use std::path::{Path, PathBuf};
use std::process::exit;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::debug;

use gumdiff::tree::Tree;
use gumdiff::tree_matcher::TreeMatcher;
use gumdiff::{edit_script, match_and_annotate, output, tree_builder};

/// Structural diff between two syntax trees, in the GumTree style.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[deny(missing_docs)]
struct CliArgs {
    /// Minimum height of subtrees matched as anchors in the top-down phase
    #[clap(long, global = true, default_value_t = 2)]
    min_height: i32,
    /// Similarity threshold for container matches in the bottom-up phase
    #[clap(long, global = true, default_value_t = 0.5)]
    min_similarity: f32,
    /// Maximum subtree size for the optimal tree-edit-distance matching
    #[clap(long, global = true, default_value_t = 100)]
    max_size: usize,
    /// Verbosity
    #[clap(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the node matches and the edit script in text form
    Diff {
        /// Path to the JSON tree of the original file
        src: PathBuf,
        /// Path to the JSON tree of the modified file
        dst: PathBuf,
    },
    /// Print the dual-tree JSON diff consumed by the browser viewer
    #[command(name = "jsondiff")]
    JsonDiff {
        /// Path to the JSON tree of the original file
        src: PathBuf,
        /// Path to the JSON tree of the modified file
        dst: PathBuf,
    },
    /// Run the matching phases and report their timings
    Profile {
        /// Path to the JSON tree of the original file
        src: PathBuf,
        /// Path to the JSON tree of the modified file
        dst: PathBuf,
    },
}

fn main() {
    let args = CliArgs::parse();

    stderrlog::new()
        .module(module_path!())
        .verbosity(if args.verbose { 3 } else { 2 })
        .init()
        .unwrap();

    match real_main(args) {
        Ok(exit_code) => exit(exit_code),
        Err(error) => {
            eprintln!("gumdiff: {error}");
            exit(-1)
        }
    }
}

fn real_main(args: CliArgs) -> Result<i32, String> {
    let matcher = TreeMatcher {
        min_height: args.min_height,
        min_similarity: args.min_similarity,
        max_size: args.max_size,
    };

    match args.command {
        CliCommand::Diff { src, dst } => {
            let (mut src, mut dst) = load_trees(&src, &dst)?;
            let mut mapping = match_and_annotate(&matcher, &mut src, &mut dst);
            debug!("source tree:\n{}", src.ascii_tree());
            debug!("destination tree:\n{}", dst.ascii_tree());
            print!("{}", output::text_diff(&mut src, &dst, &mut mapping));
        }
        CliCommand::JsonDiff { src, dst } => {
            let (mut src, mut dst) = load_trees(&src, &dst)?;
            let mapping = match_and_annotate(&matcher, &mut src, &mut dst);
            print!("{}", output::json_diff(&src, &dst, &mapping));
        }
        CliCommand::Profile { src, dst } => {
            let start = Instant::now();
            let (mut src, mut dst) = load_trees(&src, &dst)?;
            let read = start.elapsed();

            let start = Instant::now();
            let mapping = matcher.match_trees(&src, &dst);
            let matched = start.elapsed();

            let start = Instant::now();
            edit_script::annotate_changes(&mut src, &mut dst, &mapping);
            let annotated = start.elapsed();

            println!("trees:    {} and {} nodes, read in {read:?}", src.len(), dst.len());
            println!("matching: {} pairs in {matched:?}", mapping.len());
            println!("changes:  annotated in {annotated:?}");
        }
    }
    Ok(0)
}

fn load_trees(src: &Path, dst: &Path) -> Result<(Tree, Tree), String> {
    let src = tree_builder::read_tree(src).map_err(|error| error.to_string())?;
    let dst = tree_builder::read_tree(dst).map_err(|error| error.to_string())?;
    Ok((src, dst))
}
