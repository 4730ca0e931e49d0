use anyhow::Context;
use clap::{Parser, Subcommand};
use echolex_lexicon::{LexiconStore, LookupResult, MatchPath};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Compiles the JSON dictionary to an rkyv archive")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a JSON dictionary and write it as an archive
    Compile {
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },
    /// Show how words resolve against a dictionary (JSON or archive)
    Lookup {
        #[arg(short, long, value_name = "FILE")]
        lexicon: PathBuf,

        #[arg(required = true)]
        words: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compile { input, output } => compile(&input, &output),
        Command::Lookup { lexicon, words } => {
            let store = load_store(&lexicon)?;
            for word in &words {
                println!("{}", describe(word, store.lookup(word).as_ref()));
            }
            Ok(())
        }
    }
}

fn compile(input: &Path, output: &Path) -> anyhow::Result<()> {
    info!("reading JSON from {}", input.display());
    let json = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let store = LexiconStore::from_json(&json)
        .with_context(|| format!("{} is not a usable dictionary", input.display()))?;
    info!("compiling dictionary version {} with {} entries", store.version(), store.len());

    let bytes = store.to_archive()?;
    fs::write(output, bytes.as_slice()).with_context(|| format!("failed to write {}", output.display()))?;

    info!("wrote {} bytes to {}", bytes.len(), output.display());
    Ok(())
}

/// `.json` files are parsed as JSON, anything else as an archive.
fn load_store(path: &Path) -> anyhow::Result<LexiconStore> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let store = if is_json {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        LexiconStore::from_json(&json)?
    } else {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        LexiconStore::from_archive(&bytes)?
    };

    info!("loaded {} entries from {}", store.len(), path.display());
    Ok(store)
}

fn describe(word: &str, result: Option<&LookupResult>) -> String {
    let Some(result) = result else {
        return format!("{word}: not in dictionary");
    };

    let via = match result.path {
        MatchPath::Direct => String::from("direct"),
        MatchPath::Suffix { suffix } => format!("-{suffix} removed"),
        MatchPath::UndoubledConsonant { suffix } => format!("-{suffix} removed, consonant undoubled"),
        MatchPath::SilentE { suffix } => format!("-{suffix} removed, silent e restored"),
    };

    format!(
        "{word}: {} ({via}) {}",
        result.matched_key,
        result.record.display_translation()
    )
}
