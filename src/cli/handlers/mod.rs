mod apply;
pub use apply::cmd_apply;

use std::path::Path;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::editor::Document;
use crate::io::config_io;
use crate::io::document_io;
use crate::model::config::EditorConfig;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let json = cli.json;
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Show(args) => cmd_show(args, &config, json),
        Commands::Tags(args) => cmd_tags(args, &config, json),
        Commands::Fmt(args) => cmd_fmt(args, &config),
        Commands::Apply(args) => cmd_apply(args, config, json),
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig, Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_io::default_config_path() {
            Some(path) => path,
            None => return Ok(EditorConfig::default()),
        },
    };
    Ok(config_io::read_config(&path)?)
}

fn load(path: &Path, config: &EditorConfig) -> Result<Document, Box<dyn std::error::Error>> {
    Ok(document_io::load_document(path, config.clone())?)
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_show(args: ShowArgs, config: &EditorConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load(&args.file, config)?;
    if json {
        let out = outline_to_json(doc.outline(), args.depth);
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for row in format_outline(doc.outline(), args.depth, args.width) {
            println!("{}", row);
        }
    }
    Ok(())
}

fn cmd_tags(args: TagsArgs, config: &EditorConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load(&args.file, config)?;
    let names: Vec<String> = match &args.tag {
        Some(tag) => {
            if doc.tags().get(tag).is_none() {
                return Err(format!("tag not found: #{}", tag).into());
            }
            vec![tag.clone()]
        }
        None => doc.tags().tags().map(str::to_string).collect(),
    };

    if json {
        let tags: Vec<TagJson> = tags_to_json(doc.tags(), doc.outline())
            .into_iter()
            .filter(|t| names.contains(&t.name))
            .collect();
        println!("{}", serde_json::to_string_pretty(&tags)?);
    } else {
        for name in &names {
            for line in format_tag(name, doc.tags(), doc.outline()) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_fmt(args: FmtArgs, config: &EditorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let original = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("could not read {}: {}", args.file.display(), e))?;
    let doc = Document::from_text(
        &original,
        &document_io::document_name(&args.file),
        config.clone(),
    );
    let normalized = doc.to_text();
    if normalized == original {
        return Ok(());
    }
    if args.check {
        return Err(format!("{} is not normalized", args.file.display()).into());
    }
    document_io::atomic_write(&args.file, normalized.as_bytes())?;
    println!("formatted {}", args.file.display());
    Ok(())
}
