use std::fs;

use crate::cli::commands::ApplyArgs;
use crate::cli::output::ApplyJson;
use crate::editor::InputEvent;
use crate::io::document_io;
use crate::model::config::EditorConfig;

/// Replay a JSON event script against a document, then save it.
pub fn cmd_apply(args: ApplyArgs, config: EditorConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let script = fs::read_to_string(&args.script)
        .map_err(|e| format!("could not read {}: {}", args.script.display(), e))?;
    let events: Vec<InputEvent> = serde_json::from_str(&script)
        .map_err(|e| format!("invalid script {}: {}", args.script.display(), e))?;

    let mut doc = document_io::load_document(&args.file, config)?;
    let mut clipboard = Vec::new();
    for event in &events {
        if let Some(text) = doc.handle(event) {
            clipboard.push(text);
        }
    }
    doc.commit_text();
    log::debug!("applied {} event(s) to {}", events.len(), args.file.display());

    if !args.dry_run {
        document_io::save_document(&doc, &args.file)?;
    }

    if json {
        let out = ApplyJson {
            events: events.len(),
            clipboard,
            text: doc.to_text(),
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if args.dry_run {
        print!("{}", doc.to_text());
    } else {
        for text in &clipboard {
            println!("{}", text);
        }
    }
    Ok(())
}
