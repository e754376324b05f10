use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process;

use anyhow::{bail, Context as _};
use cctx_merge::MergeMode;
use cctx_store::{
    format_history, ContextError, ContextStore, MergeTarget, Scope, ScopePaths,
};
use cctx_types::document::parse_object;
use colored::Colorize;
use serde_json::{json, Value};
use tracing::debug;

use crate::cli::*;
use crate::config::CliConfig;

pub fn run_command(cli: Cli, config: &CliConfig) -> anyhow::Result<()> {
    let scope = scope_for(&cli, config);
    let store = open_store(scope)?;
    let format = cli.format;

    match cli.command {
        Command::List(args) => cmd_list(&store, args, &format),
        Command::Current => cmd_current(&store, &format),
        Command::Create(args) => cmd_create(&store, args),
        Command::Switch(args) => cmd_switch(&store, args),
        Command::Previous => cmd_previous(&store),
        Command::Delete(args) => cmd_delete(&store, args),
        Command::Rename(args) => cmd_rename(&store, args),
        Command::Show(args) => cmd_show(&store, args),
        Command::Export(args) => cmd_export(&store, args),
        Command::Import(args) => cmd_import(&store, args),
        Command::Unset => cmd_unset(&store),
        Command::Edit(args) => cmd_edit(&store, args, config),
        Command::Merge(args) => cmd_merge(&store, args, &format),
        Command::Unmerge(args) => cmd_unmerge(&store, args, &format),
        Command::History(args) => cmd_history(&store, args, &format),
    }
}

fn scope_for(cli: &Cli, config: &CliConfig) -> Scope {
    if cli.local {
        Scope::Local
    } else if cli.in_project {
        Scope::Project
    } else {
        config.default_scope
    }
}

fn open_store(scope: Scope) -> anyhow::Result<ContextStore> {
    let home = dirs_next::home_dir().context("cannot determine the home directory")?;
    let cwd = env::current_dir().context("cannot determine the working directory")?;
    let paths = ScopePaths::resolve(scope, &home, &cwd);
    debug!(scope = %scope, contexts = %paths.contexts_dir.display(), "opening store");
    Ok(ContextStore::open(paths).with_user_settings(ScopePaths::user_settings(&home)))
}

fn name_or_current(store: &ContextStore, name: Option<String>) -> Result<String, ContextError> {
    match name {
        Some(name) => Ok(name),
        None => store
            .current()?
            .ok_or_else(|| ContextError::MissingDocument("no current context is set".into())),
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_list(store: &ContextStore, args: ListArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let names = store.list();
    let current = store.current()?;

    if let OutputFormat::Json = format {
        return print_json(&json!({ "contexts": names, "current": current }));
    }
    if args.quiet {
        for name in &names {
            println!("{name}");
        }
        return Ok(());
    }
    if names.is_empty() {
        println!("No contexts in {} scope.", store.scope().to_string().bold());
        return Ok(());
    }
    for name in &names {
        if current.as_deref() == Some(name.as_str()) {
            println!("{} {}", "*".green().bold(), name.green().bold());
        } else {
            println!("  {name}");
        }
    }
    Ok(())
}

fn cmd_current(store: &ContextStore, format: &OutputFormat) -> anyhow::Result<()> {
    let current = store.current()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "current": current })),
        OutputFormat::Text => {
            match current {
                Some(name) => println!("{name}"),
                None => eprintln!("No current context."),
            }
            Ok(())
        }
    }
}

fn cmd_create(store: &ContextStore, args: NameArgs) -> anyhow::Result<()> {
    store.create(&args.name)?;
    println!("{} Context {} created", "✓".green().bold(), args.name.yellow());
    Ok(())
}

fn cmd_switch(store: &ContextStore, args: NameArgs) -> anyhow::Result<()> {
    if args.name == "-" {
        return cmd_previous(store);
    }
    let outcome = store.switch(&args.name)?;
    if outcome.changed {
        println!("Switched to context {}", outcome.current.green().bold());
    } else {
        println!("Already on context {}", outcome.current.green().bold());
    }
    Ok(())
}

fn cmd_previous(store: &ContextStore) -> anyhow::Result<()> {
    let outcome = store.switch_to_previous()?;
    println!("Switched to context {}", outcome.current.green().bold());
    Ok(())
}

fn cmd_delete(store: &ContextStore, args: NameArgs) -> anyhow::Result<()> {
    store.delete(&args.name)?;
    println!("{} Context {} deleted", "✓".green().bold(), args.name.yellow());
    Ok(())
}

fn cmd_rename(store: &ContextStore, args: RenameArgs) -> anyhow::Result<()> {
    store.rename(&args.old, &args.new)?;
    println!(
        "{} Context {} renamed to {}",
        "✓".green().bold(),
        args.old.yellow(),
        args.new.yellow().bold()
    );
    Ok(())
}

fn cmd_show(store: &ContextStore, args: OptionalNameArgs) -> anyhow::Result<()> {
    let name = name_or_current(store, args.name)?;
    print_json(&store.show(&name)?)
}

fn cmd_export(store: &ContextStore, args: OptionalNameArgs) -> anyhow::Result<()> {
    let name = name_or_current(store, args.name)?;
    let bytes = store.export(&name)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.flush()?;
    Ok(())
}

fn cmd_import(store: &ContextStore, args: ImportArgs) -> anyhow::Result<()> {
    let text = match &args.file {
        Some(path) => fs::read(path).with_context(|| format!("failed to read {path}"))?,
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };

    match &args.prototype {
        Some(path) => {
            let raw = fs::read(path).with_context(|| format!("failed to read {path}"))?;
            let prototype = parse_object(&raw)
                .map_err(|e| ContextError::InvalidDocument { subject: path.clone(), source: e })?;
            store.import_with_prototype(&args.name, &text, Some(&prototype))?;
        }
        None => store.import_from_text(&args.name, &text)?,
    }
    println!("{} Context {} imported", "✓".green().bold(), args.name.yellow());
    Ok(())
}

fn cmd_unset(store: &ContextStore) -> anyhow::Result<()> {
    match store.unset()? {
        Some(old) => println!("Unset context {}", old.yellow()),
        None => println!("Active settings removed"),
    }
    Ok(())
}

fn cmd_edit(store: &ContextStore, args: OptionalNameArgs, config: &CliConfig) -> anyhow::Result<()> {
    let name = name_or_current(store, args.name)?;
    if !store.exists(&name)? {
        return Err(ContextError::NotFound(name).into());
    }
    let path = store.context_path(&name);
    launch_editor(&config.editor(), &path)?;

    store.validate(&name)?;
    println!("{} Context {} saved", "✓".green().bold(), name.yellow());
    Ok(())
}

fn launch_editor(editor: &str, path: &Path) -> anyhow::Result<()> {
    let mut words = editor.split_whitespace();
    let Some(program) = words.next() else {
        bail!("editor command is empty");
    };
    debug!(editor, path = %path.display(), "launching editor");
    let status = process::Command::new(program)
        .args(words)
        .arg(path)
        .status()
        .with_context(|| format!("failed to launch editor {program:?}"))?;
    if !status.success() {
        bail!("editor {program:?} exited with {status}");
    }
    Ok(())
}

fn mode(full: bool) -> MergeMode {
    if full {
        MergeMode::Full
    } else {
        MergeMode::Permissions
    }
}

fn cmd_merge(store: &ContextStore, args: MergeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let target = MergeTarget::parse(&args.into);
    let report = store.merge_from(&target, &args.source, mode(args.full))?;

    if let OutputFormat::Json = format {
        return print_json(&json!({
            "target": report.history_key,
            "entry": report.entry,
        }));
    }
    if report.entry.is_empty() {
        println!(
            "Nothing new to merge from {} into {}",
            args.source.cyan(),
            target.to_string().bold()
        );
        return Ok(());
    }
    println!(
        "{} Merged {} item(s) from {} into {}",
        "✓".green().bold(),
        report.entry.merged_items.len(),
        args.source.cyan(),
        target.to_string().green().bold()
    );
    for item in &report.entry.merged_items {
        println!("  {} {}", "+".green(), item);
    }
    Ok(())
}

fn cmd_unmerge(store: &ContextStore, args: UnmergeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let target = MergeTarget::parse(&args.from);
    let report = store.unmerge_from(&target, &args.source, mode(args.full))?;

    if let OutputFormat::Json = format {
        return print_json(&json!({
            "target": report.history_key,
            "reverted": report.reverted,
            "droppedEntries": report.dropped_entries,
            "remaining": report.remaining,
        }));
    }
    if report.dropped_entries == 0 {
        println!(
            "No merges from {} recorded for {}",
            args.source.cyan(),
            report.history_key.bold()
        );
        return Ok(());
    }
    println!(
        "{} Removed {} item(s) merged from {} in {}",
        "✓".green().bold(),
        report.reverted.len(),
        args.source.red(),
        target.to_string().green().bold()
    );
    for item in &report.reverted {
        println!("  {} {}", "-".red(), item);
    }
    Ok(())
}

fn cmd_history(store: &ContextStore, args: OptionalNameArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let (name, entries) = store.history(args.name.as_deref())?;
    match format {
        OutputFormat::Json => print_json(&json!({ "context": name, "entries": entries })),
        OutputFormat::Text => {
            println!("{}", format_history(&name, &entries));
            Ok(())
        }
    }
}
