//! gerrit-diff - print a Gerrit file diff with its comments
//!
//! Usage: gerrit-diff [options] <diff.json|file.patch>
//!
//! The diff is either Gerrit `DiffInfo` JSON or a unified patch.

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;

use anyhow::{Context, Result};

use gerrit_diff::comment::parse_comments;
use gerrit_diff::config::load_user_config;
use gerrit_diff::diff::parse_diff_info;
use gerrit_diff::theme::resolve_colors;
use gerrit_diff::{
    render_text, spawn, CommentDb, CommentInfo, CommentSet, DiffColors, DiffRequest, FileDiff,
    Highlighter, LayoutMode, ParsedPatch, ViewOptions,
};

struct CliArgs {
    input: PathBuf,
    mode: Option<LayoutMode>,
    comments: Option<PathBuf>,
    base_comments: Option<PathBuf>,
    drafts: Option<PathBuf>,
    base_drafts: Option<PathBuf>,
    db_path: Option<PathBuf>,
    change: Option<String>,
    patch_set: Option<u32>,
    base: Option<u32>,
    path: Option<String>,
    context: Option<usize>,
    width: Option<usize>,
    color: Option<bool>,
    colors: Option<String>,
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = parse_args()?;

    let config = load_user_config()?.unwrap_or_default();
    let mut options = config.diff;
    if let Some(mode) = args.mode {
        options.mode = mode;
    }
    if let Some(context) = args.context {
        options.context_lines = context;
    }

    let mut diff = load_diff(&args.input)?;
    if args.path.is_some() {
        diff.path.clone_from(&args.path);
    }
    let path = diff.path.clone();

    let (mut comments, mut drafts) = load_comment_files(&args, path.as_deref())?;
    if let Some(db_path) = &args.db_path {
        let (db_comments, db_drafts) = load_db_comments(db_path, &args, path.as_deref())?;
        extend(&mut comments, db_comments);
        extend(&mut drafts, db_drafts);
    }
    log::info!(
        "{}: {} hunks, {} comments, {} drafts",
        path.as_deref().unwrap_or("<unnamed>"),
        diff.hunks.len(),
        comments.len(),
        drafts.len()
    );

    let request = DiffRequest::new(diff, options)
        .with_comments(comments)
        .with_drafts(drafts);
    let (tx, rx) = mpsc::channel();
    let worker = spawn(request, move |model| {
        // The receiver outlives the worker; a send error only means main gave up.
        let _ = tx.send(model);
    })
    .context("Failed to start diff processor")?;
    let model = rx.recv().context("Diff processor stopped without a result")?;
    if worker.join().is_err() {
        anyhow::bail!("Diff processor panicked");
    }

    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &model).context("Failed to write JSON")?;
        writeln!(stdout)?;
        return Ok(());
    }

    let color = args
        .color
        .or(config.color)
        .unwrap_or_else(|| std::io::stdout().is_terminal());
    let colors = match args.colors.clone().or_else(|| config.colors_spec()) {
        Some(spec) => resolve_colors(&spec).with_context(|| format!("Failed to load colors: {spec}"))?,
        None => DiffColors::default(),
    };
    let highlighter = color.then(|| Highlighter::for_background(colors.background));
    let view = ViewOptions {
        mode: options.mode,
        color,
        colors,
        column_width: args.width.unwrap_or(60),
        path,
    };

    stdout.write_all(render_text(&model, &view, highlighter.as_ref()).as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn load_diff(input: &Path) -> Result<FileDiff> {
    let body = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read diff: {}", input.display()))?;
    let trimmed = body.trim_start();
    if trimmed.starts_with(gerrit_diff::diff::XSSI_PREFIX) || trimmed.starts_with('{') {
        let info = parse_diff_info(&body)
            .with_context(|| format!("Invalid diff JSON: {}", input.display()))?;
        Ok(FileDiff::from(info))
    } else {
        Ok(ParsedPatch::parse(&body).into_file_diff())
    }
}

fn read_comments(file: Option<&PathBuf>, path: Option<&str>) -> Result<Vec<CommentInfo>> {
    let Some(file) = file else {
        return Ok(Vec::new());
    };
    let body = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read comments: {}", file.display()))?;
    parse_comments(&body, path).with_context(|| format!("Invalid comments: {}", file.display()))
}

fn load_comment_files(args: &CliArgs, path: Option<&str>) -> Result<(CommentSet, CommentSet)> {
    let comments = CommentSet::new(
        read_comments(args.base_comments.as_ref(), path)?,
        read_comments(args.comments.as_ref(), path)?,
    );
    let drafts = CommentSet::new(
        read_comments(args.base_drafts.as_ref(), path)?,
        read_comments(args.drafts.as_ref(), path)?,
    );
    Ok((comments, drafts))
}

fn load_db_comments(
    db_path: &Path,
    args: &CliArgs,
    path: Option<&str>,
) -> Result<(CommentSet, CommentSet)> {
    let (Some(change), Some(patch_set)) = (args.change.as_deref(), args.patch_set) else {
        anyhow::bail!("--db requires --change and --patch-set");
    };
    let Some(path) = path else {
        anyhow::bail!("--db requires a file path (--path or one recorded in the diff)");
    };
    let db = CommentDb::open(db_path)?;
    let comments = db.load_comment_set(change, patch_set, args.base, path, false)?;
    let drafts = db.load_comment_set(change, patch_set, args.base, path, true)?;
    Ok((comments, drafts))
}

fn extend(target: &mut CommentSet, more: CommentSet) {
    target.old.extend(more.old);
    target.new.extend(more.new);
}

fn print_help() {
    println!("Usage: gerrit-diff [options] <diff.json|file.patch>");
    println!();
    println!("Options:");
    println!("  --unified              Unified layout");
    println!("  --side-by-side         Side-by-side layout (default)");
    println!("  --comments <file>      Comments on the revision (JSON)");
    println!("  --base-comments <file> Comments on the base side (JSON)");
    println!("  --drafts <file>        Drafts on the revision (JSON)");
    println!("  --base-drafts <file>   Drafts on the base side (JSON)");
    println!("  --db <path>            Load comments and drafts from a SQLite store");
    println!("  --change <id>          Change id for --db");
    println!("  --patch-set <n>        Patch set for --db");
    println!("  --base <n>             Base patch set for --db (default: parent)");
    println!("  --path <file>          File path (filters comments, picks syntax)");
    println!("  --context <n>          Context lines around changes and comments");
    println!("  --width <n>            Column width in side-by-side layout");
    println!("  --color / --no-color   Force colour output on or off");
    println!("  --colors <name|path>   Palette: dark, light, or a colours JSON file");
    println!("  --json                 Print the render model as JSON");
    println!();
    println!("Environment:");
    println!("  GERRIT_DIFF_COLORS     Palette name or colours JSON path");
    println!("  RUST_LOG               Log filter (e.g. gerrit_diff=debug)");
}

fn parse_args() -> Result<CliArgs> {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        input: PathBuf::new(),
        mode: None,
        comments: None,
        base_comments: None,
        drafts: None,
        base_drafts: None,
        db_path: None,
        change: None,
        patch_set: None,
        base: None,
        path: None,
        context: None,
        width: None,
        color: None,
        colors: None,
        json: false,
    };
    let mut input: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || -> Result<String> {
            i += 1;
            args.get(i)
                .cloned()
                .with_context(|| format!("{flag} requires a value"))
        };
        match flag {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--unified" => cli.mode = Some(LayoutMode::Unified),
            "--side-by-side" => cli.mode = Some(LayoutMode::SideBySide),
            "--comments" => cli.comments = Some(PathBuf::from(value()?)),
            "--base-comments" => cli.base_comments = Some(PathBuf::from(value()?)),
            "--drafts" => cli.drafts = Some(PathBuf::from(value()?)),
            "--base-drafts" => cli.base_drafts = Some(PathBuf::from(value()?)),
            "--db" => cli.db_path = Some(PathBuf::from(value()?)),
            "--change" => cli.change = Some(value()?),
            "--patch-set" => cli.patch_set = Some(parse_number(flag, &value()?)?),
            "--base" => cli.base = Some(parse_number(flag, &value()?)?),
            "--path" => cli.path = Some(value()?),
            "--context" => cli.context = Some(parse_number(flag, &value()?)?),
            "--width" => cli.width = Some(parse_number(flag, &value()?)?),
            "--color" => cli.color = Some(true),
            "--no-color" => cli.color = Some(false),
            "--colors" => cli.colors = Some(value()?),
            "--json" => cli.json = true,
            arg if arg.starts_with('-') => {
                anyhow::bail!("Unknown option: {arg}");
            }
            arg => {
                if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else {
                    anyhow::bail!("Unexpected argument: {arg}");
                }
            }
        }
        i += 1;
    }

    let Some(input) = input else {
        anyhow::bail!("Missing diff file (see --help)");
    };
    cli.input = input;
    Ok(cli)
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{flag} expects a number, got {value:?}"))
}
