//! `postboard` command line

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use postboard_core::{logging, AppConfig, AppContext, PostEditor, SubmitOutcome, VERSION};
use postboard_gallery::{AssetDescriptor, GalleryReconciler};
use std::path::{Path, PathBuf};

/// 8-byte PNG signature
const DEMO_PNG: &str = "iVBORw0KGgo=";
/// JPEG SOI + JFIF marker
const DEMO_JPEG: &str = "/9j/4AAQSkZJRg==";

fn cli() -> Command {
    Command::new("postboard")
        .version(VERSION)
        .about("Post gallery editing against an in-memory backend")
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .subcommand(
            Command::new("demo")
                .about("Create a post, edit its gallery and print the saved post as JSON"),
        )
        .subcommand(
            Command::new("plan")
                .about("Print the save-time plan for an edit session")
                .arg(
                    Arg::new("existing")
                        .long("existing")
                        .value_delimiter(',')
                        .num_args(1..)
                        .help("Persisted image paths, in display order"),
                )
                .arg(
                    Arg::new("add")
                        .long("add")
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .value_parser(value_parser!(PathBuf))
                        .help("Local image files to add"),
                )
                .arg(
                    Arg::new("remove")
                        .long("remove")
                        .value_delimiter(',')
                        .num_args(1..)
                        .help("Persisted paths to mark for removal"),
                ),
        )
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();

    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => AppConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => AppConfig::default(),
    };
    logging::init(&config.log);

    match matches.subcommand() {
        Some(("demo", _)) => run_demo(config).await,
        Some(("plan", args)) => run_plan(args).await,
        _ => {
            cli().print_help()?;
            Ok(())
        }
    }
}

async fn run_demo(config: AppConfig) -> Result<()> {
    let ctx = AppContext::in_memory(config);
    let session = ctx
        .auth_store()
        .sign_up("demo@postboard.local", "demo-password", "demo")
        .await?;

    let mut editor = PostEditor::create(Some(&session), ctx.config().editor)?;
    editor.set_title("Weekend trip");
    editor.set_content("Two photos from the lake.");
    editor
        .gallery_mut()
        .add_assets(&[
            AssetDescriptor::new("demo://p1.png")
                .with_base64(DEMO_PNG)
                .with_mime_type("image/png"),
            AssetDescriptor::new("demo://p2.jpg").with_base64(DEMO_JPEG),
        ])
        .await;
    let SubmitOutcome::Navigate(post_id) = editor.submit(&ctx).await?;

    // Add one image, move it to the front, drop the old second image
    let mut editor = PostEditor::for_post(&ctx, post_id).await?;
    let gallery = editor.gallery_mut();
    let report = gallery
        .add_assets(&[AssetDescriptor::new("demo://n1.png")
            .with_base64(DEMO_PNG)
            .with_mime_type("image/png")])
        .await;
    if !report.is_complete() {
        bail!("demo asset failed to encode");
    }
    gallery.move_item(gallery.len() - 1, 0)?;
    let dropped = gallery
        .items()
        .iter()
        .filter_map(|item| item.path())
        .nth(1)
        .map(str::to_owned)
        .context("demo post lost its images")?;
    gallery.toggle_remove_existing(&dropped);

    println!("{}", serde_json::to_string_pretty(&gallery.reconcile())?);
    let SubmitOutcome::Navigate(post_id) = editor.submit(&ctx).await?;

    let post = ctx.load_post(post_id).await?;
    println!("{}", serde_json::to_string_pretty(&*post)?);
    Ok(())
}

async fn run_plan(args: &ArgMatches) -> Result<()> {
    let existing: Vec<String> = args
        .get_many::<String>("existing")
        .map(|paths| paths.cloned().collect())
        .unwrap_or_default();
    let assets: Vec<AssetDescriptor> = args
        .get_many::<PathBuf>("add")
        .map(|files| files.map(PathBuf::as_path).map(asset_for_path).collect())
        .unwrap_or_default();

    let mut gallery = GalleryReconciler::new();
    gallery.initialize(existing);
    let report = gallery.add_assets(&assets).await;
    for skipped in &report.skipped {
        eprintln!("skipped {}: {}", skipped.uri, skipped.error);
    }

    for path in args.get_many::<String>("remove").into_iter().flatten() {
        if !gallery.toggle_remove_existing(path) {
            bail!("'{path}' is not one of the existing images");
        }
    }

    println!("{}", serde_json::to_string_pretty(&gallery.reconcile())?);
    Ok(())
}

fn asset_for_path(path: &Path) -> AssetDescriptor {
    let asset = AssetDescriptor::new(path.display().to_string());
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let mime = match ext.as_deref() {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        Some("avif") => "image/avif",
        _ => return asset,
    };
    asset.with_mime_type(mime)
}
