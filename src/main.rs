use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use guidebase::cli::{ChecklistCommand, Cli, Command, DbArgs, ExtractArgs, ItemArgs};
use guidebase::config::ExtractionConfig;
use guidebase::extraction::ExtractionClient;
use guidebase::schema::ContentKind;
use guidebase::store::Store;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    guidebase::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        Command::Extract(args) => run_extract(args).await.context("extract")?,
        Command::List(args) => run_list(args).context("list")?,
        Command::Show(args) => run_show(args).context("show")?,
        Command::Delete(args) => run_delete(args).context("delete")?,
        Command::ExportSeed(args) => run_export_seed(args).context("export seed")?,
        Command::Checklist { command } => match command {
            ChecklistCommand::Add(args) => run_checklist_add(args).context("checklist add")?,
            ChecklistCommand::Show(args) => run_checklist_show(args).context("checklist show")?,
            ChecklistCommand::Clear(args) => run_checklist_clear(args).context("checklist clear")?,
        },
    }

    Ok(())
}

fn parse_kind(raw: &str) -> anyhow::Result<ContentKind> {
    ContentKind::parse(raw)
        .ok_or_else(|| anyhow::anyhow!("unsupported kind {raw:?}: expected tutorial or recipe"))
}

async fn run_extract(args: ExtractArgs) -> anyhow::Result<()> {
    let kind = parse_kind(&args.kind)?;
    let config = ExtractionConfig::from_env().context("load extraction service config")?;
    let client = ExtractionClient::new(config)?;

    let mut item = client.extract(&args.url, kind).await?;
    if item.source_url.is_none() {
        item.source_url = Some(args.url.trim().to_string());
    }

    let store = Store::open(&args.db.db)?;
    let id = store.save(&item)?;

    tracing::info!(item_id = %id, title = %item.title, "stored extracted item");
    println!("{id}");
    Ok(())
}

fn run_list(args: DbArgs) -> anyhow::Result<()> {
    let store = Store::open(&args.db)?;
    for summary in store.list()? {
        println!(
            "{}  {:8}  {}",
            summary.id,
            summary.kind.as_str(),
            summary.title
        );
    }
    Ok(())
}

fn run_show(args: ItemArgs) -> anyhow::Result<()> {
    let store = Store::open(&args.db.db)?;
    let item = store
        .load(&args.id)?
        .ok_or_else(|| anyhow::anyhow!("content item not found: {}", args.id))?;
    let json = serde_json::to_string_pretty(&item).context("serialize content item")?;
    println!("{json}");
    Ok(())
}

fn run_delete(args: ItemArgs) -> anyhow::Result<()> {
    let store = Store::open(&args.db.db)?;
    if !store.delete(&args.id)? {
        anyhow::bail!("content item not found: {}", args.id);
    }
    println!("deleted {}", args.id);
    Ok(())
}

fn run_export_seed(args: ItemArgs) -> anyhow::Result<()> {
    let store = Store::open(&args.db.db)?;
    let sql = guidebase::export::seed_sql(&store, &args.id)?
        .ok_or_else(|| anyhow::anyhow!("content item not found: {}", args.id))?;
    print!("{sql}");
    Ok(())
}

fn run_checklist_add(args: ItemArgs) -> anyhow::Result<()> {
    let store = Store::open(&args.db.db)?;
    let copied = store
        .add_item_to_checklist(&args.id)?
        .ok_or_else(|| anyhow::anyhow!("content item not found: {}", args.id))?;
    println!("copied {copied} entries to the checklist");
    Ok(())
}

fn run_checklist_show(args: DbArgs) -> anyhow::Result<()> {
    let store = Store::open(&args.db)?;
    for entry in store.checklist()? {
        let mark = if entry.checked { 'x' } else { ' ' };
        let mut line = format!("[{mark}] {}", entry.name);
        if let Some(quantity) = &entry.quantity {
            line.push_str(&format!(" ({quantity}"));
            if let Some(unit) = &entry.unit {
                line.push_str(&format!(" {unit}"));
            }
            line.push(')');
        }
        if let Some(notes) = &entry.notes {
            line.push_str(&format!(" - {notes}"));
        }
        println!("{line}");
    }
    Ok(())
}

fn run_checklist_clear(args: DbArgs) -> anyhow::Result<()> {
    let store = Store::open(&args.db)?;
    store.clear_checklist()?;
    println!("checklist cleared");
    Ok(())
}
