use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

use anyhow::bail;
use burrow_coord::{CoordError, DeletePlan};
use burrow_paths::{composite_id, resolve, EntityKind};
use burrow_services::{Burrow, ServiceError};
use burrow_store::InMemoryDocumentStore;
use colored::Colorize;
use serde_json::json;
use tracing::debug;

use crate::cli::*;
use crate::config::BurrowConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        config,
        format,
        ..
    } = cli;
    match command {
        Command::Resolve(args) => cmd_resolve(args, format),
        Command::Kinds => cmd_kinds(format),
        Command::Compose(args) => cmd_compose(args, format),
        Command::Config => cmd_config(config.as_deref(), format),
        Command::Demo(args) => cmd_demo(args, config.as_deref(), format).await,
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_resolve(args: ResolveArgs, format: OutputFormat) -> anyhow::Result<()> {
    let kind: EntityKind = args.kind.parse()?;
    let key = resolve(kind, &args.ids)?;
    match format {
        OutputFormat::Text => {
            let shape = if key.is_document() { "document" } else { "collection" };
            println!("{}  {}", key.to_string().bold(), format!("({kind} {shape})").dimmed());
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({
            "kind": kind,
            "key": key,
            "document": key.is_document(),
        })),
    }
}

fn cmd_kinds(format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for kind in EntityKind::ALL {
                let marker = if kind.has_composite_id() { " (composite id)" } else { "" };
                println!(
                    "{:<12} {:<64} {}{}",
                    kind.name().yellow(),
                    kind.template(),
                    kind.arity(),
                    marker.dimmed()
                );
            }
            Ok(())
        }
        OutputFormat::Json => {
            let kinds: Vec<_> = EntityKind::ALL
                .iter()
                .map(|kind| {
                    json!({
                        "kind": kind,
                        "template": kind.template(),
                        "arity": kind.arity(),
                        "composite_id": kind.has_composite_id(),
                    })
                })
                .collect();
            print_json(&json!(kinds))
        }
    }
}

fn cmd_compose(args: ComposeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let id = composite_id(&args.first, &args.second)?;
    match format {
        OutputFormat::Text => {
            println!("{id}");
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({
            "id": id,
            "parts": [args.first, args.second],
        })),
    }
}

fn cmd_config(path: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let config = BurrowConfig::load(path)?;
    match format {
        OutputFormat::Text => print!("{}", toml::to_string_pretty(&config)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
    }
    Ok(())
}

fn step(format: OutputFormat, message: impl Display) {
    if format == OutputFormat::Text {
        println!("{} {}", "✓".green().bold(), message);
    }
}

async fn cmd_demo(args: DemoArgs, path: Option<&Path>, format: OutputFormat) -> anyhow::Result<()> {
    let config = BurrowConfig::load(path)?;
    debug!(?config, "demo configuration");
    let store = Arc::new(InMemoryDocumentStore::from_config(&config.store));
    let burrow = Burrow::new(store.clone(), config.coordinator.clone());

    let users = burrow.users();
    users.create_user("u1", "ada", "Ada").await?;
    users.create_user("u2", "bob", "Bob").await?;
    step(format, "created users ada and bob");

    let groups = burrow.groups();
    let group = groups
        .create_group("u1", "dogs", "Everything canine", &["huskies", "pets"])
        .await?;
    groups.join_group(&group.id, "u2").await?;
    step(format, format!("created group {} ({})", "dogs".yellow(), group.id.dimmed()));

    match groups.create_group("u2", "dogs", "", &[]).await {
        Err(ServiceError::Coord(CoordError::NameAlreadyInUse { name })) => {
            step(format, format!("second group named {} rejected", name.yellow()));
        }
        Err(other) => return Err(other.into()),
        Ok(_) => bail!("duplicate group name was accepted"),
    }

    let forums = burrow.forums();
    let forum = forums.create_forum(&group.id, "general", &["news"]).await?;
    for n in 0..args.messages {
        let author = if n % 2 == 0 { "u1" } else { "u2" };
        forums
            .post_message(&group.id, &forum.id, author, &format!("message {n}"))
            .await?;
    }
    step(format, format!("created forum general with {} messages", args.messages));

    groups.rename_group(&group.id, "wolves").await?;
    let tags = groups
        .update_group_tags(&group.id, &["wild"], &["pets"])
        .await?;
    let tag_list = tags.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    step(format, format!("renamed to {}, tags now [{tag_list}]", "wolves".yellow()));

    let plan = burrow
        .coordinator()
        .plan_delete(EntityKind::Group, &[group.id.as_str()])
        .await?;
    if format == OutputFormat::Text {
        print_plan(&plan);
    }

    let report = if args.dry_run {
        None
    } else {
        let report = burrow.coordinator().execute_delete(plan.clone()).await?;
        step(
            format,
            format!(
                "deleted {} documents in {} batch(es)",
                report.documents_deleted, report.batches
            ),
        );
        Some(report)
    };

    let remaining = store.len()?;
    match format {
        OutputFormat::Text => {
            println!("  {} documents remain in the store", remaining.to_string().bold());
            Ok(())
        }
        OutputFormat::Json => print_json(&json!({
            "group": group.id,
            "plan": plan,
            "report": report,
            "documents_remaining": remaining,
        })),
    }
}

fn print_plan(plan: &DeletePlan) {
    println!(
        "{} delete plan for {}: {} operations",
        "→".cyan().bold(),
        plan.root.to_string().bold(),
        plan.op_count()
    );
    for key in plan.descendants.iter().chain(std::iter::once(&plan.root)) {
        println!("    {} {}", "delete".red(), key);
    }
    if let Some(entry) = &plan.registry_entry {
        println!("    {} {}", "delete".red(), entry);
    }
    for index in &plan.tag_indexes {
        println!("    {} {}", "update".yellow(), index);
    }
}
