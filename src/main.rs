use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{info, warn};

use schema_workbench::annotation::visible_sources::{self, VisibleSourcesKind};
use schema_workbench::annotation::{resolve_source, tags, ContextDocument, ContextShape};
use schema_workbench::browser::{self, EditorView, SelectedItem};
use schema_workbench::config::WorkbenchConfig;
use schema_workbench::session::LocalCatalogSession;
use schema_workbench::tasks::{TaskResult, TaskRunner, TaskStatus};
use schema_workbench::{logging, validate_catalog, CatalogModel, ObjectRef, TableRef, ValidateOptions};

#[derive(Parser)]
#[command(name = "schema-workbench")]
#[command(author, version, about = "Browse and edit catalog schema annotations")]
struct Cli {
    /// Path to the catalog schema document
    #[arg(short, long, global = true, default_value = "catalog.json")]
    catalog: PathBuf,

    /// Path to the workbench configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Server host to select from the configuration
    #[arg(long, global = true)]
    host: Option<String>,

    /// Catalog id to select from the configuration
    #[arg(long, global = true)]
    catalog_id: Option<String>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListTag {
    VisibleColumns,
    VisibleForeignKeys,
}

impl From<ListTag> for VisibleSourcesKind {
    fn from(tag: ListTag) -> Self {
        match tag {
            ListTag::VisibleColumns => VisibleSourcesKind::Columns,
            ListTag::VisibleForeignKeys => VisibleSourcesKind::ForeignKeys,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Print the object tree with the annotations present on each object
    Tree,

    /// Show an object, or one of its annotations
    Show {
        /// Object spec: `/`, `schema`, `schema:table`, `schema:table.column`,
        /// `schema:table/key/s:name` or `schema:table/fkey/s:name`
        object: String,

        /// Annotation tag, full or short name (`visible-columns`)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Validate annotations of one object, or of the whole catalog
    Validate { object: Option<String> },

    /// Resolve a source path (JSON) against a table
    Resolve {
        /// Table spec `schema:table`
        table: String,
        source: String,
    },

    /// List the contexts and entries of a visible-sources annotation
    Contexts {
        table: String,
        #[arg(short, long, value_enum, default_value = "visible-columns")]
        tag: ListTag,
    },

    /// Create an empty context
    AddContext {
        table: String,
        context: String,
        #[arg(short, long, value_enum, default_value = "visible-columns")]
        tag: ListTag,
    },

    /// Remove a context and all of its entries
    RemoveContext {
        table: String,
        context: String,
        #[arg(short, long, value_enum, default_value = "visible-columns")]
        tag: ListTag,
    },

    /// Append an entry (JSON, or a bare column name) to a context
    Append {
        table: String,
        context: String,
        entry: String,
        #[arg(short, long, value_enum, default_value = "visible-columns")]
        tag: ListTag,
    },
}

fn parse_table(spec: &str) -> Result<TableRef> {
    match spec.parse::<ObjectRef>()? {
        ObjectRef::Table(table) => Ok(table),
        other => bail!("{} is not a table", other),
    }
}

/// A JSON argument, falling back to a plain string
fn parse_json_arg(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Run one task to completion and return its status
async fn run_task<F>(issue: F) -> Result<TaskStatus>
where
    F: FnOnce(Box<dyn FnOnce(TaskStatus) + Send>) -> Result<(), schema_workbench::WorkbenchError>,
{
    let (tx, rx) = oneshot::channel();
    issue(Box::new(move |status| {
        let _ = tx.send(status);
    }))?;
    rx.await.context("Task ended without reporting")
}

async fn fetch(runner: &TaskRunner) -> Result<CatalogModel> {
    let status = run_task(|done| runner.fetch(done).map(|_| ())).await?;
    match status.result {
        Some(TaskResult::Model(model)) if status.success => Ok(*model),
        _ => bail!("{}: {}", status.status, status.detail),
    }
}

async fn apply(runner: &TaskRunner, model: CatalogModel) -> Result<()> {
    let status = run_task(|done| runner.apply(model, done).map(|_| ())).await?;
    if !status.success {
        bail!("{}: {}", status.status, status.detail);
    }
    info!("{}", status.status);
    Ok(())
}

fn print_contexts(model: &CatalogModel, table: &TableRef, kind: VisibleSourcesKind) -> Result<()> {
    let store = model.annotations(&ObjectRef::Table(table.clone()))?;
    let Some(mut body) = store.get(kind.tag()).cloned() else {
        println!("{} has no {} annotation", table, tags::short_name(kind.tag()));
        return Ok(());
    };
    let names = ContextDocument::from_value(&mut body, ContextShape::Entries)?.names();
    for name in names {
        println!("{}", name);
        match visible_sources::rows(model, table, kind, &name) {
            Ok(rows) => {
                for row in rows {
                    println!("  {:>3}  {:<10}  {}", row.index, row.type_label(), row.source);
                }
            }
            Err(e) => println!("  ({})", e),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => WorkbenchConfig::load(path)?,
        None => WorkbenchConfig::default(),
    };
    logging::init(cli.verbose || config.debug);
    if let Some(server) = config.select_server(cli.host.as_deref(), cli.catalog_id.as_deref()) {
        info!("Using server {}", server.display_name());
    }

    let session = Arc::new(LocalCatalogSession::new(&cli.catalog));
    let runner = TaskRunner::current(session);

    match cli.command {
        Commands::Tree => {
            let model = fetch(&runner).await?;
            print!("{}", browser::tree(&model).render());
        }
        Commands::Show { object, tag } => {
            let model = fetch(&runner).await?;
            let object: ObjectRef = object.parse()?;
            let tag = tag.map(|t| tags::expand(&t).map(str::to_string).unwrap_or(t));
            let selected = SelectedItem {
                object: object.clone(),
                tag,
            };
            match browser::editor_view(&selected) {
                EditorView::ObjectJson(object) => {
                    let value = model.object_json(&object)?;
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
                EditorView::Dedicated { object, kind } => match (
                    object.table(),
                    VisibleSourcesKind::from_tag(kind.tag()),
                ) {
                    (Some(table), Some(list)) if matches!(object, ObjectRef::Table(_)) => {
                        print_contexts(&model, table, list)?;
                    }
                    _ => print_body(&model, &object, kind.tag())?,
                },
                EditorView::GenericJson { object, tag } => print_body(&model, &object, &tag)?,
            }
        }
        Commands::Validate { object } => {
            let object = object.map(|o| o.parse::<ObjectRef>()).transpose()?;
            let diagnostics = match object {
                Some(object) => {
                    let model = fetch(&runner).await?;
                    let status =
                        run_task(|done| runner.validate(model, object, done).map(|_| ())).await?;
                    match status.result {
                        Some(TaskResult::Diagnostics(diagnostics)) => diagnostics,
                        _ => bail!("{}: {}", status.status, status.detail),
                    }
                }
                None => validate_catalog(ValidateOptions {
                    catalog_path: cli.catalog.clone(),
                    object: None,
                })?,
            };
            for diagnostic in &diagnostics {
                println!("{}", diagnostic);
            }
            println!("Found {} error(s)", diagnostics.len());
        }
        Commands::Resolve { table, source } => {
            let model = fetch(&runner).await?;
            let table = parse_table(&table)?;
            let resolution = resolve_source(&model, &table, &parse_json_arg(&source))?;
            for (i, frame) in resolution.frames.iter().enumerate() {
                println!("{:>3}  {}", i, frame);
            }
            println!("path: {}", resolution.path.to_value());
            if let Some(e) = &resolution.error {
                println!("truncated: {}", e);
            }
        }
        Commands::Contexts { table, tag } => {
            let model = fetch(&runner).await?;
            print_contexts(&model, &parse_table(&table)?, tag.into())?;
        }
        Commands::AddContext {
            table,
            context,
            tag,
        } => {
            let mut model = fetch(&runner).await?;
            visible_sources::create_context(&mut model, &parse_table(&table)?, tag.into(), &context)?;
            apply(&runner, model).await?;
        }
        Commands::RemoveContext {
            table,
            context,
            tag,
        } => {
            let mut model = fetch(&runner).await?;
            visible_sources::remove_context(&mut model, &parse_table(&table)?, tag.into(), &context)?;
            apply(&runner, model).await?;
        }
        Commands::Append {
            table,
            context,
            entry,
            tag,
        } => {
            let mut model = fetch(&runner).await?;
            let (index, truncated) = visible_sources::append_entry(
                &mut model,
                &parse_table(&table)?,
                tag.into(),
                &context,
                &parse_json_arg(&entry),
            )?;
            if let Some(e) = truncated {
                warn!("Source truncated to its valid prefix: {}", e);
            }
            info!("Appended entry {} to {}", index, context);
            apply(&runner, model).await?;
        }
    }

    Ok(())
}

fn print_body(model: &CatalogModel, object: &ObjectRef, tag: &str) -> Result<()> {
    match model.annotations(object)?.get(tag) {
        Some(body) => println!("{}", serde_json::to_string_pretty(body)?),
        None => println!("{} has no {} annotation", object, tags::short_name(tag)),
    }
    Ok(())
}
