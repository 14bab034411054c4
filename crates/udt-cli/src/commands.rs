use std::fs;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use serde_json::Value;
use tracing::debug;
use udt_store::{DatasetManager, EventFilter, InMemoryDatasetManager, StoreConfig};
use udt_types::{DocumentDraft, SampleDraft, SampleId};

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Summary(args) => cmd_summary(config, args, cli.format).await,
        Command::Import(args) => cmd_import(config, args).await,
        Command::Get(args) => cmd_get(config, args, cli.format).await,
        Command::Set(args) => cmd_set(config, args).await,
        Command::Add(args) => cmd_add(config, args).await,
        Command::Remove(args) => cmd_remove(config, args).await,
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<StoreConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            Ok(StoreConfig::from_toml_str(&text)?)
        }
        None => Ok(StoreConfig::default()),
    }
}

/// Import `file` into a fresh in-memory store.
///
/// The import always runs on a writable loader so ids can be assigned. The
/// returned store carries `config`, so a read-only config still allows the
/// read commands and rejects the mutating ones.
async fn open(config: StoreConfig, file: &Path) -> anyhow::Result<InMemoryDatasetManager> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let draft = DocumentDraft::from_json(&text)
        .with_context(|| format!("parsing {}", file.display()))?;
    let loader = InMemoryDatasetManager::with_config(StoreConfig {
        writable: true,
        ..config.clone()
    })?;
    log_events(&loader);
    loader.set_dataset(draft).await?;
    if config.writable {
        return Ok(loader);
    }
    let store = InMemoryDatasetManager::with_document(config, loader.dataset().await?)?;
    log_events(&store);
    Ok(store)
}

fn log_events(store: &InMemoryDatasetManager) {
    store.on(EventFilter::all(), |event| debug!(%event, "dataset changed"));
}

async fn write_out(store: &InMemoryDatasetManager, output: Option<&Path>) -> anyhow::Result<()> {
    let doc = store.dataset().await?;
    let text = serde_json::to_string_pretty(&doc)?;
    match output {
        Some(path) => {
            fs::write(path, text + "\n").with_context(|| format!("writing {}", path.display()))?;
            println!("{} Wrote {}", "✓".green().bold(), path.display().to_string().bold());
        }
        None => println!("{text}"),
    }
    Ok(())
}

/// Parse a CLI value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

async fn cmd_summary(config: StoreConfig, args: SummaryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open(config, &args.file).await?;
    let summary = store.summary().await?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }
    for entry in &summary.samples {
        let status = if entry.has_annotation {
            "annotated".green()
        } else {
            "unannotated".dimmed()
        };
        println!("{}  {}", entry.id.to_string().yellow(), status);
    }
    println!(
        "{} samples, {} annotated",
        summary.len().to_string().bold(),
        summary.annotated().to_string().bold()
    );
    Ok(())
}

async fn cmd_import(config: StoreConfig, args: ImportArgs) -> anyhow::Result<()> {
    let store = open(config, &args.file).await?;
    write_out(&store, args.output.as_deref()).await
}

async fn cmd_get(config: StoreConfig, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open(config, &args.file).await?;
    match store.property(&args.key).await? {
        Some(value) if format == OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&value)?)
        }
        Some(Value::String(s)) => println!("{s}"),
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!("{} = (not set)", args.key.bold()),
    }
    Ok(())
}

async fn cmd_set(config: StoreConfig, args: SetArgs) -> anyhow::Result<()> {
    let store = open(config, &args.file).await?;
    store.set_property(&args.key, parse_value(&args.value)).await?;
    write_out(&store, args.output.as_deref()).await
}

async fn cmd_add(config: StoreConfig, args: AddArgs) -> anyhow::Result<()> {
    let store = open(config, &args.file).await?;
    let drafts = args
        .samples
        .iter()
        .map(|raw| serde_json::from_str::<SampleDraft>(raw).with_context(|| format!("parsing sample {raw}")))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let ids = store.add_samples(drafts).await?;
    for id in &ids {
        eprintln!("  {} {}", "added:".green(), id);
    }
    write_out(&store, args.output.as_deref()).await
}

async fn cmd_remove(config: StoreConfig, args: RemoveArgs) -> anyhow::Result<()> {
    let store = open(config, &args.file).await?;
    let ids: Vec<SampleId> = args.ids.iter().map(|id| SampleId::from(id.as_str())).collect();
    let before = store.snapshot().len();
    store.remove_samples(&ids).await?;
    eprintln!(
        "  {} {} sample(s)",
        "removed:".green(),
        before - store.snapshot().len()
    );
    write_out(&store, args.output.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use udt_types::Document;

    fn write_dataset(dir: &tempfile::TempDir, value: Value) -> std::path::PathBuf {
        let path = dir.path().join("dataset.json");
        fs::write(&path, serde_json::to_string(&value).unwrap()).unwrap();
        path
    }

    fn read_document(path: &Path) -> Document {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    async fn run(args: &[&str]) -> anyhow::Result<()> {
        let mut argv = vec!["udt"];
        argv.extend_from_slice(args);
        run_command(Cli::parse_from(argv)).await
    }

    #[test]
    fn parse_value_falls_back_to_string() {
        assert_eq!(parse_value("{\"a\": 1}"), json!({"a": 1}));
        assert_eq!(parse_value("42"), json!(42));
        assert_eq!(parse_value("Cats"), json!("Cats"));
    }

    #[tokio::test]
    async fn import_assigns_ids() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_dataset(&dir, json!({"samples": [{"imageUrl": "a"}, {"_id": "keep"}]}));
        let out = dir.path().join("out.json");

        run(&["import", input.to_str().unwrap(), "-o", out.to_str().unwrap()])
            .await
            .unwrap();
        let doc = read_document(&out);
        assert_eq!(doc.name, "New Dataset");
        assert_eq!(doc.len(), 2);
        assert!(!doc.samples[0].id.is_empty());
        assert_eq!(doc.samples[1].id.as_str(), "keep");
    }

    #[tokio::test]
    async fn set_merges_interface() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_dataset(&dir, json!({"interface": {"type": "image_classification"}}));
        let out = dir.path().join("out.json");

        run(&[
            "set",
            input.to_str().unwrap(),
            "interface",
            "{\"labels\": [\"cat\"]}",
            "-o",
            out.to_str().unwrap(),
        ])
        .await
        .unwrap();
        let doc = read_document(&out);
        assert_eq!(
            Value::Object(doc.interface),
            json!({"type": "image_classification", "labels": ["cat"]})
        );
    }

    #[tokio::test]
    async fn add_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_dataset(&dir, json!({"samples": [{"_id": "a"}, {"_id": "b"}]}));
        let out = dir.path().join("out.json");

        run(&["add", input.to_str().unwrap(), "{\"imageUrl\": \"c.png\"}", "-o", out.to_str().unwrap()])
            .await
            .unwrap();
        let doc = read_document(&out);
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.samples[2].extra["imageUrl"], json!("c.png"));

        run(&["remove", out.to_str().unwrap(), "a", "ghost", "-o", out.to_str().unwrap()])
            .await
            .unwrap();
        let doc = read_document(&out);
        let ids: Vec<&str> = doc.sample_ids().map(SampleId::as_str).collect();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], "b");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(run(&["summary", missing.to_str().unwrap()]).await.is_err());
    }

    #[tokio::test]
    async fn config_file_controls_id_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("udt.toml");
        fs::write(&config, "id_prefix = \"smp_\"\n").unwrap();
        let input = write_dataset(&dir, json!({"samples": [{}]}));
        let out = dir.path().join("out.json");

        run(&[
            "import",
            input.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ])
        .await
        .unwrap();
        let doc = read_document(&out);
        assert!(doc.samples[0].id.as_str().starts_with("smp_"));
    }

    #[tokio::test]
    async fn read_only_config_allows_reads_and_rejects_writes() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("udt.toml");
        fs::write(&config, "writable = false\n").unwrap();
        let input = write_dataset(&dir, json!({"name": "Pets", "samples": [{"_id": "a"}]}));
        let (input, config) = (input.to_str().unwrap(), config.to_str().unwrap());

        run(&["summary", input, "--config", config]).await.unwrap();
        run(&["get", input, "name", "--config", config]).await.unwrap();

        let err = run(&["set", input, "name", "Cats", "--config", config])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not writable"));
        let err = run(&["remove", input, "a", "--config", config])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not writable"));
    }

    #[tokio::test]
    async fn read_only_open_keeps_imported_ids() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_dataset(&dir, json!({"samples": [{"_id": "a"}, {"imageUrl": "b.png"}]}));

        let store = open(StoreConfig::read_only(), &input).await.unwrap();
        assert!(!store.is_writable().await.unwrap());
        let doc = store.dataset().await.unwrap();
        assert_eq!(doc.samples[0].id.as_str(), "a");
        assert!(!doc.samples[1].id.is_empty());
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn verbose_log_includes_import_events() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_dataset(&dir, json!({"samples": [{}]}));
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        open(StoreConfig::default(), &input).await.unwrap();

        let log = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(log.contains("dataset-reloaded"), "{log}");
        assert!(log.contains("summary-changed"), "{log}");
    }
}
