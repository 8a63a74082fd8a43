// FILE: crates/cli/src/commands.rs

use anyhow::{bail, Context, Result};
use clap::ArgMatches;
use console::style;
use restapis_config::Config;
use restapis_core::IndexRecord;
use restapis_list_sync::{EngineConfig, ListSyncEngine, MemoryIndexModel, OutboundSignal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const RECONCILE_WAIT: Duration = Duration::from_secs(2);

/// Options shared by every command
pub struct Session {
    data: PathBuf,
    page_size: usize,
    config: Config,
}

impl Session {
    pub fn new(data: PathBuf, page_size: usize, config: Config) -> Self {
        Self {
            data,
            page_size,
            config,
        }
    }

    /// Loads the data file into a memory store and fills the list from it
    async fn open(&self) -> Result<(ListSyncEngine, Arc<MemoryIndexModel>)> {
        let records = load_records(&self.data)?;
        log::debug!("Loaded {} records from {}", records.len(), self.data.display());

        let mut model = MemoryIndexModel::new(self.config.list.store_name.clone())
            .with_page_size(self.page_size)
            .with_records(records);
        let notifications = model.notifications();
        let model = Arc::new(model);

        let engine = ListSyncEngine::new(model.clone(), EngineConfig::from(&self.config.list));
        engine.listen(notifications);
        if !engine.first_display()? {
            engine.request_query()?;
        }
        engine.until_idle().await;

        Ok((engine, model))
    }
}

/// List every API in display order
pub async fn list_apis(session: &Session) -> Result<()> {
    let (engine, _model) = session.open().await?;
    let state = engine.state()?;

    if state.list_hidden() {
        println!("No APIs in the index. Add records to {}.", session.data.display());
        return Ok(());
    }

    let items = state.items().unwrap_or_default();
    println!("\n{} APIs", style(items.len()).bold().cyan());
    println!("{}", "=".repeat(80));
    for (index, record) in items.iter().enumerate() {
        print_record_summary(index, record);
    }

    engine.dispose();
    Ok(())
}

/// Filter the list by a query
pub async fn search_apis(session: &Session, matches: &ArgMatches) -> Result<()> {
    let query = matches
        .get_one::<String>("query")
        .ok_or_else(|| anyhow::anyhow!("Search query is required"))?;

    let (engine, _model) = session.open().await?;
    engine.set_query(query.as_str())?;
    engine.update_search()?;

    let state = engine.state()?;
    let results = state.items().unwrap_or_default();
    if results.is_empty() {
        println!("No APIs found matching '{}'", query);
        return Ok(());
    }

    println!("\n{} Search Results for '{}'", style(results.len()).bold().cyan(), query);
    println!("{}", "=".repeat(80));
    for (index, record) in results.iter().enumerate() {
        print_record_summary(index, record);
    }

    engine.dispose();
    Ok(())
}

/// Delete an API and write the remaining records back
pub async fn delete_api(session: &Session, matches: &ArgMatches) -> Result<()> {
    let id = matches
        .get_one::<String>("id")
        .ok_or_else(|| anyhow::anyhow!("API id is required"))?;
    let force = matches.get_flag("force");

    let (engine, model) = session.open().await?;
    let record = engine
        .state()?
        .items()
        .unwrap_or_default()
        .iter()
        .find(|r| &r.id == id)
        .cloned();
    let Some(record) = record else {
        bail!("API not found: {}", id);
    };

    if !force {
        println!("Are you sure you want to delete '{}'? (y/N)", display_title(&record));
        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read input")?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let mut changes = engine.changes();
    engine
        .delete_item(id)
        .await
        .context("Failed to delete API")?;

    // The list follows once the store reports the removal
    tokio::time::timeout(RECONCILE_WAIT, changes.changed())
        .await
        .context("Timed out waiting for the list to update")?
        .context("List engine stopped")?;

    save_records(&session.data, &model.records()?)?;
    println!(
        "{} API deleted: {} ({} remaining)",
        style("✓").green().bold(),
        display_title(&record),
        engine.state()?.len()
    );

    engine.dispose();
    Ok(())
}

/// Print the navigation request for the API at a list position
pub async fn open_api(session: &Session, matches: &ArgMatches) -> Result<()> {
    let index = matches
        .get_one::<usize>("index")
        .copied()
        .ok_or_else(|| anyhow::anyhow!("Index is required"))?;

    let (engine, _model) = session.open().await?;
    let mut signals = engine.subscribe();
    engine.open_record(index)?;

    print_signal(&signals.recv().await.context("No navigation request published")?)?;
    engine.dispose();
    Ok(())
}

/// Print the navigation request for the API catalog
pub async fn open_explore(session: &Session) -> Result<()> {
    let (engine, _model) = session.open().await?;
    let mut signals = engine.subscribe();
    engine.open_explore();

    print_signal(&signals.recv().await.context("No navigation request published")?)?;
    engine.dispose();
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<IndexRecord>> {
    if !path.exists() {
        log::info!("{} does not exist, starting with an empty index", path.display());
        return Ok(Vec::new());
    }
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&contents).with_context(|| format!("Invalid records in {}", path.display()))
}

fn save_records(path: &Path, records: &[IndexRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records).context("Failed to serialize records")?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn print_signal(signal: &OutboundSignal) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(signal).context("Failed to serialize navigation request")?
    );
    Ok(())
}

fn print_record_summary(index: usize, record: &IndexRecord) {
    print!(
        "{:>3}. {}  {}",
        index,
        style(display_title(record)).bold(),
        style(&record.id).dim()
    );
    if !record.latest_version.is_empty() {
        print!("  {}", style(&record.latest_version).yellow());
    }
    println!();
    if let Some(description) = &record.description {
        println!("     {}", truncate(description, 72));
    }
}

fn display_title(record: &IndexRecord) -> &str {
    record.title.as_deref().unwrap_or("(untitled)")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("12345678", 8), "12345678");
        assert_eq!(truncate("123456789", 8), "12345678...");
        assert_eq!(truncate("żółw żółw", 4), "żółw...");
    }

    #[test]
    fn test_display_title() {
        assert_eq!(display_title(&IndexRecord::new("a", 0)), "(untitled)");
        assert_eq!(display_title(&IndexRecord::new("a", 0).with_title("Pets")), "Pets");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let records = load_records(&dir.path().join("missing.json")).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_load_datastore_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apis.json");
        std::fs::write(
            &path,
            r#"[{"_id": "pets", "title": "Petstore", "order": 1, "latest": "v2", "versions": ["v1", "v2"]}]"#,
        )
        .unwrap();

        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "pets");
        assert_eq!(records[0].latest_version, "v2");
    }

    #[test]
    fn test_load_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apis.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_records(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apis.json");
        let records = vec![IndexRecord::new("maps", 0).with_title("Maps").with_version("v1")];

        save_records(&path, &records).unwrap();
        assert_eq!(load_records(&path).unwrap(), records);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_loads_sorted_list() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("apis.json");
        save_records(
            &path,
            &[
                IndexRecord::new("pets", 1).with_title("Petstore"),
                IndexRecord::new("maps", 0).with_title("Maps"),
                IndexRecord::new("pay", 1).with_title("Payments"),
            ],
        )
        .unwrap();

        let session = Session::new(path, 2, Config::default());
        let (engine, model) = session.open().await.unwrap();
        let ids: Vec<_> = engine
            .state()
            .unwrap()
            .items()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect();

        assert_eq!(ids, vec!["maps", "pay", "pets"]);
        assert_eq!(model.list_calls(), 2);
    }
}
