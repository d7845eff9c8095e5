//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat, PartitionArgs};
use crate::config::ConnectorConfig;
use crate::error::{Error, Result, ResultExt};
use crate::feeds::{Extractor, FeedDescriptor, FeedRegistry, Slicing};
use crate::normalize::{page_info, Normalizer};
use crate::output::{write_records_to_parquet, Message, MessageWriter};
use crate::partition::{
    parse_vendor_date, ListRouter, PartitionRouter, PartitionValue, WorkerDayRouter,
    WorkerRouter, AS_OF_FIELD, DATE_FORMAT, SUBCATEGORY_FIELD, WORKER_ID_FIELD,
};
use crate::sink::LocalDirPhotoSink;
use crate::state::{StateManager, WorkerCheckpoints};
use crate::template::{RequestParams, RequestTemplates};
use crate::types::{RawResponse, Record};
use chrono::{NaiveDate, Utc};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Partitions still to fetch, with the checkpoints that follow them
struct PartitionListing {
    pending: Vec<PartitionValue>,
    checkpoints: Option<WorkerCheckpoints>,
    state: StateManager,
}

/// CLI runner
pub struct Runner {
    cli: Cli,
    registry: FeedRegistry,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self {
            cli,
            registry: FeedRegistry::new(),
        }
    }

    /// Run the CLI command
    pub fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Feeds => self.feeds(),
            Commands::Request { feed, params, page } => self.request(feed, params, *page),
            Commands::Normalize {
                feed,
                response,
                status,
                params,
                output,
                photo_dir,
            } => self.normalize(
                feed,
                response,
                *status,
                params,
                output.as_deref(),
                photo_dir.as_deref(),
            ),
            Commands::Partitions {
                feed,
                workers,
                today,
                resume,
            } => self.partitions(feed, workers.as_deref(), today.as_deref(), *resume),
        }
    }

    /// Load configuration (required)
    fn load_config(&self) -> Result<ConnectorConfig> {
        let path = self
            .cli
            .config
            .as_ref()
            .ok_or_else(|| Error::config("Config file not specified (use -C flag)"))?;
        ConnectorConfig::from_file(path)
    }

    /// Load configuration if one was given
    fn optional_config(&self) -> Result<Option<ConnectorConfig>> {
        self.cli
            .config
            .as_ref()
            .map(ConnectorConfig::from_file)
            .transpose()
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        match &self.cli.state {
            Some(path) => StateManager::from_file(path),
            None => Ok(StateManager::in_memory()),
        }
    }

    /// List the dispatch table
    fn feeds(&self) -> Result<()> {
        let feeds: Vec<Value> = self
            .registry
            .iter()
            .map(|feed| {
                json!({
                    "name": feed.name,
                    "request_template": feed.request_template,
                    "extractor": extractor_kind(feed),
                    "slicing": slicing_name(feed.slicing),
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "FEEDS",
            "feeds": feeds
        }));
        Ok(())
    }

    /// Build one request envelope
    fn request(&self, feed: &str, args: &PartitionArgs, page: u32) -> Result<()> {
        let config = self.load_config()?;
        let descriptor = self.registry.get(feed)?;

        let Some(template) = descriptor.request_template else {
            let url = config
                .report_url(feed)?
                .ok_or_else(|| Error::missing_field(feed))?;
            self.output_message(&json!({
                "type": "REQUEST",
                "feed": feed,
                "method": "GET",
                "url": url.as_str(),
            }));
            return Ok(());
        };

        let templates = match &config.template_dir {
            Some(dir) => RequestTemplates::from_dir(dir)?,
            None => RequestTemplates::builtin(),
        };
        let params = RequestParams::new(page, config.per_page)
            .with_partition(&partition_value(args)?)?;
        let body = templates.build_request(template, &config.credentials(), &params)?;

        self.output_message(&json!({
            "type": "REQUEST",
            "feed": feed,
            "method": "POST",
            "url": config.endpoint()?.as_str(),
            "body": body,
        }));
        Ok(())
    }

    /// Normalize a saved response
    fn normalize(
        &self,
        feed: &str,
        response_path: &Path,
        status: u16,
        args: &PartitionArgs,
        output: Option<&Path>,
        photo_dir: Option<&Path>,
    ) -> Result<()> {
        let descriptor = self.registry.get(feed)?;
        let body = fs::read(response_path).with_context(|| {
            format!("Failed to read response file '{}'", response_path.display())
        })?;
        let response = RawResponse::new(status, body);

        let mut normalizer = Normalizer::new();
        let photo_dir = match photo_dir {
            Some(dir) => Some(dir.to_path_buf()),
            None => self.optional_config()?.and_then(|c| c.photo_dir),
        };
        if let Some(dir) = photo_dir {
            normalizer = normalizer.with_photo_sink(LocalDirPhotoSink::new(dir));
        }

        let mut state = self.load_state()?;
        let partition = (!args.is_empty()).then(|| partition_value(args)).transpose()?;
        let records = match &partition {
            Some(partition) => normalizer.normalize_partition(feed, &response, partition)?,
            None => normalizer.normalize(feed, &response)?,
        };

        let mut last_page = true;
        if matches!(descriptor.extractor, Extractor::Xml(_)) {
            if let Some(paging) = page_info(&response)? {
                info!(
                    feed,
                    page = ?paging.page,
                    total_pages = ?paging.total_pages,
                    next_page = ?paging.next_page(),
                    "Page info"
                );
                last_page = !paging.has_next_page();
            }
        }

        // A partition only counts as fetched once its last page is in
        if let Some(partition) = partition.filter(|_| last_page) {
            state.mark_partition_completed(feed, &partition.id)?;
            if descriptor.slicing == Slicing::WorkerDays {
                commit_slice(&mut state, feed, &partition)?;
            }
        }

        match self.cli.format {
            OutputFormat::Parquet => {
                let path = output.ok_or_else(|| {
                    Error::config("Parquet output requires a file (use --output)")
                })?;
                if records.is_empty() {
                    info!(feed, "No records, Parquet file not written");
                } else {
                    let rows = write_records_to_parquet(path, &records, None)?;
                    info!(feed, rows, path = %path.display(), "Wrote Parquet file");
                }
            }
            OutputFormat::Json => {
                let stdout = std::io::stdout();
                let mut writer = MessageWriter::new(stdout.lock());
                writer.write_records(feed, records)?;
                if self.cli.state.is_some() {
                    writer.write(&Message::state(serde_json::to_value(state.state())?))?;
                }
                drop(writer.into_inner()?);
            }
            OutputFormat::Pretty => {
                for record in records {
                    self.output_message(&Value::Object(record));
                }
            }
        }
        Ok(())
    }

    /// List the sub-requests of a feed
    fn partitions(
        &self,
        feed: &str,
        workers: Option<&Path>,
        today: Option<&str>,
        resume: bool,
    ) -> Result<()> {
        let listing = self.list_partitions(feed, workers, today, resume)?;

        let mut message = json!({
            "type": "PARTITIONS",
            "feed": feed,
            "partitions": listing.pending,
        });
        if let Some(checkpoints) = &listing.checkpoints {
            message["checkpoints"] = serde_json::to_value(checkpoints)?;
        }
        self.output_message(&message);
        if self.cli.state.is_some() {
            self.output_message(&json!({
                "type": "STATE",
                "state": listing.state.state(),
            }));
        }
        Ok(())
    }

    /// Re-derive a feed's full partition set
    ///
    /// Without `resume` this starts a new run, forgetting which partitions
    /// the previous run fetched. Worker-day checkpoints are only read here;
    /// `normalize` advances them as slices are fetched.
    fn list_partitions(
        &self,
        feed: &str,
        workers: Option<&Path>,
        today: Option<&str>,
        resume: bool,
    ) -> Result<PartitionListing> {
        let descriptor = self.registry.get(feed)?;
        let mut state = self.load_state()?;
        if !resume {
            state.clear_completed_partitions(feed)?;
        }

        let mut checkpoints = None;
        let partitions = match descriptor.slicing {
            Slicing::None => Vec::new(),
            Slicing::ReferenceCategories => ListRouter::reference_categories().partitions()?,
            Slicing::Workers => {
                let records = read_records(require_workers(workers)?)?;
                WorkerRouter::from_records(&records).partitions()?
            }
            Slicing::WorkerDays => {
                let records = read_records(require_workers(workers)?)?;
                let today = match today {
                    Some(day) => NaiveDate::parse_from_str(day, DATE_FORMAT)
                        .map_err(|e| Error::invalid_value("today", format!("'{day}': {e}")))?,
                    None => Utc::now().date_naive(),
                };

                let expansion =
                    WorkerDayRouter::from_records(&records, state.checkpoints(feed), today)
                        .expand();
                checkpoints = Some(expansion.checkpoints);
                expansion.slices.iter().map(|s| s.to_partition()).collect()
            }
        };

        let pending: Vec<PartitionValue> = partitions
            .into_iter()
            .filter(|p| !state.is_partition_completed(feed, &p.id))
            .collect();
        debug!(feed, partitions = pending.len(), resume, "Listed partitions");

        Ok(PartitionListing {
            pending,
            checkpoints,
            state,
        })
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        let line = match self.cli.format {
            OutputFormat::Json | OutputFormat::Parquet => serde_json::to_string(msg),
            OutputFormat::Pretty => serde_json::to_string_pretty(msg),
        };
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{}", line.unwrap_or_default());
    }
}

fn extractor_kind(feed: &FeedDescriptor) -> &'static str {
    match feed.extractor {
        Extractor::Xml(_) => "xml",
        Extractor::Raw(_) => "raw",
    }
}

fn slicing_name(slicing: Slicing) -> &'static str {
    match slicing {
        Slicing::None => "none",
        Slicing::Workers => "workers",
        Slicing::ReferenceCategories => "reference_categories",
        Slicing::WorkerDays => "worker_days",
    }
}

/// Advance a worker's checkpoint past a fetched worker-day slice
fn commit_slice(state: &mut StateManager, feed: &str, partition: &PartitionValue) -> Result<()> {
    let (Some(worker_id), Some(as_of)) = (
        partition.get_string(WORKER_ID_FIELD),
        partition.get_string(AS_OF_FIELD),
    ) else {
        return Ok(());
    };
    let as_of = NaiveDate::parse_from_str(as_of, DATE_FORMAT)
        .map_err(|e| Error::invalid_value(AS_OF_FIELD, format!("'{as_of}': {e}")))?;
    state.advance_checkpoint(feed, worker_id, as_of)?;
    Ok(())
}

fn require_workers(path: Option<&Path>) -> Result<&Path> {
    path.ok_or_else(|| Error::config("This feed fans out per worker (use --workers)"))
}

/// Build a partition from command-line values
fn partition_value(args: &PartitionArgs) -> Result<PartitionValue> {
    let mut parts = Vec::new();
    let mut partition = PartitionValue::new("");

    if let Some(worker_id) = &args.worker_id {
        parts.push(worker_id.clone());
        partition = partition.with_string(WORKER_ID_FIELD, worker_id);
    }
    if let Some(as_of) = &args.as_of {
        let date = parse_vendor_date(as_of)?.format(DATE_FORMAT).to_string();
        parts.push(date.clone());
        partition = partition.with_string(AS_OF_FIELD, date);
    }
    if let Some(category) = &args.subcategory {
        parts.push(category.clone());
        partition = partition.with_string(SUBCATEGORY_FIELD, category);
    }

    partition.id = parts.join("_");
    Ok(partition)
}

/// Read records from a JSON array, JSON lines, or `RECORD` message lines
fn read_records(path: &Path) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read records file '{}'", path.display()))?;
    parse_records(&content)
}

fn parse_records(content: &str) -> Result<Vec<Record>> {
    if content.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(content)?);
    }

    let mut records = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let value: Value = serde_json::from_str(line)?;
        let record = match value.get("type").and_then(Value::as_str) {
            Some("RECORD") => value.pointer("/record/data").cloned(),
            Some(_) => continue,
            None => Some(value),
        };
        match record {
            Some(Value::Object(record)) => records.push(record),
            _ => return Err(Error::config(format!("Not a record: {line}"))),
        }
    }
    Ok(records)
}
