use async_trait::async_trait;
use binlog_cdc::common::{
    ChangeEvent, EngineConfig, EngineHandler, EngineOutcome, FieldType, MemoryCatalog,
    MemoryStateStore, SchemaHistoryCache, SourceRecord, StreamConsumer, StreamPosition,
    TableSchema, TailingEngine,
};
/// Scripted Stream Example
///
/// Runs a stream session against an in-process engine that replays
/// JSON-encoded source records, one per line, and prints every change event
/// with the position it can be resumed from.
///
/// Run with:
/// ```
/// cargo run --example scripted_stream -- records.jsonl
/// ```
///
/// Without an argument a small built-in script is replayed.
use binlog_cdc::mariadb::{ReaderConfig, StreamSession};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const BUILTIN_SCRIPT: &str = r#"
{"partition":{"server":"demo"},"offset":{"file":"mysql-bin.000001","pos":154,"server_id":1},"value":{"op":"c","after":{"id":{"type":"int64","value":1},"created_at":{"type":"int64","value":1700000000000}},"source":{"ts_ms":1700000000000,"db":"shop","table":"orders"}}}
{"partition":{"server":"demo"},"offset":{"file":"mysql-bin.000001","pos":420,"server_id":1},"value":{"ddl":"ALTER TABLE orders ADD COLUMN note VARCHAR(64) NULL","source":{"ts_ms":1700000001000,"db":"shop"}}}
{"partition":{"server":"demo"},"offset":{"file":"mysql-bin.000001","pos":610,"server_id":1},"value":{"op":"d","before":{"id":{"type":"int64","value":1}},"source":{"ts_ms":1700000002000,"db":"shop","table":"orders"}}}
"#;

/// Engine that replays a fixed list of records.
struct ReplayEngine {
    records: std::sync::Mutex<Vec<SourceRecord>>,
    closed: CancellationToken,
}

#[async_trait]
impl TailingEngine for ReplayEngine {
    async fn run(&self, config: EngineConfig, handler: Arc<dyn EngineHandler>) {
        println!("Engine configured with {} properties", config.len());
        let records = std::mem::take(&mut *self.records.lock().unwrap());

        handler.on_started().await;
        for record in records {
            if self.closed.is_cancelled() {
                break;
            }
            if let Err(e) = handler.on_record(record).await {
                handler
                    .on_stopped(EngineOutcome::failed("Replay aborted", Some(e)))
                    .await;
                return;
            }
        }
        handler.on_stopped(EngineOutcome::completed("")).await;
    }

    async fn close(&self) -> binlog_cdc::Result<()> {
        self.closed.cancel();
        Ok(())
    }
}

struct PrintingConsumer;

#[async_trait]
impl StreamConsumer for PrintingConsumer {
    async fn stream_read_started(&self) {
        println!("Stream started");
    }

    async fn accept(&self, events: Vec<ChangeEvent>, position: StreamPosition) -> binlog_cdc::Result<()> {
        for event in events {
            println!("{} {} @ {}", event.op(), event.table(), position);
            println!("  {}", serde_json::to_string(&event)?);
        }
        Ok(())
    }

    async fn stream_read_ended(&self) {
        println!("Stream ended");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let script = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => BUILTIN_SCRIPT.to_string(),
    };
    let records = script
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str)
        .collect::<Result<Vec<SourceRecord>, _>>()?;

    let engine = Arc::new(ReplayEngine {
        records: std::sync::Mutex::new(records),
        closed: CancellationToken::new(),
    });
    let catalog = MemoryCatalog::new().with_table(
        TableSchema::new("orders")
            .with_field("id", FieldType::other("BIGINT"))
            .with_field("created_at", FieldType::datetime(0))
            .with_primary_key("id"),
    );
    let history = Arc::new(SchemaHistoryCache::new());

    let session = StreamSession::new(
        ReaderConfig::new("localhost", "cdc", "shop").with_password("secret"),
        engine,
        Arc::new(MemoryStateStore::new()),
        Arc::new(catalog),
        history.clone(),
    );

    session
        .start(&["orders".to_string()], None, 1000, Arc::new(PrintingConsumer))
        .await?;

    println!("\nSchema history:");
    for (table, statements) in history.snapshot() {
        println!("  {}: {:?}", table, statements);
    }
    Ok(())
}
