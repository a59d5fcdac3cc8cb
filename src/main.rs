use std::env;
use std::io;
use std::process;

use arb_ledger::clipboard::{CopyPath, FileClipboard, WriterCopy, copy_text};
use arb_ledger::csv::read_requests;
use arb_ledger::history::{EXPORT_SEPARATOR, History, summary_line};
use arb_ledger::model::{
    Calculation, Category, DepositSplit, DistributionSplit, WithdrawalSplit, XrpSettlement,
};
use arb_ledger::store::DEFAULT_LIST_LIMIT;
use arb_ledger::{Engine, FileStorage, RecordStore, Render};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage:
  arb-ledger <store-dir> <requests.csv>
  arb-ledger <store-dir> history <category> [limit]
  arb-ledger <store-dir> delete <category> <id>...
  arb-ledger <store-dir> export <category> <id>...

a request file named history, delete or export is read as a command;
pass it with a directory, as in ./history";

const CLIPBOARD_FILE: &str = "clipboard.txt";

/// Call `$f::<T>(args)` with `T` the record type of `$category`.
macro_rules! with_record_type {
    ($category:expr, $f:ident($($arg:expr),*)) => {
        match $category {
            Category::Xrp => $f::<XrpSettlement>($($arg),*),
            Category::Deposit => $f::<DepositSplit>($($arg),*),
            Category::Withdrawal => $f::<WithdrawalSplit>($($arg),*),
            Category::Distribution => $f::<DistributionSplit>($($arg),*),
        }
    };
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let [store_dir, command, rest @ ..] = args.as_slice() else {
        usage();
    };

    let storage = FileStorage::open(store_dir).unwrap_or_else(|e| {
        error!("failed to open store directory: {e}");
        process::exit(1);
    });

    match command.as_str() {
        "history" | "delete" | "export" => {
            let Some((category, ids)) = rest.split_first() else {
                usage();
            };
            let category: Category = category.parse().unwrap_or_else(|e| {
                error!("{e}");
                usage();
            });
            let mut store = RecordStore::new(storage);

            match command.as_str() {
                "history" => {
                    let limit = match ids.first().map(|limit| limit.parse::<usize>()) {
                        None => DEFAULT_LIST_LIMIT,
                        Some(Ok(limit)) => limit,
                        Some(Err(_)) => usage(),
                    };
                    with_record_type!(category, print_history(&mut store, limit));
                }
                "delete" => {
                    let removed = History::new(&mut store).remove_selected(category, ids);
                    println!("removed {removed} of {} {category} records", ids.len());
                }
                _ => {
                    let text = with_record_type!(category, export_text(&mut store, ids));
                    export(&store, category, &text).await;
                }
            }
        }
        path => calculate(storage, path).await,
    }
}

fn usage() -> ! {
    eprintln!("{USAGE}");
    process::exit(2);
}

/// Run every request of a csv file, printing the reports to stdout.
async fn calculate(storage: FileStorage, path: &str) {
    if !path.ends_with(".csv") {
        warn!(path, "input file seems to not be a csv file");
    }

    let requests = read_requests(path.to_string()).unwrap_or_else(|e| {
        error!("{e}");
        process::exit(1);
    });

    let mut engine = Engine::new(storage);
    let (request_sender, request_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in requests {
            match result {
                Ok(request) => {
                    if request_sender.send(request).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    engine
        .run(ReceiverStream::new(request_receiver), |outcome| match outcome {
            Ok(report) => println!("{report}\n"),
            Err(e) => warn!("{e}"),
        })
        .await;
}

fn print_history<T: Calculation + Render>(store: &mut RecordStore<FileStorage>, limit: usize) {
    let records = History::new(store).list::<T>(limit);
    if records.is_empty() {
        println!("no {} records", T::CATEGORY);
        return;
    }

    for record in &records {
        println!("{}\n{}\n", summary_line(record), record.fields.copy_text());
    }
}

fn export_text<T: Calculation + Render>(
    store: &mut RecordStore<FileStorage>,
    ids: &[String],
) -> String {
    History::new(store).export_selected::<T, _>(ids)
}

/// Copy export text to the clipboard file, printing it if that fails.
async fn export(store: &RecordStore<FileStorage>, category: Category, text: &str) {
    if text.is_empty() {
        warn!(category = %category, "no matching records to export");
        return;
    }

    let mut primary = FileClipboard::new(store.storage().dir().join(CLIPBOARD_FILE));
    let mut fallback = WriterCopy::new(io::stdout());

    match copy_text(&mut primary, &mut fallback, text).await {
        Ok(CopyPath::Clipboard) => {
            let count = text.split(EXPORT_SEPARATOR).count();
            println!(
                "copied {count} {category} records to {}",
                primary.path().display()
            );
        }
        Ok(CopyPath::Fallback) => {}
        Err(e) => error!("{e}"),
    }
}
