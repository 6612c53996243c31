use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use electrum_address_tracker::config::{BATCH_SIZE, CONFIRMED_AFTER, MAX_CONCURRENT_BATCHES};
use electrum_address_tracker::{
    follow, AddressTracker, ElectrumChainClient, SledStore, SyncReport, TrackerConfig,
};

type CliTracker = AddressTracker<SledStore, ElectrumChainClient>;

#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "testnet")]
    network: String,

    #[arg(long, default_value = "ssl://electrum.blockstream.info:60002")]
    electrum_url: String,

    /// Sled database directory holding watched addresses and transactions
    #[arg(long, default_value = "tracker_db")]
    db: PathBuf,

    #[arg(long, default_value_t = CONFIRMED_AFTER)]
    confirmed_after: u32,

    #[arg(long, default_value_t = BATCH_SIZE)]
    batch_size: usize,

    /// Batches in flight during a sync pass
    #[arg(long, default_value_t = MAX_CONCURRENT_BATCHES)]
    concurrency: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start watching addresses
    Watch { addresses: Vec<String> },
    /// Run one sync pass
    Sync,
    /// Sync periodically
    Follow {
        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
        /// Stop after this many rounds instead of running forever
        #[arg(long)]
        rounds: Option<usize>,
    },
    /// List watched addresses
    List,
    /// Show one address with its transactions
    Address { address: String },
    /// List transactions, optionally only those of one address
    Txs { address: Option<String> },
    /// Last synced chain height
    Height,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = TrackerConfig::for_network(args.network.clone())
        .with_confirmed_after(args.confirmed_after)
        .with_batch_size(args.batch_size)
        .with_max_concurrent_batches(args.concurrency);
    let network = config.validate()?;

    println!("[MAIN] Network: {}, store: {:?}", network, args.db);
    let store = SledStore::open(&args.db)?;
    let chain = ElectrumChainClient::new(&args.electrum_url, network)?;
    let tracker: CliTracker = AddressTracker::new(store, chain, config)?;

    match args.command {
        Command::Watch { addresses } => {
            let added = tracker.watch_addresses(&addresses).await?;
            println!("[MAIN] Added {} of {} addresses", added, addresses.len());
        }
        Command::Sync => {
            let report = tracker.sync().await?;
            print_report(&report);
        }
        Command::Follow {
            interval_secs,
            rounds,
        } => {
            let stats = follow(&tracker, Duration::from_secs(interval_secs), rounds).await;

            println!("[MAIN] Follow Finished");
            println!("-----------------------------------");
            println!("Total Time:       {:?}", stats.total_time);
            println!("Total Rounds:     {}", stats.rounds);
            println!("Failed Rounds:    {}", stats.failed_rounds);
            println!("-----------------------------------");
        }
        Command::List => {
            for rec in tracker.get_watched_addresses().await? {
                println!(
                    "{:<64} height {:>8}  txs {}",
                    rec.address,
                    rec.max_block_height,
                    rec.tx_ids.len()
                );
            }
        }
        Command::Address { address } => {
            let full = tracker.get_address_with_transactions(&address).await?;
            println!("{}", serde_json::to_string_pretty(&full)?);
        }
        Command::Txs { address } => {
            let txs = match address {
                Some(a) => tracker.get_transactions_for_address(&a).await?,
                None => tracker.get_all_transactions().await?,
            };
            for tx in txs {
                println!(
                    "{} @ {}  from {:?} to {:?}",
                    tx.tx_id, tx.block_height, tx.from.addresses, tx.to.addresses
                );
            }
        }
        Command::Height => {
            println!("{}", tracker.get_height().await?);
        }
    }

    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("[MAIN] Sync Finished");
    println!("-----------------------------------");
    println!("Chain Height:     {}", report.chain_height);
    println!("Batches:          {}", report.batches);
    println!("Transactions:     {}", report.transactions);
    println!("Skipped:          {}", report.skipped_transactions);
    println!("Updated Addrs:    {}", report.addresses_updated);
    println!("Total Time:       {:?}", report.elapsed);
    println!("-----------------------------------");
}
