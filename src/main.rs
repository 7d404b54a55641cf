// This is my main entry point for the ledger CLI application
// Every command opens the durable store, builds a Ledger over it and runs one operation
use clap::Parser;
use log::{error, info, LevelFilter};
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use support_ledger::{
    validate_address, Command, Ledger, LedgerConfig, LedgerStore, Opt, SledStore, Transaction,
    GLOBAL_CONFIG,
};

fn main() {
    // Info by default; RUST_LOG still wins when it is set
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Some(dir) = &opt.data_dir {
        GLOBAL_CONFIG.set_data_dir(dir.to_string_lossy().to_string());
    }
    if let Some(path) = &opt.config {
        GLOBAL_CONFIG.set_ledger_config_path(path.to_string_lossy().to_string());
    }

    // If something goes wrong, I log the error and exit with code 1
    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn open_ledger() -> Result<Ledger<SledStore>, Box<dyn std::error::Error>> {
    let config = LedgerConfig::load(GLOBAL_CONFIG.get_ledger_config_path().as_deref())?;
    let store = Arc::new(SledStore::open_default()?);
    Ok(Ledger::new(store, config))
}

fn check_address(address: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !validate_address(address) {
        return Err(format!("Invalid address: {address}").into());
    }
    Ok(())
}

// Prints the queued transaction and, with --mine, settles it right away
fn report_queued(
    ledger: &Ledger<SledStore>,
    tx: &Transaction,
    mine: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Queued {} transaction {}", tx.get_kind(), tx.get_id());
    if mine {
        let block = ledger.mine_now()?;
        println!(
            "Mined block {} with {} transactions",
            block.get_height(),
            block.get_transactions().len()
        );
    }
    Ok(())
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = open_ledger()?;
    match command {
        Command::Init => {
            let address = ledger.init()?;
            println!("Service address: {address}");
        }
        Command::NewAddress { account_type } => {
            let address = ledger.create_address()?;
            if let Some(account_type) = account_type {
                ledger.set_account_type(&address, account_type)?;
            }
            println!("Your new address: {address}")
        }
        Command::SetType {
            address,
            account_type,
        } => {
            check_address(&address)?;
            ledger.set_account_type(&address, account_type)?;
            println!("{address} is now {account_type}");
        }
        Command::Supporting { address } => {
            check_address(&address)?;
            for to in ledger.supporting(&address)? {
                println!("{to}");
            }
        }
        Command::Supported { address } => {
            check_address(&address)?;
            for from in ledger.supported(&address)? {
                println!("{from}");
            }
        }
        Command::GetBalance { address } => {
            check_address(&address)?;
            let account = ledger.get_account(&address)?;
            println!(
                "Balance of {address}: {} (locked {})",
                account.get_balance(),
                account.get_locked_balance()
            );
            if let Some(account_type) = account.get_account_type() {
                println!("Type: {account_type}");
            }
        }
        Command::Send {
            from,
            to,
            amount,
            mine,
        } => {
            check_address(&from)?;
            check_address(&to)?;
            let tx = ledger.send(&from, &to, amount)?;
            report_queued(&ledger, &tx, mine)?;
        }
        Command::Support { from, to, mine } => {
            check_address(&from)?;
            check_address(&to)?;
            let tx = ledger.support(&from, &to, true)?;
            report_queued(&ledger, &tx, mine)?;
        }
        Command::Unsupport { from, to, mine } => {
            check_address(&from)?;
            check_address(&to)?;
            let tx = ledger.support(&from, &to, false)?;
            report_queued(&ledger, &tx, mine)?;
        }
        Command::Claim { address, mine } => {
            check_address(&address)?;
            let tx = ledger.claim_generator(&address, true)?;
            report_queued(&ledger, &tx, mine)?;
        }
        Command::Unclaim { address, mine } => {
            check_address(&address)?;
            let tx = ledger.claim_generator(&address, false)?;
            report_queued(&ledger, &tx, mine)?;
        }
        Command::Mine => {
            let block = ledger.mine_now()?;
            println!("{}", serde_json::to_string_pretty(&block.info())?);
        }
        Command::Pending => {
            for tx in ledger.pending()? {
                println!(
                    "{} {} {} -> {} amount {}",
                    tx.get_id(),
                    tx.get_kind(),
                    tx.get_address_from().unwrap_or("-"),
                    tx.get_address_to().unwrap_or("-"),
                    tx.get_amount()
                );
            }
        }
        Command::BlockInfo { height } => match ledger.block_info(height)? {
            Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
            None => return Err(format!("No block at height {height}").into()),
        },
        Command::Info => {
            match ledger.get_store().get_service_address()? {
                Some(address) => println!("Service address: {address}"),
                None => println!("Service address: not set (run 'init')"),
            }
            println!("Database: {}", ledger.get_store().get_db_path().display());
            println!("{}", serde_json::to_string_pretty(&ledger.stats()?)?);
        }
        Command::StartNode => {
            let address = ledger.init()?;
            info!("Mining rewards go to {address}");
            ledger.get_daemon().start()?;
            // The daemon thread does the work; this one just keeps the process alive
            loop {
                thread::sleep(Duration::from_secs(3600));
            }
        }
    }
    Ok(())
}
