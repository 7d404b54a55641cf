use crate::core::AccountType;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "support-ledger")]
pub struct Opt {
    #[arg(
        long = "data-dir",
        global = true,
        help = "Directory holding the ledger database (overrides DATA_DIR)"
    )]
    pub data_dir: Option<PathBuf>,
    #[arg(
        long = "config",
        global = true,
        help = "TOML file with ledger economics (overrides LEDGER_CONFIG)"
    )]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(name = "init", about = "Create the service address if it does not exist")]
    Init,
    #[command(
        name = "newaddress",
        about = "Allocate a new address and queue its start bounty"
    )]
    NewAddress {
        #[arg(long = "type", help = "Role to assign: supporter or author")]
        account_type: Option<AccountType>,
    },
    #[command(name = "settype", about = "Assign a role to an address")]
    SetType {
        #[arg(help = "The account address")]
        address: String,
        #[arg(help = "Role: supporter or author")]
        account_type: AccountType,
    },
    #[command(name = "supporting", about = "List the addresses an address supports")]
    Supporting {
        #[arg(help = "The supporting address")]
        address: String,
    },
    #[command(name = "supported", about = "List the addresses supporting an address")]
    Supported {
        #[arg(help = "The supported address")]
        address: String,
    },
    #[command(
        name = "getbalance",
        about = "Get the balance and locked balance of the target address"
    )]
    GetBalance {
        #[arg(help = "The account address")]
        address: String,
    },
    #[command(name = "send", about = "Send value between addresses")]
    Send {
        #[arg(help = "Source address")]
        from: String,
        #[arg(help = "Destination address")]
        to: String,
        #[arg(help = "Amount to send")]
        amount: u64,
        #[arg(long = "mine", help = "Mine a block immediately")]
        mine: bool,
    },
    #[command(name = "support", about = "Lock the support cost and support an address")]
    Support {
        #[arg(help = "Supporting address")]
        from: String,
        #[arg(help = "Supported address")]
        to: String,
        #[arg(long = "mine", help = "Mine a block immediately")]
        mine: bool,
    },
    #[command(name = "unsupport", about = "Remove a support edge and release its cost")]
    Unsupport {
        #[arg(help = "Supporting address")]
        from: String,
        #[arg(help = "Supported address")]
        to: String,
        #[arg(long = "mine", help = "Mine a block immediately")]
        mine: bool,
    },
    #[command(name = "claim", about = "Lock the generator price and become a Generator")]
    Claim {
        #[arg(help = "Claiming address")]
        address: String,
        #[arg(long = "mine", help = "Mine a block immediately")]
        mine: bool,
    },
    #[command(name = "unclaim", about = "Release the generator price")]
    Unclaim {
        #[arg(help = "Generator address")]
        address: String,
        #[arg(long = "mine", help = "Mine a block immediately")]
        mine: bool,
    },
    #[command(name = "mine", about = "Assemble and commit one block now")]
    Mine,
    #[command(name = "pending", about = "List pending transactions")]
    Pending,
    #[command(name = "blockinfo", about = "Print a committed block as JSON")]
    BlockInfo {
        #[arg(help = "Block height")]
        height: u64,
    },
    #[command(name = "info", about = "Show the service address and ledger statistics")]
    Info,
    #[command(
        name = "startnode",
        about = "Run the mining daemon until the process is killed"
    )]
    StartNode,
}
