use clap::{Parser, Subcommand};

use shapeshift::{config, Client, SendAmount, Shift};

#[derive(Parser)]
#[clap(version = "0.1")]
struct Opts {
    #[clap(short, long)]
    config: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Current rate for a currency pair, e.g. btc_ltc
    Rate { pair: String },
    MarketInfo { pair: String },
    /// Most recent transactions
    RecentTx { max: Option<u32> },
    TxStatus { address: String },
    TimeRemaining { address: String },
    /// Supported coins
    Coins,
    ValidateAddress { address: String, symbol: String },
    Shift {
        #[clap(long)]
        withdraw_to: String,
        #[clap(long)]
        pair: String,
        #[clap(long)]
        return_address: Option<String>,
    },
    /// Ask for an email receipt of a transaction
    RequestEmail { email: String, txid: String },
    SendAmount {
        #[clap(long)]
        amount: String,
        #[clap(long)]
        withdrawal: String,
        #[clap(long)]
        pair: String,
        #[clap(long)]
        return_address: Option<String>,
        #[clap(long)]
        dest_tag: Option<String>,
        #[clap(long)]
        rs_address: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli_opts: Opts = Opts::parse();
    let conf = match &cli_opts.config {
        Some(file_name) => config::Config::from_file(file_name)?,
        None => config::Config::default(),
    };

    log::debug!("{:?}", conf);

    let client = Client::from_config(&conf)?;
    let res = match cli_opts.command {
        Command::Rate { pair } => client.get_rate(&pair).await?,
        Command::MarketInfo { pair } => client.get_market_info(&pair).await?,
        Command::RecentTx { max } => client.recent_tx(max).await?,
        Command::TxStatus { address } => client.get_tx_status(&address).await?,
        Command::TimeRemaining { address } => client.get_time_remaining(&address).await?,
        Command::Coins => client.get_coin_info().await?,
        Command::ValidateAddress { address, symbol } => {
            client.validate_address(&address, &symbol).await?
        }
        Command::Shift {
            withdraw_to,
            pair,
            return_address,
        } => {
            let shift = Shift {
                withdraw_to,
                pair,
                return_address,
                api_key: None,
            };
            client.post_shift(&shift).await?
        }
        Command::RequestEmail { email, txid } => client.post_request_email(&email, &txid).await?,
        Command::SendAmount {
            amount,
            withdrawal,
            pair,
            return_address,
            dest_tag,
            rs_address,
        } => {
            let send = SendAmount {
                amount,
                withdrawal,
                pair,
                return_address,
                dest_tag,
                rs_address,
                api_key: None,
            };
            client.post_send_amount(&send).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&res)?);

    Ok(())
}
