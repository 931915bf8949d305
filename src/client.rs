use log::{debug, warn};
use secrecy::{ExposeSecret, Secret};
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::api::{self, Endpoint, Params, SendAmount, Shift};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, Transport};

static API_KEY: &str = "apiKey";

/// Client for the ShapeShift REST API.
///
/// Every call builds one request, validates its arguments before touching the
/// network, and returns the remote JSON payload untouched.
#[derive(Clone, Debug)]
pub struct Client {
    base_url: Url,
    api_key: Option<Secret<String>>,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new() -> Result<Self> {
        Self::with_transport(api::API_HOST, Arc::new(HttpTransport::new()))
    }

    pub fn with_transport(base_url: &str, transport: Arc<dyn Transport>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base url {:?}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base url cannot carry a path: {}",
                base_url
            )));
        }

        Ok(Self {
            base_url,
            api_key: None,
            transport,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = match config.timeout() {
            Some(timeout) => HttpTransport::with_timeout(timeout)?,
            None => HttpTransport::new(),
        };
        let client = Self::with_transport(config.base_url.as_str(), Arc::new(transport))?;

        Ok(match &config.api_key {
            Some(key) => client.api_key(key.clone()),
            None => client,
        })
    }

    /// Key sent with `postShift` and `postSendAmount` unless the call supplies its own.
    pub fn api_key(mut self, key: Secret<String>) -> Self {
        self.api_key = Some(key);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn call(&self, endpoint: Endpoint, mut params: Params) -> Result<Value> {
        if let Some(key) = &self.api_key {
            if endpoint.accepts(API_KEY) && params.get(API_KEY).map_or(true, api::is_blank) {
                params.insert(API_KEY, key.expose_secret().as_str());
            }
        }

        let request = api::build_request(&self.base_url, endpoint, &params)?;
        debug!("{}: {} {}", endpoint, request.method, request.url);

        self.transport.send(request).await.map_err(|e| {
            warn!("{}: {}", endpoint, e);
            Error::from(e)
        })
    }

    /// `GET /rate/{pair}`
    pub async fn get_rate(&self, pair: &str) -> Result<Value> {
        self.call(Endpoint::Rate, Params::new().with("pair", pair))
            .await
    }

    /// `GET /marketinfo/{pair}`
    pub async fn get_market_info(&self, pair: &str) -> Result<Value> {
        self.call(Endpoint::MarketInfo, Params::new().with("pair", pair))
            .await
    }

    /// `GET /recenttx/{max}`; the server picks the count when `max` is `None`.
    pub async fn recent_tx(&self, max: Option<u32>) -> Result<Value> {
        self.call(Endpoint::RecentTx, Params::new().with_opt("max", max))
            .await
    }

    /// `GET /txStat/{address}`
    pub async fn get_tx_status(&self, address: &str) -> Result<Value> {
        self.call(Endpoint::TxStatus, Params::new().with("address", address))
            .await
    }

    /// `GET /timeremaining/{address}`
    pub async fn get_time_remaining(&self, address: &str) -> Result<Value> {
        self.call(
            Endpoint::TimeRemaining,
            Params::new().with("address", address),
        )
        .await
    }

    /// `GET /getcoins`
    pub async fn get_coin_info(&self) -> Result<Value> {
        self.call(Endpoint::CoinInfo, Params::new()).await
    }

    /// `GET /validateAddress/{address}/{symbol}`
    pub async fn validate_address(&self, address: &str, symbol: &str) -> Result<Value> {
        self.call(
            Endpoint::ValidateAddress,
            Params::new().with("address", address).with("symbol", symbol),
        )
        .await
    }

    /// `POST /shift`
    pub async fn post_shift(&self, shift: &Shift) -> Result<Value> {
        self.call(Endpoint::Shift, shift.into()).await
    }

    /// `POST /mail`
    pub async fn post_request_email(&self, email: &str, txid: &str) -> Result<Value> {
        self.call(
            Endpoint::RequestEmail,
            Params::new().with("email", email).with("txid", txid),
        )
        .await
    }

    /// `POST /sendamount`
    pub async fn post_send_amount(&self, send: &SendAmount) -> Result<Value> {
        self.call(Endpoint::SendAmount, send.into()).await
    }
}
