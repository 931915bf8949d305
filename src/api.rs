use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::error::{Error, Result, ValidationError};

pub static API_HOST: &str = "https://shapeshift.io";
static CLIENT_NAME: &str = "shapeshift-rs";
const PAIR_SEPARATOR: char = '_';

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl From<Method> for reqwest::Method {
    fn from(item: Method) -> Self {
        match item {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Method::Get => f.write_str("GET"),
            Method::Post => f.write_str("POST"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// `<from>_<to>`
    Pair,
    Text,
}

/// What happens when the caller leaves a parameter out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presence {
    Required,
    Default(&'static str),
    Omitted,
}

#[derive(Debug)]
pub struct Param {
    pub name: &'static str,
    pub kind: Kind,
    pub presence: Presence,
}

impl Param {
    const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Text,
            presence: Presence::Required,
        }
    }

    const fn pair(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Pair,
            presence: Presence::Required,
        }
    }

    const fn or_default(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Text,
            presence: Presence::Default(default),
        }
    }

    const fn omitted(name: &'static str) -> Self {
        Self {
            name,
            kind: Kind::Text,
            presence: Presence::Omitted,
        }
    }
}

/// Static description of one remote endpoint.
///
/// GET endpoints place every parameter in the path template, POST endpoints
/// send every parameter in a JSON body.
#[derive(Debug)]
pub struct Descriptor {
    pub name: &'static str,
    pub method: Method,
    pub path: &'static str,
    pub params: &'static [Param],
}

static RATE: Descriptor = Descriptor {
    name: "getRate",
    method: Method::Get,
    path: "/rate/{pair}",
    params: &[Param::pair("pair")],
};

static MARKET_INFO: Descriptor = Descriptor {
    name: "getMarketInfo",
    method: Method::Get,
    path: "/marketinfo/{pair}",
    params: &[Param::pair("pair")],
};

static RECENT_TX: Descriptor = Descriptor {
    name: "recentTx",
    method: Method::Get,
    path: "/recenttx/{max}",
    params: &[Param::omitted("max")],
};

static TX_STATUS: Descriptor = Descriptor {
    name: "getTxStatus",
    method: Method::Get,
    path: "/txStat/{address}",
    params: &[Param::required("address")],
};

static TIME_REMAINING: Descriptor = Descriptor {
    name: "getTimeRemaining",
    method: Method::Get,
    path: "/timeremaining/{address}",
    params: &[Param::required("address")],
};

static COIN_INFO: Descriptor = Descriptor {
    name: "getCoinInfo",
    method: Method::Get,
    path: "/getcoins",
    params: &[],
};

static VALIDATE_ADDRESS: Descriptor = Descriptor {
    name: "validateAddress",
    method: Method::Get,
    path: "/validateAddress/{address}/{symbol}",
    params: &[Param::required("address"), Param::required("symbol")],
};

static SHIFT: Descriptor = Descriptor {
    name: "postShift",
    method: Method::Post,
    path: "/shift",
    params: &[
        Param::required("withdrawTo"),
        Param::pair("pair"),
        Param::or_default("returnAddress", ""),
        Param::or_default("apiKey", ""),
    ],
};

static REQUEST_EMAIL: Descriptor = Descriptor {
    name: "postRequestEmail",
    method: Method::Post,
    path: "/mail",
    params: &[Param::required("email"), Param::required("txid")],
};

static SEND_AMOUNT: Descriptor = Descriptor {
    name: "postSendAmount",
    method: Method::Post,
    path: "/sendamount",
    params: &[
        Param::required("amount"),
        Param::required("withdrawal"),
        Param::pair("pair"),
        Param::or_default("returnAddress", ""),
        Param::omitted("destTag"),
        Param::omitted("rsAddress"),
        Param::or_default("apiKey", ""),
    ],
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Rate,
    MarketInfo,
    RecentTx,
    TxStatus,
    TimeRemaining,
    CoinInfo,
    ValidateAddress,
    Shift,
    RequestEmail,
    SendAmount,
}

impl Endpoint {
    pub const ALL: [Endpoint; 10] = [
        Endpoint::Rate,
        Endpoint::MarketInfo,
        Endpoint::RecentTx,
        Endpoint::TxStatus,
        Endpoint::TimeRemaining,
        Endpoint::CoinInfo,
        Endpoint::ValidateAddress,
        Endpoint::Shift,
        Endpoint::RequestEmail,
        Endpoint::SendAmount,
    ];

    pub fn descriptor(self) -> &'static Descriptor {
        match self {
            Self::Rate => &RATE,
            Self::MarketInfo => &MARKET_INFO,
            Self::RecentTx => &RECENT_TX,
            Self::TxStatus => &TX_STATUS,
            Self::TimeRemaining => &TIME_REMAINING,
            Self::CoinInfo => &COIN_INFO,
            Self::ValidateAddress => &VALIDATE_ADDRESS,
            Self::Shift => &SHIFT,
            Self::RequestEmail => &REQUEST_EMAIL,
            Self::SendAmount => &SEND_AMOUNT,
        }
    }

    pub fn name(self) -> &'static str {
        self.descriptor().name
    }

    pub fn method(self) -> Method {
        self.descriptor().method
    }

    pub fn accepts(self, param: &str) -> bool {
        self.descriptor().params.iter().any(|p| p.name == param)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Named arguments of a single call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Params(BTreeMap<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_opt<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(name, v),
            None => self,
        }
    }

    pub fn insert(&mut self, name: &str, value: impl Into<Value>) {
        self.0.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Arguments of `postShift`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Shift {
    pub withdraw_to: String,
    pub pair: String,
    pub return_address: Option<String>,
    pub api_key: Option<String>,
}

impl From<&Shift> for Params {
    fn from(item: &Shift) -> Self {
        Params::new()
            .with("withdrawTo", item.withdraw_to.as_str())
            .with("pair", item.pair.as_str())
            .with_opt("returnAddress", item.return_address.as_deref())
            .with_opt("apiKey", item.api_key.as_deref())
    }
}

/// Arguments of `postSendAmount`. `amount` is sent as given, e.g. `"0.5"`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SendAmount {
    pub amount: String,
    pub withdrawal: String,
    pub pair: String,
    pub return_address: Option<String>,
    pub dest_tag: Option<String>,
    pub rs_address: Option<String>,
    pub api_key: Option<String>,
}

impl From<&SendAmount> for Params {
    fn from(item: &SendAmount) -> Self {
        Params::new()
            .with("amount", item.amount.as_str())
            .with("withdrawal", item.withdrawal.as_str())
            .with("pair", item.pair.as_str())
            .with_opt("returnAddress", item.return_address.as_deref())
            .with_opt("destTag", item.dest_tag.as_deref())
            .with_opt("rsAddress", item.rs_address.as_deref())
            .with_opt("apiKey", item.api_key.as_deref())
    }
}

/// A fully built HTTP request, ready for a transport.
#[derive(Clone, Debug)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

pub fn build_request(base: &Url, endpoint: Endpoint, params: &Params) -> Result<Request> {
    let descriptor = endpoint.descriptor();

    let in_path = descriptor.method == Method::Get;
    let mut values = Map::new();
    for param in descriptor.params {
        if let Some(value) = resolve(param, params, in_path)? {
            values.insert(param.name.to_string(), value);
        }
    }

    for name in params.names().filter(|n| !endpoint.accepts(n)) {
        debug!("{}: ignoring unknown parameter `{}`", endpoint, name);
    }

    let url = render_url(base, descriptor.path, &values)?;

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_NAME));

    let body = match descriptor.method {
        Method::Get => None,
        Method::Post => {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            Some(Value::Object(values))
        }
    };

    Ok(Request {
        method: descriptor.method,
        url,
        headers,
        body,
    })
}

fn resolve(
    param: &Param,
    params: &Params,
    in_path: bool,
) -> Result<Option<Value>, ValidationError> {
    let value = params.get(param.name).filter(|v| !is_blank(v));

    match (value, param.presence) {
        (None, Presence::Required) => Err(ValidationError::MissingParam(param.name)),
        (None, Presence::Default(default)) => Ok(Some(Value::from(default))),
        (None, Presence::Omitted) => Ok(None),
        (Some(value), _) => {
            check(param, value, in_path)?;
            Ok(Some(value.clone()))
        }
    }
}

pub(crate) fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn check(param: &Param, value: &Value, in_path: bool) -> Result<(), ValidationError> {
    if value.is_array() || value.is_object() {
        return Err(ValidationError::NotScalar(param.name));
    }

    // the url crate normalises these away instead of escaping them
    if in_path && matches!(value.as_str(), Some(".") | Some("..")) {
        return Err(ValidationError::DotSegment(param.name));
    }

    match (param.kind, value.as_str()) {
        (Kind::Text, _) => Ok(()),
        (Kind::Pair, None) => Err(ValidationError::PairNotString(param.name)),
        (Kind::Pair, Some(pair)) if pair.contains(PAIR_SEPARATOR) => Ok(()),
        (Kind::Pair, Some(pair)) => Err(ValidationError::InvalidPair(pair.to_string())),
    }
}

fn render_url(base: &Url, template: &str, values: &Map<String, Value>) -> Result<Url> {
    let mut url = base.clone();
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| Error::Config(format!("base url cannot carry a path: {}", base)))?;
        segments.pop_if_empty();

        for part in template.trim_start_matches('/').split('/') {
            match part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) => {
                    let value = values.get(name).map(segment).unwrap_or_default();
                    segments.push(&value);
                }
                None => {
                    segments.push(part);
                }
            }
        }
    }

    Ok(url)
}

fn segment(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
