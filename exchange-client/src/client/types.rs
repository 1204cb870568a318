use crate::error::ApplicationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Order side. Travels as `"1"` (BID) or `"2"` (ASK).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[serde(rename = "1")]
    Bid,
    #[serde(rename = "2")]
    Ask,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }
}

/// Order type. Travels as `"1"` (LIMIT) or `"2"` (MARKET).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderType {
    #[default]
    #[serde(rename = "1")]
    Limit,
    #[serde(rename = "2")]
    Market,
}

/// Balance mutation kind of an `Alter` call.
///
/// Only the credit code is fixed by the protocol, the engine defines the debit variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlterAction {
    /// `"1"`, adds to the available balance.
    Credit,
    Other(String),
}

impl From<String> for AlterAction {
    fn from(code: String) -> Self {
        match code.as_str() {
            "1" => AlterAction::Credit,
            _ => AlterAction::Other(code),
        }
    }
}

impl From<AlterAction> for String {
    fn from(action: AlterAction) -> Self {
        match action {
            AlterAction::Credit => "1".to_string(),
            AlterAction::Other(code) => code,
        }
    }
}

/// Ledger reason recorded with an `Alter` call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BizType {
    /// `"4"`
    Deposit,
    Other(String),
}

impl From<String> for BizType {
    fn from(code: String) -> Self {
        match code.as_str() {
            "4" => BizType::Deposit,
            _ => BizType::Other(code),
        }
    }
}

impl From<BizType> for String {
    fn from(biz: BizType) -> Self {
        match biz {
            BizType::Deposit => "4".to_string(),
            BizType::Other(code) => code,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("BID"),
            Side::Ask => f.write_str("ASK"),
        }
    }
}

/// Side code of an order or deal reported by the engine.
///
/// `None` for an empty or unknown code, so one odd record does not reject a whole list.
pub(crate) fn reported_side<'de, D>(deserializer: D) -> Result<Option<Side>, D::Error>
where
    D: Deserializer<'de>,
{
    let code = Option::<String>::deserialize(deserializer)?;

    Ok(match code.as_deref() {
        Some("1") => Some(Side::Bid),
        Some("2") => Some(Side::Ask),
        _ => None,
    })
}

/// A `double` as rendered from protobuf JSON, where non-finite values arrive as the strings
/// `"NaN"`, `"Infinity"` and `"-Infinity"`.
pub(crate) fn proto_double<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Double {
        Number(f64),
        Text(String),
    }

    match Double::deserialize(deserializer)? {
        Double::Number(value) => Ok(value),
        Double::Text(text) => match text.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => other.parse().map_err(serde::de::Error::custom),
        },
    }
}

/// Responses that report a business outcome through `success` (and usually `code`).
///
/// A rejected operation is a normal response, so nothing here is applied implicitly.
/// [`Outcome::into_result`] lets a caller opt into `?` for business failures.
pub trait Outcome: Sized {
    fn is_success(&self) -> bool;

    /// The engine's code, when the response carries one and it is not empty.
    fn code(&self) -> Option<&str> {
        None
    }

    fn into_result(self) -> Result<Self, ApplicationError> {
        if self.is_success() {
            return Ok(self);
        }

        let code = self.code().unwrap_or_default().to_string();
        Err(ApplicationError { code })
    }
}

macro_rules! impl_outcome {
    (with_code: $($ty:ty),+ $(,)?) => {
        $(impl $crate::client::Outcome for $ty {
            fn is_success(&self) -> bool {
                self.success
            }

            fn code(&self) -> Option<&str> {
                Some(self.code.as_str()).filter(|c| !c.is_empty())
            }
        })+
    };
    ($($ty:ty),+ $(,)?) => {
        $(impl $crate::client::Outcome for $ty {
            fn is_success(&self) -> bool {
                self.success
            }
        })+
    };
}

pub(crate) use impl_outcome;
