//! The fixed sets of transaction directions and sources and the rules for
//! decoding them from their wire codes.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The net cash-flow direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum TransactionDirection {
    /// Money neither entered nor left the account, e.g. a declined payment.
    None,
    /// Money left the account.
    Outbound,
    /// Money entered the account.
    Inbound,
}

impl TransactionDirection {
    /// Every direction, in wire order.
    pub const ALL: [Self; 3] = [Self::None, Self::Outbound, Self::Inbound];

    /// The wire code for the direction, e.g. "OUTBOUND".
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Outbound => "OUTBOUND",
            Self::Inbound => "INBOUND",
        }
    }
}

/// The payment rail or origin of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum TransactionSource {
    /// An incoming direct credit.
    DirectCredit,
    /// An outgoing direct debit.
    DirectDebit,
    /// A disputed direct debit.
    DirectDebitDispute,
    /// A transfer between accounts held at the same bank.
    InternalTransfer,
    /// A card payment.
    MasterCard,
    /// An incoming Faster Payment.
    FasterPaymentsIn,
    /// An outgoing Faster Payment.
    FasterPaymentsOut,
    /// A reversed Faster Payment.
    FasterPaymentsReversal,
    /// Funds added to the account by card top-up.
    StripeFunding,
    /// Interest paid into the account.
    InterestPayment,
    /// A deposit received through a nostro account.
    NostroDeposit,
    /// An overdraft charge or adjustment.
    Overdraft,
    /// A recurring payment into the account from an external account.
    ExternalRegularInbound,
    /// A recurring payment from the account to an external account.
    ExternalRegularOutbound,
    /// A one-off payment into the account from an external account.
    ExternalInbound,
    /// A one-off payment from the account to an external account.
    ExternalOutbound,
}

impl TransactionSource {
    /// Every source, in wire order.
    pub const ALL: [Self; 16] = [
        Self::DirectCredit,
        Self::DirectDebit,
        Self::DirectDebitDispute,
        Self::InternalTransfer,
        Self::MasterCard,
        Self::FasterPaymentsIn,
        Self::FasterPaymentsOut,
        Self::FasterPaymentsReversal,
        Self::StripeFunding,
        Self::InterestPayment,
        Self::NostroDeposit,
        Self::Overdraft,
        Self::ExternalRegularInbound,
        Self::ExternalRegularOutbound,
        Self::ExternalInbound,
        Self::ExternalOutbound,
    ];

    /// The source assumed when a client does not specify one.
    pub const DEFAULT: Self = Self::FasterPaymentsOut;

    /// The wire code for the source, e.g. "MASTER_CARD".
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DirectCredit => "DIRECT_CREDIT",
            Self::DirectDebit => "DIRECT_DEBIT",
            Self::DirectDebitDispute => "DIRECT_DEBIT_DISPUTE",
            Self::InternalTransfer => "INTERNAL_TRANSFER",
            Self::MasterCard => "MASTER_CARD",
            Self::FasterPaymentsIn => "FASTER_PAYMENTS_IN",
            Self::FasterPaymentsOut => "FASTER_PAYMENTS_OUT",
            Self::FasterPaymentsReversal => "FASTER_PAYMENTS_REVERSAL",
            Self::StripeFunding => "STRIPE_FUNDING",
            Self::InterestPayment => "INTEREST_PAYMENT",
            Self::NostroDeposit => "NOSTRO_DEPOSIT",
            Self::Overdraft => "OVERDRAFT",
            Self::ExternalRegularInbound => "EXTERNAL_REGULAR_INBOUND",
            Self::ExternalRegularOutbound => "EXTERNAL_REGULAR_OUTBOUND",
            Self::ExternalInbound => "EXTERNAL_INBOUND",
            Self::ExternalOutbound => "EXTERNAL_OUTBOUND",
        }
    }

    /// Whether money moved to or from an account outside the bank's own
    /// payment rails.
    pub fn is_external(self) -> bool {
        matches!(
            self,
            Self::ExternalInbound
                | Self::ExternalOutbound
                | Self::ExternalRegularInbound
                | Self::ExternalRegularOutbound
        )
    }
}

/// Map a source code such as "DIRECT_DEBIT" to its [TransactionSource].
///
/// Matching is exact and case-sensitive.
///
/// # Errors
/// Returns an [Error::UnknownSource] if `source_code` is not one of the
/// sixteen source codes.
pub fn classify(source_code: &str) -> Result<TransactionSource, Error> {
    TransactionSource::ALL
        .into_iter()
        .find(|source| source.as_str() == source_code)
        .ok_or_else(|| Error::UnknownSource(source_code.to_owned()))
}

/// Map a direction code such as "INBOUND" to its [TransactionDirection].
///
/// Matching is exact and case-sensitive.
///
/// # Errors
/// Returns an [Error::UnknownDirection] if `code` is not "NONE", "OUTBOUND"
/// or "INBOUND".
pub fn classify_direction(code: &str) -> Result<TransactionDirection, Error> {
    TransactionDirection::ALL
        .into_iter()
        .find(|direction| direction.as_str() == code)
        .ok_or_else(|| Error::UnknownDirection(code.to_owned()))
}

impl FromStr for TransactionSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        classify(s)
    }
}

impl TryFrom<String> for TransactionSource {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        classify(&value)
    }
}

impl From<TransactionSource> for &'static str {
    fn from(source: TransactionSource) -> Self {
        source.as_str()
    }
}

impl Display for TransactionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        classify_direction(s)
    }
}

impl TryFrom<String> for TransactionDirection {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        classify_direction(&value)
    }
}

impl From<TransactionDirection> for &'static str {
    fn from(direction: TransactionDirection) -> Self {
        direction.as_str()
    }
}

impl Display for TransactionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
