//! Summarises transactions into week, month or pay cycle periods.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    calendar::{Calendar, SearchDirection},
    transaction::{Transaction, TransactionDirection},
};

/// The largest pay day accepted for pay cycles. Every month has this day.
pub const MAX_PAY_DAY: u8 = 28;

/// The period preset chosen by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodPreset {
    /// Group by calendar week.
    Week,
    /// Group by calendar month.
    Month,
    /// Group by pay cycle.
    Cycle,
}

impl PeriodPreset {
    /// The preset used when the client does not choose one.
    pub fn default_preset() -> Self {
        Self::Month
    }
}

/// The length of time that transactions are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// Calendar weeks, starting on the calendar's first weekday.
    Week,
    /// Calendar months.
    Month,
    /// From one pay day to the next, e.g. the 25th of one month to the 25th
    /// of the next.
    PayCycle {
        /// The day of the month that the cycle starts on.
        pay_day: u8,
    },
}

impl Period {
    /// Resolve a client preset into a period.
    ///
    /// `pay_day` is only used for [PeriodPreset::Cycle] and defaults to the
    /// first of the month.
    ///
    /// # Errors
    /// Returns an [Error::InvalidPayDay] if the pay day is not between 1 and
    /// [MAX_PAY_DAY].
    pub fn from_preset(preset: PeriodPreset, pay_day: Option<u8>) -> Result<Self, Error> {
        match preset {
            PeriodPreset::Week => Ok(Self::Week),
            PeriodPreset::Month => Ok(Self::Month),
            PeriodPreset::Cycle => {
                let pay_day = pay_day.unwrap_or(1);

                if (1..=MAX_PAY_DAY).contains(&pay_day) {
                    Ok(Self::PayCycle { pay_day })
                } else {
                    Err(Error::InvalidPayDay(pay_day))
                }
            }
        }
    }

    /// The start (inclusive) and end (exclusive) of the period containing `t`.
    pub fn bounds(self, t: OffsetDateTime, calendar: &Calendar) -> (OffsetDateTime, OffsetDateTime) {
        match self {
            Self::Week => (calendar.start_of_week(t), calendar.end_of_week(t)),
            Self::Month => (calendar.start_of_month(t), calendar.end_of_month(t)),
            Self::PayCycle { pay_day } => (
                calendar.next_occurrence(t, pay_day, SearchDirection::Backward),
                calendar.next_occurrence(t, pay_day, SearchDirection::Forward),
            ),
        }
    }
}

/// The totals for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    /// When the period starts.
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    /// When the next period starts.
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
    /// The total of inbound transactions.
    pub inbound: f64,
    /// The total of outbound transactions.
    pub outbound: f64,
    /// The total of transactions to or from external accounts, in either
    /// direction.
    pub external: f64,
    /// The number of transactions in the period.
    pub count: usize,
}

impl PeriodSummary {
    fn empty(start: OffsetDateTime, end: OffsetDateTime) -> Self {
        Self {
            start,
            end,
            inbound: 0.0,
            outbound: 0.0,
            external: 0.0,
            count: 0,
        }
    }

    fn add(&mut self, transaction: &Transaction) {
        match transaction.direction {
            TransactionDirection::Inbound => self.inbound += transaction.amount,
            TransactionDirection::Outbound => self.outbound += transaction.amount,
            TransactionDirection::None => {}
        }

        if transaction.source.is_external() {
            self.external += transaction.amount;
        }

        self.count += 1;
    }
}

/// Group `transactions` into periods and total them.
///
/// Archived transactions are skipped. Only periods containing at least one
/// transaction are returned, ordered by start time.
pub fn summarise(
    transactions: &[Transaction],
    period: Period,
    calendar: &Calendar,
) -> Vec<PeriodSummary> {
    let mut summaries: BTreeMap<OffsetDateTime, PeriodSummary> = BTreeMap::new();

    for transaction in transactions.iter().filter(|t| !t.is_archived) {
        let (start, end) = period.bounds(transaction.created, calendar);

        summaries
            .entry(start)
            .or_insert_with(|| PeriodSummary::empty(start, end))
            .add(transaction);
    }

    summaries.into_values().collect()
}

#[cfg(test)]
mod report_tests {
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        calendar::Calendar,
        transaction::{
            Transaction, TransactionDirection, TransactionSource,
            report::{Period, PeriodPreset, PeriodSummary, summarise},
        },
    };

    fn transaction(
        id: i64,
        amount: f64,
        direction: TransactionDirection,
        source: TransactionSource,
        created: OffsetDateTime,
    ) -> Transaction {
        Transaction {
            id,
            amount,
            direction,
            created,
            narrative: format!("Transaction {id}"),
            source,
            is_archived: false,
            internal_narrative: None,
            internal_amount: None,
            user_id: None,
        }
    }

    fn sample_transactions() -> Vec<Transaction> {
        vec![
            transaction(
                1,
                2000.0,
                TransactionDirection::Inbound,
                TransactionSource::ExternalRegularInbound,
                datetime!(2024-03-25 09:00 UTC),
            ),
            transaction(
                2,
                45.5,
                TransactionDirection::Outbound,
                TransactionSource::MasterCard,
                datetime!(2024-03-27 18:00 UTC),
            ),
            transaction(
                3,
                700.0,
                TransactionDirection::Outbound,
                TransactionSource::ExternalOutbound,
                datetime!(2024-04-02 08:00 +1),
            ),
            transaction(
                4,
                0.0,
                TransactionDirection::None,
                TransactionSource::MasterCard,
                datetime!(2024-04-03 08:00 +1),
            ),
        ]
    }

    #[test]
    fn summarise_by_week() {
        let calendar = Calendar::default();

        let summaries = summarise(&sample_transactions(), Period::Week, &calendar);

        assert_eq!(
            summaries,
            vec![
                PeriodSummary {
                    start: datetime!(2024-03-25 00:00 UTC),
                    end: datetime!(2024-04-01 00:00 +1),
                    inbound: 2000.0,
                    outbound: 45.5,
                    external: 2000.0,
                    count: 2,
                },
                PeriodSummary {
                    start: datetime!(2024-04-01 00:00 +1),
                    end: datetime!(2024-04-08 00:00 +1),
                    inbound: 0.0,
                    outbound: 700.0,
                    external: 700.0,
                    count: 2,
                },
            ]
        );
    }

    #[test]
    fn summarise_by_month() {
        let calendar = Calendar::default();

        let summaries = summarise(&sample_transactions(), Period::Month, &calendar);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].start, datetime!(2024-03-01 00:00 UTC));
        assert_eq!(summaries[0].end, datetime!(2024-04-01 00:00 +1));
        assert_eq!(summaries[0].count, 2);
        assert_eq!(summaries[1].start, datetime!(2024-04-01 00:00 +1));
        assert_eq!(summaries[1].end, datetime!(2024-05-01 00:00 +1));
        assert_eq!(summaries[1].outbound, 700.0);
    }

    #[test]
    fn summarise_by_pay_cycle() {
        let calendar = Calendar::default();

        let summaries = summarise(
            &sample_transactions(),
            Period::PayCycle { pay_day: 25 },
            &calendar,
        );

        assert_eq!(
            summaries,
            vec![PeriodSummary {
                start: datetime!(2024-03-25 00:00 UTC),
                end: datetime!(2024-04-25 00:00 +1),
                inbound: 2000.0,
                outbound: 745.5,
                external: 2700.0,
                count: 4,
            }]
        );
    }

    #[test]
    fn pay_cycle_before_pay_day_starts_in_previous_month() {
        let calendar = Calendar::default();

        let bounds = Period::PayCycle { pay_day: 25 }.bounds(datetime!(2024-03-10 12:00 UTC), &calendar);

        assert_eq!(
            bounds,
            (datetime!(2024-02-25 00:00 UTC), datetime!(2024-03-25 00:00 UTC))
        );
    }

    #[test]
    fn summarise_skips_archived_transactions() {
        let calendar = Calendar::default();
        let mut transactions = sample_transactions();
        for transaction in &mut transactions {
            transaction.is_archived = true;
        }

        assert!(summarise(&transactions, Period::Week, &calendar).is_empty());
    }

    #[test]
    fn from_preset_validates_pay_day() {
        assert_eq!(
            Period::from_preset(PeriodPreset::Cycle, Some(15)),
            Ok(Period::PayCycle { pay_day: 15 })
        );
        assert_eq!(
            Period::from_preset(PeriodPreset::Cycle, None),
            Ok(Period::PayCycle { pay_day: 1 })
        );
        assert_eq!(
            Period::from_preset(PeriodPreset::Cycle, Some(31)),
            Err(Error::InvalidPayDay(31))
        );
        assert_eq!(
            Period::from_preset(PeriodPreset::Cycle, Some(0)),
            Err(Error::InvalidPayDay(0))
        );
        assert_eq!(
            Period::from_preset(PeriodPreset::Week, Some(31)),
            Ok(Period::Week)
        );
    }
}
