//! Reconciliation statement download.
//!
//! The statement for day `D` is produced overnight and can be fetched from
//! 11:00 local time on `D+1`. Earlier requests are rejected locally.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use super::{de, GatewayRequest};
use crate::params::ParameterSet;
use crate::{GatewayError, Result};

/// Local hour on `D+1` from which the statement for `D` is available.
pub const BILL_AVAILABLE_HOUR: u32 = 11;

/// Fetch the statement file link for one day (`/accountstatement/getOrderFile`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadBillRequest {
    /// Statement day, `YYYY-MM-DD`.
    pub day: String,
}

impl DownloadBillRequest {
    pub fn new(day: impl Into<String>) -> Self {
        Self { day: day.into() }
    }

    /// Request the statement for a calendar date.
    pub fn for_date(date: NaiveDate) -> Self {
        Self::new(date.format("%Y-%m-%d").to_string())
    }

    /// Parse and check the `day` field.
    pub fn date(&self) -> Result<NaiveDate> {
        let day = self.day.as_str();
        let well_formed = day.len() == 10
            && day.char_indices().all(|(i, c)| match i {
                4 | 7 => c == '-',
                _ => c.is_ascii_digit(),
            });
        if !well_formed {
            return Err(GatewayError::validation("day", "expected YYYY-MM-DD"));
        }
        NaiveDate::parse_from_str(day, "%Y-%m-%d")
            .map_err(|e| GatewayError::validation("day", format!("not a calendar date: {e}")))
    }

    /// Reject the request if the statement is not available at `now`.
    ///
    /// The window is evaluated in the offset of `now`.
    pub fn check_available(&self, now: DateTime<FixedOffset>) -> Result<()> {
        let date = self.date()?;
        let opens = available_at(date, *now.offset())?;
        if now < opens {
            return Err(GatewayError::BillNotAvailable {
                day: self.day.clone(),
                available_at: opens.to_rfc3339(),
            });
        }
        Ok(())
    }
}

impl GatewayRequest for DownloadBillRequest {
    const OPERATION: &'static str = "download_bill";
    const PATH: &'static str = "/accountstatement/getOrderFile";

    fn validate(&self) -> Result<()> {
        self.date().map(|_| ())
    }

    fn check_preconditions(&self, now: DateTime<FixedOffset>) -> Result<()> {
        self.check_available(now)
    }

    fn to_params(&self) -> ParameterSet {
        ParameterSet::new().with("day", self.day.as_str())
    }
}

/// First instant at which the statement for `day` can be fetched.
pub fn available_at(day: NaiveDate, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let opens = day
        .checked_add_days(Days::new(1))
        .and_then(|next| NaiveTime::from_hms_opt(BILL_AVAILABLE_HOUR, 0, 0).map(|t| next.and_time(t)))
        .ok_or_else(|| GatewayError::validation("day", "date out of range"))?;
    offset
        .from_local_datetime(&opens)
        .single()
        .ok_or_else(|| GatewayError::validation("day", "ambiguous local time"))
}

/// Statement file link.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillFile {
    /// CSV download URL.
    #[serde(default, deserialize_with = "de::opt_string")]
    pub file_url: Option<String>,
}
