use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};

/// Parse raw user input into a transaction amount.
///
/// Absent, blank, non-numeric, zero and negative inputs are all rejected
/// with [`LedgerError::InvalidAmount`]. A single leading currency symbol
/// (`$`, `€`, `£`) and thousands separators are tolerated.
pub fn parse_amount(raw: Option<&str>) -> LedgerResult<Decimal> {
    let input = raw.unwrap_or_default();
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid(input, "amount is required"));
    }

    let digits = trimmed
        .strip_prefix(['$', '€', '£'])
        .unwrap_or(trimmed)
        .replace(',', "");

    let amount = Decimal::from_str(digits.trim())
        .map_err(|_| invalid(input, "not a number"))?;
    ensure_positive(amount).map_err(|_| invalid(input, "must be greater than zero"))
}

/// Check that an already-numeric amount is strictly positive.
pub(crate) fn ensure_positive(amount: Decimal) -> LedgerResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(invalid(&amount.to_string(), "must be greater than zero"));
    }
    Ok(amount)
}

fn invalid(input: &str, reason: &str) -> LedgerError {
    LedgerError::InvalidAmount {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
