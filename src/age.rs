use chrono::{Datelike, NaiveDate};

const BIRTHDATE_FORMAT: &str = "%d/%m/%Y";

/// Age in whole years on `reference`, or `None` when the birthdate is
/// missing or not in day/month/year form.
pub fn compute_age(birthdate: Option<&str>, reference: NaiveDate) -> Option<i32> {
    let raw = birthdate?.trim();
    let born = NaiveDate::parse_from_str(raw, BIRTHDATE_FORMAT).ok()?;
    let before_birthday = (reference.month(), reference.day()) < (born.month(), born.day());
    Some(reference.year() - born.year() - i32::from(before_birthday))
}
