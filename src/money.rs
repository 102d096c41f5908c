use anyhow::{anyhow, bail};
use regex::Regex;
use serde_with::DeserializeFromStr;

use std::{
    fmt::{Debug, Display},
    iter::Sum,
    ops::{Add, AddAssign},
    str::FromStr,
    sync::LazyLock,
};

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<sign>[-+])?(?:[A-Z]{0,3}\$)?(?P<int>\d{1,3}(?:,\d{3})+|\d*)(?:\.(?P<frac>\d*))?(?:[eE](?P<exp>[-+]?\d{1,4}))?$",
    )
    .expect("amount pattern should compile")
});

/// Represents an amount of money.
///
/// The amount is stored internally as an integer number of cents, so sums
/// are exact. Parsing accepts any decimal number, optionally with thousands
/// separators, a currency prefix such as `$` or `NT$`, or an exponent, e.g.
/// `1,234.5`, `NT$32,000`, `.5` or `1e3`. Digits beyond the cent are rounded
/// half to even.
///
/// The [`Display`] implementation formats the amount with thousands
/// separators and 2 decimal places, and honours width and alignment:
///
/// ```
/// # use sales_report::Amount;
/// let amount: Amount = "NT$1234567.8".parse().unwrap();
/// assert_eq!(amount.to_string(), "1,234,567.80");
/// assert_eq!(format!("{amount:>14}"), "  1,234,567.80");
/// ```
#[derive(Clone, Copy, Default, DeserializeFromStr, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Amount(i64);

impl Amount {
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns the amount in whole currency units, as written to a spreadsheet cell.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Formats the amount rounded to whole units, with thousands separators.
    ///
    /// Halves round to even, so `2.50` becomes `2` and `3.50` becomes `4`.
    ///
    /// ```
    /// # use sales_report::Amount;
    /// assert_eq!(Amount::from_cents(123_456_789).whole(), "1,234,568");
    /// ```
    #[must_use]
    pub fn whole(self) -> String {
        let abs = self.0.unsigned_abs();
        let (units, rem) = (abs / 100, abs % 100);
        let units = if rem > 50 || (rem == 50 && units % 2 == 1) { units + 1 } else { units };
        let sign = if self.0 < 0 && units > 0 { "-" } else { "" };
        format!("{sign}{}", group_thousands(units))
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

impl Debug for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let abs = self.0.unsigned_abs();
        let sign = if self.0 < 0 { "-" } else { "" };
        let text = format!("{sign}{}.{:02}", group_thousands(abs / 100), abs % 100);
        f.pad(&text)
    }
}

impl FromStr for Amount {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let Some(caps) = AMOUNT.captures(s.trim()) else {
            bail!("invalid amount {s:?}");
        };
        let int = caps.name("int").map_or("", |m| m.as_str()).replace(',', "");
        let frac = caps.name("frac").map_or("", |m| m.as_str());
        if int.is_empty() && frac.is_empty() {
            bail!("invalid amount {s:?}");
        }
        let exp: i64 = caps.name("exp").map_or(Ok(0), |m| m.as_str().parse())?;
        let digits = format!("{int}{frac}");
        let significant = digits.trim_start_matches('0');
        // Index into `significant` of the point between cents and fractions of a cent.
        let point = i64::try_from(int.len() + 2)? + exp - i64::try_from(digits.len() - significant.len())?;
        let cents = round_to_cents(significant, point).ok_or_else(|| anyhow!("amount out of range: {s:?}"))?;
        Ok(Self(if caps.name("sign").is_some_and(|m| m.as_str() == "-") { -cents } else { cents }))
    }
}

/// Returns the digit string `digits`, scaled so its first `point` digits are
/// whole cents, rounded half to even. `None` if the result exceeds `i64`.
fn round_to_cents(digits: &str, point: i64) -> Option<i64> {
    if digits.is_empty() || point < 0 {
        return Some(0);
    }
    // i64::MAX has 19 digits.
    if point > 19 {
        return None;
    }
    let point = usize::try_from(point).ok()?;
    let (kept, dropped) = digits.split_at(point.min(digits.len()));
    let mut cents: i64 = if kept.is_empty() { 0 } else { kept.parse().ok()? };
    for _ in kept.len()..point {
        cents = cents.checked_mul(10)?;
    }
    let mut dropped = dropped.bytes();
    let round_up = match dropped.next() {
        Some(b'6'..=b'9') => true,
        Some(b'5') => dropped.any(|b| b != b'0') || cents % 2 == 1,
        _ => false,
    };
    if round_up {
        cents = cents.checked_add(1)?;
    }
    Some(cents)
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
