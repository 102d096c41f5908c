use std::{collections::HashMap, fmt::Display, hash::Hash};

use crate::{Amount, Dataset, Record};

/// Column heading for summed amounts.
pub const AMOUNT_LABEL: &str = "銷售金額";
/// Column heading for summed quantities.
pub const QUANTITY_LABEL: &str = "銷售數量";
const TOTAL_LABEL: &str = "合計";

/// An attribute that sales records can be grouped by.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Dimension {
    Product,
    Region,
    Salesperson,
    Month,
}

impl Dimension {
    /// All dimensions, in report order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Product,
        Dimension::Region,
        Dimension::Salesperson,
        Dimension::Month,
    ];

    /// Returns the heading used for this dimension's key column.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Product => "產品",
            Dimension::Region => "地區",
            Dimension::Salesperson => "業務員",
            Dimension::Month => "月份",
        }
    }
}

/// Summed amount and quantity for one distinct key of a grouping.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AggregateRow<K = String> {
    pub key: K,
    pub amount: Amount,
    pub quantity: i64,
}

impl<K> AggregateRow<K> {
    fn new(key: K) -> Self {
        Self {
            key,
            amount: Amount::default(),
            quantity: 0,
        }
    }
}

impl<K: Display> AggregateRow<K> {
    /// Replaces the key with its display label.
    #[must_use]
    pub fn labelled(self) -> AggregateRow {
        AggregateRow {
            key: self.key.to_string(),
            amount: self.amount,
            quantity: self.quantity,
        }
    }
}

/// Partitions the records of `dataset` by `key_fn`, summing amount and
/// quantity within each partition.
///
/// Returns one row per distinct key, in the order each key was first seen.
/// The sums cannot overflow, since a [`Dataset`] only holds records whose
/// totals fit.
///
/// # Examples
///
/// ```
/// # use sales_report::{group_sum, Dataset};
/// let data = "date,product,region,salesperson,amount,quantity
/// 2024-01-05,A,North,Alice,100,2
/// 2024-01-10,B,South,Bob,200,1
/// 2024-02-01,A,North,Alice,50,1
/// ";
/// let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
/// let rows = group_sum(&dataset, |r| r.product.clone());
/// assert_eq!(rows[0].key, "A");
/// assert_eq!(rows[0].amount.to_string(), "150.00");
/// assert_eq!(rows[0].quantity, 3);
/// assert_eq!(rows[1].key, "B");
/// ```
pub fn group_sum<K, F>(dataset: &Dataset, key_fn: F) -> Vec<AggregateRow<K>>
where
    K: Clone + Eq + Hash,
    F: Fn(&Record) -> K,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut rows: Vec<AggregateRow<K>> = Vec::new();
    for record in dataset.records() {
        let key = key_fn(record);
        let i = *index.entry(key.clone()).or_insert_with(|| {
            rows.push(AggregateRow::new(key));
            rows.len() - 1
        });
        rows[i].amount += record.amount;
        rows[i].quantity += record.quantity;
    }
    rows
}

/// The aggregate rows of one dimension, in report order.
///
/// Product, region and salesperson rows are sorted by amount, largest first;
/// rows with equal amounts are sorted by key. Month rows are in chronological
/// order.
#[derive(Clone, Debug)]
pub struct Breakdown {
    dimension: Dimension,
    rows: Vec<AggregateRow>,
}

impl Breakdown {
    #[must_use]
    pub fn for_dimension(dataset: &Dataset, dimension: Dimension) -> Self {
        let rows = match dimension {
            Dimension::Product => by_amount(group_sum(dataset, |r| r.product.clone())),
            Dimension::Region => by_amount(group_sum(dataset, |r| r.region.clone())),
            Dimension::Salesperson => by_amount(group_sum(dataset, |r| r.salesperson.clone())),
            Dimension::Month => {
                let mut rows = group_sum(dataset, Record::month);
                rows.sort_by_key(|row| row.key);
                rows.into_iter().map(AggregateRow::labelled).collect()
            }
        };
        log::debug!("{dimension:?}: {} groups", rows.len());
        Self { dimension, rows }
    }

    /// Returns a breakdown for every dimension, in report order.
    #[must_use]
    pub fn all(dataset: &Dataset) -> Vec<Self> {
        Dimension::ALL
            .into_iter()
            .map(|dimension| Self::for_dimension(dataset, dimension))
            .collect()
    }

    #[must_use]
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    #[must_use]
    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn total_amount(&self) -> Amount {
        self.rows.iter().map(|row| row.amount).sum()
    }

    #[must_use]
    pub fn total_quantity(&self) -> i64 {
        self.rows.iter().map(|row| row.quantity).sum()
    }
}

fn by_amount(mut rows: Vec<AggregateRow>) -> Vec<AggregateRow> {
    rows.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.key.cmp(&b.key)));
    rows
}

/// Returns the number of terminal columns `text` occupies.
///
/// East Asian wide and fullwidth characters take two columns, everything
/// else one.
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match u32::from(c) {
            0x1100..=0x115F
            | 0x2E80..=0x303E
            | 0x3041..=0x33FF
            | 0x3400..=0x4DBF
            | 0x4E00..=0x9FFF
            | 0xA000..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x1F300..=0x1F64F
            | 0x1F900..=0x1F9FF
            | 0x20000..=0x2FFFD
            | 0x30000..=0x3FFFD => 2,
            _ => 1,
        })
        .sum()
}

/// Left-aligns `text` in `width` terminal columns.
fn pad(text: &str, width: usize) -> String {
    format!("{text}{}", " ".repeat(width.saturating_sub(display_width(text))))
}

impl Display for Breakdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = self.dimension.label();
        let width = self
            .rows
            .iter()
            .map(|row| display_width(&row.key))
            .chain([display_width(label), display_width(TOTAL_LABEL)])
            .max()
            .unwrap_or_default();
        // The headings are two columns wider per character than `{:>}` counts.
        let amount_width = 14 - display_width(AMOUNT_LABEL) + AMOUNT_LABEL.chars().count();
        let quantity_width = 8 - display_width(QUANTITY_LABEL) + QUANTITY_LABEL.chars().count();
        writeln!(
            f,
            "{} {AMOUNT_LABEL:>amount_width$} {QUANTITY_LABEL:>quantity_width$}",
            pad(label, width)
        )?;
        let length = width + 24;
        writeln!(f, "{:-<length$}", "")?;
        for row in &self.rows {
            writeln!(f, "{} {:>14} {:>8}", pad(&row.key, width), row.amount, row.quantity)?;
        }
        writeln!(f, "{:-<length$}", "")?;
        writeln!(
            f,
            "{} {:>14} {:>8}",
            pad(TOTAL_LABEL, width),
            self.total_amount(),
            self.total_quantity()
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::Summary;

    fn row(key: &str, amount: &str, quantity: i64) -> AggregateRow {
        AggregateRow {
            key: key.into(),
            amount: Amount::from_str(amount).unwrap(),
            quantity,
        }
    }

    #[test]
    fn group_sum_fn_keeps_first_seen_key_order() {
        let dataset = Dataset::read_csv("testdata/example.csv").unwrap();
        let rows = group_sum(&dataset, |r| r.product.clone());
        assert_eq!(rows, vec![row("A", "150", 3), row("B", "200", 1)]);
    }

    #[test]
    fn for_dimension_fn_sorts_products_by_amount_descending() {
        let dataset = Dataset::read_csv("testdata/example.csv").unwrap();
        let breakdown = Breakdown::for_dimension(&dataset, Dimension::Product);
        assert_eq!(breakdown.rows(), [row("B", "200", 1), row("A", "150", 3)]);
    }

    #[test]
    fn for_dimension_fn_orders_months_chronologically() {
        let dataset = Dataset::read_csv("testdata/example.csv").unwrap();
        let breakdown = Breakdown::for_dimension(&dataset, Dimension::Month);
        assert_eq!(breakdown.rows(), [row("2024-01", "300", 3), row("2024-02", "50", 1)]);
    }

    #[test]
    fn for_dimension_fn_orders_months_across_years() {
        let data = "date,product,region,salesperson,amount,quantity
2025-01-02,A,North,Alice,10,1
2024-12-30,A,North,Alice,90,1
2024-02-01,A,North,Alice,5,1
";
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let breakdown = Breakdown::for_dimension(&dataset, Dimension::Month);
        let keys: Vec<_> = breakdown.rows().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-02", "2024-12", "2025-01"]);
    }

    #[test]
    fn for_dimension_fn_breaks_amount_ties_by_key() {
        let data = "date,product,region,salesperson,amount,quantity
2024-01-05,Zeta,North,Alice,100,1
2024-01-06,Alpha,North,Alice,100,2
2024-01-07,Mid,North,Alice,300,1
";
        let dataset = Dataset::from_reader(data.as_bytes()).unwrap();
        let breakdown = Breakdown::for_dimension(&dataset, Dimension::Product);
        let keys: Vec<_> = breakdown.rows().iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["Mid", "Alpha", "Zeta"]);
    }

    #[test]
    fn for_dimension_fn_sorts_sales_data_as_expected() {
        let dataset = Dataset::read_csv("testdata/sales_data.csv").unwrap();
        let keys = |dimension| {
            Breakdown::for_dimension(&dataset, dimension)
                .rows()
                .iter()
                .map(|r| r.key.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(Dimension::Product), vec!["筆記型電腦", "螢幕", "鍵盤", "滑鼠"]);
        assert_eq!(keys(Dimension::Region), vec!["台北", "台中", "高雄"]);
        assert_eq!(keys(Dimension::Salesperson), vec!["王小明", "李美玲", "陳大文"]);
        assert_eq!(keys(Dimension::Month), vec!["2024-01", "2024-02", "2024-03", "2024-04"]);
    }

    #[test]
    fn breakdowns_conserve_totals_and_distinct_counts() {
        let dataset = Dataset::read_csv("testdata/sales_data.csv").unwrap();
        let summary = Summary::of(&dataset);
        for breakdown in Breakdown::all(&dataset) {
            let dimension = breakdown.dimension();
            assert_eq!(breakdown.total_amount(), summary.total_amount, "{dimension:?}");
            assert_eq!(breakdown.total_quantity(), summary.total_quantity, "{dimension:?}");
            let rows = breakdown.rows();
            if dimension == Dimension::Month {
                assert!(rows.windows(2).all(|w| w[0].key <= w[1].key), "{dimension:?}");
            } else {
                assert!(rows.windows(2).all(|w| w[0].amount >= w[1].amount), "{dimension:?}");
            }
        }
        let len = |dimension| Breakdown::for_dimension(&dataset, dimension).len();
        assert_eq!(len(Dimension::Product), summary.products);
        assert_eq!(len(Dimension::Region), summary.regions);
        assert_eq!(len(Dimension::Salesperson), summary.salespeople);
    }

    #[test]
    fn for_dimension_fn_returns_no_rows_for_empty_dataset() {
        let breakdown = Breakdown::for_dimension(&Dataset::default(), Dimension::Region);
        assert!(breakdown.is_empty());
        assert_eq!(breakdown.total_amount(), Amount::default());
    }

    #[test]
    fn display_fn_prints_rows_and_total() {
        let dataset = Dataset::read_csv("testdata/example.csv").unwrap();
        let text = Breakdown::for_dimension(&dataset, Dimension::Product).to_string();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert!(lines[2].starts_with("B "), "{text}");
        assert!(lines[2].ends_with("200.00        1"), "{text}");
        assert!(lines[5].starts_with("合計"), "{text}");
        assert!(lines[5].ends_with("350.00        4"), "{text}");
    }

    #[test]
    fn display_width_fn_counts_wide_characters_twice() {
        assert_eq!(display_width(""), 0);
        assert_eq!(display_width("Mouse"), 5);
        assert_eq!(display_width("滑鼠"), 4);
        assert_eq!(display_width("業務員"), 6);
        assert_eq!(display_width("2024-01"), 7);
        assert_eq!(display_width("ＡＢ"), 4);
        assert_eq!(display_width("한국"), 4);
        assert_eq!(display_width("USB 隨身碟"), 10);
    }

    #[test]
    fn display_fn_aligns_columns_for_wide_characters() {
        let dataset = Dataset::read_csv("testdata/sales_data.csv").unwrap();
        let text = Breakdown::for_dimension(&dataset, Dimension::Product).to_string();
        let widths: Vec<_> = text.lines().map(display_width).collect();
        assert!(widths.iter().all(|w| *w == widths[0]), "{text}");
        let line = text.lines().find(|l| l.starts_with("滑鼠")).unwrap();
        assert_eq!(line, "滑鼠             2,400.00       16");
    }
}
