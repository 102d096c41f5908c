use rust_xlsxwriter::{
    Chart, ChartType, ColNum, Color, Format, FormatBorder, FormatPattern, RowNum, Workbook,
    XlsxError,
};

use std::path::Path;

use crate::{
    groups::{AMOUNT_LABEL, QUANTITY_LABEL},
    Breakdown, Dimension, Error, Result, Summary,
};

const OVERVIEW_SHEET: &str = "概況";
const REPORT_TITLE: &str = "銷售資料分析報告";
const HEADER_COLOR: u32 = 0x4472C4;

// Cell positions on the dimension sheets, zero-based.
const HEADER_ROW: RowNum = 2;
const FIRST_DATA_ROW: RowNum = 3;
const CHART_ROW: RowNum = 11;
const KEY_COL: ColNum = 0;
const AMOUNT_COL: ColNum = 1;
const QUANTITY_COL: ColNum = 2;

struct SheetLayout {
    name: &'static str,
    title: &'static str,
    chart_title: &'static str,
}

impl SheetLayout {
    fn for_dimension(dimension: Dimension) -> Self {
        match dimension {
            Dimension::Product => Self {
                name: "產品銷售",
                title: "產品銷售統計",
                chart_title: "產品銷售金額",
            },
            Dimension::Region => Self {
                name: "地區銷售",
                title: "地區銷售統計",
                chart_title: "各地區銷售佔比",
            },
            Dimension::Salesperson => Self {
                name: "業務銷售",
                title: "業務員銷售統計",
                chart_title: "業務員銷售金額",
            },
            Dimension::Month => Self {
                name: "月份趨勢",
                title: "月份銷售趨勢",
                chart_title: "月份銷售趨勢",
            },
        }
    }
}

struct Formats {
    report_title: Format,
    sheet_title: Format,
    label: Format,
    header: Format,
    amount: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            report_title: Format::new().set_bold().set_font_size(16),
            sheet_title: Format::new().set_bold().set_font_size(14),
            label: Format::new().set_bold(),
            header: Format::new()
                .set_bold()
                .set_font_color(Color::White)
                .set_pattern(FormatPattern::Solid)
                .set_background_color(Color::RGB(HEADER_COLOR))
                .set_border(FormatBorder::Thin),
            amount: Format::new().set_num_format("#,##0"),
        }
    }
}

/// Builds the spreadsheet report.
///
/// The workbook is held in memory until [`Report::save`] is called, so a
/// failure while building it leaves nothing on disk.
///
/// # Examples
///
/// ```no_run
/// # use sales_report::{Breakdown, Dataset, Report, Summary};
/// # fn main() -> sales_report::Result<()> {
/// let dataset = Dataset::read_csv("sales_data.csv")?;
/// let mut report = Report::build(&Summary::of(&dataset), &Breakdown::all(&dataset), "NT$")?;
/// report.save("report.xlsx")?;
/// # Ok(())
/// # }
/// ```
pub struct Report {
    workbook: Workbook,
    formats: Formats,
    currency: String,
}

impl Report {
    /// Creates an empty report. `currency` prefixes amounts on the overview
    /// sheet and in chart axis titles.
    #[must_use]
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            workbook: Workbook::new(),
            formats: Formats::new(),
            currency: currency.into(),
        }
    }

    /// Creates a report with the overview sheet followed by one sheet per
    /// breakdown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workbook`] if any sheet cannot be laid out.
    pub fn build(summary: &Summary, breakdowns: &[Breakdown], currency: &str) -> Result<Self> {
        let mut report = Self::new(currency);
        report.add_overview(summary)?;
        for breakdown in breakdowns {
            report.add_breakdown(breakdown)?;
        }
        Ok(report)
    }

    /// Adds the overview sheet: a title and one label/value row per
    /// whole-dataset statistic.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workbook`] if the sheet cannot be written.
    pub fn add_overview(&mut self, summary: &Summary) -> Result<()> {
        let rows = overview_rows(summary, &self.currency);
        let sheet = self.workbook.add_worksheet().set_name(OVERVIEW_SHEET)?;
        sheet.merge_range(0, 0, 0, 1, REPORT_TITLE, &self.formats.report_title)?;
        for (row, (label, value)) in (2..).zip(rows) {
            sheet.write_string_with_format(row, 0, label, &self.formats.label)?;
            sheet.write_string(row, 1, value)?;
        }
        sheet.set_column_width(0, 15)?;
        sheet.set_column_width(1, 20)?;
        log::info!("wrote sheet {OVERVIEW_SHEET}");
        Ok(())
    }

    /// Adds a sheet holding the breakdown's rows and a chart of their amounts.
    ///
    /// A breakdown with no rows gets the title and header only, since there
    /// is nothing to chart.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workbook`] if the sheet cannot be written.
    pub fn add_breakdown(&mut self, breakdown: &Breakdown) -> Result<()> {
        let layout = SheetLayout::for_dimension(breakdown.dimension());
        let rows = RowNum::try_from(breakdown.len()).map_err(|_| XlsxError::RowColumnLimitError)?;
        let sheet = self.workbook.add_worksheet().set_name(layout.name)?;
        sheet.merge_range(0, KEY_COL, 0, QUANTITY_COL, layout.title, &self.formats.sheet_title)?;
        let headers = [breakdown.dimension().label(), AMOUNT_LABEL, QUANTITY_LABEL];
        for (col, header) in (KEY_COL..).zip(headers) {
            sheet.write_string_with_format(HEADER_ROW, col, header, &self.formats.header)?;
        }
        for (row, aggregate) in (FIRST_DATA_ROW..).zip(breakdown.rows()) {
            sheet.write_string(row, KEY_COL, &aggregate.key)?;
            sheet.write_number_with_format(row, AMOUNT_COL, aggregate.amount.as_f64(), &self.formats.amount)?;
            #[allow(clippy::cast_precision_loss)]
            let quantity = aggregate.quantity as f64;
            sheet.write_number(row, QUANTITY_COL, quantity)?;
        }
        sheet.set_column_width(KEY_COL, 12)?;
        sheet.set_column_width(AMOUNT_COL, 15)?;
        sheet.set_column_width(QUANTITY_COL, 12)?;
        if rows > 0 {
            let chart = chart(&layout, breakdown.dimension(), HEADER_ROW + rows, &self.currency);
            sheet.insert_chart(CHART_ROW, KEY_COL, &chart)?;
        }
        log::info!("wrote sheet {} ({rows} rows)", layout.name);
        Ok(())
    }

    /// Writes the workbook to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if the file cannot be created or written.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.workbook.save(path).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("saved report to {}", path.display());
        Ok(())
    }
}

fn overview_rows(summary: &Summary, currency: &str) -> [(&'static str, String); 7] {
    [
        ("總銷售金額", format!("{currency}{}", summary.total_amount.whole())),
        ("總銷售數量", format!("{} 個", summary.total_quantity)),
        ("銷售記錄數", format!("{} 筆", summary.records)),
        ("日期範圍", summary.date_range().unwrap_or_else(|| "-".into())),
        ("產品種類", format!("{} 種", summary.products)),
        ("銷售地區", format!("{} 個", summary.regions)),
        ("業務人員", format!("{} 人", summary.salespeople)),
    ]
}

/// Charts the amount column, titled by its header cell, against the key
/// column, over data rows up to and including `last_row`.
///
/// Regions get a pie chart of their share of the total; months a line chart;
/// everything else a column chart.
fn chart(layout: &SheetLayout, dimension: Dimension, last_row: RowNum, currency: &str) -> Chart {
    let mut chart = Chart::new(match dimension {
        Dimension::Region => ChartType::Pie,
        Dimension::Month => ChartType::Line,
        Dimension::Product | Dimension::Salesperson => ChartType::Column,
    });
    chart.title().set_name(layout.chart_title);
    chart
        .add_series()
        .set_name((layout.name, HEADER_ROW, AMOUNT_COL))
        .set_categories((layout.name, FIRST_DATA_ROW, KEY_COL, last_row, KEY_COL))
        .set_values((layout.name, FIRST_DATA_ROW, AMOUNT_COL, last_row, AMOUNT_COL));
    if dimension != Dimension::Region {
        let amount_axis = format!("金額 ({currency})");
        chart.x_axis().set_name(dimension.label());
        chart.y_axis().set_name(amount_axis.as_str());
    }
    chart
}
