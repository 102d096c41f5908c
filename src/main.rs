use anyhow::{Context, Result};
use clap::Parser;
use sales_report::{Breakdown, Dataset, Dimension, Report, Summary};

use std::{
    io::{self, Write},
    path::PathBuf,
};

const RULE: &str = "============================================================";

/// Analyses sales records from a CSV file and writes a spreadsheet report
/// with summary tables and charts.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// CSV file of sales records
    #[arg(default_value = "sales_data.csv")]
    input: PathBuf,
    /// Where to write the spreadsheet report
    #[arg(short, long, default_value = "銷售分析報告.xlsx")]
    output: PathBuf,
    /// Currency symbol for amounts in the report
    #[arg(long, default_value = "NT$")]
    currency: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    run(&args, &mut io::stdout().lock())
}

fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    let dataset = Dataset::read_csv(&args.input)?;
    let summary = Summary::of(&dataset);
    let breakdowns = Breakdown::all(&dataset);
    let mut report = Report::build(&summary, &breakdowns, &args.currency)?;
    report.save(&args.output)?;
    print_summary(out, &summary, &breakdowns, &args.currency).context("writing summary")?;
    writeln!(out, "\n{RULE}")?;
    writeln!(out, "✓ Excel 報告已生成: {}", args.output.display())?;
    writeln!(out, "{RULE}")?;
    Ok(())
}

fn print_summary(
    out: &mut impl Write,
    summary: &Summary,
    breakdowns: &[Breakdown],
    currency: &str,
) -> io::Result<()> {
    writeln!(out, "{RULE}")?;
    writeln!(out, "銷售資料分析")?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "\n1. 基本統計信息:")?;
    writeln!(out, "   - 總記錄數: {}", summary.records)?;
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        writeln!(out, "   - 日期範圍: {first} 到 {last}")?;
    }
    writeln!(out, "   - 總銷售金額: {currency}{}", summary.total_amount.whole())?;
    writeln!(out, "   - 總銷售數量: {} 個", summary.total_quantity)?;
    for (n, breakdown) in (2..).zip(breakdowns) {
        writeln!(out, "\n{n}. {}:", heading(breakdown.dimension()))?;
        write!(out, "{breakdown}")?;
    }
    Ok(())
}

fn heading(dimension: Dimension) -> &'static str {
    match dimension {
        Dimension::Product => "產品銷售統計",
        Dimension::Region => "地區銷售統計",
        Dimension::Salesperson => "業務員銷售統計",
        Dimension::Month => "月份銷售統計",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(input: &str, output: PathBuf) -> Args {
        Args {
            input: input.into(),
            output,
            currency: "NT$".into(),
        }
    }

    #[test]
    fn args_default_to_fixed_paths() {
        let args = Args::parse_from(["sales-report"]);
        assert_eq!(args.input, PathBuf::from("sales_data.csv"));
        assert_eq!(args.output, PathBuf::from("銷售分析報告.xlsx"));
        assert_eq!(args.currency, "NT$");
    }

    #[test]
    fn run_fn_writes_report_and_prints_five_analyses() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.xlsx");
        let mut out = Vec::new();
        run(&args("testdata/example.csv", output.clone()), &mut out).unwrap();
        assert!(output.exists());
        let text = String::from_utf8(out).unwrap();
        for section in ["1. 基本統計信息", "2. 產品銷售統計", "3. 地區銷售統計", "4. 業務員銷售統計", "5. 月份銷售統計"] {
            assert!(text.contains(section), "missing {section}:\n{text}");
        }
        assert!(text.contains("   - 總銷售金額: NT$350"), "{text}");
        assert!(text.contains("   - 日期範圍: 2024-01-05 到 2024-02-01"), "{text}");
        assert!(text.contains(&format!("✓ Excel 報告已生成: {}", output.display())), "{text}");
    }

    #[test]
    fn run_fn_aborts_on_bad_amount_without_writing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.xlsx");
        let mut out = Vec::new();
        let err = run(&args("testdata/bad_amount.csv", output.clone()), &mut out).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<sales_report::Error>(),
            Some(sales_report::Error::Parse { .. })
        ));
        assert!(!output.exists());
        assert!(out.is_empty());
    }
}
