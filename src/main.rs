// ==========================================
// 销售对账系统 - 命令行入口
// ==========================================
// 子命令: reconcile（对账并写出工作簿）/ summary（分析对账工作簿）
// 红线: 业务错误由库返回类型化错误,此处只负责格式化与退出码
// ==========================================

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use sales_recon::analytics::{self, Period, ViewFilter};
use sales_recon::config::{FilterSet, RunConfigFile, SourceSpec};
use sales_recon::importer::{FileSource, HeaderRow};
use sales_recon::{logging, OutputPaths, ReconciliationPipeline, WorkbookExporter};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "sales-recon", version, about = "销售台账对账与市场归因")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 对账: 读取台账/成本/年度导出,写出两个工作簿
    Reconcile(ReconcileArgs),
    /// 分析: 读取对账工作簿,输出 KPI/趋势/分组汇总（JSON）
    Summary(SummaryArgs),
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    /// JSON 配置文件（命令行参数覆盖同名字段）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 销售台账
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// 成本导出
    #[arg(long)]
    costs: Option<PathBuf>,

    /// 年度多分段导出
    #[arg(long)]
    annual: Option<PathBuf>,

    /// 台账表头行号（1 起）
    #[arg(long)]
    ledger_header_row: Option<String>,

    /// 年度导出表头行号（1 起）
    #[arg(long)]
    annual_header_row: Option<String>,

    /// 主工作簿输出路径
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// 第二工作簿输出路径（默认与主工作簿同目录的 output_file2.xlsx）
    #[arg(long)]
    secondary_output: Option<PathBuf>,

    /// 解析规则 JSON
    #[arg(long)]
    rules: Option<PathBuf>,

    /// 过滤列,逗号分隔
    #[arg(long)]
    filter_columns: Option<String>,

    /// 排除值: 逗号分隔各组,分号分隔组内取值
    #[arg(long)]
    filter_values: Option<String>,
}

#[derive(Args, Debug)]
struct SummaryArgs {
    /// 对账工作簿（reconcile 的主输出）
    #[arg(long)]
    ledger: PathBuf,

    /// 趋势周期: daily / weekly / monthly
    #[arg(long, default_value = "monthly")]
    period: Period,

    /// 销售额移动平均窗口
    #[arg(long)]
    moving_average: Option<usize>,

    /// 起始日期（含）YYYY-MM-DD
    #[arg(long)]
    from: Option<NaiveDate>,

    /// 截止日期（含）YYYY-MM-DD
    #[arg(long)]
    to: Option<NaiveDate>,

    /// 包含退货（贷项通知单）
    #[arg(long)]
    include_returns: bool,

    #[arg(long)]
    marketplace: Option<String>,

    #[arg(long)]
    branch: Option<String>,

    /// 产品类型（可重复）
    #[arg(long = "product-type")]
    product_types: Vec<String>,

    /// 排名条数
    #[arg(long, default_value_t = analytics::DEFAULT_RANKING_SIZE)]
    ranking_size: usize,
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Reconcile(args) => reconcile(args),
        Command::Summary(args) => summary(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("错误: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn reconcile(args: ReconcileArgs) -> Result<()> {
    let mut file = match &args.config {
        Some(path) => RunConfigFile::from_json_file(path)?,
        None => RunConfigFile::default(),
    };

    // ===== 命令行覆盖 =====
    if let Some(path) = args.ledger {
        file.ledger = Some(SourceSpec::override_path(file.ledger.take(), path));
    }
    if let Some(text) = &args.ledger_header_row {
        let source = file.ledger.as_mut().context("未指定销售台账 (--ledger)")?;
        source.header_row = HeaderRow::parse(&source.path.display().to_string(), text)?;
    }
    if let Some(path) = args.costs {
        file.costs = Some(SourceSpec::override_path(file.costs.take(), path));
    }
    if let Some(path) = args.annual {
        file.annual = Some(SourceSpec::override_path(file.annual.take(), path));
    }
    if let Some(text) = &args.annual_header_row {
        let source = file.annual.as_mut().context("未指定年度导出 (--annual)")?;
        source.header_row = HeaderRow::parse(&source.path.display().to_string(), text)?;
    }
    if let Some(path) = args.rules {
        file.rules_file = Some(path);
    }
    match (&args.filter_columns, &args.filter_values) {
        (None, None) => {}
        (columns, values) => {
            file.filters = Some(FilterSet::parse(
                columns.as_deref().unwrap_or(""),
                values.as_deref().unwrap_or(""),
            )?);
        }
    }

    let Some(output) = args.output.or(file.output.take()) else {
        bail!("未指定输出路径 (--output)");
    };
    let paths = match args.secondary_output.or(file.secondary_output.take()) {
        Some(secondary) => OutputPaths::new(output, secondary),
        None => OutputPaths::beside(output),
    };

    let pipeline = ReconciliationPipeline::new(file.into_run_config()?);
    let output = pipeline.run()?;
    WorkbookExporter::new().export(&output, &paths)?;

    println!("{}", serde_json::to_string_pretty(&output.run_report)?);
    Ok(())
}

fn summary(args: SummaryArgs) -> Result<()> {
    let ledger = analytics::load_reconciled(&FileSource::new(&args.ledger))
        .with_context(|| format!("无法读取对账工作簿 {}", args.ledger.display()))?;

    let mut filter = ViewFilter::new()
        .include_returns(args.include_returns)
        .date_range(args.from, args.to)
        .product_types(args.product_types);
    if let Some(marketplace) = args.marketplace {
        filter = filter.marketplace(marketplace);
    }
    if let Some(branch) = args.branch {
        filter = filter.branch(branch);
    }

    let result = analytics::analyze(
        &ledger,
        &filter,
        args.period,
        args.moving_average,
        args.ranking_size,
    );
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
