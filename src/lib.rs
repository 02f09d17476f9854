use std::path::{Path, PathBuf};
use std::process::ExitCode;
use anyhow::{Result, anyhow};
use clap::Parser;
use log::*;

pub mod borough_index;
pub mod config_manager;
pub mod dashboard;
pub mod sales_data_analyzer;
pub mod sales_data_manager;

use borough_index::BoroughIndex;
use config_manager::ConfigManager;
use dashboard::{Dashboard, DashboardState, FilterOptions};
use sales_data_analyzer::QuarterFilter;
use sales_data_manager::SalesDataManager;

#[derive(Parser, Debug)]
#[command(name = "seoul-sales-dashboard", version, about = "📊 서울시 상권 소비 주체 & 업종 분석 대시보드")]
pub struct Cli {
    /// 설정 파일 (없으면 기본값으로 생성)
    #[arg(long, default_value = "config.ini")]
    pub config: PathBuf,

    /// 추정매출 CSV 경로 (설정값 대신 사용)
    #[arg(long)]
    pub data: Option<PathBuf>,

    /// 자치구 (기본: 설정의 default_borough)
    #[arg(long)]
    pub borough: Option<String>,

    /// 분기 코드 또는 `전체`
    #[arg(long, default_value = "전체")]
    pub quarter: String,

    /// 업종 순위 표 크기
    #[arg(long)]
    pub top: Option<usize>,

    /// 선택 가능한 자치구/분기만 출력
    #[arg(long)]
    pub list: bool,

    /// JSON으로 출력
    #[arg(long)]
    pub json: bool,

    #[arg(short, long)]
    pub verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .try_init();
}

/// 선택된 자치구/분기에 대한 대시보드 상태. 로드 실패는 에러 상태로 돌려준다.
pub fn dashboard_state(
    manager: &SalesDataManager,
    dashboard: &Dashboard,
    data_path: &Path,
    borough: Option<&str>,
    preferred_borough: &str,
    quarter: QuarterFilter,
) -> DashboardState {
    let dataset = match manager.load(data_path) {
        Ok(dataset) => dataset,
        Err(e) => {
            error!("{}", e);
            return DashboardState::Error { message: e.to_string() };
        }
    };

    let options = FilterOptions::from_dataset(&dataset, preferred_borough);
    let selected = match borough.map(str::to_string).or(options.default_borough) {
        Some(b) => b,
        None => {
            let message = "분류된 자치구가 없습니다.".to_string();
            warn!("{}", message);
            return DashboardState::Warning { message };
        }
    };

    dashboard.build(&dataset, &selected, quarter)
}

/// 화면에 이미 출력된 에러 상태는 종료 코드로만 알린다.
pub fn exit_code_for(state: &DashboardState) -> ExitCode {
    match state {
        DashboardState::Error { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_manager = ConfigManager::new(&cli.config)?;
    let config = &config_manager.config;

    let data_path = cli.data.clone().unwrap_or_else(|| config_manager.get_csv_path());
    let top_n = cli.top.unwrap_or(config.dashboard.top_n);
    let quarter = QuarterFilter::parse(&cli.quarter)
        .ok_or_else(|| anyhow!("분기 값이 올바르지 않습니다: {}", cli.quarter))?;
    let preferred_borough = config_manager.get_default_borough();

    let manager = SalesDataManager::new(BoroughIndex::default())
        .with_encoding(&config_manager.get_encoding())?;
    debug!("키워드 {}개, 데이터: {}", manager.index().len(), data_path.display());

    if cli.list {
        let dataset = manager.load_or_empty(&data_path);
        let options = FilterOptions::from_dataset(&dataset, &preferred_borough);
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&options)?);
        } else {
            print!("{}", dashboard::render_options(&options));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let state = dashboard_state(
        &manager,
        &Dashboard::new(top_n),
        &data_path,
        cli.borough.as_deref(),
        &preferred_borough,
        quarter,
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        print!("{}", dashboard::render_text(&state));
    }

    Ok(exit_code_for(&state))
}
