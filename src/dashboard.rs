use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use log::*;

use crate::borough_index::UNCLASSIFIED;
use crate::sales_data_analyzer::{
    AggregateSummary, AgeBracketTotal, AnalysisError, CategoryMean, FilteredView, QuarterFilter,
    SalesDataAnalyzer, ALL_QUARTERS_LABEL,
};
use crate::sales_data_manager::SalesDataset;

/// 사이드바 필터에 들어갈 선택지
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub boroughs: Vec<String>,
    pub default_borough: Option<String>,
    /// `전체` 다음 분기 코드 내림차순
    pub quarters: Vec<String>,
}

impl FilterOptions {
    pub fn from_dataset(dataset: &SalesDataset, preferred_borough: &str) -> Self {
        let boroughs: Vec<String> = dataset
            .records
            .iter()
            .map(|r| r.borough.as_str())
            .filter(|b| *b != UNCLASSIFIED)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let default_borough = boroughs
            .iter()
            .find(|b| b.as_str() == preferred_borough)
            .or_else(|| boroughs.first())
            .cloned();

        let quarter_codes: BTreeSet<i64> = dataset.records.iter().map(|r| r.quarter_code).collect();
        let quarters = std::iter::once(ALL_QUARTERS_LABEL.to_string())
            .chain(quarter_codes.into_iter().rev().map(|q| q.to_string()))
            .collect();

        FilterOptions {
            boroughs,
            default_borough,
            quarters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderShare {
    pub label: String,
    pub sales: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardReport {
    pub borough: String,
    pub quarter: String,
    pub total_sales_display: String,
    pub main_age_group: String,
    pub summary: AggregateSummary,
    pub top_categories: Vec<CategoryMean>,
    pub gender: Vec<GenderShare>,
    pub insights: Vec<String>,
}

/// 화면 상태: 정상 리포트, 경고(빈 결과), 에러(로드 실패)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DashboardState {
    Ready { report: Box<DashboardReport> },
    Warning { message: String },
    Error { message: String },
}

pub struct Dashboard {
    top_n: usize,
}

impl Dashboard {
    pub fn new(top_n: usize) -> Self {
        Dashboard { top_n: top_n.max(1) }
    }

    pub fn build(&self, dataset: &SalesDataset, borough: &str, quarter: QuarterFilter) -> DashboardState {
        let view = FilteredView::new(dataset, borough, quarter);
        debug!("{} / {}: {}행", borough, quarter, view.len());

        match SalesDataAnalyzer::summarize(&view) {
            Ok(summary) => DashboardState::Ready {
                report: Box::new(self.report(borough, quarter, summary)),
            },
            Err(AnalysisError::EmptyView) => {
                let message = AnalysisError::EmptyView.to_string();
                warn!("{} ({} / {})", message, borough, quarter);
                DashboardState::Warning { message }
            }
        }
    }

    fn report(&self, borough: &str, quarter: QuarterFilter, summary: AggregateSummary) -> DashboardReport {
        let main_age_group = summary
            .dominant_age
            .as_ref()
            .map(|a| a.label.clone())
            .unwrap_or_else(|| "-".to_string());

        let gender_total = summary.male_sales + summary.female_sales;
        let ratio = |v: f64| if gender_total > 0.0 { v / gender_total } else { 0.0 };
        let gender = vec![
            GenderShare { label: "남성".to_string(), sales: summary.male_sales, ratio: ratio(summary.male_sales) },
            GenderShare { label: "여성".to_string(), sales: summary.female_sales, ratio: ratio(summary.female_sales) },
        ];

        let insights = vec![
            format!("이 지역의 가장 강력한 소비 권력은 {}입니다.", main_age_group),
            format!(
                "{} 업종이 개별 상권당 평균 {}원의 매출을 기록하며 시장을 리드하고 있습니다.",
                summary.top_category.category,
                format_thousands(summary.top_category.mean_sales)
            ),
        ];

        DashboardReport {
            borough: borough.to_string(),
            quarter: quarter.to_string(),
            total_sales_display: format!("₩{}", format_thousands(summary.total_sales)),
            main_age_group,
            top_categories: summary.category_ranking.iter().take(self.top_n).cloned().collect(),
            gender,
            insights,
            summary,
        }
    }
}

/// 소수점 이하는 버리고 천 단위 콤마
pub fn format_thousands(value: f64) -> String {
    let truncated = value.trunc() as i64;
    let digits = truncated.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if truncated < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn render_options(options: &FilterOptions) -> String {
    let mut lines = vec![
        "🔍 분석 필터".to_string(),
        format!("자치구: {}", options.boroughs.join(", ")),
    ];
    if let Some(default) = &options.default_borough {
        lines.push(format!("기본 자치구: {}", default));
    }
    lines.push(format!("분기: {}", options.quarters.join(", ")));
    lines.join("\n") + "\n"
}

pub fn render_text(state: &DashboardState) -> String {
    match state {
        DashboardState::Error { message } => format!("❌ {}\n", message),
        DashboardState::Warning { message } => format!("⚠️ {}\n", message),
        DashboardState::Ready { report } => render_report(report),
    }
}

fn render_report(report: &DashboardReport) -> String {
    let summary = &report.summary;
    let mut lines = vec![
        format!("📍 {} 상권 요약 ({})", report.borough, report.quarter),
        format!("  총 매출액: {}", report.total_sales_display),
        format!("  주 소비 연령대: {}", report.main_age_group),
        format!("  최고 평균 매출 업종: {}", summary.top_category.category),
        String::new(),
        "👥 연령대별 매출 분포".to_string(),
    ];

    for AgeBracketTotal { label, total } in &summary.age_totals {
        lines.push(format!("  {:<6} {:>20}", label, format_thousands(*total)));
    }
    lines.push(String::new());

    lines.push("🚻 성별 매출 비중".to_string());
    for share in &report.gender {
        lines.push(format!(
            "  {:<4} {:>20} ({:.1}%)",
            share.label,
            format_thousands(share.sales),
            share.ratio * 100.0
        ));
    }
    lines.push(String::new());

    lines.push(format!(
        "🏢 {} 업종별 평균 매출액 순위 (Top {})",
        report.borough,
        report.top_categories.len()
    ));
    for (rank, entry) in report.top_categories.iter().enumerate() {
        lines.push(format!(
            "  {:>2}. {:<20} {:>20}원",
            rank + 1,
            entry.category,
            format_thousands(entry.mean_sales)
        ));
    }
    lines.push(String::new());

    lines.push(format!("💡 {} 분석 인사이트:", report.borough));
    lines.extend(report.insights.iter().map(|line| format!("  - {}", line)));

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sales_data_manager::{AgeBracket, SalesRecord};

    fn record(borough: &str, quarter: i64, category: &str, amount: f64) -> SalesRecord {
        SalesRecord {
            area_name: format!("{} 상권", borough),
            quarter_code: quarter,
            category: category.to_string(),
            sales_amount: amount,
            sales_count: 1.0,
            age_sales: vec![amount * 0.25, amount * 0.75],
            male_sales: amount * 0.4,
            female_sales: amount * 0.6,
            borough: borough.to_string(),
        }
    }

    fn dataset() -> SalesDataset {
        SalesDataset {
            age_brackets: vec![
                AgeBracket::from_column("연령대_20_매출_금액"),
                AgeBracket::from_column("연령대_30_매출_금액"),
            ],
            records: vec![
                record("마포구", 20231, "커피-음료", 1000.0),
                record("강남구", 20224, "한식음식점", 2500.5),
                record("강남구", 20231, "한식음식점", 1500.0),
                record("강남구", 20231, "일식음식점", 4000.0),
                record(UNCLASSIFIED, 20232, "편의점", 10.0),
            ],
        }
    }

    #[test]
    fn options_exclude_unclassified_and_sort_quarters_descending() {
        let options = FilterOptions::from_dataset(&dataset(), "강남구");
        assert_eq!(options.boroughs, vec!["강남구", "마포구"]);
        assert_eq!(options.default_borough.as_deref(), Some("강남구"));
        assert_eq!(options.quarters, vec!["전체", "20232", "20231", "20224"]);
    }

    #[test]
    fn default_borough_falls_back_to_first_option() {
        let options = FilterOptions::from_dataset(&dataset(), "송파구");
        assert_eq!(options.default_borough.as_deref(), Some("강남구"));

        let empty = FilterOptions::from_dataset(&SalesDataset::default(), "강남구");
        assert!(empty.boroughs.is_empty());
        assert_eq!(empty.default_borough, None);
        assert_eq!(empty.quarters, vec!["전체"]);
    }

    #[test]
    fn builds_report_for_borough() {
        let state = Dashboard::new(10).build(&dataset(), "강남구", QuarterFilter::All);
        let report = match state {
            DashboardState::Ready { report } => report,
            other => panic!("unexpected state: {:?}", other),
        };

        assert_eq!(report.total_sales_display, "₩8,000");
        assert_eq!(report.main_age_group, "30대");
        assert_eq!(report.summary.top_category.category, "일식음식점");
        assert_eq!(report.top_categories.len(), 2);
        assert_eq!(report.gender[0].label, "남성");
        assert!((report.gender[0].ratio - 0.4).abs() < 1e-9);
        assert!(report.insights[1].contains("일식음식점"));
        assert!(report.insights[1].contains("4,000원"));
    }

    #[test]
    fn top_n_limits_ranking_table() {
        let state = Dashboard::new(1).build(&dataset(), "강남구", QuarterFilter::All);
        match state {
            DashboardState::Ready { report } => {
                assert_eq!(report.top_categories.len(), 1);
                assert_eq!(report.summary.category_ranking.len(), 2);
            }
            other => panic!("unexpected state: {:?}", other),
        }
    }

    #[test]
    fn empty_selection_is_a_warning() {
        let state = Dashboard::new(10).build(&dataset(), "마포구", QuarterFilter::Quarter(20224));
        assert_eq!(
            state,
            DashboardState::Warning {
                message: "선택한 조건에 해당하는 데이터가 없습니다.".to_string()
            }
        );
        assert!(render_text(&state).starts_with("⚠️"));
    }

    #[test]
    fn text_rendering_contains_panels() {
        let state = Dashboard::new(10).build(&dataset(), "강남구", QuarterFilter::Quarter(20231));
        let text = render_text(&state);
        assert!(text.contains("📍 강남구 상권 요약 (20231)"));
        assert!(text.contains("₩5,500"));
        assert!(text.contains("연령대별 매출 분포"));
        assert!(text.contains("성별 매출 비중"));
        assert!(text.contains("1. 일식음식점"));
    }

    #[test]
    fn options_rendering_lists_every_choice() {
        let options = FilterOptions::from_dataset(&dataset(), "강남구");
        let text = render_options(&options);
        assert_eq!(
            text,
            "🔍 분석 필터\n자치구: 강남구, 마포구\n기본 자치구: 강남구\n분기: 전체, 20232, 20231, 20224\n"
        );
    }

    #[test]
    fn text_rendering_ends_with_insights() {
        let state = Dashboard::new(10).build(&dataset(), "강남구", QuarterFilter::All);
        let text = render_text(&state);
        assert!(text.ends_with("시장을 리드하고 있습니다.\n"));
        assert!(text.contains("💡 강남구 분석 인사이트:\n  - 이 지역의 가장 강력한 소비 권력은 30대입니다."));
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let state = DashboardState::Error { message: "x".to_string() };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["message"], "x");
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.9), "999");
        assert_eq!(format_thousands(1000.0), "1,000");
        assert_eq!(format_thousands(1234567.89), "1,234,567");
        assert_eq!(format_thousands(-1234.0), "-1,234");
    }
}
