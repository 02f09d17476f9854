use std::collections::BTreeMap;
use std::fmt;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sales_data_manager::{AgeBracket, SalesDataset, SalesRecord};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("선택한 조건에 해당하는 데이터가 없습니다.")]
    EmptyView,
}

pub const ALL_QUARTERS_LABEL: &str = "전체";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuarterFilter {
    #[default]
    All,
    Quarter(i64),
}

impl QuarterFilter {
    /// `전체`/`all` 또는 분기 코드 (예: `20231`)
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value == ALL_QUARTERS_LABEL || value.eq_ignore_ascii_case("all") {
            return Some(QuarterFilter::All);
        }
        value.parse::<i64>().ok().map(QuarterFilter::Quarter)
    }

    pub fn matches(&self, quarter_code: i64) -> bool {
        match self {
            QuarterFilter::All => true,
            QuarterFilter::Quarter(q) => *q == quarter_code,
        }
    }
}

impl fmt::Display for QuarterFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuarterFilter::All => write!(f, "{}", ALL_QUARTERS_LABEL),
            QuarterFilter::Quarter(q) => write!(f, "{}", q),
        }
    }
}

/// 자치구 + 분기 조건에 맞는 행들. 원본 데이터셋을 빌려 쓴다.
pub struct FilteredView<'a> {
    pub age_brackets: &'a [AgeBracket],
    pub rows: Vec<&'a SalesRecord>,
}

impl<'a> FilteredView<'a> {
    pub fn new(dataset: &'a SalesDataset, borough: &str, quarter: QuarterFilter) -> Self {
        let rows = dataset
            .records
            .iter()
            .filter(|r| r.borough == borough && quarter.matches(r.quarter_code))
            .collect();
        FilteredView {
            age_brackets: &dataset.age_brackets,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBracketTotal {
    pub label: String,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMean {
    pub category: String,
    pub mean_sales: f64,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub row_count: usize,
    pub total_sales: f64,
    pub age_totals: Vec<AgeBracketTotal>,
    pub dominant_age: Option<AgeBracketTotal>,
    pub top_category: CategoryMean,
    pub category_ranking: Vec<CategoryMean>,
    pub male_sales: f64,
    pub female_sales: f64,
}

pub struct SalesDataAnalyzer;

impl SalesDataAnalyzer {
    pub fn summarize(view: &FilteredView<'_>) -> Result<AggregateSummary, AnalysisError> {
        if view.is_empty() {
            return Err(AnalysisError::EmptyView);
        }

        let total_sales = view.rows.iter().map(|r| r.sales_amount).sum::<f64>();
        let age_totals = Self::age_totals(view);
        let dominant_age = Self::dominant(&age_totals);
        let category_ranking = Self::category_ranking(view);
        let top_category = category_ranking
            .first()
            .cloned()
            .ok_or(AnalysisError::EmptyView)?;
        let male_sales = view.rows.iter().map(|r| r.male_sales).sum::<f64>();
        let female_sales = view.rows.iter().map(|r| r.female_sales).sum::<f64>();

        Ok(AggregateSummary {
            row_count: view.len(),
            total_sales,
            age_totals,
            dominant_age,
            top_category,
            category_ranking,
            male_sales,
            female_sales,
        })
    }

    fn age_totals(view: &FilteredView<'_>) -> Vec<AgeBracketTotal> {
        view.age_brackets
            .iter()
            .enumerate()
            .map(|(i, bracket)| AgeBracketTotal {
                label: bracket.label.clone(),
                total: view
                    .rows
                    .iter()
                    .map(|r| r.age_sales.get(i).copied().unwrap_or(0.0))
                    .sum(),
            })
            .collect()
    }

    // 최댓값이 여러 개면 컬럼 순서상 첫 번째. 유한하지 않은 합계는 건너뛴다.
    fn dominant(age_totals: &[AgeBracketTotal]) -> Option<AgeBracketTotal> {
        let mut best: Option<&AgeBracketTotal> = None;
        for entry in age_totals.iter().filter(|e| e.total.is_finite()) {
            match best {
                Some(b) if entry.total <= b.total => {}
                _ => best = Some(entry),
            }
        }
        best.cloned()
    }

    /// 업종별 평균 매출 내림차순. 평균이 같으면 업종명 오름차순.
    fn category_ranking(view: &FilteredView<'_>) -> Vec<CategoryMean> {
        let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
        for row in &view.rows {
            let entry = groups.entry(row.category.as_str()).or_insert((0.0, 0));
            entry.0 += row.sales_amount;
            entry.1 += 1;
        }

        let mut ranking: Vec<CategoryMean> = groups
            .into_iter()
            .map(|(category, (sum, rows))| CategoryMean {
                category: category.to_string(),
                mean_sales: sum / rows as f64,
                rows,
            })
            .collect();
        ranking.sort_by(|a, b| b.mean_sales.total_cmp(&a.mean_sales));
        ranking
    }
}
