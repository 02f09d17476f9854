use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use encoding_rs::Encoding;
use polars::prelude::*;
use regex::Regex;
use thiserror::Error;
use log::*;

use crate::borough_index::BoroughIndex;

pub const AREA_NAME_COLUMN: &str = "상권_코드_명";
pub const QUARTER_COLUMN: &str = "기준_년분기_코드";
pub const CATEGORY_COLUMN: &str = "서비스_업종_코드_명";
pub const SALES_AMOUNT_COLUMN: &str = "당월_매출_금액";
pub const SALES_COUNT_COLUMN: &str = "당월_매출_건수";
pub const MALE_SALES_COLUMN: &str = "남성_매출_금액";
pub const FEMALE_SALES_COLUMN: &str = "여성_매출_금액";

pub const DEFAULT_ENCODING: &str = "cp949";

const REQUIRED_COLUMNS: [&str; 7] = [
    AREA_NAME_COLUMN,
    QUARTER_COLUMN,
    CATEGORY_COLUMN,
    SALES_AMOUNT_COLUMN,
    SALES_COUNT_COLUMN,
    MALE_SALES_COLUMN,
    FEMALE_SALES_COLUMN,
];

lazy_static::lazy_static! {
    static ref NUMERIC_COLUMN_REGEX: Regex = Regex::new(r"매출_금액|매출_건수").unwrap();
}

#[derive(Error, Debug)]
pub enum SalesDataError {
    #[error("파일을 찾을 수 없습니다: {0}")]
    NotFound(PathBuf),

    #[error("파일을 읽을 수 없습니다 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("지원하지 않는 인코딩: {0}")]
    UnknownEncoding(String),

    #[error("필수 컬럼이 없습니다: {0}")]
    MissingColumn(String),

    #[error("CSV 헤더 읽기 실패: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV 파싱 실패: {0}")]
    Polars(#[from] PolarsError),
}

/// 인코딩 라벨 해석. `cp949`/`ms949`는 WHATWG 라벨이 아니라서 EUC-KR로 직접 매핑한다.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, SalesDataError> {
    let trimmed = label.trim();
    if trimmed.eq_ignore_ascii_case("cp949") || trimmed.eq_ignore_ascii_case("ms949") {
        return Ok(encoding_rs::EUC_KR);
    }
    Encoding::for_label(trimmed.as_bytes())
        .ok_or_else(|| SalesDataError::UnknownEncoding(label.to_string()))
}

/// 연령대별 매출 컬럼 하나 (예: `연령대_20_매출_금액` -> `20대`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBracket {
    pub column: String,
    pub label: String,
}

impl AgeBracket {
    pub fn from_column(column: &str) -> Self {
        let token = column.split('_').nth(1).unwrap_or(column);
        AgeBracket {
            column: column.to_string(),
            label: format!("{}대", token),
        }
    }

    pub fn is_age_column(column: &str) -> bool {
        column.contains("연령대") && column.contains("매출_금액")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub area_name: String,
    pub quarter_code: i64,
    pub category: String,
    pub sales_amount: f64,
    pub sales_count: f64,
    /// `SalesDataset::age_brackets`와 같은 순서
    pub age_sales: Vec<f64>,
    pub male_sales: f64,
    pub female_sales: f64,
    pub borough: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesDataset {
    pub age_brackets: Vec<AgeBracket>,
    pub records: Vec<SalesRecord>,
}

impl SalesDataset {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// 추정매출 CSV 로더. 경로별로 한 번만 읽고 이후엔 캐시를 돌려준다.
/// 파일이 바뀌어도 캐시는 갱신되지 않는다 (`invalidate`로 명시적으로 비울 것).
pub struct SalesDataManager {
    index: BoroughIndex,
    encoding: &'static Encoding,
    cache: Mutex<HashMap<PathBuf, Arc<SalesDataset>>>,
}

impl SalesDataManager {
    pub fn new(index: BoroughIndex) -> Self {
        SalesDataManager {
            index,
            encoding: encoding_rs::EUC_KR,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_encoding(mut self, label: &str) -> Result<Self, SalesDataError> {
        self.encoding = resolve_encoding(label)?;
        Ok(self)
    }

    pub fn index(&self) -> &BoroughIndex {
        &self.index
    }

    pub fn load(&self, path: &Path) -> Result<Arc<SalesDataset>, SalesDataError> {
        if let Some(cached) = self.cached(path) {
            debug!("캐시 적중: {}", path.display());
            return Ok(cached);
        }

        let start = std::time::Instant::now();
        let dataset = Arc::new(self.read_dataset(path)?);
        info!(
            "📂 {} 로드 완료: {}행, {:.2}초",
            path.display(),
            dataset.len(),
            start.elapsed().as_secs_f64()
        );

        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(path.to_path_buf(), dataset.clone());
        }
        Ok(dataset)
    }

    /// 로드 실패 시 에러를 로그로 남기고 빈 데이터셋을 돌려준다.
    pub fn load_or_empty(&self, path: &Path) -> Arc<SalesDataset> {
        match self.load(path) {
            Ok(dataset) => dataset,
            Err(e) => {
                error!("{}", e);
                Arc::new(SalesDataset::default())
            }
        }
    }

    pub fn invalidate(&self, path: &Path) -> bool {
        self.cache
            .lock()
            .map(|mut cache| cache.remove(path).is_some())
            .unwrap_or(false)
    }

    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.cache.lock() {
            cache.clear();
        }
    }

    fn cached(&self, path: &Path) -> Option<Arc<SalesDataset>> {
        self.cache.lock().ok()?.get(path).cloned()
    }

    fn read_dataset(&self, path: &Path) -> Result<SalesDataset, SalesDataError> {
        if !path.exists() {
            return Err(SalesDataError::NotFound(path.to_path_buf()));
        }

        let bytes = fs::read(path).map_err(|source| SalesDataError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let (text, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            warn!("{}: {} 디코딩 중 잘못된 바이트가 있습니다", path.display(), self.encoding.name());
        }
        let text = text.into_owned();

        // 헤더를 먼저 확인
        let mut csv_reader = csv::Reader::from_reader(text.as_bytes());
        let headers = csv_reader.headers()?.clone();
        for required in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == required) {
                return Err(SalesDataError::MissingColumn(required.to_string()));
            }
        }

        // 모든 컬럼을 문자열로 읽은 뒤 숫자 컬럼만 변환 (실패값, NaN은 0)
        let df = CsvReader::new(Cursor::new(text.into_bytes()))
            .has_header(true)
            .infer_schema(Some(0))
            .finish()?;

        let mut coercions: Vec<Expr> = df
            .get_column_names()
            .into_iter()
            .filter(|name| NUMERIC_COLUMN_REGEX.is_match(name))
            .map(|name| {
                col(name)
                    .str()
                    .strip_chars(lit(Null {}))
                    .cast(DataType::Float64)
                    .fill_nan(lit(0.0))
                    .fill_null(lit(0.0))
            })
            .collect();
        coercions.push(
            col(QUARTER_COLUMN)
                .str()
                .strip_chars(lit(Null {}))
                .cast(DataType::Int64)
                .fill_null(lit(0i64)),
        );

        let df = df.lazy().with_columns(coercions).collect()?;
        self.records_from_frame(&df)
    }

    fn records_from_frame(&self, df: &DataFrame) -> Result<SalesDataset, SalesDataError> {
        let age_brackets: Vec<AgeBracket> = df
            .get_column_names()
            .into_iter()
            .filter(|name| AgeBracket::is_age_column(name))
            .map(AgeBracket::from_column)
            .collect();

        let area_col = df.column(AREA_NAME_COLUMN)?.str()?;
        let quarter_col = df.column(QUARTER_COLUMN)?.i64()?;
        let category_col = df.column(CATEGORY_COLUMN)?.str()?;
        let amount_col = df.column(SALES_AMOUNT_COLUMN)?.f64()?;
        let count_col = df.column(SALES_COUNT_COLUMN)?.f64()?;
        let male_col = df.column(MALE_SALES_COLUMN)?.f64()?;
        let female_col = df.column(FEMALE_SALES_COLUMN)?.f64()?;
        let age_cols = age_brackets
            .iter()
            .map(|bracket| df.column(&bracket.column)?.f64())
            .collect::<PolarsResult<Vec<_>>>()?;

        let mut records = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let area_name = area_col.get(i).unwrap_or("").to_string();
            let borough = self.index.classify(&area_name).to_string();
            records.push(SalesRecord {
                borough,
                area_name,
                quarter_code: quarter_col.get(i).unwrap_or(0),
                category: category_col.get(i).unwrap_or("").to_string(),
                sales_amount: amount_col.get(i).unwrap_or(0.0),
                sales_count: count_col.get(i).unwrap_or(0.0),
                age_sales: age_cols.iter().map(|c| c.get(i).unwrap_or(0.0)).collect(),
                male_sales: male_col.get(i).unwrap_or(0.0),
                female_sales: female_col.get(i).unwrap_or(0.0),
            });
        }

        Ok(SalesDataset {
            age_brackets,
            records,
        })
    }
}
