use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::fs;
use anyhow::{Result, anyhow};
use configparser::ini::Ini;
use log::*;

use crate::sales_data_manager::DEFAULT_ENCODING;

pub const DEFAULT_CSV_PATH: &str = "team project/서울시 상권분석서비스(추정매출-상권).csv";
pub const DEFAULT_BOROUGH: &str = "강남구";
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    pub data: DataConfig,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DataConfig {
    pub csv_path: String,
    pub encoding: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DashboardConfig {
    pub default_borough: String,
    pub top_n: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            data: DataConfig {
                csv_path: String::from(DEFAULT_CSV_PATH),
                encoding: String::from(DEFAULT_ENCODING),
            },
            dashboard: DashboardConfig {
                default_borough: String::from(DEFAULT_BOROUGH),
                top_n: DEFAULT_TOP_N,
            },
        }
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
    pub config: AppConfig,
}

impl ConfigManager {
    /// 설정 파일이 있으면 읽고, 없으면 기본값으로 만든다.
    pub fn new(config_path: &Path) -> Result<Self> {
        let mut manager = ConfigManager {
            config_path: config_path.to_path_buf(),
            config: AppConfig::default(),
        };

        if manager.config_path.exists() {
            manager.load()?;
        } else {
            manager.create_default()?;
        }

        Ok(manager)
    }

    pub fn load(&mut self) -> Result<()> {
        let config_str = fs::read_to_string(&self.config_path)?;
        let mut config_ini = Ini::new();
        config_ini.read(config_str).map_err(|e| anyhow!("Failed to read config string: {}", e))?;

        let mut app_config = AppConfig::default();

        if let Some(csv_path) = config_ini.get("data", "csv_path") {
            app_config.data.csv_path = csv_path;
        }
        if let Some(encoding) = config_ini.get("data", "encoding") {
            app_config.data.encoding = encoding;
        }

        if let Some(default_borough) = config_ini.get("dashboard", "default_borough") {
            app_config.dashboard.default_borough = default_borough;
        }
        if let Some(top_n_str) = config_ini.get("dashboard", "top_n") {
            match top_n_str.trim().parse::<usize>() {
                Ok(top_n) if top_n > 0 => app_config.dashboard.top_n = top_n,
                _ => warn!("top_n 값 '{}'이(가) 올바르지 않아 기본값 {}을(를) 사용합니다.", top_n_str, DEFAULT_TOP_N),
            }
        }

        self.config = app_config;
        self.validate()?;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create config directory: {}", e))?;
        }

        let mut config_ini = Ini::new();

        config_ini.set("data", "csv_path", Some(self.config.data.csv_path.clone()));
        config_ini.set("data", "encoding", Some(self.config.data.encoding.clone()));

        config_ini.set("dashboard", "default_borough", Some(self.config.dashboard.default_borough.clone()));
        config_ini.set("dashboard", "top_n", Some(self.config.dashboard.top_n.to_string()));

        config_ini.write(&self.config_path).map_err(|e| anyhow!("Failed to write config to file: {}", e))?;
        Ok(())
    }

    pub fn create_default(&mut self) -> Result<()> {
        self.config = AppConfig::default();
        self.save()?;
        info!("{} 파일이 생성되었습니다. csv_path 값을 확인/수정하세요.", self.config_path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.config.data.csv_path.trim().is_empty() {
            return Err(anyhow!("{}에 csv_path 값이 비어 있습니다.", self.config_path.display()));
        }
        if self.config.dashboard.default_borough.trim().is_empty() {
            warn!("default_borough가 비어 있어 첫 번째 자치구를 사용합니다.");
        }
        Ok(())
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn get_csv_path(&self) -> PathBuf {
        PathBuf::from(self.config.data.csv_path.trim())
    }

    pub fn get_encoding(&self) -> String {
        self.config.data.encoding.trim().to_string()
    }

    pub fn get_default_borough(&self) -> String {
        self.config.dashboard.default_borough.trim().to_string()
    }
}
