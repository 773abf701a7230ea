//! 模块配置
//!
//! 支持 JSON 和 TOML 两种格式，文件格式按扩展名判断

use infrastructure_common::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

/// 模块配置
///
/// ```json
/// {
///   "plugin": false,
///   "parameters": { "mode": "dev" },
///   "services": {
///     "logger": { "className": "LoggerClass", "arguments": ["%mode%"] }
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// 是否为插件模块
    pub plugin: bool,
    /// 参数
    pub parameters: Map<String, Value>,
    /// 服务定义
    pub services: Map<String, Value>,
}

impl ModuleConfig {
    /// 从 JSON 字符串解析
    pub fn from_json(text: &str) -> ServiceResult<Self> {
        serde_json::from_str(text).map_err(|e| ServiceError::InvalidConfiguration {
            message: format!("JSON 配置解析失败: {}", e),
        })
    }

    /// 从 TOML 字符串解析
    pub fn from_toml(text: &str) -> ServiceResult<Self> {
        toml::from_str(text).map_err(|e| ServiceError::InvalidConfiguration {
            message: format!("TOML 配置解析失败: {}", e),
        })
    }

    /// 从配置文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> ServiceResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ServiceError::InvalidConfiguration {
            message: format!("读取配置文件失败: {}, 原因: {}", path.display(), e),
        })?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&text)?,
            Some("toml") => Self::from_toml(&text)?,
            _ => {
                return Err(ServiceError::InvalidConfiguration {
                    message: format!("不支持的配置文件格式: {}", path.display()),
                })
            }
        };

        info!(
            "加载模块配置: {} ({} 个参数, {} 个服务)",
            path.display(),
            config.parameters.len(),
            config.services.len()
        );
        Ok(config)
    }
}
