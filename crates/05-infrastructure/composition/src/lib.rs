//! # 基础设施组合层
//!
//! 将参数、类管理器和服务定义注册表组合成模块，并把模块与插件组装成可运行的实例。
//!
//! ## 主要功能
//!
//! - **模块构建器**: 使用构建者模式组装模块
//! - **插件组合**: 合并插件的参数、类和服务定义
//! - **模块配置**: 从 JSON 或 TOML 加载参数与服务定义
//! - **日志初始化**: 基于 `tracing-subscriber` 的日志配置
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_abstractions::{ServiceObject, ServiceLocator};
//! use di_impl::ClassDefinition;
//! use infrastructure_composition::ModuleBuilder;
//! use serde_json::json;
//!
//! #[derive(Debug)]
//! struct Logger;
//!
//! impl ServiceObject for Logger {}
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let module = ModuleBuilder::new("app")
//!         .parameter("mode", json!("dev"))
//!         .service("logger", json!({"className": "Logger", "arguments": ["%mode%"]}))
//!         .class(ClassDefinition::new("Logger", |_| {
//!             Ok(Box::new(Logger) as Box<dyn ServiceObject>)
//!         }))
//!         .build()?;
//!
//!     let instance = module.create_instance()?;
//!     let logger = instance.get("logger")?;
//!     println!("{:?}", logger);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod instance;
pub mod logging;
pub mod module;


pub use config::ModuleConfig;
pub use instance::ModuleInstance;
pub use logging::{init_logging, LoggingConfig};
pub use module::{Module, ModuleBuilder};

// 重新导出错误类型
pub use infrastructure_common::{ServiceError, ServiceResult};
