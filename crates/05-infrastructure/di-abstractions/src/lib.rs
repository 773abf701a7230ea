//! # Dependency Injection Abstractions
//!
//! 依赖注入抽象层，定义服务容器与外部协作者之间的契约。
//!
//! ## 核心接口
//!
//! - [`ServiceObject`] - 容器创建的服务对象
//! - [`ClassSystem`] - 类系统，按类名构造实例
//! - [`ParameterStore`] - 参数存储，按名称解析参数
//! - [`ModuleHost`] - 模块宿主，提供配置阶段信息
//! - [`ServiceLocator`] - 对外暴露的服务解析接口

pub mod container;
pub mod factory;
pub mod instance;
pub mod registry;
pub mod resolver;

pub use container::*;
pub use factory::*;
pub use instance::*;
pub use registry::*;
pub use resolver::*;
