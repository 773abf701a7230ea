//! # Infrastructure Common
//!
//! 这个 crate 提供了服务容器各层共享的基础类型。
//!
//! ## 核心内容
//!
//! - [`ServiceError`] - 服务注册与解析过程中的所有错误类型
//! - [`ErrorContext`] - 嵌入在每种错误中的共享上下文记录
//! - [`conventions`] - 服务名称、服务引用和参数占位符的约定
//! - [`ModulePhase`] - 模块配置阶段与就绪阶段
//!
//! ## 设计原则
//!
//! - 错误显式传播，不做静默恢复
//! - 约定优于配置

pub mod conventions;
pub mod errors;
pub mod lifecycle;

pub use conventions::*;
pub use errors::*;
pub use lifecycle::*;
