//! 错误类型定义

use std::fmt;
use thiserror::Error;

/// 错误上下文
///
/// 每种服务错误都携带的共享记录，字段按需填写。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorContext {
    /// 相关服务名称
    pub service: Option<String>,
    /// 相关服务选项名称
    pub option: Option<String>,
    /// 相关参数描述
    pub argument: Option<String>,
    /// 期望的值描述
    pub expected: Option<String>,
    /// 实际收到的值
    pub received: Option<String>,
}

impl ErrorContext {
    /// 创建空的错误上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置服务名称
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// 设置选项名称
    pub fn option(mut self, option: impl Into<String>) -> Self {
        self.option = Some(option.into());
        self
    }

    /// 设置参数描述
    pub fn argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    /// 设置期望值描述
    pub fn expected(mut self, expected: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    /// 设置实际收到的值
    pub fn received(mut self, received: impl fmt::Display) -> Self {
        self.received = Some(received.to_string());
        self
    }

    /// 是否设置了服务名称
    pub fn has_service(&self) -> bool {
        self.service.is_some()
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(service) = &self.service {
            parts.push(format!("服务 \"{service}\""));
        }
        if let Some(option) = &self.option {
            parts.push(format!("选项 \"{option}\""));
        }
        if let Some(argument) = &self.argument {
            parts.push(format!("参数 {argument}"));
        }
        if let Some(expected) = &self.expected {
            parts.push(format!("期望 {expected}"));
        }
        if let Some(received) = &self.received {
            parts.push(format!("实际 {received}"));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// 服务错误类型
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("无效参数: {0}")]
    InvalidArgument(ErrorContext),

    #[error("无效的服务选项: {0}")]
    InvalidServiceOption(ErrorContext),

    #[error("服务已初始化，不能再修改选项: {0}")]
    ServiceInitialized(ErrorContext),

    #[error("不能创建抽象服务的实例: {0}")]
    AbstractService(ErrorContext),

    #[error("服务不存在: {0}")]
    ServiceNotFound(ErrorContext),

    #[error("检测到循环依赖: {0}")]
    CircularDependency(ErrorContext),

    #[error("模块已就绪，不能再定义服务: {0}")]
    ConfigurationClosed(ErrorContext),

    #[error("试图替换已创建的服务实例: {0}")]
    DuplicateInstance(ErrorContext),

    #[error("类不存在: {class_name}")]
    ClassNotFound { class_name: String },

    #[error("服务 \"{service}\" 的 calls 选项无效: 类 \"{class_name}\" 不存在方法 \"{method}\"")]
    MethodNotFound {
        service: String,
        class_name: String,
        method: String,
    },

    #[error("类实例创建失败: {class_name}, 原因: {message}")]
    ConstructionFailed { class_name: String, message: String },

    #[error("参数不存在: {name}")]
    ParameterNotFound { name: String },

    #[error("配置无效: {message}")]
    InvalidConfiguration { message: String },
}

impl ServiceError {
    /// 创建服务不存在错误
    pub fn service_not_found(service: impl Into<String>) -> Self {
        Self::ServiceNotFound(ErrorContext::new().service(service))
    }

    /// 创建服务已初始化错误
    pub fn initialized(service: impl Into<String>) -> Self {
        Self::ServiceInitialized(ErrorContext::new().service(service))
    }

    /// 创建抽象服务错误
    pub fn abstract_service(service: impl Into<String>) -> Self {
        Self::AbstractService(ErrorContext::new().service(service))
    }

    /// 创建循环依赖错误
    pub fn circular(service: impl Into<String>, chain: &[String]) -> Self {
        Self::CircularDependency(
            ErrorContext::new()
                .service(service)
                .argument(format!("依赖链 [{}]", chain.join(" -> "))),
        )
    }

    /// 创建配置阶段已结束错误
    pub fn configuration_closed(module: impl Into<String>, service: impl Into<String>) -> Self {
        Self::ConfigurationClosed(
            ErrorContext::new()
                .service(service)
                .argument(format!("模块 \"{}\"", module.into())),
        )
    }

    /// 创建重复实例错误
    pub fn duplicate_instance(service: impl Into<String>) -> Self {
        Self::DuplicateInstance(ErrorContext::new().service(service))
    }

    /// 创建构造失败错误
    pub fn construction_failed(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConstructionFailed {
            class_name: class_name.into(),
            message: message.into(),
        }
    }

    /// 获取错误上下文（仅服务相关错误携带）
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Self::InvalidArgument(ctx)
            | Self::InvalidServiceOption(ctx)
            | Self::ServiceInitialized(ctx)
            | Self::AbstractService(ctx)
            | Self::ServiceNotFound(ctx)
            | Self::CircularDependency(ctx)
            | Self::ConfigurationClosed(ctx)
            | Self::DuplicateInstance(ctx) => Some(ctx),
            _ => None,
        }
    }

    /// 获取错误涉及的服务名称
    pub fn service_name(&self) -> Option<&str> {
        match self {
            Self::MethodNotFound { service, .. } => Some(service),
            _ => self.context().and_then(|ctx| ctx.service.as_deref()),
        }
    }
}

/// 结果类型别名
pub type ServiceResult<T> = Result<T, ServiceError>;
