//! 服务对象抽象
//!
//! 容器创建、缓存并注入的对象都实现 [`ServiceObject`]

use infrastructure_common::{ServiceError, ServiceResult};
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除辅助 trait
///
/// 对所有 `Any + Send + Sync` 类型自动实现。
pub trait AsAny: Any + Send + Sync {
    /// 以 `&dyn Any` 形式借用
    fn as_any(&self) -> &dyn Any;

    /// 转换为 `Arc<dyn Any>`
    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any_arc(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// 服务对象 trait
///
/// 类系统构造出的实例。构造后、共享前，工厂通过 [`ServiceObject::call`]
/// 执行 `calls` 选项中声明的方法，并通过 [`ServiceObject::as_taggable`]
/// 探测标签注入能力。
pub trait ServiceObject: AsAny + fmt::Debug {
    /// 按名称调用方法
    fn call(&mut self, method: &str, args: Vec<Argument>) -> ServiceResult<()> {
        let _ = args;
        Err(ServiceError::MethodNotFound {
            service: String::new(),
            class_name: std::any::type_name::<Self>().to_string(),
            method: method.to_string(),
        })
    }

    /// 标签注入能力，未实现时返回 `None`
    fn as_taggable(&mut self) -> Option<&mut dyn TaggableService> {
        None
    }
}

impl dyn ServiceObject {
    /// 按具体类型借用
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// 是否为指定的具体类型
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

/// 标签注入能力
///
/// 服务创建时，容器会把所有以该服务名称为标签的服务实例传入。
pub trait TaggableService {
    /// 处理被标记的服务实例
    fn process_tagged_services(&mut self, services: Vec<ServiceInstance>) -> ServiceResult<()>;
}

/// 共享的服务实例
pub type ServiceInstance = Arc<dyn ServiceObject>;

/// 将服务实例转换为具体类型的 `Arc`
pub fn downcast_arc<T: Any + Send + Sync>(instance: ServiceInstance) -> Option<Arc<T>> {
    AsAny::into_any_arc(instance).downcast::<T>().ok()
}

/// 已解析的参数
///
/// 原始参数经过解析后，要么是普通值，要么是另一个服务的实例。
#[derive(Debug, Clone)]
pub enum Argument {
    /// 普通值（字面量或参数插值结果）
    Value(Value),
    /// 服务引用解析得到的实例
    Service(ServiceInstance),
}

impl Argument {
    /// 获取普通值
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Service(_) => None,
        }
    }

    /// 获取字符串值
    pub fn as_str(&self) -> Option<&str> {
        self.as_value().and_then(Value::as_str)
    }

    /// 获取服务实例
    pub fn as_service(&self) -> Option<&ServiceInstance> {
        match self {
            Self::Service(instance) => Some(instance),
            Self::Value(_) => None,
        }
    }

    /// 按具体类型借用服务实例
    pub fn downcast_service<T: Any>(&self) -> Option<&T> {
        self.as_service().and_then(|instance| instance.downcast_ref::<T>())
    }

    /// 取出普通值
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Service(_) => None,
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<ServiceInstance> for Argument {
    fn from(instance: ServiceInstance) -> Self {
        Self::Service(instance)
    }
}
