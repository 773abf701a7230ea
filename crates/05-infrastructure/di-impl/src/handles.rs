//! 基础设施服务句柄
//!
//! 容器创建时预置的服务实例，没有对应的服务定义

use crate::container::ServiceContainer;
use crate::registry::DefinitionRegistry;
use di_abstractions::{ParameterStore, ServiceObject};
use std::fmt;
use std::sync::{Arc, Weak};

/// 容器自身
pub const SERVICE_CONTAINER: &str = "service_container";
/// 服务定义注册表
pub const SERVICE_REGISTRY: &str = "service_registry";
/// 参数存储
pub const PARAMETER_STORE: &str = "parameter_store";
/// 模块实例，由组合层预置
pub const MODULE: &str = "module";

/// 所有预置的基础设施服务名称
pub const INFRASTRUCTURE_SERVICES: [&str; 4] =
    [SERVICE_CONTAINER, SERVICE_REGISTRY, PARAMETER_STORE, MODULE];

/// 是否为预置的基础设施服务
pub fn is_infrastructure_service(name: &str) -> bool {
    INFRASTRUCTURE_SERVICES.contains(&name)
}

/// 容器句柄
///
/// 只持有弱引用，容器释放后 [`ContainerHandle::container`] 返回 `None`。
pub struct ContainerHandle {
    container: Weak<ServiceContainer>,
}

impl ContainerHandle {
    pub(crate) fn new(container: Weak<ServiceContainer>) -> Self {
        Self { container }
    }

    /// 获取容器
    pub fn container(&self) -> Option<Arc<ServiceContainer>> {
        self.container.upgrade()
    }
}

impl fmt::Debug for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerHandle")
            .field("alive", &(self.container.strong_count() > 0))
            .finish()
    }
}

impl ServiceObject for ContainerHandle {}

/// 注册表句柄
pub struct RegistryHandle {
    registry: Arc<DefinitionRegistry>,
}

impl RegistryHandle {
    pub(crate) fn new(registry: Arc<DefinitionRegistry>) -> Self {
        Self { registry }
    }

    /// 获取注册表
    pub fn registry(&self) -> &Arc<DefinitionRegistry> {
        &self.registry
    }
}

impl fmt::Debug for RegistryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryHandle")
            .field("registry", &self.registry.id())
            .finish()
    }
}

impl ServiceObject for RegistryHandle {}

/// 参数存储句柄
pub struct ParameterStoreHandle {
    parameters: Arc<dyn ParameterStore>,
}

impl ParameterStoreHandle {
    pub(crate) fn new(parameters: Arc<dyn ParameterStore>) -> Self {
        Self { parameters }
    }

    /// 获取参数存储
    pub fn parameters(&self) -> &Arc<dyn ParameterStore> {
        &self.parameters
    }
}

impl fmt::Debug for ParameterStoreHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ParameterStoreHandle")
    }
}

impl ServiceObject for ParameterStoreHandle {}
