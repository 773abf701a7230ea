//! 模块实例

use crate::module::Module;
use di_abstractions::{downcast_arc, ServiceInstance, ServiceLocator};
use di_impl::handles::MODULE;
use di_impl::ServiceContainer;
use infrastructure_common::{ErrorContext, ServiceError, ServiceResult};
use std::any::{type_name, Any};
use std::sync::Arc;
use tracing::info;

/// 模块实例
///
/// 运行中的模块，拥有自己的服务容器。容器中预置了 `module` 服务。
#[derive(Debug)]
pub struct ModuleInstance {
    module: Arc<Module>,
    container: Arc<ServiceContainer>,
}

impl ModuleInstance {
    /// 为已就绪的模块创建实例
    pub fn new(module: Arc<Module>) -> ServiceResult<Arc<Self>> {
        let container = ServiceContainer::new(Arc::clone(module.registry()));
        container.set_instance(MODULE, Arc::clone(&module) as ServiceInstance)?;

        info!("创建模块实例: {}", module.name());
        Ok(Arc::new(Self { module, container }))
    }

    /// 所属模块
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// 服务容器
    pub fn container(&self) -> &Arc<ServiceContainer> {
        &self.container
    }

    /// 按具体类型获取服务
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str) -> ServiceResult<Arc<T>> {
        let instance = self.container.get(name)?;
        downcast_arc::<T>(instance).ok_or_else(|| {
            ServiceError::InvalidArgument(
                ErrorContext::new()
                    .service(name)
                    .expected(type_name::<T>()),
            )
        })
    }
}

impl ServiceLocator for ModuleInstance {
    fn get(&self, name: &str) -> ServiceResult<ServiceInstance> {
        self.container.get(name)
    }

    fn isset(&self, name: &str) -> bool {
        self.container.isset(name)
    }

    fn find_by_tag(&self, tag: &str) -> ServiceResult<Vec<ServiceInstance>> {
        self.container.find_by_tag(tag)
    }
}
