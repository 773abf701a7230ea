//! 服务容器
//!
//! 缓存已创建的实例，按需通过工厂构造

use crate::factory::ServiceFactory;
use crate::handles::{
    ContainerHandle, ParameterStoreHandle, RegistryHandle, PARAMETER_STORE, SERVICE_CONTAINER,
    SERVICE_REGISTRY,
};
use crate::registry::DefinitionRegistry;
use di_abstractions::{ServiceInstance, ServiceLocator};
use infrastructure_common::{ServiceError, ServiceResult};
use parking_lot::{ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// 服务容器
///
/// 每个运行中的模块实例一个。只缓存单例，非单例每次 `get` 都重新创建。
///
/// 构造在可重入锁下进行：同一线程的嵌套 `get` 可以重入，其它线程等待后
/// 直接读取缓存，因此每个单例最多构造一次。
pub struct ServiceContainer {
    registry: Arc<DefinitionRegistry>,
    instances: RwLock<HashMap<String, ServiceInstance>>,
    resolving: ReentrantMutex<RefCell<Vec<String>>>,
}

impl ServiceContainer {
    /// 创建容器并预置基础设施服务
    pub fn new(registry: Arc<DefinitionRegistry>) -> Arc<Self> {
        Arc::new_cyclic(|weak| {
            let mut instances: HashMap<String, ServiceInstance> = HashMap::new();
            instances.insert(
                SERVICE_CONTAINER.to_string(),
                Arc::new(ContainerHandle::new(weak.clone())),
            );
            instances.insert(
                SERVICE_REGISTRY.to_string(),
                Arc::new(RegistryHandle::new(Arc::clone(&registry))),
            );
            instances.insert(
                PARAMETER_STORE.to_string(),
                Arc::new(ParameterStoreHandle::new(registry.parameters())),
            );

            info!("创建服务容器 (注册表 {})", registry.id());
            Self {
                registry,
                instances: RwLock::new(instances),
                resolving: ReentrantMutex::new(RefCell::new(Vec::new())),
            }
        })
    }

    /// 服务定义注册表
    pub fn registry(&self) -> &Arc<DefinitionRegistry> {
        &self.registry
    }

    /// 获取服务实例，必要时创建
    pub fn get(&self, name: &str) -> ServiceResult<ServiceInstance> {
        if let Some(instance) = self.cached(name) {
            return Ok(instance);
        }

        let resolving = self.resolving.lock();
        if let Some(instance) = self.cached(name) {
            return Ok(instance);
        }

        {
            let mut stack = resolving.borrow_mut();
            if stack.iter().any(|entry| entry == name) {
                let mut chain = stack.clone();
                chain.push(name.to_string());
                return Err(ServiceError::circular(name, &chain));
            }
            stack.push(name.to_string());
        }

        let result = self.construct(name);
        resolving.borrow_mut().pop();
        result
    }

    fn construct(&self, name: &str) -> ServiceResult<ServiceInstance> {
        let definition = self.registry.get(name)?;
        let instance = ServiceFactory::create_service(&definition, self)?;

        if definition.is_singleton() {
            self.instances
                .write()
                .insert(name.to_string(), Arc::clone(&instance));
            debug!("缓存单例服务: {}", name);
        }
        Ok(instance)
    }

    fn cached(&self, name: &str) -> Option<ServiceInstance> {
        self.instances.read().get(name).cloned()
    }

    /// 服务是否已定义或已有实例
    ///
    /// 比注册表的 [`DefinitionRegistry::isset`] 更宽：预置的基础设施服务和通过
    /// [`ServiceContainer::set_instance`] 放入的实例没有服务定义，这里同样返回 `true`。
    /// 只关心定义是否存在时使用 `registry().isset(name, false)`。
    pub fn isset(&self, name: &str) -> bool {
        self.has_instance(name) || self.registry.isset(name, false)
    }

    /// 是否已有缓存的实例
    pub fn has_instance(&self, name: &str) -> bool {
        self.instances.read().contains_key(name)
    }

    /// 获取所有带指定标签的服务实例
    pub fn find_by_tag(&self, tag: &str) -> ServiceResult<Vec<ServiceInstance>> {
        self.registry
            .find_by_tag(tag)
            .iter()
            .map(|definition| self.get(&definition.name()))
            .collect()
    }

    /// 直接放入实例
    ///
    /// 已有同名实例（包括预置服务）时返回 `DuplicateInstance`。
    pub fn set_instance(&self, name: &str, instance: ServiceInstance) -> ServiceResult<()> {
        let mut instances = self.instances.write();
        if instances.contains_key(name) {
            return Err(ServiceError::duplicate_instance(name));
        }
        instances.insert(name.to_string(), instance);
        debug!("放入服务实例: {}", name);
        Ok(())
    }

    /// 已缓存实例的名称
    pub fn instance_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.instances.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl ServiceLocator for ServiceContainer {
    fn get(&self, name: &str) -> ServiceResult<ServiceInstance> {
        Self::get(self, name)
    }

    fn isset(&self, name: &str) -> bool {
        Self::isset(self, name)
    }

    fn find_by_tag(&self, tag: &str) -> ServiceResult<Vec<ServiceInstance>> {
        Self::find_by_tag(self, tag)
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("registry", &self.registry.id())
            .field("instances", &self.instance_names())
            .finish_non_exhaustive()
    }
}
