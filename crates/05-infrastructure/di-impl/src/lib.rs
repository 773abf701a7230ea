//! # 依赖注入具体实现
//!
//! 提供服务定义、定义注册表、参数解析器、服务工厂和服务容器的实现。
//!
//! ## 解析流程
//!
//! [`ServiceContainer::get`] 先查缓存；未命中时从 [`DefinitionRegistry`] 取出定义，
//! 由 [`ServiceFactory`] 初始化定义、解析参数、构造实例、执行方法调用并注入标签服务，
//! 单例结果写回缓存。

pub mod class_manager;
pub mod composition;
pub mod container;
pub mod definition;
pub mod factory;
pub mod handles;
pub mod lifecycle;
pub mod options;
pub mod parameters;
pub mod registry;
pub mod resolver;
pub mod validator;

pub use class_manager::{ClassDefinition, ClassManager};
pub use composition::CompositionRoot;
pub use container::ServiceContainer;
pub use definition::ServiceDefinition;
pub use factory::ServiceFactory;
pub use handles::{
    is_infrastructure_service, ContainerHandle, ParameterStoreHandle, RegistryHandle,
    INFRASTRUCTURE_SERVICES,
};
pub use lifecycle::LifecycleGate;
pub use options::ServiceOption;
pub use parameters::ParameterContainer;
pub use registry::{DefinitionMap, DefinitionRegistry, DefinitionRegistryBuilder};
pub use resolver::ArgumentResolver;
pub use validator::ReferenceSite;
