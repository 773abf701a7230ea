//! 模块宿主
//!
//! 模块拥有参数、类管理器和服务定义注册表，可以组合插件模块

use crate::config::ModuleConfig;
use crate::instance::ModuleInstance;
use crate::logging::{init_logging, LoggingConfig};
use di_abstractions::{ClassSystem, ModuleHost, ParameterStore, ServiceObject};
use di_impl::{
    ClassDefinition, ClassManager, DefinitionRegistry, DefinitionRegistryBuilder, LifecycleGate,
    ParameterContainer, ServiceDefinition,
};
use infrastructure_common::{ErrorContext, ServiceError, ServiceResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{info, warn};

/// 模块
pub struct Module {
    name: String,
    plugin: bool,
    gate: Arc<LifecycleGate>,
    parameters: Arc<ParameterContainer>,
    classes: Arc<ClassManager>,
    registry: Arc<DefinitionRegistry>,
    plugins: RwLock<Vec<Arc<Module>>>,
    parent: RwLock<Weak<Module>>,
}

impl Module {
    /// 模块名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 是否为插件模块
    pub fn is_plugin(&self) -> bool {
        self.plugin
    }

    /// 是否为根模块（没有被组合到其它模块中）
    pub fn is_root(&self) -> bool {
        self.parent.read().upgrade().is_none()
    }

    /// 是否已就绪
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// 参数容器
    pub fn parameters(&self) -> &Arc<ParameterContainer> {
        &self.parameters
    }

    /// 类管理器
    pub fn class_manager(&self) -> &Arc<ClassManager> {
        &self.classes
    }

    /// 服务定义注册表
    pub fn registry(&self) -> &Arc<DefinitionRegistry> {
        &self.registry
    }

    /// 已组合的插件模块
    pub fn plugins(&self) -> Vec<Arc<Self>> {
        self.plugins.read().clone()
    }

    /// 设置参数
    pub fn set_parameter(&self, name: impl Into<String>, value: Value) {
        self.parameters.set(name, value);
    }

    /// 注册类
    pub fn register_class(&self, class: ClassDefinition) -> Arc<ClassDefinition> {
        self.classes.register(class)
    }

    /// 注册服务定义
    pub fn register_service(&self, name: &str, raw: Value) -> ServiceResult<Arc<ServiceDefinition>> {
        self.registry.register(name, raw)
    }

    /// 批量注册服务定义
    pub fn register_services(&self, services: Value) -> ServiceResult<()> {
        let Value::Object(services) = services else {
            return Err(ServiceError::InvalidArgument(
                ErrorContext::new()
                    .argument(format!("模块 \"{}\" 的服务定义", self.name))
                    .expected("a plain object")
                    .received(services),
            ));
        };

        for (name, raw) in services {
            self.registry.register(&name, raw)?;
        }
        Ok(())
    }

    /// 组合插件模块
    ///
    /// 插件参数覆盖本模块的同名参数，插件的类合并到本模块的类管理器。
    /// 本模块已就绪时，插件随之就绪，并重新合并继承关系。
    pub fn add_plugin(self: &Arc<Self>, plugin: Arc<Self>) -> ServiceResult<()> {
        if !plugin.is_plugin() {
            return Err(ServiceError::InvalidArgument(
                ErrorContext::new()
                    .argument(format!("模块 \"{}\"", plugin.name))
                    .expected("a plugin module"),
            ));
        }

        self.parameters.extend(plugin.parameters.snapshot());
        self.classes.extend_from(&plugin.classes);

        *plugin.parent.write() = Arc::downgrade(self);
        self.plugins.write().push(Arc::clone(&plugin));
        info!("模块 {} 添加插件 {}", self.name, plugin.name);

        if self.is_ready() {
            plugin.seal();
        }
        self.registry.attach(Arc::clone(&plugin.registry))
    }

    /// 进入就绪阶段
    ///
    /// 只有根模块执行继承合并。插件随模块一起就绪。重复调用不产生任何效果。
    pub fn ready(&self) -> ServiceResult<()> {
        if self.is_ready() {
            return Ok(());
        }

        if self.is_root() {
            self.registry.normalize()?;
        }
        self.seal();

        let unresolved = self.unresolved_classes();
        if !unresolved.is_empty() {
            warn!("模块 {} 中以下类已声明但未注册: {:?}", self.name, unresolved);
        }
        Ok(())
    }

    /// 已声明但本模块及其插件都没有注册的类
    pub fn unresolved_classes(&self) -> Vec<String> {
        self.classes
            .unresolved()
            .into_iter()
            .filter(|class_name| !self.provides_class(class_name))
            .collect()
    }

    /// 本模块或任一插件是否注册了指定类
    fn provides_class(&self, class_name: &str) -> bool {
        self.classes.isset(class_name)
            || self
                .plugins()
                .iter()
                .any(|plugin| plugin.provides_class(class_name))
    }

    fn seal(&self) {
        self.gate.seal();
        for plugin in self.plugins() {
            plugin.seal();
        }
    }

    /// 创建模块实例，模块尚未就绪时先进入就绪阶段
    pub fn create_instance(self: &Arc<Self>) -> ServiceResult<Arc<ModuleInstance>> {
        self.ready()?;
        ModuleInstance::new(Arc::clone(self))
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("plugin", &self.plugin)
            .field("phase", &self.gate.phase())
            .field(
                "plugins",
                &self
                    .plugins
                    .read()
                    .iter()
                    .map(|plugin| plugin.name.clone())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl ServiceObject for Module {}

/// 模块构建器
pub struct ModuleBuilder {
    name: String,
    config: ModuleConfig,
    classes: Vec<ClassDefinition>,
    plugins: Vec<Arc<Module>>,
    logging: Option<LoggingConfig>,
}

impl ModuleBuilder {
    /// 创建构建器
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ModuleConfig::default(),
            classes: Vec::new(),
            plugins: Vec::new(),
            logging: None,
        }
    }

    /// 使用模块配置
    pub fn config(mut self, config: ModuleConfig) -> Self {
        self.config = config;
        self
    }

    /// 从配置文件加载模块配置
    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> ServiceResult<Self> {
        self.config = ModuleConfig::from_file(path)?;
        Ok(self)
    }

    /// 标记为插件模块
    pub fn plugin(mut self, plugin: bool) -> Self {
        self.config.plugin = plugin;
        self
    }

    /// 设置参数
    pub fn parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.config.parameters.insert(name.into(), value);
        self
    }

    /// 添加服务定义
    pub fn service(mut self, name: impl Into<String>, raw: Value) -> Self {
        self.config.services.insert(name.into(), raw);
        self
    }

    /// 添加类定义
    pub fn class(mut self, class: ClassDefinition) -> Self {
        self.classes.push(class);
        self
    }

    /// 添加插件模块
    pub fn add_plugin(mut self, plugin: Arc<Module>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging = Some(config);
        self
    }

    /// 构建模块
    pub fn build(self) -> ServiceResult<Arc<Module>> {
        if let Some(logging) = &self.logging {
            init_logging(logging)?;
        }

        let gate = Arc::new(LifecycleGate::new(self.name.clone()));
        let parameters = Arc::new(ParameterContainer::from_map(self.config.parameters));
        let classes = Arc::new(ClassManager::new());
        for class in self.classes {
            classes.register(class);
        }

        let registry = DefinitionRegistryBuilder::new(self.name.clone())
            .host(Arc::clone(&gate) as Arc<dyn ModuleHost>)
            .parameters(Arc::clone(&parameters) as Arc<dyn ParameterStore>)
            .classes(Arc::clone(&classes) as Arc<dyn ClassSystem>)
            .build();

        let module = Arc::new(Module {
            name: self.name,
            plugin: self.config.plugin,
            gate,
            parameters,
            classes,
            registry,
            plugins: RwLock::new(Vec::new()),
            parent: RwLock::new(Weak::new()),
        });

        module.register_services(Value::Object(self.config.services))?;
        for plugin in self.plugins {
            module.add_plugin(plugin)?;
        }

        info!(
            "模块构建完成: {} (插件: {})",
            module.name,
            module.plugin
        );
        Ok(module)
    }
}
