//! 服务定义注册表
//!
//! 保存服务定义，支持组合子注册表（插件）并提供合并后的扁平视图

use crate::class_manager::ClassManager;
use crate::composition::CompositionRoot;
use crate::definition::ServiceDefinition;
use crate::lifecycle::LifecycleGate;
use crate::parameters::ParameterContainer;
use di_abstractions::{ClassDescriptor, ClassSystem, ModuleHost, ParameterStore};
use indexmap::IndexMap;
use infrastructure_common::{is_valid_service_name, ErrorContext, ServiceError, ServiceResult};
use parking_lot::RwLock;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// 服务定义映射，保持注册顺序
pub type DefinitionMap = IndexMap<String, Arc<ServiceDefinition>>;

/// 服务定义注册表
pub struct DefinitionRegistry {
    id: String,
    host: Arc<dyn ModuleHost>,
    parameters: Arc<dyn ParameterStore>,
    classes: Arc<dyn ClassSystem>,
    composition: RwLock<Arc<CompositionRoot>>,
    services: RwLock<DefinitionMap>,
    composed: RwLock<Vec<Arc<DefinitionRegistry>>>,
    parent: RwLock<Weak<DefinitionRegistry>>,
}

impl DefinitionRegistry {
    /// 注册表 id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 所属模块宿主
    pub fn host(&self) -> Arc<dyn ModuleHost> {
        Arc::clone(&self.host)
    }

    /// 参数存储
    pub fn parameters(&self) -> Arc<dyn ParameterStore> {
        Arc::clone(&self.parameters)
    }

    /// 类系统
    pub fn classes(&self) -> Arc<dyn ClassSystem> {
        Arc::clone(&self.classes)
    }

    /// 当前所在的组合根
    pub fn composition(&self) -> Arc<CompositionRoot> {
        self.composition.read().clone()
    }

    /// 宿主模块是否已就绪
    pub fn is_ready(&self) -> bool {
        self.host.is_ready()
    }

    /// 上级注册表
    pub fn parent(&self) -> Option<Arc<Self>> {
        self.parent.read().upgrade()
    }

    /// 组合树的根注册表
    pub fn top(self: &Arc<Self>) -> Arc<Self> {
        let mut current = Arc::clone(self);
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    /// 按类名查找类描述
    ///
    /// 从组合树的根开始沿上级链向下查找，根模块的类优先，
    /// 其次是插件自己注册的类。
    pub fn find_class(self: &Arc<Self>, class_name: &str) -> ServiceResult<Arc<dyn ClassDescriptor>> {
        let mut lineage = vec![Arc::clone(self)];
        while let Some(parent) = lineage.last().and_then(|current| current.parent()) {
            lineage.push(parent);
        }

        for registry in lineage.iter().rev() {
            match registry.classes.get(class_name) {
                Err(ServiceError::ClassNotFound { .. }) => continue,
                found => return found,
            }
        }
        Err(ServiceError::ClassNotFound {
            class_name: class_name.to_string(),
        })
    }

    /// 已组合的子注册表
    pub fn composed(&self) -> Vec<Arc<Self>> {
        self.composed.read().clone()
    }

    /// 注册服务定义
    ///
    /// 同名定义直接替换，不与旧定义合并。
    pub fn register(self: &Arc<Self>, name: &str, raw: Value) -> ServiceResult<Arc<ServiceDefinition>> {
        if self.host.is_ready() {
            return Err(ServiceError::configuration_closed(
                self.host.module_name(),
                name,
            ));
        }

        let definition = Arc::new(ServiceDefinition::create(self, name, raw)?);
        let replaced = self
            .services
            .write()
            .insert(name.to_string(), Arc::clone(&definition))
            .is_some();

        if definition.raw_class_name().is_some() {
            match definition.class_name() {
                Ok(Some(class_name)) => self.top().classes.loadable(&class_name),
                Ok(None) => {}
                Err(err) => debug!("服务 {} 的类名暂时无法解析: {}", name, err),
            }
        }

        if replaced {
            info!("替换服务定义: {} (注册表 {})", name, self.id);
        } else {
            info!("注册服务定义: {} (注册表 {})", name, self.id);
        }
        Ok(definition)
    }

    /// 获取服务定义（包括子注册表中的定义）
    pub fn get(&self, name: &str) -> ServiceResult<Arc<ServiceDefinition>> {
        self.lookup(name)
            .ok_or_else(|| ServiceError::service_not_found(name))
    }

    /// 获取服务定义，与 [`DefinitionRegistry::get`] 相同
    pub fn service_definition(&self, name: &str) -> ServiceResult<Arc<ServiceDefinition>> {
        self.get(name)
    }

    /// 在组合树的根视图中查找服务定义
    pub fn resolve_visible(self: &Arc<Self>, name: &str) -> ServiceResult<Arc<ServiceDefinition>> {
        self.top().get(name)
    }

    /// 服务是否存在
    ///
    /// `private_only` 为 `true` 时只检查本注册表自己的定义。
    pub fn isset(&self, name: &str, private_only: bool) -> bool {
        if private_only {
            self.services.read().contains_key(name)
        } else {
            self.lookup(name).is_some()
        }
    }

    fn lookup(&self, name: &str) -> Option<Arc<ServiceDefinition>> {
        if let Some(definition) = self.services.read().get(name) {
            return Some(Arc::clone(definition));
        }
        self.composed
            .read()
            .iter()
            .find_map(|child| child.lookup(name))
    }

    /// 服务定义视图
    ///
    /// - `private_only`：只返回本注册表自己的定义
    /// - `with_parents`：对子注册表返回整棵组合树的视图
    ///
    /// 合并视图中本地定义优先；顺序为本地定义，然后按组合顺序深度优先展开子注册表。
    pub fn services(self: &Arc<Self>, private_only: bool, with_parents: bool) -> DefinitionMap {
        if private_only {
            return self.services.read().clone();
        }
        if with_parents {
            let top = self.top();
            if !Arc::ptr_eq(&top, self) {
                return top.flatten();
            }
        }
        self.flatten()
    }

    fn flatten(&self) -> DefinitionMap {
        let mut merged = self.services.read().clone();
        for child in self.composed.read().iter() {
            for (name, definition) in child.flatten() {
                merged.entry(name).or_insert(definition);
            }
        }
        merged
    }

    /// 查找带指定标签的非抽象服务定义
    pub fn find_by_tag(&self, tag: &str) -> Vec<Arc<ServiceDefinition>> {
        self.flatten()
            .into_values()
            .filter(|definition| !definition.is_abstract() && definition.has_tag(tag))
            .collect()
    }

    /// 查找自身持有该服务的所有注册表 id
    pub fn find_locations(&self, name: &str) -> Vec<String> {
        let mut locations = Vec::new();
        self.collect_locations(name, &mut locations);
        locations
    }

    fn collect_locations(&self, name: &str, locations: &mut Vec<String>) {
        if self.services.read().contains_key(name) {
            locations.push(self.id.clone());
        }
        for child in self.composed.read().iter() {
            child.collect_locations(name, locations);
        }
    }

    /// 重命名服务
    ///
    /// 从组合树的根开始查找持有该服务的注册表，在每个注册表中移动条目（保持原有位置），
    /// 并更新定义自身的名称。
    pub fn rename(self: &Arc<Self>, old_name: &str, new_name: &str) -> ServiceResult<()> {
        if self.host.is_ready() {
            return Err(ServiceError::configuration_closed(
                self.host.module_name(),
                old_name,
            ));
        }
        if !is_valid_service_name(new_name) {
            return Err(ServiceError::InvalidArgument(
                ErrorContext::new()
                    .service(old_name)
                    .argument("new service name")
                    .expected("a string matching ^[0-9_.a-zA-Z]+$")
                    .received(format!("\"{new_name}\"")),
            ));
        }

        if !self.isset(old_name, false) {
            return Err(ServiceError::service_not_found(old_name));
        }
        let locations = self.top().find_locations(old_name);
        if locations.is_empty() {
            return Err(ServiceError::service_not_found(old_name));
        }

        let composition = self.composition();
        for id in &locations {
            let registry = composition.find_composed_registry(id).ok_or_else(|| {
                ServiceError::InvalidConfiguration {
                    message: format!("组合根中不存在注册表 \"{id}\""),
                }
            })?;
            if let Some(definition) = registry.move_entry(old_name, new_name) {
                definition.set_name(new_name);
            }
        }

        info!("重命名服务: {} -> {} ({:?})", old_name, new_name, locations);
        Ok(())
    }

    fn move_entry(&self, old_name: &str, new_name: &str) -> Option<Arc<ServiceDefinition>> {
        let mut services = self.services.write();
        let (mut index, _, definition) = services.shift_remove_full(old_name)?;
        if let Some((existing, _, _)) = services.shift_remove_full(new_name) {
            if existing < index {
                index -= 1;
            }
        }
        services.shift_insert(index, new_name.to_string(), Arc::clone(&definition));
        Some(definition)
    }

    /// 合并继承关系
    ///
    /// 对合并视图中每个声明了 `extends` 的定义，先合并其父定义，再以
    /// "父定义在前、子定义覆盖" 的方式合并。已合并的定义会被跳过。
    pub fn normalize(&self) -> ServiceResult<()> {
        let definitions = self.flatten();
        for definition in definitions.values() {
            self.normalize_definition(definition, &definitions, &mut Vec::new())?;
        }
        debug!("注册表 {} 完成继承合并", self.id);
        Ok(())
    }

    fn normalize_definition(
        &self,
        definition: &Arc<ServiceDefinition>,
        definitions: &DefinitionMap,
        chain: &mut Vec<String>,
    ) -> ServiceResult<()> {
        if definition.is_normalized() {
            return Ok(());
        }

        let name = definition.name();
        if chain.contains(&name) {
            chain.push(name.clone());
            return Err(ServiceError::circular(name, chain));
        }

        let Some(parent_name) = definition.extends() else {
            definition.set_normalized();
            return Ok(());
        };

        let parent = definitions.get(&parent_name).cloned().ok_or_else(|| {
            ServiceError::ServiceNotFound(
                ErrorContext::new()
                    .service(&parent_name)
                    .option("extends")
                    .argument(format!("服务 \"{name}\" 的父服务")),
            )
        })?;

        chain.push(name.clone());
        self.normalize_definition(&parent, definitions, chain)?;
        chain.pop();

        let mut merged = parent.definition();
        let child = definition.definition();
        if !child.contains_key("abstract") {
            merged.insert("abstract".to_string(), Value::Bool(false));
        }
        merged.extend(child);
        definition.merge_into(merged);

        debug!("服务 {} 合并父服务 {}", name, parent_name);
        Ok(())
    }

    /// 组合子注册表（插件）
    ///
    /// 子注册表及其整棵子树被登记到本注册表的组合根。宿主已就绪时重新合并继承关系。
    pub fn attach(self: &Arc<Self>, child: Arc<Self>) -> ServiceResult<()> {
        let mut ancestor = Some(Arc::clone(self));
        while let Some(current) = ancestor {
            if Arc::ptr_eq(&current, &child) {
                return Err(ServiceError::InvalidArgument(
                    ErrorContext::new()
                        .argument(format!("注册表 \"{}\"", child.id))
                        .expected("a registry outside the current composition path"),
                ));
            }
            ancestor = current.parent();
        }

        *child.parent.write() = Arc::downgrade(self);
        child.rehome(&self.composition());
        self.composed.write().push(Arc::clone(&child));
        info!("注册表 {} 组合子注册表 {}", self.id, child.id);

        if self.host.is_ready() {
            self.top().normalize()?;
        }
        Ok(())
    }

    fn rehome(self: &Arc<Self>, composition: &Arc<CompositionRoot>) {
        *self.composition.write() = Arc::clone(composition);
        composition.enroll(self);
        for child in self.composed() {
            child.rehome(composition);
        }
    }
}

impl fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefinitionRegistry")
            .field("id", &self.id)
            .field("services", &self.services.read().keys().collect::<Vec<_>>())
            .field(
                "composed",
                &self
                    .composed
                    .read()
                    .iter()
                    .map(|child| child.id.clone())
                    .collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// 注册表构建器
///
/// 未指定的协作者使用默认实现：[`LifecycleGate`]、[`ParameterContainer`]、
/// [`ClassManager`] 和新的 [`CompositionRoot`]。
pub struct DefinitionRegistryBuilder {
    id: String,
    host: Option<Arc<dyn ModuleHost>>,
    parameters: Option<Arc<dyn ParameterStore>>,
    classes: Option<Arc<dyn ClassSystem>>,
    composition: Option<Arc<CompositionRoot>>,
}

impl DefinitionRegistryBuilder {
    /// 创建构建器
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            host: None,
            parameters: None,
            classes: None,
            composition: None,
        }
    }

    /// 设置模块宿主
    pub fn host(mut self, host: Arc<dyn ModuleHost>) -> Self {
        self.host = Some(host);
        self
    }

    /// 设置参数存储
    pub fn parameters(mut self, parameters: Arc<dyn ParameterStore>) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// 设置类系统
    pub fn classes(mut self, classes: Arc<dyn ClassSystem>) -> Self {
        self.classes = Some(classes);
        self
    }

    /// 设置组合根
    pub fn composition(mut self, composition: Arc<CompositionRoot>) -> Self {
        self.composition = Some(composition);
        self
    }

    /// 构建注册表并登记到组合根
    pub fn build(self) -> Arc<DefinitionRegistry> {
        let host = self
            .host
            .unwrap_or_else(|| Arc::new(LifecycleGate::new(self.id.clone())));
        let composition = self.composition.unwrap_or_else(CompositionRoot::new);

        let registry = Arc::new(DefinitionRegistry {
            id: self.id,
            host,
            parameters: self
                .parameters
                .unwrap_or_else(|| Arc::new(ParameterContainer::new())),
            classes: self
                .classes
                .unwrap_or_else(|| Arc::new(ClassManager::new())),
            composition: RwLock::new(Arc::clone(&composition)),
            services: RwLock::new(IndexMap::new()),
            composed: RwLock::new(Vec::new()),
            parent: RwLock::new(Weak::new()),
        });
        composition.enroll(&registry);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gated(id: &str) -> (Arc<LifecycleGate>, Arc<DefinitionRegistry>) {
        let gate = Arc::new(LifecycleGate::new(id));
        let registry = DefinitionRegistryBuilder::new(id)
            .host(Arc::clone(&gate) as Arc<dyn ModuleHost>)
            .build();
        (gate, registry)
    }

    #[test]
    fn test_register_last_write_wins() {
        let (_, registry) = gated("app");
        registry
            .register("logger", json!({"className": "Logger", "arguments": ["a"]}))
            .unwrap();
        registry
            .register("logger", json!({"className": "Other"}))
            .unwrap();

        let definition = registry.get("logger").unwrap();
        assert_eq!(definition.raw_class_name().as_deref(), Some("Other"));
        assert!(definition.arguments().is_empty());
    }

    #[test]
    fn test_register_after_ready_is_rejected() {
        let (gate, registry) = gated("app");
        gate.seal();

        let err = registry.register("logger", json!({})).unwrap_err();
        assert!(matches!(err, ServiceError::ConfigurationClosed(_)));
        assert!(!registry.isset("logger", false));
    }

    #[test]
    fn test_get_missing_service() {
        let (_, registry) = gated("app");
        assert!(matches!(
            registry.service_definition("ghost"),
            Err(ServiceError::ServiceNotFound(ref ctx)) if ctx.service.as_deref() == Some("ghost")
        ));
    }

    #[test]
    fn test_local_definitions_shadow_composed() {
        let (_, root) = gated("app");
        let (_, plugin) = gated("plugin");
        plugin.register("shared", json!({"className": "PluginImpl"})).unwrap();
        plugin.register("extra", json!({"className": "Extra"})).unwrap();
        root.register("shared", json!({"className": "RootImpl"})).unwrap();
        root.register("own", json!({"className": "Own"})).unwrap();
        root.attach(Arc::clone(&plugin)).unwrap();

        let merged = root.services(false, false);
        assert_eq!(
            merged.keys().cloned().collect::<Vec<_>>(),
            vec!["shared", "own", "extra"]
        );
        assert_eq!(
            root.get("shared").unwrap().raw_class_name().as_deref(),
            Some("RootImpl")
        );

        assert_eq!(plugin.services(true, false).len(), 2);
        assert_eq!(plugin.services(false, true).len(), 3);
        assert!(plugin.isset("extra", true));
        assert!(!plugin.isset("own", false));
    }

    #[test]
    fn test_find_by_tag_skips_abstract() {
        let (_, registry) = gated("app");
        registry
            .register("base_engine", json!({"abstract": true, "tags": ["search"]}))
            .unwrap();
        registry
            .register("engine_a", json!({"className": "A", "tags": ["search"]}))
            .unwrap();
        registry
            .register("engine_b", json!({"className": "B", "tags": ["other"]}))
            .unwrap();

        let tagged: Vec<_> = registry
            .find_by_tag("search")
            .iter()
            .map(|definition| definition.name())
            .collect();
        assert_eq!(tagged, vec!["engine_a"]);
    }

    #[test]
    fn test_normalize_merges_parent_first() {
        let (_, registry) = gated("app");
        registry
            .register(
                "base",
                json!({"abstract": true, "className": "Engine", "arguments": ["@logger"], "tags": ["search"]}),
            )
            .unwrap();
        registry
            .register("child", json!({"extends": "base", "singleton": false}))
            .unwrap();

        registry.normalize().unwrap();
        registry.normalize().unwrap();

        let child = registry.get("child").unwrap();
        assert!(child.is_normalized());
        assert!(!child.is_abstract());
        assert!(!child.is_singleton());
        assert_eq!(child.raw_class_name().as_deref(), Some("Engine"));
        assert_eq!(child.arguments(), vec![json!("@logger")]);
        assert!(child.has_tag("search"));
        assert!(registry.get("base").unwrap().is_abstract());
    }

    #[test]
    fn test_normalize_rejects_extends_cycle_and_missing_parent() {
        let (_, registry) = gated("app");
        registry.register("a", json!({"extends": "b"})).unwrap();
        registry.register("b", json!({"extends": "a"})).unwrap();
        assert!(matches!(
            registry.normalize(),
            Err(ServiceError::CircularDependency(_))
        ));

        let (_, registry) = gated("other");
        registry.register("orphan", json!({"extends": "ghost"})).unwrap();
        assert!(matches!(
            registry.normalize(),
            Err(ServiceError::ServiceNotFound(ref ctx)) if ctx.service.as_deref() == Some("ghost")
        ));
    }

    #[test]
    fn test_rename_propagates_to_every_location() {
        let (_, root) = gated("app");
        let (_, plugin) = gated("plugin");
        root.register("first", json!({})).unwrap();
        root.register("logger", json!({"className": "Logger"})).unwrap();
        root.register("last", json!({})).unwrap();
        plugin.register("logger", json!({"className": "PluginLogger"})).unwrap();
        root.attach(Arc::clone(&plugin)).unwrap();

        assert_eq!(root.find_locations("logger"), vec!["app", "plugin"]);

        root.rename("logger", "app_logger").unwrap();

        assert!(!root.isset("logger", false));
        assert_eq!(
            root.services(true, false).keys().cloned().collect::<Vec<_>>(),
            vec!["first", "app_logger", "last"]
        );
        assert!(plugin.isset("app_logger", true));
        assert_eq!(root.get("app_logger").unwrap().name(), "app_logger");
    }

    #[test]
    fn test_rename_errors() {
        let (gate, registry) = gated("app");
        registry.register("logger", json!({})).unwrap();

        assert!(matches!(
            registry.rename("ghost", "other"),
            Err(ServiceError::ServiceNotFound(_))
        ));
        assert!(matches!(
            registry.rename("logger", "bad name"),
            Err(ServiceError::InvalidArgument(_))
        ));

        gate.seal();
        assert!(matches!(
            registry.rename("logger", "other"),
            Err(ServiceError::ConfigurationClosed(_))
        ));
    }

    #[test]
    fn test_attach_after_ready_normalizes_plugin_definitions() {
        let (gate, root) = gated("app");
        root.register("base", json!({"abstract": true, "className": "Base"}))
            .unwrap();
        gate.seal();
        root.normalize().unwrap();

        let (_, plugin) = gated("plugin");
        plugin.register("derived", json!({"extends": "base"})).unwrap();
        root.attach(Arc::clone(&plugin)).unwrap();

        let derived = root.get("derived").unwrap();
        assert!(derived.is_normalized());
        assert_eq!(derived.raw_class_name().as_deref(), Some("Base"));
        assert!(Arc::ptr_eq(
            &root.composition().find_composed_registry("plugin").unwrap(),
            &plugin
        ));
    }

    #[derive(Debug)]
    struct Widget;

    impl di_abstractions::ServiceObject for Widget {}

    fn widget_class(name: &str) -> crate::class_manager::ClassDefinition {
        crate::class_manager::ClassDefinition::new(name, |_| {
            Ok(Box::new(Widget) as Box<dyn di_abstractions::ServiceObject>)
        })
    }

    fn with_classes(id: &str) -> (Arc<ClassManager>, Arc<DefinitionRegistry>) {
        let classes = Arc::new(ClassManager::new());
        let registry = DefinitionRegistryBuilder::new(id)
            .classes(Arc::clone(&classes) as Arc<dyn ClassSystem>)
            .build();
        (classes, registry)
    }

    #[test]
    fn test_find_class_prefers_root_then_falls_back_to_plugin() {
        let (root_classes, root) = with_classes("app");
        let (plugin_classes, plugin) = with_classes("plugin");
        root_classes.register(widget_class("Shared").with_method("fromRoot"));
        plugin_classes.register(widget_class("Shared"));
        root.attach(Arc::clone(&plugin)).unwrap();
        plugin_classes.register(widget_class("Late"));

        assert!(plugin.find_class("Shared").unwrap().has_method("fromRoot"));
        assert_eq!(plugin.find_class("Late").unwrap().name(), "Late");
        assert!(matches!(
            root.find_class("Late"),
            Err(ServiceError::ClassNotFound { ref class_name }) if class_name == "Late"
        ));
    }

    #[test]
    fn test_loadable_requests_reach_the_root() {
        let (root_classes, root) = with_classes("app");
        let (plugin_classes, plugin) = with_classes("plugin");
        root.attach(Arc::clone(&plugin)).unwrap();

        plugin
            .register("late", json!({"className": "LateWidget"}))
            .unwrap();

        assert_eq!(root_classes.unresolved(), vec!["LateWidget".to_string()]);
        assert!(plugin_classes.unresolved().is_empty());
    }

    #[test]
    fn test_attach_rejects_self() {
        let (_, root) = gated("app");
        assert!(matches!(
            root.attach(Arc::clone(&root)),
            Err(ServiceError::InvalidArgument(_))
        ));
    }
}
