//! 类管理器
//!
//! [`ClassSystem`] 的参考实现：类以构造闭包加方法名列表的形式注册

use di_abstractions::{Argument, ClassDescriptor, ClassSystem, ServiceObject};
use indexmap::{IndexMap, IndexSet};
use infrastructure_common::{ServiceError, ServiceResult};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

type Constructor =
    Arc<dyn Fn(Vec<Argument>) -> ServiceResult<Box<dyn ServiceObject>> + Send + Sync>;

/// 类定义
#[derive(Clone)]
pub struct ClassDefinition {
    name: String,
    methods: IndexSet<String>,
    constructor: Constructor,
}

impl ClassDefinition {
    /// 使用构造闭包创建类定义
    pub fn new<F>(name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(Vec<Argument>) -> ServiceResult<Box<dyn ServiceObject>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            methods: IndexSet::new(),
            constructor: Arc::new(constructor),
        }
    }

    /// 声明一个方法
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.methods.insert(method.into());
        self
    }

    /// 声明多个方法
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(methods.into_iter().map(Into::into));
        self
    }

    /// 已声明的方法
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.methods.iter().map(String::as_str)
    }
}

impl fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

impl ClassDescriptor for ClassDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_method(&self, method: &str) -> bool {
        self.methods.contains(method)
    }

    fn create_instance(&self, args: Vec<Argument>) -> ServiceResult<Box<dyn ServiceObject>> {
        (self.constructor)(args)
    }
}

/// 类管理器
#[derive(Debug, Default)]
pub struct ClassManager {
    classes: RwLock<IndexMap<String, Arc<ClassDefinition>>>,
    requested: RwLock<IndexSet<String>>,
}

impl ClassManager {
    /// 创建空的类管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册类定义，同名类被替换
    pub fn register(&self, class: ClassDefinition) -> Arc<ClassDefinition> {
        let class = Arc::new(class);
        info!("注册类: {}", class.name);
        self.classes
            .write()
            .insert(class.name.clone(), Arc::clone(&class));
        class
    }

    /// 类是否已注册
    pub fn isset(&self, class_name: &str) -> bool {
        self.classes.read().contains_key(class_name)
    }

    /// 已注册的类名
    pub fn class_names(&self) -> Vec<String> {
        self.classes.read().keys().cloned().collect()
    }

    /// 被声明为需要加载但没有注册的类
    pub fn unresolved(&self) -> Vec<String> {
        let classes = self.classes.read();
        self.requested
            .read()
            .iter()
            .filter(|name| !classes.contains_key(name.as_str()))
            .cloned()
            .collect()
    }

    /// 合并另一个类管理器中的类和加载请求
    ///
    /// 已存在的同名类保持不变。
    pub fn extend_from(&self, other: &Self) {
        let incoming: Vec<_> = other
            .classes
            .read()
            .iter()
            .map(|(name, class)| (name.clone(), Arc::clone(class)))
            .collect();
        {
            let mut classes = self.classes.write();
            for (name, class) in incoming {
                classes.entry(name).or_insert(class);
            }
        }

        let requested: Vec<_> = other.requested.read().iter().cloned().collect();
        self.requested.write().extend(requested);
    }
}

impl ClassSystem for ClassManager {
    fn loadable(&self, class_name: &str) {
        if self.requested.write().insert(class_name.to_string()) {
            debug!("声明需要加载的类: {}", class_name);
        }
    }

    fn get(&self, class_name: &str) -> ServiceResult<Arc<dyn ClassDescriptor>> {
        self.classes
            .read()
            .get(class_name)
            .map(|class| Arc::clone(class) as Arc<dyn ClassDescriptor>)
            .ok_or_else(|| ServiceError::ClassNotFound {
                class_name: class_name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Counter {
        start: i64,
    }

    impl ServiceObject for Counter {}

    fn counter_class() -> ClassDefinition {
        ClassDefinition::new("Counter", |args| {
            let start = args
                .first()
                .and_then(Argument::as_value)
                .and_then(serde_json::Value::as_i64)
                .unwrap_or_default();
            Ok(Box::new(Counter { start }) as Box<dyn ServiceObject>)
        })
        .with_method("increment")
    }

    #[test]
    fn test_register_and_instantiate() {
        let manager = ClassManager::new();
        manager.register(counter_class());

        let class = manager.get("Counter").unwrap();
        assert!(class.has_method("increment"));
        assert!(!class.has_method("reset"));

        let instance = class.create_instance(vec![json!(5).into()]).unwrap();
        assert_eq!(instance.downcast_ref::<Counter>().unwrap().start, 5);
    }

    #[test]
    fn test_missing_class() {
        let manager = ClassManager::new();
        assert!(matches!(
            manager.get("Nope"),
            Err(ServiceError::ClassNotFound { ref class_name }) if class_name == "Nope"
        ));
    }

    #[test]
    fn test_unresolved_loadables() {
        let manager = ClassManager::new();
        manager.loadable("Counter");
        manager.loadable("Ghost");
        manager.register(counter_class());

        assert_eq!(manager.unresolved(), vec!["Ghost".to_string()]);
    }

    #[test]
    fn test_extend_from_keeps_existing() {
        let root = ClassManager::new();
        root.register(counter_class().with_method("reset"));

        let plugin = ClassManager::new();
        plugin.register(counter_class());
        plugin.register(ClassDefinition::new("Other", |_| {
            Ok(Box::new(Counter { start: 0 }) as Box<dyn ServiceObject>)
        }));

        root.extend_from(&plugin);
        assert_eq!(root.class_names(), vec!["Counter", "Other"]);
        assert!(root.get("Counter").unwrap().has_method("reset"));
    }
}
