//! 服务定义
//!
//! 描述如何构造一个服务：类名、构造参数、构造后调用、单例与标签元数据、继承关系

use crate::options::ServiceOption;
use crate::registry::DefinitionRegistry;
use crate::resolver::ArgumentResolver;
use crate::validator;
use di_abstractions::{Argument, ParameterStore};
use infrastructure_common::{
    is_valid_service_name, substitute_first_parameter, ErrorContext, ServiceError, ServiceResult,
};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

#[derive(Debug)]
struct DefinitionState {
    name: String,
    definition: Map<String, Value>,
    initialized: bool,
    normalized: bool,
}

/// 服务定义
///
/// 由注册表在注册时创建。在 [`ServiceDefinition::initialize`] 之前可以通过
/// setter 修改，之后所有 setter 都返回 `ServiceInitialized`。
pub struct ServiceDefinition {
    registry: Weak<DefinitionRegistry>,
    state: RwLock<DefinitionState>,
}

impl ServiceDefinition {
    /// 从原始配置创建服务定义
    ///
    /// `raw` 为 `null` 时视为空对象。
    pub fn create(registry: &Arc<DefinitionRegistry>, name: &str, raw: Value) -> ServiceResult<Self> {
        if !is_valid_service_name(name) {
            return Err(ServiceError::InvalidArgument(
                ErrorContext::new()
                    .argument("service name")
                    .expected("a string matching ^[0-9_.a-zA-Z]+$")
                    .received(format!("\"{name}\"")),
            ));
        }

        let definition = match raw {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            other => {
                return Err(ServiceError::InvalidArgument(
                    ErrorContext::new()
                        .service(name)
                        .argument("service definition")
                        .expected("a plain object")
                        .received(other),
                ))
            }
        };

        Ok(Self {
            registry: Arc::downgrade(registry),
            state: RwLock::new(DefinitionState {
                name: name.to_string(),
                definition,
                initialized: false,
                normalized: false,
            }),
        })
    }

    /// 服务名称
    pub fn name(&self) -> String {
        self.state.read().name.clone()
    }

    /// 所属注册表
    pub fn registry(&self) -> ServiceResult<Arc<DefinitionRegistry>> {
        self.registry
            .upgrade()
            .ok_or_else(|| ServiceError::InvalidConfiguration {
                message: format!("服务 \"{}\" 所属的注册表已释放", self.name()),
            })
    }

    /// 当前定义的副本
    pub fn definition(&self) -> Map<String, Value> {
        self.state.read().definition.clone()
    }

    /// 是否已初始化
    pub fn is_initialized(&self) -> bool {
        self.state.read().initialized
    }

    /// 是否已与父服务合并
    pub fn is_normalized(&self) -> bool {
        self.state.read().normalized
    }

    fn option(&self, option: ServiceOption) -> Option<Value> {
        self.state.read().definition.get(option.key()).cloned()
    }

    /// 是否为抽象服务
    pub fn is_abstract(&self) -> bool {
        self.option(ServiceOption::Abstract)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    /// 父服务名称
    pub fn extends(&self) -> Option<String> {
        self.option(ServiceOption::Extends)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    /// 原始类名（未做参数替换）
    pub fn raw_class_name(&self) -> Option<String> {
        self.option(ServiceOption::ClassName)
            .and_then(|value| value.as_str().map(str::to_string))
            .filter(|name| !name.is_empty())
    }

    /// 原始构造参数
    pub fn arguments(&self) -> Vec<Value> {
        match self.option(ServiceOption::Arguments) {
            Some(Value::Array(args)) => args,
            _ => Vec::new(),
        }
    }

    /// 原始方法调用，保持声明顺序
    pub fn calls(&self) -> Map<String, Value> {
        match self.option(ServiceOption::Calls) {
            Some(Value::Object(calls)) => calls,
            _ => Map::new(),
        }
    }

    /// 是否为单例
    pub fn is_singleton(&self) -> bool {
        self.option(ServiceOption::Singleton)
            .and_then(|value| value.as_bool())
            .unwrap_or(true)
    }

    /// 标签
    pub fn tags(&self) -> Vec<String> {
        match self.option(ServiceOption::Tags) {
            Some(Value::Array(tags)) => tags
                .into_iter()
                .filter_map(|tag| tag.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 是否带有指定标签
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t == tag)
    }

    /// 设置是否抽象
    pub fn set_abstract(&self, is_abstract: bool) -> ServiceResult<()> {
        self.set_option(ServiceOption::Abstract, Value::Bool(is_abstract))
    }

    /// 设置父服务
    pub fn set_extends(&self, parent: Option<&str>) -> ServiceResult<()> {
        self.set_option(ServiceOption::Extends, optional_string(parent))
    }

    /// 设置类名
    pub fn set_class_name(&self, class_name: Option<&str>) -> ServiceResult<()> {
        self.set_option(ServiceOption::ClassName, optional_string(class_name))
    }

    /// 设置构造参数
    pub fn set_arguments(&self, arguments: Vec<Value>) -> ServiceResult<()> {
        self.set_option(ServiceOption::Arguments, Value::Array(arguments))
    }

    /// 设置方法调用
    pub fn set_calls(&self, calls: Map<String, Value>) -> ServiceResult<()> {
        self.set_option(ServiceOption::Calls, Value::Object(calls))
    }

    /// 设置是否单例
    pub fn set_singleton(&self, singleton: bool) -> ServiceResult<()> {
        self.set_option(ServiceOption::Singleton, Value::Bool(singleton))
    }

    /// 设置标签
    pub fn set_tags<I, S>(&self, tags: I) -> ServiceResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags = tags
            .into_iter()
            .map(|tag| Value::String(tag.into()))
            .collect();
        self.set_option(ServiceOption::Tags, Value::Array(tags))
    }

    /// 按选项表设置任意选项
    ///
    /// 修改 `extends` 会清除合并标记，下一次 `normalize` 会重新合并。
    pub fn set_option(&self, option: ServiceOption, value: Value) -> ServiceResult<()> {
        let mut state = self.state.write();
        if state.initialized {
            return Err(ServiceError::ServiceInitialized(
                ErrorContext::new().service(&state.name).option(option.key()),
            ));
        }
        option.check(&state.name, &value)?;

        if option == ServiceOption::Extends {
            state.normalized = false;
        }
        state.definition.insert(option.key().to_string(), value);
        Ok(())
    }

    /// 初始化服务定义
    ///
    /// 先校验定义，再以默认值为基础逐项应用当前定义中的已知选项。
    /// 重复调用不产生任何效果。
    pub fn initialize(&self) -> ServiceResult<()> {
        if self.is_initialized() {
            return Ok(());
        }

        self.validate_definition()?;

        let name = self.name();
        let current = self.definition();
        let mut rebuilt = ServiceOption::defaults();
        for (key, value) in current {
            let Some(option) = ServiceOption::from_key(&key) else {
                debug!("服务 {} 忽略未知选项: {}", name, key);
                continue;
            };
            option.check(&name, &value)?;
            if !value.is_null() {
                rebuilt.insert(key, value);
            }
        }

        let mut state = self.state.write();
        if !state.initialized {
            state.definition = rebuilt;
            state.initialized = true;
            debug!("服务定义初始化完成: {}", name);
        }
        Ok(())
    }

    /// 校验定义
    ///
    /// 检查服务引用的循环依赖，并确认 `calls` 中的方法都在类中声明。
    pub fn validate_definition(&self) -> ServiceResult<()> {
        validator::validate(self)?;

        if self.is_abstract() {
            return Ok(());
        }
        let Some(class_name) = self.class_name()? else {
            return Ok(());
        };

        let class = self.registry()?.find_class(&class_name)?;
        for method in self.calls().keys() {
            if !class.has_method(method) {
                return Err(ServiceError::MethodNotFound {
                    service: self.name(),
                    class_name,
                    method: method.clone(),
                });
            }
        }
        Ok(())
    }

    /// 解析后的类名
    ///
    /// 类名中的第一个 `%param%` 占位符由参数存储中的值替换。
    pub fn class_name(&self) -> ServiceResult<Option<String>> {
        let Some(raw) = self.raw_class_name() else {
            return Ok(None);
        };
        let parameters = self.registry()?.top().parameters();
        substitute_first_parameter(&raw, |name| parameters.get(name)).map(Some)
    }

    /// 解析参数列表，返回新的集合
    pub fn normalize_arguments(
        &self,
        arguments: &[Value],
        resolver: &ArgumentResolver<'_>,
    ) -> ServiceResult<Vec<Argument>> {
        resolver.resolve_all(arguments)
    }

    /// 解析方法调用，返回按声明顺序排列的新集合
    pub fn normalize_calls(
        &self,
        calls: &Map<String, Value>,
        resolver: &ArgumentResolver<'_>,
    ) -> ServiceResult<Vec<(String, Vec<Argument>)>> {
        resolver.resolve_calls(calls)
    }

    /// 重命名服务
    pub fn rename(&self, new_name: &str) -> ServiceResult<()> {
        let registry = self.registry()?;
        registry.rename(&self.name(), new_name)
    }

    pub(crate) fn set_name(&self, name: &str) {
        self.state.write().name = name.to_string();
    }

    pub(crate) fn set_normalized(&self) {
        self.state.write().normalized = true;
    }

    /// 替换为合并后的定义；已初始化的定义保持不变
    pub(crate) fn merge_into(&self, definition: Map<String, Value>) {
        let mut state = self.state.write();
        if !state.initialized {
            state.definition = definition;
        }
        state.normalized = true;
    }
}

impl fmt::Debug for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("ServiceDefinition")
            .field("name", &state.name)
            .field("definition", &state.definition)
            .field("initialized", &state.initialized)
            .finish_non_exhaustive()
    }
}

fn optional_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::String(text.to_string()))
}
