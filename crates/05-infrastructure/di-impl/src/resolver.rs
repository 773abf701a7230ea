//! 参数解析器
//!
//! 将原始参数解析为 [`Argument`]：
//!
//! - `"@name"` 解析为服务实例
//! - `"%name%"` 解析为参数值（保留原类型）
//! - 含有 `%name%` 的字符串中每个占位符替换为参数值的字符串形式
//! - 其它值原样返回

use di_abstractions::{Argument, ParameterStore, ServiceLocator};
use infrastructure_common::{
    contains_parameters, interpolate_parameters, parameter_reference, service_reference,
    ServiceResult,
};
use serde_json::{Map, Value};

/// 参数解析器
pub struct ArgumentResolver<'a> {
    services: &'a dyn ServiceLocator,
    parameters: &'a dyn ParameterStore,
}

impl<'a> ArgumentResolver<'a> {
    /// 创建解析器
    pub fn new(services: &'a dyn ServiceLocator, parameters: &'a dyn ParameterStore) -> Self {
        Self {
            services,
            parameters,
        }
    }

    /// 解析单个参数
    pub fn resolve(&self, raw: &Value) -> ServiceResult<Argument> {
        if let Some(name) = service_reference(raw) {
            return self.services.get(name).map(Argument::Service);
        }

        let Some(text) = raw.as_str() else {
            return Ok(Argument::Value(raw.clone()));
        };
        if let Some(name) = parameter_reference(text) {
            return self.parameters.get(name).map(Argument::Value);
        }
        if contains_parameters(text) {
            let text = interpolate_parameters(text, |name| self.parameters.get(name))?;
            return Ok(Argument::Value(Value::String(text)));
        }

        Ok(Argument::Value(raw.clone()))
    }

    /// 解析参数列表
    pub fn resolve_all(&self, raw: &[Value]) -> ServiceResult<Vec<Argument>> {
        raw.iter().map(|value| self.resolve(value)).collect()
    }

    /// 解析方法调用，保持声明顺序
    pub fn resolve_calls(&self, calls: &Map<String, Value>) -> ServiceResult<Vec<(String, Vec<Argument>)>> {
        calls
            .iter()
            .map(|(method, arguments)| {
                let arguments = match arguments {
                    Value::Array(arguments) => self.resolve_all(arguments)?,
                    Value::Null => Vec::new(),
                    other => vec![self.resolve(other)?],
                };
                Ok((method.clone(), arguments))
            })
            .collect()
    }
}
