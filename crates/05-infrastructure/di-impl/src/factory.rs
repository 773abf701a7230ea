//! 服务工厂
//!
//! 根据服务定义构造实例：构造参数、方法调用、标签注入

use crate::container::ServiceContainer;
use crate::definition::ServiceDefinition;
use crate::options::ServiceOption;
use crate::resolver::ArgumentResolver;
use di_abstractions::ServiceInstance;
use infrastructure_common::{ErrorContext, ServiceError, ServiceResult};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

/// 服务工厂
///
/// 只负责构造，不做缓存。
pub struct ServiceFactory;

impl ServiceFactory {
    /// 创建服务实例
    ///
    /// 1. 拒绝抽象服务
    /// 2. 初始化定义（包括循环依赖校验）
    /// 3. 解析类名并获取类描述
    /// 4. 解析构造参数并创建实例
    /// 5. 按声明顺序执行方法调用
    /// 6. 实例支持标签注入时，注入所有以本服务名称为标签的服务
    pub fn create_service(
        definition: &ServiceDefinition,
        container: &ServiceContainer,
    ) -> ServiceResult<ServiceInstance> {
        let name = definition.name();
        if definition.is_abstract() {
            return Err(ServiceError::abstract_service(name));
        }

        definition.initialize()?;

        let class_name = definition.class_name()?.ok_or_else(|| {
            ServiceError::InvalidServiceOption(
                ErrorContext::new()
                    .service(&name)
                    .option(ServiceOption::ClassName.key())
                    .expected("a non-empty string")
                    .received(
                        definition
                            .definition()
                            .get(ServiceOption::ClassName.key())
                            .cloned()
                            .unwrap_or(Value::Null),
                    ),
            )
        })?;

        let class = definition.registry()?.find_class(&class_name)?;
        let parameters = container.registry().parameters();
        let resolver = ArgumentResolver::new(container, parameters.as_ref());

        let arguments = definition.normalize_arguments(&definition.arguments(), &resolver)?;
        debug!("创建服务 {} (类 {})", name, class_name);
        let mut instance = class.create_instance(arguments)?;

        for (method, arguments) in definition.normalize_calls(&definition.calls(), &resolver)? {
            debug!("服务 {} 调用方法 {}", name, method);
            instance
                .call(&method, arguments)
                .map_err(|err| match err {
                    ServiceError::MethodNotFound { method, .. } => ServiceError::MethodNotFound {
                        service: name.clone(),
                        class_name: class_name.clone(),
                        method,
                    },
                    other => other,
                })?;
        }

        if let Some(taggable) = instance.as_taggable() {
            let tagged = container.find_by_tag(&name)?;
            debug!("服务 {} 注入 {} 个标签服务", name, tagged.len());
            taggable.process_tagged_services(tagged)?;
        }

        Ok(Arc::from(instance))
    }
}
