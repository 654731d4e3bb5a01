//! Manager factory strategy used on restore
//!
//! The registry is an explicit value passed into the restore entry point
//! rather than process-global state. `teardown` is the shutdown hook.

use crate::manager::{DefaultManager, ManagerKind};
use crate::model::CustomerInfo;

/// Strategy producing a manager for a restored container
pub trait ManagerFactory {
    /// Build the manager kind for a container
    ///
    /// # Arguments
    /// * `info` - The persisted customer info block
    /// * `kind_name` - Manager kind recorded at save time
    /// * `payload` - Extension payload recorded at save time (`Null` for
    ///   default managers)
    fn create(&self, info: &CustomerInfo, kind_name: &str, payload: &serde_json::Value)
        -> ManagerKind;
}

/// Factory that always builds `DefaultManager`s
///
/// # Example
/// ```
/// use asmx_core::factory::{DefaultManagerFactory, ManagerFactory};
/// use asmx_core::model::CustomerInfo;
///
/// let kind = DefaultManagerFactory.create(&CustomerInfo::new("p"), "default", &serde_json::Value::Null);
/// assert_eq!(kind.kind_name(), "default");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultManagerFactory;

impl ManagerFactory for DefaultManagerFactory {
    fn create(
        &self,
        _info: &CustomerInfo,
        _kind_name: &str,
        _payload: &serde_json::Value,
    ) -> ManagerKind {
        ManagerKind::Default(DefaultManager::new())
    }
}

/// Registration point for the restore factory
pub struct FactoryRegistry {
    factory: Option<Box<dyn ManagerFactory>>,
}

impl FactoryRegistry {
    /// Registry holding the default factory
    pub fn new() -> Self {
        Self {
            factory: Some(Box::new(DefaultManagerFactory)),
        }
    }

    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self { factory: None }
    }

    /// Replace the registered factory, returning the previous one
    pub fn set(&mut self, factory: Box<dyn ManagerFactory>) -> Option<Box<dyn ManagerFactory>> {
        self.factory.replace(factory)
    }

    pub fn get(&self) -> Option<&dyn ManagerFactory> {
        self.factory.as_deref()
    }

    /// Drop the registered factory
    pub fn teardown(&mut self) {
        self.factory = None;
    }

    pub fn is_registered(&self) -> bool {
        self.factory.is_some()
    }
}

impl Default for FactoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("registered", &self.factory.is_some())
            .finish()
    }
}
