//! Built-in host methods and their default mappings.
//!
//! | key      | value                        | notifications                 |
//! |----------|------------------------------|-------------------------------|
//! | `set`    | object                       | `set(key, value)` per entry   |
//! | `get`    | key list                     | `get(key, value)` per key     |
//! | `has`    | key list                     | `has(key, bool)` per key      |
//! | `del`    | key list or `{"force": true}`| `del(key)` per key            |
//! | `option` | object                       | `option(key, value)` per entry|
//! | `data`   | object                       | `data(key, value)` per entry  |
//! | `cwd`    | string                       | `cwd(path)`                   |
//! | `use`    | key list                     | `use(reference)` per item     |
//!
//! A method is only installed when the host does not define one with the same
//! name, so applications can override any built-in.

use crate::{
    dispatcher::Dispatcher,
    host::{CWD_OPTION, Host},
    loader::{LoadError, Reference},
};
use confmap_core::{
    BoxError, FnMethod, Method, Notification, ValueError, as_object, as_str, key_list,
};
use serde_json::Value;
use thiserror::Error;

/// Keys mapped by [`install`].
pub const BUILTIN_KEYS: [&str; 8] = ["set", "get", "has", "del", "option", "data", "use", "cwd"];

/// Errors raised by the `use` built-in.
#[derive(Debug, Error)]
pub enum UseError {
    /// The value is not a key list.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// The host has no plugin loader.
    #[error("no plugin loader configured for host `{host}`")]
    NoLoader {
        /// Name of the host.
        host: String,
    },

    /// The loader could not produce the plugin.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// The plugin failed while being applied.
    #[error("plugin `{reference}` failed to apply: {source}")]
    Apply {
        /// The reference as written.
        reference: String,
        /// Underlying error.
        #[source]
        source: BoxError,
    },
}

/// Install the built-in methods on `host` and map them on `dispatcher`.
///
/// `cwd` is declared a priority key so plugin references given in the same
/// input resolve against it.
pub fn install(host: &Host, dispatcher: &Dispatcher) {
    host.define_default("set", FnMethod::new(set));
    host.define_default("get", FnMethod::new(get));
    host.define_default("has", FnMethod::new(has));
    host.define_default("del", FnMethod::new(del));
    host.define_default("option", FnMethod::new(option));
    host.define_default("data", FnMethod::new(data));
    host.define_default("cwd", FnMethod::new(cwd));
    host.define_default("use", UseMethod);

    dispatcher.map_all(BUILTIN_KEYS.map(|key| (key, key)));
    dispatcher.first(CWD_OPTION);
}

fn set(host: &Host, value: Value) -> Result<(), BoxError> {
    Ok(host.cache().apply_set(&value)?)
}

fn get(host: &Host, value: Value) -> Result<(), BoxError> {
    Ok(host.cache().apply_get(&value)?)
}

fn has(host: &Host, value: Value) -> Result<(), BoxError> {
    Ok(host.cache().apply_has(&value)?)
}

fn del(host: &Host, value: Value) -> Result<(), BoxError> {
    Ok(host.cache().apply_del(&value)?)
}

fn option(host: &Host, value: Value) -> Result<(), BoxError> {
    for (key, value) in as_object(&value)? {
        host.set_option(key.as_str(), value.clone());
        host.emit(Notification::new("option", [Value::from(key.as_str()), value.clone()]));
    }
    Ok(())
}

fn data(host: &Host, value: Value) -> Result<(), BoxError> {
    for (key, value) in as_object(&value)? {
        host.set_data(key.as_str(), value.clone());
        host.emit(Notification::new("data", [Value::from(key.as_str()), value.clone()]));
    }
    Ok(())
}

fn cwd(host: &Host, value: Value) -> Result<(), BoxError> {
    let dir = as_str(&value)?.to_owned();
    host.set_option(CWD_OPTION, Value::from(dir.as_str()));
    host.emit(Notification::new("cwd", [Value::from(dir)]));
    Ok(())
}

/// The `use` built-in: loads each referenced plugin and applies it.
///
/// References are resolved against the host's `cwd` option and handled one at
/// a time; the first failure stops the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseMethod;

impl UseMethod {
    async fn load_all(host: &Host, value: &Value) -> Result<(), UseError> {
        let references = key_list(value)?;
        let loader = host.loader().cloned().ok_or_else(|| UseError::NoLoader {
            host: host.name().to_owned(),
        })?;
        let cwd = host.cwd();

        for raw in references {
            let reference = Reference::resolve(raw, cwd.as_deref());
            let plugin = loader.load_dyn(&reference).await?;
            plugin
                .apply_dyn(host)
                .await
                .map_err(|source| UseError::Apply {
                    reference: reference.raw().to_owned(),
                    source,
                })?;

            #[cfg(feature = "tracing")]
            tracing::info!(
                host = %host.name(),
                reference = %reference,
                path = %reference.path().display(),
                "plugin applied"
            );
            host.emit(Notification::new("use", [Value::from(reference.raw())]));
        }
        Ok(())
    }
}

impl Method<Host> for UseMethod {
    async fn call(&self, host: &Host, value: Value) -> Result<(), BoxError> {
        Ok(Self::load_all(host, &value).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        loader::RegistryLoader,
        testing::{NoopPlugin, drain},
    };
    use confmap_core::MethodProvider;
    use serde_json::json;
    use std::sync::Arc;

    fn bound(host: &Arc<Host>) -> Dispatcher {
        let dispatcher = Dispatcher::for_target("app", host);
        install(host, &dispatcher);
        dispatcher
    }

    #[test]
    fn test_install_maps_every_builtin() {
        let host = Host::new("app");
        let dispatcher = bound(&host);

        assert_eq!(
            dispatcher.registered_keys(),
            ["cwd", "data", "del", "get", "has", "option", "set", "use"]
        );
        assert_eq!(dispatcher.declaration().priority(), ["cwd"]);
        for key in BUILTIN_KEYS {
            assert!(host.has_method(key), "missing built-in `{key}`");
        }
    }

    #[tokio::test]
    async fn test_existing_methods_are_not_replaced() {
        let host = Host::new("app");
        host.define_fn("set", |host, value| {
            host.set_data("custom", value);
            Ok(())
        });
        let dispatcher = bound(&host);

        let input = json!({ "set": { "a": 1 } });
        dispatcher.process(as_object(&input).unwrap().clone()).await.unwrap();

        assert_eq!(host.data("custom"), Some(json!({ "a": 1 })));
        assert!(host.cache().is_empty());
    }

    #[tokio::test]
    async fn test_option_data_cwd() {
        let host = Host::new("app");
        let dispatcher = bound(&host);
        let mut rx = host.subscribe();

        let input = json!({
            "option": { "verbose": true },
            "data": { "title": "x" },
            "cwd": "/srv/app",
        });
        dispatcher.process(as_object(&input).unwrap().clone()).await.unwrap();

        assert_eq!(host.option("verbose"), Some(json!(true)));
        assert_eq!(host.data("title"), Some(json!("x")));
        assert_eq!(host.cwd().as_deref(), Some(std::path::Path::new("/srv/app")));

        let events: Vec<_> = drain(&mut rx).into_iter().map(|n| n.event).collect();
        assert_eq!(events, ["cwd", "option", "data"]);
    }

    #[tokio::test]
    async fn test_use_without_loader_fails() {
        let host = Host::new("app");
        let err = UseMethod.call(&*host, json!("a")).await.unwrap_err();
        assert_eq!(err.to_string(), "no plugin loader configured for host `app`");
    }

    #[tokio::test]
    async fn test_use_stops_at_missing_plugin() {
        let loader = RegistryLoader::new();
        loader.register("a", NoopPlugin).register("c", NoopPlugin);
        let host = Host::builder().name("app").loader(loader).build();
        let mut rx = host.subscribe();

        let err = UseMethod.call(&*host, json!(["a", "b", "c"])).await.unwrap_err();

        assert!(err.to_string().contains("plugin `b` not found"));
        let used: Vec<_> = drain(&mut rx).into_iter().map(|n| n.args[0].clone()).collect();
        assert_eq!(used, [json!("a")]);
    }
}
