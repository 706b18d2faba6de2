//! Access to the D-Bus session bus.
//!
//! [`LauncherBus`] is the seam between the test session and the bus; the
//! session only ever resolves objects and issues lifecycle calls through it.
//! [`ZbusSessionBus`] is the real implementation.

use tracing::{debug, info};
use zbus::fdo::{DBusProxy, IntrospectableProxy};
use zbus::names::BusName;
use zbus::{Connection, Proxy};

use pelagicontain_test_core::{BusAddress, BusError, Error, LauncherCall, Result};

/// Result of a bus operation.
pub type BusResult<T> = std::result::Result<T, BusError>;

/// Operations the test session needs from the message bus.
#[allow(async_fn_in_trait)]
pub trait LauncherBus {
    /// Check that the object at `address` is registered and exposes its interface.
    ///
    /// Returns [`BusError::NotFound`] while the owner has not registered it yet.
    async fn resolve_object(&self, address: &BusAddress) -> BusResult<()>;

    /// Invoke a lifecycle method on the launcher at `target` and wait for the reply.
    async fn call(&self, target: &BusAddress, call: &LauncherCall) -> BusResult<()>;
}

/// [`LauncherBus`] over a zbus connection to the session bus.
#[derive(Debug, Clone)]
pub struct ZbusSessionBus {
    connection: Connection,
}

impl ZbusSessionBus {
    /// Connect to the session bus.
    pub async fn connect() -> Result<Self> {
        let connection = Connection::session()
            .await
            .map_err(|e| Error::BusConnection(e.to_string()))?;
        info!(
            "Connected to session bus: unique_name={:?}",
            connection.unique_name().map(|name| name.to_string())
        );
        Ok(Self { connection })
    }

    async fn proxy(&self, address: &BusAddress) -> zbus::Result<Proxy<'static>> {
        Proxy::new(
            &self.connection,
            address.service.clone(),
            address.path.clone(),
            address.interface.clone(),
        )
        .await
    }

    async fn introspect(&self, address: &BusAddress) -> zbus::Result<Option<String>> {
        let dbus = DBusProxy::new(&self.connection).await?;
        let name = BusName::try_from(address.service.clone())?;
        if !dbus.name_has_owner(name).await? {
            return Ok(None);
        }

        let introspectable = IntrospectableProxy::builder(&self.connection)
            .destination(address.service.clone())?
            .path(address.path.clone())?
            .build()
            .await?;
        Ok(Some(introspectable.introspect().await?))
    }
}

impl LauncherBus for ZbusSessionBus {
    async fn resolve_object(&self, address: &BusAddress) -> BusResult<()> {
        let xml = self.introspect(address).await.map_err(classify)?;
        let Some(xml) = xml else {
            return Err(BusError::NotFound(format!(
                "{} has no owner",
                address.service
            )));
        };

        if declares_interface(&xml, &address.interface)? {
            debug!("Resolved bus object: {}", address);
            Ok(())
        } else {
            Err(BusError::NotFound(format!(
                "{} does not expose {}",
                address.path, address.interface
            )))
        }
    }

    async fn call(&self, target: &BusAddress, call: &LauncherCall) -> BusResult<()> {
        let proxy = self.proxy(target).await.map_err(classify)?;
        let method = call.method_name();
        debug!("Calling {}.{} on {}", target.interface, method, target.path);

        let reply = match call {
            LauncherCall::Launch { app_id } => {
                proxy.call_method(method, &(app_id.to_string(),)).await
            }
            LauncherCall::Update { configs } => proxy.call_method(method, &(configs,)).await,
            LauncherCall::Shutdown => proxy.call_method(method, &()).await,
        };

        reply.map(|_| ()).map_err(classify)
    }
}

/// Whether introspection data declares `interface` on the object itself.
fn declares_interface(xml: &str, interface: &str) -> BusResult<bool> {
    let node = zbus_xml::Node::from_reader(xml.as_bytes())
        .map_err(|e| BusError::Transport(format!("malformed introspection data: {e}")))?;
    Ok(node
        .interfaces()
        .iter()
        .any(|iface| iface.name().as_str() == interface))
}

/// Map a zbus error onto the bus error taxonomy.
fn classify(err: zbus::Error) -> BusError {
    match err {
        zbus::Error::MethodError(name, message, _) => {
            BusError::from_error_name(name.as_str(), message.unwrap_or_default())
        }
        zbus::Error::FDO(fdo) => match *fdo {
            zbus::fdo::Error::NoReply(message) => BusError::NoReply(message),
            zbus::fdo::Error::ServiceUnknown(message)
            | zbus::fdo::Error::NameHasNoOwner(message)
            | zbus::fdo::Error::UnknownObject(message)
            | zbus::fdo::Error::UnknownInterface(message) => BusError::NotFound(message),
            other => BusError::Remote {
                name: "org.freedesktop.DBus.Error".to_string(),
                message: other.to_string(),
            },
        },
        other => BusError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declares_interface() {
        let xml = r#"<node>
  <interface name="org.freedesktop.DBus.Introspectable"/>
  <interface name="com.pelagicore.Pelagicontain">
    <method name="Launch"><arg name="appId" type="s" direction="in"/></method>
    <method name="Shutdown"/>
  </interface>
</node>"#;
        assert!(declares_interface(xml, "com.pelagicore.Pelagicontain").unwrap());
        assert!(!declares_interface(xml, "com.pelagicore.PAM").unwrap());
    }

    #[test]
    fn test_declares_interface_single_quotes() {
        let xml = "<node><interface name='com.pelagicore.Pelagicontain'>\
                   <method name='Shutdown'/></interface></node>";
        assert!(declares_interface(xml, "com.pelagicore.Pelagicontain").unwrap());
    }

    #[test]
    fn test_declares_interface_loose_layout() {
        let xml = r#"<!DOCTYPE node PUBLIC "-//freedesktop//DTD D-BUS Object Introspection 1.0//EN"
 "http://www.freedesktop.org/standards/dbus/1.0/introspect.dtd">
<node name="/com/pelagicore/Pelagicontain/abc">
  <interface
      name="com.pelagicore.Pelagicontain"  >
    <method name="Shutdown"/>
  </interface>
</node>"#;
        assert!(declares_interface(xml, "com.pelagicore.Pelagicontain").unwrap());
    }

    #[test]
    fn test_declares_interface_ignores_child_nodes() {
        let xml = r#"<node>
  <node name="abc">
    <interface name="com.pelagicore.Pelagicontain"/>
  </node>
</node>"#;
        assert!(!declares_interface(xml, "com.pelagicore.Pelagicontain").unwrap());
    }

    #[test]
    fn test_declares_interface_empty_node() {
        assert!(!declares_interface("<node/>", "com.pelagicore.Pelagicontain").unwrap());
    }

    #[test]
    fn test_declares_interface_malformed() {
        let err =
            declares_interface("<node><interface", "com.pelagicore.Pelagicontain").unwrap_err();
        assert!(matches!(err, BusError::Transport(_)));
    }

    #[test]
    fn test_classify_fdo_no_reply() {
        let err = zbus::Error::FDO(Box::new(zbus::fdo::Error::NoReply(
            "recipient disconnected".to_string(),
        )));
        assert_eq!(
            classify(err),
            BusError::NoReply("recipient disconnected".to_string())
        );
    }

    #[test]
    fn test_classify_fdo_service_unknown() {
        let err = zbus::Error::FDO(Box::new(zbus::fdo::Error::ServiceUnknown(
            "com.pelagicore.Pelagicontain".to_string(),
        )));
        assert!(classify(err).is_not_found());
    }

    #[test]
    fn test_classify_transport() {
        let err = zbus::Error::InvalidReply;
        assert!(matches!(classify(err), BusError::Transport(_)));
    }
}
