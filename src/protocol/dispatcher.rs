use crate::error::{ProtocolError, Result};
use crate::protocol::message::Message;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type HandlerFn = dyn Fn(&Message) -> Result<Option<Message>> + Send + Sync + 'static;
type HandlerMap = HashMap<(i32, i32), Arc<HandlerFn>>;

/// Routes decoded messages by `(controller, action)`.
///
/// A handler returns the reply to send back, or `None` when the request needs
/// no answer. Cloning shares the handler table.
#[derive(Clone)]
pub struct Dispatcher {
    handlers: Arc<RwLock<HandlerMap>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let routes = self.read().len();
        f.debug_struct("Dispatcher").field("routes", &routes).finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Installs `handler` for a route, replacing any previous one.
    pub fn register<F>(&self, controller: i32, action: i32, handler: F) -> Result<()>
    where
        F: Fn(&Message) -> Result<Option<Message>> + Send + Sync + 'static,
    {
        self.write().insert((controller, action), Arc::new(handler));
        Ok(())
    }

    pub fn unregister(&self, controller: i32, action: i32) -> Result<bool> {
        Ok(self.write().remove(&(controller, action)).is_some())
    }

    pub fn has_route(&self, controller: i32, action: i32) -> bool {
        self.read().contains_key(&(controller, action))
    }

    /// Runs the handler registered for the message's route.
    ///
    /// The lock is released before the handler runs, so handlers may register
    /// further routes.
    pub fn dispatch(&self, msg: &Message) -> Result<Option<Message>> {
        let handler = self.read().get(&msg.route()).cloned();

        match handler {
            Some(handler) => handler(msg),
            None => {
                debug!(controller = msg.controller, action = msg.action, "No route for message");
                Err(ProtocolError::UnexpectedMessage)
            }
        }
    }

    // Every mutation is a single insert or remove, so a poisoned table is
    // still consistent and the guard can be taken over.
    fn read(&self) -> RwLockReadGuard<'_, HandlerMap> {
        self.handlers.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HandlerMap> {
        self.handlers.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SFSObject;
    use crate::protocol::constants::{ControllerId, SysAction};

    #[test]
    fn test_ping_pong_route() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(ControllerId::SYSTEM, SysAction::PING_PONG, |_| {
                Ok(Some(Message::ping()))
            })
            .unwrap();

        let reply = dispatcher.dispatch(&Message::ping()).unwrap();
        assert_eq!(reply, Some(Message::ping()));
    }

    #[test]
    fn test_unknown_route() {
        let dispatcher = Dispatcher::new();
        let msg = Message::new(ControllerId::EXTENSION, 99, SFSObject::new());
        assert!(matches!(
            dispatcher.dispatch(&msg),
            Err(ProtocolError::UnexpectedMessage)
        ));
    }

    #[test]
    fn test_handler_reads_params() {
        let dispatcher = Dispatcher::new();
        dispatcher
            .register(ControllerId::SYSTEM, SysAction::LOGIN, |msg| {
                let user = msg.params.get_utf_string("un")?;
                let mut params = SFSObject::new();
                params.put_utf_string("un", user.to_uppercase());
                Ok(Some(Message::new(msg.controller, msg.action, params)))
            })
            .unwrap();

        let mut params = SFSObject::new();
        params.put_utf_string("un", "guest");
        let reply = dispatcher
            .dispatch(&Message::new(0, SysAction::LOGIN, params))
            .unwrap()
            .unwrap();
        assert_eq!(reply.params.get_utf_string("un").unwrap(), "GUEST");

        // Missing parameter surfaces as the lookup error.
        let err = dispatcher
            .dispatch(&Message::new(0, SysAction::LOGIN, SFSObject::new()))
            .unwrap_err();
        assert!(matches!(err, ProtocolError::MissingKey(_)));
    }

    #[test]
    fn test_unregister() {
        let dispatcher = Dispatcher::new();
        dispatcher.register(1, 2, |_| Ok(None)).unwrap();
        assert!(dispatcher.has_route(1, 2));
        assert!(dispatcher.unregister(1, 2).unwrap());
        assert!(!dispatcher.has_route(1, 2));
    }

    #[test]
    fn test_survives_poisoned_lock() {
        let dispatcher = Dispatcher::new();
        dispatcher.register(1, 1, |_| Ok(Some(Message::ping()))).unwrap();

        let handlers = Arc::clone(&dispatcher.handlers);
        let result = std::thread::spawn(move || {
            let _guard = handlers.write().unwrap();
            panic!("handler table writer died");
        })
        .join();
        assert!(result.is_err());
        assert!(dispatcher.handlers.is_poisoned());

        assert!(dispatcher.has_route(1, 1));
        assert_eq!(dispatcher.dispatch(&Message::new(1, 1, SFSObject::new())).unwrap(), Some(Message::ping()));
        dispatcher.register(1, 2, |_| Ok(None)).unwrap();
        assert!(dispatcher.unregister(1, 2).unwrap());
        assert!(format!("{dispatcher:?}").contains("routes: 1"));
    }
}
