//! Action-based dispatch of SOAP calls.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use http::StatusCode;
use tracing::warn;

use super::inspector::{Correlation, MessageInspector};
use super::message::{Fault, Message};
use crate::error::BoxError;
use crate::handler::Handler;
use crate::middleware::audit::SOAP_ACTION;
use crate::middleware::BoxFuture;
use crate::request::Request;
use crate::response::{ContentType, Response};

/// One SOAP operation.
///
/// Implemented for any `Fn(Message) -> impl Future<Output = Result<Message, Fault>>`.
pub trait Operation: Send + Sync + 'static {
    fn invoke(&self, request: Message) -> BoxFuture<'static, Result<Message, Fault>>;
}

impl<F, Fut> Operation for F
where
    F: Fn(Message) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Message, Fault>> + Send + 'static,
{
    fn invoke(&self, request: Message) -> BoxFuture<'static, Result<Message, Fault>> {
        Box::pin(self(request))
    }
}

/// Routes SOAP messages to operations by action and runs inspectors
/// around each call.
///
/// ```rust
/// use wiretap::rpc::{Dispatcher, Fault, LogMessageInspector, Message};
///
/// async fn echo(req: Message) -> Result<Message, Fault> {
///     Ok(Message::new(req.into_envelope()))
/// }
///
/// let dispatcher = Dispatcher::new()
///     .operation("urn:Echo", echo)
///     .inspect(LogMessageInspector);
/// ```
#[derive(Default)]
pub struct Dispatcher {
    operations: HashMap<String, Arc<dyn Operation>>,
    inspectors: Vec<Arc<dyn MessageInspector>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `operation` for `action`. A later registration for the same
    /// action replaces the earlier one.
    pub fn operation(mut self, action: &str, operation: impl Operation) -> Self {
        self.operations.insert(action.to_owned(), Arc::new(operation));
        self
    }

    /// Add an inspector. Request hooks run in registration order, reply
    /// hooks in reverse.
    pub fn inspect(mut self, inspector: impl MessageInspector) -> Self {
        self.inspectors.push(Arc::new(inspector));
        self
    }

    /// Runs one call. Always produces a reply: operation failures and
    /// unknown actions become fault messages, which the reply hooks see
    /// like any other reply.
    pub async fn dispatch(&self, request: Message) -> Message {
        let tokens: Vec<Correlation> = self
            .inspectors
            .iter()
            .map(|inspector| inspector.after_receive_request(&request))
            .collect();

        let operation = request
            .action()
            .and_then(|action| self.operations.get(action))
            .cloned();

        let reply = match operation {
            Some(operation) => match operation.invoke(request).await {
                Ok(reply) => reply,
                Err(fault) => {
                    warn!(%fault, "operation faulted");
                    fault.to_message()
                }
            },
            None => {
                let fault = Fault::client(format!(
                    "no operation for action {}",
                    request.action().unwrap_or("<none>")
                ));
                warn!(%fault, "unroutable message");
                fault.to_message()
            }
        };

        for (inspector, token) in self.inspectors.iter().zip(tokens).rev() {
            inspector.before_send_reply(&reply, token);
        }
        reply
    }

    /// Turns the dispatcher into a route handler that reads the envelope
    /// from the request body and the action from `SOAPAction`.
    ///
    /// Replies are `200 OK`, faults `500 Internal Server Error`, both as
    /// `text/xml`.
    pub fn into_handler(self) -> impl Handler {
        let dispatcher = Arc::new(self);
        move |req: Request| {
            let dispatcher = Arc::clone(&dispatcher);
            async move { dispatcher.serve(req).await }
        }
    }

    async fn serve(&self, req: Request) -> Result<Response, BoxError> {
        let action = req.header(SOAP_ACTION).map(str::to_owned);
        let envelope = req.text().await?;

        let reply = self
            .dispatch(Message::new(envelope).with_action(action.as_deref()))
            .await;

        let status = if reply.is_fault() {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        Ok(Response::builder()
            .status(status)
            .bytes(ContentType::Soap, reply.into_envelope().into_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records hook calls as `"<name>:<phase>:<text>"`.
    struct Recorder {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl MessageInspector for Recorder {
        fn after_receive_request(&self, request: &Message) -> Correlation {
            self.seen.lock().unwrap().push(format!("{}:request:{request}", self.name));
            Correlation::new(self.name)
        }

        fn before_send_reply(&self, reply: &Message, correlation: Correlation) {
            assert_eq!(correlation.downcast_ref::<&str>(), Some(&self.name));
            self.seen.lock().unwrap().push(format!("{}:reply:{reply}", self.name));
        }
    }

    async fn ack(_: Message) -> Result<Message, Fault> {
        Ok(Message::new("<Ack/>"))
    }

    async fn refuse(_: Message) -> Result<Message, Fault> {
        Err(Fault::client("refused"))
    }

    fn dispatcher(seen: &Arc<Mutex<Vec<String>>>) -> Dispatcher {
        Dispatcher::new()
            .operation("urn:Echo", ack)
            .operation("urn:Fail", refuse)
            .inspect(Recorder { name: "outer", seen: Arc::clone(seen) })
            .inspect(Recorder { name: "inner", seen: Arc::clone(seen) })
    }

    #[tokio::test]
    async fn hooks_wrap_the_call_in_nested_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reply = dispatcher(&seen)
            .dispatch(Message::new("<Echo/>").with_action(Some("urn:Echo")))
            .await;

        assert_eq!(reply.envelope(), "<Ack/>");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                "outer:request:<Echo/>",
                "inner:request:<Echo/>",
                "inner:reply:<Ack/>",
                "outer:reply:<Ack/>",
            ]
        );
    }

    #[tokio::test]
    async fn faults_are_replies_too() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reply = dispatcher(&seen)
            .dispatch(Message::new("<Fail/>").with_action(Some("urn:Fail")))
            .await;

        assert!(reply.is_fault());
        assert!(reply.envelope().contains("refused"));
        assert_eq!(seen.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn unknown_action_is_a_client_fault() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reply = dispatcher(&seen)
            .dispatch(Message::new("<What/>").with_action(Some("urn:What")))
            .await;

        assert!(reply.is_fault());
        assert!(reply.envelope().contains("s:Client"));
        assert!(reply.envelope().contains("urn:What"));
    }
}
