//! SOAP echo service with both audit layers switched on.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example soap_echo
//!
//! Try:
//!   curl -X POST http://localhost:3000/EchoService \
//!        -H 'content-type: text/xml' \
//!        -H 'SOAPAction: "http://tempuri.org/IEchoService/Echo"' \
//!        -d '<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><Echo xmlns="http://tempuri.org/"><text>hello</text></Echo></s:Body></s:Envelope>'
//!   curl http://localhost:3000/health
//!
//! Every call logs a `received request` / `responded` pair from the HTTP
//! layer; SOAP calls additionally log the request and reply messages from
//! the inspector.

use tracing_subscriber::EnvFilter;
use wiretap::middleware::audit::AuditLayer;
use quick_xml::escape::escape;
use wiretap::rpc::{Dispatcher, Fault, LogMessageInspector, Message};
use wiretap::{health, Config, Method, Router, Server};

const NS: &str = "http://tempuri.org/";

#[tokio::main]
async fn main() -> Result<(), wiretap::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let echo_service = Dispatcher::new()
        .operation("http://tempuri.org/IEchoService/Echo", echo)
        .operation("http://tempuri.org/IEchoService/FailEcho", fail_echo)
        .operation("http://tempuri.org/IEchoService/Ping", ping)
        .inspect(LogMessageInspector);

    let app = Router::new()
        .on(Method::POST, "/EchoService", echo_service.into_handler())
        .on(Method::GET,  "/health",      health::readiness)
        .on(Method::GET,  "/alive",       health::liveness)
        .layer(AuditLayer::with_config(config.audit.clone()));

    Server::from_config(&config).serve(app).await
}

// Echo(text) → EchoResult
async fn echo(req: Message) -> Result<Message, Fault> {
    let text = req.element_text("text").unwrap_or_default();
    Ok(Message::from_body(&format!(
        r#"<EchoResponse xmlns="{NS}"><EchoResult>{}</EchoResult></EchoResponse>"#,
        escape(&text)
    )))
}

// FailEcho(text) always faults, carrying the text as the reason.
async fn fail_echo(req: Message) -> Result<Message, Fault> {
    let text = req.element_text("text").unwrap_or_default();
    Err(Fault::server(text))
}

async fn ping(_req: Message) -> Result<Message, Fault> {
    Ok(Message::from_body(&format!(
        r#"<PingResponse xmlns="{NS}"><PingResult>pong</PingResult></PingResponse>"#
    )))
}
